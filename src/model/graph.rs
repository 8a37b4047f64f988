// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ids::{NodeId, SlotId};
use super::value::{Value, ValueType, Vec2};

pub const GRAPH_FORMAT_VERSION: u32 = 1;

/// The host's model class for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    Context,
    Operator,
    Block,
    Parameter,
}

impl NodeClass {
    pub const ALL: [NodeClass; 4] = [Self::Context, Self::Operator, Self::Block, Self::Parameter];

    pub fn label(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Operator => "operator",
            Self::Block => "block",
            Self::Parameter => "parameter",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.label().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSlot {
    pub id: SlotId,
    pub name: String,
    pub path: String,
    pub value_type: ValueType,
    /// Constant used while the input is unlinked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub id: NodeId,
    /// Catalog identifier of the variant the node was created from.
    pub kind: String,
    /// Qualified host type name.
    pub type_name: String,
    pub class: NodeClass,
    pub name: String,
    pub position: Vec2,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    #[serde(default)]
    pub inputs: Vec<ModelSlot>,
    #[serde(default)]
    pub outputs: Vec<ModelSlot>,
}

impl ModelNode {
    /// Effective activation state.
    ///
    /// Kinds without an `enabled` attribute expose activation as an `enabled` setting.
    pub fn is_enabled(&self) -> bool {
        self.settings
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(self.enabled)
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotDirection, &ModelSlot)> {
        self.inputs
            .iter()
            .map(|slot| (SlotDirection::Input, slot))
            .chain(self.outputs.iter().map(|slot| (SlotDirection::Output, slot)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLink {
    pub output: SlotId,
    pub input: SlotId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotTemplate {
    pub name: String,
    pub path: String,
    pub value_type: ValueType,
    pub value: Option<Value>,
}

impl SlotTemplate {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            value_type,
            value: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_value(mut self, value: Option<Value>) -> Self {
        self.value = value;
        self
    }
}

/// Everything the model needs to instantiate a node, produced by a variant factory.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTemplate {
    pub kind: String,
    pub type_name: String,
    pub class: NodeClass,
    pub name: String,
    pub enabled: bool,
    pub settings: BTreeMap<String, Value>,
    pub inputs: Vec<SlotTemplate>,
    pub outputs: Vec<SlotTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnsupportedFormat { found: u32 },
    DuplicateNodeId { node_id: NodeId },
    DuplicateSlotId { slot_id: SlotId },
    IdCounterBehind { counter: &'static str },
    MissingParent { node_id: NodeId, parent_id: NodeId },
    DanglingLink { slot_id: SlotId },
    NodeNotFound { node_id: NodeId },
    NotRootNode { node_id: NodeId },
    NotAChild { node_id: NodeId },
    ParentNotAContext { parent_id: NodeId },
    BlockRequiresParent,
    IdSpaceExhausted,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { found } => write!(
                f,
                "unsupported graph format version {found} (expected {GRAPH_FORMAT_VERSION})"
            ),
            Self::DuplicateNodeId { node_id } => write!(f, "duplicate node id {node_id}"),
            Self::DuplicateSlotId { slot_id } => write!(f, "duplicate slot id {slot_id}"),
            Self::IdCounterBehind { counter } => {
                write!(f, "id counter {counter} is behind an allocated id")
            }
            Self::MissingParent { node_id, parent_id } => {
                write!(f, "node {node_id} references missing parent {parent_id}")
            }
            Self::DanglingLink { slot_id } => write!(f, "link references missing slot {slot_id}"),
            Self::NodeNotFound { node_id } => write!(f, "node {node_id} not found in model"),
            Self::NotRootNode { node_id } => write!(f, "node {node_id} is not a root node"),
            Self::NotAChild { node_id } => write!(f, "node {node_id} has no parent"),
            Self::ParentNotAContext { parent_id } => {
                write!(f, "node {parent_id} is not a context and cannot hold blocks")
            }
            Self::BlockRequiresParent => f.write_str("blocks can only be created inside a context"),
            Self::IdSpaceExhausted => f.write_str("id space exhausted"),
        }
    }
}

impl std::error::Error for ModelError {}

/// The persisted graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    pub format_version: u32,
    next_node_id: u64,
    next_slot_id: u64,
    #[serde(default)]
    nodes: Vec<ModelNode>,
    #[serde(default)]
    links: Vec<ModelLink>,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self {
            format_version: GRAPH_FORMAT_VERSION,
            next_node_id: 1,
            next_slot_id: 1,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl GraphModel {
    pub fn nodes(&self) -> &[ModelNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[ModelLink] {
        &self.links
    }

    pub fn node(&self, node_id: NodeId) -> Option<&ModelNode> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut ModelNode> {
        self.nodes.iter_mut().find(|node| node.id == node_id)
    }

    /// Children of `parent_id` in insertion order.
    pub fn children(&self, parent_id: NodeId) -> impl Iterator<Item = &ModelNode> {
        self.nodes
            .iter()
            .filter(move |node| node.parent == Some(parent_id))
    }

    pub fn slot_mut(&mut self, slot_id: SlotId) -> Option<&mut ModelSlot> {
        self.nodes.iter_mut().find_map(|node| {
            node.inputs
                .iter_mut()
                .chain(node.outputs.iter_mut())
                .find(|slot| slot.id == slot_id)
        })
    }

    /// True when some link feeds the input `slot_id`.
    pub fn is_linked_input(&self, slot_id: SlotId) -> bool {
        self.links.iter().any(|link| link.input == slot_id)
    }

    pub fn slot_owner(&self, slot_id: SlotId) -> Option<(&ModelNode, SlotDirection, &ModelSlot)> {
        self.nodes.iter().find_map(|node| {
            node.slots()
                .find(|(_, slot)| slot.id == slot_id)
                .map(|(direction, slot)| (node, direction, slot))
        })
    }

    /// Checks structural integrity of a loaded document.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != GRAPH_FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormat {
                found: self.format_version,
            });
        }

        let mut node_ids = BTreeSet::new();
        let mut slot_ids = BTreeSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id) {
                return Err(ModelError::DuplicateNodeId { node_id: node.id });
            }
            if node.id.get() >= self.next_node_id {
                return Err(ModelError::IdCounterBehind { counter: "next_node_id" });
            }
            for (_, slot) in node.slots() {
                if !slot_ids.insert(slot.id) {
                    return Err(ModelError::DuplicateSlotId { slot_id: slot.id });
                }
                if slot.id.get() >= self.next_slot_id {
                    return Err(ModelError::IdCounterBehind { counter: "next_slot_id" });
                }
            }
        }

        for node in &self.nodes {
            if let Some(parent_id) = node.parent {
                if !node_ids.contains(&parent_id) {
                    return Err(ModelError::MissingParent {
                        node_id: node.id,
                        parent_id,
                    });
                }
            }
        }

        for link in &self.links {
            for slot_id in [link.output, link.input] {
                if !slot_ids.contains(&slot_id) {
                    return Err(ModelError::DanglingLink { slot_id });
                }
            }
        }

        Ok(())
    }

    /// Instantiates `template` and returns the new node's persistent id.
    ///
    /// Blocks must be given a context parent; every other class is created at the root.
    pub fn insert_node(
        &mut self,
        template: NodeTemplate,
        position: Vec2,
        parent: Option<(NodeId, Option<usize>)>,
    ) -> Result<NodeId, ModelError> {
        match (template.class, parent) {
            (NodeClass::Block, None) => return Err(ModelError::BlockRequiresParent),
            (NodeClass::Block, Some((parent_id, _))) => {
                let parent = self
                    .node(parent_id)
                    .ok_or(ModelError::NodeNotFound { node_id: parent_id })?;
                if parent.class != NodeClass::Context {
                    return Err(ModelError::ParentNotAContext { parent_id });
                }
            }
            (_, Some((parent_id, _))) => {
                return Err(ModelError::ParentNotAContext { parent_id });
            }
            (_, None) => {}
        }

        let node_id = self.allocate_node_id()?;
        let inputs = self.instantiate_slots(template.inputs)?;
        let outputs = self.instantiate_slots(template.outputs)?;
        let node = ModelNode {
            id: node_id,
            kind: template.kind,
            type_name: template.type_name,
            class: template.class,
            name: template.name,
            position,
            enabled: template.enabled,
            parent: parent.map(|(parent_id, _)| parent_id),
            settings: template.settings,
            inputs,
            outputs,
        };

        match parent {
            Some((parent_id, Some(index))) => {
                // Insert before the index-th existing child, or after the last one.
                let insert_at = self
                    .nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, candidate)| candidate.parent == Some(parent_id))
                    .nth(index)
                    .map(|(position, _)| position)
                    .unwrap_or(self.nodes.len());
                self.nodes.insert(insert_at, node);
            }
            _ => self.nodes.push(node),
        }

        Ok(node_id)
    }

    /// Removes a root node, its children, and every link touching them.
    pub fn remove_root(&mut self, node_id: NodeId) -> Result<(), ModelError> {
        let node = self
            .node(node_id)
            .ok_or(ModelError::NodeNotFound { node_id })?;
        if node.parent.is_some() {
            return Err(ModelError::NotRootNode { node_id });
        }
        self.remove_subtree(node_id);
        Ok(())
    }

    /// Detaches `node_id` from its parent context.
    pub fn remove_child(&mut self, node_id: NodeId) -> Result<(), ModelError> {
        let node = self
            .node(node_id)
            .ok_or(ModelError::NodeNotFound { node_id })?;
        if node.parent.is_none() {
            return Err(ModelError::NotAChild { node_id });
        }
        self.remove_subtree(node_id);
        Ok(())
    }

    /// Adds `output -> input`, replacing any link already feeding `input`.
    ///
    /// Returns `false` when the exact link already exists.
    pub fn add_link(&mut self, output: SlotId, input: SlotId) -> bool {
        if self
            .links
            .iter()
            .any(|link| link.output == output && link.input == input)
        {
            return false;
        }
        self.links.retain(|link| link.input != input);
        self.links.push(ModelLink { output, input });
        true
    }

    pub fn remove_link(&mut self, output: SlotId, input: SlotId) -> bool {
        let before = self.links.len();
        self.links
            .retain(|link| !(link.output == output && link.input == input));
        self.links.len() != before
    }

    fn remove_subtree(&mut self, node_id: NodeId) {
        let mut doomed = BTreeSet::from([node_id]);
        // Blocks only nest one level deep, but walk until stable anyway.
        loop {
            let before = doomed.len();
            for node in &self.nodes {
                if node.parent.is_some_and(|parent| doomed.contains(&parent)) {
                    doomed.insert(node.id);
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        let doomed_slots = self
            .nodes
            .iter()
            .filter(|node| doomed.contains(&node.id))
            .flat_map(|node| node.slots().map(|(_, slot)| slot.id))
            .collect::<BTreeSet<_>>();
        self.nodes.retain(|node| !doomed.contains(&node.id));
        self.links.retain(|link| {
            !doomed_slots.contains(&link.output) && !doomed_slots.contains(&link.input)
        });
    }

    fn allocate_node_id(&mut self) -> Result<NodeId, ModelError> {
        let node_id = NodeId::new(self.next_node_id).map_err(|_| ModelError::IdSpaceExhausted)?;
        self.next_node_id = self
            .next_node_id
            .checked_add(1)
            .ok_or(ModelError::IdSpaceExhausted)?;
        Ok(node_id)
    }

    fn instantiate_slots(&mut self, templates: Vec<SlotTemplate>) -> Result<Vec<ModelSlot>, ModelError> {
        templates
            .into_iter()
            .map(|template| {
                let id = SlotId::new(self.next_slot_id).map_err(|_| ModelError::IdSpaceExhausted)?;
                self.next_slot_id = self
                    .next_slot_id
                    .checked_add(1)
                    .ok_or(ModelError::IdSpaceExhausted)?;
                Ok(ModelSlot {
                    id,
                    name: template.name,
                    path: template.path,
                    value_type: template.value_type,
                    value: template.value,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn template(class: NodeClass, kind: &str) -> NodeTemplate {
        NodeTemplate {
            kind: kind.to_owned(),
            type_name: "Test.Model".to_owned(),
            class,
            name: kind.to_owned(),
            enabled: true,
            settings: BTreeMap::new(),
            inputs: vec![SlotTemplate::new("a", ValueType::Float)],
            outputs: vec![SlotTemplate::new("out", ValueType::Float)],
        }
    }

    #[test]
    fn insert_assigns_monotonic_ids_and_slots() {
        let mut model = GraphModel::default();
        let first = model
            .insert_node(template(NodeClass::Operator, "op.a"), Vec2::ZERO, None)
            .expect("insert");
        let second = model
            .insert_node(template(NodeClass::Operator, "op.b"), Vec2::ZERO, None)
            .expect("insert");
        assert!(second > first);
        model.validate().expect("valid");

        model.remove_root(first).expect("remove");
        let third = model
            .insert_node(template(NodeClass::Operator, "op.c"), Vec2::ZERO, None)
            .expect("insert");
        assert!(third > second, "ids are never reused");
    }

    #[test]
    fn blocks_need_a_context_parent() {
        let mut model = GraphModel::default();
        assert_eq!(
            model.insert_node(template(NodeClass::Block, "block"), Vec2::ZERO, None),
            Err(ModelError::BlockRequiresParent)
        );

        let operator = model
            .insert_node(template(NodeClass::Operator, "op"), Vec2::ZERO, None)
            .expect("insert");
        assert_eq!(
            model.insert_node(
                template(NodeClass::Block, "block"),
                Vec2::ZERO,
                Some((operator, None))
            ),
            Err(ModelError::ParentNotAContext { parent_id: operator })
        );
    }

    #[test]
    fn block_index_controls_child_order() {
        let mut model = GraphModel::default();
        let context = model
            .insert_node(template(NodeClass::Context, "ctx"), Vec2::ZERO, None)
            .expect("context");
        let a = model
            .insert_node(template(NodeClass::Block, "a"), Vec2::ZERO, Some((context, None)))
            .expect("a");
        let b = model
            .insert_node(template(NodeClass::Block, "b"), Vec2::ZERO, Some((context, Some(0))))
            .expect("b");
        let order = model.children(context).map(|node| node.id).collect::<Vec<_>>();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn removing_a_context_drops_children_and_links() {
        let mut model = GraphModel::default();
        let context = model
            .insert_node(template(NodeClass::Context, "ctx"), Vec2::ZERO, None)
            .expect("context");
        let block = model
            .insert_node(template(NodeClass::Block, "b"), Vec2::ZERO, Some((context, None)))
            .expect("block");
        let operator = model
            .insert_node(template(NodeClass::Operator, "op"), Vec2::ZERO, None)
            .expect("operator");
        let out = model.node(operator).expect("op").outputs[0].id;
        let input = model.node(block).expect("block").inputs[0].id;
        assert!(model.add_link(out, input));

        assert_eq!(model.remove_root(block), Err(ModelError::NotRootNode { node_id: block }));
        assert_eq!(model.remove_child(context), Err(ModelError::NotAChild { node_id: context }));

        model.remove_root(context).expect("remove context");
        assert!(model.node(block).is_none());
        assert!(model.links().is_empty());
        model.validate().expect("still valid");
    }

    #[test]
    fn add_link_replaces_existing_input_link() {
        let mut model = GraphModel::default();
        let a = model
            .insert_node(template(NodeClass::Operator, "a"), Vec2::ZERO, None)
            .expect("a");
        let b = model
            .insert_node(template(NodeClass::Operator, "b"), Vec2::ZERO, None)
            .expect("b");
        let c = model
            .insert_node(template(NodeClass::Operator, "c"), Vec2::ZERO, None)
            .expect("c");
        let a_out = model.node(a).expect("a").outputs[0].id;
        let b_out = model.node(b).expect("b").outputs[0].id;
        let c_in = model.node(c).expect("c").inputs[0].id;

        assert!(model.add_link(a_out, c_in));
        assert!(!model.add_link(a_out, c_in));
        assert!(model.add_link(b_out, c_in));
        assert_eq!(model.links(), &[ModelLink { output: b_out, input: c_in }]);
    }

    #[test]
    fn validate_rejects_unknown_format() {
        let model = GraphModel {
            format_version: 99,
            ..GraphModel::default()
        };
        assert_eq!(model.validate(), Err(ModelError::UnsupportedFormat { found: 99 }));
    }
}

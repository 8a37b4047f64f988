// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fmt;

use super::graph::{GraphModel, ModelError, ModelNode, NodeClass, NodeTemplate, SlotDirection};
use super::ids::{NodeId, SlotId};
use super::resource::GraphResource;
use super::value::{Value, ValueType, Vec2};

/// Writes a value into a node attribute.
pub type AttributeSetter = fn(&mut ModelNode, Value) -> Result<(), String>;

#[derive(Debug, Clone, PartialEq)]
pub struct PortController {
    pub slot: SlotId,
    pub name: String,
    pub path: String,
    pub value_type: ValueType,
    pub direction: SlotDirection,
    pub value: Option<Value>,
}

/// Live view of one node, rebuilt on every sync.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeController {
    pub id: NodeId,
    pub kind: String,
    pub type_name: String,
    pub class: NodeClass,
    pub name: String,
    pub position: Vec2,
    pub enabled: bool,
    pub parent: Option<NodeId>,
    pub inputs: Vec<PortController>,
    pub outputs: Vec<PortController>,
}

impl NodeController {
    fn from_model(node: &ModelNode) -> Self {
        let port = |direction: SlotDirection| {
            move |slot: &super::graph::ModelSlot| PortController {
                slot: slot.id,
                name: slot.name.clone(),
                path: slot.path.clone(),
                value_type: slot.value_type,
                direction,
                value: slot.value.clone(),
            }
        };
        Self {
            id: node.id,
            kind: node.kind.clone(),
            type_name: node.type_name.clone(),
            class: node.class,
            name: node.name.clone(),
            position: node.position,
            enabled: node.is_enabled(),
            parent: node.parent,
            inputs: node.inputs.iter().map(port(SlotDirection::Input)).collect(),
            outputs: node.outputs.iter().map(port(SlotDirection::Output)).collect(),
        }
    }

    pub fn ports(&self) -> impl Iterator<Item = &PortController> {
        self.inputs.iter().chain(self.outputs.iter())
    }
}

/// A connection endpoint bound to a port.
///
/// `owner` is the back-reference to the node holding the port; it is filled in by sync
/// and may be absent on endpoints the host could not attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub slot: SlotId,
    pub owner: Option<NodeId>,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeController {
    pub output: Anchor,
    pub input: Anchor,
}

struct PendingWrite {
    node_id: NodeId,
    member: &'static str,
    setter: AttributeSetter,
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Unavailable(ModelError),
    Model(ModelError),
    NodeNotFound { node_id: NodeId },
    SlotNotFound { slot_id: SlotId },
    WrongDirection { slot_id: SlotId, expected: SlotDirection },
    NotRemovable { node_id: NodeId },
    AttributeRejected { node_id: NodeId, member: &'static str, reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(source) => write!(f, "graph cannot be opened for editing: {source}"),
            Self::Model(source) => write!(f, "{source}"),
            Self::NodeNotFound { node_id } => write!(f, "node {node_id} is not in the session"),
            Self::SlotNotFound { slot_id } => write!(f, "port {slot_id} is not in the session"),
            Self::WrongDirection { slot_id, expected } => {
                let expected = match expected {
                    SlotDirection::Input => "an input",
                    SlotDirection::Output => "an output",
                };
                write!(f, "port {slot_id} is not {expected} port")
            }
            Self::NotRemovable { node_id } => write!(
                f,
                "node {node_id} is owned by a context and cannot be removed from the session"
            ),
            Self::AttributeRejected {
                node_id,
                member,
                reason,
            } => write!(f, "node {node_id} rejected write to {member}: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable(source) | Self::Model(source) => Some(source),
            _ => None,
        }
    }
}

/// Editable view over one graph resource.
///
/// Reads through [`GraphSession::nodes`] and [`GraphSession::edges`] are only meaningful
/// right after [`GraphSession::sync_from_model`]. Attribute writes are queued and reach the
/// model on the next [`GraphSession::light_apply`].
pub struct GraphSession {
    model: GraphModel,
    pending: Vec<PendingWrite>,
    nodes: Vec<NodeController>,
    edges: Vec<EdgeController>,
    revision: u64,
    synced_revision: Option<u64>,
    committed_revision: u64,
}

impl fmt::Debug for GraphSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphSession")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("pending", &self.pending.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl GraphSession {
    pub fn open(resource: &GraphResource) -> Result<Self, SessionError> {
        let model = resource.model().clone();
        model.validate().map_err(SessionError::Unavailable)?;
        Ok(Self {
            model,
            pending: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            revision: 0,
            synced_revision: None,
            committed_revision: 0,
        })
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn nodes(&self) -> &[NodeController] {
        &self.nodes
    }

    pub fn node(&self, slot: usize) -> Option<&NodeController> {
        self.nodes.get(slot)
    }

    pub fn edges(&self) -> &[EdgeController] {
        &self.edges
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub fn is_synced(&self) -> bool {
        self.synced_revision == Some(self.revision)
    }

    /// True when queued writes or model edits have not been committed yet.
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty() || self.revision != self.committed_revision
    }

    pub fn mark_committed(&mut self) {
        self.committed_revision = self.revision;
    }

    /// Flushes queued attribute writes into the model and returns how many were applied.
    ///
    /// Every queued write is attempted; the first failure is reported after the queue
    /// has been drained.
    pub fn light_apply(&mut self) -> Result<usize, SessionError> {
        let mut applied = 0;
        let mut first_error = None;
        for write in std::mem::take(&mut self.pending) {
            let Some(node) = self.model.node_mut(write.node_id) else {
                first_error.get_or_insert(SessionError::NodeNotFound {
                    node_id: write.node_id,
                });
                continue;
            };
            match (write.setter)(node, write.value) {
                Ok(()) => applied += 1,
                Err(reason) => {
                    first_error.get_or_insert(SessionError::AttributeRejected {
                        node_id: write.node_id,
                        member: write.member,
                        reason,
                    });
                }
            }
        }
        if applied > 0 {
            self.revision += 1;
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(applied),
        }
    }

    /// Rebuilds node and edge controllers from the model.
    pub fn sync_from_model(&mut self) {
        self.nodes = self.model.nodes().iter().map(NodeController::from_model).collect();

        let mut owners: HashMap<SlotId, (NodeId, &str, &str)> = HashMap::new();
        for node in self.model.nodes() {
            for (_, slot) in node.slots() {
                owners.insert(slot.id, (node.id, slot.name.as_str(), slot.path.as_str()));
            }
        }
        let anchor = |slot: SlotId| match owners.get(&slot) {
            Some((owner, name, path)) => Anchor {
                slot,
                owner: Some(*owner),
                name: (*name).to_owned(),
                path: (*path).to_owned(),
            },
            None => Anchor {
                slot,
                owner: None,
                name: String::new(),
                path: String::new(),
            },
        };
        self.edges = self
            .model
            .links()
            .iter()
            .map(|link| EdgeController {
                output: anchor(link.output),
                input: anchor(link.input),
            })
            .collect();

        self.synced_revision = Some(self.revision);
    }

    pub fn queue_attribute_write(
        &mut self,
        node_id: NodeId,
        member: &'static str,
        setter: AttributeSetter,
        value: Value,
    ) {
        self.pending.push(PendingWrite {
            node_id,
            member,
            setter,
            value,
        });
    }

    /// Runs `edit` against the model node; the session only counts as changed when the
    /// node actually differs afterwards.
    pub fn edit_node<R>(
        &mut self,
        node_id: NodeId,
        edit: impl FnOnce(&mut ModelNode) -> R,
    ) -> Result<R, SessionError> {
        let node = self
            .model
            .node_mut(node_id)
            .ok_or(SessionError::NodeNotFound { node_id })?;
        let before = node.clone();
        let result = edit(node);
        if *node != before {
            self.revision += 1;
        }
        Ok(result)
    }

    pub fn add_node(&mut self, template: NodeTemplate, position: Vec2) -> Result<NodeId, SessionError> {
        let node_id = self
            .model
            .insert_node(template, position, None)
            .map_err(SessionError::Model)?;
        self.revision += 1;
        Ok(node_id)
    }

    /// Inserts a block into `parent` before its `index`-th block (appends when `None`).
    pub fn add_block(
        &mut self,
        parent: NodeId,
        template: NodeTemplate,
        index: Option<usize>,
    ) -> Result<NodeId, SessionError> {
        let node_id = self
            .model
            .insert_node(template, Vec2::ZERO, Some((parent, index)))
            .map_err(SessionError::Model)?;
        self.revision += 1;
        Ok(node_id)
    }

    /// Session-level removal. Only root nodes can be removed this way.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<(), SessionError> {
        match self.model.remove_root(node_id) {
            Ok(()) => {
                self.revision += 1;
                Ok(())
            }
            Err(ModelError::NotRootNode { node_id }) => Err(SessionError::NotRemovable { node_id }),
            Err(ModelError::NodeNotFound { node_id }) => Err(SessionError::NodeNotFound { node_id }),
            Err(err) => Err(SessionError::Model(err)),
        }
    }

    /// Removal through the owning context.
    pub fn remove_from_parent(&mut self, node_id: NodeId) -> Result<(), SessionError> {
        self.model
            .remove_child(node_id)
            .map_err(SessionError::Model)?;
        self.revision += 1;
        Ok(())
    }

    /// Links `output` to `input`; returns `false` when the link already existed.
    pub fn create_link(&mut self, output: SlotId, input: SlotId) -> Result<bool, SessionError> {
        self.expect_direction(output, SlotDirection::Output)?;
        self.expect_direction(input, SlotDirection::Input)?;
        let created = self.model.add_link(output, input);
        if created {
            self.revision += 1;
        }
        Ok(created)
    }

    /// Stores a constant on the input `slot_id` and returns the previous one.
    pub fn set_slot_value(
        &mut self,
        slot_id: SlotId,
        value: Value,
    ) -> Result<Option<Value>, SessionError> {
        self.expect_direction(slot_id, SlotDirection::Input)?;
        let slot = self
            .model
            .slot_mut(slot_id)
            .ok_or(SessionError::SlotNotFound { slot_id })?;
        let previous = slot.value.replace(value);
        if previous != slot.value {
            self.revision += 1;
        }
        Ok(previous)
    }

    /// Returns `false` when no such link existed.
    pub fn remove_link(&mut self, output: SlotId, input: SlotId) -> Result<bool, SessionError> {
        self.expect_direction(output, SlotDirection::Output)?;
        self.expect_direction(input, SlotDirection::Input)?;
        let removed = self.model.remove_link(output, input);
        if removed {
            self.revision += 1;
        }
        Ok(removed)
    }

    fn expect_direction(&self, slot_id: SlotId, expected: SlotDirection) -> Result<(), SessionError> {
        let (_, direction, _) = self
            .model
            .slot_owner(slot_id)
            .ok_or(SessionError::SlotNotFound { slot_id })?;
        if direction != expected {
            return Err(SessionError::WrongDirection { slot_id, expected });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn detach_anchor_owners(&mut self) {
        for edge in &mut self.edges {
            edge.output.owner = None;
            edge.input.owner = None;
        }
    }

    /// Points every anchor at `owner`, whether or not it holds the port.
    #[cfg(test)]
    pub(crate) fn misattribute_anchor_owners(&mut self, owner: NodeId) {
        for edge in &mut self.edges {
            edge.output.owner = Some(owner);
            edge.input.owner = Some(owner);
        }
    }
}

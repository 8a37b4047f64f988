// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Request handlers behind the caller-facing tools.
//!
//! Every handler loads a fresh session for the requested asset, performs its edit and
//! commits before returning. Failures never escape: they are folded into
//! [`AdapterError`] and returned as an error [`ToolResponse`].

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::access::ResourceAccessor;
use crate::catalog::{Capabilities, VariantRegistry};
use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::identity::IdentityMap;
use crate::model::{GraphSession, NodeClass, Value};
use crate::ops::{CommitOutcome, MutationController};
use crate::reflect::TypeResolver;
use crate::snapshot;
use crate::store::AssetStore;

mod params;

pub use params::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResponse {
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    /// Error response; `data` carries the error kind (and candidates for ambiguous
    /// matches).
    pub fn error(err: &AdapterError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: serde_json::to_value(err).ok(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KindSummary {
    identifier: String,
    display_name: String,
    category: NodeClass,
    #[serde(rename = "type")]
    type_name: String,
    synonyms: Vec<String>,
    capabilities: Capabilities,
}

type Handled = Result<(String, Option<serde_json::Value>), AdapterError>;

pub struct GraphTools {
    accessor: ResourceAccessor,
    registry: Arc<VariantRegistry>,
    controller: MutationController,
}

impl GraphTools {
    pub fn new(
        config: &AdapterConfig,
        store: Arc<dyn AssetStore>,
        registry: Arc<VariantRegistry>,
    ) -> Self {
        Self {
            accessor: ResourceAccessor::new(Arc::clone(&store)),
            controller: MutationController::new(Arc::clone(&registry), store).with_config(config),
            registry,
        }
    }

    /// Tools over the configured asset folder and the built-in catalog.
    pub fn from_config(config: &AdapterConfig) -> Self {
        let registry = Arc::new(VariantRegistry::builtin(TypeResolver::global()));
        Self::new(config, Arc::new(config.folder_store()), registry)
    }

    pub fn registry(&self) -> &Arc<VariantRegistry> {
        &self.registry
    }

    pub fn graph_create(&self, params: GraphPathParams) -> ToolResponse {
        respond("graph.create", self.create_graph(&params.path))
    }

    pub fn graph_structure(&self, params: GraphPathParams) -> ToolResponse {
        respond("graph.structure", self.structure(&params.path))
    }

    pub fn catalog_list(&self, params: CatalogListParams) -> ToolResponse {
        respond("catalog.list", self.list_catalog(params))
    }

    pub fn node_add(&self, params: NodeAddParams) -> ToolResponse {
        respond("node.add", self.add_node(params))
    }

    pub fn node_add_block(&self, params: BlockAddParams) -> ToolResponse {
        respond("node.add_block", self.add_block(params))
    }

    pub fn node_remove(&self, params: NodeParams) -> ToolResponse {
        respond("node.remove", self.remove_node(params))
    }

    pub fn node_duplicate(&self, params: NodeDuplicateParams) -> ToolResponse {
        respond("node.duplicate", self.duplicate_node(params))
    }

    pub fn node_move(&self, params: NodeMoveParams) -> ToolResponse {
        respond("node.move", self.move_node(params))
    }

    pub fn node_set_enabled(&self, params: NodeSetEnabledParams) -> ToolResponse {
        respond("node.set_enabled", self.set_enabled(params))
    }

    pub fn node_rename(&self, params: NodeRenameParams) -> ToolResponse {
        respond("node.rename", self.rename_node(params))
    }

    pub fn node_set_setting(&self, params: NodeSetSettingParams) -> ToolResponse {
        respond("node.set_setting", self.set_setting(params))
    }

    pub fn node_set_slot_value(&self, params: NodeSetSlotValueParams) -> ToolResponse {
        respond("node.set_slot_value", self.set_slot_value(params))
    }

    pub fn link_connect(&self, params: LinkParams) -> ToolResponse {
        respond("link.connect", self.connect(params))
    }

    pub fn link_disconnect(&self, params: LinkParams) -> ToolResponse {
        respond("link.disconnect", self.disconnect(params))
    }

    fn create_graph(&self, path: &str) -> Handled {
        let resource = self.accessor.create(path)?;
        Ok((
            format!("Created graph {}", resource.path()),
            Some(json!({ "path": resource.path().as_str() })),
        ))
    }

    fn structure(&self, path: &str) -> Handled {
        let (_, session) = self.accessor.load(path)?;
        let snapshot = snapshot::export(&session);
        let data = serde_json::to_value(&snapshot).map_err(AdapterError::invocation)?;
        Ok((
            format!(
                "Graph has {} nodes and {} connections",
                snapshot.nodes.len(),
                snapshot.connections.len()
            ),
            Some(data),
        ))
    }

    fn list_catalog(&self, params: CatalogListParams) -> Handled {
        let categories = match params.category.as_deref() {
            Some(raw) => vec![NodeClass::parse(raw).ok_or_else(|| {
                AdapterError::validation(format!(
                    "unknown category {raw:?}; expected one of context, operator, block, parameter"
                ))
            })?],
            None => NodeClass::ALL.to_vec(),
        };
        let filter = params
            .filter
            .as_deref()
            .map(|filter| filter.trim().to_lowercase())
            .filter(|filter| !filter.is_empty());

        let mut kinds = Vec::new();
        for category in categories {
            for variant in self.registry.list_kinds(category)?.iter() {
                if let Some(filter) = &filter {
                    let hit = variant.identifier().to_lowercase().contains(filter)
                        || variant.display_name().to_lowercase().contains(filter);
                    if !hit {
                        continue;
                    }
                }
                kinds.push(KindSummary {
                    identifier: variant.identifier().to_owned(),
                    display_name: variant.display_name().to_owned(),
                    category: variant.category(),
                    type_name: variant.type_name().to_owned(),
                    synonyms: variant.synonyms().iter().map(ToString::to_string).collect(),
                    capabilities: variant.capabilities(),
                });
            }
        }

        let data = serde_json::to_value(&kinds).map_err(AdapterError::invocation)?;
        Ok((format!("{} node kinds", kinds.len()), Some(data)))
    }

    fn add_node(&self, params: NodeAddParams) -> Handled {
        let variant = self.registry.match_variant(&params.kind)?;
        let requested = params.position.unwrap_or_default();
        let ((handle, placement), commit) = self.edit(&params.path, |session, _| {
            let placement = self.controller.place(session, requested);
            let handle = self
                .controller
                .add_node(session, placement.position, &variant)?;
            Ok((handle, placement))
        })?;

        let adjusted = placement.adjusted();
        let mut message = format!("Added {} as node {}", variant.display_name(), handle.id);
        if let Some(warning) = &placement.warning {
            message.push_str("; ");
            message.push_str(warning);
        }
        Ok((
            message,
            Some(json!({
                "nodeId": handle.id,
                "kind": variant.identifier(),
                "position": placement.position,
                "positionAdjusted": adjusted,
                "warning": placement.warning,
                "committed": committed(commit),
            })),
        ))
    }

    fn add_block(&self, params: BlockAddParams) -> Handled {
        let context_id = params.context_id.resolve()?;
        let variant = self.registry.match_variant(&params.kind)?;
        let (handle, commit) = self.edit(&params.path, |session, identities| {
            let context = identities.lookup(context_id)?;
            Ok(self
                .controller
                .add_block(session, context, &variant, params.index)?)
        })?;
        Ok((
            format!(
                "Added {} as block {} in context {context_id}",
                variant.display_name(),
                handle.id
            ),
            Some(json!({
                "nodeId": handle.id,
                "contextId": context_id,
                "kind": variant.identifier(),
                "committed": committed(commit),
            })),
        ))
    }

    fn remove_node(&self, params: NodeParams) -> Handled {
        let node_id = params.node_id.resolve()?;
        let (removed, commit) = self.edit(&params.path, |session, identities| {
            let handle = identities.lookup(node_id)?;
            Ok(self.controller.remove_node(session, handle)?)
        })?;
        Ok((
            format!("Removed node {node_id}"),
            Some(json!({
                "nodeId": removed.id,
                "strategy": removed.strategy,
                "committed": committed(commit),
            })),
        ))
    }

    fn duplicate_node(&self, params: NodeDuplicateParams) -> Handled {
        let node_id = params.node_id.resolve()?;
        let (copy, commit) = self.edit(&params.path, |session, identities| {
            let handle = identities.lookup(node_id)?;
            Ok(self
                .controller
                .duplicate_node(session, handle, params.position)?)
        })?;
        Ok((
            format!("Duplicated node {node_id} as node {}", copy.id),
            Some(json!({
                "sourceId": node_id,
                "nodeId": copy.id,
                "committed": committed(commit),
            })),
        ))
    }

    fn move_node(&self, params: NodeMoveParams) -> Handled {
        let node_id = params.node_id.resolve()?;
        let position = params.position;
        let (strategy, commit) = self.edit(&params.path, |session, identities| {
            let handle = identities.lookup(node_id)?;
            Ok(self.controller.set_position(session, handle, position)?)
        })?;
        Ok((
            format!("Moved node {node_id} to {position}"),
            Some(json!({
                "nodeId": node_id,
                "position": position,
                "strategy": strategy,
                "committed": committed(commit),
            })),
        ))
    }

    fn set_enabled(&self, params: NodeSetEnabledParams) -> Handled {
        let node_id = params.node_id.resolve()?;
        let enabled = params.enabled;
        let (strategy, commit) = self.edit(&params.path, |session, identities| {
            let handle = identities.lookup(node_id)?;
            Ok(self.controller.toggle_enabled(session, handle, enabled)?)
        })?;
        let verb = if enabled { "Enabled" } else { "Disabled" };
        Ok((
            format!("{verb} node {node_id}"),
            Some(json!({
                "nodeId": node_id,
                "enabled": enabled,
                "strategy": strategy,
                "committed": committed(commit),
            })),
        ))
    }

    fn rename_node(&self, params: NodeRenameParams) -> Handled {
        let node_id = params.node_id.resolve()?;
        let (strategy, commit) = self.edit(&params.path, |session, identities| {
            let handle = identities.lookup(node_id)?;
            Ok(self.controller.rename(session, handle, &params.name)?)
        })?;
        Ok((
            format!("Renamed node {node_id} to {:?}", params.name),
            Some(json!({
                "nodeId": node_id,
                "name": params.name,
                "strategy": strategy,
                "committed": committed(commit),
            })),
        ))
    }

    fn set_setting(&self, params: NodeSetSettingParams) -> Handled {
        let node_id = params.node_id.resolve()?;
        let value = value_from_json("setting", &params.value)?;
        let ((), commit) = self.edit(&params.path, |session, identities| {
            let handle = identities.lookup(node_id)?;
            Ok(self
                .controller
                .set_setting(session, handle, &params.name, value)?)
        })?;
        Ok((
            format!("Set {} on node {node_id}", params.name),
            Some(json!({
                "nodeId": node_id,
                "setting": params.name,
                "committed": committed(commit),
            })),
        ))
    }

    fn set_slot_value(&self, params: NodeSetSlotValueParams) -> Handled {
        let node_id = params.node_id.resolve()?;
        let value = value_from_json("port", &params.value)?;
        let (change, commit) = self.edit(&params.path, |session, identities| {
            let handle = identities.lookup(node_id)?;
            Ok(self
                .controller
                .set_slot_value(session, handle, &params.port, value)?)
        })?;
        Ok((
            format!("Set input {} on node {node_id} to {}", change.port, change.value),
            Some(json!({
                "nodeId": node_id,
                "port": change.port,
                "oldValue": change.previous.as_ref().map(Value::to_json),
                "newValue": change.value.to_json(),
                "committed": committed(commit),
            })),
        ))
    }

    fn connect(&self, params: LinkParams) -> Handled {
        let source_id = params.source_id.resolve()?;
        let target_id = params.target_id.resolve()?;
        let (created, commit) = self.edit(&params.path, |session, identities| {
            let source = identities.lookup(source_id)?;
            let target = identities.lookup(target_id)?;
            Ok(self.controller.connect(
                session,
                source,
                &params.source_port,
                target,
                &params.target_port,
            )?)
        })?;
        let message = if created {
            format!("Connected node {source_id} to node {target_id}")
        } else {
            format!("Node {source_id} is already connected to node {target_id}")
        };
        Ok((
            message,
            Some(json!({
                "sourceNodeId": source_id,
                "targetNodeId": target_id,
                "created": created,
                "committed": committed(commit),
            })),
        ))
    }

    fn disconnect(&self, params: LinkParams) -> Handled {
        let source_id = params.source_id.resolve()?;
        let target_id = params.target_id.resolve()?;
        let ((), commit) = self.edit(&params.path, |session, identities| {
            let source = identities.lookup(source_id)?;
            let target = identities.lookup(target_id)?;
            Ok(self.controller.disconnect(
                session,
                source,
                &params.source_port,
                target,
                &params.target_port,
            )?)
        })?;
        Ok((
            format!("Disconnected node {source_id} from node {target_id}"),
            Some(json!({
                "sourceNodeId": source_id,
                "targetNodeId": target_id,
                "committed": committed(commit),
            })),
        ))
    }

    /// Loads `path`, runs `edit` against the fresh session and commits on success.
    fn edit<T>(
        &self,
        path: &str,
        edit: impl FnOnce(&mut GraphSession, &IdentityMap) -> Result<T, AdapterError>,
    ) -> Result<(T, CommitOutcome), AdapterError> {
        let (mut resource, mut session) = self.accessor.load(path)?;
        let identities = IdentityMap::build(&session);
        let value = edit(&mut session, &identities)?;
        let commit = self.controller.commit(&mut session, &mut resource)?;
        Ok((value, commit))
    }
}

fn value_from_json(target: &str, json: &serde_json::Value) -> Result<Value, AdapterError> {
    Value::from_json(json).ok_or_else(|| {
        AdapterError::validation(format!(
            "{target} values must be a bool, number, string or finite {{x, y}}; got {json}"
        ))
    })
}

fn committed(outcome: CommitOutcome) -> bool {
    matches!(outcome, CommitOutcome::Written { .. })
}

fn respond(tool: &'static str, handled: Handled) -> ToolResponse {
    match handled {
        Ok((message, data)) => {
            info!(tool, %message, "tool succeeded");
            ToolResponse::success(message, data)
        }
        Err(err) => {
            warn!(tool, kind = err.kind(), error = %err, "tool failed");
            ToolResponse::error(&err)
        }
    }
}

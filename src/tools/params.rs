// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;
use crate::model::{NodeId, Vec2};

/// A node id given either as a number or as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum NodeRef {
    Number(u64),
    Text(String),
}

impl NodeRef {
    pub fn resolve(&self) -> Result<NodeId, AdapterError> {
        let parsed = match self {
            Self::Number(raw) => NodeId::new(*raw),
            Self::Text(raw) => raw.trim().parse(),
        };
        parsed.map_err(|err| AdapterError::validation(format!("invalid node id: {err}")))
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        Self::Number(id.get())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GraphPathParams {
    /// Graph asset path relative to the asset root, e.g. `Effects/Smoke.vfx`.
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct CatalogListParams {
    /// One of `context`, `operator`, `block`, `parameter`. All categories when omitted.
    pub category: Option<String>,
    /// Case-insensitive substring filter over identifiers and display names.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeAddParams {
    pub path: String,
    /// Node kind: identifier, display name, `category/display name` or synonym.
    pub kind: String,
    pub position: Option<Vec2>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BlockAddParams {
    pub path: String,
    pub context_id: NodeRef,
    pub kind: String,
    /// Insert before the block at this index; append when omitted.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeParams {
    pub path: String,
    pub node_id: NodeRef,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeDuplicateParams {
    pub path: String,
    pub node_id: NodeRef,
    /// Where to put the copy; offset from the source when omitted.
    pub position: Option<Vec2>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeMoveParams {
    pub path: String,
    pub node_id: NodeRef,
    pub position: Vec2,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeSetEnabledParams {
    pub path: String,
    pub node_id: NodeRef,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeRenameParams {
    pub path: String,
    pub node_id: NodeRef,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeSetSettingParams {
    pub path: String,
    pub node_id: NodeRef,
    pub name: String,
    /// Bool, number, string, or `{ "x": .., "y": .. }`.
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeSetSlotValueParams {
    pub path: String,
    pub node_id: NodeRef,
    /// Input port name or path. The input must not be linked.
    pub port: String,
    /// Bool, number, string, or `{ "x": .., "y": .. }`; coerced to the port type.
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LinkParams {
    pub path: String,
    pub source_id: NodeRef,
    /// Output port name or path.
    pub source_port: String,
    pub target_id: NodeRef,
    /// Input port name or path.
    pub target_port: String,
}

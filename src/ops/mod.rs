// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Edits applied to a graph session, and the commit that persists them.
//!
//! Edits that can reach the host in more than one way (removal, attribute writes) walk an
//! ordered list of strategies. Edits are not transactional: when a later step of a
//! multi-step edit fails, earlier steps stay in the session and are persisted by the next
//! [`MutationController::commit`].

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Access, Capabilities, VariantDescriptor, VariantRegistry};
use crate::config::AdapterConfig;
use crate::identity::NodeHandle;
use crate::model::{
    Assignability, GraphResource, GraphSession, ModelNode, ModelSlot, NodeClass, NodeController,
    NodeId, NodeTemplate, PortController, SessionError, SlotDirection, SlotTemplate, Value,
    ValueType, Vec2,
};
use crate::reflect::{ReflectError, TypeResolver, SETTING_MUTATOR};
use crate::store::{AssetStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalStrategy {
    /// The session's own removal primitive. Refuses nodes owned by a context.
    SessionLevel,
    /// Detach the node from its owning context.
    ModelParent,
}

impl RemovalStrategy {
    pub const ORDER: [Self; 2] = [Self::SessionLevel, Self::ModelParent];
}

impl fmt::Display for RemovalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SessionLevel => "session-level removal",
            Self::ModelParent => "model-parent removal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeStrategy {
    /// A public settable member on the host type.
    DirectAttribute,
    /// The host's generic named-setting mutator.
    NamedSetting,
}

impl AttributeStrategy {
    pub const ORDER: [Self; 2] = [Self::DirectAttribute, Self::NamedSetting];
}

impl fmt::Display for AttributeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DirectAttribute => "direct attribute",
            Self::NamedSetting => "named setting",
        })
    }
}

/// Result of trying one strategy.
#[derive(Debug)]
enum StrategyOutcome<E> {
    Applied,
    /// The strategy does not exist for this node; try the next one.
    NotApplicable,
    Failed(E),
}

/// Walks `order` until a strategy applies.
///
/// Returns `Ok(None)` when no strategy was applicable, and the error of the last failed
/// strategy when none applied but at least one was attempted.
fn run_strategies<S, E>(
    order: &[S],
    mut attempt: impl FnMut(S) -> StrategyOutcome<E>,
) -> Result<Option<S>, E>
where
    S: Copy + fmt::Display,
    E: fmt::Display,
{
    let mut last_error = None;
    for &strategy in order {
        match attempt(strategy) {
            StrategyOutcome::Applied => return Ok(Some(strategy)),
            StrategyOutcome::NotApplicable => {}
            StrategyOutcome::Failed(err) => {
                debug!(%strategy, error = %err, "strategy failed");
                last_error = Some(err);
            }
        }
    }
    match last_error {
        Some(err) => Err(err),
        None => Ok(None),
    }
}

/// A node attribute reachable through [`AttributeStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Position,
    Enabled,
    Name,
}

impl Attribute {
    fn member(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Enabled => "enabled",
            Self::Name => "name",
        }
    }

    fn operation(self) -> &'static str {
        match self {
            Self::Position => "set position",
            Self::Enabled => "toggle enabled",
            Self::Name => "rename",
        }
    }

    fn access(self, capabilities: &Capabilities) -> Access {
        match self {
            Self::Position => capabilities.positionable,
            Self::Enabled => capabilities.enableable,
            Self::Name => capabilities.nameable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Removed {
    pub id: NodeId,
    pub strategy: RemovalStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Nothing was pending; the store was not touched.
    Unchanged,
    /// The model was written; `applied` counts the queued attribute writes flushed first.
    Written { applied: usize },
}

/// Constant written to an unlinked input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotValueChange {
    pub port: String,
    pub previous: Option<Value>,
    pub value: Value,
}

/// Where a new root node ends up after overlap checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub warning: Option<String>,
}

impl Placement {
    pub fn adjusted(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("node {id} is not present in the current session")]
    StaleHandle { id: NodeId },
    #[error("could not create {kind}: {source}")]
    CreationFailed { kind: String, source: SessionError },
    #[error("position {position} is not finite")]
    InvalidPosition { position: Vec2 },
    #[error("{identifier} is a {found} kind, expected a {expected}")]
    WrongCategory {
        identifier: String,
        expected: NodeClass,
        found: NodeClass,
    },
    #[error("node {id} is not a context")]
    NotAContext { id: NodeId },
    #[error("could not remove node {id}: {source}")]
    RemovalFailed { id: NodeId, source: SessionError },
    #[error("{operation} is not supported on node {id} ({type_name})")]
    Unsupported {
        id: NodeId,
        operation: &'static str,
        type_name: String,
    },
    #[error("{operation} failed on node {id}: {source}")]
    AttributeFailed {
        id: NodeId,
        operation: &'static str,
        source: ReflectError,
    },
    #[error("node {id} has no {} port {port:?}; available: {}", direction_label(.direction), .available.join(", "))]
    PortNotFound {
        id: NodeId,
        port: String,
        direction: SlotDirection,
        available: Vec<String>,
    },
    #[error("port {output} ({output_type}) cannot feed port {input} ({input_type})")]
    IncompatiblePorts {
        output: String,
        output_type: &'static str,
        input: String,
        input_type: &'static str,
    },
    #[error("input {port:?} on node {id} is linked; disconnect it before setting a value")]
    PortLinked { id: NodeId, port: String },
    #[error("input {port:?} takes {expected} values, got {found}")]
    IncompatibleValue {
        port: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("no link from node {from} port {from_port:?} to node {to} port {to_port:?}")]
    LinkNotFound {
        from: NodeId,
        from_port: String,
        to: NodeId,
        to_port: String,
    },
    #[error(transparent)]
    Reflect(#[from] ReflectError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn direction_label(direction: &SlotDirection) -> &'static str {
    match direction {
        SlotDirection::Input => "input",
        SlotDirection::Output => "output",
    }
}

/// Applies edits to sessions and persists them through the asset store.
pub struct MutationController {
    resolver: Arc<TypeResolver>,
    registry: Arc<VariantRegistry>,
    store: Arc<dyn AssetStore>,
    duplicate_offset: Vec2,
    overlap_tolerance: f32,
}

impl MutationController {
    pub fn new(registry: Arc<VariantRegistry>, store: Arc<dyn AssetStore>) -> Self {
        let defaults = AdapterConfig::default();
        Self {
            resolver: Arc::clone(registry.resolver()),
            registry,
            store,
            duplicate_offset: defaults.duplicate_offset,
            overlap_tolerance: defaults.overlap_tolerance,
        }
    }

    pub fn with_config(mut self, config: &AdapterConfig) -> Self {
        self.duplicate_offset = config.duplicate_offset;
        self.overlap_tolerance = config.overlap_tolerance;
        self
    }
}

include!("ops_impl.rs");

#[cfg(test)]
mod tests;

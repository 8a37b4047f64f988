// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistent node ids mapped onto the live node controllers of one session.
//!
//! A map describes the session as of its last sync. Adding or removing nodes leaves it
//! stale; callers rebuild it before looking anything up again. Staleness is not
//! detected here.

use std::collections::BTreeMap;

use crate::model::{GraphSession, NodeId};

/// A persistent id paired with the node's index in the session's controller list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub id: NodeId,
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("node {id} not found")]
    NodeNotFound { id: NodeId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    handles: BTreeMap<NodeId, NodeHandle>,
}

impl IdentityMap {
    pub fn build(session: &GraphSession) -> Self {
        let handles = session
            .nodes()
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id, NodeHandle { id: node.id, slot }))
            .collect();
        Self { handles }
    }

    pub fn lookup(&self, id: NodeId) -> Result<NodeHandle, IdentityError> {
        self.handles
            .get(&id)
            .copied()
            .ok_or(IdentityError::NodeNotFound { id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.handles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{
        AssetPath, GraphModel, GraphResource, NodeClass, NodeTemplate, Vec2,
    };

    fn template() -> NodeTemplate {
        NodeTemplate {
            kind: "operator.add".to_owned(),
            type_name: "Vfx.Model.VfxOperator".to_owned(),
            class: NodeClass::Operator,
            name: "Add".to_owned(),
            enabled: true,
            settings: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    #[test]
    fn build_indexes_every_synced_node() {
        let resource = GraphResource::new(
            AssetPath::parse("Map.vfx").expect("path"),
            GraphModel::default(),
        );
        let mut session = GraphSession::open(&resource).expect("session");
        let a = session.add_node(template(), Vec2::ZERO).expect("a");
        let b = session.add_node(template(), Vec2::ZERO).expect("b");
        session.sync_from_model();

        let map = IdentityMap::build(&session);
        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup(b), Ok(NodeHandle { id: b, slot: 1 }));
        assert_eq!(map.ids().collect::<Vec<_>>(), vec![a, b]);

        let missing = NodeId::new(99).expect("id");
        assert_eq!(
            map.lookup(missing),
            Err(IdentityError::NodeNotFound { id: missing })
        );
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only structural export of a synced session.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::model::{
    Anchor, GraphSession, NodeClass, NodeController, NodeId, PortController, Value, Vec2,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSnapshot {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    /// Constant held by an unlinked input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub kind: String,
    pub category: NodeClass,
    pub position: Vec2,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    pub settings: BTreeMap<String, serde_json::Value>,
    pub inputs: Vec<PortSnapshot>,
    pub outputs: Vec<PortSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub source_node_id: NodeId,
    pub source_port: String,
    pub source_path: String,
    pub target_node_id: NodeId,
    pub target_port: String,
    pub target_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
    /// RFC 3339 time of export.
    pub timestamp: String,
}

/// Walks the session's controllers into a serializable snapshot.
///
/// Connection endpoints are attributed through the anchor's owner; anchors without one,
/// or whose owner no longer holds the port, fall back to a scan over every node's ports.
/// Endpoints that still cannot be attributed are left out.
pub fn export(session: &GraphSession) -> GraphSnapshot {
    let nodes = session
        .nodes()
        .iter()
        .map(|node| node_snapshot(session, node))
        .collect();

    let mut connections = Vec::with_capacity(session.edges().len());
    for edge in session.edges() {
        let (Some(source), Some(target)) = (
            owner_of(session, &edge.output),
            owner_of(session, &edge.input),
        ) else {
            warn!(
                output = %edge.output.slot,
                input = %edge.input.slot,
                "skipping connection with an unattributed endpoint"
            );
            continue;
        };
        connections.push(ConnectionSnapshot {
            source_node_id: source.0,
            source_port: source.1.name.clone(),
            source_path: source.1.path.clone(),
            target_node_id: target.0,
            target_port: target.1.name.clone(),
            target_path: target.1.path.clone(),
        });
    }

    GraphSnapshot {
        nodes,
        connections,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

fn node_snapshot(session: &GraphSession, node: &NodeController) -> NodeSnapshot {
    let settings = session
        .model()
        .node(node.id)
        .map(|model| {
            model
                .settings
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect()
        })
        .unwrap_or_default();
    NodeSnapshot {
        id: node.id,
        name: node.name.clone(),
        type_name: node.type_name.clone(),
        kind: node.kind.clone(),
        category: node.class,
        position: node.position,
        enabled: node.enabled,
        parent: node.parent,
        settings,
        inputs: node.inputs.iter().map(port_snapshot).collect(),
        outputs: node.outputs.iter().map(port_snapshot).collect(),
    }
}

fn port_snapshot(port: &PortController) -> PortSnapshot {
    PortSnapshot {
        name: port.name.clone(),
        path: port.path.clone(),
        value_type: port.value_type.label(),
        value: port.value.as_ref().map(Value::to_json),
    }
}

fn owner_of<'a>(
    session: &'a GraphSession,
    anchor: &Anchor,
) -> Option<(NodeId, &'a PortController)> {
    let find_port = |node: &'a NodeController| {
        node.ports()
            .find(|port| port.slot == anchor.slot)
            .map(|port| (node.id, port))
    };
    anchor
        .owner
        .and_then(|owner| session.nodes().iter().find(|node| node.id == owner))
        .and_then(find_port)
        .or_else(|| session.nodes().iter().find_map(find_port))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::VariantRegistry;
    use crate::model::{AssetPath, GraphModel, GraphResource};
    use crate::ops::MutationController;
    use crate::reflect::{builtin_modules, TypeResolver};
    use crate::store::MemoryStore;

    fn two_linked_nodes() -> GraphSession {
        let registry = Arc::new(VariantRegistry::builtin(Arc::new(TypeResolver::new(
            builtin_modules(),
        ))));
        let controller = MutationController::new(Arc::clone(&registry), Arc::new(MemoryStore::new()));
        let resource = GraphResource::new(
            AssetPath::parse("Export.vfx").expect("path"),
            GraphModel::default(),
        );
        let mut session = GraphSession::open(&resource).expect("session");
        session.sync_from_model();

        let time = registry.match_variant("operator.total_time").expect("time");
        let add = registry.match_variant("operator.add").expect("add");
        let time = controller
            .add_node(&mut session, Vec2::ZERO, &time)
            .expect("time node");
        let add = controller
            .add_node(&mut session, Vec2::new(200.0, 0.0), &add)
            .expect("add node");
        controller
            .connect(&mut session, time, "T", add, "B")
            .expect("connect");
        session
    }

    #[test]
    fn exports_nodes_and_their_connection() {
        let session = two_linked_nodes();
        let snapshot = export(&session);

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[0].kind, "operator.total_time");
        assert_eq!(snapshot.nodes[1].inputs.len(), 2);
        assert_eq!(
            snapshot.connections,
            vec![ConnectionSnapshot {
                source_node_id: snapshot.nodes[0].id,
                source_port: "T".to_owned(),
                source_path: "t".to_owned(),
                target_node_id: snapshot.nodes[1].id,
                target_port: "B".to_owned(),
                target_path: "b".to_owned(),
            }]
        );

        let json = serde_json::to_value(&snapshot).expect("json");
        assert_eq!(json["connections"][0]["sourceNodeId"], snapshot.nodes[0].id.get());
        assert_eq!(json["nodes"][1]["type"], "Vfx.Model.VfxOperator");
        assert_eq!(json["nodes"][1]["category"], "operator");
        assert_eq!(json["nodes"][0]["settings"], serde_json::json!({}));
        assert!(chrono::DateTime::parse_from_rfc3339(&snapshot.timestamp).is_ok());
    }

    #[test]
    fn endpoints_without_owner_are_found_by_scanning_ports() {
        let mut session = two_linked_nodes();
        let expected = export(&session).connections;

        session.detach_anchor_owners();
        assert_eq!(export(&session).connections, expected);
    }

    #[test]
    fn endpoints_with_a_stale_owner_are_found_by_scanning_ports() {
        let mut session = two_linked_nodes();
        let expected = export(&session).connections;
        let wrong_owner = expected[0].target_node_id;

        session.misattribute_anchor_owners(wrong_owner);
        assert_eq!(export(&session).connections, expected);
    }

    #[test]
    fn unlinked_input_constants_are_exported() {
        let mut session = two_linked_nodes();
        let input = session.nodes()[1].inputs[0].slot;
        session
            .set_slot_value(input, Value::Float(0.5))
            .expect("set value");
        session.sync_from_model();

        let json = serde_json::to_value(export(&session)).expect("json");
        assert_eq!(json["nodes"][1]["inputs"][0]["value"], 0.5);
        assert!(json["nodes"][1]["inputs"][1].get("value").is_none());
    }
}

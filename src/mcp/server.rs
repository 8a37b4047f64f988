// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;

use crate::tools::{
    BlockAddParams, CatalogListParams, GraphPathParams, GraphTools, LinkParams, NodeAddParams,
    NodeDuplicateParams, NodeMoveParams, NodeParams, NodeRenameParams, NodeSetEnabledParams,
    NodeSetSettingParams, NodeSetSlotValueParams, ToolResponse,
};

/// Tool calls are serialized: every call loads, edits and commits its asset under the lock.
#[derive(Clone)]
pub struct GraphMcp {
    tools: Arc<Mutex<GraphTools>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GraphMcp {
    pub fn new(tools: GraphTools) -> Self {
        Self {
            tools: Arc::new(Mutex::new(tools)),
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Create an empty graph asset at `path`.
    #[tool(name = "graph.create")]
    async fn graph_create(
        &self,
        params: Parameters<GraphPathParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.graph_create(params.0)))
    }

    /// Export nodes, ports, settings and connections of the graph at `path`.
    #[tool(name = "graph.structure")]
    async fn graph_structure(
        &self,
        params: Parameters<GraphPathParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.graph_structure(params.0)))
    }

    /// List registered node kinds with their capabilities.
    #[tool(name = "catalog.list")]
    async fn catalog_list(
        &self,
        params: Parameters<CatalogListParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.catalog_list(params.0)))
    }

    /// Add a root node. Positions overlapping an existing node are nudged right.
    #[tool(name = "node.add")]
    async fn node_add(
        &self,
        params: Parameters<NodeAddParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_add(params.0)))
    }

    /// Add a block to a context, optionally at `index`.
    #[tool(name = "node.add_block")]
    async fn node_add_block(
        &self,
        params: Parameters<BlockAddParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_add_block(params.0)))
    }

    /// Remove a node. Blocks are detached from their context.
    #[tool(name = "node.remove")]
    async fn node_remove(
        &self,
        params: Parameters<NodeParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_remove(params.0)))
    }

    /// Duplicate a node; contexts are copied with their blocks.
    #[tool(name = "node.duplicate")]
    async fn node_duplicate(
        &self,
        params: Parameters<NodeDuplicateParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_duplicate(params.0)))
    }

    /// Move a root node to `position`.
    #[tool(name = "node.move")]
    async fn node_move(
        &self,
        params: Parameters<NodeMoveParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_move(params.0)))
    }

    /// Enable or disable a context or block.
    #[tool(name = "node.set_enabled")]
    async fn node_set_enabled(
        &self,
        params: Parameters<NodeSetEnabledParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_set_enabled(params.0)))
    }

    /// Rename a node; names must not be blank.
    #[tool(name = "node.rename")]
    async fn node_rename(
        &self,
        params: Parameters<NodeRenameParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_rename(params.0)))
    }

    /// Set a named setting; the value is coerced to the setting's current type.
    #[tool(name = "node.set_setting")]
    async fn node_set_setting(
        &self,
        params: Parameters<NodeSetSettingParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_set_setting(params.0)))
    }

    /// Set the constant of an unlinked input port, coerced to the port's type.
    #[tool(name = "node.set_slot_value")]
    async fn node_set_slot_value(
        &self,
        params: Parameters<NodeSetSlotValueParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.node_set_slot_value(params.0)))
    }

    /// Connect an output port to an input port. Connecting twice is not an error.
    #[tool(name = "link.connect")]
    async fn link_connect(
        &self,
        params: Parameters<LinkParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.link_connect(params.0)))
    }

    /// Remove the connection between an output port and an input port.
    #[tool(name = "link.disconnect")]
    async fn link_disconnect(
        &self,
        params: Parameters<LinkParams>,
    ) -> Result<Json<ToolResponse>, ErrorData> {
        Ok(Json(self.tools.lock().await.link_disconnect(params.0)))
    }
}

#[tool_handler]
impl ServerHandler for GraphMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "VFX graph editing server (tools: graph.create, graph.structure, catalog.list, node.add, node.add_block, node.remove, node.duplicate, node.move, node.set_enabled, node.rename, node.set_setting, node.set_slot_value, link.connect, link.disconnect). Every edit is committed to the asset before the call returns."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

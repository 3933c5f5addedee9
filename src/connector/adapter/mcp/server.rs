use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::tool;
use rmcp::tool_handler;
use rmcp::tool_router;
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use tracing::debug;

use crate::connector::api::Container;

use super::tools::{
    domain_error_to_mcp, envelope_to_result, DescribeCollectionToolInput, ExecuteToolInput,
    ListCollectionsToolInput, QueryToolInput, StorageIdInput, StorageListOutput,
};

/// MCP Server that exposes the configured storages
#[derive(Clone)]
pub struct StorageMapMcpServer {
    container: Arc<Container>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl StorageMapMcpServer {
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            tool_router: Self::tool_router(),
        }
    }

    /// List every configured storage with its type, write mode and whether a connection is active.
    /// Does not contact any backend.
    #[tool(name = "list_storages")]
    async fn list_storages(&self) -> Result<CallToolResult, McpError> {
        let output = StorageListOutput {
            storages: self.container.list_use_case().execute(),
        };

        let json = serde_json::to_string_pretty(&output).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize storages: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Run a read query against a storage. SQL for MySQL/MariaDB and Athena; for MongoDB a JSON
    /// request such as {"collection": "users", "filter": {"age": {"$gt": 30}}, "limit": 10}.
    #[tool(name = "query")]
    async fn query(&self, params: Parameters<QueryToolInput>) -> Result<CallToolResult, McpError> {
        let input = params.0;
        debug!("query tool on {}", input.storage_id);

        let envelope = self
            .container
            .operations_use_case()
            .query(&input.storage_id, &input.query, input.parameters.as_ref())
            .await
            .map_err(domain_error_to_mcp)?;

        Ok(envelope_to_result(envelope))
    }

    /// Run a write operation (INSERT, UPDATE, DELETE, DDL, or a MongoDB write request).
    /// Only allowed on storages configured with write mode enabled.
    #[tool(name = "execute")]
    async fn execute(&self, params: Parameters<ExecuteToolInput>) -> Result<CallToolResult, McpError> {
        let input = params.0;
        debug!("execute tool on {}", input.storage_id);

        let envelope = self
            .container
            .operations_use_case()
            .execute(&input.storage_id, &input.operation, input.parameters.as_ref())
            .await
            .map_err(domain_error_to_mcp)?;

        Ok(envelope_to_result(envelope))
    }

    /// List the tables or collections of a storage.
    #[tool(name = "list_collections")]
    async fn list_collections(
        &self,
        params: Parameters<ListCollectionsToolInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;

        let envelope = self
            .container
            .operations_use_case()
            .list_collections(&input.storage_id, input.schema.as_deref())
            .await
            .map_err(domain_error_to_mcp)?;

        Ok(envelope_to_result(envelope))
    }

    /// Describe a table (columns, keys) or a collection (indexes and a schema inferred from sample documents).
    #[tool(name = "describe_collection")]
    async fn describe_collection(
        &self,
        params: Parameters<DescribeCollectionToolInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;

        let envelope = self
            .container
            .operations_use_case()
            .describe_collection(&input.storage_id, &input.collection, input.schema.as_deref())
            .await
            .map_err(domain_error_to_mcp)?;

        Ok(envelope_to_result(envelope))
    }

    /// Show the connection settings of a storage. Passwords are never returned.
    #[tool(name = "get_storage_info")]
    async fn get_storage_info(
        &self,
        params: Parameters<StorageIdInput>,
    ) -> Result<CallToolResult, McpError> {
        let info = self
            .container
            .info_use_case()
            .execute(&params.0.storage_id)
            .map_err(domain_error_to_mcp)?;

        let json = serde_json::to_string_pretty(&info).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize storage info: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for StorageMapMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Unified access to configured storages (MySQL/MariaDB, MongoDB, Athena). Call \
                 list_storages to discover storage IDs, list_collections and describe_collection \
                 to explore them, query to read and execute to write. Writes are refused unless \
                 the storage has write mode enabled."
                    .into(),
            ),
        }
    }
}

use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DomainError, ResultEnvelope, StorageSummary};

/// Input parameters for the query tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryToolInput {
    /// ID of the configured storage to query
    pub storage_id: String,

    /// Query text: SQL for relational and analytical stores, a JSON find request
    /// (`{"collection": .., "filter": ..}`) for document stores
    pub query: String,

    /// Query parameters; a JSON array bound positionally for SQL stores
    pub parameters: Option<Value>,
}

/// Input parameters for the execute tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteToolInput {
    /// ID of the configured storage
    pub storage_id: String,

    /// Write statement (SQL) or JSON write request
    /// (`{"collection": .., "operation": "insertOne", "document": ..}`) for document stores
    pub operation: String,

    /// Operation parameters; a JSON array bound positionally for SQL stores
    pub parameters: Option<Value>,
}

/// Input parameters for the list_collections tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListCollectionsToolInput {
    /// ID of the configured storage
    pub storage_id: String,

    /// Database or schema to list instead of the configured one
    pub schema: Option<String>,
}

/// Input parameters for the describe_collection tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeCollectionToolInput {
    /// ID of the configured storage
    pub storage_id: String,

    /// Table or collection name
    pub collection: String,

    /// Database or schema containing the collection
    pub schema: Option<String>,
}

/// Input parameters for the get_storage_info tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StorageIdInput {
    /// ID of the configured storage
    pub storage_id: String,
}

/// Result of the list_storages tool
#[derive(Debug, Serialize)]
pub struct StorageListOutput {
    pub storages: Vec<StorageSummary>,
}

/// Text envelopes succeed, error envelopes are tool errors the client can read.
pub fn envelope_to_result(envelope: ResultEnvelope) -> CallToolResult {
    let is_error = envelope.is_error();
    let content = vec![Content::text(envelope.as_text().to_string())];
    if is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

/// Failures to resolve a connector are caller mistakes; anything else is internal.
pub fn domain_error_to_mcp(err: DomainError) -> McpError {
    match err {
        DomainError::StorageNotFound(_)
        | DomainError::UnsupportedStorageType { .. }
        | DomainError::Configuration(_) => McpError::invalid_params(err.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

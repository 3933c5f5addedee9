use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ResultEnvelope;

/// Uniform request surface over one configured data store.
///
/// Every operation is total: backend failures are reported through the
/// error variant of [`ResultEnvelope`] and never returned as `Err`.
/// Implementations are shared between concurrent callers for the same
/// store id and must not keep per-call mutable state.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Runs a read request and returns its rows.
    async fn query(&self, query: &str, params: Option<&Value>) -> ResultEnvelope;

    /// Runs a write request. Refused without contacting the backend when
    /// the store is not in write mode.
    async fn execute(&self, operation: &str, params: Option<&Value>) -> ResultEnvelope;

    /// Lists tables/collections under `schema`, or the configured default.
    async fn list_collections(&self, schema: Option<&str>) -> ResultEnvelope;

    /// Structural metadata of one table/collection.
    async fn describe_collection(&self, collection: &str, schema: Option<&str>) -> ResultEnvelope;

    /// Releases the native pool/client, if one was opened. Idempotent.
    async fn disconnect(&self);

    fn storage_type(&self) -> &'static str;
}

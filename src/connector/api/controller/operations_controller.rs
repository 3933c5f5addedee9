use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::domain::ResultEnvelope;

use super::super::Container;

/// Runs connector operations from the command line. Error envelopes become
/// command failures carrying the envelope text.
pub struct OperationsController<'a> {
    container: &'a Container,
}

impl<'a> OperationsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn query(&self, storage_id: String, query: String, params: Option<String>) -> Result<String> {
        let params = parse_params(params)?;
        let envelope = self
            .container
            .operations_use_case()
            .query(&storage_id, &query, params.as_ref())
            .await?;
        render(envelope)
    }

    pub async fn execute(
        &self,
        storage_id: String,
        operation: String,
        params: Option<String>,
    ) -> Result<String> {
        let params = parse_params(params)?;
        let envelope = self
            .container
            .operations_use_case()
            .execute(&storage_id, &operation, params.as_ref())
            .await?;
        render(envelope)
    }

    pub async fn collections(&self, storage_id: String, schema: Option<String>) -> Result<String> {
        let envelope = self
            .container
            .operations_use_case()
            .list_collections(&storage_id, schema.as_deref())
            .await?;
        render(envelope)
    }

    pub async fn describe(
        &self,
        storage_id: String,
        collection: String,
        schema: Option<String>,
    ) -> Result<String> {
        let envelope = self
            .container
            .operations_use_case()
            .describe_collection(&storage_id, &collection, schema.as_deref())
            .await?;
        render(envelope)
    }
}

fn parse_params(params: Option<String>) -> Result<Option<Value>> {
    params
        .map(|raw| serde_json::from_str(&raw).context("--params must be valid JSON"))
        .transpose()
}

fn render(envelope: ResultEnvelope) -> Result<String> {
    if envelope.is_error() {
        bail!("{}", envelope.as_text());
    }
    Ok(envelope.as_text().to_string())
}

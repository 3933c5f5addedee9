use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::application::{Connector, TokioSleeper};
use crate::domain::{ConnectionSettings, DomainError, ResultEnvelope, StorageConfig};

use super::{materialize_rows, AthenaEngine, AwsAthenaEngine, QueryPoller, QuerySubmission};

pub const DEFAULT_CATALOG: &str = "AwsDataCatalog";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_DATABASE: &str = "default";
const DEFAULT_WORKGROUP: &str = "primary";

/// Connection settings after falling back to the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthenaSettings {
    pub region: String,
    pub output_location: String,
    pub database: String,
    pub workgroup: String,
}

impl AthenaSettings {
    pub fn from_env(connection: &ConnectionSettings) -> Result<Self, DomainError> {
        Self::resolve(connection, |key| std::env::var(key).ok())
    }

    /// Each field prefers the descriptor, then `env`, then a default. The
    /// output location has no default.
    pub fn resolve<F>(connection: &ConnectionSettings, env: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |field: &Option<String>, key: &str| {
            field
                .clone()
                .filter(|value| !value.is_empty())
                .or_else(|| env(key).filter(|value| !value.is_empty()))
        };

        let output_location = pick(&connection.s3_output_location, "ATHENA_S3_OUTPUT").ok_or_else(|| {
            DomainError::configuration(
                "Athena S3 output location is required (s3OutputLocation or ATHENA_S3_OUTPUT)",
            )
        })?;

        Ok(Self {
            region: pick(&connection.region, "AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            output_location,
            database: pick(&connection.database, "ATHENA_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            workgroup: pick(&connection.workgroup, "ATHENA_WORKGROUP")
                .unwrap_or_else(|| DEFAULT_WORKGROUP.to_string()),
        })
    }
}

/// Connector for the asynchronous analytical query service.
///
/// Every statement is submitted, polled to completion and then read back
/// page by page. Writes are statements too (DDL, `INSERT INTO ... SELECT`),
/// gated by write mode.
pub struct AthenaConnector {
    config: StorageConfig,
    settings: AthenaSettings,
    engine: Arc<dyn AthenaEngine>,
    poller: QueryPoller,
}

impl AthenaConnector {
    pub fn new(config: &StorageConfig) -> Result<Self, DomainError> {
        let settings = AthenaSettings::from_env(config.connection())?;
        let engine = Arc::new(AwsAthenaEngine::new(settings.region.clone()));
        Ok(Self::with_engine(
            config,
            settings,
            engine,
            QueryPoller::new(Arc::new(TokioSleeper)),
        ))
    }

    pub fn with_engine(
        config: &StorageConfig,
        settings: AthenaSettings,
        engine: Arc<dyn AthenaEngine>,
        poller: QueryPoller,
    ) -> Self {
        Self {
            config: config.clone(),
            settings,
            engine,
            poller,
        }
    }

    async fn run_query(&self, sql: &str) -> Result<Value, DomainError> {
        let execution_id = self
            .engine
            .start_query(QuerySubmission {
                sql,
                database: &self.settings.database,
                output_location: &self.settings.output_location,
                workgroup: &self.settings.workgroup,
            })
            .await?;
        debug!("Submitted query {} on {}", execution_id, self.config.id());

        let checks = self.poller.wait(self.engine.as_ref(), &execution_id).await?;
        info!(
            "Query {} on {} finished after {} status checks",
            execution_id,
            self.config.id(),
            checks
        );

        let rows = materialize_rows(self.engine.query_results(&execution_id).await?);
        Ok(json!({
            "queryExecutionId": execution_id,
            "rowCount": rows.len(),
            "rows": rows,
        }))
    }

    async fn run_list_tables(&self, database: &str) -> Result<Value, DomainError> {
        let tables = self.engine.list_tables(DEFAULT_CATALOG, database).await?;
        Ok(json!({
            "tables": tables,
            "count": tables.len(),
            "database": database,
        }))
    }

    async fn run_describe(&self, table: &str, database: &str) -> Result<Value, DomainError> {
        let description = self.engine.table_metadata(DEFAULT_CATALOG, database, table).await?;
        Ok(json!({
            "table": table,
            "database": database,
            "columns": description.columns,
            "partitionKeys": description.partition_keys,
            "tableType": description.table_type,
            "location": description.location,
        }))
    }

    fn target_database<'a>(&'a self, schema: Option<&'a str>) -> &'a str {
        schema.unwrap_or(&self.settings.database)
    }
}

#[async_trait]
impl Connector for AthenaConnector {
    async fn query(&self, query: &str, _params: Option<&Value>) -> ResultEnvelope {
        let outcome = self.run_query(query).await;
        ResultEnvelope::from_outcome(outcome, || {
            json!({ "query": query, "database": self.settings.database })
        })
    }

    async fn execute(&self, operation: &str, _params: Option<&Value>) -> ResultEnvelope {
        let outcome = if self.config.write_mode() {
            self.run_query(operation).await
        } else {
            Err(DomainError::WriteModeDisabled)
        };
        ResultEnvelope::from_outcome(outcome, || json!({ "operation": operation }))
    }

    async fn list_collections(&self, schema: Option<&str>) -> ResultEnvelope {
        let database = self.target_database(schema);
        let outcome = self.run_list_tables(database).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "database": database }))
    }

    async fn describe_collection(&self, collection: &str, schema: Option<&str>) -> ResultEnvelope {
        let database = self.target_database(schema);
        let outcome = self.run_describe(collection, database).await;
        ResultEnvelope::from_outcome(outcome, || {
            json!({ "table": collection, "database": database })
        })
    }

    // Each request is independent; there is no session to release.
    async fn disconnect(&self) {
        debug!("Nothing to release for {}", self.config.id());
    }

    fn storage_type(&self) -> &'static str {
        "athena"
    }
}

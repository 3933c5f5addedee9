use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_athena::config::Region;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{Column, QueryExecutionContext, ResultConfiguration};
use aws_sdk_athena::Client;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::domain::{DomainError, QueryState, QueryStatus};

/// Where and how a statement is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySubmission<'a> {
    pub sql: &'a str,
    pub database: &'a str,
    pub output_location: &'a str,
    pub workgroup: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescription {
    pub columns: Vec<ColumnDescription>,
    pub partition_keys: Vec<ColumnDescription>,
    pub table_type: Option<String>,
    pub location: Option<String>,
}

/// Native calls of the asynchronous query service.
///
/// Kept narrow so the polling and materialization logic can be driven by an
/// in-process fake.
#[async_trait]
pub trait AthenaEngine: Send + Sync {
    /// Submits a statement and returns its execution id.
    async fn start_query(&self, submission: QuerySubmission<'_>) -> Result<String, DomainError>;

    async fn query_status(&self, execution_id: &str) -> Result<QueryStatus, DomainError>;

    /// Every page of the result set as raw string cells, header row first.
    async fn query_results(&self, execution_id: &str) -> Result<Vec<Vec<Option<String>>>, DomainError>;

    async fn list_tables(&self, catalog: &str, database: &str) -> Result<Vec<String>, DomainError>;

    async fn table_metadata(
        &self,
        catalog: &str,
        database: &str,
        table: &str,
    ) -> Result<TableDescription, DomainError>;
}

/// [`AthenaEngine`] over the AWS SDK. The client is built on first use so
/// construction stays synchronous.
pub struct AwsAthenaEngine {
    region: String,
    client: OnceCell<Client>,
}

impl AwsAthenaEngine {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                debug!("Loading AWS configuration for region {}", self.region);
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(self.region.clone()))
                    .load()
                    .await;
                Client::new(&sdk_config)
            })
            .await
    }
}

fn sdk_error<E: std::error::Error>(err: E) -> DomainError {
    DomainError::query(DisplayErrorContext(err).to_string())
}

fn describe_columns(columns: &[Column]) -> Vec<ColumnDescription> {
    columns
        .iter()
        .map(|column| ColumnDescription {
            name: column.name().to_string(),
            data_type: column.r#type().map(str::to_string),
            comment: column.comment().map(str::to_string),
        })
        .collect()
}

#[async_trait]
impl AthenaEngine for AwsAthenaEngine {
    async fn start_query(&self, submission: QuerySubmission<'_>) -> Result<String, DomainError> {
        let output = self
            .client()
            .await
            .start_query_execution()
            .query_string(submission.sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(submission.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(submission.output_location)
                    .build(),
            )
            .work_group(submission.workgroup)
            .send()
            .await
            .map_err(sdk_error)?;

        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| DomainError::query("Failed to start query execution"))
    }

    async fn query_status(&self, execution_id: &str) -> Result<QueryStatus, DomainError> {
        let output = self
            .client()
            .await
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(sdk_error)?;

        let status = output.query_execution().and_then(|execution| execution.status());
        let state = status
            .and_then(|status| status.state())
            .map(|state| QueryState::parse(state.as_str()))
            .unwrap_or(QueryState::Submitted);

        Ok(QueryStatus {
            state,
            reason: status
                .and_then(|status| status.state_change_reason())
                .map(str::to_string),
        })
    }

    async fn query_results(&self, execution_id: &str) -> Result<Vec<Vec<Option<String>>>, DomainError> {
        let client = self.client().await;
        let mut rows = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = client
                .get_query_results()
                .query_execution_id(execution_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(sdk_error)?;

            if let Some(result_set) = output.result_set() {
                rows.extend(result_set.rows().iter().map(|row| {
                    row.data()
                        .iter()
                        .map(|datum| datum.var_char_value().map(str::to_string))
                        .collect::<Vec<_>>()
                }));
            }

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(rows)
    }

    async fn list_tables(&self, catalog: &str, database: &str) -> Result<Vec<String>, DomainError> {
        let client = self.client().await;
        let mut tables = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = client
                .list_table_metadata()
                .catalog_name(catalog)
                .database_name(database)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(sdk_error)?;

            tables.extend(
                output
                    .table_metadata_list()
                    .iter()
                    .map(|table| table.name().to_string()),
            );

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(tables)
    }

    async fn table_metadata(
        &self,
        catalog: &str,
        database: &str,
        table: &str,
    ) -> Result<TableDescription, DomainError> {
        let output = self
            .client()
            .await
            .get_table_metadata()
            .catalog_name(catalog)
            .database_name(database)
            .table_name(table)
            .send()
            .await
            .map_err(sdk_error)?;

        let Some(metadata) = output.table_metadata() else {
            return Ok(TableDescription::default());
        };

        Ok(TableDescription {
            columns: describe_columns(metadata.columns()),
            partition_keys: describe_columns(metadata.partition_keys()),
            table_type: metadata.table_type().map(str::to_string),
            location: metadata
                .parameters()
                .and_then(|parameters| parameters.get("location"))
                .cloned(),
        })
    }
}

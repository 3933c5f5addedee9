use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::Connector;
use crate::domain::{DomainError, ResultEnvelope, StorageConfig};

const DEFAULT_PORT: u16 = 3306;
const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// Relational connector for MySQL/MariaDB over a lazily opened `sqlx` pool.
pub struct MySqlConnector {
    config: StorageConfig,
    pool: Mutex<Option<MySqlPool>>,
}

impl MySqlConnector {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            config: config.clone(),
            pool: Mutex::new(None),
        }
    }

    /// Whether the pool has been opened. Opening is deferred to the first
    /// operation that needs the backend.
    pub async fn is_connected(&self) -> bool {
        self.pool.lock().await.is_some()
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let conn = self.config.connection();
        let mut options = MySqlConnectOptions::new()
            .host(conn.host.as_deref().unwrap_or("localhost"))
            .port(conn.port.unwrap_or(DEFAULT_PORT));

        if let Some(user) = conn.user.as_deref() {
            options = options.username(user);
        }
        if let Some(password) = conn.password.as_deref() {
            options = options.password(password);
        }
        if let Some(database) = conn.database.as_deref() {
            options = options.database(database);
        }
        options
    }

    async fn pool(&self) -> MySqlPool {
        let mut guard = self.pool.lock().await;
        guard
            .get_or_insert_with(|| {
                debug!("Opening MySQL pool for {}", self.config.id());
                MySqlPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect_lazy_with(self.connect_options())
            })
            .clone()
    }

    fn default_database(&self) -> Option<&str> {
        self.config.connection().database.as_deref()
    }

    async fn run_query(&self, query: &str, params: Option<&Value>) -> Result<Value, DomainError> {
        let statement = bind_params(sqlx::query(query), params)?;
        let pool = self.pool().await;

        let rows = statement.fetch_all(&pool).await.map_err(map_sqlx_error)?;
        let rows: Vec<Value> = rows.iter().map(|row| Value::Object(row_to_json(row))).collect();

        Ok(json!({
            "rowCount": rows.len(),
            "rows": rows,
        }))
    }

    async fn run_execute(&self, operation: &str, params: Option<&Value>) -> Result<Value, DomainError> {
        if !self.config.write_mode() {
            return Err(DomainError::WriteModeDisabled);
        }

        let statement = bind_params(sqlx::query(operation), params)?;
        let pool = self.pool().await;

        let result = statement.execute(&pool).await.map_err(map_sqlx_error)?;
        let affected = result.rows_affected();

        Ok(json!({
            "affectedRows": affected,
            "insertId": result.last_insert_id(),
            "message": format!("{} row(s) affected", affected),
        }))
    }

    async fn run_list_collections(&self, schema: Option<&str>) -> Result<Value, DomainError> {
        let database = schema.or(self.default_database());
        let pool = self.pool().await;

        let rows = match database {
            Some(database) => sqlx::query(
                "SELECT TABLE_NAME FROM information_schema.tables \
                 WHERE TABLE_SCHEMA = ? ORDER BY TABLE_NAME",
            )
            .bind(database.to_string())
            .fetch_all(&pool)
            .await,
            None => sqlx::query("SHOW TABLES").fetch_all(&pool).await,
        }
        .map_err(map_sqlx_error)?;

        let tables: Vec<String> = rows
            .iter()
            .filter_map(|row| match column_value(row, 0) {
                Value::String(name) => Some(name),
                _ => None,
            })
            .collect();

        Ok(json!({
            "count": tables.len(),
            "database": database,
            "tables": tables,
        }))
    }

    async fn run_describe(&self, table: &str, schema: Option<&str>) -> Result<Value, DomainError> {
        let database = schema.or(self.default_database());
        let pool = self.pool().await;

        let rows = sqlx::query(
            "SELECT COLUMN_NAME AS `Field`, COLUMN_TYPE AS `Type`, IS_NULLABLE AS `Null`, \
                    COLUMN_KEY AS `Key`, COLUMN_DEFAULT AS `Default`, EXTRA AS `Extra` \
             FROM information_schema.columns \
             WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(database.map(str::to_string))
        .bind(table.to_string())
        .fetch_all(&pool)
        .await
        .map_err(map_sqlx_error)?;

        if rows.is_empty() {
            return Err(DomainError::query(format!(
                "Table '{}' doesn't exist",
                qualified_name(database, table)
            )));
        }

        let columns: Vec<Value> = rows.iter().map(|row| Value::Object(row_to_json(row))).collect();

        Ok(json!({
            "columns": columns,
            "database": database,
            "table": table,
        }))
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn query(&self, query: &str, params: Option<&Value>) -> ResultEnvelope {
        let outcome = self.run_query(query, params).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "query": query }))
    }

    async fn execute(&self, operation: &str, params: Option<&Value>) -> ResultEnvelope {
        let outcome = self.run_execute(operation, params).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "operation": operation }))
    }

    async fn list_collections(&self, schema: Option<&str>) -> ResultEnvelope {
        let outcome = self.run_list_collections(schema).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "schema": schema }))
    }

    async fn describe_collection(&self, collection: &str, schema: Option<&str>) -> ResultEnvelope {
        let outcome = self.run_describe(collection, schema).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "table": collection, "schema": schema }))
    }

    async fn disconnect(&self) {
        let pool = self.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            debug!("Closed MySQL pool for {}", self.config.id());
        }
    }

    fn storage_type(&self) -> &'static str {
        "mysql"
    }
}

fn qualified_name(database: Option<&str>, table: &str) -> String {
    match database {
        Some(database) => format!("{}.{}", database, table),
        None => table.to_string(),
    }
}

/// Binds a JSON array positionally. Anything but an array (or no params)
/// is rejected.
fn bind_params<'q>(query: MySqlQuery<'q>, params: Option<&Value>) -> Result<MySqlQuery<'q>, DomainError> {
    match params {
        None | Some(Value::Null) => Ok(query),
        Some(Value::Array(values)) => Ok(values.iter().fold(query, bind_value)),
        Some(other) => Err(DomainError::malformed(format!(
            "SQL parameters must be a JSON array of positional values, got {}",
            json_kind(other)
        ))),
    }
}

fn bind_value<'q>(query: MySqlQuery<'q>, value: &Value) -> MySqlQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        nested => query.bind(nested.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn map_sqlx_error(e: sqlx::Error) -> DomainError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => DomainError::connection(e.to_string()),
        other => DomainError::query(other.to_string()),
    }
}

fn row_to_json(row: &MySqlRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), column_value(row, column.ordinal())))
        .collect()
}

/// Converts one cell to JSON based on the column's MySQL type name.
fn column_value(row: &MySqlRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    let decoded = match type_name.as_str() {
        "BOOLEAN" => row.try_get_unchecked::<bool, _>(index).map(Value::from),
        t if t.ends_with("UNSIGNED") || t == "BIT" => {
            row.try_get_unchecked::<u64, _>(index).map(Value::from)
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get_unchecked::<i64, _>(index).map(Value::from)
        }
        "FLOAT" => row
            .try_get_unchecked::<f32, _>(index)
            .map(|f| Value::from(f as f64)),
        "DOUBLE" => row.try_get_unchecked::<f64, _>(index).map(Value::from),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(index)
            .map(|d| Value::String(d.to_string())),
        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(index)
            .map(|t| Value::String(t.to_string())),
        "DATETIME" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .map(|dt| Value::String(dt.to_string())),
        "TIMESTAMP" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(index)
            .map(|dt| Value::String(dt.to_rfc3339())),
        "JSON" => row.try_get::<Value, _>(index),
        t if t.contains("BINARY") || t.contains("BLOB") => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(bytes_to_json),
        _ => row.try_get_unchecked::<String, _>(index).map(Value::String),
    };

    decoded.unwrap_or_else(|_| {
        row.try_get_unchecked::<Vec<u8>, _>(index)
            .map(bytes_to_json)
            .unwrap_or(Value::Null)
    })
}

fn bytes_to_json(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e) => Value::from(e.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionSettings, StorageType};

    fn connector(write_mode: bool) -> MySqlConnector {
        let config = StorageConfig::new(
            "main",
            StorageType::MySql,
            ConnectionSettings {
                host: Some("127.0.0.1".into()),
                database: Some("shop".into()),
                ..Default::default()
            },
        )
        .with_write_mode(write_mode);
        MySqlConnector::new(&config)
    }

    #[tokio::test]
    async fn test_execute_refused_without_write_mode() {
        let connector = connector(false);

        let envelope = connector.execute("DELETE FROM orders", None).await;
        let payload = envelope.payload().unwrap();

        assert!(envelope.is_error());
        assert_eq!(
            payload["error"],
            "Write operations are not allowed for this connection"
        );
        assert_eq!(payload["operation"], "DELETE FROM orders");
        assert!(!connector.is_connected().await);
    }

    #[tokio::test]
    async fn test_object_params_are_malformed() {
        let connector = connector(true);

        let envelope = connector
            .query("SELECT * FROM orders WHERE id = ?", Some(&json!({"id": 1})))
            .await;
        let payload = envelope.payload().unwrap();

        assert!(envelope.is_error());
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .starts_with("Malformed operation payload"));
        assert_eq!(payload["query"], "SELECT * FROM orders WHERE id = ?");
        assert!(!connector.is_connected().await);
    }

    #[tokio::test]
    async fn test_disconnect_without_pool_is_noop() {
        let connector = connector(false);
        connector.disconnect().await;
        assert!(!connector.is_connected().await);
    }

    #[test]
    fn test_bind_params_accepts_arrays_and_null() {
        assert!(bind_params(sqlx::query("SELECT ?"), Some(&json!([1, "a", null, 2.5, true]))).is_ok());
        assert!(bind_params(sqlx::query("SELECT 1"), Some(&Value::Null)).is_ok());
        assert!(bind_params(sqlx::query("SELECT 1"), None).is_ok());
        assert!(bind_params(sqlx::query("SELECT ?"), Some(&json!("x"))).is_err());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name(Some("shop"), "orders"), "shop.orders");
        assert_eq!(qualified_name(None, "orders"), "orders");
    }

    #[test]
    fn test_bytes_to_json() {
        assert_eq!(bytes_to_json(b"abc".to_vec()), json!("abc"));
        assert_eq!(bytes_to_json(vec![0xff, 0x00]), json!([255, 0]));
    }
}

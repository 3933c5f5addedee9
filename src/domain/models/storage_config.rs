use serde::{Deserialize, Serialize};

/// Backend family a configured store belongs to.
///
/// Unknown tags are kept verbatim so the registry can report them back
/// to the caller instead of failing at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageType {
    MySql,
    PostgreSql,
    MongoDb,
    Athena,
    BigQuery,
    Redis,
    Other(String),
}

impl StorageType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mysql" => StorageType::MySql,
            "postgresql" => StorageType::PostgreSql,
            "mongodb" => StorageType::MongoDb,
            "athena" => StorageType::Athena,
            "bigquery" => StorageType::BigQuery,
            "redis" => StorageType::Redis,
            other => StorageType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StorageType::MySql => "mysql",
            StorageType::PostgreSql => "postgresql",
            StorageType::MongoDb => "mongodb",
            StorageType::Athena => "athena",
            StorageType::BigQuery => "bigquery",
            StorageType::Redis => "redis",
            StorageType::Other(tag) => tag,
        }
    }
}

impl From<String> for StorageType {
    fn from(value: String) -> Self {
        StorageType::parse(&value)
    }
}

impl From<StorageType> for String {
    fn from(value: StorageType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend-specific connection fields. Every field is optional; each
/// adapter reads the subset it understands.
///
/// `password` is accepted on input but never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Full connection string, takes precedence over host/port for document stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_output_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workgroup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file_path: Option<String>,
}

impl ConnectionSettings {
    pub fn is_empty(&self) -> bool {
        *self == ConnectionSettings::default()
    }

    /// Copy of these settings safe to show to a caller: no password, and
    /// any credentials embedded in `uri` masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.password = None;
        copy.uri = copy.uri.as_deref().map(redact_uri_credentials);
        copy
    }
}

fn redact_uri_credentials(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return uri.to_string();
    };
    let userinfo = &rest[..at];
    let user = userinfo.split(':').next().unwrap_or_default();
    format!("{}{}:****{}", &uri[..scheme_end + 3], user, &rest[at..])
}

/// Immutable descriptor of one configured store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    id: String,
    storage_type: StorageType,
    write_mode: bool,
    connection: ConnectionSettings,
}

impl StorageConfig {
    pub fn new(id: impl Into<String>, storage_type: StorageType, connection: ConnectionSettings) -> Self {
        Self {
            id: id.into(),
            storage_type,
            write_mode: false,
            connection,
        }
    }

    pub fn with_write_mode(mut self, write_mode: bool) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn storage_type(&self) -> &StorageType {
        &self.storage_type
    }

    pub fn write_mode(&self) -> bool {
        self.write_mode
    }

    pub fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }

    pub fn summary(&self, status: StorageStatus) -> StorageSummary {
        StorageSummary {
            id: self.id.clone(),
            storage_type: self.storage_type.clone(),
            write_mode: self.write_mode,
            status,
        }
    }

    pub fn info(&self) -> StorageInfo {
        StorageInfo {
            id: self.id.clone(),
            storage_type: self.storage_type.clone(),
            write_mode: self.write_mode,
            connection: self.connection.redacted(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageStatus {
    /// Configured, no connector created yet.
    Configured,
    /// A connector instance is cached for this store.
    Active,
}

impl StorageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageStatus::Configured => "configured",
            StorageStatus::Active => "active",
        }
    }
}

impl std::fmt::Display for StorageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Row of the `list_storages` listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    pub write_mode: bool,
    pub status: StorageStatus,
}

/// Public view of a descriptor returned by `get_storage_info`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    pub write_mode: bool,
    pub connection: ConnectionSettings,
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported storage type: {requested}. Available types: {available}")]
    UnsupportedStorageType { requested: String, available: String },

    #[error("Storage {0} not found")]
    StorageNotFound(String),

    #[error("Write operations are not allowed for this connection")]
    WriteModeDisabled,

    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    #[error("Query failed: {0}")]
    QueryFailure(String),

    #[error("Query was cancelled")]
    QueryCancelled,

    #[error("Query timeout - exceeded maximum wait time after {attempts} status checks")]
    QueryTimeout { attempts: u32 },

    #[error("Malformed operation payload: {0}")]
    MalformedPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unsupported_type(requested: impl Into<String>, available: &[String]) -> Self {
        let available = if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        };
        Self::UnsupportedStorageType {
            requested: requested.into(),
            available,
        }
    }

    pub fn storage_not_found(id: impl Into<String>) -> Self {
        Self::StorageNotFound(id.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionFailure(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryFailure(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::QueryTimeout { .. })
    }

    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, Self::UnsupportedStorageType { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StorageNotFound(_))
    }
}

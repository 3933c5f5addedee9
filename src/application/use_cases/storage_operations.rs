use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::application::{Connector, ConnectorRegistry};
use crate::domain::{DomainError, ResultEnvelope, StorageConfig};

pub(crate) fn find_config<'a>(
    configs: &'a [StorageConfig],
    storage_id: &str,
) -> Result<&'a StorageConfig, DomainError> {
    configs
        .iter()
        .find(|config| config.id() == storage_id)
        .ok_or_else(|| DomainError::storage_not_found(storage_id))
}

/// Resolves a storage id and forwards the four capability operations to its
/// connector.
///
/// `Err` is reserved for boundary problems (unknown id, unsupported type,
/// connector construction); everything the backend reports comes back as a
/// [`ResultEnvelope`].
pub struct StorageOperationsUseCase {
    configs: Arc<[StorageConfig]>,
    registry: Arc<ConnectorRegistry>,
}

impl StorageOperationsUseCase {
    pub fn new(configs: Arc<[StorageConfig]>, registry: Arc<ConnectorRegistry>) -> Self {
        Self { configs, registry }
    }

    fn connector(&self, storage_id: &str) -> Result<Arc<dyn Connector>, DomainError> {
        let config = find_config(&self.configs, storage_id)?;
        self.registry.get_connector(storage_id, config)
    }

    pub async fn query(
        &self,
        storage_id: &str,
        query: &str,
        params: Option<&Value>,
    ) -> Result<ResultEnvelope, DomainError> {
        let connector = self.connector(storage_id)?;
        debug!("query on {} ({})", storage_id, connector.storage_type());
        Ok(connector.query(query, params).await)
    }

    pub async fn execute(
        &self,
        storage_id: &str,
        operation: &str,
        params: Option<&Value>,
    ) -> Result<ResultEnvelope, DomainError> {
        let connector = self.connector(storage_id)?;
        debug!("execute on {} ({})", storage_id, connector.storage_type());
        Ok(connector.execute(operation, params).await)
    }

    pub async fn list_collections(
        &self,
        storage_id: &str,
        schema: Option<&str>,
    ) -> Result<ResultEnvelope, DomainError> {
        let connector = self.connector(storage_id)?;
        Ok(connector.list_collections(schema).await)
    }

    pub async fn describe_collection(
        &self,
        storage_id: &str,
        collection: &str,
        schema: Option<&str>,
    ) -> Result<ResultEnvelope, DomainError> {
        let connector = self.connector(storage_id)?;
        Ok(connector.describe_collection(collection, schema).await)
    }

    /// Disconnects and evicts every live connector.
    pub async fn disconnect_all(&self) {
        for connector in self.registry.clear_instances() {
            connector.disconnect().await;
        }
    }
}

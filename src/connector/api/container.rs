use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{
    ConnectorRegistry, ListStoragesUseCase, StorageInfoUseCase, StorageOperationsUseCase,
};
use crate::connector::adapter::register_builtin_connectors;
use crate::connector::config::StorageConfigResolver;
use crate::domain::StorageConfig;

pub struct ContainerConfig {
    /// Store descriptors, already resolved.
    pub storages: Vec<StorageConfig>,
}

impl ContainerConfig {
    pub fn from_env() -> Self {
        Self {
            storages: StorageConfigResolver::from_env(),
        }
    }
}

/// Owns the resolved descriptors and the connector registry for the process
/// and hands out use cases over them.
pub struct Container {
    configs: Arc<[StorageConfig]>,
    registry: Arc<ConnectorRegistry>,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Self {
        let registry = ConnectorRegistry::new();
        register_builtin_connectors(&registry);
        Self::with_registry(config, Arc::new(registry))
    }

    /// Uses `registry` as is, without adding the built-in connectors.
    pub fn with_registry(config: ContainerConfig, registry: Arc<ConnectorRegistry>) -> Self {
        for storage in &config.storages {
            if !registry.is_type_supported(storage.storage_type().as_str()) {
                debug!(
                    "Storage {} has type {} with no registered connector",
                    storage.id(),
                    storage.storage_type()
                );
            }
        }
        info!("Loaded {} storage configuration(s)", config.storages.len());

        Self {
            configs: config.storages.into(),
            registry,
        }
    }

    pub fn storages(&self) -> &[StorageConfig] {
        &self.configs
    }

    pub fn registry(&self) -> Arc<ConnectorRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn list_use_case(&self) -> ListStoragesUseCase {
        ListStoragesUseCase::new(Arc::clone(&self.configs), Arc::clone(&self.registry))
    }

    pub fn info_use_case(&self) -> StorageInfoUseCase {
        StorageInfoUseCase::new(Arc::clone(&self.configs))
    }

    pub fn operations_use_case(&self) -> StorageOperationsUseCase {
        StorageOperationsUseCase::new(Arc::clone(&self.configs), Arc::clone(&self.registry))
    }
}

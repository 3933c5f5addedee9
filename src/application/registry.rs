use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::application::Connector;
use crate::domain::{DomainError, StorageConfig};

/// Builds a connector for one store descriptor.
pub type ConnectorConstructor =
    Arc<dyn Fn(&StorageConfig) -> Result<Arc<dyn Connector>, DomainError> + Send + Sync>;

/// Maps storage type tags to connector constructors and caches exactly one
/// live connector per store id.
///
/// Connectors are created lazily on first [`get_connector`](Self::get_connector)
/// and the same instance is handed out on every later call, so native pools
/// are opened once per store.
#[derive(Default)]
pub struct ConnectorRegistry {
    registrations: RwLock<HashMap<String, ConnectorConstructor>>,
    instances: RwLock<HashMap<String, Arc<dyn Connector>>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the constructor for `storage_type`.
    pub fn register<F>(&self, storage_type: &str, constructor: F)
    where
        F: Fn(&StorageConfig) -> Result<Arc<dyn Connector>, DomainError> + Send + Sync + 'static,
    {
        let normalized = storage_type.to_lowercase();
        debug!("Registering connector for storage type {}", normalized);
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalized, Arc::new(constructor));
    }

    /// Returns the cached connector for `storage_id`, creating it from
    /// `config` on first use.
    ///
    /// Fails with [`DomainError::UnsupportedStorageType`] when no constructor
    /// is registered for the descriptor's type. Constructor errors propagate.
    pub fn get_connector(
        &self,
        storage_id: &str,
        config: &StorageConfig,
    ) -> Result<Arc<dyn Connector>, DomainError> {
        if let Some(existing) = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(storage_id)
        {
            return Ok(Arc::clone(existing));
        }

        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have won the race between the two locks.
        if let Some(existing) = instances.get(storage_id) {
            return Ok(Arc::clone(existing));
        }

        let storage_type = config.storage_type().as_str().to_lowercase();
        let constructor = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&storage_type)
            .cloned();

        let Some(constructor) = constructor else {
            return Err(DomainError::unsupported_type(
                config.storage_type().as_str(),
                &self.supported_types(),
            ));
        };

        let connector = constructor(config)?;
        instances.insert(storage_id.to_string(), Arc::clone(&connector));
        info!(
            "Created {} connector for storage {}",
            connector.storage_type(),
            storage_id
        );

        Ok(connector)
    }

    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    pub fn is_type_supported(&self, storage_type: &str) -> bool {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&storage_type.to_lowercase())
    }

    pub fn has_connector(&self, storage_id: &str) -> bool {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(storage_id)
    }

    pub fn active_storage_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Drops the cached connector for `storage_id` and returns it so the caller
    /// can disconnect it. Does not close the native session itself.
    pub fn remove_connector(&self, storage_id: &str) -> Option<Arc<dyn Connector>> {
        let removed = self
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(storage_id);
        info!("Removed connector instance for {}", storage_id);
        removed
    }

    /// Drops every cached connector. Does not close native sessions.
    pub fn clear_instances(&self) -> Vec<Arc<dyn Connector>> {
        let drained: Vec<Arc<dyn Connector>> = self
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, connector)| connector)
            .collect();
        info!("Cleared all connector instances");
        drained
    }
}

use std::sync::Arc;

use crate::domain::{DomainError, StorageConfig, StorageInfo};

use super::storage_operations::find_config;

pub struct StorageInfoUseCase {
    configs: Arc<[StorageConfig]>,
}

impl StorageInfoUseCase {
    pub fn new(configs: Arc<[StorageConfig]>) -> Self {
        Self { configs }
    }

    /// Public fields of one descriptor; never the password.
    pub fn execute(&self, storage_id: &str) -> Result<StorageInfo, DomainError> {
        find_config(&self.configs, storage_id).map(StorageConfig::info)
    }
}

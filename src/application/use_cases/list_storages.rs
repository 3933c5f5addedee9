use std::sync::Arc;

use crate::application::ConnectorRegistry;
use crate::domain::{StorageConfig, StorageStatus, StorageSummary};

/// Lists every configured store without contacting any backend.
pub struct ListStoragesUseCase {
    configs: Arc<[StorageConfig]>,
    registry: Arc<ConnectorRegistry>,
}

impl ListStoragesUseCase {
    pub fn new(configs: Arc<[StorageConfig]>, registry: Arc<ConnectorRegistry>) -> Self {
        Self { configs, registry }
    }

    pub fn execute(&self) -> Vec<StorageSummary> {
        self.configs
            .iter()
            .map(|config| {
                let status = if self.registry.has_connector(config.id()) {
                    StorageStatus::Active
                } else {
                    StorageStatus::Configured
                };
                config.summary(status)
            })
            .collect()
    }

    pub fn supported_types(&self) -> Vec<String> {
        self.registry.supported_types()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionSettings, StorageType};

    #[test]
    fn test_list_storages_omits_passwords() {
        let configs: Arc<[StorageConfig]> = vec![StorageConfig::new(
            "main",
            StorageType::MySql,
            ConnectionSettings {
                host: Some("localhost".into()),
                password: Some("hunter2".into()),
                ..Default::default()
            },
        )
        .with_write_mode(true)]
        .into();
        let use_case = ListStoragesUseCase::new(configs, Arc::new(ConnectorRegistry::new()));

        let storages = use_case.execute();
        let json = serde_json::to_string(&storages).unwrap();

        assert_eq!(storages.len(), 1);
        assert_eq!(storages[0].status, StorageStatus::Configured);
        assert!(storages[0].write_mode);
        assert!(!json.contains("password"));
        assert!(!json.contains("hunter2"));
    }
}

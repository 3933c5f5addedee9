//! Backend connectors and the MCP transport adapter.

pub mod athena;
pub mod mcp;
mod mongodb_connector;
mod mysql_connector;

use std::sync::Arc;

pub use athena::AthenaConnector;
pub use mongodb_connector::*;
pub use mysql_connector::*;

use crate::application::{Connector, ConnectorRegistry};

/// Registers the connectors shipped with the crate.
///
/// `mariadb` is served by the MySQL connector.
pub fn register_builtin_connectors(registry: &ConnectorRegistry) {
    registry.register("mysql", |config| {
        Ok(Arc::new(MySqlConnector::new(config)) as Arc<dyn Connector>)
    });
    registry.register("mariadb", |config| {
        Ok(Arc::new(MySqlConnector::new(config)) as Arc<dyn Connector>)
    });
    registry.register("mongodb", |config| {
        Ok(Arc::new(MongoDbConnector::new(config)) as Arc<dyn Connector>)
    });
    registry.register("athena", |config| {
        Ok(Arc::new(AthenaConnector::new(config)?) as Arc<dyn Connector>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionSettings, StorageConfig, StorageType};

    fn registry() -> ConnectorRegistry {
        let registry = ConnectorRegistry::new();
        register_builtin_connectors(&registry);
        registry
    }

    #[test]
    fn test_builtin_types() {
        assert_eq!(
            registry().supported_types(),
            vec!["athena", "mariadb", "mongodb", "mysql"]
        );
    }

    #[tokio::test]
    async fn test_construction_does_not_contact_backends() {
        let registry = registry();
        let mysql = StorageConfig::new(
            "orders",
            StorageType::parse("mariadb"),
            ConnectionSettings {
                host: Some("db.invalid".into()),
                ..Default::default()
            },
        );
        let mongo = StorageConfig::new("docs", StorageType::MongoDb, ConnectionSettings::default());

        assert_eq!(registry.get_connector("orders", &mysql).unwrap().storage_type(), "mysql");
        assert_eq!(registry.get_connector("docs", &mongo).unwrap().storage_type(), "mongodb");
        assert_eq!(registry.active_storage_ids(), vec!["docs", "orders"]);
    }

    #[test]
    fn test_athena_requires_output_location() {
        let registry = registry();
        let missing = StorageConfig::new(
            "lake",
            StorageType::Athena,
            ConnectionSettings {
                region: Some("eu-west-1".into()),
                ..Default::default()
            },
        );
        let complete = StorageConfig::new(
            "lake2",
            StorageType::Athena,
            ConnectionSettings {
                s3_output_location: Some("s3://results/".into()),
                ..Default::default()
            },
        );

        if std::env::var("ATHENA_S3_OUTPUT").is_err() {
            assert!(matches!(
                registry.get_connector("lake", &missing),
                Err(crate::domain::DomainError::Configuration(_))
            ));
            assert!(!registry.has_connector("lake"));
        }
        assert!(registry.get_connector("lake2", &complete).is_ok());
    }

    #[test]
    fn test_unregistered_type_lists_builtins() {
        let config = StorageConfig::new("cache", StorageType::Redis, ConnectionSettings::default());

        let err = registry().get_connector("cache", &config).err().unwrap();

        assert_eq!(
            err.to_string(),
            "Unsupported storage type: redis. Available types: athena, mariadb, mongodb, mysql"
        );
    }
}

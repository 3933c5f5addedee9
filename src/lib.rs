pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    Connector, ConnectorRegistry, ListStoragesUseCase, Sleeper, StorageInfoUseCase,
    StorageOperationsUseCase, TokioSleeper,
};

pub use connector::{
    register_builtin_connectors, AthenaConnector, Container, ContainerConfig, MongoDbConnector,
    MySqlConnector, StorageConfigResolver,
};

pub use domain::{
    ConnectionSettings, DomainError, QueryState, QueryStatus, ResultEnvelope, StorageConfig,
    StorageInfo, StorageStatus, StorageSummary, StorageType,
};

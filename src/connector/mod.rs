//! # Connector Layer
//!
//! External integrations implementing the application interfaces:
//! - Backend connectors (MySQL/MariaDB via sqlx, MongoDB, Athena)
//! - Storage descriptor resolution from the environment
//! - MCP server and CLI wiring

pub mod adapter;
pub mod api;
pub mod config;

pub use adapter::*;
pub use api::{Container, ContainerConfig, Router};
pub use config::StorageConfigResolver;

//! # Domain Layer
//!
//! Storage descriptors, the normalized result envelope and the error taxonomy.
//! This layer is independent of drivers and transports.

pub mod error;
pub mod models;

pub use error::*;
pub use models::*;

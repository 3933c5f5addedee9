//! # Application Layer
//!
//! The connector contract, the connector registry and the use cases that
//! resolve a storage id and delegate to its connector.

pub mod interfaces;
pub mod registry;
pub mod use_cases;

pub use interfaces::*;
pub use registry::*;
pub use use_cases::*;

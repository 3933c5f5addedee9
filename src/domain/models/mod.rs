mod document_schema;
mod query_execution;
mod result_envelope;
mod storage_config;

pub use document_schema::*;
pub use query_execution::*;
pub use result_envelope::*;
pub use storage_config::*;

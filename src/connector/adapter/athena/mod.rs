mod connector;
mod engine;
mod poller;
mod result_set;

pub use connector::{AthenaConnector, AthenaSettings, DEFAULT_CATALOG};
pub use engine::{AthenaEngine, AwsAthenaEngine, ColumnDescription, QuerySubmission, TableDescription};
pub use poller::{QueryPoller, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
pub use result_set::materialize_rows;

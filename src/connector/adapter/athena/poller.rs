use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::application::Sleeper;
use crate::domain::{DomainError, QueryState};

use super::AthenaEngine;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Waits for a submitted query to reach a terminal state.
///
/// Status is checked at most `max_attempts` times with `interval` between
/// checks. There is no sleep after the final check.
#[derive(Clone)]
pub struct QueryPoller {
    max_attempts: u32,
    interval: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl QueryPoller {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
            sleeper,
        }
    }

    pub fn with_budget(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.interval = interval;
        self
    }

    /// Returns the number of status checks it took to observe success.
    pub async fn wait(&self, engine: &dyn AthenaEngine, execution_id: &str) -> Result<u32, DomainError> {
        for attempt in 1..=self.max_attempts {
            let status = engine.query_status(execution_id).await?;
            debug!(
                "Query {} is {} (check {}/{})",
                execution_id, status.state, attempt, self.max_attempts
            );

            match status.state {
                QueryState::Succeeded => return Ok(attempt),
                QueryState::Failed => {
                    return Err(DomainError::query(
                        status.reason.unwrap_or_else(|| "unknown reason".to_string()),
                    ));
                }
                QueryState::Cancelled => return Err(DomainError::QueryCancelled),
                QueryState::Submitted | QueryState::Queued | QueryState::Running => {
                    if attempt < self.max_attempts {
                        self.sleeper.sleep(self.interval).await;
                    }
                }
            }
        }

        Err(DomainError::QueryTimeout {
            attempts: self.max_attempts,
        })
    }
}

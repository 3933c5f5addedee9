use serde::{Deserialize, Serialize};

/// Lifecycle of an asynchronously executed query.
///
/// `Submitted -> {Queued, Running} -> {Succeeded, Failed, Cancelled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Submitted,
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "QUEUED" => QueryState::Queued,
            "RUNNING" => QueryState::Running,
            "SUCCEEDED" => QueryState::Succeeded,
            "FAILED" => QueryState::Failed,
            "CANCELLED" => QueryState::Cancelled,
            _ => QueryState::Submitted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryState::Submitted => "SUBMITTED",
            QueryState::Queued => "QUEUED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One status observation of a running query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatus {
    pub state: QueryState,
    /// Backend-reported reason for the last state change, set on failure.
    pub reason: Option<String>,
}

impl QueryStatus {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: QueryState::Failed,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unknown_state_is_submitted() {
        assert_eq!(QueryState::parse("running"), QueryState::Running);
        assert_eq!(QueryState::parse("SUCCEEDED"), QueryState::Succeeded);
        assert_eq!(QueryState::parse("whatever"), QueryState::Submitted);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::DomainError;

/// Normalized outcome of every connector operation.
///
/// Serializes as `{"type": "text", "text": ...}` or `{"type": "error", "text": ...}`,
/// where `text` is the pretty-printed JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum ResultEnvelope {
    Text(String),
    Error(String),
}

impl ResultEnvelope {
    pub fn text(payload: Value) -> Self {
        Self::Text(to_pretty(&payload))
    }

    /// Error payload `{"error": <message>, ...echo}`. Non-object echoes are ignored.
    pub fn error(message: impl Into<String>, echo: Value) -> Self {
        let mut body = match echo {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("error".to_string(), Value::String(message.into()));
        Self::Error(to_pretty(&Value::Object(body)))
    }

    /// Converts an operation outcome at the connector boundary. `echo` is only
    /// built on failure and carries the input that triggered it.
    pub fn from_outcome(outcome: Result<Value, DomainError>, echo: impl FnOnce() -> Value) -> Self {
        match outcome {
            Ok(payload) => Self::text(payload),
            Err(e) => {
                debug!("Connector operation failed: {}", e);
                Self::error(e.to_string(), echo())
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Error(text) => text,
        }
    }

    /// Parses the payload back into JSON.
    pub fn payload(&self) -> Result<Value, DomainError> {
        Ok(serde_json::from_str(self.as_text())?)
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_envelope_shape() {
        let envelope = ResultEnvelope::text(json!({"rows": [], "rowCount": 0}));
        let wire = serde_json::to_value(&envelope).unwrap();

        assert_eq!(wire["type"], "text");
        assert!(wire["text"].as_str().unwrap().contains("\"rowCount\": 0"));
        assert!(!envelope.is_error());
    }

    #[test]
    fn test_error_envelope_echoes_input() {
        let envelope = ResultEnvelope::error("boom", json!({"query": "SELECT 1"}));
        let payload = envelope.payload().unwrap();

        assert!(envelope.is_error());
        assert_eq!(payload["error"], "boom");
        assert_eq!(payload["query"], "SELECT 1");
    }

    #[test]
    fn test_from_outcome_maps_domain_error() {
        let envelope = ResultEnvelope::from_outcome(Err(DomainError::WriteModeDisabled), || {
            json!({"operation": "DELETE FROM t"})
        });
        let payload = envelope.payload().unwrap();

        assert_eq!(
            payload["error"],
            "Write operations are not allowed for this connection"
        );
        assert_eq!(payload["operation"], "DELETE FROM t");
    }
}

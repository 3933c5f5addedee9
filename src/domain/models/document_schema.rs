use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Number of documents sampled when describing a collection.
pub const SCHEMA_SAMPLE_SIZE: usize = 10;

/// Field name to the set of value kinds observed for it, in first-seen order.
pub type InferredSchema = BTreeMap<String, Vec<&'static str>>;

/// Coarse kind of a JSON value as reported in an inferred schema.
///
/// Extended-JSON wrappers (`{"$oid": ..}`, `{"$date": ..}`) are objects.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Unions the top-level field kinds across at most `limit` sampled documents.
pub fn infer_schema<'a, I>(sample: I, limit: usize) -> InferredSchema
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut schema = InferredSchema::new();

    for document in sample.into_iter().take(limit) {
        for (field, value) in document {
            let kinds = schema.entry(field.clone()).or_default();
            let kind = value_kind(value);
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }

    schema
}

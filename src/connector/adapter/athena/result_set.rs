use serde_json::{Map, Value};

/// Turns a raw result set into field-keyed records.
///
/// The first row names the columns. Each following row is zipped against it
/// positionally: missing cells become `null`, cells past the header width are
/// dropped, and columns with no header name are skipped.
pub fn materialize_rows(rows: Vec<Vec<Option<String>>>) -> Vec<Map<String, Value>> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    rows.map(|row| {
        let mut cells = row.into_iter();
        header
            .iter()
            .map(|name| (name, cells.next().flatten()))
            .filter_map(|(name, cell)| {
                let name = name.as_deref().filter(|name| !name.is_empty())?;
                Some((name.to_string(), cell.map(Value::String).unwrap_or(Value::Null)))
            })
            .collect()
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(str::to_string)).collect()
    }

    #[test]
    fn test_header_row_names_fields() {
        let rows = materialize_rows(vec![
            row(&[Some("a"), Some("b")]),
            row(&[Some("1"), Some("2")]),
            row(&[Some("3"), None]),
        ]);

        assert_eq!(
            Value::Array(rows.into_iter().map(Value::Object).collect()),
            json!([{"a": "1", "b": "2"}, {"a": "3", "b": null}])
        );
    }

    #[test]
    fn test_short_and_long_rows() {
        let rows = materialize_rows(vec![
            row(&[Some("a"), Some("b")]),
            row(&[Some("1")]),
            row(&[Some("1"), Some("2"), Some("3")]),
        ]);

        assert_eq!(Value::Object(rows[0].clone()), json!({"a": "1", "b": null}));
        assert_eq!(Value::Object(rows[1].clone()), json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(materialize_rows(Vec::new()).is_empty());
        assert!(materialize_rows(vec![row(&[Some("a")])]).is_empty());
    }
}

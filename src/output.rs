//! Rendering of command results: one compact JSON document, or bare
//! identifiers one per line.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::error::{MturkError, Result};

/// Writes `value` as compact JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes each identifier on its own line.
pub fn write_ids<I, S>(out: &mut dyn Write, ids: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for id in ids {
        writeln!(out, "{}", id.as_ref())?;
    }
    Ok(())
}

/// Removes `fields` from `item` if it is an object.
pub fn strip_fields(item: &mut Value, fields: &[&str]) {
    if let Value::Object(map) = item {
        for field in fields {
            map.shift_remove(*field);
        }
    }
}

/// Reads a string field that a command relies on.
pub fn string_field(item: &Value, field: &'static str) -> Result<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MturkError::MissingField {
            field,
            context: "result item".to_string(),
        })
}

/// Extracts `field` from every item, for `--ids` output.
pub fn string_fields(items: &[Value], field: &'static str) -> Result<Vec<String>> {
    items.iter().map(|item| string_field(item, field)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_is_compact_with_newline() {
        let mut out = Vec::new();
        write_json(&mut out, &json!([{"HITId": "H1"}])).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[{\"HITId\":\"H1\"}]\n");
    }

    #[test]
    fn test_write_ids() {
        let mut out = Vec::new();
        write_ids(&mut out, ["H1", "H2"]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "H1\nH2\n");
    }

    #[test]
    fn test_strip_fields_keeps_order() {
        let mut item = json!({"HITId": "H1", "Question": "<x/>", "Title": "t"});
        strip_fields(&mut item, &["Question", "QualificationRequirements"]);
        assert_eq!(serde_json::to_string(&item).unwrap(), r#"{"HITId":"H1","Title":"t"}"#);

        let mut scalar = json!("H1");
        strip_fields(&mut scalar, &["Question"]);
        assert_eq!(scalar, json!("H1"));
    }

    #[test]
    fn test_string_field_missing() {
        let err = string_field(&json!({"HITId": 3}), "HITId").unwrap_err();
        assert!(matches!(err, MturkError::MissingField { field: "HITId", .. }));
    }
}

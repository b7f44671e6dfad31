//! JMESPath filtering and projection of listing results.

use serde_json::Value;

use crate::error::{MturkError, Result};

/// A validated JMESPath expression applied to each page of a listing.
///
/// Compiled `jmespath` expressions hold reference-counted literals and are
/// not `Send`, so only the source text is kept and it is recompiled per
/// page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    expression: String,
}

impl Query {
    /// Compiles `expression`, failing before any remote call is made if it
    /// is not valid JMESPath.
    pub fn compile(expression: impl Into<String>) -> Result<Self> {
        let expression = expression.into();
        jmespath::compile(&expression).map_err(|e| MturkError::Query {
            expression: expression.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { expression })
    }

    /// Builds the query for `list-hits`: an optional annotation filter piped
    /// into an optional user query.
    pub fn for_listing(annotation: Option<&str>, query: Option<&str>) -> Result<Option<Self>> {
        let expression = match (annotation, query) {
            (Some(annotation), Some(query)) => {
                Some(format!("{} | {}", annotation_filter(annotation)?, query))
            },
            (Some(annotation), None) => Some(annotation_filter(annotation)?),
            (None, Some(query)) => Some(query.to_string()),
            (None, None) => None,
        };
        expression.map(Self::compile).transpose()
    }

    /// Runs the query over one page of items.
    ///
    /// An array result contributes its elements, `null` contributes nothing,
    /// and any other value contributes itself as a single item.
    ///
    /// JMESPath evaluation sorts object keys. Result objects equal to an
    /// input item are replaced by that item, so filtered records keep their
    /// field order; objects built by a projection come out with sorted keys.
    pub fn apply(&self, items: Vec<Value>) -> Result<Vec<Value>> {
        let compiled = jmespath::compile(&self.expression).map_err(|e| self.error(e))?;
        let input = Value::Array(items);
        let result = compiled.search(&input).map_err(|e| self.error(e))?;
        let value = serde_json::to_value(&*result)?;

        let originals = input.as_array().map(Vec::as_slice).unwrap_or_default();
        let results = match value {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        Ok(results
            .into_iter()
            .map(|item| restore_key_order(item, originals))
            .collect())
    }

    fn error(&self, err: jmespath::JmespathError) -> MturkError {
        MturkError::Query {
            expression: self.expression.clone(),
            message: err.to_string(),
        }
    }
}

/// Swaps an object for the input item it equals. Map equality ignores key
/// order, so this recovers the order the item was serialized with.
fn restore_key_order(item: Value, originals: &[Value]) -> Value {
    if !item.is_object() {
        return item;
    }
    originals
        .iter()
        .find(|original| **original == item)
        .cloned()
        .unwrap_or(item)
}

/// Filter keeping HITs whose `RequesterAnnotation` contains `annotation`.
///
/// The annotation is embedded as a JSON literal, with backticks escaped so
/// it cannot terminate the literal early. HITs without an annotation are
/// treated as having an empty one.
///
/// # Examples
///
/// ```
/// use mturkish::query::annotation_filter;
///
/// assert_eq!(
///     annotation_filter("batch-1").unwrap(),
///     "[?contains(RequesterAnnotation || '', `\"batch-1\"`)]"
/// );
/// ```
pub fn annotation_filter(annotation: &str) -> Result<String> {
    let literal = serde_json::to_string(annotation)?.replace('`', r"\`");
    Ok(format!("[?contains(RequesterAnnotation || '', `{literal}`)]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn hits() -> Vec<Value> {
        vec![
            json!({"HITId": "H1", "RequesterAnnotation": "batch-1", "MaxAssignments": 1}),
            json!({"HITId": "H2", "MaxAssignments": 3}),
            json!({"HITId": "H3", "RequesterAnnotation": "other", "MaxAssignments": 3}),
        ]
    }

    #[test]
    fn test_compile_rejects_invalid_expression() {
        let err = Query::compile("[?").unwrap_err();
        assert!(matches!(err, MturkError::Query { .. }));
    }

    #[test]
    fn test_projection_flattens_array_result() {
        let query = Query::compile("[].HITId").unwrap();
        assert_eq!(
            query.apply(hits()).unwrap(),
            vec![json!("H1"), json!("H2"), json!("H3")]
        );
    }

    #[test]
    fn test_filter() {
        let query = Query::compile("[?MaxAssignments > `1`]").unwrap();
        let ids: Vec<Value> = query
            .apply(hits())
            .unwrap()
            .into_iter()
            .map(|hit| hit["HITId"].clone())
            .collect();
        assert_eq!(ids, vec![json!("H2"), json!("H3")]);
    }

    #[test]
    fn test_filter_keeps_field_order() {
        let items = vec![
            json!({"HITId": "H1", "Title": "t", "MaxAssignments": 3, "RequesterAnnotation": "b"}),
            json!({"HITId": "H2", "Title": "u", "MaxAssignments": 1}),
        ];
        let query = Query::for_listing(Some("b"), None).unwrap().unwrap();

        let matched = query.apply(items).unwrap();

        assert_eq!(matched.len(), 1);
        let keys: Vec<&str> = matched[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["HITId", "Title", "MaxAssignments", "RequesterAnnotation"]);
    }

    #[test]
    fn test_projection_objects_are_new() {
        let query = Query::compile("[].{z: HITId, a: MaxAssignments}").unwrap();
        let projected = query.apply(hits()).unwrap();
        assert_eq!(projected[0], json!({"a": 1, "z": "H1"}));
    }

    #[test]
    fn test_null_result_contributes_nothing() {
        let query = Query::compile("missing").unwrap();
        assert!(query.apply(hits()).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_result_is_single_item() {
        let query = Query::compile("[0].HITId").unwrap();
        assert_eq!(query.apply(hits()).unwrap(), vec![json!("H1")]);
    }

    #[test]
    fn test_annotation_filter_matches_substring() {
        let query = Query::compile(annotation_filter("batch").unwrap()).unwrap();
        let matched = query.apply(hits()).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["HITId"], json!("H1"));
    }

    #[test]
    fn test_annotation_filter_escapes_backticks() {
        let filter = annotation_filter("a`b").unwrap();
        assert_eq!(filter, r#"[?contains(RequesterAnnotation || '', `"a\`b"`)]"#);
        assert!(Query::compile(filter).is_ok());
    }

    #[test]
    fn test_for_listing_pipes_annotation_into_query() {
        let query = Query::for_listing(Some("batch"), Some("[].HITId"))
            .unwrap()
            .unwrap();
        assert_eq!(
            query,
            Query::compile("[?contains(RequesterAnnotation || '', `\"batch\"`)] | [].HITId").unwrap()
        );
        assert_eq!(query.apply(hits()).unwrap(), vec![json!("H1")]);
        assert!(Query::for_listing(None, None).unwrap().is_none());
    }
}

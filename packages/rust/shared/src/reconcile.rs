//! Field-reconciliation map for loosely shaped JSON.
//!
//! The extraction and reasoning capabilities return objects whose keys follow
//! a convention, not a schema: the same field may arrive as `projectScope`,
//! `projectName` or `project_name`, numbers may arrive as `"45 m"`. Each
//! canonical field is described by a [`FieldAliases`] entry listing its
//! candidate keys in priority order; lookups collapse to the first candidate
//! that is present and non-empty, and the typed accessors below apply the
//! default when none is.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Ordered candidate keys for one canonical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    /// Name used in logs when a default is applied.
    pub canonical: &'static str,
    /// Keys tried in order; the first present, non-null, non-blank value wins.
    pub candidates: &'static [&'static str],
}

impl FieldAliases {
    pub const fn new(canonical: &'static str, candidates: &'static [&'static str]) -> Self {
        Self {
            canonical,
            candidates,
        }
    }

    /// First present value among the candidate keys.
    pub fn lookup<'v>(&self, obj: &'v Map<String, Value>) -> Option<&'v Value> {
        self.candidates
            .iter()
            .filter_map(|key| obj.get(*key))
            .find(|value| is_present(value))
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Text value of a field, or `default`.
///
/// Numbers and booleans are rendered as text; arrays and objects are ignored.
pub fn text(obj: &Map<String, Value>, field: &FieldAliases, default: &str) -> String {
    match field.lookup(obj).and_then(coerce_text) {
        Some(s) => s,
        None => {
            tracing::debug!(field = field.canonical, default, "field missing, using default");
            default.to_string()
        }
    }
}

/// Numeric value of a field, if one can be read.
///
/// Accepts JSON numbers and strings with a leading number (`"45.5 m"`,
/// `"1,200 sqm"`).
pub fn number(obj: &Map<String, Value>, field: &FieldAliases) -> Option<f64> {
    let value = field.lookup(obj)?;
    let parsed = coerce_number(value);
    if parsed.is_none() {
        tracing::debug!(field = field.canonical, %value, "field is not numeric");
    }
    parsed
}

/// Array value of a field; empty when absent or not an array.
pub fn list<'v>(obj: &'v Map<String, Value>, field: &FieldAliases) -> &'v [Value] {
    field
        .lookup(obj)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Render a scalar JSON value as trimmed text.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a JSON number, or the leading number of a string.
pub fn coerce_number(value: &Value) -> Option<f64> {
    static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[-+]?\d[\d,]*(?:\.\d+)?|[-+]?\.\d+").expect("valid regex")
    });

    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER_RE
            .find(s.trim())
            .filter(|m| m.start() == 0)
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok()),
        _ => None,
    }?;

    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCOPE: FieldAliases =
        FieldAliases::new("projectScope", &["projectScope", "projectName", "project_name"]);
    const FLOORS: FieldAliases = FieldAliases::new("totalFloors", &["totalFloors", "floors"]);
    const MATERIALS: FieldAliases = FieldAliases::new("materials", &["materials", "boq"]);

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn first_candidate_wins() {
        let o = obj(json!({ "projectName": "B", "projectScope": "A" }));
        assert_eq!(text(&o, &SCOPE, "Undefined"), "A");
    }

    #[test]
    fn falls_through_to_alias() {
        let o = obj(json!({ "project_name": "Riverside Tower" }));
        assert_eq!(text(&o, &SCOPE, "Undefined"), "Riverside Tower");
    }

    #[test]
    fn null_and_blank_count_as_absent() {
        let o = obj(json!({ "projectScope": null, "projectName": "   ", "project_name": "C" }));
        assert_eq!(text(&o, &SCOPE, "Undefined"), "C");

        let o = obj(json!({ "projectScope": "" }));
        assert_eq!(text(&o, &SCOPE, "Undefined"), "Undefined");
    }

    #[test]
    fn numbers_render_as_text() {
        let o = obj(json!({ "projectScope": 42 }));
        assert_eq!(text(&o, &SCOPE, "Undefined"), "42");
    }

    #[test]
    fn numeric_strings_with_units() {
        assert_eq!(coerce_number(&json!("45.5 m")), Some(45.5));
        assert_eq!(coerce_number(&json!("1,200 sqm")), Some(1200.0));
        assert_eq!(coerce_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(coerce_number(&json!("-3")), Some(-3.0));
        assert_eq!(coerce_number(&json!("approx 12")), None);
        assert_eq!(coerce_number(&json!([1])), None);
    }

    #[test]
    fn number_uses_alias() {
        let o = obj(json!({ "floors": "G+7" }));
        assert_eq!(number(&o, &FLOORS), None);

        let o = obj(json!({ "floors": 8 }));
        assert_eq!(number(&o, &FLOORS), Some(8.0));

        let o = obj(json!({}));
        assert_eq!(number(&o, &FLOORS), None);
    }

    #[test]
    fn list_ignores_non_arrays() {
        let o = obj(json!({ "materials": "steel" }));
        assert!(list(&o, &MATERIALS).is_empty());

        let o = obj(json!({ "boq": [{ "item": "Cement" }] }));
        assert_eq!(list(&o, &MATERIALS).len(), 1);
    }
}

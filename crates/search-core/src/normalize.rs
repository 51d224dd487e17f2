//! Filter normalization.
//!
//! Turns a raw filter mapping into the canonical payload sent to the service:
//! only meaningful criteria survive, placeholders are dropped rather than
//! rejected.

use nvd::QueryParams;
use serde_json::{Map, Value};

/// Placeholder the UI uses for "no preference" in select-style filters.
pub const ANY_SENTINEL: &str = "any";

/// Keep only keys whose value is a non-empty trimmed string (other than
/// [`ANY_SENTINEL`]), a boolean, a number, a non-empty array or a non-empty
/// nested object. Strings are replaced by their trimmed form.
pub fn normalize_params(raw: &Map<String, Value>) -> QueryParams {
    normalize_map(raw).into()
}

fn normalize_map(raw: &Map<String, Value>) -> Map<String, Value> {
    raw.iter()
        .filter_map(|(key, value)| normalize_value(value).map(|v| (key.clone(), v)))
        .collect()
}

fn normalize_value(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(_) | Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == ANY_SENTINEL {
                None
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        Value::Array(items) => {
            let items: Vec<Value> = items.iter().filter_map(normalize_value).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(nested) => {
            let nested = normalize_map(nested);
            (!nested.is_empty()).then_some(Value::Object(nested))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn normalize(value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(normalize_params(&map).as_map().clone()),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_keyword_with_any_severity() {
        let out = normalize(json!({ "keywordSearch": "apache", "cvssV3Severity": "any" }));
        assert_eq!(out, json!({ "keywordSearch": "apache" }));
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!(""))]
    #[case(json!("   "))]
    #[case(json!("any"))]
    #[case(json!(" any "))]
    #[case(json!([]))]
    #[case(json!({}))]
    #[case(json!(["", "any", null]))]
    #[case(json!({ "pubStartDate": "" }))]
    fn test_placeholders_are_dropped(#[case] value: Value) {
        let out = normalize(json!({ "cweId": value, "keywordSearch": "log4j" }));
        assert_eq!(out, json!({ "keywordSearch": "log4j" }));
    }

    #[rstest]
    #[case(json!(false))]
    #[case(json!(true))]
    #[case(json!(0))]
    #[case(json!(20))]
    fn test_flags_and_numbers_survive(#[case] value: Value) {
        let out = normalize(json!({ "field": value.clone() }));
        assert_eq!(out, json!({ "field": value }));
    }

    #[test]
    fn test_strings_are_trimmed() {
        let out = normalize(json!({ "cveId": "  CVE-2024-3094 \n" }));
        assert_eq!(out, json!({ "cveId": "CVE-2024-3094" }));
    }

    #[test]
    fn test_nested_objects_are_cleaned() {
        let out = normalize(json!({
            "published": { "pubStartDate": " 2024-01-01 ", "pubEndDate": "" },
            "tags": ["kev", "", " any"]
        }));
        assert_eq!(
            out,
            json!({
                "published": { "pubStartDate": "2024-01-01" },
                "tags": ["kev"]
            })
        );
    }

    #[test]
    fn test_case_of_sentinel_matters() {
        // Only the lowercase placeholder is special.
        let out = normalize(json!({ "keywordSearch": "ANY" }));
        assert_eq!(out, json!({ "keywordSearch": "ANY" }));
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_params(&Map::new()).is_empty());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Flat key/value query payload sent to the service.
///
/// Values are kept as JSON so the payload can be compared and logged as-is;
/// [`QueryParams::to_query_pairs`] flattens them into URL query pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(Map<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.0
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Flatten into URL query pairs.
    ///
    /// `true` flags are sent as bare keys and `false` flags are left out, which
    /// is how the service reads switches like `keywordExactMatch`. Arrays are
    /// comma-joined and nested objects contribute their own keys.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        flatten_into(&self.0, &mut pairs);
        pairs
    }
}

/// Compact JSON, for logs.
impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<Map<String, Value>> for QueryParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn flatten_into(map: &Map<String, Value>, pairs: &mut Vec<(String, String)>) {
    for (key, value) in map {
        match value {
            Value::Bool(true) => pairs.push((key.clone(), String::new())),
            Value::Bool(false) | Value::Null => {}
            Value::Object(nested) => flatten_into(nested, pairs),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                pairs.push((key.clone(), joined));
            }
            scalar => {
                if let Some(s) = scalar_to_string(scalar) {
                    pairs.push((key.clone(), s));
                }
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

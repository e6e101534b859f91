use serde_json::{Map, Value};

/// Copies every entry of `source` into `target`, overwriting existing keys.
pub fn assign(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Parses `text` as JSON, yielding an empty object when it cannot be parsed.
pub fn parse_or_empty(text: &str) -> Result<Value, (Value, serde_json::Error)> {
    serde_json::from_str(text).map_err(|err| (Value::Object(Map::new()), err))
}

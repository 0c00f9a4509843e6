//! Conversion between plain JSON documents and the typed value encoding of
//! the Firestore REST API.

use nr_core::{Error, Result};
use serde_json::{json, Map, Value};

pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), encode(v))).collect()
}

pub fn decode(value: &Value) -> Result<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::Storage(format!("Malformed field value: {}", value)))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| Error::Storage("Empty field value".to_string()))?;

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().map_err(|e| {
                    Error::Storage(format!("Invalid integer value {}: {}", s, e))
                })?,
                other => other.as_i64().unwrap_or_default(),
            };
            Value::from(parsed)
        }
        "doubleValue" => inner.as_f64().map(Value::from).unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                Some(values) => values.iter().map(decode).collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            Value::Array(values)
        }
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => Value::Object(decode_fields(fields)?),
            None => Value::Object(Map::new()),
        },
        "geoPointValue" => inner.clone(),
        other => return Err(Error::Storage(format!("Unsupported field type: {}", other))),
    })
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>> {
    fields
        .iter()
        .map(|(k, v)| decode(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

/// Turns a REST document into a plain JSON object with its `id` filled in
/// from the last segment of the resource name.
pub fn decode_document(document: &Value) -> Result<Value> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Storage("Document without name".to_string()))?;
    let mut fields = match document.get("fields").and_then(Value::as_object) {
        Some(fields) => decode_fields(fields)?,
        None => Map::new(),
    };
    fields.insert("id".to_string(), Value::String(document_id(name).to_string()));
    Ok(Value::Object(fields))
}

pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

// src/integrations/firebase/values.rs
//
// Firestore typed-value encoding. Firestore wraps every field value in an
// object naming its type: {"stringValue": "Dune"}, {"integerValue": "2021"}.

use serde_json::{json, Map, Number, Value};

use crate::error::{AppError, AppResult};
use crate::repositories::Fields;

/// Encode a flat field map into Firestore `fields`.
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            json!({ "integerValue": n.to_string() })
        }
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": { "fields": encode_fields(map) }
        }),
    }
}

/// Decode Firestore `fields` into a flat field map.
pub fn decode_fields(fields: &Map<String, Value>) -> AppResult<Fields> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

pub fn decode_value(value: &Value) -> AppResult<Value> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(invalid(value));
    };

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().ok_or_else(|| invalid(value))?),
        "integerValue" => {
            let n = match inner {
                Value::String(s) => s.parse::<i64>().map_err(|_| invalid(value))?,
                other => other.as_i64().ok_or_else(|| invalid(value))?,
            };
            Value::Number(n.into())
        }
        "doubleValue" => {
            let f = match inner {
                Value::String(s) => s.parse::<f64>().map_err(|_| invalid(value))?,
                other => other.as_f64().ok_or_else(|| invalid(value))?,
            };
            Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
        }
        // Passed through untyped: timestamps stay RFC 3339 strings
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" | "geoPointValue" => {
            inner.clone()
        }
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<AppResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Value::Array(items)
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default();
            Value::Object(fields)
        }
        _ => return Err(invalid(value)),
    };

    Ok(decoded)
}

fn invalid(value: &Value) -> AppError {
    AppError::Other(format!("Unsupported Firestore value {}", value))
}

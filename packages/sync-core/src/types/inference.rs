//! Scalar type inference for values read without a declared column type.
//!
//! The preference order is fixed: a string is tried as a date with offset
//! before it is kept as text, and a number is tried as a 64-bit integer
//! before it falls back to a double.

use super::value::{parse_date_time_offset, SyncValue};
use crate::error::{SyncError, SyncResult};

/// Infers the value of a JSON string token.
pub fn infer_string(text: String) -> SyncValue {
    if looks_like_date(&text) {
        if let Ok(dt) = parse_date_time_offset(&text) {
            return SyncValue::DateTimeOffset(dt);
        }
    }
    SyncValue::String(text)
}

/// Infers the value of a JSON number token.
///
/// The whole text must parse; a token such as `1.2.3` is a format error.
pub fn infer_number(text: &str) -> SyncResult<SyncValue> {
    if let Ok(v) = text.parse::<i64>() {
        return Ok(SyncValue::Int64(v));
    }
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(SyncValue::Double)
        .ok_or_else(|| SyncError::format("number", text))
}

/// Infers a value from a parsed `serde_json` value.
///
/// Arrays and objects have no scalar counterpart and are kept as their JSON text.
pub fn infer_json_value(value: &serde_json::Value) -> SyncValue {
    match value {
        serde_json::Value::Null => SyncValue::Null,
        serde_json::Value::Bool(b) => SyncValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(v) => SyncValue::Int64(v),
            None => n.as_f64().map(SyncValue::Double).unwrap_or(SyncValue::Null),
        },
        serde_json::Value::String(s) => infer_string(s.clone()),
        other => SyncValue::String(other.to_string()),
    }
}

/// Cheap pre-check so ordinary text skips the date parser.
fn looks_like_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 20
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[7] == b'-'
}

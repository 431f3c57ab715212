//! Persisted stopwatch record: base64 of a small JSON object.

use super::Status;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use serde_json::Value;

pub const KEY_PREFIX: &str = "sw-";

pub fn storage_key(name: &str) -> String {
    format!("{KEY_PREFIX}{name}")
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("record is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is not a JSON object")]
    NotAnObject,
}

#[derive(Serialize)]
struct StoredRecord<'a> {
    #[serde(rename = "startTime")]
    start_time: Option<i64>,
    current: u64,
    status: u8,
    tags: &'a [String],
}

pub fn encode(
    start_time: Option<i64>,
    current: u64,
    status: Status,
    tags: &[String],
) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(&StoredRecord {
        start_time,
        current,
        status: status.code(),
        tags,
    })?;
    Ok(general_purpose::STANDARD.encode(json))
}

/// Fields recovered from a stored record. Each one is independently
/// optional so a bad field does not discard the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restored {
    pub start_time: Option<i64>,
    pub current: Option<u64>,
    pub status: Status,
    pub tags: Option<Vec<String>>,
}

pub fn decode(text: &str) -> Result<Restored, DecodeError> {
    let bytes = general_purpose::STANDARD.decode(text.trim())?;
    let value: Value = serde_json::from_slice(&bytes)?;
    let Value::Object(map) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let status = if map.get("status").is_some_and(is_running_code) {
        Status::Running
    } else {
        Status::Paused
    };
    let start_time = map
        .get("startTime")
        .and_then(bounded_millis)
        .filter(|t| *t > 0);
    let current = map
        .get("current")
        .and_then(bounded_millis)
        .map(|c| c.max(0) as u64);
    let tags = map.get("tags").and_then(Value::as_array).map(|list| {
        list.iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect()
    });

    Ok(Restored {
        start_time,
        current,
        status,
        tags,
    })
}

/// Largest magnitude a JavaScript `Date` accepts, in milliseconds.
const MAX_MILLIS: f64 = 8.64e15;

fn bounded_millis(v: &Value) -> Option<i64> {
    v.as_f64()
        .filter(|f| f.is_finite() && f.abs() <= MAX_MILLIS)
        .map(|f| f as i64)
}

/// Loose equality with `1`: numbers, numeric strings and `true` all count.
fn is_running_code(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => s.trim().parse::<f64>().ok() == Some(1.0),
        Value::Bool(b) => *b,
        _ => false,
    }
}

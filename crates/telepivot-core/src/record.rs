//! Telemetry records and their JSON input forms.
//!
//! The telemetry API serves records either as a bare array, as a response
//! body (`{"data": [...], "stats": {...}}`), or wrapped in its envelope
//! (`{"success": true, "data": {...}, "error": null}`). All three are
//! accepted by [`load_records`]. Each record is decoded leniently into a
//! [`RawRecord`] first so that a bad field is reported against the record
//! it belongs to instead of failing the whole document.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result, ValidationError};

/// One measured value of one metric on one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub asset_name: String,
    pub device_name: String,
    pub target_name: String,
    pub key_name: String,
    pub value: f64,
}

impl TelemetryRecord {
    /// Reject values the statistics cannot absorb.
    pub fn check(&self, index: usize) -> std::result::Result<(), ValidationError> {
        if self.value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::new(
                index,
                "value",
                format!("non-finite value {}", self.value),
            ))
        }
    }
}

/// Wire form of a record before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub asset_name: String,
    #[serde(default)]
    pub device_name: String,
    pub target_name: String,
    pub key_name: String,
    #[serde(default)]
    pub value: Value,
}

impl RawRecord {
    /// Parse the timestamp and value, producing a record or the reason it was refused.
    pub fn validate(self, index: usize) -> std::result::Result<TelemetryRecord, ValidationError> {
        let timestamp = match &self.timestamp {
            Value::String(s) => parse_timestamp(s).ok_or_else(|| {
                ValidationError::new(
                    index,
                    "timestamp",
                    format!("cannot parse {s:?} as an ISO-8601 instant"),
                )
            })?,
            Value::Null => return Err(ValidationError::new(index, "timestamp", "missing")),
            other => {
                return Err(ValidationError::new(
                    index,
                    "timestamp",
                    format!("expected a string, got {other}"),
                ));
            }
        };

        let value = match &self.value {
            Value::Number(n) => n.as_f64().ok_or_else(|| {
                ValidationError::new(index, "value", format!("{n} is not representable as f64"))
            })?,
            Value::Null => return Err(ValidationError::new(index, "value", "missing")),
            other => {
                return Err(ValidationError::new(
                    index,
                    "value",
                    format!("expected a number, got {other}"),
                ));
            }
        };

        let record = TelemetryRecord {
            timestamp,
            asset_name: self.asset_name,
            device_name: self.device_name,
            target_name: self.target_name,
            key_name: self.key_name,
            value,
        };
        record.check(index)?;
        Ok(record)
    }
}

/// Formats accepted when a timestamp carries no offset; they are read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an RFC 3339 / ISO-8601 instant, normalising any offset to UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Check already-typed records, e.g. ones built in code rather than decoded.
pub fn validate_records(records: &[TelemetryRecord]) -> std::result::Result<(), ValidationError> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(i, r)| r.check(i))
}

/// Decode a JSON document of telemetry records.
pub fn load_records(json: &str) -> Result<Vec<TelemetryRecord>> {
    let document: Value = serde_json::from_str(json)?;
    let items = record_items(document)?;
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| Ok(record_from_value(item, index)?))
        .collect()
}

/// Decode and validate one record item at position `index`.
///
/// A missing or mistyped field is reported against `record`; everything
/// else goes through [`RawRecord::validate`].
pub fn record_from_value(
    item: Value,
    index: usize,
) -> std::result::Result<TelemetryRecord, ValidationError> {
    let raw: RawRecord = serde_json::from_value(item)
        .map_err(|e| ValidationError::new(index, "record", e.to_string()))?;
    raw.validate(index)
}

fn record_items(document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(success) = map.get("success") {
                if success != &Value::Bool(true) {
                    let message = map
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("request failed without an error message");
                    return Err(Error::Api(message.to_string()));
                }
                return match map.remove("data") {
                    Some(Value::Null) | None => Ok(Vec::new()),
                    Some(body) => record_items(body),
                };
            }
            match map.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                Some(other) => Err(Error::Payload(format!(
                    "expected \"data\" to be an array of records, got {}",
                    json_kind(&other)
                ))),
                None => Err(Error::Payload(
                    "expected an array of records or an object with a \"data\" field".to_string(),
                )),
            }
        }
        other => Err(Error::Payload(format!(
            "expected an array of records, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Default marshallers: temporal types and UUIDs.
//!
//! Backend shape is textual (RFC 3339 timestamps, ISO dates, hyphenated
//! UUIDs); entity-native shape is the compact `Value` arm (micros, days,
//! bytes). Integer backend values are also accepted on the way in.

use super::{ConvertFn, MarshallerRegistry};
use crate::schema::ScalarType;
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat};
use relata_model::{Value, ValueKind};
use std::sync::Arc;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub(super) fn register(registry: &MarshallerRegistry) {
    // Construct direction: backend -> native.
    registry.register_unmarshal(
        None,
        ScalarType::Timestamp,
        ValueKind::String,
        convert(timestamp_from_string),
    );
    registry.register_unmarshal(
        None,
        ScalarType::Timestamp,
        ValueKind::Int64,
        convert(timestamp_from_int),
    );
    registry.register_unmarshal(
        None,
        ScalarType::Date,
        ValueKind::String,
        convert(date_from_string),
    );
    registry.register_unmarshal(
        None,
        ScalarType::Date,
        ValueKind::Int32,
        convert(date_from_int),
    );
    registry.register_unmarshal(
        None,
        ScalarType::Uuid,
        ValueKind::String,
        convert(uuid_from_string),
    );

    // Deconstruct direction: native -> backend.
    registry.register_marshal(
        None,
        ScalarType::Timestamp,
        ValueKind::Timestamp,
        convert(timestamp_to_string),
    );
    registry.register_marshal(
        None,
        ScalarType::Date,
        ValueKind::Date,
        convert(date_to_string),
    );
    registry.register_marshal(
        None,
        ScalarType::Uuid,
        ValueKind::Uuid,
        convert(uuid_to_string),
    );
}

fn convert(f: fn(&Value) -> Result<Value, String>) -> ConvertFn {
    Arc::new(f)
}

fn timestamp_from_string(value: &Value) -> Result<Value, String> {
    let text = value.as_str().ok_or("expected string")?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| Value::Timestamp(dt.timestamp_micros()))
        .map_err(|e| format!("invalid RFC 3339 timestamp `{text}`: {e}"))
}

fn timestamp_from_int(value: &Value) -> Result<Value, String> {
    // Backend integers are taken as microseconds since epoch.
    value
        .as_i64()
        .map(Value::Timestamp)
        .ok_or_else(|| "expected integer micros".to_string())
}

fn timestamp_to_string(value: &Value) -> Result<Value, String> {
    let micros = value.as_timestamp().ok_or("expected timestamp")?;
    DateTime::from_timestamp_micros(micros)
        .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true)))
        .ok_or_else(|| format!("timestamp {micros} out of range"))
}

fn date_from_string(value: &Value) -> Result<Value, String> {
    let text = value.as_str().ok_or("expected string")?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|d| Value::Date(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE))
        .map_err(|e| format!("invalid date `{text}`: {e}"))
}

fn date_from_int(value: &Value) -> Result<Value, String> {
    value
        .as_i32()
        .map(Value::Date)
        .ok_or_else(|| "expected integer days".to_string())
}

fn date_to_string(value: &Value) -> Result<Value, String> {
    let days = value.as_date().ok_or("expected date")?;
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
        .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        .ok_or_else(|| format!("date {days} out of range"))
}

fn uuid_from_string(value: &Value) -> Result<Value, String> {
    let text = value.as_str().ok_or("expected string")?;
    let compact: String = text.chars().filter(|c| *c != '-').collect();
    if compact.len() != 32 {
        return Err(format!("invalid UUID `{text}`"));
    }
    let bytes = hex::decode(&compact).map_err(|e| format!("invalid UUID `{text}`: {e}"))?;
    let mut out = [0u8; 16];
    out.copy_from_slice(&bytes);
    Ok(Value::Uuid(out))
}

fn uuid_to_string(value: &Value) -> Result<Value, String> {
    let bytes = value.as_uuid().ok_or("expected UUID")?;
    let h = hex::encode(bytes);
    Ok(Value::String(format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    )))
}

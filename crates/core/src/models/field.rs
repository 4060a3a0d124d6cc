//! Serde helpers for form-entered values.
//!
//! The client stores untouched inputs as `""`, so every optional measurement
//! accepts `null`, `""`, a JSON number, or a string that parses as the target
//! type.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Wire format for Secchi times (`HH:MM`).
pub const TIME_FORMAT: &str = "%H:%M";

/// Deserialize an optional value where blank input means unset.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a string or number, got {other}"
            )))
        }
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| D::Error::custom(format!("invalid value '{trimmed}': {e}")))
}

/// Parse a wall-clock time as entered on the device.
///
/// Accepts `HH:MM` and `HH:MM:SS`; unpadded minutes (`9:5`) are tolerated.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// `serde(with = ...)` module for `Option<NaiveTime>` stored as `HH:MM`.
pub mod optional_time {
    use super::*;

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format(TIME_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_time(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid time '{s}', expected HH:MM"))),
        }
    }
}

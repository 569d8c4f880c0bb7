//! Column values in storage and domain form, plus the date/time domain types built by objectify.

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A column value. `Date`, `Time`, `Timestamp` and `Json` are object values; the rest are scalars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(Date),
    Time(Time),
    Timestamp(Timestamp),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Date(_) | Value::Time(_) | Value::Timestamp(_) | Value::Json(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Storage form of a value as JSON, e.g. dates become "2024-03-01".
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::Time(t) => serde_json::Value::String(t.to_string()),
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_string()),
            Value::Json(v) => v.clone(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

fn invalid(kind: &'static str, value: &Value) -> ValidationError {
    let input = match value {
        Value::Text(s) => s.clone(),
        other => other.to_json().to_string(),
    };
    ValidationError { kind, input }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date(pub NaiveDate);

impl Date {
    /// Accepts "YYYY-MM-DD" text, a date-time text (time dropped), or an existing date/timestamp.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(ts) => Ok(Date(ts.0.date())),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| parse_datetime_text(s).map(|dt| dt.date()))
                .map(Date)
                .ok_or_else(|| invalid("date", value)),
            other => Err(invalid("date", other)),
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time(pub NaiveTime);

impl Time {
    /// Accepts "HH:MM[:SS[.fff]]" text, or an existing time/timestamp.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Time(t) => Ok(*t),
            Value::Timestamp(ts) => Ok(Time(ts.0.time())),
            Value::Text(s) => {
                let s = s.trim();
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                    .map(Time)
                    .map_err(|_| invalid("time", value))
            }
            other => Err(invalid("time", other)),
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub NaiveDateTime);

impl Timestamp {
    /// Accepts RFC 3339 or "YYYY-MM-DD HH:MM[:SS]" text, a bare date (midnight), epoch seconds,
    /// or an existing timestamp/date.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Date(d) => d
                .0
                .and_hms_opt(0, 0, 0)
                .map(Timestamp)
                .ok_or_else(|| invalid("timestamp", value)),
            Value::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| Timestamp(dt.naive_utc()))
                .ok_or_else(|| invalid("timestamp", value)),
            Value::Text(s) => parse_datetime_text(s)
                .or_else(|| {
                    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(Timestamp)
                .ok_or_else(|| invalid("timestamp", value)),
            other => Err(invalid("timestamp", other)),
        }
    }
}

/// Scalar form `YYYY-MM-DD HH:MM:SS`. Fractional seconds accepted by `parse` are truncated.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_parse() {
        let d = Date::parse(&Value::from("2024-03-01")).unwrap();
        assert_eq!(d.to_string(), "2024-03-01");
        let d = Date::parse(&Value::from("2024-03-01 10:15:00")).unwrap();
        assert_eq!(d.to_string(), "2024-03-01");
        let err = Date::parse(&Value::from("not a date")).unwrap_err();
        assert_eq!(err.kind, "date");
        assert_eq!(err.input, "not a date");
        assert!(Date::parse(&Value::Bool(true)).is_err());
    }

    #[test]
    fn test_time_parse() {
        assert_eq!(Time::parse(&Value::from("08:30")).unwrap().to_string(), "08:30:00");
        assert_eq!(Time::parse(&Value::from("23:59:59")).unwrap().to_string(), "23:59:59");
        assert!(Time::parse(&Value::from("25:00")).is_err());
    }

    #[test]
    fn test_timestamp_parse() {
        let ts = Timestamp::parse(&Value::from("2024-03-01T10:15:30Z")).unwrap();
        assert_eq!(ts.to_string(), "2024-03-01 10:15:30");
        let ts = Timestamp::parse(&Value::from("2024-03-01 10:15:30")).unwrap();
        assert_eq!(ts.to_string(), "2024-03-01 10:15:30");
        let ts = Timestamp::parse(&Value::from("2024-03-01")).unwrap();
        assert_eq!(ts.to_string(), "2024-03-01 00:00:00");
        let ts = Timestamp::parse(&Value::Int(0)).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00");
        assert!(Timestamp::parse(&Value::from("yesterday")).is_err());
    }

    #[test]
    fn test_timestamp_display_truncates_fractional_seconds() {
        let ts = Timestamp::parse(&Value::from("2024-03-01 10:15:30.250")).unwrap();
        assert_eq!(ts.0.format("%.3f").to_string(), ".250");
        assert_eq!(ts.to_string(), "2024-03-01 10:15:30");
    }

    #[test]
    fn test_json_conversion() {
        let v = Value::from(serde_json::json!({"a": 1}));
        assert!(v.is_object());
        assert_eq!(Value::from(serde_json::json!(3)), Value::Int(3));
        assert_eq!(Value::from(serde_json::json!("x")), Value::Text("x".into()));
        assert!(!Value::Int(3).is_object());
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
    }
}

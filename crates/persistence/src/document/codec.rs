//! Value encodings used in stored documents.
//!
//! Timestamps are fixed-width RFC 3339 strings in UTC with nanosecond
//! precision, so comparing the strings orders them chronologically.

use chrono::{DateTime, SecondsFormat, Utc};
use common::{AppError, AppResult};

use crate::query::Value;
use crate::schema::FieldKind;

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("invalid stored timestamp `{}`: {}", s, e)))
}

/// Filter operand as bound into a SurrealQL query.
pub fn bind_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::DateTime(dt) => serde_json::Value::String(format_timestamp(dt)),
    }
}

/// Patch value in domain JSON form -> stored form.
pub fn encode_field(kind: FieldKind, name: &str, value: serde_json::Value) -> AppResult<serde_json::Value> {
    Ok(match (kind, value) {
        (_, serde_json::Value::Null) => serde_json::Value::Null,
        (FieldKind::DateTime, serde_json::Value::String(s)) => {
            let dt = DateTime::parse_from_rfc3339(&s)
                .map_err(|_| AppError::validation(format!("field `{}` expects a timestamp", name)))?;
            serde_json::Value::String(format_timestamp(&dt.with_timezone(&Utc)))
        }
        (FieldKind::Json, v) => serde_json::Value::String(serde_json::to_string(&v)?),
        (_, v) => v,
    })
}

/// Serde adapter for required timestamps.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamps.
pub mod option_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_some(&super::format_timestamp(dt)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| super::parse_timestamp(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_as_strings() {
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let late = early + chrono::Duration::milliseconds(1);
        assert!(format_timestamp(&early) < format_timestamp(&late));
        assert_eq!(format_timestamp(&early).len(), format_timestamp(&late).len());
    }

    #[test]
    fn timestamps_round_trip() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap() + chrono::Duration::nanoseconds(42);
        assert_eq!(parse_timestamp(&format_timestamp(&dt)).unwrap(), dt);
    }

    #[test]
    fn json_fields_are_stored_as_strings() {
        let v = encode_field(FieldKind::Json, "variables", serde_json::json!({ "1": "Ana" })).unwrap();
        assert_eq!(v, serde_json::json!("{\"1\":\"Ana\"}"));
    }

    #[test]
    fn datetime_fields_are_normalised() {
        let v = encode_field(
            FieldKind::DateTime,
            "date",
            serde_json::json!("2024-01-02T03:04:05-03:00"),
        )
        .unwrap();
        assert_eq!(v, serde_json::json!("2024-01-02T06:04:05.000000000Z"));
    }
}

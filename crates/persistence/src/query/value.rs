//! Scalar values carried by filters.

use chrono::{DateTime, Utc};
use common::{AppError, AppResult};

use crate::schema::FieldKind;

/// A literal operand of a filter.
///
/// Values stay loosely typed until compilation, where they are coerced against
/// the kind of the field they are compared with.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a JSON scalar. Arrays and objects are rejected.
    pub fn from_json(json: &serde_json::Value) -> AppResult<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => {
                return Err(AppError::validation(format!(
                    "expected a scalar value, got {}",
                    other
                )))
            }
        })
    }

    /// Coerce this value to the representation required by `kind`.
    ///
    /// `Null` passes through for every kind; callers decide what a null operand means.
    pub fn coerce(&self, kind: FieldKind, field: &str) -> AppResult<Value> {
        let mismatch = |got: &str| {
            AppError::validation(format!(
                "field `{}` expects {:?}, got {}",
                field, kind, got
            ))
        };

        Ok(match (kind, self) {
            (_, Value::Null) => Value::Null,
            (FieldKind::Text | FieldKind::TextArray, Value::String(s)) => Value::String(s.clone()),
            (FieldKind::Bool, Value::Bool(b)) => Value::Bool(*b),
            (FieldKind::Integer, Value::Int(i)) => Value::Int(*i),
            (FieldKind::Float, Value::Float(f)) => Value::Float(*f),
            (FieldKind::Float, Value::Int(i)) => Value::Float(*i as f64),
            (FieldKind::DateTime, Value::DateTime(dt)) => Value::DateTime(*dt),
            (FieldKind::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                .map_err(|_| mismatch("a string that is not an RFC 3339 timestamp"))?,
            (FieldKind::Json, _) => {
                return Err(AppError::unsupported(format!(
                    "field `{}` holds JSON and cannot be filtered",
                    field
                )))
            }
            (_, Value::Bool(_)) => return Err(mismatch("bool")),
            (_, Value::Int(_)) => return Err(mismatch("integer")),
            (_, Value::Float(_)) => return Err(mismatch("float")),
            (_, Value::String(_)) => return Err(mismatch("string")),
            (_, Value::DateTime(_)) => return Err(mismatch("datetime")),
        })
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(
            Value::from_json(&serde_json::json!(5)).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            Value::from_json(&serde_json::json!(1.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            Value::from_json(&serde_json::json!(null)).unwrap(),
            Value::Null
        );
        assert!(Value::from_json(&serde_json::json!([1])).is_err());
    }

    #[test]
    fn strings_coerce_to_datetimes() {
        let v = Value::from("2024-01-02T23:59:59.999Z")
            .coerce(FieldKind::DateTime, "created_datetime")
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(999);
        assert_eq!(v, Value::DateTime(expected));
    }

    #[test]
    fn mismatched_kinds_are_validation_errors() {
        let err = Value::Int(3).coerce(FieldKind::Text, "rut").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = Value::from("x").coerce(FieldKind::Json, "variables").unwrap_err();
        assert!(matches!(err, AppError::Unsupported(_)));
    }

    #[test]
    fn null_passes_every_kind() {
        assert_eq!(
            Value::Null.coerce(FieldKind::DateTime, "start_datetime").unwrap(),
            Value::Null
        );
    }
}

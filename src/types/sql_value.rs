use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// Represents a SQL value in a driver-agnostic way.
/// Used both for bound parameters and for the columns of returned records.
/// Drivers are responsible for converting these to and from their native types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// Arbitrary-precision decimal, kept as its canonical text (`-12.50`, `NaN`).
    Numeric(String),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Uuid(Uuid),
    Json(serde_json::Value),
    /// A column of a type with no dedicated variant, in the driver's binary wire format.
    Other { type_name: String, bytes: Vec<u8> },
}

impl SqlValue {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Returns the value as an i64 if it is any integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int16(i) => Some(i64::from(*i)),
            SqlValue::Int32(i) => Some(i64::from(*i)),
            SqlValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as an f64 if it is a float variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float32(f) => Some(f64::from(*f)),
            SqlValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Renders the value as a SQL literal.
    /// Only used to make logged statements readable, never for execution.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "true".to_string(),
            SqlValue::Bool(false) => "false".to_string(),
            SqlValue::Int16(i) => i.to_string(),
            SqlValue::Int32(i) => i.to_string(),
            SqlValue::Int64(i) => i.to_string(),
            SqlValue::Float32(f) => f.to_string(),
            SqlValue::Float64(f) => f.to_string(),
            SqlValue::Numeric(n) => n.clone(),
            SqlValue::Text(s) => quote(s),
            SqlValue::Bytes(b) => format!("{}::bytea", hex_literal(b)),
            SqlValue::Timestamp(t) => format!("{}::timestamp", quote(&t.to_string())),
            SqlValue::TimestampTz(t) => format!("{}::timestamptz", quote(&t.to_rfc3339())),
            SqlValue::Date(d) => format!("{}::date", quote(&d.to_string())),
            SqlValue::Time(t) => format!("{}::time", quote(&t.to_string())),
            SqlValue::Uuid(u) => format!("{}::uuid", quote(&u.to_string())),
            SqlValue::Json(j) => format!("{}::jsonb", quote(&j.to_string())),
            SqlValue::Other { type_name, bytes } => {
                format!("{} /* {type_name} */", hex_literal(bytes))
            }
        }
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn hex_literal(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("'\\x{hex}'")
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Text(s) => write!(f, "{s}"),
            SqlValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            SqlValue::Numeric(n) => write!(f, "{n}"),
            SqlValue::Timestamp(t) => write!(f, "{t}"),
            SqlValue::TimestampTz(t) => write!(f, "{}", t.to_rfc3339()),
            SqlValue::Date(d) => write!(f, "{d}"),
            SqlValue::Time(t) => write!(f, "{t}"),
            SqlValue::Uuid(u) => write!(f, "{u}"),
            SqlValue::Json(j) => write!(f, "{j}"),
            SqlValue::Other { type_name, bytes } => {
                write!(f, "<{} bytes of {type_name}>", bytes.len())
            }
            other => write!(f, "{}", other.to_literal()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        SqlValue::Int16(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int64(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float32(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float64(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::TimestampTz(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(value: NaiveTime) -> Self {
        SqlValue::Time(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        SqlValue::Json(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

//! Dynamically typed column values.
//!
//! Field lookups, filter conditions, insert shapes and changesets all carry
//! their values as [`Value`], which binds directly into SQLite queries.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::database::HasArguments;
use sqlx::encode::IsNull;
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::{Encode, Type};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

/// Render a timestamp the way it is stored.
///
/// Fixed microsecond precision keeps lexical order identical to time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Type<Sqlite> for Value {
    fn type_info() -> SqliteTypeInfo {
        <str as Type<Sqlite>>::type_info()
    }

    fn compatible(_ty: &SqliteTypeInfo) -> bool {
        true
    }
}

impl<'q> Encode<'q, Sqlite> for Value {
    fn encode_by_ref(&self, buf: &mut <Sqlite as HasArguments<'q>>::ArgumentBuffer) -> IsNull {
        match self {
            Value::Null => IsNull::Yes,
            Value::Bool(v) => <bool as Encode<'q, Sqlite>>::encode_by_ref(v, buf),
            Value::Int(v) => <i64 as Encode<'q, Sqlite>>::encode_by_ref(v, buf),
            Value::Text(v) => <String as Encode<'q, Sqlite>>::encode_by_ref(v, buf),
            Value::Timestamp(v) => <String as Encode<'q, Sqlite>>::encode(format_timestamp(v), buf),
            Value::Json(v) => <String as Encode<'q, Sqlite>>::encode(v.to_string(), buf),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

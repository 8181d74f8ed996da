//! Boundary codecs between entity types and the document store
//!
//! Entities hold `chrono::DateTime<Utc>` for every temporal field. The
//! store's native temporal type is `surrealdb::sql::Datetime`; the serde
//! modules here convert between the two when a record crosses the store
//! boundary, so a raw store timestamp never reaches application code.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use surrealdb::sql::{Datetime, Thing};

/// Serde adapter for `DateTime<Utc>` fields stored as native datetimes.
///
/// ```rust,ignore
/// #[serde(with = "docrepo_db::codec::timestamp")]
/// pub due_at: DateTime<Utc>,
/// ```
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        Datetime::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        Datetime::deserialize(deserializer).map(|stored| stored.0)
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
///
/// Pair with `#[serde(default)]` so records without the field decode to `None`.
pub mod optional_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&Datetime::from(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<Datetime>::deserialize(deserializer).map(|stored| stored.map(|dt| dt.0))
    }
}

/// Deserialize a store record id (`table:key`) into its bare key.
pub fn record_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Thing::deserialize(deserializer).map(|thing| thing.id.to_raw())
}

/// Reject a write payload that carries an `id` field.
///
/// Identity is managed by the store out of band from the document body, so
/// drafts and patches must serialize to a map without `id`.
pub fn ensure_no_identity<P: Serialize>(payload: &P) -> DbResult<()> {
    let value = serde_json::to_value(payload)
        .map_err(|e| DbError::validation(format!("Payload cannot be serialized: {}", e)))?;

    match value {
        serde_json::Value::Object(map) if map.contains_key("id") => Err(DbError::validation(
            "Payload must not contain an 'id' field; identity is assigned by the store",
        )),
        serde_json::Value::Object(_) => Ok(()),
        _ => Err(DbError::validation("Payload must serialize to a map of fields")),
    }
}

/// A value compared against a document field in a query filter.
///
/// `Timestamp` is sent to the store as its native datetime type, so
/// comparisons against stored temporal fields are chronological rather
/// than lexical.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Build a list value from anything convertible.
    pub fn list<V: Into<FieldValue>>(values: impl IntoIterator<Item = V>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Returns true for `FieldValue::List`
    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Text(v) => serializer.serialize_str(v),
            FieldValue::Timestamp(v) => Datetime::from(*v).serialize(serializer),
            FieldValue::List(items) => serializer.collect_seq(items),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Text(v.clone())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl<V: Into<FieldValue>> From<Vec<V>> for FieldValue {
    fn from(values: Vec<V>) -> Self {
        FieldValue::list(values)
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

//! Plain JSON values
//!
//! `JsonValue` is the plain-data representation used at the mapper's edges:
//! constructor payloads, snapshots, persistence diff values and stored
//! documents. It is a newtype around `serde_json::Value` with:
//! - Direct access to the underlying value via Deref/DerefMut
//! - Construction from common Rust types
//! - Path-addressed reads and writes over [`FieldPath`]

use crate::path::{FieldPath, PathSegment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// Object map type used for documents
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// JSON value wrapper
///
/// # Examples
///
/// ```
/// use docmap_core::JsonValue;
///
/// let obj = JsonValue::object();
/// let n = JsonValue::from(42i64);
/// assert!(obj.is_object());
/// assert_eq!(n.as_i64(), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonValue(serde_json::Value);

impl JsonValue {
    /// Create a null JSON value
    pub fn null() -> Self {
        JsonValue(serde_json::Value::Null)
    }

    /// Create an empty JSON object
    pub fn object() -> Self {
        JsonValue(serde_json::Value::Object(JsonMap::new()))
    }

    /// Create an empty JSON array
    pub fn array() -> Self {
        JsonValue(serde_json::Value::Array(Vec::new()))
    }

    /// Get the underlying serde_json::Value
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Get a reference to the underlying serde_json::Value
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }

    /// Get a mutable reference to the underlying serde_json::Value
    pub fn as_inner_mut(&mut self) -> &mut serde_json::Value {
        &mut self.0
    }

    /// Short type name, for error messages
    pub fn type_name(&self) -> &'static str {
        type_name(&self.0)
    }

    /// Read the value at `path`, descending objects by field and arrays by index
    pub fn get_path(&self, path: &FieldPath) -> Option<&serde_json::Value> {
        let mut current = &self.0;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Field(key), serde_json::Value::Object(obj)) => obj.get(key)?,
                (PathSegment::Index(idx), serde_json::Value::Array(arr)) => arr.get(*idx)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at `path`
    ///
    /// Missing intermediate fields are created as objects. Array indices must
    /// already exist. Returns a description of the mismatch on failure.
    pub fn set_path(&mut self, path: &FieldPath, value: serde_json::Value) -> Result<(), String> {
        let segments = path.segments();
        let Some((last, parents)) = segments.split_last() else {
            self.0 = value;
            return Ok(());
        };

        let mut current = &mut self.0;
        for segment in parents {
            current = match segment {
                PathSegment::Field(key) => {
                    let found = type_name(current);
                    let obj = current
                        .as_object_mut()
                        .ok_or_else(|| format!("expected object at '{}', found {}", key, found))?;
                    let slot = obj
                        .entry(key.clone())
                        .or_insert_with(|| serde_json::Value::Object(JsonMap::new()));
                    if slot.is_null() {
                        *slot = serde_json::Value::Object(JsonMap::new());
                    }
                    slot
                }
                PathSegment::Index(idx) => {
                    let found = type_name(current);
                    let arr = current
                        .as_array_mut()
                        .ok_or_else(|| format!("expected array at [{}], found {}", idx, found))?;
                    let len = arr.len();
                    arr.get_mut(*idx)
                        .ok_or_else(|| format!("index {} out of bounds (len {})", idx, len))?
                }
            };
        }

        match last {
            PathSegment::Field(key) => {
                let found = type_name(current);
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("expected object for '{}', found {}", key, found))?;
                obj.insert(key.clone(), value);
                Ok(())
            }
            PathSegment::Index(idx) => {
                let found = type_name(current);
                let arr = current
                    .as_array_mut()
                    .ok_or_else(|| format!("expected array for [{}], found {}", idx, found))?;
                let len = arr.len();
                match arr.get_mut(*idx) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None if *idx == len => {
                        arr.push(value);
                        Ok(())
                    }
                    None => Err(format!("index {} out of bounds (len {})", idx, len)),
                }
            }
        }
    }
}

/// Type name of a raw serde_json value
pub fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl FromStr for JsonValue {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(JsonValue)
    }
}

impl Deref for JsonValue {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for JsonValue {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for JsonValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(v: serde_json::Value) -> Self {
        JsonValue(v)
    }
}

impl From<JsonValue> for serde_json::Value {
    fn from(v: JsonValue) -> Self {
        v.0
    }
}

impl From<JsonMap> for JsonValue {
    fn from(v: JsonMap) -> Self {
        JsonValue(serde_json::Value::Object(v))
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> Self {
        JsonValue(serde_json::Value::Bool(v))
    }
}

impl From<i64> for JsonValue {
    fn from(v: i64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<i32> for JsonValue {
    fn from(v: i32) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<u64> for JsonValue {
    fn from(v: u64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<f64> for JsonValue {
    fn from(v: f64) -> Self {
        JsonValue(
            serde_json::Number::from_f64(v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
        )
    }
}

impl From<&str> for JsonValue {
    fn from(v: &str) -> Self {
        JsonValue(serde_json::Value::String(v.to_string()))
    }
}

impl From<String> for JsonValue {
    fn from(v: String) -> Self {
        JsonValue(serde_json::Value::String(v))
    }
}

impl From<crate::DocId> for JsonValue {
    fn from(v: crate::DocId) -> Self {
        JsonValue(v.to_json())
    }
}

impl<T: Into<JsonValue>> From<Option<T>> for JsonValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => JsonValue::null(),
        }
    }
}

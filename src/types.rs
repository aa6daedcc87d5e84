//! Core data model types.
//!
//! Examples are ordered maps from field names to [`Value`] trees. Leaves are scalars, strings or
//! opaque n-d arrays ([`ArrayValue`]) produced by enrichers such as the audio reader.

use indexmap::IndexMap;
use ndarray::{Array1, ArrayD};
use serde::Serialize;

/// Ordered mapping of field names to values.
pub type Map = IndexMap<String, Value>;

/// A single example: field name -> value, always carrying [`crate::keys::EXAMPLE_ID`] once it
/// leaves an [`crate::view::ExampleSource`].
pub type Example = Map;

/// An n-d array leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrayValue {
    /// Floating point samples (e.g. decoded audio).
    Float(ArrayD<f64>),
    /// Integer data (e.g. word ids, alignments).
    Int(ArrayD<i64>),
}

impl ArrayValue {
    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Float(a) => a.shape(),
            Self::Int(a) => a.shape(),
        }
    }

    /// Length of the leading axis (zero for 0-d arrays).
    pub fn len(&self) -> usize {
        self.shape().first().copied().unwrap_or(0)
    }

    /// Whether the leading axis is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a 1-d integer array.
    pub fn int_vector(values: Vec<i64>) -> Self {
        Self::Int(Array1::from(values).into_dyn())
    }

    /// Builds a 1-d float array.
    pub fn float_vector(values: Vec<f64>) -> Self {
        Self::Float(Array1::from(values).into_dyn())
    }
}

/// A node in an example tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value / JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string (ids, file paths, transcriptions).
    Utf8(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Ordered mapping.
    Map(Map),
    /// Opaque array leaf.
    Array(ArrayValue),
}

impl Value {
    /// Short name of the variant, used in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int64(_) => "int",
            Self::Float64(_) => "float",
            Self::Utf8(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Array(_) => "array",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Number of elements for sequence-like values (lists, arrays, strings count as `None`).
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Self::List(items) => Some(items.len()),
            Self::Array(a) => Some(a.len()),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int64(i),
                None => Self::Float64(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Utf8(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Self::Map(map_from_json(obj)),
        }
    }
}

/// Converts a JSON object into an ordered [`Map`], preserving key order.
pub fn map_from_json(obj: serde_json::Map<String, serde_json::Value>) -> Map {
    obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Utf8(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Utf8(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Self::Array(a)
    }
}

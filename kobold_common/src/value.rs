use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Rendered form of a fully matched list position in a diff.
pub const PLACEHOLDER: &str = "_";

/// Rendered form of the absence sentinel.
pub const ABSENT_MARKER: &str = "<absent>";

/// A concrete value checked against an expected description.
///
/// The variant decides the structural category once, at construction time;
/// see [`Value::shape`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// The key or index was not present in the input. Distinct from `Null`.
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Unordered, de-duplicated collection. Build with [`Value::set`].
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Named tuple: positional like a tuple, with field names.
    Record {
        name: String,
        fields: Vec<(String, Value)>,
    },
    /// Opaque object exposing attributes.
    Object {
        class: String,
        attrs: BTreeMap<String, Value>,
    },
    /// Stand-in for a matched position inside a diff.
    Placeholder,
}

/// Structural category of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Mapping,
    Sequence,
    Set,
    Tuple,
    Scalar,
}

impl Shape {
    /// Sequences, sets and tuples can all be walked element by element.
    pub fn is_sequence_like(self) -> bool {
        matches!(self, Shape::Sequence | Shape::Set | Shape::Tuple)
    }
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    /// Build a set, dropping duplicate elements.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn record<K: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Value::Record {
            name: name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn object<K: Into<String>>(
        class: impl Into<String>,
        attrs: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Value::Object {
            class: class.into(),
            attrs: attrs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Map(_) => Shape::Mapping,
            Value::List(_) => Shape::Sequence,
            Value::Set(_) => Shape::Set,
            Value::Tuple(_) | Value::Record { .. } => Shape::Tuple,
            _ => Shape::Scalar,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn is_null_or_absent(&self) -> bool {
        matches!(self, Value::Null | Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Elements of a sequence-like value, in order.
    pub fn elements(&self) -> Option<Cow<'_, [Value]>> {
        match self {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                Some(Cow::Borrowed(items.as_slice()))
            }
            Value::Record { fields, .. } => Some(Cow::Owned(
                fields.iter().map(|(_, v)| v.clone()).collect(),
            )),
            _ => None,
        }
    }

    /// Runtime type name, as matched by the `is-instance-of` wildcard.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Absent => "absent",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Map(_) => "dict",
            Value::Record { name, .. } => name,
            Value::Object { class, .. } => class,
            Value::Placeholder => "placeholder",
        }
    }

    /// Render as JSON for display. Lossy: tuples and sets become arrays.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Absent => JsonValue::String(ABSENT_MARKER.to_string()),
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(f.to_string())),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::String(format!("b{:?}", String::from_utf8_lossy(b))),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                JsonValue::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => JsonValue::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Record { name, fields } => {
                let mut obj = serde_json::Map::new();
                obj.insert("$record".to_string(), JsonValue::String(name.clone()));
                for (k, v) in fields {
                    obj.insert(k.clone(), v.to_json());
                }
                JsonValue::Object(obj)
            }
            Value::Object { class, attrs } => {
                let mut obj = serde_json::Map::new();
                obj.insert("$class".to_string(), JsonValue::String(class.clone()));
                for (k, v) in attrs {
                    obj.insert(k.clone(), v.to_json());
                }
                JsonValue::Object(obj)
            }
            Value::Placeholder => JsonValue::String(PLACEHOLDER.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            (Value::Null, Value::Null) => true,
            (Value::Placeholder, Value::Placeholder) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Map(a), Value::Map(b)) => a == b,
            (
                Value::Record { name: na, fields: fa },
                Value::Record { name: nb, fields: fb },
            ) => na == nb && fa == fb,
            (
                Value::Object { class: ca, attrs: aa },
                Value::Object { class: cb, attrs: ab },
            ) => ca == cb && aa == ab,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => f.write_str(ABSENT_MARKER),
            Value::Placeholder => f.write_str(PLACEHOLDER),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Str(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

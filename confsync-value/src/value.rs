//! The `Value` tree and its serde bridge to plain JSON.

use crate::Object;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Deserializer};

/// Opaque per-node metadata (comments, formatting hints).
///
/// The sync engine never looks inside; it only clones the annotation with
/// its node and carries it through merges. The payload is whatever the
/// commented-document parser chose to attach.
#[derive(Clone, Debug)]
pub struct Annotation(serde_json::Value);

impl Annotation {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A node in a configuration document tree.
///
/// Equality compares `kind` only; `annotation` is invisible to comparison
/// so that formatting metadata can never cause a spurious merge conflict.
#[derive(Clone, Debug, Default)]
pub struct Value {
    pub kind: ValueKind,
    pub annotation: Option<Annotation>,
}

/// The JSON shapes. Arrays are treated as atomic by the merge engine.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ValueKind {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

impl Value {
    pub fn null() -> Self {
        ValueKind::Null.into()
    }

    pub fn bool(b: bool) -> Self {
        ValueKind::Bool(b).into()
    }

    pub fn number(n: impl Into<serde_json::Number>) -> Self {
        ValueKind::Number(n.into()).into()
    }

    pub fn string(s: impl Into<String>) -> Self {
        ValueKind::String(s.into()).into()
    }

    pub fn array(items: Vec<Value>) -> Self {
        ValueKind::Array(items).into()
    }

    pub fn object(obj: Object) -> Self {
        ValueKind::Object(obj).into()
    }

    pub fn empty_object() -> Self {
        Self::object(Object::new())
    }

    /// Attaches an annotation, builder-style.
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, ValueKind::Object(_))
    }

    pub fn as_object(&self) -> Option<&Object> {
        match &self.kind {
            ValueKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match &mut self.kind {
            ValueKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Converts to a plain `serde_json::Value`, dropping annotations.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.kind {
            ValueKind::Null => serde_json::Value::Null,
            ValueKind::Bool(b) => serde_json::Value::Bool(*b),
            ValueKind::Number(n) => serde_json::Value::Number(n.clone()),
            ValueKind::String(s) => serde_json::Value::String(s.clone()),
            ValueKind::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            ValueKind::Object(obj) => serde_json::Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl From<ValueKind> for Value {
    fn from(kind: ValueKind) -> Self {
        Self {
            kind,
            annotation: None,
        }
    }
}

/// Builds a `Value` from plain JSON. With `serde_json`'s `preserve_order`
/// feature enabled, object keys arrive in document order.
impl From<serde_json::Value> for Value {
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::bool(b),
            serde_json::Value::Number(n) => Value::number(n),
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.kind {
            ValueKind::Null => serializer.serialize_unit(),
            ValueKind::Bool(b) => serializer.serialize_bool(*b),
            ValueKind::Number(n) => n.serialize(serializer),
            ValueKind::String(s) => serializer.serialize_str(s),
            ValueKind::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ValueKind::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.into())
    }
}

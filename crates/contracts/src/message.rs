//! Message - the unit of data flowing between stations
//!
//! A message is an open record: one reserved discriminant (`type`) plus an
//! arbitrary JSON payload that the runtime never inspects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::TypeTag;

/// Name of the reserved discriminant field in the serialized form.
pub const TYPE_FIELD: &str = "type";

/// Tagged message record.
///
/// Serialized as a flat JSON object: `{"type": "say", "content": "hi"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Discriminant used to select a handler
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<TypeTag>,

    /// Domain payload, opaque to the runtime
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Message {
    /// Create an untyped, empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty message carrying `tag`
    pub fn typed(tag: impl Into<TypeTag>) -> Self {
        Self {
            kind: Some(tag.into()),
            payload: Map::new(),
        }
    }

    /// Builder-style field insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Type tag, if one has been set
    pub fn kind(&self) -> Option<&TypeTag> {
        self.kind.as_ref()
    }

    /// Whether a type tag is present
    pub fn has_kind(&self) -> bool {
        self.kind.is_some()
    }

    /// Overwrite the type tag
    pub fn set_kind(&mut self, tag: impl Into<TypeTag>) {
        self.kind = Some(tag.into());
    }

    /// Set the type tag only if none is present.
    ///
    /// Returns `true` when the tag was stamped.
    pub fn stamp_kind(&mut self, tag: &TypeTag) -> bool {
        if self.kind.is_some() {
            return false;
        }
        self.kind = Some(tag.clone());
        true
    }

    /// Read a payload field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Read a payload field as a string slice
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Insert a payload field, returning the previous value.
    ///
    /// `type` is never stored in the payload: a string value under that key
    /// sets the type tag instead, anything else is ignored.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if key == TYPE_FIELD {
            if let Value::String(tag) = value {
                return self.kind.replace(tag.into()).map(|old| Value::from(old.as_str()));
            }
            return None;
        }
        self.payload.insert(key, value)
    }

    /// Remove a payload field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.payload.remove(key)
    }

    /// Borrow the whole payload
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Mutably borrow the whole payload
    pub fn payload_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.payload
    }

    /// Parse a message from a JSON value (must be an object)
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Convert into a flat JSON value
    pub fn to_value(&self) -> Value {
        let mut object = self.payload.clone();
        if let Some(tag) = &self.kind {
            object.insert(TYPE_FIELD.to_string(), Value::from(tag.as_str()));
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_json_shape() {
        let msg = Message::typed("say").with("content", "hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"type": "say", "content": "hi"}));
        assert_eq!(msg.to_value(), value);
    }

    #[test]
    fn test_parse_untyped_object() {
        let msg = Message::from_value(json!({"data": "ccc"})).unwrap();
        assert!(!msg.has_kind());
        assert_eq!(msg.get_str("data"), Some("ccc"));
        assert!(msg.get(TYPE_FIELD).is_none());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(Message::from_value(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_stamp_kind_keeps_existing_tag() {
        let mut msg = Message::typed("say");
        assert!(!msg.stamp_kind(&TypeTag::default()));
        assert_eq!(msg.kind().unwrap(), "say");

        let mut untyped = Message::new();
        assert!(untyped.stamp_kind(&TypeTag::default()));
        assert!(untyped.kind().unwrap().is_default());
    }

    #[test]
    fn test_insert_type_field_sets_tag() {
        let mut msg = Message::new();
        msg.insert("type", "say");
        assert_eq!(msg.kind().unwrap(), "say");
        assert!(msg.payload().is_empty());

        assert!(msg.insert("type", 42).is_none());
        assert_eq!(msg.kind().unwrap(), "say");
    }
}

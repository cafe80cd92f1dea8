use crate::{prelude::*, validate::validate_schema};
use serde::{
    Deserializer, Serializer,
    de::{self, MapAccess, Visitor as DeVisitor},
    ser::SerializeMap,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// SerializeError
///
/// Failures turning a schema document into a [`Schema`] or back.
/// Structural problems found while reading (duplicate names, wrong
/// shapes) surface through the underlying decoder with a descriptive
/// message.
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

///
/// Schema
///
/// Top-level container: an insertion-ordered registry of models.
/// Serializes as a mapping of model names to model descriptors; the
/// name lives on the key only.
///

#[derive(Clone, Debug, Default)]
pub struct Schema {
    models: Vec<Model>,
}

impl Schema {
    #[must_use]
    pub const fn new() -> Self {
        Self { models: Vec::new() }
    }

    //
    // registry
    //

    pub fn insert_model(&mut self, model: Model) -> Result<(), NodeError> {
        if self.contains(&model.name) {
            return Err(NodeError::DuplicateModel(model.name));
        }

        self.models.push(model);

        Ok(())
    }

    /// Builder-style `insert_model`.
    pub fn try_with_model(mut self, model: Model) -> Result<Self, NodeError> {
        self.insert_model(model)?;

        Ok(self)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.name == name)
    }

    pub fn get_model(&self, name: &str) -> Result<&Model, NodeError> {
        self.get(name)
            .ok_or_else(|| NodeError::UnknownModel(name.to_string()))
    }

    pub fn get_model_mut(&mut self, name: &str) -> Result<&mut Model, NodeError> {
        self.get_mut(name)
            .ok_or_else(|| NodeError::UnknownModel(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Models in insertion order.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    /// Model names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    //
    // validation
    //

    /// Run full structural validation: per-node invariants plus
    /// schema-wide passes such as relation target resolution.
    pub fn validate(&self) -> Result<(), ErrorTree> {
        validate_schema(self)
    }

    //
    // document format
    //

    pub fn from_json(json: &str) -> Result<Self, SerializeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.models.len()))?;

        for model in &self.models {
            map.serialize_entry(&model.name, model)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> DeVisitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of model names to model descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = Schema::new();

                while let Some(name) = access.next_key::<String>()? {
                    let mut model: Model = access.next_value()?;
                    model.name = name;

                    out.insert_model(model).map_err(de::Error::custom)?;
                }

                Ok(out)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

impl ValidateNode for Schema {}

impl VisitableNode for Schema {
    fn drive<V: Visitor>(&self, v: &mut V) {
        for node in &self.models {
            node.accept(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_model_registration_fails() {
        let mut schema = Schema::new();
        schema.insert_model(Model::new("user")).unwrap();

        let err = schema.insert_model(Model::new("user")).unwrap_err();
        assert_eq!(err, NodeError::DuplicateModel("user".to_string()));
    }

    #[test]
    fn unknown_model_lookup_fails() {
        let schema = Schema::new();

        let err = schema.get_model("ghost").unwrap_err();
        assert_eq!(err, NodeError::UnknownModel("ghost".to_string()));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let schema = Schema::new()
            .try_with_model(Model::new("zebra"))
            .unwrap()
            .try_with_model(Model::new("aardvark"))
            .unwrap();

        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["zebra", "aardvark"]);
    }

    #[test]
    fn duplicate_model_keys_fail_deserialization() {
        let doc = r#"{"user": {"fields": {}}, "user": {"fields": {}}}"#;

        let err = Schema::from_json(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate model name 'user'"));
    }

    #[test]
    fn duplicate_field_keys_fail_deserialization() {
        let doc = r#"{"user": {"fields": {"name": {}, "name": {}}}}"#;

        let err = Schema::from_json(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate field name 'name'"));
    }

    #[test]
    fn explicit_null_default_survives_round_trip() {
        let doc = r#"{"user":{"fields":{"bio":{"nullable":true,"default":null}}}}"#;

        let schema = Schema::from_json(doc).unwrap();
        let field = schema.get("user").unwrap().field("bio").unwrap();
        assert_eq!(field.default_value, Some(crate::types::Value::Null));

        assert_eq!(schema.to_json().unwrap(), doc);
    }

    #[test]
    fn object_valued_extra_keys_survive_round_trip() {
        let doc = r#"{"user":{"fields":{},"x_meta":{"a":1}}}"#;

        let schema = Schema::from_json(doc).unwrap();
        let meta = schema.get("user").unwrap().get("x_meta").unwrap();
        let map = meta.as_map().expect("object extra parses as a map");
        assert_eq!(map.get("a"), Some(&crate::types::Value::Int(1)));

        assert_eq!(schema.to_json().unwrap(), doc);
    }

    #[test]
    fn malformed_descriptor_reports_an_error() {
        // fields must be a map, not a list
        let doc = r#"{"user": {"fields": []}}"#;
        assert!(Schema::from_json(doc).is_err());

        // label must be text
        let doc = r#"{"user": {"fields": {}, "label": 7}}"#;
        assert!(Schema::from_json(doc).is_err());
    }
}

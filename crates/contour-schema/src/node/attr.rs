use crate::types::Value;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor as DeVisitor},
    ser::SerializeMap,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// AttrError
///
/// Dynamic attribute access failures on the static layer.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AttrError {
    #[error("attribute '{0}' is structural and cannot be set dynamically")]
    ReadOnly(String),

    #[error("attribute '{attr}' expects {expected}, got {got}")]
    WrongType {
        attr: String,
        expected: &'static str,
        got: &'static str,
    },
}

///
/// AttrMap
///
/// Insertion-ordered store for attributes the descriptor schema does
/// not recognize. Unknown keys survive a deserialize/serialize round
/// trip untouched, which is what keeps old readers compatible with
/// newer documents.
///

#[derive(Clone, Debug, Default, PartialEq, derive_more::IntoIterator)]
pub struct AttrMap {
    #[into_iterator(ref)]
    entries: Vec<(String, Value)>,
}

impl AttrMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or replace, preserving the original position on replace.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;

        Some(self.entries.remove(pos).1)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for AttrMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;

        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for AttrMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttrMapVisitor;

        impl<'de> DeVisitor<'de> for AttrMapVisitor {
            type Value = AttrMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute names to primitive values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = AttrMap::new();

                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    out.set(key, value);
                }

                Ok(out)
            }
        }

        deserializer.deserialize_map(AttrMapVisitor)
    }
}

// Typed extractors shared by the dynamic `set` paths on Model and Field.

pub(crate) fn expect_bool(attr: &str, value: &Value) -> Result<bool, AttrError> {
    value.as_bool().ok_or_else(|| AttrError::WrongType {
        attr: attr.to_string(),
        expected: "bool",
        got: value.kind_str(),
    })
}

pub(crate) fn expect_text(attr: &str, value: &Value) -> Result<String, AttrError> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| AttrError::WrongType {
            attr: attr.to_string(),
            expected: "text",
            got: value.kind_str(),
        })
}

pub(crate) fn expect_name_list(attr: &str, value: &Value) -> Result<Vec<String>, AttrError> {
    let items = value.as_list().ok_or_else(|| AttrError::WrongType {
        attr: attr.to_string(),
        expected: "list of names",
        got: value.kind_str(),
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(ToString::to_string)
                .ok_or_else(|| AttrError::WrongType {
                    attr: attr.to_string(),
                    expected: "list of names",
                    got: item.kind_str(),
                })
        })
        .collect()
}

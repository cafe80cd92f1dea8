use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser::SerializeSeq};
use std::fmt::{self, Display};
use std::str::FromStr;

///
/// Value
///
/// Attribute values carried by the static descriptor layer. Untagged
/// so documents stay plain JSON; any JSON value has a home here,
/// objects included.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(crate::node::AttrMap),
}

impl Value {
    /// Short type name used in attribute errors.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&crate::node::AttrMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Build a list value from string items.
    #[must_use]
    pub fn names<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Text(s.into())).collect())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

///
/// FieldType
///
/// Built-in field type tags. Serialized as snake_case strings in the
/// document format; custom tags outside this set are carried verbatim
/// by [`FieldKind::Name`].
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[remain::sorted]
pub enum FieldType {
    Boolean,
    Checkbox,
    Color,
    CreatableSelect,
    Currency,
    Date,
    DateTime,
    Email,
    File,
    Float,
    Id,
    Integer,
    Password,
    Phone,
    Radio,
    String,
    Textarea,
    Url,
}

impl FieldType {
    /// Snake_case tag used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Checkbox => "checkbox",
            Self::Color => "color",
            Self::CreatableSelect => "creatable_select",
            Self::Currency => "currency",
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::Email => "email",
            Self::File => "file",
            Self::Float => "float",
            Self::Id => "id",
            Self::Integer => "integer",
            Self::Password => "password",
            Self::Phone => "phone",
            Self::Radio => "radio",
            Self::String => "string",
            Self::Textarea => "textarea",
            Self::Url => "url",
        }
    }

    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Color
                | Self::CreatableSelect
                | Self::Email
                | Self::File
                | Self::Id
                | Self::Password
                | Self::Phone
                | Self::Radio
                | Self::String
                | Self::Textarea
                | Self::Url
        )
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Currency | Self::Float | Self::Integer)
    }

    /// Whether a static default value is type-compatible with this tag.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Boolean | Self::Checkbox => matches!(value, Value::Bool(_)),
            Self::Integer => matches!(value, Value::Int(_)),
            Self::Currency | Self::Float => matches!(value, Value::Int(_) | Value::Float(_)),
            Self::Date | Self::DateTime => matches!(value, Value::Text(_) | Value::Int(_)),
            _ => matches!(value, Value::Text(_)),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "boolean" => Self::Boolean,
            "checkbox" => Self::Checkbox,
            "color" => Self::Color,
            "creatable_select" => Self::CreatableSelect,
            "currency" => Self::Currency,
            "date" => Self::Date,
            "date_time" => Self::DateTime,
            "email" => Self::Email,
            "file" => Self::File,
            "float" => Self::Float,
            "id" => Self::Id,
            "integer" => Self::Integer,
            "password" => Self::Password,
            "phone" => Self::Phone,
            "radio" => Self::Radio,
            "string" => Self::String,
            "textarea" => Self::Textarea,
            "url" => Self::Url,
            _ => return Err(()),
        };

        Ok(ty)
    }
}

///
/// RelationKind
///
/// Size and direction of a relation between two models.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[remain::sorted]
pub enum RelationKind {
    ManyToMany,
    ManyToOne,
    OneToMany,
    OneToOne,
}

impl RelationKind {
    /// Relations in the "to one" direction read as a single attribute
    /// rather than a table.
    #[must_use]
    pub const fn is_to_one(self) -> bool {
        matches!(self, Self::ManyToOne | Self::OneToOne)
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ManyToMany => "many_to_many",
            Self::ManyToOne => "many_to_one",
            Self::OneToMany => "one_to_many",
            Self::OneToOne => "one_to_one",
        };

        f.write_str(s)
    }
}

///
/// FieldKind
///
/// The "type" of a field: a named tag (built-in or custom) or an
/// inline relation descriptor.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldKind {
    Relation(crate::node::Relation),
    Name(String),
}

impl FieldKind {
    #[must_use]
    pub fn builtin(&self) -> Option<FieldType> {
        match self {
            Self::Name(name) => name.parse().ok(),
            Self::Relation(_) => None,
        }
    }

    #[must_use]
    pub const fn as_relation(&self) -> Option<&crate::node::Relation> {
        match self {
            Self::Relation(rel) => Some(rel),
            Self::Name(_) => None,
        }
    }

    #[must_use]
    pub const fn is_relation(&self) -> bool {
        matches!(self, Self::Relation(_))
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Name(FieldType::String.as_str().to_string())
    }
}

impl From<FieldType> for FieldKind {
    fn from(ty: FieldType) -> Self {
        Self::Name(ty.as_str().to_string())
    }
}

impl From<crate::node::Relation> for FieldKind {
    fn from(rel: crate::node::Relation) -> Self {
        Self::Relation(rel)
    }
}

///
/// Choice
///
/// A permitted field value with its display label. On the wire a
/// choice is always a `[value, label]` pair; the shorthand where the
/// label repeats the value exists only in the constructor API.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// A choice whose label equals its value.
    pub fn simple(value: impl Into<String>) -> Self {
        let value = value.into();
        let label = value.clone();

        Self { value, label }
    }
}

impl Serialize for Choice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.value)?;
        seq.serialize_element(&self.label)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Choice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (value, label) = <(String, String)>::deserialize(deserializer)
            .map_err(|_| de::Error::custom("choice must be a [value, label] pair"))?;

        Ok(Self { value, label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_round_trips_through_str() {
        for ty in [FieldType::DateTime, FieldType::CreatableSelect, FieldType::Id] {
            assert_eq!(ty.as_str().parse::<FieldType>(), Ok(ty));
        }
        assert!("not_a_type".parse::<FieldType>().is_err());
    }

    #[test]
    fn field_kind_builtin_parses_known_tags() {
        let kind = FieldKind::Name("date_time".to_string());
        assert_eq!(kind.builtin(), Some(FieldType::DateTime));

        let custom = FieldKind::Name("geo_point".to_string());
        assert_eq!(custom.builtin(), None);
    }

    #[test]
    fn value_untagged_json_shapes() {
        let v: Value = serde_json::from_str("false").unwrap();
        assert_eq!(v, Value::Bool(false));

        let v: Value = serde_json::from_str("[\"a\", 1]").unwrap();
        assert_eq!(v, Value::List(vec![Value::Text("a".into()), Value::Int(1)]));

        assert_eq!(serde_json::to_string(&Value::Text("x".into())).unwrap(), "\"x\"");
    }

    #[test]
    fn value_accepts_json_objects() {
        let v: Value = serde_json::from_str(r#"{"a": 1, "b": [true]}"#).unwrap();

        let map = v.as_map().expect("object parses as a map value");
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(map.get("b"), Some(&Value::List(vec![Value::Bool(true)])));

        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"a":1,"b":[true]}"#);
    }

    #[test]
    fn choice_serializes_as_pair() {
        let choice = Choice::new("a", "Alpha");
        let json = serde_json::to_string(&choice).unwrap();
        assert_eq!(json, "[\"a\",\"Alpha\"]");

        let back: Choice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, choice);

        assert!(serde_json::from_str::<Choice>("\"bare\"").is_err());
    }
}

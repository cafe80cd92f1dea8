use crate::{
    casing,
    node::attr::{expect_bool, expect_text},
    prelude::*,
    resolve::ResolverMap,
    trace::{ResolveSource, ResolveTraceEvent, ResolveTraceSink},
    types::{Choice, FieldKind, Value},
    validate::naming,
};
use serde::{
    Deserializer, Serializer,
    de::{self, MapAccess, Visitor as DeVisitor},
    ser::SerializeMap,
};
use std::any::Any;
use std::fmt;

///
/// FieldList
///
/// Insertion-ordered field registry. Serializes as a mapping of field
/// names to descriptors; the name lives on the key only.
///

#[derive(Clone, Debug, Default, derive_more::Deref)]
pub struct FieldList {
    #[deref]
    pub(crate) fields: Vec<Field>,
}

impl FieldList {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl Serialize for FieldList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;

        for field in &self.fields {
            map.serialize_entry(&field.name, field)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldListVisitor;

        impl<'de> DeVisitor<'de> for FieldListVisitor {
            type Value = FieldList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = FieldList::new();

                while let Some(name) = access.next_key::<String>()? {
                    if out.contains(&name) {
                        return Err(de::Error::custom(format!(
                            "duplicate field name '{name}'"
                        )));
                    }

                    let mut field: Field = access.next_value()?;
                    field.name = name;
                    out.fields.push(field);
                }

                Ok(out)
            }
        }

        deserializer.deserialize_map(FieldListVisitor)
    }
}

impl ValidateNode for FieldList {}

impl VisitableNode for FieldList {
    fn route_key(&self) -> String {
        "fields".to_string()
    }

    fn drive<V: Visitor>(&self, v: &mut V) {
        for node in &self.fields {
            node.accept(v);
        }
    }
}

///
/// Field
///
/// Describes a single attribute of a model: its type, how it behaves
/// when viewed, edited, and queried. Every descriptor except the name
/// is optional; getters apply the documented defaults without ever
/// materializing them into the serialized form.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Field {
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(
        rename = "default",
        default,
        deserialize_with = "explicit_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_attribute: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_help: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_data_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_help: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_sort: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_filter: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_edit: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_collapse: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_index: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_create: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_detail: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_tooltip: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_list_include: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_single_include: Option<bool>,

    #[serde(rename = "virtual", default, skip_serializing_if = "Option::is_none")]
    pub virtual_: Option<bool>,

    /// Unrecognized attributes, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: AttrMap,

    #[serde(skip)]
    pub(crate) resolvers: ResolverMap,
}

// A written `default: null` is an explicit null value, not absence;
// absence is the missing key handled by `#[serde(default)]`.
fn explicit_default<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<FieldKind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    //
    // defaulted getters
    //

    /// Effective field kind; `string` when unset.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }

    /// Whether this field reads as a key/value attribute rather than a
    /// table. Scalar kinds default to true; relations default to true
    /// only in the "to one" direction.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        self.is_attribute.unwrap_or_else(|| match self.kind() {
            FieldKind::Name(_) => true,
            FieldKind::Relation(rel) => rel.kind.is_to_one(),
        })
    }

    /// User-facing name, title-cased from `name` when unset.
    #[must_use]
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| casing::title(&self.name))
    }

    /// Placeholder shown for null values; "N/A" when unset.
    #[must_use]
    pub fn no_data_value(&self) -> String {
        self.no_data_value
            .clone()
            .unwrap_or_else(|| "N/A".to_string())
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.is_disabled.unwrap_or(false)
    }

    #[must_use]
    pub fn can_sort(&self) -> bool {
        self.can_sort.unwrap_or(true)
    }

    #[must_use]
    pub fn can_filter(&self) -> bool {
        self.can_filter.unwrap_or(true)
    }

    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.can_edit.unwrap_or(true)
    }

    #[must_use]
    pub fn can_collapse(&self) -> bool {
        self.can_collapse.unwrap_or(true)
    }

    #[must_use]
    pub fn show_index(&self) -> bool {
        self.show_index.unwrap_or(true)
    }

    #[must_use]
    pub fn show_create(&self) -> bool {
        self.show_create.unwrap_or(true)
    }

    #[must_use]
    pub fn show_detail(&self) -> bool {
        self.show_detail.unwrap_or(true)
    }

    #[must_use]
    pub fn show_tooltip(&self) -> bool {
        self.show_tooltip.unwrap_or(false)
    }

    #[must_use]
    pub fn query_list_include(&self) -> bool {
        self.query_list_include.unwrap_or(true)
    }

    #[must_use]
    pub fn query_single_include(&self) -> bool {
        self.query_single_include.unwrap_or(true)
    }

    /// A virtual field is absent from data and queries; it only
    /// anchors custom local behavior.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.virtual_.unwrap_or(false)
    }

    //
    // dynamic attribute access
    //

    /// Read a static attribute by name, defaults applied. Unrecognized
    /// names fall through to the extra map.
    #[must_use]
    pub fn get(&self, attr: &str) -> Option<Value> {
        match attr {
            "name" => Some(Value::Text(self.name.clone())),
            "type" => match self.kind() {
                FieldKind::Name(name) => Some(Value::Text(name)),
                FieldKind::Relation(_) => None,
            },
            "nullable" => Some(Value::Bool(self.nullable())),
            "default" => self.default_value.clone(),
            "is_attribute" => Some(Value::Bool(self.is_attribute())),
            "choices" => self.choices.as_ref().map(|choices| {
                Value::List(
                    choices
                        .iter()
                        .map(|c| {
                            Value::List(vec![
                                Value::Text(c.value.clone()),
                                Value::Text(c.label.clone()),
                            ])
                        })
                        .collect(),
                )
            }),
            "label" => Some(Value::Text(self.label())),
            "label_help" => self.label_help.clone().map(Value::Text),
            "no_data_value" => Some(Value::Text(self.no_data_value())),
            "input_help" => self.input_help.clone().map(Value::Text),
            "is_disabled" => Some(Value::Bool(self.is_disabled())),
            "can_sort" => Some(Value::Bool(self.can_sort())),
            "can_filter" => Some(Value::Bool(self.can_filter())),
            "can_edit" => Some(Value::Bool(self.can_edit())),
            "can_collapse" => Some(Value::Bool(self.can_collapse())),
            "show_index" => Some(Value::Bool(self.show_index())),
            "show_create" => Some(Value::Bool(self.show_create())),
            "show_detail" => Some(Value::Bool(self.show_detail())),
            "show_tooltip" => Some(Value::Bool(self.show_tooltip())),
            "query_list_include" => Some(Value::Bool(self.query_list_include())),
            "query_single_include" => Some(Value::Bool(self.query_single_include())),
            "virtual" => Some(Value::Bool(self.is_virtual())),
            _ => self.extra.get(attr).cloned(),
        }
    }

    /// Write a static attribute by name. Recognized attributes reject
    /// values of the wrong type; unrecognized names land in the extra
    /// map untyped.
    pub fn set(&mut self, attr: &str, value: Value) -> Result<(), AttrError> {
        match attr {
            "name" | "choices" => return Err(AttrError::ReadOnly(attr.to_string())),
            "type" => self.kind = Some(FieldKind::Name(expect_text(attr, &value)?)),
            "nullable" => self.nullable = Some(expect_bool(attr, &value)?),
            "default" => self.default_value = Some(value),
            "is_attribute" => self.is_attribute = Some(expect_bool(attr, &value)?),
            "label" => self.label = Some(expect_text(attr, &value)?),
            "label_help" => self.label_help = Some(expect_text(attr, &value)?),
            "no_data_value" => self.no_data_value = Some(expect_text(attr, &value)?),
            "input_help" => self.input_help = Some(expect_text(attr, &value)?),
            "is_disabled" => self.is_disabled = Some(expect_bool(attr, &value)?),
            "can_sort" => self.can_sort = Some(expect_bool(attr, &value)?),
            "can_filter" => self.can_filter = Some(expect_bool(attr, &value)?),
            "can_edit" => self.can_edit = Some(expect_bool(attr, &value)?),
            "can_collapse" => self.can_collapse = Some(expect_bool(attr, &value)?),
            "show_index" => self.show_index = Some(expect_bool(attr, &value)?),
            "show_create" => self.show_create = Some(expect_bool(attr, &value)?),
            "show_detail" => self.show_detail = Some(expect_bool(attr, &value)?),
            "show_tooltip" => self.show_tooltip = Some(expect_bool(attr, &value)?),
            "query_list_include" => self.query_list_include = Some(expect_bool(attr, &value)?),
            "query_single_include" => self.query_single_include = Some(expect_bool(attr, &value)?),
            "virtual" => self.virtual_ = Some(expect_bool(attr, &value)?),
            _ => self.extra.set(attr, value),
        }

        Ok(())
    }

    //
    // functional layer
    //

    /// Attach a resolver computing `attr` from application context.
    /// Reattaching under the same name replaces the resolver.
    pub fn attach_resolver<F>(&mut self, attr: impl Into<String>, f: F)
    where
        F: Fn(&dyn Any) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.resolvers.attach(attr, f);
    }

    pub fn remove_resolver(&mut self, attr: &str) -> bool {
        self.resolvers.remove(attr).is_some()
    }

    #[must_use]
    pub const fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    /// Effective value for `attr`: the resolver's result when one is
    /// attached, otherwise the static value. Resolver failures
    /// propagate untouched.
    pub fn effective(&self, attr: &str, cx: &dyn Any) -> Result<Option<Value>, ResolveError> {
        match self.resolvers.get(attr) {
            Some(resolver) => resolver(cx).map(Some),
            None => Ok(self.get(attr)),
        }
    }

    /// Same as [`effective`](Self::effective), reporting the outcome to
    /// an injected trace sink.
    pub fn effective_traced(
        &self,
        attr: &str,
        cx: &dyn Any,
        sink: &dyn ResolveTraceSink,
    ) -> Result<Option<Value>, ResolveError> {
        let (out, source) = match self.resolvers.get(attr) {
            Some(resolver) => (resolver(cx).map(Some), ResolveSource::Resolver),
            None => match self.get(attr) {
                Some(value) => (Ok(Some(value)), ResolveSource::Static),
                None => (Ok(None), ResolveSource::Missing),
            },
        };

        sink.on_event(ResolveTraceEvent {
            scope: &self.name,
            attr,
            source,
            ok: out.is_ok(),
        });

        out
    }
}

impl ValidateNode for Field {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = naming::validate_field_name(&self.name) {
            errs.add(msg);
        }

        if let Some(choices) = &self.choices
            && choices.is_empty()
        {
            err!(errs, "choices must not be empty when present");
        }

        // Default values must agree with a built-in kind when both are
        // known. Custom kinds are opaque and skipped.
        if let Some(default) = &self.default_value {
            if matches!(default, Value::Null) {
                if !self.nullable() {
                    err!(errs, "null default on a non-nullable field");
                }
            } else if let Some(ty) = self.kind().builtin()
                && !ty.accepts(default)
            {
                err!(
                    errs,
                    "default value of type {} does not fit field type '{ty}'",
                    default.kind_str(),
                );
            }
        }

        errs.result()
    }
}

impl VisitableNode for Field {
    fn route_key(&self) -> String {
        self.name.clone()
    }

    fn drive<V: Visitor>(&self, v: &mut V) {
        if let Some(FieldKind::Relation(rel)) = &self.kind {
            rel.accept(v);
        }
    }
}

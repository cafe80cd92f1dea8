use crate::{
    casing,
    node::attr::{expect_bool, expect_name_list, expect_text},
    prelude::*,
    resolve::ResolverMap,
    trace::{ResolveSource, ResolveTraceEvent, ResolveTraceSink},
    types::Value,
    validate::naming,
};
use std::any::Any;
use std::collections::BTreeSet;

///
/// Model
///
/// Describes one data-model type in the schema: its fields plus the
/// static attributes driving index, detail, create, and query
/// surfaces. Defaults are derived lazily from `name` and the field
/// registry, never written into the serialized form.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Model {
    #[serde(skip)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_plural: Option<String>,

    #[serde(default)]
    pub fields: FieldList,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_order: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_singleton: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_index: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_field_order: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_link_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_can_sort: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_can_filter: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_can_page: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_create: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_field_order: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_delete: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_rel_delete: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_detail: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_search: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<DetailTab>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_field_order: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip_field_order: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_list: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_single: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_required_fields: Option<Vec<String>>,

    /// Unrecognized attributes, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: AttrMap,

    #[serde(skip)]
    pub(crate) resolvers: ResolverMap,
}

// Display surface a field order is built for. Query orders reuse the
// index/detail surfaces, widened by the matching query include flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OrderScope {
    Index,
    Create,
    Detail,
    Tooltip,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum QueryKind {
    List,
    Single,
}

impl Model {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    //
    // field registry
    //

    pub fn insert_field(&mut self, field: Field) -> Result<(), NodeError> {
        if self.fields.contains(&field.name) {
            return Err(NodeError::DuplicateField {
                model: self.name.clone(),
                field: field.name,
            });
        }

        self.fields.fields.push(field);

        Ok(())
    }

    /// Builder-style `insert_field`.
    pub fn try_with_field(mut self, field: Field) -> Result<Self, NodeError> {
        self.insert_field(field)?;

        Ok(self)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    pub fn get_field(&self, name: &str) -> Result<&Field, NodeError> {
        self.fields.get(name).ok_or_else(|| NodeError::UnknownField {
            model: self.name.clone(),
            field: name.to_string(),
        })
    }

    pub fn get_field_mut(&mut self, name: &str) -> Result<&mut Field, NodeError> {
        let model = self.name.clone();

        self.fields.get_mut(name).ok_or_else(|| NodeError::UnknownField {
            model,
            field: name.to_string(),
        })
    }

    //
    // defaulted getters
    //

    /// User-facing name, title-cased from `name` when unset.
    #[must_use]
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| casing::title(&self.name))
    }

    /// User-facing plural name, naively pluralized when unset.
    #[must_use]
    pub fn label_plural(&self) -> String {
        self.label_plural
            .clone()
            .unwrap_or_else(|| casing::plural(&self.label()))
    }

    /// Field names in display order; field insertion order when unset.
    #[must_use]
    pub fn field_order(&self) -> Vec<String> {
        self.field_order
            .clone()
            .unwrap_or_else(|| self.fields.names().map(ToString::to_string).collect())
    }

    /// Field holding the value that represents an instance.
    #[must_use]
    pub fn display_field(&self) -> String {
        self.display_field
            .clone()
            .unwrap_or_else(|| "name".to_string())
    }

    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.is_singleton.unwrap_or(false)
    }

    #[must_use]
    pub fn has_index(&self) -> bool {
        self.has_index.unwrap_or(true)
    }

    /// Field linking to the detail surface in tables; defaults to the
    /// display field.
    #[must_use]
    pub fn table_link_field(&self) -> String {
        self.table_link_field
            .clone()
            .unwrap_or_else(|| self.display_field())
    }

    #[must_use]
    pub fn table_can_sort(&self) -> bool {
        self.table_can_sort.unwrap_or(true)
    }

    #[must_use]
    pub fn table_can_filter(&self) -> bool {
        self.table_can_filter.unwrap_or(true)
    }

    #[must_use]
    pub fn table_can_page(&self) -> bool {
        self.table_can_page.unwrap_or(true)
    }

    #[must_use]
    pub fn has_create(&self) -> bool {
        self.has_create.unwrap_or(true)
    }

    #[must_use]
    pub fn has_delete(&self) -> bool {
        self.has_delete.unwrap_or(true)
    }

    #[must_use]
    pub fn show_in_rel_delete(&self) -> bool {
        self.show_in_rel_delete.unwrap_or(true)
    }

    #[must_use]
    pub fn has_detail(&self) -> bool {
        self.has_detail.unwrap_or(true)
    }

    /// Defaults to `has_detail`.
    #[must_use]
    pub fn show_in_search(&self) -> bool {
        self.show_in_search.unwrap_or_else(|| self.has_detail())
    }

    /// Name of the list query; lowerCamel of the plural label.
    #[must_use]
    pub fn query_list(&self) -> String {
        self.query_list
            .clone()
            .unwrap_or_else(|| casing::lower_camel(&self.label_plural()))
    }

    /// Name of the single-instance query; lowerCamel of the label.
    #[must_use]
    pub fn query_single(&self) -> String {
        self.query_single
            .clone()
            .unwrap_or_else(|| casing::lower_camel(&self.label()))
    }

    /// Fields included in every query; id plus the display field.
    #[must_use]
    pub fn query_required_fields(&self) -> Vec<String> {
        self.query_required_fields.clone().unwrap_or_else(|| {
            let display = self.display_field();

            if display == "id" {
                vec![display]
            } else {
                vec!["id".to_string(), display]
            }
        })
    }

    //
    // ordering operations
    //

    /// Columns on the index surface, in order.
    #[must_use]
    pub fn index_fields(&self) -> Vec<String> {
        self.build_order(OrderScope::Index, None)
    }

    /// Inputs on the create surface, in order.
    #[must_use]
    pub fn create_fields(&self) -> Vec<String> {
        self.build_order(OrderScope::Create, None)
    }

    /// Fields on the detail surface, in order. Detail tabs win when
    /// present, then the explicit detail order, then `show_detail`.
    #[must_use]
    pub fn detail_fields(&self) -> Vec<String> {
        if !self.tabs.is_empty() {
            return self.tabs.iter().flat_map(DetailTab::flatten_fields).collect();
        }

        self.build_order(OrderScope::Detail, None)
    }

    /// Fields shown in link tooltips, in order.
    #[must_use]
    pub fn tooltip_fields(&self) -> Vec<String> {
        self.build_order(OrderScope::Tooltip, None)
    }

    /// Fields requested by the list query. Required fields lead, then
    /// the index surface widened by `query_list_include`, minus
    /// virtual fields.
    #[must_use]
    pub fn query_list_fields(&self) -> Vec<String> {
        self.build_order(OrderScope::Index, Some(QueryKind::List))
    }

    /// Fields requested by the single query. Required fields lead,
    /// then the detail surface widened by `query_single_include`,
    /// minus virtual fields.
    #[must_use]
    pub fn query_single_fields(&self) -> Vec<String> {
        self.build_order(OrderScope::Detail, Some(QueryKind::Single))
    }

    fn explicit_order(&self, scope: OrderScope) -> Option<&Vec<String>> {
        match scope {
            OrderScope::Index => self.index_field_order.as_ref(),
            OrderScope::Create => self.create_field_order.as_ref(),
            OrderScope::Detail => self.detail_field_order.as_ref(),
            OrderScope::Tooltip => self.tooltip_field_order.as_ref(),
        }
    }

    fn build_order(&self, scope: OrderScope, query: Option<QueryKind>) -> Vec<String> {
        let mut out = match query {
            Some(_) => self.query_required_fields(),
            None => Vec::new(),
        };

        let required: BTreeSet<String> = out.iter().cloned().collect();

        if let Some(order) = self.explicit_order(scope) {
            out.extend(order.iter().filter(|n| !required.contains(*n)).cloned());

            return out;
        }

        for name in self.field_order() {
            if required.contains(&name) {
                continue;
            }

            // dangling names are reported by validation, not here
            let Some(field) = self.fields.get(&name) else {
                continue;
            };

            let show = match scope {
                OrderScope::Index => field.show_index(),
                OrderScope::Create => field.show_create(),
                OrderScope::Detail => field.show_detail(),
                OrderScope::Tooltip => field.show_tooltip(),
            };

            match query {
                None => {
                    if show {
                        out.push(name);
                    }
                }
                Some(kind) => {
                    let include = match kind {
                        QueryKind::List => field.query_list_include(),
                        QueryKind::Single => field.query_single_include(),
                    };

                    if !field.is_virtual() && (show || include) {
                        out.push(name);
                    }
                }
            }
        }

        out
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
            "label" => Some(Value::Text(self.label())),
            "label_plural" => Some(Value::Text(self.label_plural())),
            "field_order" => Some(Value::names(self.field_order())),
            "display_field" => Some(Value::Text(self.display_field())),
            "is_singleton" => Some(Value::Bool(self.is_singleton())),
            "has_index" => Some(Value::Bool(self.has_index())),
            "index_field_order" => self.index_field_order.clone().map(Value::names),
            "table_link_field" => Some(Value::Text(self.table_link_field())),
            "table_can_sort" => Some(Value::Bool(self.table_can_sort())),
            "table_can_filter" => Some(Value::Bool(self.table_can_filter())),
            "table_can_page" => Some(Value::Bool(self.table_can_page())),
            "has_create" => Some(Value::Bool(self.has_create())),
            "create_field_order" => self.create_field_order.clone().map(Value::names),
            "has_delete" => Some(Value::Bool(self.has_delete())),
            "show_in_rel_delete" => Some(Value::Bool(self.show_in_rel_delete())),
            "has_detail" => Some(Value::Bool(self.has_detail())),
            "show_in_search" => Some(Value::Bool(self.show_in_search())),
            "detail_field_order" => self.detail_field_order.clone().map(Value::names),
            "tooltip_field_order" => self.tooltip_field_order.clone().map(Value::names),
            "query_list" => Some(Value::Text(self.query_list())),
            "query_single" => Some(Value::Text(self.query_single())),
            "query_required_fields" => Some(Value::names(self.query_required_fields())),
            _ => self.extra.get(attr).cloned(),
        }
    }

    /// Write a static attribute by name. Recognized attributes reject
    /// values of the wrong type; unrecognized names land in the extra
    /// map untyped.
    pub fn set(&mut self, attr: &str, value: Value) -> Result<(), AttrError> {
        match attr {
            "name" | "fields" | "tabs" => return Err(AttrError::ReadOnly(attr.to_string())),
            "label" => self.label = Some(expect_text(attr, &value)?),
            "label_plural" => self.label_plural = Some(expect_text(attr, &value)?),
            "field_order" => self.field_order = Some(expect_name_list(attr, &value)?),
            "display_field" => self.display_field = Some(expect_text(attr, &value)?),
            "is_singleton" => self.is_singleton = Some(expect_bool(attr, &value)?),
            "has_index" => self.has_index = Some(expect_bool(attr, &value)?),
            "index_field_order" => self.index_field_order = Some(expect_name_list(attr, &value)?),
            "table_link_field" => self.table_link_field = Some(expect_text(attr, &value)?),
            "table_can_sort" => self.table_can_sort = Some(expect_bool(attr, &value)?),
            "table_can_filter" => self.table_can_filter = Some(expect_bool(attr, &value)?),
            "table_can_page" => self.table_can_page = Some(expect_bool(attr, &value)?),
            "has_create" => self.has_create = Some(expect_bool(attr, &value)?),
            "create_field_order" => {
                self.create_field_order = Some(expect_name_list(attr, &value)?);
            }
            "has_delete" => self.has_delete = Some(expect_bool(attr, &value)?),
            "show_in_rel_delete" => self.show_in_rel_delete = Some(expect_bool(attr, &value)?),
            "has_detail" => self.has_detail = Some(expect_bool(attr, &value)?),
            "show_in_search" => self.show_in_search = Some(expect_bool(attr, &value)?),
            "detail_field_order" => {
                self.detail_field_order = Some(expect_name_list(attr, &value)?);
            }
            "tooltip_field_order" => {
                self.tooltip_field_order = Some(expect_name_list(attr, &value)?);
            }
            "query_list" => self.query_list = Some(expect_text(attr, &value)?),
            "query_single" => self.query_single = Some(expect_text(attr, &value)?),
            "query_required_fields" => {
                self.query_required_fields = Some(expect_name_list(attr, &value)?);
            }
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

    /// The value representing one instance of this model: the display
    /// field's `value` attribute resolved against the instance
    /// context. Static descriptors carry no instance data, so the
    /// application attaches a `value` resolver to the display field;
    /// without one the lookup yields nothing.
    pub fn display_value(&self, cx: &dyn Any) -> Result<Option<Value>, ResolveError> {
        match self.field(&self.display_field()) {
            Some(field) => field.effective("value", cx),
            None => Ok(None),
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

impl ValidateNode for Model {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = naming::validate_model_name(&self.name) {
            errs.add(msg);
        }

        // Only author-written references are checked; derived defaults
        // like display_field = "name" may legitimately dangle.
        if let Some(display) = &self.display_field
            && !self.fields.contains(display)
        {
            err!(errs, "display_field '{display}' does not exist");
        }

        if let Some(link) = &self.table_link_field
            && !self.fields.contains(link)
        {
            err!(errs, "table_link_field '{link}' does not exist");
        }

        self.check_order("field_order", self.field_order.as_deref(), &mut errs);
        self.check_order(
            "index_field_order",
            self.index_field_order.as_deref(),
            &mut errs,
        );
        self.check_order(
            "create_field_order",
            self.create_field_order.as_deref(),
            &mut errs,
        );
        self.check_order(
            "detail_field_order",
            self.detail_field_order.as_deref(),
            &mut errs,
        );
        self.check_order(
            "tooltip_field_order",
            self.tooltip_field_order.as_deref(),
            &mut errs,
        );
        self.check_order(
            "query_required_fields",
            self.query_required_fields.as_deref(),
            &mut errs,
        );

        let mut tab_names = BTreeSet::new();

        for tab in &self.tabs {
            let route = format!("tabs.{}", tab.name);

            if let Err(msg) = naming::validate_field_name(&tab.name) {
                errs.add_at(route.clone(), msg);
            }

            if !tab_names.insert(tab.name.clone()) {
                errs.add_at(route.clone(), format!("duplicate tab name '{}'", tab.name));
            }

            for name in tab.flatten_fields() {
                if !self.fields.contains(&name) {
                    errs.add_at(route.clone(), format!("tab field '{name}' does not exist"));
                }
            }
        }

        errs.result()
    }
}

impl Model {
    fn check_order(&self, attr: &str, order: Option<&[String]>, errs: &mut ErrorTree) {
        let Some(order) = order else {
            return;
        };

        for name in order {
            if !self.fields.contains(name) {
                err!(errs, "{attr} entry '{name}' does not exist");
            }
        }
    }
}

impl VisitableNode for Model {
    fn route_key(&self) -> String {
        self.name.clone()
    }

    fn drive<V: Visitor>(&self, v: &mut V) {
        self.fields.accept(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn hidden_everywhere(mut field: Field) -> Field {
        field.show_index = Some(false);
        field.show_create = Some(false);
        field.show_detail = Some(false);
        field
    }

    fn user_model() -> Model {
        Model::new("user")
            .try_with_field(hidden_everywhere(Field::new("id").with_kind(FieldType::Id)))
            .unwrap()
            .try_with_field(Field::new("name"))
            .unwrap()
    }

    #[test]
    fn display_defaults_derive_from_name() {
        let model = user_model();

        assert_eq!(model.label(), "User");
        assert_eq!(model.label_plural(), "Users");
        assert_eq!(model.field_order(), vec!["id", "name"]);
        assert_eq!(model.table_link_field(), "name");
        assert!(model.show_in_search());
        assert_eq!(model.query_list(), "users");
        assert_eq!(model.query_single(), "user");
        assert_eq!(model.query_required_fields(), vec!["id", "name"]);
    }

    #[test]
    fn surface_orders_respect_show_flags() {
        let model = user_model();

        assert_eq!(model.index_fields(), vec!["name"]);
        assert_eq!(model.create_fields(), vec!["name"]);
        assert_eq!(model.detail_fields(), vec!["name"]);
        assert!(model.tooltip_fields().is_empty());
    }

    #[test]
    fn query_orders_lead_with_required_fields() {
        let model = user_model();

        assert_eq!(model.query_list_fields(), vec!["id", "name"]);
        assert_eq!(model.query_single_fields(), vec!["id", "name"]);
    }

    #[test]
    fn virtual_fields_stay_out_of_queries() {
        let mut model = user_model();
        let mut field = Field::new("computed_badge");
        field.virtual_ = Some(true);
        model.insert_field(field).unwrap();

        assert!(model.detail_fields().contains(&"computed_badge".to_string()));
        assert!(!model.query_single_fields().contains(&"computed_badge".to_string()));
    }

    #[test]
    fn detail_tabs_override_detail_order() {
        let mut model = user_model();
        model.tabs = vec![
            DetailTab::new("main").with_fields(["name"]),
            DetailTab::new("ids").with_fields(["id"]),
        ];

        assert_eq!(model.detail_fields(), vec!["name", "id"]);
    }

    #[test]
    fn duplicate_field_registration_fails() {
        let mut model = user_model();

        let err = model.insert_field(Field::new("name")).unwrap_err();
        assert_eq!(
            err,
            NodeError::DuplicateField {
                model: "user".to_string(),
                field: "name".to_string(),
            }
        );
    }

    #[test]
    fn unknown_field_lookup_fails() {
        let model = user_model();

        let err = model.get_field("nope").unwrap_err();
        assert_eq!(
            err,
            NodeError::UnknownField {
                model: "user".to_string(),
                field: "nope".to_string(),
            }
        );
    }

    #[test]
    fn validate_flags_dangling_references() {
        let mut model = user_model();
        model.display_field = Some("missing".to_string());
        model.index_field_order = Some(vec!["name".to_string(), "ghost".to_string()]);

        let err = model.validate().unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("display_field 'missing' does not exist"));
        assert!(rendered.contains("index_field_order entry 'ghost' does not exist"));
    }

    #[test]
    fn explicit_orders_win_over_show_flags() {
        let mut model = user_model();
        model.index_field_order = Some(vec!["id".to_string()]);

        assert_eq!(model.index_fields(), vec!["id"]);
    }
}

//! Resolver and registry behavior across the whole crate surface.

use crate::{
    prelude::*,
    registry::{get_schema, schema_write},
    trace::{ResolveSource, ResolveTraceEvent, ResolveTraceSink},
};
use std::sync::Mutex;

struct RequestCx {
    is_admin: bool,
}

fn require_cx(cx: &dyn std::any::Any) -> Result<&RequestCx, ResolveError> {
    cx.downcast_ref::<RequestCx>()
        .ok_or_else(|| ResolveError::message("resolver expected a RequestCx"))
}

#[test]
fn effective_falls_back_to_static() {
    let field = Field::new("email");

    let value = field.effective("nullable", &()).unwrap();
    assert_eq!(value, Some(Value::Bool(false)));

    // unknown attribute with no resolver resolves to nothing
    let value = field.effective("x_unknown", &()).unwrap();
    assert_eq!(value, None);
}

#[test]
fn resolver_overrides_static_per_context() {
    let mut field = Field::new("salary").with_kind(FieldType::Currency);
    field.can_edit = Some(false);

    field.attach_resolver("can_edit", |cx| {
        Ok(Value::Bool(require_cx(cx)?.is_admin))
    });

    let admin = RequestCx { is_admin: true };
    let viewer = RequestCx { is_admin: false };

    assert_eq!(
        field.effective("can_edit", &admin).unwrap(),
        Some(Value::Bool(true))
    );
    assert_eq!(
        field.effective("can_edit", &viewer).unwrap(),
        Some(Value::Bool(false))
    );

    // the static layer is untouched by resolution
    assert!(!field.can_edit());
}

#[test]
fn resolver_errors_propagate_unchanged() {
    let mut field = Field::new("salary");
    field.attach_resolver("can_edit", |cx| {
        require_cx(cx).map(|cx| Value::Bool(cx.is_admin))
    });

    let err = field.effective("can_edit", &()).unwrap_err();
    assert_eq!(err.to_string(), "resolver expected a RequestCx");
}

#[test]
fn removing_a_resolver_restores_static_behavior() {
    let mut field = Field::new("bio");
    field.attach_resolver("show_detail", |_| Ok(Value::Bool(false)));

    assert_eq!(
        field.effective("show_detail", &()).unwrap(),
        Some(Value::Bool(false))
    );

    assert!(field.remove_resolver("show_detail"));
    assert!(!field.remove_resolver("show_detail"));

    assert_eq!(
        field.effective("show_detail", &()).unwrap(),
        Some(Value::Bool(true))
    );
}

#[test]
fn model_resolvers_use_the_same_lookup_path() {
    let mut model = Model::new("report");
    model.attach_resolver("has_delete", |cx| {
        Ok(Value::Bool(require_cx(cx)?.is_admin))
    });

    let viewer = RequestCx { is_admin: false };
    assert_eq!(
        model.effective("has_delete", &viewer).unwrap(),
        Some(Value::Bool(false))
    );

    // attributes without resolvers still answer statically
    assert_eq!(
        model.effective("label", &viewer).unwrap(),
        Some(Value::Text("Report".to_string()))
    );
}

#[test]
fn display_value_resolves_through_the_display_field() {
    struct Account {
        name: String,
    }

    let mut model = Model::new("account")
        .try_with_field(Field::new("name"))
        .unwrap();

    // nothing attached: no instance data to surface
    let account = Account {
        name: "Ada".to_string(),
    };
    assert_eq!(model.display_value(&account).unwrap(), None);

    model.field_mut("name").unwrap().attach_resolver("value", |cx| {
        let account = cx
            .downcast_ref::<Account>()
            .ok_or_else(|| ResolveError::message("resolver expected an Account"))?;

        Ok(Value::Text(account.name.clone()))
    });

    assert_eq!(
        model.display_value(&account).unwrap(),
        Some(Value::Text("Ada".to_string()))
    );

    // a display field that does not exist yields nothing
    model.display_field = Some("missing".to_string());
    assert_eq!(model.display_value(&account).unwrap(), None);
}

///
/// CaptureSink
///

#[derive(Default)]
struct CaptureSink {
    events: Mutex<Vec<(String, String, ResolveSource, bool)>>,
}

impl ResolveTraceSink for CaptureSink {
    fn on_event(&self, event: ResolveTraceEvent<'_>) {
        self.events.lock().unwrap().push((
            event.scope.to_string(),
            event.attr.to_string(),
            event.source,
            event.ok,
        ));
    }
}

#[test]
fn trace_sink_sees_source_and_outcome() {
    let mut field = Field::new("email");
    field.attach_resolver("can_edit", |_| Err(ResolveError::message("nope")));

    let sink = CaptureSink::default();

    field.effective_traced("label", &(), &sink).unwrap();
    field.effective_traced("x_unknown", &(), &sink).unwrap();
    field.effective_traced("can_edit", &(), &sink).unwrap_err();

    let events = sink.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            ("email".to_string(), "label".to_string(), ResolveSource::Static, true),
            ("email".to_string(), "x_unknown".to_string(), ResolveSource::Missing, true),
            ("email".to_string(), "can_edit".to_string(), ResolveSource::Resolver, false),
        ]
    );
}

#[test]
fn registry_serves_a_validated_schema() {
    {
        let mut schema = schema_write();
        schema
            .insert_model(
                Model::new("account")
                    .try_with_field(Field::new("id").with_kind(FieldType::Id))
                    .unwrap()
                    .try_with_field(Field::new("name"))
                    .unwrap(),
            )
            .unwrap();
    }

    let schema = get_schema().expect("registered schema should validate");
    assert!(schema.contains("account"));

    // second read reuses the recorded verdict
    let again = get_schema().expect("validation verdict is cached");
    assert_eq!(again.len(), schema.len());
}

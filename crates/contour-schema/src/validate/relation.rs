use crate::prelude::*;

///
/// RelationEdge
/// Relation occurrence captured while walking model fields.
///

struct RelationEdge<'a> {
    model: &'a Model,
    field: &'a Field,
    relation: &'a Relation,
}

// Validate that every relation points at a model and backref that exist,
// and that explicit table orders reference real target fields.
pub(crate) fn validate_relation_targets(schema: &Schema, errs: &mut ErrorTree) {
    for edge in collect_edges(schema) {
        let route = format!("{}.fields.{}", edge.model.name, edge.field.name);

        let Some(target) = schema.get(&edge.relation.target) else {
            errs.add_at(
                route,
                format!("relation target '{}' does not exist", edge.relation.target),
            );
            continue;
        };

        if let Some(backref) = &edge.relation.backref {
            match target.field(backref) {
                None => {
                    errs.add_at(
                        route.clone(),
                        format!(
                            "backref '{backref}' does not exist on target '{}'",
                            target.name
                        ),
                    );
                }
                Some(back_field) => {
                    validate_backref(&route, edge.model, target, back_field, errs);
                }
            }
        }

        if let Some(order) = &edge.relation.table_field_order {
            for name in order {
                if !target.fields.contains(name) {
                    errs.add_at(
                        route.clone(),
                        format!(
                            "table_field_order entry '{name}' does not exist on target '{}'",
                            target.name
                        ),
                    );
                }
            }
        }
    }
}

// A backref must itself be a relation pointing back at the source model.
fn validate_backref(
    route: &str,
    source: &Model,
    target: &Model,
    back_field: &Field,
    errs: &mut ErrorTree,
) {
    match back_field.kind() {
        FieldKind::Relation(back_rel) if back_rel.target == source.name => {}
        FieldKind::Relation(back_rel) => {
            errs.add_at(
                route.to_string(),
                format!(
                    "backref '{}.{}' points at '{}', not back at '{}'",
                    target.name, back_field.name, back_rel.target, source.name
                ),
            );
        }
        FieldKind::Name(_) => {
            errs.add_at(
                route.to_string(),
                format!(
                    "backref '{}.{}' is not a relation field",
                    target.name, back_field.name
                ),
            );
        }
    }
}

fn collect_edges(schema: &Schema) -> Vec<RelationEdge<'_>> {
    let mut edges = Vec::new();

    for model in schema.models() {
        for field in model.fields.iter() {
            if let Some(FieldKind::Relation(relation)) = &field.kind {
                edges.push(RelationEdge {
                    model,
                    field,
                    relation,
                });
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationKind;

    fn schema_with_posts() -> Schema {
        let author_rel = Relation::new(RelationKind::ManyToOne, "user").with_backref("posts");
        let posts_rel = Relation::new(RelationKind::OneToMany, "post").with_backref("author");

        Schema::new()
            .try_with_model(
                Model::new("user")
                    .try_with_field(Field::new("name"))
                    .unwrap()
                    .try_with_field(Field::new("posts").with_kind(posts_rel))
                    .unwrap(),
            )
            .unwrap()
            .try_with_model(
                Model::new("post")
                    .try_with_field(Field::new("name"))
                    .unwrap()
                    .try_with_field(Field::new("author").with_kind(author_rel))
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn well_formed_relations_pass() {
        schema_with_posts().validate().expect("schema should pass");
    }

    #[test]
    fn missing_target_is_reported() {
        let rel = Relation::new(RelationKind::ManyToOne, "ghost");
        let schema = Schema::new()
            .try_with_model(
                Model::new("user")
                    .try_with_field(Field::new("employer").with_kind(rel))
                    .unwrap(),
            )
            .unwrap();

        let err = schema.validate().unwrap_err();
        let rendered = err.to_string();
        assert!(
            rendered.contains("user.fields.employer: relation target 'ghost' does not exist"),
            "got: {rendered}"
        );
    }

    #[test]
    fn backref_must_point_back() {
        let mut schema = schema_with_posts();

        // repoint the post.author backref victim: make user.posts target "post"
        // but post.author point at a third model
        let third_rel = Relation::new(RelationKind::ManyToOne, "org");
        let field = schema
            .get_mut("post")
            .unwrap()
            .field_mut("author")
            .unwrap();
        field.kind = Some(third_rel.into());

        schema
            .insert_model(
                Model::new("org")
                    .try_with_field(Field::new("name"))
                    .unwrap(),
            )
            .unwrap();

        let err = schema.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("backref 'post.author' points at 'org', not back at 'user'"),
            "got: {err}"
        );
    }

    #[test]
    fn table_order_checked_against_target() {
        let mut rel = Relation::new(RelationKind::OneToMany, "post");
        rel.table_field_order = Some(vec!["name".to_string(), "ghost".to_string()]);

        let schema = Schema::new()
            .try_with_model(
                Model::new("user")
                    .try_with_field(Field::new("posts").with_kind(rel))
                    .unwrap(),
            )
            .unwrap()
            .try_with_model(
                Model::new("post")
                    .try_with_field(Field::new("name"))
                    .unwrap(),
            )
            .unwrap();

        let err = schema.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("table_field_order entry 'ghost' does not exist on target 'post'"),
            "got: {err}"
        );
    }
}

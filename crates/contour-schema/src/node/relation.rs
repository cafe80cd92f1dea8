use crate::{prelude::*, types::RelationKind};

///
/// Relation
///
/// Extra information about a field whose type points at another
/// model. Target resolution is validated in a global pass since it
/// needs the whole schema.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Relation {
    pub kind: RelationKind,

    /// Name of the model this relation points to.
    pub target: String,

    /// Field on the target model pointing back at this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backref: Option<String>,

    /// Columns of the target model shown in the source model's table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_field_order: Option<Vec<String>>,
}

impl Relation {
    #[must_use]
    pub fn new(kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            backref: None,
            table_field_order: None,
        }
    }

    #[must_use]
    pub fn with_backref(mut self, backref: impl Into<String>) -> Self {
        self.backref = Some(backref.into());
        self
    }

    /// Columns to show for the target model, in order. Falls back to
    /// the target's own index order when no explicit order is set.
    #[must_use]
    pub fn table_fields(&self, schema: &Schema) -> Vec<String> {
        if let Some(order) = &self.table_field_order {
            return order.clone();
        }

        schema
            .get(&self.target)
            .map(Model::index_fields)
            .unwrap_or_default()
    }
}

impl ValidateNode for Relation {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if self.target.is_empty() {
            err!(errs, "relation target is empty");
        }

        if let Some(backref) = &self.backref
            && backref.is_empty()
        {
            err!(errs, "relation backref is empty");
        }

        errs.result()
    }
}

impl VisitableNode for Relation {}

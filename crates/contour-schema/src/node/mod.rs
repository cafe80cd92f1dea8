mod attr;
mod field;
mod model;
mod relation;
mod schema;
mod tab;

pub use attr::{AttrError, AttrMap};
pub use field::{Field, FieldList};
pub use model::Model;
pub use relation::Relation;
pub use schema::{Schema, SerializeError};
pub use tab::DetailTab;

use crate::{error::ErrorTree, visit::Visitor};
use thiserror::Error as ThisError;

///
/// NodeError
///
/// Registration and lookup failures on the schema container.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum NodeError {
    #[error("duplicate field name '{field}' on model '{model}'")]
    DuplicateField { model: String, field: String },

    #[error("duplicate model name '{0}'")]
    DuplicateModel(String),

    #[error("unknown field '{field}' on model '{model}'")]
    UnknownField { model: String, field: String },

    #[error("unknown model '{0}'")]
    UnknownModel(String),
}

///
/// ValidateNode
///
/// Local structural invariants for a single node. Cross-node
/// invariants live in `validate::` global passes.
///

pub trait ValidateNode {
    fn validate(&self) -> Result<(), ErrorTree> {
        Ok(())
    }
}

///
/// VisitableNode
///

pub trait VisitableNode: ValidateNode {
    /// Route segment this node contributes to error paths.
    fn route_key(&self) -> String {
        String::new()
    }

    /// Drive the visitor through child nodes.
    fn drive<V: Visitor>(&self, _v: &mut V) {}

    fn accept<V: Visitor>(&self, v: &mut V)
    where
        Self: Sized,
    {
        let key = self.route_key();

        if !key.is_empty() {
            v.push(&key);
        }

        v.enter(self);
        self.drive(v);

        if !key.is_empty() {
            v.pop();
        }
    }
}

pub mod casing;
pub mod error;
pub mod node;
pub mod registry;
pub mod resolve;
pub mod trace;
pub mod types;
pub mod validate;
pub mod visit;

#[cfg(test)]
mod tests;

/// Maximum length for model schema identifiers.
pub const MAX_MODEL_NAME_LEN: usize = 64;

/// Maximum length for field schema identifiers.
pub const MAX_FIELD_NAME_LEN: usize = 64;

use crate::{
    error::ErrorTree,
    node::{AttrError, NodeError, SerializeError},
    resolve::ResolveError,
};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::ErrorTree,
        node::*,
        resolve::{ResolveError, Resolver, ResolverMap},
        types::{Choice, FieldKind, FieldType, RelationKind, Value},
        visit::Visitor,
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    AttrError(#[from] AttrError),

    #[error(transparent)]
    NodeError(#[from] NodeError),

    #[error(transparent)]
    ResolveError(#[from] ResolveError),

    #[error(transparent)]
    SerializeError(#[from] SerializeError),

    #[error("validation failed: {0}")]
    Validation(ErrorTree),
}

//! Process-wide schema registry.
//!
//! Generators register their models at startup through [`schema_write`]
//! and every consumer reads the same validated schema back through
//! [`get_schema`]. Validation runs once per process; later reads reuse
//! the verdict.

use crate::{Error, error::ErrorTree, node::Schema, validate::validate_schema};
use std::sync::{LazyLock, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

///
/// SCHEMA
/// the static data structure
///

static SCHEMA: LazyLock<RwLock<Schema>> = LazyLock::new(|| RwLock::new(Schema::new()));

static SCHEMA_VALIDATED: OnceLock<()> = OnceLock::new();

/// Acquire a write guard to the global schema during registration.
pub fn schema_write() -> RwLockWriteGuard<'static, Schema> {
    SCHEMA
        .write()
        .expect("schema RwLock poisoned while acquiring write lock")
}

// schema_read
// just reads the schema directly without validation
pub(crate) fn schema_read() -> RwLockReadGuard<'static, Schema> {
    SCHEMA
        .read()
        .expect("schema RwLock poisoned while acquiring read lock")
}

/// Read the global schema, validating it exactly once per process.
pub fn get_schema() -> Result<RwLockReadGuard<'static, Schema>, Error> {
    let schema = schema_read();
    validate(&schema).map_err(Error::Validation)?;

    Ok(schema)
}

// validate
fn validate(schema: &Schema) -> Result<(), ErrorTree> {
    if SCHEMA_VALIDATED.get().is_some() {
        return Ok(());
    }

    validate_schema(schema)?;
    SCHEMA_VALIDATED.set(()).ok();

    Ok(())
}

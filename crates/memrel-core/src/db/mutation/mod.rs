//! Write path: constrained insert, update, delete and truncate.
//!
//! Every call validates before it writes: a rejected mutation leaves the
//! target table exactly as it was.

mod delete;
mod insert;
mod unique;
mod update;


use crate::{
    config::DbConfig,
    db::{query::predicate, store::Data},
    error::{Error, ErrorDetail, ErrorOrigin},
    obs::sink::{self, MetricsEvent},
    schema::{Schema, TableSchema},
};

// re-exports
pub use update::{ExplicitUpdate, ImplicitUpdate, Update};

///
/// MutationExecutor
///
/// Applies one mutation to a data store (the live store or a transaction
/// snapshot) under a schema.
///

pub(crate) struct MutationExecutor<'a> {
    schema: &'a Schema,
    data: &'a mut Data,
    config: DbConfig,
}

impl<'a> MutationExecutor<'a> {
    pub(crate) const fn new(schema: &'a Schema, data: &'a mut Data, config: DbConfig) -> Self {
        Self {
            schema,
            data,
            config,
        }
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.config.debug {
            tracing::info!("[debug] {}", s.into());
        }
    }

    fn table(&self, name: &str) -> Result<&'a TableSchema, Error> {
        self.schema.require_table(name, ErrorOrigin::Mutation)
    }

    fn validate_predicate(&self, predicate: &predicate::Predicate) -> Result<(), Error> {
        if self.config.strict_predicates {
            predicate::validate(predicate.nodes())?;
        }

        Ok(())
    }
}

/// Record a constraint rejection and hand the error back.
fn reject(table: &str, err: Error) -> Error {
    match err.detail {
        ErrorDetail::UniqueConstraintViolation { .. } => {
            sink::record(MetricsEvent::UniqueViolation { table });
        }
        ErrorDetail::NotNullViolation { .. } => {
            sink::record(MetricsEvent::NotNullViolation { table });
        }
        _ => {}
    }
    tracing::warn!(table, error = %err, "mutation rejected");

    err
}

use crate::{
    db::{
        mutation::{MutationExecutor, reject, unique::check_unique},
        query::predicate::{Predicate, evaluate},
        store::Record,
    },
    error::{Error, ErrorOrigin},
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    schema::TableSchema,
    value::{Value, strict_eq},
};

///
/// Update
///
/// Predicate-filtered update request.
///
/// Implicit mode runs first: each matching row whose primary key equals a
/// candidate record is replaced by that record. Explicit mode then writes
/// `values` into `columns` on every row that still matches. The affected
/// count is the sum across both modes.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    pub predicate: Predicate,
    pub columns: Vec<String>,
    pub explicit: Option<ExplicitUpdate>,
    pub implicit: Option<ImplicitUpdate>,
}

impl Update {
    #[must_use]
    pub fn filter(predicate: Predicate) -> Self {
        Self {
            predicate,
            ..Self::default()
        }
    }

    /// Overwrite `columns` with `values` on every matching row.
    #[must_use]
    pub fn explicit<I, S>(mut self, columns: I, values: Vec<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self.explicit = Some(ExplicitUpdate { values });
        self
    }

    /// Substitute matching rows with same-key records from `records`.
    ///
    /// An empty `primary_keys` list falls back to the table's primary key.
    #[must_use]
    pub fn implicit<I, S>(mut self, primary_keys: I, records: Vec<Record>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implicit = Some(ImplicitUpdate {
            primary_keys: primary_keys.into_iter().map(Into::into).collect(),
            records,
        });
        self
    }
}

///
/// ExplicitUpdate
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExplicitUpdate {
    pub values: Vec<Value>,
}

///
/// ImplicitUpdate
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImplicitUpdate {
    pub primary_keys: Vec<String>,
    pub records: Vec<Record>,
}

impl MutationExecutor<'_> {
    /// Apply `update` to `table`; returns the affected count across both modes.
    ///
    /// The table is rewritten from a working copy only when the whole call
    /// succeeds and at least one row was affected.
    pub(crate) fn update(&mut self, table: &str, update: &Update) -> Result<usize, Error> {
        let mut span = Span::new(ExecKind::Update, table);
        let schema = self.table(table)?;
        self.validate_predicate(&update.predicate)?;

        let assignments = update
            .explicit
            .as_ref()
            .map(|explicit| resolve_assignments(schema, &update.columns, explicit))
            .transpose()
            .map_err(|err| reject(table, err))?;

        let current = self.data.table(table).unwrap_or_default();
        sink::record(MetricsEvent::RowsScanned {
            table,
            rows_scanned: sink::rows(current.len()),
        });

        let nodes = update.predicate.nodes();
        let mut working = current.to_vec();
        let mut affected = 0;

        // Phase 1: implicit substitution
        if let Some(implicit) = &update.implicit {
            let keys: Vec<&str> = if implicit.primary_keys.is_empty() {
                schema.primary_columns().map(|c| c.field.as_str()).collect()
            } else {
                implicit.primary_keys.iter().map(String::as_str).collect()
            };

            if !keys.is_empty() {
                for row in &mut working {
                    if !evaluate(row, nodes) {
                        continue;
                    }
                    if let Some(candidate) = implicit
                        .records
                        .iter()
                        .find(|candidate| same_key(candidate, row, &keys))
                    {
                        row.clone_from(candidate);
                        affected += 1;
                    }
                }
            }
        }

        // Phase 2: explicit assignment
        if let Some(assignments) = &assignments {
            for row in &mut working {
                if !evaluate(row, nodes) {
                    continue;
                }
                for (column, value) in assignments {
                    row.set(*column, (*value).clone());
                }
                affected += 1;
            }
        }

        if affected > 0 {
            check_unique(schema, &working).map_err(|err| reject(table, err))?;
            self.data.insert_table(table, working);
        }

        self.debug_log(format!("Updated {affected} rows in {table}"));
        span.set_rows(sink::rows(affected));
        tracing::debug!(table, rows = affected, "update finished");

        Ok(affected)
    }
}

// Validate explicit columns against the schema before any row is touched.
fn resolve_assignments<'u>(
    schema: &TableSchema,
    columns: &'u [String],
    explicit: &'u ExplicitUpdate,
) -> Result<Vec<(&'u str, &'u Value)>, Error> {
    if columns.len() != explicit.values.len() {
        return Err(Error::arity_mismatch(
            schema.name(),
            columns.len(),
            explicit.values.len(),
        ));
    }

    columns
        .iter()
        .zip(&explicit.values)
        .map(|(column, value)| {
            let definition = schema.require_column(column, ErrorOrigin::Mutation)?;
            if value.is_null() && !definition.is_nullable {
                return Err(Error::not_null_violation(schema.name(), column));
            }

            Ok((column.as_str(), value))
        })
        .collect()
}

// Every key column present on both sides and strictly equal.
fn same_key(candidate: &Record, row: &Record, keys: &[&str]) -> bool {
    keys.iter().all(|key| match (candidate.get(key), row.get(key)) {
        (Some(a), Some(b)) => strict_eq(a, b),
        _ => false,
    })
}

use crate::{
    db::{key::CompositeKey, store::Record},
    error::Error,
    schema::TableSchema,
    value::Value,
};
use std::collections::HashSet;

/// Enforce the composite unique key (primary ∪ unique columns) across `rows`.
///
/// Invariants enforced here:
/// - no two rows share the full key tuple; nulls compare equal
/// - a table with no key columns is never checked
pub(crate) fn check_unique<'r>(
    table: &TableSchema,
    rows: impl IntoIterator<Item = &'r Record>,
) -> Result<(), Error> {
    let columns: Vec<&str> = table.key_columns().map(|c| c.field.as_str()).collect();
    if columns.is_empty() {
        return Ok(());
    }

    let mut seen = HashSet::new();
    for row in rows {
        let key = CompositeKey::from_record(row, columns.iter().copied());
        if !seen.insert(key) {
            let values = columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                .collect();

            return Err(Error::unique_violation(
                table.name(),
                columns.iter().map(ToString::to_string).collect(),
                values,
            ));
        }
    }

    Ok(())
}

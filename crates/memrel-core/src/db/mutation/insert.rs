use crate::{
    db::{
        mutation::{MutationExecutor, reject, unique::check_unique},
        store::Record,
    },
    error::{Error, ErrorOrigin},
    obs::sink::{self, ExecKind, Span},
    schema::TableSchema,
    value::Value,
};

impl MutationExecutor<'_> {
    ///
    /// Insert value tuples into `table`.
    ///
    /// Identity columns receive `startId + n` with `startId = rowCount + 1`,
    /// whether or not the caller supplied them. Unsupplied columns take the
    /// column default, else null. Returns the assigned identities in order.
    ///
    pub(crate) fn insert(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<Vec<i64>, Error> {
        let mut span = Span::new(ExecKind::Insert, table);
        let schema = self.table(table)?;

        let existing = self.data.table(table).unwrap_or_default();
        let (records, ids) =
            materialize(schema, existing.len(), columns, rows).map_err(|err| reject(table, err))?;
        check_unique(schema, existing.iter().chain(&records)).map_err(|err| reject(table, err))?;

        self.debug_log(format!(
            "Inserting {} rows into {table} (ids {:?})",
            records.len(),
            ids.first().zip(ids.last())
        ));

        let inserted = records.len();
        self.data.rows_mut(table).extend(records);

        span.set_rows(sink::rows(inserted));
        tracing::debug!(table, rows = inserted, "insert finished");

        Ok(ids)
    }
}

// Build full records in schema column order.
fn materialize(
    schema: &TableSchema,
    existing: usize,
    columns: &[&str],
    rows: Vec<Vec<Value>>,
) -> Result<(Vec<Record>, Vec<i64>), Error> {
    for column in columns {
        schema.require_column(column, ErrorOrigin::Mutation)?;
    }

    let start_id = i64::try_from(existing)
        .unwrap_or(i64::MAX)
        .saturating_add(1);
    let mut records = Vec::with_capacity(rows.len());
    let mut ids = Vec::with_capacity(rows.len());

    for (n, values) in rows.into_iter().enumerate() {
        if values.len() != columns.len() {
            return Err(Error::arity_mismatch(
                schema.name(),
                columns.len(),
                values.len(),
            ));
        }

        let id = start_id.saturating_add(i64::try_from(n).unwrap_or(i64::MAX));
        let supplied: Record = columns.iter().copied().zip(values).collect();
        let mut record = Record::with_capacity(schema.columns().len());

        for column in schema.columns() {
            let value = if column.is_identity {
                Value::Int(id)
            } else if let Some(value) = supplied.get(&column.field) {
                if value.is_null() && !column.is_nullable {
                    return Err(Error::not_null_violation(schema.name(), &column.field));
                }
                value.clone()
            } else {
                column.default_value()
            };

            record.set(column.field.as_str(), value);
        }

        records.push(record);
        ids.push(id);
    }

    Ok((records, ids))
}

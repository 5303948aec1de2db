use crate::{
    db::{
        mutation::MutationExecutor,
        query::predicate::{Predicate, evaluate},
    },
    error::Error,
    obs::sink::{self, ExecKind, MetricsEvent, Span},
};

impl MutationExecutor<'_> {
    /// Remove every row matching `predicate`; returns the removed count.
    pub(crate) fn delete(&mut self, table: &str, predicate: &Predicate) -> Result<usize, Error> {
        let mut span = Span::new(ExecKind::Delete, table);
        self.table(table)?;
        self.validate_predicate(predicate)?;

        let nodes = predicate.nodes();
        let current = self.data.table(table).unwrap_or_default();
        sink::record(MetricsEvent::RowsScanned {
            table,
            rows_scanned: sink::rows(current.len()),
        });

        // Leave shared snapshot tables untouched when nothing matches.
        let matched = current.iter().filter(|row| evaluate(row, nodes)).count();
        if matched > 0 {
            self.data.rows_mut(table).retain(|row| !evaluate(row, nodes));
        }

        self.debug_log(format!("Deleted {matched} rows from {table}"));
        span.set_rows(sink::rows(matched));
        tracing::debug!(table, rows = matched, "delete finished");

        Ok(matched)
    }

    /// Clear `table`; returns the prior row count.
    pub(crate) fn truncate(&mut self, table: &str) -> Result<usize, Error> {
        let mut span = Span::new(ExecKind::Truncate, table);
        self.table(table)?;

        let previous = self.data.row_count(table).unwrap_or_default();
        self.data.insert_table(table, Vec::new());

        self.debug_log(format!("Truncated {table} ({previous} rows)"));
        span.set_rows(sink::rows(previous));
        tracing::debug!(table, rows = previous, "truncate finished");

        Ok(previous)
    }
}

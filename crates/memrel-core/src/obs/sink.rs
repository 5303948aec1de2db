//! Metrics sink boundary.
//!
//! Executors MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics::{self, EventReport, EventState, TableCounters};
use std::{cell::RefCell, time::Instant};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Query,
    Insert,
    Update,
    Delete,
    Truncate,
}

impl ExecKind {
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Query)
    }
}

///
/// TransactionPhase
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionPhase {
    Begin,
    Commit,
    Rollback,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        table: &'a str,
    },
    ExecFinish {
        kind: ExecKind,
        table: &'a str,
        rows_touched: u64,
        elapsed_micros: u64,
    },
    RowsScanned {
        table: &'a str,
        rows_scanned: u64,
    },
    UniqueViolation {
        table: &'a str,
    },
    NotNullViolation {
        table: &'a str,
    },
    Transaction {
        phase: TransactionPhase,
        id: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink that writes into thread-local metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

fn table_entry<'s>(state: &'s mut EventState, table: &str) -> &'s mut TableCounters {
    state.tables.entry(table.to_string()).or_default()
}

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { kind, table } => metrics::with_state_mut(|m| {
                let global = match kind {
                    ExecKind::Query => &mut m.ops.query_calls,
                    ExecKind::Insert => &mut m.ops.insert_calls,
                    ExecKind::Update => &mut m.ops.update_calls,
                    ExecKind::Delete => &mut m.ops.delete_calls,
                    ExecKind::Truncate => &mut m.ops.truncate_calls,
                };
                *global = global.saturating_add(1);

                let entry = table_entry(m, table);
                let local = match kind {
                    ExecKind::Query => &mut entry.query_calls,
                    ExecKind::Insert => &mut entry.insert_calls,
                    ExecKind::Update => &mut entry.update_calls,
                    ExecKind::Delete => &mut entry.delete_calls,
                    ExecKind::Truncate => &mut entry.truncate_calls,
                };
                *local = local.saturating_add(1);
            }),

            MetricsEvent::ExecFinish {
                kind,
                table,
                rows_touched,
                elapsed_micros,
            } => metrics::with_state_mut(|m| {
                if kind.is_mutation() {
                    metrics::add_micros(
                        &mut m.perf.mutation_micros_total,
                        &mut m.perf.mutation_micros_max,
                        elapsed_micros,
                    );
                } else {
                    metrics::add_micros(
                        &mut m.perf.query_micros_total,
                        &mut m.perf.query_micros_max,
                        elapsed_micros,
                    );
                }

                match kind {
                    ExecKind::Query => {
                        m.ops.rows_returned = m.ops.rows_returned.saturating_add(rows_touched);
                        let entry = table_entry(m, table);
                        entry.rows_returned = entry.rows_returned.saturating_add(rows_touched);
                    }
                    ExecKind::Insert => {
                        m.ops.rows_inserted = m.ops.rows_inserted.saturating_add(rows_touched);
                        let entry = table_entry(m, table);
                        entry.rows_inserted = entry.rows_inserted.saturating_add(rows_touched);
                    }
                    ExecKind::Update => {
                        m.ops.rows_updated = m.ops.rows_updated.saturating_add(rows_touched);
                        let entry = table_entry(m, table);
                        entry.rows_updated = entry.rows_updated.saturating_add(rows_touched);
                    }
                    ExecKind::Delete | ExecKind::Truncate => {
                        m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows_touched);
                        let entry = table_entry(m, table);
                        entry.rows_deleted = entry.rows_deleted.saturating_add(rows_touched);
                    }
                }
            }),

            MetricsEvent::RowsScanned {
                table,
                rows_scanned,
            } => metrics::with_state_mut(|m| {
                m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                let entry = table_entry(m, table);
                entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
            }),

            MetricsEvent::UniqueViolation { table } => metrics::with_state_mut(|m| {
                m.ops.unique_violations = m.ops.unique_violations.saturating_add(1);
                let entry = table_entry(m, table);
                entry.unique_violations = entry.unique_violations.saturating_add(1);
            }),

            MetricsEvent::NotNullViolation { table } => metrics::with_state_mut(|m| {
                m.ops.not_null_violations = m.ops.not_null_violations.saturating_add(1);
                let entry = table_entry(m, table);
                entry.not_null_violations = entry.not_null_violations.saturating_add(1);
            }),

            MetricsEvent::Transaction { phase, .. } => metrics::with_state_mut(|m| {
                let slot = match phase {
                    TransactionPhase::Begin => &mut m.ops.transactions_begun,
                    TransactionPhase::Commit => &mut m.ops.transactions_committed,
                    TransactionPhase::Rollback => &mut m.ops.transactions_rolled_back,
                };
                *slot = slot.saturating_add(1);
            }),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`.
        // - `with_metrics_sink` restores the previous pointer on every exit,
        //   including unwind via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        // - Only a shared reference is materialized, matching the original borrow.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start (`EventState::window_start_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state (counters + perf).
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override for this thread.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope, and `Guard`
    //   restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    // - The lifetime is erased to a raw pointer but only shared access is exposed.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

///
/// Span
/// RAII guard that emits start/finish metrics events for one executor call.
/// Finish accounting happens even on early return or unwind.
///

pub(crate) struct Span {
    kind: ExecKind,
    table: String,
    started: Instant,
    rows: u64,
}

impl Span {
    /// Start a metrics span for a specific table and executor kind.
    #[must_use]
    pub(crate) fn new(kind: ExecKind, table: &str) -> Self {
        record(MetricsEvent::ExecStart { kind, table });

        Self {
            kind,
            table: table.to_string(),
            started: Instant::now(),
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        let elapsed_micros = u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            table: &self.table,
            rows_touched: self.rows,
            elapsed_micros,
        });
    }
}

/// Saturating `usize` → `u64` for row counters.
pub(crate) fn rows(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::RefCell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    // Tables seen through `RowsScanned`.
    #[derive(Default)]
    struct ScanLog(RefCell<Vec<String>>);

    impl MetricsSink for ScanLog {
        fn record(&self, event: MetricsEvent<'_>) {
            if let MetricsEvent::RowsScanned { table, .. } = event {
                self.0.borrow_mut().push(table.to_string());
            }
        }
    }

    #[derive(Default)]
    struct TableLog(RefCell<Vec<String>>);

    impl MetricsSink for TableLog {
        fn record(&self, event: MetricsEvent<'_>) {
            if let MetricsEvent::ExecFinish { table, rows_touched, .. } = event {
                self.0.borrow_mut().push(format!("{table}:{rows_touched}"));
            }
        }
    }

    fn scan(table: &str) {
        record(MetricsEvent::RowsScanned {
            table,
            rows_scanned: 1,
        });
    }

    fn clear_override() {
        SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = None);
    }

    #[test]
    fn nested_overrides_route_to_innermost_sink() {
        clear_override();
        let outer = ScanLog::default();
        let inner = ScanLog::default();

        scan("Ignored");
        with_metrics_sink(&outer, || {
            scan("Car");
            with_metrics_sink(&inner, || scan("Album"));
            scan("Track");
        });

        assert_eq!(*outer.0.borrow(), ["Car", "Track"]);
        assert_eq!(*inner.0.borrow(), ["Album"]);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn override_is_cleared_after_panic() {
        clear_override();
        let log = ScanLog::default();

        let result = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(&log, || {
                scan("Car");
                panic!("query aborted");
            });
        }));

        assert!(result.is_err());
        assert_eq!(*log.0.borrow(), ["Car"]);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn span_emits_finish_on_drop() {
        let log = TableLog::default();

        with_metrics_sink(&log, || {
            let mut span = Span::new(ExecKind::Delete, "Car");
            span.set_rows(3);
        });

        assert_eq!(*log.0.borrow(), ["Car:3"]);
    }

    #[test]
    fn global_sink_accumulates_per_table() {
        metrics_reset_all();

        {
            let mut span = Span::new(ExecKind::Query, "Car");
            span.set_rows(4);
        }
        record(MetricsEvent::RowsScanned {
            table: "Car",
            rows_scanned: 15,
        });
        record(MetricsEvent::UniqueViolation { table: "Car" });
        record(MetricsEvent::Transaction {
            phase: TransactionPhase::Commit,
            id: 1,
        });

        let counters = metrics_report(None)
            .counters
            .expect("report should include counters without window filter");
        assert_eq!(counters.ops.query_calls, 1);
        assert_eq!(counters.ops.rows_returned, 4);
        assert_eq!(counters.ops.transactions_committed, 1);

        let car = counters.tables.get("Car").expect("Car counters");
        assert_eq!(car.query_calls, 1);
        assert_eq!(car.rows_scanned, 15);
        assert_eq!(car.unique_violations, 1);
    }

    #[test]
    fn report_for_future_window_is_empty() {
        metrics_reset_all();
        let window_start = metrics::with_state(|m| m.window_start_ms);
        scan("Car");

        let report = metrics_report(Some(window_start.saturating_add(1)));
        assert!(report.counters.is_none());
        assert!(report.table_counters.is_empty());
    }
}

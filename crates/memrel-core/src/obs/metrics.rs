use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters and simple timing totals for executor calls.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub tables: BTreeMap<String, TableCounters>,
    pub window_start_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            perf: EventPerf::default(),
            tables: BTreeMap::new(),
            window_start_ms: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Executor entrypoints
    pub query_calls: u64,
    pub insert_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,
    pub truncate_calls: u64,

    // Rows touched
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,

    // Constraint rejections
    pub unique_violations: u64,
    pub not_null_violations: u64,

    // Transactions
    pub transactions_begun: u64,
    pub transactions_committed: u64,
    pub transactions_rolled_back: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableCounters {
    pub query_calls: u64,
    pub insert_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,
    pub truncate_calls: u64,
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub unique_violations: u64,
    pub not_null_violations: u64,
}

///
/// EventPerf
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    // Wall-clock totals per executor family, in microseconds
    pub query_micros_total: u128,
    pub mutation_micros_total: u128,

    // Maximum observed deltas
    pub query_micros_max: u64,
    pub mutation_micros_max: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and timing totals, and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate a timing delta and track a max.
pub(crate) fn add_micros(total: &mut u128, max: &mut u64, delta: u64) {
    *total = total.saturating_add(u128::from(delta));
    if delta > *max {
        *max = delta;
    }
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `window_start_ms`.
    pub counters: Option<EventState>,
    /// Per-table counters and averages.
    pub table_counters: Vec<TableSummary>,
}

///
/// TableSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub query_calls: u64,
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub avg_rows_per_query: f64,
    pub avg_rows_scanned_per_query: f64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub unique_violations: u64,
    pub not_null_violations: u64,
}

#[allow(clippy::cast_precision_loss)]
fn per_call(total: u64, calls: u64) -> f64 {
    if calls > 0 {
        total as f64 / calls as f64
    } else {
        0.0
    }
}

/// Build a report, or an empty one when the requested window start is
/// after the current window began.
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|requested| requested > snap.window_start_ms) {
        return EventReport::default();
    }

    let mut table_counters: Vec<TableSummary> = snap
        .tables
        .iter()
        .map(|(table, c)| TableSummary {
            table: table.clone(),
            query_calls: c.query_calls,
            rows_returned: c.rows_returned,
            rows_scanned: c.rows_scanned,
            avg_rows_per_query: per_call(c.rows_returned, c.query_calls),
            avg_rows_scanned_per_query: per_call(c.rows_scanned, c.query_calls),
            rows_inserted: c.rows_inserted,
            rows_updated: c.rows_updated,
            rows_deleted: c.rows_deleted,
            unique_violations: c.unique_violations,
            not_null_violations: c.not_null_violations,
        })
        .collect();

    // Order by avg rows per query desc, then rows returned desc, then name asc.
    table_counters.sort_by(|a, b| {
        b.avg_rows_per_query
            .partial_cmp(&a.avg_rows_per_query)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.rows_returned.cmp(&a.rows_returned))
            .then_with(|| a.table.cmp(&b.table))
    });

    EventReport {
        counters: Some(snap),
        table_counters,
    }
}

///
/// TESTS
///

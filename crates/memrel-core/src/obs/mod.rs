//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Executors never touch `obs::metrics` directly; they emit `MetricsEvent`s
//! through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventPerf, EventReport, EventState, TableCounters, TableSummary};
pub use sink::{
    ExecKind, MetricsEvent, MetricsSink, TransactionPhase, metrics_report, metrics_reset_all,
    with_metrics_sink,
};

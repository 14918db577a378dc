//! Prometheus metrics for p2px.
//!
//! # Panics
//!
//! Metric registration panics on duplicate metric names. This can only
//! happen during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_gauge,
    CounterVec, Encoder, HistogramVec, IntCounter, IntGauge, TextEncoder,
};

/// Trades created.
/// Labels: symbol, side
pub static TRADES_CREATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_trades_created_total",
        "Total trades created",
        &["symbol", "side"]
    )
    .unwrap()
});

/// Admission rejections by error code.
pub static ADMISSION_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_admission_rejected_total",
        "Total trade requests rejected by the admission gate",
        &["code"]
    )
    .unwrap()
});

/// Accepted status transitions.
pub static TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_transitions_total",
        "Total accepted trade status transitions",
        &["from", "to"]
    )
    .unwrap()
});

/// Transitions rejected because the trade was no longer in the expected status.
pub static TRANSITION_CONFLICTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_transition_conflicts_total",
        "Total transitions rejected against a stale or terminal status",
        &["action"]
    )
    .unwrap()
});

/// Trades expired by the deadline monitor.
pub static TRADES_EXPIRED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "p2px_trades_expired_total",
        "Total trades expired past their payment deadline"
    )
    .unwrap()
});

/// Custody request outcomes.
/// Labels: outcome (active/failed/timeout/orphaned)
pub static ESCROW_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_escrow_requests_total",
        "Total custody escrow requests by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Custody request latency in milliseconds.
pub static ESCROW_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "p2px_escrow_latency_ms",
        "Custody escrow request latency in milliseconds",
        &["outcome"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Trades currently waiting on custody (Failed sessions of active trades).
pub static ESCROW_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "p2px_escrow_pending",
        "Active trades whose escrow session is failed and awaiting retry"
    )
    .unwrap()
});

/// Released trades moved to Completed.
/// Labels: source (ledger/custody)
pub static SETTLEMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_settlements_total",
        "Total released trades completed by settlement source",
        &["source"]
    )
    .unwrap()
});

/// Payment handoffs waiting for a retry after a transport failure.
pub static HANDOFF_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "p2px_handoff_pending",
        "Payment instruction handoffs awaiting retry"
    )
    .unwrap()
});

/// Payment handoff outcomes.
/// Labels: outcome (published/already_published/in_progress/not_sell_side, or an error label)
pub static HANDOFF_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_handoff_total",
        "Total payment instruction handoff attempts by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Notifications emitted.
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_notifications_total",
        "Total notification events emitted",
        &["kind"]
    )
    .unwrap()
});

/// Notification delivery failures.
/// Labels: kind, reason (error/timeout)
pub static NOTIFICATION_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "p2px_notification_failures_total",
        "Total notification events the transport failed to accept",
        &["kind", "reason"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a created trade.
    pub fn trade_created(symbol: &str, side: &str) {
        TRADES_CREATED_TOTAL.with_label_values(&[symbol, side]).inc();
    }

    /// Record an admission rejection.
    pub fn admission_rejected(code: &str) {
        ADMISSION_REJECTED_TOTAL.with_label_values(&[code]).inc();
    }

    /// Record an accepted transition.
    pub fn transition(from: &str, to: &str) {
        TRANSITIONS_TOTAL.with_label_values(&[from, to]).inc();
    }

    /// Record a transition lost to a concurrent writer or a terminal status.
    pub fn transition_conflict(action: &str) {
        TRANSITION_CONFLICTS_TOTAL
            .with_label_values(&[action])
            .inc();
    }

    pub fn trade_expired() {
        TRADES_EXPIRED_TOTAL.inc();
    }

    /// Record a custody request outcome and its latency.
    pub fn escrow_outcome(outcome: &str, latency_ms: f64) {
        ESCROW_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
        ESCROW_LATENCY_MS
            .with_label_values(&[outcome])
            .observe(latency_ms);
    }

    pub fn escrow_pending_set(count: i64) {
        ESCROW_PENDING.set(count);
    }

    /// Record a released trade completing.
    pub fn trade_settled(source: &str) {
        SETTLEMENTS_TOTAL.with_label_values(&[source]).inc();
    }

    pub fn handoff_pending_set(count: i64) {
        HANDOFF_PENDING.set(count);
    }

    pub fn handoff(outcome: &str) {
        HANDOFF_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn notification_sent(kind: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn notification_failed(kind: &str, reason: &str) {
        NOTIFICATION_FAILURES_TOTAL
            .with_label_values(&[kind, reason])
            .inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> crate::TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

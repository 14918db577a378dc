//! Periodic retry of failed escrow sessions and queued payment handoffs.
//!
//! Each pass also drops handoff state of trades that have left the
//! party-action window.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use p2px_book::TradeBook;
use p2px_escrow::{EscrowCoordinator, InitiationOutcome};
use p2px_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::handoff::PaymentHandoff;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_interval_ms() -> u64 {
    60_000
}

fn default_enabled() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            enabled: default_enabled(),
        }
    }
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub activated: usize,
    pub still_failed: usize,
    pub handoffs_retried: usize,
    pub handoffs_published: usize,
}

pub struct RetrySweep {
    config: RetryConfig,
    book: Arc<TradeBook>,
    coordinator: Arc<EscrowCoordinator>,
    handoff: Arc<PaymentHandoff>,
}

impl RetrySweep {
    pub fn new(
        config: RetryConfig,
        book: Arc<TradeBook>,
        coordinator: Arc<EscrowCoordinator>,
        handoff: Arc<PaymentHandoff>,
    ) -> Self {
        Self {
            config,
            book,
            coordinator,
            handoff,
        }
    }

    /// One pass: escrow retries, then queued handoffs, then pruning.
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = self.retry_escrow().await;

        report.handoffs_retried = self.handoff.pending_count();
        if report.handoffs_retried > 0 {
            report.handoffs_published = self.handoff.retry_pending().await;
            info!(
                retried = report.handoffs_retried,
                published = report.handoffs_published,
                "Payment handoff retry finished"
            );
        }
        self.handoff.prune_finished();
        report
    }

    /// Retry every failed session still under the attempt cap.
    async fn retry_escrow(&self) -> SweepReport {
        let max_attempts = self.coordinator.config().max_attempts;
        let candidates = self.book.escrow_retry_candidates(max_attempts);
        Metrics::escrow_pending_set(candidates.len() as i64);
        if candidates.is_empty() {
            return SweepReport::default();
        }

        debug!(count = candidates.len(), "Retrying failed escrow sessions");
        let results = join_all(
            candidates
                .iter()
                .map(|trade_id| self.coordinator.initiate(*trade_id)),
        )
        .await;

        let mut report = SweepReport {
            attempted: candidates.len(),
            ..SweepReport::default()
        };
        for (trade_id, result) in candidates.iter().zip(results) {
            match result {
                Ok(InitiationOutcome::Active { .. }) => report.activated += 1,
                Ok(InitiationOutcome::Failed { .. }) => report.still_failed += 1,
                Ok(_) => {}
                Err(e) => warn!(%trade_id, error = %e, "Escrow retry aborted"),
            }
        }

        let remaining = self.book.escrow_retry_candidates(max_attempts).len();
        Metrics::escrow_pending_set(remaining as i64);
        info!(
            attempted = report.attempted,
            activated = report.activated,
            still_failed = report.still_failed,
            "Escrow retry sweep finished"
        );
        report
    }

    /// Run the sweep loop until the task is aborted. Returns at once when
    /// disabled.
    pub async fn run(self: Arc<Self>) {
        if !self.config.enabled {
            info!("RetrySweep disabled");
            return;
        }
        info!("RetrySweep started: interval={}ms", self.config.interval_ms);

        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.interval_ms));
        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }
}

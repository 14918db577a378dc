//! Settlement of released trades.
//!
//! `Released` moves to `Completed` without further user action. Ledger-only
//! trades settle internally; custody-backed trades complete once custody
//! reports their escrow settled. The watcher polls custody for every released
//! trade with an active escrow and also settles any ledger-only trade the
//! desk did not complete inline.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use p2px_book::{TradeAction, TradeBook};
use p2px_core::{Actor, Clock, EscrowStatus, NotificationKind, Trade, TradeId};
use p2px_escrow::{DynCustodyService, SettlementStatus};
use p2px_notify::NotificationFanout;
use p2px_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound on one custody settlement query.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_interval_ms() -> u64 {
    15_000
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

fn default_enabled() -> bool {
    true
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            enabled: default_enabled(),
        }
    }
}

/// Result of one settlement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementReport {
    pub completed: usize,
    /// Custody still holds the asset.
    pub open: usize,
    /// Released custody trades without an active escrow to ask about.
    pub unbound: usize,
    pub errors: usize,
}

pub struct SettlementWatcher {
    config: SettlementConfig,
    book: Arc<TradeBook>,
    custody: DynCustodyService,
    fanout: Arc<NotificationFanout>,
    clock: Arc<dyn Clock>,
}

impl SettlementWatcher {
    pub fn new(
        config: SettlementConfig,
        book: Arc<TradeBook>,
        custody: DynCustodyService,
        fanout: Arc<NotificationFanout>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            book,
            custody,
            fanout,
            clock,
        }
    }

    /// Complete a released ledger-only trade. Returns the completed trade, or
    /// `None` if the trade is not released, is custody-backed, or another
    /// writer got there first.
    pub async fn settle_ledger(&self, trade: &Trade) -> Option<Trade> {
        if trade.escrow.is_some() {
            return None;
        }
        self.complete(trade.id, Actor::System, "ledger", self.clock.now())
            .await
    }

    /// Check every released trade once.
    pub async fn settle_once(&self) -> SettlementReport {
        let mut report = SettlementReport::default();

        for trade in self.book.released() {
            let Some(session) = trade.escrow.as_ref() else {
                if self.settle_ledger(&trade).await.is_some() {
                    report.completed += 1;
                }
                continue;
            };

            let custody_ref = match (&session.status, &session.custody_ref) {
                (EscrowStatus::Active, Some(custody_ref)) => custody_ref.clone(),
                _ => {
                    report.unbound += 1;
                    warn!(
                        trade_id = %trade.id,
                        escrow = %session.status,
                        "Released trade has no active escrow, settlement needs an operator"
                    );
                    continue;
                }
            };

            let timeout = Duration::from_millis(self.config.query_timeout_ms);
            let status =
                match tokio::time::timeout(timeout, self.custody.settlement_status(&custody_ref))
                    .await
                {
                    Ok(Ok(status)) => status,
                    Ok(Err(e)) => {
                        report.errors += 1;
                        warn!(trade_id = %trade.id, %custody_ref, error = %e, "Settlement query failed");
                        continue;
                    }
                    Err(_) => {
                        report.errors += 1;
                        warn!(trade_id = %trade.id, %custody_ref, ?timeout, "Settlement query timed out");
                        continue;
                    }
                };

            match status {
                SettlementStatus::Open => report.open += 1,
                SettlementStatus::Settled => {
                    if self
                        .complete(trade.id, Actor::Custody, "custody", self.clock.now())
                        .await
                        .is_some()
                    {
                        report.completed += 1;
                    }
                }
            }
        }

        if report != SettlementReport::default() {
            debug!(
                completed = report.completed,
                open = report.open,
                unbound = report.unbound,
                errors = report.errors,
                "Settlement pass finished"
            );
        }
        report
    }

    /// Run the settlement loop until the task is aborted. Returns at once
    /// when disabled.
    pub async fn run(self: Arc<Self>) {
        if !self.config.enabled {
            info!("SettlementWatcher disabled");
            return;
        }
        info!("SettlementWatcher started: interval={}ms", self.config.interval_ms);

        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.interval_ms));
        loop {
            ticker.tick().await;
            self.settle_once().await;
        }
    }

    async fn complete(
        &self,
        trade_id: TradeId,
        actor: Actor,
        source: &'static str,
        now: DateTime<Utc>,
    ) -> Option<Trade> {
        match self.book.transition(&trade_id, &actor, TradeAction::Settle, now) {
            Ok(trade) => {
                Metrics::trade_settled(source);
                info!(%trade_id, source, "Trade settled");
                self.fanout
                    .notify_both(&trade, NotificationKind::TradeCompleted, None)
                    .await;
                Some(trade)
            }
            Err(e) if e.is_conflict() => {
                debug!(%trade_id, error = %e, "Settlement skipped");
                None
            }
            Err(e) => {
                warn!(%trade_id, error = %e, "Settlement failed");
                None
            }
        }
    }
}

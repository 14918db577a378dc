//! Escrow initiation coordinator.
//!
//! Opens a custody escrow for each trade on a custody-eligible symbol. Runs
//! on a spawned task after the trade is created, so trade visibility never
//! waits on custody. Outcomes land on the trade's `EscrowSession`:
//!
//! - success: `Active` with `custody_ref`
//! - failure (timeout, HTTP error, network, decode): `Failed` with the reason,
//!   trade status untouched
//! - trade cancelled or expired while the call was in flight: `Failed` with
//!   the orphan marker; a late `custody_ref` is kept for reconciliation

use std::sync::Arc;
use std::time::{Duration, Instant};

use p2px_book::TradeBook;
use p2px_core::{
    Clock, EscrowStatus, TradeId, TradeStatus, ORPHANED_MARKER,
};
use p2px_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::custody::{CustodyReceipt, DynCustodyService, EscrowRequest};
use crate::error::{CustodyError, EscrowResult};
use crate::keys::DynPublicKeyProvider;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Symbols that settle through custody. Others skip escrow entirely.
    #[serde(default = "default_eligible_symbols")]
    pub eligible_symbols: Vec<String>,
    /// Custody service root URL.
    #[serde(default = "default_custody_url")]
    pub custody_url: String,
    /// Upper bound on one custody call.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Custody requests per trade before the retry sweep gives up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_eligible_symbols() -> Vec<String> {
    vec!["BTC".to_string()]
}

fn default_custody_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            eligible_symbols: default_eligible_symbols(),
            custody_url: default_custody_url(),
            request_timeout_ms: default_request_timeout_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl EscrowConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Why an initiation did not call custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Symbol is not custody-eligible.
    NotEligible,
    /// A request is already in flight or the session is active.
    InFlight,
    /// The trade no longer accepts party actions.
    TradeInactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiationOutcome {
    Active { custody_ref: String },
    Failed { error: CustodyError },
    /// The trade ended while custody was in flight.
    Orphaned { custody_ref: Option<String> },
    Skipped(SkipReason),
}

impl InitiationOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Active { .. } => "active",
            Self::Failed { error } => error.label(),
            Self::Orphaned { .. } => "orphaned",
            Self::Skipped(_) => "skipped",
        }
    }
}

// ============================================================================
// EscrowCoordinator
// ============================================================================

pub struct EscrowCoordinator {
    config: EscrowConfig,
    book: Arc<TradeBook>,
    custody: DynCustodyService,
    keys: DynPublicKeyProvider,
    clock: Arc<dyn Clock>,
}

impl EscrowCoordinator {
    pub fn new(
        config: EscrowConfig,
        book: Arc<TradeBook>,
        custody: DynCustodyService,
        keys: DynPublicKeyProvider,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            book,
            custody,
            keys,
            clock,
        }
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Returns true if `crypto_symbol` settles through custody.
    pub fn is_eligible(&self, crypto_symbol: &str) -> bool {
        self.config
            .eligible_symbols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(crypto_symbol))
    }

    /// Run initiation for `trade_id` on a background task.
    pub fn spawn_initiation(self: &Arc<Self>, trade_id: TradeId) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            match coordinator.initiate(trade_id).await {
                Ok(outcome) => debug!(%trade_id, outcome = outcome.label(), "Escrow initiation finished"),
                Err(e) => warn!(%trade_id, error = %e, "Escrow initiation aborted"),
            }
        })
    }

    /// Request custody for one trade and record the outcome on its session.
    pub async fn initiate(&self, trade_id: TradeId) -> EscrowResult<InitiationOutcome> {
        let trade = self
            .book
            .get(&trade_id)
            .ok_or(p2px_book::BookError::NotFound(trade_id))?;
        if !self.is_eligible(&trade.crypto_symbol) || trade.escrow.is_none() {
            return Ok(InitiationOutcome::Skipped(SkipReason::NotEligible));
        }

        let buyer_key = self
            .keys
            .public_key_for(&trade.buyer_id, &trade.crypto_symbol)
            .await;
        let seller_key = self
            .keys
            .public_key_for(&trade.seller_id, &trade.crypto_symbol)
            .await;

        // Claim the session: only one initiation may be in flight per trade.
        let claim = self.book.update_custody(&trade_id, self.clock.now(), |view| {
            if !view.trade_status.accepts_party_actions() {
                return Err(SkipReason::TradeInactive);
            }
            if !view.session.status.is_retryable() {
                return Err(SkipReason::InFlight);
            }
            view.session.status = EscrowStatus::Requested;
            view.session.attempts += 1;
            view.session.last_error = None;
            view.session.buyer_pub_key = buyer_key.clone();
            view.session.seller_pub_key = seller_key.clone();
            *view.buyer_pub_key = buyer_key.clone();
            *view.seller_pub_key = seller_key.clone();
            Ok(view.session.attempts)
        })?;
        let attempt = match claim {
            Ok(attempt) => attempt,
            Err(reason) => {
                debug!(%trade_id, ?reason, "Escrow initiation skipped");
                return Ok(InitiationOutcome::Skipped(reason));
            }
        };

        info!(
            %trade_id,
            symbol = %trade.crypto_symbol,
            attempt,
            buyer_key = buyer_key.is_some(),
            seller_key = seller_key.is_some(),
            "Requesting custody escrow"
        );

        let request = EscrowRequest {
            trade_id,
            crypto_symbol: trade.crypto_symbol.clone(),
            crypto_amount: trade.crypto_amount,
            buyer_pub_key: buyer_key,
            seller_pub_key: seller_key,
        };
        let timeout = self.config.request_timeout();
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, self.custody.request_escrow(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(CustodyError::Timeout(timeout)),
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = self
            .book
            .update_custody(&trade_id, self.clock.now(), |view| record(view, result))?;

        Metrics::escrow_outcome(outcome.label(), latency_ms);
        match &outcome {
            InitiationOutcome::Active { custody_ref } => {
                info!(%trade_id, %custody_ref, latency_ms, "Escrow active")
            }
            InitiationOutcome::Failed { error } => {
                warn!(%trade_id, %error, attempt, "Escrow request failed, trade stays actionable")
            }
            InitiationOutcome::Orphaned { custody_ref } => {
                warn!(%trade_id, ?custody_ref, "Escrow orphaned, trade ended while custody was in flight")
            }
            InitiationOutcome::Skipped(_) => {}
        }
        Ok(outcome)
    }
}

fn record(
    view: p2px_book::CustodyView<'_>,
    result: Result<CustodyReceipt, CustodyError>,
) -> InitiationOutcome {
    let session = view.session;
    let orphaned = matches!(
        view.trade_status,
        TradeStatus::Cancelled | TradeStatus::Expired
    );

    match result {
        Ok(receipt) => {
            session.custody_ref = Some(receipt.custody_ref.clone());
            if orphaned {
                session.status = EscrowStatus::Failed;
                session.last_error = Some(ORPHANED_MARKER.to_string());
                InitiationOutcome::Orphaned {
                    custody_ref: Some(receipt.custody_ref),
                }
            } else {
                session.status = EscrowStatus::Active;
                session.last_error = None;
                InitiationOutcome::Active {
                    custody_ref: receipt.custody_ref,
                }
            }
        }
        Err(error) => {
            session.status = EscrowStatus::Failed;
            if orphaned {
                session.last_error = Some(ORPHANED_MARKER.to_string());
                InitiationOutcome::Orphaned { custody_ref: None }
            } else {
                session.last_error = Some(error.to_string());
                InitiationOutcome::Failed { error }
            }
        }
    }
}

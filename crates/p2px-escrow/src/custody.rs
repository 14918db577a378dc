//! Custody service contract.
//!
//! The custody service holds the traded asset for custody-eligible symbols.
//! This crate only asks it to open an escrow; custody internals are external.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use p2px_core::{BoxFuture, CryptoAmount, TradeId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::CustodyError;

/// Request to open an escrow for one trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRequest {
    pub trade_id: TradeId,
    pub crypto_symbol: String,
    pub crypto_amount: CryptoAmount,
    /// Either key may be absent; custody defers binding until it is provisioned.
    pub buyer_pub_key: Option<String>,
    pub seller_pub_key: Option<String>,
}

/// Custody acknowledgement of an opened escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyReceipt {
    pub custody_ref: String,
}

/// Custody's view of an opened escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Asset still held in escrow.
    Open,
    /// Asset delivered to the buyer.
    Settled,
}

/// Trait for custody backends.
pub trait CustodyService: Send + Sync {
    fn request_escrow(&self, request: EscrowRequest)
        -> BoxFuture<'_, Result<CustodyReceipt, CustodyError>>;

    /// Settlement state of the escrow identified by `custody_ref`.
    fn settlement_status<'a>(
        &'a self,
        custody_ref: &'a str,
    ) -> BoxFuture<'a, Result<SettlementStatus, CustodyError>>;
}

/// Arc wrapper for CustodyService trait objects.
pub type DynCustodyService = Arc<dyn CustodyService>;

/// Mock custody service for testing.
///
/// Returns scripted results in order, then succeeds with a reference derived
/// from the trade id. Requests can be held open with [`MockCustody::hold`]
/// to simulate a slow custody call.
#[derive(Debug)]
pub struct MockCustody {
    requests: Mutex<Vec<EscrowRequest>>,
    script: Mutex<VecDeque<Result<CustodyReceipt, CustodyError>>>,
    delay: Mutex<Option<Duration>>,
    gate: watch::Sender<bool>,
    settled: Mutex<HashSet<String>>,
    settlement_error: Mutex<Option<CustodyError>>,
}

impl Default for MockCustody {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCustody {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            requests: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
            gate,
            settled: Mutex::new(HashSet::new()),
            settlement_error: Mutex::new(None),
        }
    }

    /// Queue the result of the next unscripted request.
    pub fn push_result(&self, result: Result<CustodyReceipt, CustodyError>) {
        self.script.lock().push_back(result);
    }

    /// Sleep this long before answering each request.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Block new and in-flight requests until [`MockCustody::release`].
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<EscrowRequest> {
        self.requests.lock().clone()
    }

    /// Report the escrow `custody_ref` as settled from now on.
    pub fn mark_settled(&self, custody_ref: impl Into<String>) {
        self.settled.lock().insert(custody_ref.into());
    }

    /// Fail every settlement query with `err` until cleared.
    pub fn set_settlement_error(&self, err: Option<CustodyError>) {
        *self.settlement_error.lock() = err;
    }
}

impl CustodyService for MockCustody {
    fn request_escrow(
        &self,
        request: EscrowRequest,
    ) -> BoxFuture<'_, Result<CustodyReceipt, CustodyError>> {
        Box::pin(async move {
            let trade_id = request.trade_id;
            self.requests.lock().push(request);

            let mut gate = self.gate.subscribe();
            // The sender lives in self, so the channel cannot close while we wait.
            let _ = gate.wait_for(|open| *open).await;

            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let scripted = self.script.lock().pop_front();
            scripted.unwrap_or_else(|| {
                Ok(CustodyReceipt {
                    custody_ref: format!("custody-{trade_id}"),
                })
            })
        })
    }

    fn settlement_status<'a>(
        &'a self,
        custody_ref: &'a str,
    ) -> BoxFuture<'a, Result<SettlementStatus, CustodyError>> {
        let result = match self.settlement_error.lock().clone() {
            Some(err) => Err(err),
            None if self.settled.lock().contains(custody_ref) => Ok(SettlementStatus::Settled),
            None => Ok(SettlementStatus::Open),
        };
        Box::pin(async move { result })
    }
}

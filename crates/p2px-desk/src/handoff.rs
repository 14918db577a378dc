//! Payment handoff publisher.
//!
//! Posts the seller's chosen payment instructions into the trade channel at
//! most once per trade. A claim in the registry linearises concurrent
//! callers in this process; the channel itself is checked before posting so
//! instructions written by an earlier process are not duplicated either.
//!
//! A handoff that fails on transport stays queued with its method and is
//! retried through the same claim by the retry sweep and by the next party
//! action on the trade. Claims and queued handoffs are dropped once the trade
//! stops accepting party actions.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use p2px_book::TradeBook;
use p2px_core::{PaymentInstructions, PaymentMethod, PaymentMethodId, Trade, TradeId, TradeSide};
use p2px_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::error::HandoffError;
use crate::ports::{DynPaymentMethodStore, DynTradeChannel, MessageContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    Published,
    /// Instructions already exist for this trade; nothing was posted.
    AlreadyPublished,
    /// Another caller holds the claim and its post has not finished yet.
    InProgress,
    /// Buy-side trades never carry seller instructions.
    NotSellSide,
}

impl HandoffOutcome {
    fn label(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::AlreadyPublished => "already_published",
            Self::InProgress => "in_progress",
            Self::NotSellSide => "not_sell_side",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    InFlight,
    Published,
}

pub struct PaymentHandoff {
    book: Arc<TradeBook>,
    methods: DynPaymentMethodStore,
    channel: DynTradeChannel,
    claims: DashMap<TradeId, Claim>,
    /// Handoffs that failed on transport, keyed by trade.
    pending: DashMap<TradeId, PaymentMethodId>,
}

impl PaymentHandoff {
    pub fn new(
        book: Arc<TradeBook>,
        methods: DynPaymentMethodStore,
        channel: DynTradeChannel,
    ) -> Self {
        Self {
            book,
            methods,
            channel,
            claims: DashMap::new(),
            pending: DashMap::new(),
        }
    }

    /// Publish instructions for `method` into the channel of `trade_id`.
    pub async fn publish(
        &self,
        trade_id: &TradeId,
        method: &PaymentMethodId,
    ) -> Result<HandoffOutcome, HandoffError> {
        let result = self.publish_inner(trade_id, method).await;
        match &result {
            Ok(outcome) => Metrics::handoff(outcome.label()),
            Err(e) => Metrics::handoff(e.label()),
        }
        result
    }

    async fn publish_inner(
        &self,
        trade_id: &TradeId,
        method_id: &PaymentMethodId,
    ) -> Result<HandoffOutcome, HandoffError> {
        let trade = self
            .book
            .get(trade_id)
            .ok_or(HandoffError::TradeNotFound(*trade_id))?;
        if trade.side != TradeSide::SellSide {
            debug!(%trade_id, "Handoff skipped for buy-side trade");
            return Ok(HandoffOutcome::NotSellSide);
        }

        let methods = match self.methods.payment_methods_for(&trade.seller_id).await {
            Ok(methods) => methods,
            Err(e) => {
                self.pending.insert(*trade_id, method_id.clone());
                warn!(%trade_id, error = %e, "Payment method lookup failed, handoff queued");
                return Err(HandoffError::MethodLookup(e));
            }
        };
        let Some(method) = methods
            .into_iter()
            .find(|m| &m.id == method_id && m.owner_id == trade.seller_id)
        else {
            self.pending.remove(trade_id);
            return Err(HandoffError::MethodNotOwned {
                trade_id: *trade_id,
                method: method_id.clone(),
            });
        };

        match self.claims.entry(*trade_id) {
            Entry::Occupied(claim) => {
                debug!(%trade_id, claim = ?claim.get(), "Handoff already claimed");
                return Ok(match claim.get() {
                    Claim::InFlight => HandoffOutcome::InProgress,
                    Claim::Published => HandoffOutcome::AlreadyPublished,
                });
            }
            Entry::Vacant(slot) => {
                // Status is read under the claim so a trade that has left the
                // party-action window never gets a post started.
                let status = self
                    .book
                    .get(trade_id)
                    .map(|t| t.status)
                    .ok_or(HandoffError::TradeNotFound(*trade_id))?;
                if !status.accepts_party_actions() {
                    drop(slot);
                    self.pending.remove(trade_id);
                    debug!(%trade_id, %status, "Handoff refused for inactive trade");
                    return Err(HandoffError::TradeInactive {
                        trade_id: *trade_id,
                        status,
                    });
                }
                slot.insert(Claim::InFlight);
            }
        }

        match self.post(&trade, &method).await {
            Ok(outcome) => {
                self.claims.insert(*trade_id, Claim::Published);
                self.pending.remove(trade_id);
                Ok(outcome)
            }
            Err(e) => {
                self.claims.remove(trade_id);
                self.pending.insert(*trade_id, method_id.clone());
                warn!(%trade_id, error = %e, "Payment handoff failed, claim released and handoff queued");
                Err(e)
            }
        }
    }

    async fn post(
        &self,
        trade: &Trade,
        method: &PaymentMethod,
    ) -> Result<HandoffOutcome, HandoffError> {
        let existing = self
            .channel
            .has_payment_instructions(trade.id)
            .await
            .map_err(HandoffError::Channel)?;
        if existing {
            debug!(trade_id = %trade.id, "Payment instructions already in channel");
            return Ok(HandoffOutcome::AlreadyPublished);
        }

        let instructions = PaymentInstructions::new(trade.fiat_amount, &trade.fiat_currency, method);
        self.channel
            .post_message(
                trade.id,
                &trade.seller_id,
                MessageContent::PaymentInstructions(instructions),
            )
            .await
            .map_err(HandoffError::Channel)?;

        info!(
            trade_id = %trade.id,
            method = %method.id,
            payment_type = %method.payment_type,
            "Payment instructions published"
        );
        Ok(HandoffOutcome::Published)
    }

    /// Returns true if instructions were published (or found) for `trade_id`.
    pub fn is_published(&self, trade_id: &TradeId) -> bool {
        self.claims
            .get(trade_id)
            .is_some_and(|c| *c.value() == Claim::Published)
    }

    /// Method of a handoff queued for retry on `trade_id`.
    pub fn pending_method(&self, trade_id: &TradeId) -> Option<PaymentMethodId> {
        self.pending.get(trade_id).map(|m| m.value().clone())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Retry every queued handoff once. Returns how many were published.
    pub async fn retry_pending(&self) -> usize {
        let queued: Vec<(TradeId, PaymentMethodId)> = self
            .pending
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();

        let mut published = 0;
        for (trade_id, method) in queued {
            match self.publish(&trade_id, &method).await {
                Ok(HandoffOutcome::Published) => published += 1,
                Ok(outcome) => debug!(%trade_id, ?outcome, "Queued handoff settled without a post"),
                Err(e) if e.is_retryable() => {
                    debug!(%trade_id, error = %e, "Queued handoff still failing")
                }
                Err(e) => {
                    self.pending.remove(&trade_id);
                    debug!(%trade_id, error = %e, "Queued handoff dropped");
                }
            }
        }
        Metrics::handoff_pending_set(self.pending.len() as i64);
        published
    }

    /// Drop claims and queued handoffs of trades that no longer accept party
    /// actions (or no longer exist). In-flight claims are left to their
    /// publisher. Returns how many entries were removed.
    pub fn prune_finished(&self) -> usize {
        let open = |trade_id: &TradeId| {
            self.book
                .get(trade_id)
                .is_some_and(|t| t.status.accepts_party_actions())
        };

        let claims_before = self.claims.len();
        self.claims
            .retain(|trade_id, claim| *claim == Claim::InFlight || open(trade_id));
        let pending_before = self.pending.len();
        self.pending.retain(|trade_id, _| open(trade_id));

        let removed = (claims_before - self.claims.len()) + (pending_before - self.pending.len());
        Metrics::handoff_pending_set(self.pending.len() as i64);
        if removed > 0 {
            debug!(removed, "Pruned handoff state of finished trades");
        }
        removed
    }
}

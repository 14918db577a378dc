//! In-memory trade book.
//!
//! The book is the only owner of trade records. Every status change is a
//! compare-and-set on `(trade_id, expected_status)` performed while holding
//! the trade's DashMap entry lock, so concurrent actions on one trade resolve
//! to exactly one winner. Different trades live in different shards and never
//! contend on a shared lock.

use crate::action::TradeAction;
use crate::error::{BookError, BookResult};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use p2px_admission::AdmissionDecision;
use p2px_core::{
    Actor, CryptoAmount, EscrowSession, EscrowStatus, Offer, Trade, TradeId, TradeSide,
    TradeStatus, UserId, ORPHANED_MARKER,
};
use p2px_telemetry::Metrics;
use tracing::{debug, info};

// ============================================================================
// CustodyView
// ============================================================================

/// Mutable access to the custody fields of one trade.
///
/// Handed to [`TradeBook::update_custody`] closures. Identity, economic and
/// status fields stay out of reach.
pub struct CustodyView<'a> {
    /// Trade status at the time of the update (read-only).
    pub trade_status: TradeStatus,
    pub session: &'a mut EscrowSession,
    pub buyer_pub_key: &'a mut Option<String>,
    pub seller_pub_key: &'a mut Option<String>,
}

// ============================================================================
// TradeBook
// ============================================================================

#[derive(Default)]
pub struct TradeBook {
    trades: DashMap<TradeId, Trade>,
}

impl TradeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and insert a `Pending` trade from an admission decision.
    ///
    /// `crypto_amount` and `unit_price` are frozen here. When
    /// `custody_eligible` is set the trade carries a `NotRequested` escrow
    /// session. The trade becomes visible in a single insert.
    pub fn create(
        &self,
        decision: &AdmissionDecision,
        offer: &Offer,
        custody_eligible: bool,
        now: DateTime<Utc>,
    ) -> BookResult<Trade> {
        if decision.offer_id != offer.id {
            return Err(BookError::InvalidOffer(format!(
                "decision for offer {} applied to offer {}",
                decision.offer_id, offer.id
            )));
        }
        let crypto_amount = CryptoAmount::from_fiat(decision.fiat_amount, offer.unit_price)
            .ok_or_else(|| {
                BookError::InvalidOffer(format!(
                    "offer {} has non-positive unit price {}",
                    offer.id, offer.unit_price
                ))
            })?;

        let id = TradeId::new();
        let trade = Trade {
            id,
            offer_id: offer.id.clone(),
            buyer_id: decision.buyer_id.clone(),
            seller_id: decision.seller_id.clone(),
            side: decision.side,
            crypto_symbol: offer.crypto_symbol.clone(),
            fiat_currency: offer.fiat_currency.clone(),
            fiat_amount: decision.fiat_amount,
            crypto_amount,
            unit_price: offer.unit_price,
            payment_method_label: offer.payment_method_label.clone(),
            status: TradeStatus::Pending,
            created_at: now,
            updated_at: now,
            payment_deadline: now + Duration::minutes(i64::from(offer.time_limit_minutes)),
            payment_claimed_at: None,
            dispute_reason: None,
            buyer_pub_key: None,
            seller_pub_key: None,
            escrow: custody_eligible.then(|| EscrowSession::new(id, now)),
            version: 1,
        };

        self.trades.insert(id, trade.clone());

        let side = match trade.side {
            TradeSide::SellSide => "sell_side",
            TradeSide::BuySide => "buy_side",
        };
        Metrics::trade_created(&trade.crypto_symbol, side);
        info!(
            trade_id = %id,
            offer_id = %trade.offer_id,
            buyer = %trade.buyer_id,
            seller = %trade.seller_id,
            fiat_amount = %trade.fiat_amount,
            crypto_amount = %trade.crypto_amount,
            deadline = %trade.payment_deadline,
            "Trade created"
        );
        Ok(trade)
    }

    /// Snapshot of one trade.
    pub fn get(&self, id: &TradeId) -> Option<Trade> {
        self.trades.get(id).map(|entry| entry.value().clone())
    }

    /// Apply `action` on behalf of `actor`.
    ///
    /// Returns the committed trade. A trade whose status no longer matches
    /// the action's expected status is left untouched and
    /// `BookError::InvalidTransition` is returned.
    pub fn transition(
        &self,
        id: &TradeId,
        actor: &Actor,
        action: TradeAction,
        now: DateTime<Utc>,
    ) -> BookResult<Trade> {
        let mut entry = self.trades.get_mut(id).ok_or(BookError::NotFound(*id))?;
        let trade = entry.value_mut();

        let from = trade.status;
        let to = action.target();
        // Terminal trades reject everyone alike, before any role check.
        if !from.is_terminal() {
            action.authorize(trade, actor)?;
        }
        if from != action.expected() || !from.can_transition_to(to) {
            drop(entry);
            Metrics::transition_conflict(action.name());
            debug!(trade_id = %id, %from, %to, action = action.name(), "transition rejected");
            return Err(BookError::InvalidTransition {
                trade_id: *id,
                from,
                to,
            });
        }
        if matches!(action, TradeAction::Expire) && now <= trade.payment_deadline {
            return Err(BookError::DeadlineNotReached(*id));
        }

        trade.status = to;
        trade.updated_at = now;
        trade.version += 1;
        match action {
            TradeAction::MarkPaid => trade.payment_claimed_at = Some(now),
            TradeAction::Dispute { reason } | TradeAction::GraceDispute { reason } => {
                trade.dispute_reason = Some(reason)
            }
            _ => {}
        }

        // Custody still in flight when the trade ends is abandoned, not aborted.
        if matches!(to, TradeStatus::Cancelled | TradeStatus::Expired) {
            if let Some(session) = trade.escrow.as_mut() {
                if session.status == EscrowStatus::Requested {
                    session.status = EscrowStatus::Failed;
                    session.last_error = Some(ORPHANED_MARKER.to_string());
                    session.updated_at = now;
                }
            }
        }

        let committed = trade.clone();
        drop(entry);

        Metrics::transition(from.as_str(), to.as_str());
        info!(trade_id = %id, %from, %to, %actor, "Trade transitioned");
        Ok(committed)
    }

    /// Mutate the escrow session and party keys of one trade.
    ///
    /// Runs under the trade's entry lock and bumps `version`.
    pub fn update_custody<R>(
        &self,
        id: &TradeId,
        now: DateTime<Utc>,
        f: impl FnOnce(CustodyView<'_>) -> R,
    ) -> BookResult<R> {
        let mut entry = self.trades.get_mut(id).ok_or(BookError::NotFound(*id))?;
        let trade = entry.value_mut();
        let trade_status = trade.status;
        let session = trade
            .escrow
            .as_mut()
            .ok_or(BookError::NoEscrowSession(*id))?;

        let result = f(CustodyView {
            trade_status,
            session,
            buyer_pub_key: &mut trade.buyer_pub_key,
            seller_pub_key: &mut trade.seller_pub_key,
        });

        trade.updated_at = now;
        trade.version += 1;
        Ok(result)
    }

    /// Pending trades whose payment deadline is before `now`.
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<TradeId> {
        self.trades
            .iter()
            .filter(|entry| entry.is_overdue(now))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Payment-claimed trades whose claim is older than `cutoff`.
    pub fn claimed_before(&self, cutoff: DateTime<Utc>) -> Vec<TradeId> {
        self.trades
            .iter()
            .filter(|entry| {
                entry.status == TradeStatus::PaymentClaimed
                    && entry.payment_claimed_at.is_some_and(|at| at < cutoff)
            })
            .map(|entry| *entry.key())
            .collect()
    }

    /// Snapshots of trades released and waiting for settlement.
    pub fn released(&self) -> Vec<Trade> {
        self.trades
            .iter()
            .filter(|entry| entry.status == TradeStatus::Released)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Active trades with a failed, non-orphaned escrow session that has
    /// been attempted fewer than `max_attempts` times.
    pub fn escrow_retry_candidates(&self, max_attempts: u32) -> Vec<TradeId> {
        self.trades
            .iter()
            .filter(|entry| {
                entry.status.accepts_party_actions()
                    && entry.escrow.as_ref().is_some_and(|s| {
                        s.status == EscrowStatus::Failed
                            && !s.is_orphaned()
                            && s.attempts < max_attempts
                    })
            })
            .map(|entry| *entry.key())
            .collect()
    }

    /// All trades `user` takes part in, newest first.
    pub fn trades_for(&self, user: &UserId) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self
            .trades
            .iter()
            .filter(|entry| entry.is_participant(user))
            .map(|entry| entry.value().clone())
            .collect();
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

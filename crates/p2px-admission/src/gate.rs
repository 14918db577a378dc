//! Trade admission gate.
//!
//! Every check must pass before a trade record is created. Checks run in a
//! fixed order and the first failure is returned:
//!
//! 1. self_trade: requester is not the offer owner
//! 2. restricted_jurisdiction: offer does not exclude the requester's known jurisdiction
//! 3. verification_required: requester's tier may trade
//! 4. amount_out_of_range: amount is positive and within the offer bounds
//! 5. per_trade_limit_exceeded
//! 6. daily_limit_exceeded
//! 7. lifetime_limit_exceeded
//!
//! The gate only reads its inputs. Usage counters come from the caller's
//! ledger snapshot and are never recomputed here.

use crate::error::{AdmissionError, AdmissionResult};
use crate::tier::{limits_for, VerificationTier};
use p2px_core::{Direction, FiatAmount, Offer, OfferId, PaymentMethodId, TradeSide, UserId};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A request to open a trade against an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub offer_id: OfferId,
    pub fiat_amount: FiatAmount,
    /// Seller's stored payment method, when already chosen.
    #[serde(default)]
    pub seller_payment_method: Option<PaymentMethodId>,
}

/// Explicit snapshot of the requester at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterSnapshot {
    pub user_id: UserId,
    pub verification_level: u8,
    pub usage_today: FiatAmount,
    pub lifetime_usage: FiatAmount,
    pub jurisdiction: Option<String>,
}

/// Outcome of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub offer_id: OfferId,
    pub requester_id: UserId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub side: TradeSide,
    pub fiat_amount: FiatAmount,
    pub tier: VerificationTier,
}

/// Admit `request` against `offer` for `requester`.
pub fn admit(
    request: &TradeRequest,
    offer: &Offer,
    requester: &RequesterSnapshot,
) -> AdmissionResult<AdmissionDecision> {
    let amount = request.fiat_amount;

    // Gate 1: Self trade
    if requester.user_id == offer.owner_id {
        return blocked(AdmissionError::SelfTrade);
    }

    // Gate 2: Jurisdiction
    let jurisdiction = requester.jurisdiction.as_deref();
    if offer.country_restrictions.excludes(jurisdiction) {
        return blocked(AdmissionError::RestrictedJurisdiction {
            jurisdiction: jurisdiction.unwrap_or_default().to_string(),
        });
    }

    // Gate 3: Verification tier
    let tier = limits_for(requester.verification_level);
    if !tier.can_trade {
        return blocked(AdmissionError::VerificationRequired {
            level: requester.verification_level,
        });
    }

    // Gate 4: Offer bounds
    if !amount.is_positive() || !offer.accepts_amount(amount) {
        return blocked(AdmissionError::AmountOutOfRange {
            amount,
            min: offer.min_amount,
            max: offer.max_amount,
        });
    }

    // Gate 5: Per-trade limit
    if let Some(limit) = tier.per_trade_limit.cap() {
        if amount > limit {
            return blocked(AdmissionError::PerTradeLimitExceeded { amount, limit });
        }
    }

    // Gate 6: Daily limit
    if let Some(limit) = tier.daily_limit.cap() {
        if exceeds(requester.usage_today, amount, limit) {
            return blocked(AdmissionError::DailyLimitExceeded {
                amount,
                used: requester.usage_today,
                limit,
            });
        }
    }

    // Gate 7: Lifetime limit
    if let Some(limit) = tier.lifetime_limit.cap() {
        if exceeds(requester.lifetime_usage, amount, limit) {
            return blocked(AdmissionError::LifetimeLimitExceeded {
                amount,
                used: requester.lifetime_usage,
                limit,
            });
        }
    }

    let (buyer_id, seller_id, side) = match offer.direction {
        Direction::Sell => (
            requester.user_id.clone(),
            offer.owner_id.clone(),
            TradeSide::SellSide,
        ),
        Direction::Buy => (
            offer.owner_id.clone(),
            requester.user_id.clone(),
            TradeSide::BuySide,
        ),
    };

    Ok(AdmissionDecision {
        offer_id: offer.id.clone(),
        requester_id: requester.user_id.clone(),
        buyer_id,
        seller_id,
        side,
        fiat_amount: amount,
        tier,
    })
}

fn blocked<T>(err: AdmissionError) -> AdmissionResult<T> {
    trace!(gate = err.code(), reason = %err, "admission blocked");
    Err(err)
}

/// An overflowing sum is over any limit.
fn exceeds(used: FiatAmount, amount: FiatAmount, limit: FiatAmount) -> bool {
    used.checked_add(amount).map_or(true, |total| total > limit)
}

//! Actions that move a trade through its status machine.
//!
//! Each action names the status it expects, the status it produces and who
//! may perform it. The book applies all three checks under the trade's
//! entry lock.

use crate::error::{BookError, BookResult};
use p2px_core::{Actor, NotificationKind, Role, Trade, TradeStatus, UserId};

/// Outcome an administrator chooses for a disputed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Release the asset to the buyer.
    Release,
    /// Cancel the trade and return the asset to the seller.
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeAction {
    /// Buyer asserts the fiat payment was sent.
    MarkPaid,
    /// Seller confirms receipt and authorizes release.
    Release,
    /// Either party abandons a pending trade.
    Cancel,
    /// Either party disputes a claimed payment.
    Dispute { reason: String },
    /// Deadline monitor expires an overdue pending trade.
    Expire,
    /// Grace policy escalates an unanswered payment claim.
    GraceDispute { reason: String },
    /// Custody (or the internal ledger) confirms the released asset settled.
    Settle,
    /// Administrative override of a dispute.
    Resolve(Resolution),
}

impl TradeAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MarkPaid => "mark_paid",
            Self::Release => "release",
            Self::Cancel => "cancel",
            Self::Dispute { .. } => "dispute",
            Self::Expire => "expire",
            Self::GraceDispute { .. } => "grace_dispute",
            Self::Settle => "settle",
            Self::Resolve(_) => "resolve",
        }
    }

    /// Status the trade must be in for the action to apply.
    pub fn expected(&self) -> TradeStatus {
        match self {
            Self::MarkPaid | Self::Cancel | Self::Expire => TradeStatus::Pending,
            Self::Release | Self::Dispute { .. } | Self::GraceDispute { .. } => {
                TradeStatus::PaymentClaimed
            }
            Self::Settle => TradeStatus::Released,
            Self::Resolve(_) => TradeStatus::Disputed,
        }
    }

    /// Status the action produces.
    pub fn target(&self) -> TradeStatus {
        match self {
            Self::MarkPaid => TradeStatus::PaymentClaimed,
            Self::Release | Self::Resolve(Resolution::Release) => TradeStatus::Released,
            Self::Cancel | Self::Resolve(Resolution::Cancel) => TradeStatus::Cancelled,
            Self::Dispute { .. } | Self::GraceDispute { .. } => TradeStatus::Disputed,
            Self::Expire => TradeStatus::Expired,
            Self::Settle => TradeStatus::Completed,
        }
    }

    /// Event both parties receive once the action is committed.
    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            Self::MarkPaid => NotificationKind::PaymentClaimed,
            Self::Release => NotificationKind::AssetReleased,
            Self::Cancel => NotificationKind::TradeCancelled,
            Self::Dispute { .. } | Self::GraceDispute { .. } => NotificationKind::TradeDisputed,
            Self::Expire => NotificationKind::TradeExpired,
            Self::Settle => NotificationKind::TradeCompleted,
            Self::Resolve(_) => NotificationKind::DisputeResolved,
        }
    }

    /// Check that `actor` may perform this action on `trade`.
    pub fn authorize(&self, trade: &Trade, actor: &Actor) -> BookResult<()> {
        match (self, actor) {
            (Self::MarkPaid, Actor::User(user)) => require_role(trade, user, Role::Buyer),
            (Self::Release, Actor::User(user)) => require_role(trade, user, Role::Seller),
            (Self::Cancel | Self::Dispute { .. }, Actor::User(user)) => {
                if trade.is_participant(user) {
                    Ok(())
                } else {
                    Err(BookError::NotParticipant {
                        trade_id: trade.id,
                        user: user.clone(),
                    })
                }
            }
            (Self::Expire | Self::GraceDispute { .. }, Actor::System) => Ok(()),
            (Self::Settle, Actor::Custody | Actor::System | Actor::Admin) => Ok(()),
            (Self::Resolve(_), Actor::Admin) => Ok(()),
            _ => Err(BookError::Unauthorized {
                trade_id: trade.id,
                actor: actor.to_string(),
                action: self.name(),
            }),
        }
    }
}

fn require_role(trade: &Trade, user: &UserId, expected: Role) -> BookResult<()> {
    match trade.role_of(user) {
        None => Err(BookError::NotParticipant {
            trade_id: trade.id,
            user: user.clone(),
        }),
        Some(role) if role == expected => Ok(()),
        Some(_) => Err(BookError::WrongRole {
            trade_id: trade.id,
            expected,
        }),
    }
}

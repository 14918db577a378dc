//! Trade book error types.

use p2px_core::{Role, TradeId, TradeStatus, UserId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// The trade was not in the status the action expects. Safe to retry
    /// after re-reading the trade.
    #[error("Invalid transition for trade {trade_id}: {from} -> {to}")]
    InvalidTransition {
        trade_id: TradeId,
        from: TradeStatus,
        to: TradeStatus,
    },

    #[error("Trade not found: {0}")]
    NotFound(TradeId),

    #[error("User {user} is not a participant of trade {trade_id}")]
    NotParticipant { trade_id: TradeId, user: UserId },

    #[error("Only the {expected} may perform this action on trade {trade_id}")]
    WrongRole { trade_id: TradeId, expected: Role },

    #[error("{actor} may not {action} trade {trade_id}")]
    Unauthorized {
        trade_id: TradeId,
        actor: String,
        action: &'static str,
    },

    #[error("Trade {0} has not passed its payment deadline")]
    DeadlineNotReached(TradeId),

    #[error("Trade {0} has no escrow session")]
    NoEscrowSession(TradeId),

    #[error("Offer cannot back a trade: {0}")]
    InvalidOffer(String),
}

impl BookError {
    /// Returns true if the error came from a lost compare-and-set.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

pub type BookResult<T> = Result<T, BookError>;

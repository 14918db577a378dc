//! Desk error types.

use p2px_admission::AdmissionError;
use p2px_book::BookError;
use p2px_core::{OfferId, PaymentMethodId, TradeId, TradeStatus};
use thiserror::Error;

/// Failure reported by an external collaborator (offer catalog, ledger,
/// payment-method store, trade channel).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{service}: {message}")]
pub struct CollaboratorError {
    pub service: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("Trade not found: {0}")]
    TradeNotFound(TradeId),

    #[error("Trade {trade_id} is {status}, payment instructions can no longer be posted")]
    TradeInactive {
        trade_id: TradeId,
        status: TradeStatus,
    },

    #[error("Payment method {method} does not belong to the seller of trade {trade_id}")]
    MethodNotOwned {
        trade_id: TradeId,
        method: PaymentMethodId,
    },

    #[error("Payment method lookup failed: {0}")]
    MethodLookup(CollaboratorError),

    #[error("Trade channel unavailable: {0}")]
    Channel(CollaboratorError),
}

impl HandoffError {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TradeNotFound(_) => "trade_not_found",
            Self::TradeInactive { .. } => "trade_inactive",
            Self::MethodNotOwned { .. } => "method_not_owned",
            Self::MethodLookup(_) => "method_lookup_error",
            Self::Channel(_) => "channel_error",
        }
    }

    /// Transport failures that leave the handoff queued for retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MethodLookup(_) | Self::Channel(_))
    }
}

#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Book(#[from] BookError),

    #[error(transparent)]
    Handoff(#[from] HandoffError),

    #[error("Offer not found: {0}")]
    OfferNotFound(OfferId),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

pub type DeskResult<T> = Result<T, DeskError>;

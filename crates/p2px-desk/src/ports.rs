//! Contracts for the collaborators the desk consumes and produces to.
//!
//! All of them are owned by other systems. In-memory implementations live
//! in [`crate::memory`].

use std::sync::Arc;

use p2px_core::{
    BoxFuture, FiatAmount, Offer, OfferId, PaymentInstructions, PaymentMethod, TradeId, UserId,
};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

pub type PortResult<T> = Result<T, CollaboratorError>;

/// Offer catalog lookup. Bounds and price must be current at request time.
pub trait OfferLookup: Send + Sync {
    fn get_offer<'a>(&'a self, id: &'a OfferId) -> BoxFuture<'a, PortResult<Option<Offer>>>;
}

/// Read-only usage counters for the admission gate.
pub trait UsageLedger: Send + Sync {
    fn daily_usage<'a>(&'a self, user: &'a UserId) -> BoxFuture<'a, PortResult<FiatAmount>>;
    fn lifetime_usage<'a>(&'a self, user: &'a UserId) -> BoxFuture<'a, PortResult<FiatAmount>>;
}

/// Stored fiat payment methods.
pub trait PaymentMethodStore: Send + Sync {
    fn payment_methods_for<'a>(
        &'a self,
        user: &'a UserId,
    ) -> BoxFuture<'a, PortResult<Vec<PaymentMethod>>>;
}

/// Content posted into a trade's shared channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { body: String },
    PaymentInstructions(PaymentInstructions),
}

impl MessageContent {
    pub fn is_payment_instructions(&self) -> bool {
        matches!(self, Self::PaymentInstructions(_))
    }
}

/// The buyer/seller conversation attached to each trade.
pub trait TradeChannel: Send + Sync {
    fn post_message<'a>(
        &'a self,
        trade_id: TradeId,
        sender: &'a UserId,
        content: MessageContent,
    ) -> BoxFuture<'a, PortResult<()>>;

    /// Returns true if payment instructions were already posted for `trade_id`.
    fn has_payment_instructions(&self, trade_id: TradeId) -> BoxFuture<'_, PortResult<bool>>;
}

pub type DynOfferLookup = Arc<dyn OfferLookup>;
pub type DynUsageLedger = Arc<dyn UsageLedger>;
pub type DynPaymentMethodStore = Arc<dyn PaymentMethodStore>;
pub type DynTradeChannel = Arc<dyn TradeChannel>;

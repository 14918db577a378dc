//! In-memory collaborators.
//!
//! Used by the node binary and by tests. Each can be switched into a
//! failing mode to exercise collaborator outages.

use std::collections::HashMap;

use dashmap::DashMap;
use p2px_core::{
    BoxFuture, FiatAmount, Offer, OfferId, PaymentMethod, TradeId, UserId,
};
use parking_lot::Mutex;

use crate::error::CollaboratorError;
use crate::ports::{
    MessageContent, OfferLookup, PaymentMethodStore, PortResult, TradeChannel, UsageLedger,
};

// ============================================================================
// Offers
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryOffers {
    offers: DashMap<OfferId, Offer>,
}

impl InMemoryOffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an offer. Malformed offers are refused.
    pub fn insert(&self, offer: Offer) -> p2px_core::Result<()> {
        offer.validate()?;
        self.offers.insert(offer.id.clone(), offer);
        Ok(())
    }

    pub fn remove(&self, id: &OfferId) -> Option<Offer> {
        self.offers.remove(id).map(|(_, offer)| offer)
    }
}

impl OfferLookup for InMemoryOffers {
    fn get_offer<'a>(&'a self, id: &'a OfferId) -> BoxFuture<'a, PortResult<Option<Offer>>> {
        let offer = self.offers.get(id).map(|o| o.value().clone());
        Box::pin(async move { Ok(offer) })
    }
}

// ============================================================================
// Usage ledger
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Usage {
    today: FiatAmount,
    lifetime: FiatAmount,
}

/// Usage counters keyed by user. Unknown users have no usage.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    usage: DashMap<UserId, Usage>,
    unavailable: Mutex<bool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_usage(&self, user: UserId, today: FiatAmount, lifetime: FiatAmount) {
        self.usage.insert(user, Usage { today, lifetime });
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    fn read(&self, user: &UserId) -> PortResult<Usage> {
        if *self.unavailable.lock() {
            return Err(CollaboratorError::new("usage_ledger", "unavailable"));
        }
        Ok(self.usage.get(user).map(|u| *u.value()).unwrap_or_default())
    }
}

impl UsageLedger for InMemoryLedger {
    fn daily_usage<'a>(&'a self, user: &'a UserId) -> BoxFuture<'a, PortResult<FiatAmount>> {
        Box::pin(async move { self.read(user).map(|u| u.today) })
    }

    fn lifetime_usage<'a>(&'a self, user: &'a UserId) -> BoxFuture<'a, PortResult<FiatAmount>> {
        Box::pin(async move { self.read(user).map(|u| u.lifetime) })
    }
}

// ============================================================================
// Payment methods
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryPaymentMethods {
    methods: DashMap<UserId, Vec<PaymentMethod>>,
}

impl InMemoryPaymentMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, method: PaymentMethod) {
        self.methods
            .entry(method.owner_id.clone())
            .or_default()
            .push(method);
    }
}

impl PaymentMethodStore for InMemoryPaymentMethods {
    fn payment_methods_for<'a>(
        &'a self,
        user: &'a UserId,
    ) -> BoxFuture<'a, PortResult<Vec<PaymentMethod>>> {
        let methods = self
            .methods
            .get(user)
            .map(|m| m.value().clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(methods) })
    }
}

// ============================================================================
// Trade channel
// ============================================================================

/// A message as stored in a trade's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub sender: UserId,
    pub content: MessageContent,
}

/// Per-trade message log.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    messages: Mutex<HashMap<TradeId, Vec<PostedMessage>>>,
    failing: Mutex<bool>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make posts fail until reset.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn messages(&self, trade_id: TradeId) -> Vec<PostedMessage> {
        self.messages
            .lock()
            .get(&trade_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl TradeChannel for InMemoryChannel {
    fn post_message<'a>(
        &'a self,
        trade_id: TradeId,
        sender: &'a UserId,
        content: MessageContent,
    ) -> BoxFuture<'a, PortResult<()>> {
        Box::pin(async move {
            if *self.failing.lock() {
                return Err(CollaboratorError::new("trade_channel", "write failed"));
            }
            self.messages
                .lock()
                .entry(trade_id)
                .or_default()
                .push(PostedMessage {
                    sender: sender.clone(),
                    content,
                });
            Ok(())
        })
    }

    fn has_payment_instructions(&self, trade_id: TradeId) -> BoxFuture<'_, PortResult<bool>> {
        Box::pin(async move {
            Ok(self
                .messages
                .lock()
                .get(&trade_id)
                .is_some_and(|msgs| msgs.iter().any(|m| m.content.is_payment_instructions())))
        })
    }
}

//! Trade desk: the command and query surface over the trade subsystem.
//!
//! Each command runs admission or a book transition synchronously, then
//! kicks off the side effects. Escrow initiation and payment handoff run on
//! spawned tasks; notifications are awaited but never fail the command.
//! A release of a ledger-only trade settles in the same call.

use std::sync::Arc;

use p2px_admission::{admit, RequesterSnapshot, TradeRequest};
use p2px_book::{BookError, Resolution, TradeAction, TradeBook};
use p2px_core::{
    Actor, Clock, NotificationKind, PaymentMethodId, Role, Trade, TradeId, TradeSide,
    TradeStatus, UserId,
};
use p2px_escrow::EscrowCoordinator;
use p2px_notify::NotificationFanout;
use p2px_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::error::{DeskError, DeskResult};
use crate::handoff::{HandoffOutcome, PaymentHandoff};
use crate::ports::{DynOfferLookup, DynUsageLedger};

/// The authenticated user issuing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub verification_level: u8,
    /// Two-letter country code, if known.
    pub jurisdiction: Option<String>,
}

impl Caller {
    pub fn new(user_id: impl Into<UserId>, verification_level: u8) -> Self {
        Self {
            user_id: user_id.into(),
            verification_level,
            jurisdiction: None,
        }
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }
}

pub struct TradeDesk {
    offers: DynOfferLookup,
    ledger: DynUsageLedger,
    book: Arc<TradeBook>,
    coordinator: Arc<EscrowCoordinator>,
    handoff: Arc<PaymentHandoff>,
    fanout: Arc<NotificationFanout>,
    clock: Arc<dyn Clock>,
}

impl TradeDesk {
    pub fn new(
        offers: DynOfferLookup,
        ledger: DynUsageLedger,
        book: Arc<TradeBook>,
        coordinator: Arc<EscrowCoordinator>,
        handoff: Arc<PaymentHandoff>,
        fanout: Arc<NotificationFanout>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            offers,
            ledger,
            book,
            coordinator,
            handoff,
            fanout,
            clock,
        }
    }

    pub fn book(&self) -> &Arc<TradeBook> {
        &self.book
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_trade(&self, id: &TradeId) -> DeskResult<Trade> {
        self.book
            .get(id)
            .ok_or_else(|| DeskError::Book(BookError::NotFound(*id)))
    }

    /// Trades the caller takes part in, newest first.
    pub fn trades_for(&self, user: &UserId) -> Vec<Trade> {
        self.book.trades_for(user)
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Admit `request` for `caller` and create the trade.
    ///
    /// Returns the `Pending` trade as soon as it is recorded. Escrow and
    /// payment handoff complete later and show up on subsequent reads.
    pub async fn create_trade(&self, caller: &Caller, request: TradeRequest) -> DeskResult<Trade> {
        let offer = self
            .offers
            .get_offer(&request.offer_id)
            .await?
            .ok_or_else(|| DeskError::OfferNotFound(request.offer_id.clone()))?;

        let requester = RequesterSnapshot {
            user_id: caller.user_id.clone(),
            verification_level: caller.verification_level,
            usage_today: self.ledger.daily_usage(&caller.user_id).await?,
            lifetime_usage: self.ledger.lifetime_usage(&caller.user_id).await?,
            jurisdiction: caller.jurisdiction.clone(),
        };

        let decision = admit(&request, &offer, &requester).map_err(|e| {
            Metrics::admission_rejected(e.code());
            info!(
                requester = %caller.user_id,
                offer_id = %offer.id,
                code = e.code(),
                "Trade request rejected"
            );
            e
        })?;

        let eligible = self.coordinator.is_eligible(&offer.crypto_symbol);
        let trade = self.book.create(&decision, &offer, eligible, self.clock.now())?;

        if eligible {
            self.coordinator.spawn_initiation(trade.id);
        }
        if trade.side == TradeSide::SellSide {
            if let Some(method) = request.seller_payment_method {
                self.spawn_handoff(trade.id, method);
            }
        }

        self.fanout
            .notify_both(&trade, NotificationKind::TradeCreated, None)
            .await;
        Ok(trade)
    }

    fn spawn_handoff(&self, trade_id: TradeId, method: PaymentMethodId) {
        let handoff = Arc::clone(&self.handoff);
        tokio::spawn(async move {
            if let Err(e) = handoff.publish(&trade_id, &method).await {
                warn!(%trade_id, error = %e, "Background payment handoff failed");
            }
        });
    }

    // ========================================================================
    // Party actions
    // ========================================================================

    /// Buyer declares the fiat payment sent.
    pub async fn mark_paid(&self, id: &TradeId, by: &UserId) -> DeskResult<Trade> {
        self.apply(id, Actor::User(by.clone()), TradeAction::MarkPaid, None)
            .await
    }

    /// Seller confirms receipt and releases the asset. Ledger-only trades
    /// come back `Completed`.
    pub async fn release(&self, id: &TradeId, by: &UserId) -> DeskResult<Trade> {
        let trade = self
            .apply(id, Actor::User(by.clone()), TradeAction::Release, None)
            .await?;
        Ok(self.complete_if_ledger_only(trade).await)
    }

    pub async fn cancel(&self, id: &TradeId, by: &UserId) -> DeskResult<Trade> {
        self.apply(id, Actor::User(by.clone()), TradeAction::Cancel, None)
            .await
    }

    pub async fn dispute(
        &self,
        id: &TradeId,
        by: &UserId,
        reason: impl Into<String>,
    ) -> DeskResult<Trade> {
        let details = serde_json::json!({ "raised_by": by.as_str() });
        self.apply(
            id,
            Actor::User(by.clone()),
            TradeAction::Dispute {
                reason: reason.into(),
            },
            Some(details),
        )
        .await
    }

    // ========================================================================
    // Custody and operator actions
    // ========================================================================

    /// Custody reports the released asset settled.
    pub async fn confirm_settlement(&self, id: &TradeId) -> DeskResult<Trade> {
        self.apply(id, Actor::Custody, TradeAction::Settle, None).await
    }

    /// Administrative override on a disputed trade.
    pub async fn resolve_dispute(
        &self,
        id: &TradeId,
        resolution: Resolution,
        note: Option<String>,
    ) -> DeskResult<Trade> {
        let outcome = match resolution {
            Resolution::Release => "released",
            Resolution::Cancel => "cancelled",
        };
        let details = serde_json::json!({ "resolution": outcome, "note": note });
        let trade = self
            .apply(id, Actor::Admin, TradeAction::Resolve(resolution), Some(details))
            .await?;
        Ok(self.complete_if_ledger_only(trade).await)
    }

    /// Seller publishes instructions for one of their stored payment methods.
    pub async fn publish_payment_instructions(
        &self,
        id: &TradeId,
        by: &UserId,
        method: &PaymentMethodId,
    ) -> DeskResult<HandoffOutcome> {
        let trade = self.get_trade(id)?;
        match trade.role_of(by) {
            Some(Role::Seller) => {}
            Some(_) => {
                return Err(BookError::WrongRole {
                    trade_id: *id,
                    expected: Role::Seller,
                }
                .into())
            }
            None => {
                return Err(BookError::NotParticipant {
                    trade_id: *id,
                    user: by.clone(),
                }
                .into())
            }
        }
        Ok(self.handoff.publish(id, method).await?)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn apply(
        &self,
        id: &TradeId,
        actor: Actor,
        action: TradeAction,
        details: Option<serde_json::Value>,
    ) -> DeskResult<Trade> {
        let kind = action.notification_kind();
        let trade = self.book.transition(id, &actor, action, self.clock.now())?;

        self.retry_escrow_if_failed(&trade);
        self.retry_handoff_if_pending(&trade);
        self.fanout.notify_both(&trade, kind, details).await;
        Ok(trade)
    }

    /// Settle a released trade that has no custody leg. A failure leaves it
    /// `Released` for the settlement watcher.
    async fn complete_if_ledger_only(&self, trade: Trade) -> Trade {
        if trade.status != TradeStatus::Released || trade.escrow.is_some() {
            return trade;
        }
        match self
            .book
            .transition(&trade.id, &Actor::System, TradeAction::Settle, self.clock.now())
        {
            Ok(completed) => {
                Metrics::trade_settled("ledger");
                info!(trade_id = %completed.id, "Ledger-only trade settled");
                self.fanout
                    .notify_both(&completed, NotificationKind::TradeCompleted, None)
                    .await;
                completed
            }
            Err(e) => {
                warn!(trade_id = %trade.id, error = %e, "Inline settlement failed");
                trade
            }
        }
    }

    /// Party activity on a trade whose payment handoff failed on transport
    /// gives the handoff another try.
    fn retry_handoff_if_pending(&self, trade: &Trade) {
        if !trade.status.accepts_party_actions() {
            return;
        }
        if let Some(method) = self.handoff.pending_method(&trade.id) {
            debug!(trade_id = %trade.id, %method, "Re-triggering payment handoff");
            self.spawn_handoff(trade.id, method);
        }
    }

    /// Party activity on a trade whose escrow never came up gives custody
    /// another try.
    fn retry_escrow_if_failed(&self, trade: &Trade) {
        let Some(session) = trade.escrow.as_ref() else {
            return;
        };
        if !trade.status.accepts_party_actions()
            || !session.status.is_retryable()
            || session.is_orphaned()
            || session.attempts >= self.coordinator.config().max_attempts
        {
            return;
        }
        debug!(
            trade_id = %trade.id,
            status = ?session.status,
            attempts = session.attempts,
            "Re-triggering escrow initiation"
        );
        self.coordinator.spawn_initiation(trade.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandoffError;
    use crate::memory::{InMemoryChannel, InMemoryLedger, InMemoryOffers, InMemoryPaymentMethods};
    use chrono::{DateTime, Utc};
    use p2px_admission::AdmissionError;
    use p2px_core::{
        CountryRestriction, Direction, EscrowStatus, FiatAmount, ManualClock, Offer, OfferId,
        PaymentMethod, TradeStatus, UnitPrice,
    };
    use p2px_escrow::{CustodyError, EscrowConfig, MockCustody, StaticKeys};
    use p2px_notify::{FanoutConfig, RecordingTransport, StaticProfiles};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct Harness {
        desk: TradeDesk,
        offers: Arc<InMemoryOffers>,
        ledger: Arc<InMemoryLedger>,
        custody: Arc<MockCustody>,
        channel: Arc<InMemoryChannel>,
        transport: Arc<RecordingTransport>,
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn offer(id: &str, direction: Direction, symbol: &str) -> Offer {
        Offer {
            id: OfferId::from(id),
            owner_id: UserId::from("owner"),
            direction,
            crypto_symbol: symbol.into(),
            fiat_currency: "USD".into(),
            unit_price: UnitPrice::new(dec!(40000)),
            min_amount: FiatAmount::new(dec!(20)),
            max_amount: FiatAmount::new(dec!(2000)),
            payment_method_label: "bank_transfer".into(),
            time_limit_minutes: 30,
            country_restrictions: CountryRestriction::None,
        }
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(t0()));
        let book = Arc::new(TradeBook::new());
        let offers = Arc::new(InMemoryOffers::new());
        offers.insert(offer("sell-btc", Direction::Sell, "BTC")).unwrap();
        offers.insert(offer("buy-eth", Direction::Buy, "ETH")).unwrap();
        let ledger = Arc::new(InMemoryLedger::new());
        let custody = Arc::new(MockCustody::new());
        let coordinator = Arc::new(EscrowCoordinator::new(
            EscrowConfig {
                request_timeout_ms: 500,
                ..EscrowConfig::default()
            },
            book.clone(),
            custody.clone(),
            Arc::new(StaticKeys::new()),
            clock.clone(),
        ));
        let methods = Arc::new(InMemoryPaymentMethods::new());
        methods.add(PaymentMethod {
            id: PaymentMethodId::from("pm-owner"),
            owner_id: UserId::from("owner"),
            payment_type: "bank_transfer".into(),
            account_holder: "O. Wner".into(),
            provider: "Example Bank".into(),
            account_number: "NL91ABNA0417164300".into(),
        });
        let channel = Arc::new(InMemoryChannel::new());
        let handoff = Arc::new(PaymentHandoff::new(book.clone(), methods, channel.clone()));
        let transport = Arc::new(RecordingTransport::new());
        let fanout = Arc::new(NotificationFanout::new(
            FanoutConfig::default(),
            transport.clone(),
            Arc::new(StaticProfiles::new()),
        ));
        let desk = TradeDesk::new(
            offers.clone(),
            ledger.clone(),
            book,
            coordinator,
            handoff,
            fanout,
            clock,
        );
        Harness {
            desk,
            offers,
            ledger,
            custody,
            channel,
            transport,
        }
    }

    fn request(offer_id: &str, amount: rust_decimal::Decimal) -> TradeRequest {
        TradeRequest {
            offer_id: OfferId::from(offer_id),
            fiat_amount: FiatAmount::new(amount),
            seller_payment_method: None,
        }
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) {
        for _ in 0..100 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_create_sell_side_trade() {
        let h = harness();
        let caller = Caller::new("alice", 1);
        let mut req = request("sell-btc", dec!(400));
        req.seller_payment_method = Some(PaymentMethodId::from("pm-owner"));

        let trade = h.desk.create_trade(&caller, req).await.unwrap();
        assert_eq!(trade.status, TradeStatus::Pending);
        assert_eq!(trade.buyer_id, UserId::from("alice"));
        assert_eq!(trade.seller_id, UserId::from("owner"));
        assert_eq!(trade.crypto_amount.inner(), dec!(0.01));

        let events = h.transport.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == NotificationKind::TradeCreated));

        let book = h.desk.book().clone();
        let id = trade.id;
        wait_for(|| {
            book.get(&id)
                .and_then(|t| t.escrow)
                .is_some_and(|s| s.status == EscrowStatus::Active)
        })
        .await;
        wait_for(|| h.channel.messages(id).len() == 1).await;
    }

    #[tokio::test]
    async fn test_buy_side_trade_skips_escrow_and_handoff() {
        let h = harness();
        let trade = h
            .desk
            .create_trade(&Caller::new("bob", 1), request("buy-eth", dec!(100)))
            .await
            .unwrap();

        assert_eq!(trade.side, TradeSide::BuySide);
        assert_eq!(trade.seller_id, UserId::from("bob"));
        assert!(trade.escrow.is_none());
        assert!(h.custody.requests().is_empty());
    }

    #[tokio::test]
    async fn test_admission_rejections_leave_no_trade() {
        let h = harness();

        let err = h
            .desk
            .create_trade(&Caller::new("owner", 3), request("sell-btc", dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Admission(AdmissionError::SelfTrade)));

        h.ledger
            .set_usage(UserId::from("carol"), FiatAmount::new(dec!(950)), FiatAmount::ZERO);
        let err = h
            .desk
            .create_trade(&Caller::new("carol", 1), request("sell-btc", dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Admission(AdmissionError::DailyLimitExceeded { .. })
        ));

        assert!(h.desk.book().is_empty());
        assert!(h.transport.events().is_empty());
    }

    #[tokio::test]
    async fn test_collaborator_failures_surface() {
        let h = harness();
        let err = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("missing", dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::OfferNotFound(_)));

        h.ledger.set_unavailable(true);
        let err = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Collaborator(_)));

        h.ledger.set_unavailable(false);
        h.offers.remove(&OfferId::from("sell-btc"));
        let err = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::OfferNotFound(_)));
        assert!(h.desk.book().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_to_completion() {
        let h = harness();
        let alice = UserId::from("alice");
        let owner = UserId::from("owner");
        let id = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(400)))
            .await
            .unwrap()
            .id;

        // Only the buyer may mark paid.
        assert!(matches!(
            h.desk.mark_paid(&id, &owner).await,
            Err(DeskError::Book(BookError::WrongRole { .. }))
        ));
        h.desk.mark_paid(&id, &alice).await.unwrap();
        h.desk.release(&id, &owner).await.unwrap();
        let trade = h.desk.confirm_settlement(&id).await.unwrap();
        assert_eq!(trade.status, TradeStatus::Completed);

        let kinds: Vec<_> = h.transport.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::TradeCreated,
                NotificationKind::TradeCreated,
                NotificationKind::PaymentClaimed,
                NotificationKind::PaymentClaimed,
                NotificationKind::AssetReleased,
                NotificationKind::AssetReleased,
                NotificationKind::TradeCompleted,
                NotificationKind::TradeCompleted,
            ]
        );

        let err = h.desk.cancel(&id, &alice).await.unwrap_err();
        assert!(matches!(err, DeskError::Book(ref e) if e.is_conflict()));
        assert_eq!(h.desk.trades_for(&alice).len(), 1);
    }

    #[tokio::test]
    async fn test_dispute_and_admin_resolution() {
        let h = harness();
        let alice = UserId::from("alice");
        let id = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(400)))
            .await
            .unwrap()
            .id;
        h.desk.mark_paid(&id, &alice).await.unwrap();
        h.desk
            .dispute(&id, &UserId::from("owner"), "nothing arrived")
            .await
            .unwrap();

        h.transport.clear();
        let trade = h
            .desk
            .resolve_dispute(&id, Resolution::Release, Some("bank statement checked".into()))
            .await
            .unwrap();
        assert_eq!(trade.status, TradeStatus::Released);

        let events = h.transport.events();
        assert_eq!(events[0].kind, NotificationKind::DisputeResolved);
        assert_eq!(
            events[0].payload.details.as_ref().unwrap()["resolution"],
            "released"
        );
    }

    #[tokio::test]
    async fn test_party_action_retries_failed_escrow() {
        let h = harness();
        h.custody.push_result(Err(CustodyError::Network("connection reset".into())));
        let id = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(400)))
            .await
            .unwrap()
            .id;

        let book = h.desk.book().clone();
        wait_for(|| {
            book.get(&id)
                .and_then(|t| t.escrow)
                .is_some_and(|s| s.status == EscrowStatus::Failed)
        })
        .await;
        assert_eq!(book.get(&id).unwrap().status, TradeStatus::Pending);

        h.desk.mark_paid(&id, &UserId::from("alice")).await.unwrap();
        wait_for(|| {
            book.get(&id)
                .and_then(|t| t.escrow)
                .is_some_and(|s| s.status == EscrowStatus::Active && s.attempts == 2)
        })
        .await;
    }

    #[tokio::test]
    async fn test_publish_instructions_requires_seller() {
        let h = harness();
        let id = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(400)))
            .await
            .unwrap()
            .id;
        let method = PaymentMethodId::from("pm-owner");

        assert!(matches!(
            h.desk
                .publish_payment_instructions(&id, &UserId::from("alice"), &method)
                .await,
            Err(DeskError::Book(BookError::WrongRole { .. }))
        ));
        assert!(matches!(
            h.desk
                .publish_payment_instructions(&id, &UserId::from("owner"), &PaymentMethodId::from("pm-x"))
                .await,
            Err(DeskError::Handoff(HandoffError::MethodNotOwned { .. }))
        ));

        let owner = UserId::from("owner");
        assert_eq!(
            h.desk
                .publish_payment_instructions(&id, &owner, &method)
                .await
                .unwrap(),
            HandoffOutcome::Published
        );
        assert_eq!(
            h.desk
                .publish_payment_instructions(&id, &owner, &method)
                .await
                .unwrap(),
            HandoffOutcome::AlreadyPublished
        );
        assert_eq!(h.channel.messages(id).len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_only_release_completes_without_custody() {
        let h = harness();
        let owner = UserId::from("owner");
        let bob = UserId::from("bob");
        let id = h
            .desk
            .create_trade(&Caller::new("bob", 1), request("buy-eth", dec!(100)))
            .await
            .unwrap()
            .id;

        h.desk.mark_paid(&id, &owner).await.unwrap();
        let trade = h.desk.release(&id, &bob).await.unwrap();
        assert_eq!(trade.status, TradeStatus::Completed);
        assert_eq!(h.desk.get_trade(&id).unwrap().status, TradeStatus::Completed);

        let kinds: Vec<_> = h.transport.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            &kinds[kinds.len() - 4..],
            &[
                NotificationKind::AssetReleased,
                NotificationKind::AssetReleased,
                NotificationKind::TradeCompleted,
                NotificationKind::TradeCompleted,
            ]
        );

        // Custody-backed trades wait for custody.
        let alice = UserId::from("alice");
        let id = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(400)))
            .await
            .unwrap()
            .id;
        h.desk.mark_paid(&id, &alice).await.unwrap();
        let trade = h.desk.release(&id, &owner).await.unwrap();
        assert_eq!(trade.status, TradeStatus::Released);
    }

    #[tokio::test]
    async fn test_failed_handoff_is_retried_on_next_party_action() {
        let h = harness();
        h.channel.set_failing(true);
        let mut req = request("sell-btc", dec!(400));
        req.seller_payment_method = Some(PaymentMethodId::from("pm-owner"));
        let id = h
            .desk
            .create_trade(&Caller::new("alice", 1), req)
            .await
            .unwrap()
            .id;

        let handoff = h.desk.handoff.clone();
        wait_for(|| handoff.pending_method(&id).is_some()).await;
        assert!(h.channel.messages(id).is_empty());

        h.channel.set_failing(false);
        h.desk.mark_paid(&id, &UserId::from("alice")).await.unwrap();
        wait_for(|| h.channel.messages(id).len() == 1).await;
        wait_for(|| handoff.pending_method(&id).is_none()).await;
    }

    #[tokio::test]
    async fn test_publish_instructions_on_cancelled_trade_is_refused() {
        let h = harness();
        let owner = UserId::from("owner");
        let id = h
            .desk
            .create_trade(&Caller::new("alice", 1), request("sell-btc", dec!(400)))
            .await
            .unwrap()
            .id;
        h.desk.cancel(&id, &UserId::from("alice")).await.unwrap();

        let err = h
            .desk
            .publish_payment_instructions(&id, &owner, &PaymentMethodId::from("pm-owner"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Handoff(HandoffError::TradeInactive {
                status: TradeStatus::Cancelled,
                ..
            })
        ));
        assert!(h.channel.messages(id).is_empty());
    }
}

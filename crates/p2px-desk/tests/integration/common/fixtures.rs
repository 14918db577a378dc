//! Fully wired desk over in-memory collaborators.
//!
//! Users:
//! - `seller-1` owns the BTC sell offer `sell-btc` and payment method `pm-1`
//!   and the ETH sell offer `sell-eth` (not custody-eligible)
//! - `buyer-1` owns the USDT buy offer `buy-usdt`
//! Custody is a [`MockCustody`] whose escrows get custody ref
//! `custody-{trade_id}`; time is a [`ManualClock`] starting at
//! 2024-05-01T12:00:00Z.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use p2px_admission::TradeRequest;
use p2px_book::TradeBook;
use p2px_core::{
    CountryRestriction, Direction, FiatAmount, ManualClock, Offer, OfferId, PaymentMethod,
    PaymentMethodId, UnitPrice, UserId,
};
use p2px_desk::{
    DeadlineConfig, DeadlineMonitor, InMemoryChannel, InMemoryLedger, InMemoryOffers,
    InMemoryPaymentMethods, PaymentHandoff, RetryConfig, RetrySweep, SettlementConfig,
    SettlementWatcher, TradeDesk,
};
use p2px_escrow::{EscrowConfig, EscrowCoordinator, MockCustody, StaticKeys};
use p2px_notify::{FanoutConfig, NotificationFanout, RecordingTransport, StaticProfiles};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const SELL_OFFER: &str = "sell-btc";
pub const SELL_ETH_OFFER: &str = "sell-eth";
pub const BUY_OFFER: &str = "buy-usdt";
pub const SELLER: &str = "seller-1";
pub const BUYER: &str = "buyer-1";
pub const SELLER_METHOD: &str = "pm-1";

pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub struct Stack {
    pub desk: Arc<TradeDesk>,
    pub monitor: Arc<DeadlineMonitor>,
    pub sweep: Arc<RetrySweep>,
    pub settlement: Arc<SettlementWatcher>,
    pub handoff: Arc<PaymentHandoff>,
    pub book: Arc<TradeBook>,
    pub clock: Arc<ManualClock>,
    pub offers: Arc<InMemoryOffers>,
    pub ledger: Arc<InMemoryLedger>,
    pub custody: Arc<MockCustody>,
    pub channel: Arc<InMemoryChannel>,
    pub transport: Arc<RecordingTransport>,
}

impl Stack {
    pub fn new() -> Self {
        Self::with_escrow_timeout(Duration::from_millis(200))
    }

    pub fn with_escrow_timeout(timeout: Duration) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let book = Arc::new(TradeBook::new());

        let offers = Arc::new(InMemoryOffers::new());
        offers.insert(sell_offer()).unwrap();
        offers.insert(sell_eth_offer()).unwrap();
        offers.insert(buy_offer()).unwrap();

        let ledger = Arc::new(InMemoryLedger::new());

        let keys = Arc::new(StaticKeys::new());
        keys.insert(UserId::from(SELLER), "BTC", "02aa11seller");
        keys.insert(UserId::from(BUYER), "BTC", "03bb22buyer");

        let custody = Arc::new(MockCustody::new());
        let coordinator = Arc::new(EscrowCoordinator::new(
            EscrowConfig {
                eligible_symbols: vec!["BTC".into()],
                request_timeout_ms: timeout.as_millis() as u64,
                ..EscrowConfig::default()
            },
            book.clone(),
            custody.clone(),
            keys,
            clock.clone(),
        ));

        let methods = Arc::new(InMemoryPaymentMethods::new());
        methods.add(PaymentMethod {
            id: PaymentMethodId::from(SELLER_METHOD),
            owner_id: UserId::from(SELLER),
            payment_type: "sepa".into(),
            account_holder: "Seller One".into(),
            provider: "Example Bank".into(),
            account_number: "DE89370400440532013000".into(),
        });
        let channel = Arc::new(InMemoryChannel::new());
        let handoff = Arc::new(PaymentHandoff::new(book.clone(), methods, channel.clone()));

        let transport = Arc::new(RecordingTransport::new());
        let fanout = Arc::new(NotificationFanout::new(
            FanoutConfig {
                base_url: "https://p2p.test".into(),
                emit_timeout_ms: 500,
            },
            transport.clone(),
            Arc::new(StaticProfiles::new()),
        ));

        let monitor = Arc::new(DeadlineMonitor::new(
            DeadlineConfig::default(),
            book.clone(),
            fanout.clone(),
            clock.clone(),
        ));
        let sweep = Arc::new(RetrySweep::new(
            RetryConfig::default(),
            book.clone(),
            coordinator.clone(),
            handoff.clone(),
        ));
        let settlement = Arc::new(SettlementWatcher::new(
            SettlementConfig {
                interval_ms: 10,
                query_timeout_ms: 200,
                ..SettlementConfig::default()
            },
            book.clone(),
            custody.clone(),
            fanout.clone(),
            clock.clone(),
        ));
        let desk = Arc::new(TradeDesk::new(
            offers.clone(),
            ledger.clone(),
            book.clone(),
            coordinator,
            handoff.clone(),
            fanout,
            clock.clone(),
        ));

        Self {
            desk,
            monitor,
            sweep,
            settlement,
            handoff,
            book,
            clock,
            offers,
            ledger,
            custody,
            channel,
            transport,
        }
    }

    /// Poll `cond` until it holds or a second passes.
    pub async fn eventually(&self, mut cond: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..200 {
            if cond(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

/// `seller-1` sells BTC at 50 000 USD, 10..=2 000 USD, 30 minute window.
pub fn sell_offer() -> Offer {
    Offer {
        id: OfferId::from(SELL_OFFER),
        owner_id: UserId::from(SELLER),
        direction: Direction::Sell,
        crypto_symbol: "BTC".into(),
        fiat_currency: "USD".into(),
        unit_price: UnitPrice::new(dec!(50000)),
        min_amount: FiatAmount::new(dec!(10)),
        max_amount: FiatAmount::new(dec!(2000)),
        payment_method_label: "sepa".into(),
        time_limit_minutes: 30,
        country_restrictions: CountryRestriction::Exclude(vec!["KP".into()]),
    }
}

/// `seller-1` sells ETH at 2 500 USD, 10..=1 000 USD, 20 minute window.
pub fn sell_eth_offer() -> Offer {
    Offer {
        id: OfferId::from(SELL_ETH_OFFER),
        crypto_symbol: "ETH".into(),
        unit_price: UnitPrice::new(dec!(2500)),
        max_amount: FiatAmount::new(dec!(1000)),
        time_limit_minutes: 20,
        country_restrictions: CountryRestriction::None,
        ..sell_offer()
    }
}

/// `buyer-1` buys USDT at 1 USD, 10..=500 USD, 15 minute window.
pub fn buy_offer() -> Offer {
    Offer {
        id: OfferId::from(BUY_OFFER),
        owner_id: UserId::from(BUYER),
        direction: Direction::Buy,
        crypto_symbol: "USDT".into(),
        fiat_currency: "USD".into(),
        unit_price: UnitPrice::new(dec!(1)),
        min_amount: FiatAmount::new(dec!(10)),
        max_amount: FiatAmount::new(dec!(500)),
        payment_method_label: "revolut".into(),
        time_limit_minutes: 15,
        country_restrictions: CountryRestriction::None,
    }
}

pub fn request(offer: &str, amount: Decimal) -> TradeRequest {
    TradeRequest {
        offer_id: OfferId::from(offer),
        fiat_amount: FiatAmount::new(amount),
        seller_payment_method: None,
    }
}

pub fn request_with_method(offer: &str, amount: Decimal) -> TradeRequest {
    TradeRequest {
        seller_payment_method: Some(PaymentMethodId::from(SELLER_METHOD)),
        ..request(offer, amount)
    }
}

//! Deadline monitor.
//!
//! Expires `Pending` trades whose payment deadline has passed. The expiry is
//! the same compare-and-set every party action goes through, so a buyer who
//! marks payment first wins and the trade is simply skipped here.
//!
//! Optionally escalates `PaymentClaimed` trades the seller never confirmed
//! into `Disputed` after a grace period.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use p2px_book::{BookError, TradeAction, TradeBook};
use p2px_core::{Actor, Clock, NotificationKind, TradeId};
use p2px_notify::NotificationFanout;
use p2px_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const GRACE_DISPUTE_REASON: &str = "seller did not confirm within grace period";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineConfig {
    /// How often overdue trades are scanned.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Minutes a payment claim may stay unconfirmed before it is disputed.
    /// `None` disables escalation.
    #[serde(default)]
    pub dispute_grace_minutes: Option<u64>,
}

fn default_check_interval_ms() -> u64 {
    30_000
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            dispute_grace_minutes: None,
        }
    }
}

pub struct DeadlineMonitor {
    config: DeadlineConfig,
    book: Arc<TradeBook>,
    fanout: Arc<NotificationFanout>,
    clock: Arc<dyn Clock>,
}

impl DeadlineMonitor {
    pub fn new(
        config: DeadlineConfig,
        book: Arc<TradeBook>,
        fanout: Arc<NotificationFanout>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            book,
            fanout,
            clock,
        }
    }

    /// Expire every overdue `Pending` trade. Returns how many were expired.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for trade_id in self.book.overdue(now) {
            match self
                .book
                .transition(&trade_id, &Actor::System, TradeAction::Expire, now)
            {
                Ok(trade) => {
                    expired += 1;
                    Metrics::trade_expired();
                    info!(%trade_id, deadline = %trade.payment_deadline, "Trade expired");
                    self.fanout
                        .notify_both(&trade, NotificationKind::TradeExpired, None)
                        .await;
                }
                Err(e) => skip(trade_id, "expire", e),
            }
        }
        expired
    }

    /// Dispute payment claims older than the configured grace period.
    /// Returns how many were escalated; always 0 when disabled.
    pub async fn escalate_unconfirmed(&self, now: DateTime<Utc>) -> usize {
        let Some(grace) = self.config.dispute_grace_minutes else {
            return 0;
        };
        let Some(cutoff) = grace_cutoff(now, grace) else {
            warn!(grace_minutes = grace, "Dispute grace period out of range, escalation skipped");
            return 0;
        };

        let mut escalated = 0;
        for trade_id in self.book.claimed_before(cutoff) {
            let action = TradeAction::GraceDispute {
                reason: GRACE_DISPUTE_REASON.to_string(),
            };
            match self.book.transition(&trade_id, &Actor::System, action, now) {
                Ok(trade) => {
                    escalated += 1;
                    warn!(%trade_id, grace_minutes = grace, "Unconfirmed payment escalated to dispute");
                    self.fanout
                        .notify_both(&trade, NotificationKind::TradeDisputed, None)
                        .await;
                }
                Err(e) => skip(trade_id, "escalate", e),
            }
        }
        escalated
    }

    /// Run the monitoring loop until the task is aborted.
    pub async fn run(self: Arc<Self>) {
        info!(
            "DeadlineMonitor started: interval={}ms, dispute_grace={:?}min",
            self.config.check_interval_ms, self.config.dispute_grace_minutes
        );

        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.check_interval_ms));
        loop {
            ticker.tick().await;

            let now = self.clock.now();
            let expired = self.expire_overdue(now).await;
            let escalated = self.escalate_unconfirmed(now).await;
            if expired + escalated > 0 {
                debug!(expired, escalated, "Deadline sweep finished");
            }
        }
    }
}

/// Claims made before this instant are past the grace period.
fn grace_cutoff(now: DateTime<Utc>, grace_minutes: u64) -> Option<DateTime<Utc>> {
    let minutes = i64::try_from(grace_minutes).ok()?;
    now.checked_sub_signed(chrono::Duration::try_minutes(minutes)?)
}

/// Another actor moved the trade first; that is the expected race.
fn skip(trade_id: TradeId, what: &str, err: BookError) {
    if err.is_conflict() {
        debug!(%trade_id, error = %err, "Deadline {what} skipped");
    } else {
        warn!(%trade_id, error = %err, "Deadline {what} failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use p2px_admission::{admit, RequesterSnapshot, TradeRequest};
    use p2px_core::{
        CountryRestriction, Direction, FiatAmount, ManualClock, Offer, OfferId, TradeStatus,
        UnitPrice, UserId,
    };
    use p2px_notify::{FanoutConfig, RecordingTransport, StaticProfiles};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    struct Harness {
        book: Arc<TradeBook>,
        transport: Arc<RecordingTransport>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                book: Arc::new(TradeBook::new()),
                transport: Arc::new(RecordingTransport::new()),
            }
        }

        fn monitor(&self, grace: Option<u64>) -> DeadlineMonitor {
            let fanout = NotificationFanout::new(
                FanoutConfig::default(),
                self.transport.clone(),
                Arc::new(StaticProfiles::new()),
            );
            DeadlineMonitor::new(
                DeadlineConfig {
                    check_interval_ms: 10,
                    dispute_grace_minutes: grace,
                },
                self.book.clone(),
                Arc::new(fanout),
                Arc::new(ManualClock::new(t0())),
            )
        }

        fn create(&self) -> TradeId {
            let offer = Offer {
                id: OfferId::from("offer-1"),
                owner_id: UserId::from("seller"),
                direction: Direction::Sell,
                crypto_symbol: "ETH".into(),
                fiat_currency: "USD".into(),
                unit_price: UnitPrice::new(dec!(2000)),
                min_amount: FiatAmount::new(dec!(10)),
                max_amount: FiatAmount::new(dec!(1000)),
                payment_method_label: "bank_transfer".into(),
                time_limit_minutes: 15,
                country_restrictions: CountryRestriction::None,
            };
            let request = TradeRequest {
                offer_id: offer.id.clone(),
                fiat_amount: FiatAmount::new(dec!(100)),
                seller_payment_method: None,
            };
            let requester = RequesterSnapshot {
                user_id: UserId::from("buyer"),
                verification_level: 1,
                usage_today: FiatAmount::ZERO,
                lifetime_usage: FiatAmount::ZERO,
                jurisdiction: None,
            };
            let decision = admit(&request, &offer, &requester).unwrap();
            self.book.create(&decision, &offer, false, t0()).unwrap().id
        }
    }

    #[tokio::test]
    async fn test_expires_only_overdue_pending() {
        let h = Harness::new();
        let overdue = h.create();
        let claimed = h.create();
        h.book
            .transition(
                &claimed,
                &Actor::User(UserId::from("buyer")),
                TradeAction::MarkPaid,
                t0() + ChronoDuration::minutes(14),
            )
            .unwrap();
        let monitor = h.monitor(None);

        assert_eq!(monitor.expire_overdue(t0() + ChronoDuration::minutes(15)).await, 0);
        assert_eq!(monitor.expire_overdue(t0() + ChronoDuration::minutes(16)).await, 1);

        assert_eq!(h.book.get(&overdue).unwrap().status, TradeStatus::Expired);
        assert_eq!(h.book.get(&claimed).unwrap().status, TradeStatus::PaymentClaimed);

        let events = h.transport.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == NotificationKind::TradeExpired));

        // Second pass finds nothing left to do.
        assert_eq!(monitor.expire_overdue(t0() + ChronoDuration::hours(1)).await, 0);
    }

    #[tokio::test]
    async fn test_grace_escalation_disabled_by_default() {
        let h = Harness::new();
        let id = h.create();
        h.book
            .transition(&id, &Actor::User(UserId::from("buyer")), TradeAction::MarkPaid, t0())
            .unwrap();

        let later = t0() + ChronoDuration::days(3);
        assert_eq!(h.monitor(None).escalate_unconfirmed(later).await, 0);
        assert_eq!(h.book.get(&id).unwrap().status, TradeStatus::PaymentClaimed);

        let monitor = h.monitor(Some(60));
        assert_eq!(
            monitor
                .escalate_unconfirmed(t0() + ChronoDuration::minutes(59))
                .await,
            0
        );
        assert_eq!(monitor.escalate_unconfirmed(later).await, 1);

        let trade = h.book.get(&id).unwrap();
        assert_eq!(trade.status, TradeStatus::Disputed);
        assert_eq!(trade.dispute_reason.as_deref(), Some(GRACE_DISPUTE_REASON));
    }

    #[tokio::test]
    async fn test_huge_grace_period_is_skipped() {
        let h = Harness::new();
        let id = h.create();
        h.book
            .transition(&id, &Actor::User(UserId::from("buyer")), TradeAction::MarkPaid, t0())
            .unwrap();

        let monitor = h.monitor(Some(u64::MAX));
        assert_eq!(monitor.escalate_unconfirmed(t0() + ChronoDuration::days(3)).await, 0);
        assert_eq!(h.book.get(&id).unwrap().status, TradeStatus::PaymentClaimed);
        assert!(grace_cutoff(t0(), 60).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_expires_on_tick() {
        let h = Harness::new();
        let id = h.create();
        let clock = Arc::new(ManualClock::new(t0() + ChronoDuration::hours(1)));
        let fanout = NotificationFanout::new(
            FanoutConfig::default(),
            h.transport.clone(),
            Arc::new(StaticProfiles::new()),
        );
        let monitor = Arc::new(DeadlineMonitor::new(
            DeadlineConfig::default(),
            h.book.clone(),
            Arc::new(fanout),
            clock,
        ));

        let handle = tokio::spawn(monitor.run());
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();

        assert_eq!(h.book.get(&id).unwrap().status, TradeStatus::Expired);
    }
}

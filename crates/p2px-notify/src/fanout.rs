//! Notification fanout.
//!
//! One event per party for every committed trade change. Each event carries
//! the other party's display info and a deep link so the recipient needs no
//! follow-up lookup. Buyer is notified first, then seller. Delivery failures
//! and timeouts are logged and counted, never returned.

use std::time::Duration;

use p2px_core::{
    CounterpartInfo, NotificationEvent, NotificationKind, NotificationPayload, Role, Trade,
    UserId,
};
use p2px_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::profile::{counterpart_info, DynProfileDirectory, Profile};
use crate::transport::DynNotificationTransport;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Root of the web app, used to build trade deep links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on a single transport emit.
    #[serde(default = "default_emit_timeout_ms")]
    pub emit_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_emit_timeout_ms() -> u64 {
    2_000
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            emit_timeout_ms: default_emit_timeout_ms(),
        }
    }
}

/// Delivery summary of one `notify_both` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct NotificationFanout {
    config: FanoutConfig,
    transport: DynNotificationTransport,
    profiles: DynProfileDirectory,
}

impl NotificationFanout {
    pub fn new(
        config: FanoutConfig,
        transport: DynNotificationTransport,
        profiles: DynProfileDirectory,
    ) -> Self {
        Self {
            config,
            transport,
            profiles,
        }
    }

    /// Deep link to a trade.
    pub fn trade_link(&self, trade: &Trade) -> String {
        format!(
            "{}/trades/{}",
            self.config.base_url.trim_end_matches('/'),
            trade.id
        )
    }

    /// Emit `kind` to buyer and seller of `trade`.
    ///
    /// Call only after the change to `trade` is committed.
    pub async fn notify_both(
        &self,
        trade: &Trade,
        kind: NotificationKind,
        details: Option<serde_json::Value>,
    ) -> FanoutReport {
        let buyer = counterpart_info(&trade.buyer_id, self.lookup_profile(&trade.buyer_id).await);
        let seller = counterpart_info(&trade.seller_id, self.lookup_profile(&trade.seller_id).await);
        let link = self.trade_link(trade);

        let mut report = FanoutReport::default();
        for (role, counterpart) in [(Role::Buyer, seller), (Role::Seller, buyer)] {
            let event = build_event(trade, kind, role, counterpart, link.clone(), details.clone());
            if self.deliver(event).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    /// Profile lookup under the emit timeout. A slow directory degrades to
    /// the raw user id.
    async fn lookup_profile(&self, user: &UserId) -> Option<Profile> {
        let timeout = Duration::from_millis(self.config.emit_timeout_ms);
        match tokio::time::timeout(timeout, self.profiles.profile(user)).await {
            Ok(profile) => profile,
            Err(_) => {
                Metrics::notification_failed("profile_lookup", "timeout");
                warn!(%user, ?timeout, "Profile lookup timed out");
                None
            }
        }
    }

    async fn deliver(&self, event: NotificationEvent) -> bool {
        let kind = event.kind.as_str();
        let recipient = event.recipient_id.clone();
        let trade_id = event.payload.trade_id;
        let timeout = Duration::from_millis(self.config.emit_timeout_ms);

        match tokio::time::timeout(timeout, self.transport.emit(event)).await {
            Ok(Ok(())) => {
                Metrics::notification_sent(kind);
                debug!(%trade_id, %recipient, kind, "Notification emitted");
                true
            }
            Ok(Err(e)) => {
                Metrics::notification_failed(kind, "error");
                warn!(%trade_id, %recipient, kind, error = %e, "Notification transport failed");
                false
            }
            Err(_) => {
                Metrics::notification_failed(kind, "timeout");
                warn!(%trade_id, %recipient, kind, ?timeout, "Notification transport timed out");
                false
            }
        }
    }
}

// ============================================================================
// Message rendering
// ============================================================================

fn build_event(
    trade: &Trade,
    kind: NotificationKind,
    recipient_role: Role,
    counterpart: CounterpartInfo,
    link: String,
    details: Option<serde_json::Value>,
) -> NotificationEvent {
    let recipient_id = match recipient_role {
        Role::Buyer => trade.buyer_id.clone(),
        Role::Seller => trade.seller_id.clone(),
    };
    NotificationEvent {
        recipient_id,
        kind,
        title: title(kind).to_string(),
        message: message(trade, kind, recipient_role, &counterpart.display_name),
        payload: NotificationPayload {
            trade_id: trade.id,
            counterpart,
            link,
            details,
        },
    }
}

fn title(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::TradeCreated => "New trade",
        NotificationKind::PaymentClaimed => "Payment marked as sent",
        NotificationKind::AssetReleased => "Crypto released",
        NotificationKind::TradeCompleted => "Trade completed",
        NotificationKind::TradeExpired => "Trade expired",
        NotificationKind::TradeCancelled => "Trade cancelled",
        NotificationKind::TradeDisputed => "Trade disputed",
        NotificationKind::DisputeResolved => "Dispute resolved",
    }
}

fn message(trade: &Trade, kind: NotificationKind, role: Role, counterpart: &str) -> String {
    let crypto = format!("{} {}", trade.crypto_amount, trade.crypto_symbol);
    let fiat = format!("{} {}", trade.fiat_amount.round_cents(), trade.fiat_currency);

    match (kind, role) {
        (NotificationKind::TradeCreated, Role::Buyer) => format!(
            "You are buying {crypto} from {counterpart} for {fiat}. Send payment before {}.",
            trade.payment_deadline.format("%Y-%m-%d %H:%M UTC")
        ),
        (NotificationKind::TradeCreated, Role::Seller) => format!(
            "You are selling {crypto} to {counterpart} for {fiat}. Wait for their payment before releasing."
        ),
        (NotificationKind::PaymentClaimed, Role::Buyer) => {
            format!("You marked {fiat} as sent. Waiting for {counterpart} to confirm receipt.")
        }
        (NotificationKind::PaymentClaimed, Role::Seller) => format!(
            "{counterpart} marked {fiat} as sent. Confirm receipt to release {crypto}."
        ),
        (NotificationKind::AssetReleased, Role::Buyer) => {
            format!("{counterpart} released {crypto} to you.")
        }
        (NotificationKind::AssetReleased, Role::Seller) => {
            format!("You released {crypto} to {counterpart}.")
        }
        (NotificationKind::TradeCompleted, _) => {
            format!("Your trade of {crypto} for {fiat} with {counterpart} is complete.")
        }
        (NotificationKind::TradeExpired, _) => format!(
            "Your trade with {counterpart} expired because payment was not marked before the deadline."
        ),
        (NotificationKind::TradeCancelled, _) => {
            format!("Your trade of {crypto} with {counterpart} was cancelled.")
        }
        (NotificationKind::TradeDisputed, _) => match trade.dispute_reason.as_deref() {
            Some(reason) => format!("Your trade with {counterpart} is under dispute: {reason}"),
            None => format!("Your trade with {counterpart} is under dispute."),
        },
        (NotificationKind::DisputeResolved, _) => format!(
            "The dispute on your trade with {counterpart} was resolved. Trade is now {}.",
            trade.status
        ),
    }
}

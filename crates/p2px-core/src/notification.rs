//! Notification events emitted on trade state changes.

use crate::ids::{TradeId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of trade event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TradeCreated,
    PaymentClaimed,
    AssetReleased,
    TradeCompleted,
    TradeExpired,
    TradeCancelled,
    TradeDisputed,
    DisputeResolved,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TradeCreated => "trade_created",
            Self::PaymentClaimed => "payment_claimed",
            Self::AssetReleased => "asset_released",
            Self::TradeCompleted => "trade_completed",
            Self::TradeExpired => "trade_expired",
            Self::TradeCancelled => "trade_cancelled",
            Self::TradeDisputed => "trade_disputed",
            Self::DisputeResolved => "dispute_resolved",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display information for the other party of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartInfo {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Structured payload attached to each event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub trade_id: TradeId,
    pub counterpart: CounterpartInfo,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// One event addressed to one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: NotificationPayload,
}

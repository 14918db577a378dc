//! Escrow session state embedded in a trade.

use crate::ids::TradeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker recorded on a session whose trade ended while custody was in flight.
pub const ORPHANED_MARKER: &str = "orphaned: trade no longer active";

/// Custody session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    #[default]
    NotRequested,
    Requested,
    Active,
    Failed,
}

impl EscrowStatus {
    /// Returns true if a new custody request may be issued.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotRequested | Self::Failed)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotRequested => "not_requested",
            Self::Requested => "requested",
            Self::Active => "active",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Custody arrangement for one trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSession {
    pub trade_id: TradeId,
    pub seller_pub_key: Option<String>,
    pub buyer_pub_key: Option<String>,
    /// Reference returned by custody. Kept even when the session is orphaned.
    pub custody_ref: Option<String>,
    pub status: EscrowStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EscrowSession {
    pub fn new(trade_id: TradeId, now: DateTime<Utc>) -> Self {
        Self {
            trade_id,
            seller_pub_key: None,
            buyer_pub_key: None,
            custody_ref: None,
            status: EscrowStatus::NotRequested,
            attempts: 0,
            last_error: None,
            updated_at: now,
        }
    }

    /// Returns true if the session was abandoned because its trade ended.
    pub fn is_orphaned(&self) -> bool {
        self.status == EscrowStatus::Failed && self.last_error.as_deref() == Some(ORPHANED_MARKER)
    }
}

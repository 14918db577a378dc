//! Trade aggregate and its status machine.

use crate::decimal::{CryptoAmount, FiatAmount, UnitPrice};
use crate::escrow::EscrowSession;
use crate::ids::{OfferId, TradeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade lifecycle status.
///
/// ```text
/// Pending ──> PaymentClaimed ──> Released ──> Completed
///    │              │               ^
///    │              └──> Disputed ──┤ (admin)
///    ├──> Cancelled <───────────────┘ (admin)
///    └──> Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    #[default]
    Pending,
    PaymentClaimed,
    Released,
    Completed,
    Expired,
    Cancelled,
    Disputed,
}

impl TradeStatus {
    /// Returns true if no transition may leave this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Cancelled)
    }

    /// Returns true if buyer or seller may still act on the trade.
    #[must_use]
    pub fn accepts_party_actions(&self) -> bool {
        matches!(self, Self::Pending | Self::PaymentClaimed)
    }

    /// Returns true if the edge `self -> next` exists in the status machine.
    ///
    /// Who may take the edge is decided by the trade book.
    #[must_use]
    pub fn can_transition_to(&self, next: TradeStatus) -> bool {
        use TradeStatus::*;
        matches!(
            (self, next),
            (Pending, PaymentClaimed)
                | (Pending, Cancelled)
                | (Pending, Expired)
                | (PaymentClaimed, Released)
                | (PaymentClaimed, Disputed)
                | (Released, Completed)
                | (Disputed, Released)
                | (Disputed, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PaymentClaimed => "payment_claimed",
            Self::Released => "released",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the offer the requester took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    /// Offer owner sells crypto; the seller publishes payment instructions.
    SellSide,
    /// Offer owner buys crypto.
    BuySide,
}

/// Role of a participant in a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Seller => write!(f, "seller"),
        }
    }
}

/// Who is performing an action on a trade.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Actor {
    /// A user acting through the desk.
    User(UserId),
    /// Background jobs (deadline monitor, grace policy).
    System,
    /// Custody confirming settlement.
    Custody,
    /// Administrative override.
    Admin,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::System => write!(f, "system"),
            Self::Custody => write!(f, "custody"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Authoritative trade record.
///
/// Identity and economic fields are fixed at creation. Only `status`,
/// `escrow` and the bookkeeping timestamps change afterwards, and only
/// through the trade book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub offer_id: OfferId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub side: TradeSide,
    pub crypto_symbol: String,
    pub fiat_currency: String,
    pub fiat_amount: FiatAmount,
    pub crypto_amount: CryptoAmount,
    pub unit_price: UnitPrice,
    pub payment_method_label: String,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment_deadline: DateTime<Utc>,
    pub payment_claimed_at: Option<DateTime<Utc>>,
    pub dispute_reason: Option<String>,
    pub buyer_pub_key: Option<String>,
    pub seller_pub_key: Option<String>,
    pub escrow: Option<EscrowSession>,
    /// Incremented on every accepted mutation.
    pub version: u64,
}

impl Trade {
    /// Role of `user` in this trade, if they participate.
    pub fn role_of(&self, user: &UserId) -> Option<Role> {
        if *user == self.buyer_id {
            Some(Role::Buyer)
        } else if *user == self.seller_id {
            Some(Role::Seller)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user: &UserId) -> bool {
        self.role_of(user).is_some()
    }

    /// The other party from `role`'s point of view.
    pub fn counterpart_of(&self, role: Role) -> &UserId {
        match role {
            Role::Buyer => &self.seller_id,
            Role::Seller => &self.buyer_id,
        }
    }

    /// Returns true if the trade is still pending and its deadline has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TradeStatus::Pending && now > self.payment_deadline
    }
}

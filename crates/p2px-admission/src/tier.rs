//! Verification tier limit table.
//!
//! Pure lookup, no I/O. Amounts are in the fiat unit of the trade being
//! admitted; currency conversion is out of scope.

use p2px_core::FiatAmount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trading ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    Bounded(FiatAmount),
    Unbounded,
}

impl Limit {
    fn bounded(value: i64) -> Self {
        Self::Bounded(FiatAmount::new(Decimal::from(value)))
    }

    /// Returns true if `amount` stays within the ceiling (inclusive).
    #[inline]
    pub fn allows(&self, amount: FiatAmount) -> bool {
        match self {
            Self::Bounded(cap) => amount <= *cap,
            Self::Unbounded => true,
        }
    }

    pub fn cap(&self) -> Option<FiatAmount> {
        match self {
            Self::Bounded(cap) => Some(*cap),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(cap) => write!(f, "{cap}"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Trading ceilings and permissions of one verification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationTier {
    pub level: u8,
    pub daily_limit: Limit,
    pub per_trade_limit: Limit,
    pub lifetime_limit: Limit,
    pub can_create_offers: bool,
    pub can_trade: bool,
}

/// Look up the tier for `level`.
///
/// Unknown levels resolve to level 0, never to an unlimited tier.
pub fn limits_for(level: u8) -> VerificationTier {
    match level {
        1 => VerificationTier {
            level: 1,
            daily_limit: Limit::bounded(1_000),
            per_trade_limit: Limit::bounded(500),
            lifetime_limit: Limit::bounded(5_000),
            can_create_offers: false,
            can_trade: true,
        },
        2 => VerificationTier {
            level: 2,
            daily_limit: Limit::Unbounded,
            per_trade_limit: Limit::bounded(100_000),
            lifetime_limit: Limit::Unbounded,
            can_create_offers: true,
            can_trade: true,
        },
        3 => VerificationTier {
            level: 3,
            daily_limit: Limit::Unbounded,
            per_trade_limit: Limit::bounded(1_000_000),
            lifetime_limit: Limit::Unbounded,
            can_create_offers: true,
            can_trade: true,
        },
        _ => VerificationTier {
            level: 0,
            daily_limit: Limit::bounded(0),
            per_trade_limit: Limit::bounded(0),
            lifetime_limit: Limit::bounded(0),
            can_create_offers: false,
            can_trade: false,
        },
    }
}

/// Returns true if `level` may take part in trades.
#[inline]
pub fn can_trade(level: u8) -> bool {
    limits_for(level).can_trade
}

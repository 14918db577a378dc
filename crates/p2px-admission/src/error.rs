//! Admission error types.
//!
//! Messages are shown to the requester as-is.

use p2px_core::FiatAmount;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("You cannot trade against your own offer")]
    SelfTrade,

    #[error("This offer is not available in your jurisdiction ({jurisdiction})")]
    RestrictedJurisdiction { jurisdiction: String },

    #[error("Identity verification is required before trading (current level {level})")]
    VerificationRequired { level: u8 },

    #[error("Amount {amount} is outside the offer range {min} - {max}")]
    AmountOutOfRange {
        amount: FiatAmount,
        min: FiatAmount,
        max: FiatAmount,
    },

    #[error("Amount {amount} exceeds your per-trade limit of {limit}")]
    PerTradeLimitExceeded { amount: FiatAmount, limit: FiatAmount },

    #[error("Amount {amount} would exceed your daily limit of {limit} ({used} already used today)")]
    DailyLimitExceeded {
        amount: FiatAmount,
        used: FiatAmount,
        limit: FiatAmount,
    },

    #[error("Amount {amount} would exceed your lifetime limit of {limit} ({used} already used)")]
    LifetimeLimitExceeded {
        amount: FiatAmount,
        used: FiatAmount,
        limit: FiatAmount,
    },
}

impl AdmissionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SelfTrade => "self_trade",
            Self::RestrictedJurisdiction { .. } => "restricted_jurisdiction",
            Self::VerificationRequired { .. } => "verification_required",
            Self::AmountOutOfRange { .. } => "amount_out_of_range",
            Self::PerTradeLimitExceeded { .. } => "per_trade_limit_exceeded",
            Self::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            Self::LifetimeLimitExceeded { .. } => "lifetime_limit_exceeded",
        }
    }
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;

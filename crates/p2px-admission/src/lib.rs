//! Verification tier limits and the trade admission gate.
//!
//! - `tier`: fixed per-level trading ceilings
//! - `gate`: ordered, side-effect free admission checks

pub mod error;
pub mod gate;
pub mod tier;

pub use error::{AdmissionError, AdmissionResult};
pub use gate::{admit, AdmissionDecision, RequesterSnapshot, TradeRequest};
pub use tier::{can_trade, limits_for, Limit, VerificationTier};

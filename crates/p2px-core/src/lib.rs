//! Core domain types for the p2px trade and escrow coordinator.
//!
//! This crate provides the types shared by every other crate:
//! - `FiatAmount`, `CryptoAmount`, `UnitPrice`: precision-safe numerics
//! - `TradeId`, `UserId`, `OfferId`, `PaymentMethodId`: identifiers
//! - `Offer`, `Trade`, `TradeStatus`: the catalog input and the trade aggregate
//! - `EscrowSession`: custody state embedded in a trade
//! - `NotificationEvent`: what the fanout emits
//! - `Clock`: injectable time source

pub mod clock;
pub mod decimal;
pub mod error;
pub mod escrow;
pub mod ids;
pub mod notification;
pub mod offer;
pub mod payment;
pub mod trade;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decimal::{CryptoAmount, FiatAmount, UnitPrice};
pub use error::{CoreError, Result};
pub use escrow::{EscrowSession, EscrowStatus, ORPHANED_MARKER};
pub use ids::{OfferId, PaymentMethodId, TradeId, UserId};
pub use notification::{CounterpartInfo, NotificationEvent, NotificationKind, NotificationPayload};
pub use offer::{CountryRestriction, Direction, Offer};
pub use payment::{PaymentInstructions, PaymentMethod};
pub use trade::{Actor, Role, Trade, TradeSide, TradeStatus};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

//! Trade desk.
//!
//! Ties admission, the trade book, escrow, payment handoff and notifications
//! into one command surface, and runs the periodic deadline, retry and
//! settlement tasks.
//!
//! - `ports`: contracts for offer catalog, usage ledger, payment methods and
//!   the trade channel
//! - `memory`: in-memory implementations of those contracts
//! - `handoff`: at-most-once payment instruction publishing
//! - `deadline`: expiry of overdue trades
//! - `sweep`: retry sweep for failed escrow sessions and queued handoffs
//! - `settlement`: completion of released trades
//! - `desk`: `TradeDesk`

pub mod deadline;
pub mod desk;
pub mod error;
pub mod handoff;
pub mod memory;
pub mod ports;
pub mod settlement;
pub mod sweep;

pub use deadline::{DeadlineConfig, DeadlineMonitor, GRACE_DISPUTE_REASON};
pub use desk::{Caller, TradeDesk};
pub use error::{CollaboratorError, DeskError, DeskResult, HandoffError};
pub use handoff::{HandoffOutcome, PaymentHandoff};
pub use memory::{
    InMemoryChannel, InMemoryLedger, InMemoryOffers, InMemoryPaymentMethods, PostedMessage,
};
pub use ports::{
    DynOfferLookup, DynPaymentMethodStore, DynTradeChannel, DynUsageLedger, MessageContent,
    OfferLookup, PaymentMethodStore, PortResult, TradeChannel, UsageLedger,
};
pub use settlement::{SettlementConfig, SettlementReport, SettlementWatcher};
pub use sweep::{RetryConfig, RetrySweep, SweepReport};

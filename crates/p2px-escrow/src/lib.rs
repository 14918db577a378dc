//! Custody escrow for custody-eligible trades.
//!
//! - `custody`: custody service contract and a scripted mock
//! - `client`: reqwest implementation of the contract (open, settlement query)
//! - `keys`: wallet public-key lookup
//! - `coordinator`: opens escrows off the trade-creation path and records
//!   outcomes on the trade's escrow session

pub mod client;
pub mod coordinator;
pub mod custody;
pub mod error;
pub mod keys;

pub use client::HttpCustodyClient;
pub use coordinator::{EscrowConfig, EscrowCoordinator, InitiationOutcome, SkipReason};
pub use custody::{
    CustodyReceipt, CustodyService, DynCustodyService, EscrowRequest, MockCustody, SettlementStatus,
};
pub use error::{CustodyError, EscrowError, EscrowResult};
pub use keys::{DynPublicKeyProvider, PublicKeyProvider, StaticKeys};

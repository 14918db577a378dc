//! Trade record manager.
//!
//! Owns the authoritative trade records and applies status transitions as
//! per-trade compare-and-set operations.

pub mod action;
pub mod book;
pub mod error;

pub use action::{Resolution, TradeAction};
pub use book::{CustodyView, TradeBook};
pub use error::{BookError, BookResult};

//! Integration tests for p2px-desk.
//!
//! These drive the full desk stack against in-memory collaborators:
//! - Trade creation through admission, escrow and handoff
//! - Party actions racing the deadline monitor
//! - Degraded custody

pub mod common;

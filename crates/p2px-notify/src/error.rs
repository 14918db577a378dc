//! Notification error types.

use thiserror::Error;

/// Failure to hand an event to the delivery transport.
///
/// Logged and counted by the fanout, never returned to the caller of a
/// state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("transport rejected event: {0}")]
    Rejected(String),
}

//! Prometheus metrics and structured logging for p2px.
//!
//! - Prometheus counters and histograms for admission, transitions, escrow,
//!   payment handoff and notification delivery
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;

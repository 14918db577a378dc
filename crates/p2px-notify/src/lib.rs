//! Trade notifications.
//!
//! - `transport`: delivery contract plus broadcast and recording sinks
//! - `profile`: counterpart display info
//! - `fanout`: per-party event construction and best-effort delivery

pub mod error;
pub mod fanout;
pub mod profile;
pub mod transport;

pub use error::TransportError;
pub use fanout::{FanoutConfig, FanoutReport, NotificationFanout};
pub use profile::{DynProfileDirectory, Profile, ProfileDirectory, StaticProfiles};
pub use transport::{
    BroadcastTransport, DynNotificationTransport, NotificationTransport, RecordingTransport,
};

//! Notification delivery transports.
//!
//! Durable delivery (push, email, in-app inbox) lives outside this system.
//! A transport only has to accept the event.

use std::sync::Arc;

use p2px_core::{BoxFuture, NotificationEvent};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::TransportError;

/// Trait for notification sinks.
pub trait NotificationTransport: Send + Sync {
    fn emit(&self, event: NotificationEvent) -> BoxFuture<'_, Result<(), TransportError>>;
}

pub type DynNotificationTransport = Arc<dyn NotificationTransport>;

/// Publishes events on a `tokio::sync::broadcast` channel.
///
/// Having no subscribers is normal and not an error.
#[derive(Debug, Clone)]
pub struct BroadcastTransport {
    tx: broadcast::Sender<NotificationEvent>,
}

impl BroadcastTransport {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }
}

impl NotificationTransport for BroadcastTransport {
    fn emit(&self, event: NotificationEvent) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            match self.tx.send(event) {
                Ok(receivers) => trace!(receivers, "Notification broadcast"),
                Err(_) => trace!("No notification subscribers"),
            }
            Ok(())
        })
    }
}

/// Records emitted events; optionally fails every emit.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<NotificationEvent>>,
    fail_with: Mutex<Option<TransportError>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent emit fail with `err` (None restores success).
    pub fn set_failure(&self, err: Option<TransportError>) {
        *self.fail_with.lock() = err;
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl NotificationTransport for RecordingTransport {
    fn emit(&self, event: NotificationEvent) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            let failure = self.fail_with.lock().clone();
            if let Some(err) = failure {
                return Err(err);
            }
            self.events.lock().push(event);
            Ok(())
        })
    }
}

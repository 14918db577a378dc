//! Main application wiring.

use std::sync::Arc;
use std::time::Duration;

use p2px_book::TradeBook;
use p2px_core::{Clock, SystemClock};
use p2px_desk::{
    DeadlineMonitor, InMemoryChannel, InMemoryLedger, InMemoryOffers, InMemoryPaymentMethods,
    PaymentHandoff, RetrySweep, SettlementWatcher, TradeDesk,
};
use p2px_escrow::{EscrowCoordinator, HttpCustodyClient, StaticKeys};
use p2px_notify::{BroadcastTransport, NotificationFanout, StaticProfiles};
use p2px_telemetry::Metrics;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Main application.
pub struct Application {
    config: AppConfig,
    desk: Arc<TradeDesk>,
    monitor: Arc<DeadlineMonitor>,
    sweep: Arc<RetrySweep>,
    settlement: Arc<SettlementWatcher>,
    transport: BroadcastTransport,
}

impl Application {
    /// Build every component from configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let book = Arc::new(TradeBook::new());

        let offers = Arc::new(InMemoryOffers::new());
        for offer in &config.seed.offers {
            offers.insert(offer.clone())?;
        }
        let methods = Arc::new(InMemoryPaymentMethods::new());
        for method in &config.seed.payment_methods {
            methods.add(method.clone());
        }

        let custody = Arc::new(HttpCustodyClient::new(
            &config.escrow.custody_url,
            config.escrow.request_timeout(),
        )?);
        let coordinator = Arc::new(EscrowCoordinator::new(
            config.escrow.clone(),
            book.clone(),
            custody.clone(),
            Arc::new(StaticKeys::new()),
            clock.clone(),
        ));

        let transport = BroadcastTransport::new(config.notification_capacity);
        let fanout = Arc::new(NotificationFanout::new(
            config.fanout.clone(),
            Arc::new(transport.clone()),
            Arc::new(StaticProfiles::new()),
        ));

        let handoff = Arc::new(PaymentHandoff::new(
            book.clone(),
            methods,
            Arc::new(InMemoryChannel::new()),
        ));
        let monitor = Arc::new(DeadlineMonitor::new(
            config.deadline.clone(),
            book.clone(),
            fanout.clone(),
            clock.clone(),
        ));
        let sweep = Arc::new(RetrySweep::new(
            config.retry.clone(),
            book.clone(),
            coordinator.clone(),
            handoff.clone(),
        ));
        let settlement = Arc::new(SettlementWatcher::new(
            config.settlement.clone(),
            book.clone(),
            custody,
            fanout.clone(),
            clock.clone(),
        ));
        let desk = Arc::new(TradeDesk::new(
            offers,
            Arc::new(InMemoryLedger::new()),
            book,
            coordinator,
            handoff,
            fanout,
            clock,
        ));

        info!(
            offers = config.seed.offers.len(),
            payment_methods = config.seed.payment_methods.len(),
            custody_url = %config.escrow.custody_url,
            eligible = ?config.escrow.eligible_symbols,
            "Application initialized"
        );

        Ok(Self {
            config,
            desk,
            monitor,
            sweep,
            settlement,
            transport,
        })
    }

    /// The command surface, for embedding front ends.
    pub fn desk(&self) -> Arc<TradeDesk> {
        Arc::clone(&self.desk)
    }

    /// Run background tasks until ctrl-c.
    pub async fn run(self) -> AppResult<()> {
        info!("Starting application");

        let monitor_handle = tokio::spawn(Arc::clone(&self.monitor).run());
        let sweep_handle = tokio::spawn(Arc::clone(&self.sweep).run());
        let settlement_handle = tokio::spawn(Arc::clone(&self.settlement).run());
        let log_handle = tokio::spawn(log_notifications(self.transport.subscribe()));

        let metrics_every = self.config.telemetry.metrics_log_interval_ms;
        let mut metrics_interval =
            tokio::time::interval(Duration::from_millis(metrics_every.max(1)));

        loop {
            tokio::select! {
                _ = metrics_interval.tick(), if metrics_every > 0 => {
                    match Metrics::render() {
                        Ok(text) => debug!(metrics = %text, "Metrics snapshot"),
                        Err(e) => warn!(error = %e, "Failed to render metrics"),
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!(trades = self.desk.book().len(), "Shutting down");
        monitor_handle.abort();
        sweep_handle.abort();
        settlement_handle.abort();
        log_handle.abort();

        Ok(())
    }
}

/// Log every emitted notification. Stands in for the push/email service.
async fn log_notifications(mut rx: broadcast::Receiver<p2px_core::NotificationEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => info!(
                recipient = %event.recipient_id,
                kind = event.kind.as_str(),
                trade_id = %event.payload.trade_id,
                title = %event.title,
                "Notification"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Notification log lagging");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

//! Application configuration.

use crate::error::{AppError, AppResult};
use p2px_core::{Offer, PaymentMethod};
use p2px_desk::{DeadlineConfig, RetryConfig, SettlementConfig};
use p2px_escrow::EscrowConfig;
use p2px_notify::FanoutConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// How often the metrics snapshot is logged (ms). 0 disables it.
    #[serde(default = "default_metrics_log_interval_ms")]
    pub metrics_log_interval_ms: u64,
}

fn default_metrics_log_interval_ms() -> u64 {
    300_000
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            metrics_log_interval_ms: default_metrics_log_interval_ms(),
        }
    }
}

/// Static data loaded into the in-memory collaborators at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub escrow: EscrowConfig,
    #[serde(default)]
    pub fanout: FanoutConfig,
    #[serde(default)]
    pub deadline: DeadlineConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    /// Capacity of the notification broadcast channel.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_notification_capacity() -> usize {
    1_024
}

/// Longest accepted dispute grace period: one year.
const MAX_DISPUTE_GRACE_MINUTES: u64 = 525_600;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            escrow: EscrowConfig::default(),
            fanout: FanoutConfig::default(),
            deadline: DeadlineConfig::default(),
            retry: RetryConfig::default(),
            settlement: SettlementConfig::default(),
            telemetry: TelemetryConfig::default(),
            seed: SeedConfig::default(),
            notification_capacity: default_notification_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.escrow.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "escrow.request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.deadline.check_interval_ms == 0
            || self.retry.interval_ms == 0
            || self.settlement.interval_ms == 0
        {
            return Err(AppError::Config(
                "monitor intervals must be positive".to_string(),
            ));
        }
        if self.settlement.query_timeout_ms == 0 {
            return Err(AppError::Config(
                "settlement.query_timeout_ms must be positive".to_string(),
            ));
        }
        if let Some(grace) = self.deadline.dispute_grace_minutes {
            if grace > MAX_DISPUTE_GRACE_MINUTES {
                return Err(AppError::Config(format!(
                    "deadline.dispute_grace_minutes must be at most {MAX_DISPUTE_GRACE_MINUTES}"
                )));
            }
        }
        if self.notification_capacity == 0 {
            return Err(AppError::Config(
                "notification_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.escrow.request_timeout_ms, 10_000);
        assert_eq!(config.escrow.eligible_symbols, vec!["BTC".to_string()]);
        assert_eq!(config.deadline.check_interval_ms, 30_000);
        assert_eq!(config.deadline.dispute_grace_minutes, None);
        assert!(config.retry.enabled);
        assert!(config.settlement.enabled);
        assert_eq!(config.settlement.interval_ms, 15_000);
        assert_eq!(config.notification_capacity, 1_024);
        assert!(config.seed.offers.is_empty());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [escrow]
            eligible_symbols = ["BTC", "ETH"]
            request_timeout_ms = 2500

            [deadline]
            dispute_grace_minutes = 120

            [[seed.offers]]
            id = "offer-1"
            owner_id = "seller"
            direction = "sell"
            crypto_symbol = "BTC"
            fiat_currency = "EUR"
            unit_price = "60000"
            min_amount = "20"
            max_amount = "1500"
            payment_method_label = "sepa"
            time_limit_minutes = 30
            country_restrictions = { mode = "exclude", countries = ["KP"] }
            "#,
        )
        .unwrap();

        assert_eq!(config.escrow.eligible_symbols.len(), 2);
        assert_eq!(config.escrow.max_attempts, 5);
        assert_eq!(config.deadline.dispute_grace_minutes, Some(120));
        assert_eq!(config.seed.offers[0].time_limit_minutes, 30);
        assert!(config.seed.offers[0]
            .country_restrictions
            .excludes(Some("kp")));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = AppConfig::from_toml("[escrow]\nrequest_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = AppConfig::from_toml("[settlement]\nquery_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_oversized_grace_period_rejected() {
        let err =
            AppConfig::from_toml("[deadline]\ndispute_grace_minutes = 600000\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let config = AppConfig::from_toml("[deadline]\ndispute_grace_minutes = 525600\n").unwrap();
        assert_eq!(config.deadline.dispute_grace_minutes, Some(525_600));
    }
}

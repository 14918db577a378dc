//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Escrow error: {0}")]
    Escrow(#[from] p2px_escrow::EscrowError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] p2px_telemetry::TelemetryError),

    #[error("Seed data rejected: {0}")]
    Seed(#[from] p2px_core::CoreError),
}

pub type AppResult<T> = Result<T, AppError>;

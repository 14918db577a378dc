//! Escrow error types.

use p2px_book::BookError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single custody request.
///
/// Never fatal to the trade: the coordinator records it on the escrow
/// session and the request is retried out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("custody request timed out after {0:?}")]
    Timeout(Duration),

    #[error("custody returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("custody network error: {0}")]
    Network(String),

    #[error("custody response could not be decoded: {0}")]
    Decode(String),
}

impl CustodyError {
    /// Metrics label for the failure.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Http { status, .. } if *status < 500 => "http_4xx",
            Self::Http { .. } => "http_5xx",
            Self::Network(_) => "network",
            Self::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error(transparent)]
    Book(#[from] BookError),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type EscrowResult<T> = Result<T, EscrowError>;

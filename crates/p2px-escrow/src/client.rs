//! HTTP client for the custody service.
//!
//! `POST {base_url}/escrows` with a JSON [`EscrowRequest`] body; a 2xx
//! response carries `{"custody_ref": "..."}`.
//!
//! `GET {base_url}/escrows/{custody_ref}` answers
//! `{"status": "open" | "settled"}`.

use std::time::Duration;

use p2px_core::BoxFuture;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::custody::{CustodyReceipt, CustodyService, EscrowRequest, SettlementStatus};
use crate::error::{CustodyError, EscrowError, EscrowResult};

/// reqwest-backed custody client.
pub struct HttpCustodyClient {
    client: Client,
    escrows_url: String,
    timeout: Duration,
}

impl HttpCustodyClient {
    /// Create a new custody client.
    ///
    /// # Arguments
    /// * `base_url` - custody service root (e.g., "https://custody.internal")
    /// * `timeout` - per-request timeout applied by the HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> EscrowResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EscrowError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            escrows_url: format!("{}/escrows", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    async fn post_escrow(&self, request: EscrowRequest) -> Result<CustodyReceipt, CustodyError> {
        debug!(trade_id = %request.trade_id, url = %self.escrows_url, "Requesting escrow");

        let response = self
            .client
            .post(&self.escrows_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::check_status(response)
            .await?
            .json::<CustodyReceipt>()
            .await
            .map_err(|e| CustodyError::Decode(e.to_string()))
    }

    async fn get_settlement(&self, custody_ref: &str) -> Result<SettlementStatus, CustodyError> {
        let url = format!("{}/{}", self.escrows_url, custody_ref);
        debug!(%custody_ref, %url, "Querying escrow settlement");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::check_status(response)
            .await?
            .json::<SettlementResponse>()
            .await
            .map(|body| body.status)
            .map_err(|e| CustodyError::Decode(e.to_string()))
    }

    fn send_error(&self, e: reqwest::Error) -> CustodyError {
        if e.is_timeout() {
            CustodyError::Timeout(self.timeout)
        } else {
            CustodyError::Network(e.to_string())
        }
    }

    async fn check_status(response: Response) -> Result<Response, CustodyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CustodyError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SettlementResponse {
    status: SettlementStatus,
}

impl CustodyService for HttpCustodyClient {
    fn request_escrow(
        &self,
        request: EscrowRequest,
    ) -> BoxFuture<'_, Result<CustodyReceipt, CustodyError>> {
        Box::pin(self.post_escrow(request))
    }

    fn settlement_status<'a>(
        &'a self,
        custody_ref: &'a str,
    ) -> BoxFuture<'a, Result<SettlementStatus, CustodyError>> {
        Box::pin(self.get_settlement(custody_ref))
    }
}

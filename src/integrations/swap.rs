//! Token swap service client
//!
//! The swap service reads the token contract from a chart page URL and swaps
//! the requested amount of SEI for it.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Spoken when the service fails without saying why
pub const GENERIC_SWAP_FAILURE: &str = "the swap service did not return a transaction";

/// Client for the swap service
#[derive(Debug, Clone)]
pub struct SwapClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

/// Swap request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// Chart page the token is read from
    pub dex_screener_url: String,
    /// Amount of SEI to swap
    pub amount_sei: f64,
}

/// Successful swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    pub tx_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SwapClient {
    /// Create a new swap client
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Execute a swap
    ///
    /// Success requires a `txHash` in the response body. Otherwise the
    /// server's `error` string is returned verbatim, or a generic message if
    /// it gave none.
    ///
    /// # Errors
    ///
    /// Returns `Error::Swap` if the service rejected the swap and
    /// `Error::Connectivity` if it could not be reached
    pub async fn swap(&self, request: &SwapRequest) -> Result<SwapReceipt> {
        let url = format!("{}/swap", self.base_url);
        tracing::info!(
            url = request.dex_screener_url,
            amount = request.amount_sei,
            "requesting swap"
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Connectivity(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<SwapResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(SwapResponse {
                tx_hash: Some(tx_hash),
                ..
            }) if status.is_success() && !tx_hash.is_empty() => {
                tracing::info!(tx_hash, "swap executed");
                Ok(SwapReceipt { tx_hash })
            }
            Some(SwapResponse {
                error: Some(error), ..
            }) if !error.is_empty() => {
                tracing::warn!(%status, error, "swap rejected");
                Err(Error::Swap(error))
            }
            _ => {
                tracing::warn!(%status, body, "swap failed without reason");
                Err(Error::Swap(GENERIC_SWAP_FAILURE.to_string()))
            }
        }
    }
}

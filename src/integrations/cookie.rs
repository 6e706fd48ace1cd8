//! Agent analytics backend client
//!
//! Typed client for the companion REST API that proxies agent and tweet
//! lookups. The base URL already includes any `/api` prefix.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::advisor::AgentMetrics;
use crate::{Error, Result};

/// Client for the agent analytics backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// HTTP client
    client: Client,
    /// Base URL for the backend API
    base_url: String,
    /// Optional API key sent as `x-api-key`
    api_key: Option<String>,
    /// Timeout of regular requests
    request_timeout: Duration,
}

/// Agent record returned by the backend
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Display name
    #[serde(default)]
    pub agent_name: String,
    /// Numeric metrics; absent fields are zero
    #[serde(flatten)]
    pub metrics: AgentMetrics,
}

/// Tweet returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(default)]
    pub author_username: String,
    #[serde(default)]
    pub text: String,
}

/// Backend response envelope: `{ "ok": … }` on success
#[derive(Deserialize)]
struct Envelope<T> {
    ok: Option<T>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the backend API (e.g., <http://localhost:5002/api>)
    /// * `api_key` - Optional API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Set the timeout of regular requests
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Base URL requests are made against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, url: &str, timeout: Duration) -> RequestBuilder {
        let req = self.client.get(url).timeout(timeout);
        match &self.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        }
    }

    /// Liveness check against the base URL
    ///
    /// Any HTTP response counts as alive; only transport failures fail.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connectivity` if the backend cannot be reached in time
    pub async fn health(&self, timeout: Duration) -> Result<()> {
        let response = self
            .get(&self.base_url, timeout)
            .send()
            .await
            .map_err(|e| Error::Connectivity(format!("{}: {e}", self.base_url)))?;

        tracing::debug!(status = %response.status(), "backend reachable");
        Ok(())
    }

    /// Agent by social username
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend has no data
    pub async fn agent(&self, username: &str) -> Result<Agent> {
        let url = format!("{}/agents/{}", self.base_url, encode_segment(username));
        self.fetch_ok(&url, &[]).await
    }

    /// Agent by token contract address
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend has no data
    pub async fn agent_by_contract(&self, address: &str) -> Result<Agent> {
        let url = format!(
            "{}/agents/contractAddress/{}",
            self.base_url,
            encode_segment(address)
        );
        self.fetch_ok(&url, &[]).await
    }

    /// Tweets matching a query, optionally bounded by dates
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid
    pub async fn search(
        &self,
        query: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Tweet>> {
        let url = format!("{}/search/{}", self.base_url, encode_segment(query));

        let mut params = Vec::new();
        if let Some(from) = from {
            params.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = to {
            params.push(("to", to.format("%Y-%m-%d").to_string()));
        }

        self.fetch_ok(&url, &params).await
    }

    async fn fetch_ok<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!(url, "backend request");

        let response = self
            .get(url, self.request_timeout)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    Error::Connectivity(format!("{url}: {e}"))
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(describe_failure(status, &body)));
        }

        let envelope: Envelope<T> = response.json().await?;
        envelope.ok.ok_or_else(|| {
            Error::Backend(
                envelope
                    .error
                    .map_or_else(|| "no data found".to_string(), |e| error_text(&e)),
            )
        })
    }
}

/// Percent-encode a value used as one path segment
fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").map(error_text))
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        return "rate limit exceeded, try again later".to_string();
    }
    if detail.is_empty() {
        format!("backend returned {status}")
    } else {
        format!("backend returned {status}: {detail}")
    }
}

/// Error payloads are either a string or `{ "errorMessage": … }`
fn error_text(value: &serde_json::Value) -> String {
    value
        .as_str()
        .map(ToString::to_string)
        .or_else(|| {
            value
                .get("errorMessage")
                .and_then(|m| m.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("alice"), "alice");
        assert_eq!(encode_segment("ai agents"), "ai%20agents");
        assert_eq!(encode_segment("a/b?c"), "a%2Fb%3Fc");
    }

    #[test]
    fn test_error_text_shapes() {
        assert_eq!(error_text(&serde_json::json!("boom")), "boom");
        assert_eq!(
            error_text(&serde_json::json!({"errorMessage": "unknown agent"})),
            "unknown agent"
        );
    }

    #[test]
    fn test_describe_failure() {
        assert_eq!(
            describe_failure(StatusCode::NOT_FOUND, r#"{"success":false,"error":"not found"}"#),
            "backend returned 404 Not Found: not found"
        );
        assert_eq!(
            describe_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            "rate limit exceeded, try again later"
        );
    }

    #[test]
    fn test_agent_deserializes_with_missing_metrics() {
        let agent: Agent = serde_json::from_value(serde_json::json!({
            "agentName": "Cookie",
            "mindshare": 3.2,
            "marketCap": 1_000_000.0
        }))
        .unwrap();

        assert_eq!(agent.agent_name, "Cookie");
        assert!((agent.metrics.mindshare - 3.2).abs() < f64::EPSILON);
        assert!(agent.metrics.liquidity.abs() < f64::EPSILON);
    }
}

//! HTTP client for the prediction service, used by the companion CLI.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{PrecipResponse, RainResponse};

/// Request timeout applied to every call.
const TIMEOUT: Duration = Duration::from_secs(15);

/// Error body shape the service returns for 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base: base.into(), http })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub async fn health(&self) -> Result<Value> {
        self.get_json("/health/", &[]).await
    }

    /// Service metadata from the root route.
    pub async fn about(&self) -> Result<Value> {
        self.get_json("/", &[]).await
    }

    pub async fn rain(&self, date: NaiveDate) -> Result<RainResponse> {
        let body = self
            .get_json("/predict/rain/", &[("date", date.format("%Y-%m-%d").to_string())])
            .await?;

        serde_json::from_value(body).context("Failed to parse rain prediction response")
    }

    pub async fn precipitation(&self, date: NaiveDate) -> Result<PrecipResponse> {
        let body = self
            .get_json(
                "/predict/precipitation/fall/",
                &[("date", date.format("%Y-%m-%d").to_string())],
            )
            .await?;

        serde_json::from_value(body).context("Failed to parse precipitation response")
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = endpoint_url(&self.base, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach the prediction service at {url}"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;

        if !status.is_success() {
            // Prefer the service's own {error} message when it sent one.
            let detail = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) => truncate_body(&body),
            };
            return Err(anyhow!("Request to {url} failed with status {status}: {detail}"));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse JSON from {url}"))
    }
}

fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_without_double_slashes() {
        assert_eq!(
            endpoint_url("http://127.0.0.1:8000/", "/health/"),
            "http://127.0.0.1:8000/health/"
        );
        assert_eq!(
            endpoint_url("http://127.0.0.1:8000", "/predict/rain/"),
            "http://127.0.0.1:8000/predict/rain/"
        );
    }

    #[test]
    fn truncate_body_caps_long_payloads() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert!(truncated.len() <= 203);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn unreachable_service_reports_a_connection_error() {
        // Port 9 (discard) is never serving HTTP locally.
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = client.health().await.unwrap_err();
        assert!(err.to_string().contains("Failed to reach the prediction service"));
    }
}

//! HTTP utilities for Proxmox VE REST API calls

use super::request::{Method, RequestValues};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Transport settings for [`PveHttpClient`]
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Pre-issued API token as `USER@REALM!TOKENID=SECRET`
    pub api_token: Option<String>,
    /// Accept self-signed certificates (the default for fresh PVE installs)
    pub insecure: bool,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

/// HTTP client wrapper for PVE API calls
#[derive(Clone)]
pub struct PveHttpClient {
    client: Client,
}

impl PveHttpClient {
    /// Create a new HTTP client
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &options.api_token {
            let mut value = HeaderValue::from_str(&format!("PVEAPIToken={}", token))
                .context("API token contains invalid header characters")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .user_agent(concat!("pvectl/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .danger_accept_invalid_certs(options.insecure);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a request and unwrap the `data` envelope
    ///
    /// `GET` and `DELETE` carry values as query parameters, `POST` and `PUT`
    /// as a form body.
    pub async fn request(&self, method: Method, url: &str, values: &RequestValues) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let request = match method {
            Method::Get => self.client.get(url).query(values.pairs()),
            Method::Delete => self.client.delete(url).query(values.pairs()),
            Method::Post => self.client.post(url).form(values.pairs()),
            Method::Put => self.client.put(url).form(values.pairs()),
        };

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!("API request failed: {}", status));
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        let mut envelope: Value =
            serde_json::from_str(&body).context("Failed to parse response JSON")?;

        Ok(envelope
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

/// Format an API error for display
/// Maps well-known status codes to short, actionable messages
pub fn format_api_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    if error_str.contains("401") {
        return "Authentication failed. Check the configured API token.".to_string();
    }
    if error_str.contains("403") {
        return "Permission denied. Check the API token's privileges.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("400") {
        return "Invalid request. Check your parameters.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "PVE API temporarily unavailable. Please try again.".to_string();
    }
    if error_str.contains("596") {
        return "Node unreachable from the cluster.".to_string();
    }

    if error_str.contains("API request failed") {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

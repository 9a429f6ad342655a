//! PVE Client
//!
//! Main client for the Proxmox VE API, combining the configured host,
//! API token and HTTP functionality.

use super::http::{HttpOptions, PveHttpClient};
use super::request::{Method, RequestValues};
use super::RequestSender;
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Main PVE client
#[derive(Clone)]
pub struct PveClient {
    pub http: PveHttpClient,
    base_url: Url,
}

impl PveClient {
    /// Create a new client for `host` (e.g. `https://pve1.lan:8006`)
    pub fn new(host: &str, options: &HttpOptions) -> Result<Self> {
        let base_url = Self::base_url_for(host)?;
        let http = PveHttpClient::new(options)?;

        Ok(Self { http, base_url })
    }

    /// Create a client from the effective configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let host = config
            .effective_host()
            .context("No PVE host configured. Set PVE_HOST or use --host")?;

        let options = HttpOptions {
            api_token: config.effective_api_token(),
            insecure: config.insecure,
            timeout: Some(Duration::from_secs(config.effective_timeout_secs())),
        };

        Self::new(&host, &options)
    }

    fn base_url_for(host: &str) -> Result<Url> {
        let mut url = Url::parse(host).with_context(|| format!("Invalid PVE host: {}", host))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("Unsupported scheme for PVE host: {}", url.scheme()));
        }
        url.set_path("/api2/json/");
        url.set_query(None);
        Ok(url)
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Base URL all API paths are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an API path such as `cluster/resources`
    pub fn api_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid API path: {}", path))
    }
}

#[async_trait]
impl RequestSender for PveClient {
    async fn send(&self, method: Method, path: &str, values: &RequestValues) -> Result<Value> {
        let url = self.api_url(path)?;
        self.http.request(method, url.as_str(), values).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_replaces_path() {
        let client = PveClient::new("https://pve1.lan:8006/some/ui?x=1", &HttpOptions::default())
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://pve1.lan:8006/api2/json/");
    }

    #[test]
    fn test_api_url_joins_relative_paths() {
        let client = PveClient::new("https://pve1.lan:8006", &HttpOptions::default()).unwrap();
        let url = client.api_url("/nodes/pve1/lxc/101/config").unwrap();
        assert_eq!(
            url.as_str(),
            "https://pve1.lan:8006/api2/json/nodes/pve1/lxc/101/config"
        );
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(PveClient::new("ftp://pve1.lan", &HttpOptions::default()).is_err());
        assert!(PveClient::new("not a url", &HttpOptions::default()).is_err());
    }
}

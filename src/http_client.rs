use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, Proxy, StatusCode};
use std::time::Duration;
use url::Url;

use crate::config::{Credentials, RunConfig};
use crate::errors::{ScanError, ScanResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A fully-read 200 response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// GET-only client shared by both platform scanners for one run.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    /// Build the client, routing everything through `proxy` when given.
    /// A bad proxy is reported here, before any request goes out.
    pub fn new(proxy: Option<&str>, timeout: Duration) -> ScanResult<Self> {
        let mut builder = ClientBuilder::new()
            // Timeouts
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))

            // Compression
            .gzip(true)
            .brotli(true)

            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT);

        if let Some(proxy_url) = proxy {
            builder = builder.proxy(socks5_proxy(proxy_url)?);
        }

        let client = builder.build().map_err(ScanError::ClientBuild)?;
        Ok(Self { client })
    }

    pub fn from_config(cfg: &RunConfig) -> ScanResult<Self> {
        Self::new(cfg.proxy(), cfg.timeout())
    }

    /// Plain GET; anything but 200 is an error.
    pub async fn get(&self, url: &str) -> ScanResult<FetchResponse> {
        self.send(url, self.client.get(url)).await
    }

    /// GET against a JSON API with Basic Auth.
    pub async fn get_api(&self, url: &str, creds: &Credentials) -> ScanResult<FetchResponse> {
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .basic_auth(&creds.username, Some(&creds.api_key));
        self.send(url, request).await
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> ScanResult<FetchResponse> {
        tracing::debug!(%url, "GET");
        let resp = request.send().await.map_err(|source| ScanError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ScanError::UnexpectedStatus { url: url.to_string(), status: status.as_u16() });
        }

        // Read the body here so the connection is released on every path.
        let body = resp.text().await.map_err(|source| ScanError::Transport {
            url: url.to_string(),
            source,
        })?;
        let response = FetchResponse { status: status.as_u16(), body };
        tracing::debug!(%url, status = response.status, bytes = response.body.len(), "response");
        Ok(response)
    }
}

fn socks5_proxy(proxy_url: &str) -> ScanResult<Proxy> {
    let invalid = |reason: String| ScanError::InvalidProxy { url: proxy_url.to_string(), reason };

    let parsed = Url::parse(proxy_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "socks5" | "socks5h") {
        return Err(invalid(format!("unsupported scheme '{}', expected socks5", parsed.scheme())));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".into()));
    }

    Proxy::all(parsed.as_str()).map_err(|e| invalid(format!("failed to create SOCKS5 proxy dialer: {}", e)))
}

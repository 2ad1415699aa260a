use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::app::Result;
use crate::fetcher::{FetchResponse, Fetcher};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const USER_AGENT: &str = concat!("modempoll/", env!("CARGO_PKG_VERSION"));

/// [`Fetcher`] backed by a `reqwest` client.
///
/// Wrap a client from [`crate::tls::TrustedClientBuilder`] with
/// [`HttpFetcher::from_client`] to poll devices with self-signed certificates.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .gzip(true)
            .brotli(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let parsed = Url::parse(url)?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchResponse {
            url: url.to_string(),
            status,
            headers,
            body,
        })
    }
}

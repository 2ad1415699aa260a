use std::sync::Arc;

use reqwest::Client;

use crate::app::error::{PollerError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::{FetchResult, ParallelFetcher};
use crate::fetcher::Fetcher;
use crate::probe::is_port_reachable;
use crate::tls::TrustedClientBuilder;

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub parallel_fetcher: ParallelFetcher,
}

impl AppContext {
    /// Load `~/.config/modempoll/config.toml` and wire everything from it.
    pub fn load() -> Result<Self> {
        Self::new(Config::load()?)
    }

    pub fn new(config: Config) -> Result<Self> {
        let client = Self::http_client(&config)?;
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::from_client(client));
        Self::with_fetcher(config, fetcher)
    }

    /// Use a caller-provided fetcher instead of building one from the
    /// TLS settings.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher.clone(), config.fetch.concurrency)?;

        Ok(Self {
            config,
            fetcher,
            parallel_fetcher,
        })
    }

    /// Client trusting the system roots plus every configured PEM file.
    pub fn http_client(config: &Config) -> Result<Client> {
        let mut pems = Vec::with_capacity(config.tls.trusted_certificates.len());
        for path in &config.tls.trusted_certificates {
            let pem = std::fs::read(path).map_err(|e| PollerError::CertificateFile {
                path: path.clone(),
                source: e,
            })?;
            pems.push(pem);
        }

        TrustedClientBuilder::new()
            .trust_pems(pems)
            .verify_hostname(config.tls.verify_hostname)
            .timeout(config.fetch.timeout())
            .connect_timeout(config.fetch.connect_timeout())
            .user_agent(config.fetch.user_agent.clone())
            .build()
    }

    pub async fn poll<I, S>(&self, urls: I) -> Vec<FetchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parallel_fetcher.fetch_all(urls).await
    }

    pub async fn probe(&self, host: &str, port: u16) -> bool {
        is_port_reachable(host, port, self.config.probe.timeout()).await
    }
}

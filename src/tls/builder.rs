use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use rustls::crypto::CryptoProvider;
use rustls::ClientConfig;

use crate::app::{Result, TrustError};
use crate::fetcher::http_fetcher::USER_AGENT;
use crate::tls::{TrustPolicy, TrustSet};

/// Builds a `reqwest` client that trusts the system roots plus extra PEM
/// certificates.
///
/// rustls cannot extend its built-in verifier with additional anchors, so
/// automatic verification is swapped for [`TrustPolicy`], which performs
/// the same chain validation against the extended set. That is the only
/// thing that makes the swap safe; do not relax the policy.
pub struct TrustedClientBuilder {
    pems: Vec<Vec<u8>>,
    system_roots: bool,
    verify_hostname: bool,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: String,
}

impl Default for TrustedClientBuilder {
    fn default() -> Self {
        Self {
            pems: Vec::new(),
            system_roots: true,
            verify_hostname: false,
            timeout: None,
            connect_timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl TrustedClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trust_pem(mut self, pem: impl AsRef<[u8]>) -> Self {
        self.pems.push(pem.as_ref().to_vec());
        self
    }

    pub fn trust_pems<I, P>(mut self, pems: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        self.pems
            .extend(pems.into_iter().map(|p| p.as_ref().to_vec()));
        self
    }

    /// Start from the platform roots (default) or from nothing.
    pub fn system_roots(mut self, enabled: bool) -> Self {
        self.system_roots = enabled;
        self
    }

    pub fn verify_hostname(mut self, enabled: bool) -> Self {
        self.verify_hostname = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Assemble the trust set. Fails on the first blob that cannot be
    /// appended.
    pub fn trust_set(&self) -> std::result::Result<TrustSet, TrustError> {
        let mut set = if self.system_roots {
            TrustSet::system()
        } else {
            TrustSet::empty()
        };

        for (index, pem) in self.pems.iter().enumerate() {
            set.append_pem(index, pem)?;
        }

        Ok(set)
    }

    /// rustls configuration with [`TrustPolicy`] as the certificate verifier.
    pub fn tls_config(&self) -> std::result::Result<ClientConfig, TrustError> {
        let set = self.trust_set()?;
        let anchors = set.len();
        let appended = set.appended();

        let provider = default_provider();
        let policy = TrustPolicy::new(set.freeze(), provider.clone())
            .with_hostname_check(self.verify_hostname);

        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(policy))
            .with_no_client_auth();

        tracing::info!(
            "Built TLS trust set with {} anchors ({} caller-supplied)",
            anchors,
            appended
        );

        Ok(config)
    }

    pub fn build(self) -> Result<Client> {
        let tls = self.tls_config()?;

        let mut builder = Client::builder()
            .use_preconfigured_tls(tls)
            .gzip(true)
            .brotli(true)
            .user_agent(self.user_agent);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

/// Client trusting the system roots plus `trusted_pems`.
///
/// Returns [`TrustError::CertificateAppend`] (wrapped in
/// [`crate::app::PollerError::Tls`]) and no client if any blob is malformed.
pub fn build_client<P: AsRef<[u8]>>(trusted_pems: &[P]) -> Result<Client> {
    TrustedClientBuilder::new().trust_pems(trusted_pems).build()
}

/// The provider the builder uses, for callers assembling their own
/// [`TrustPolicy`].
pub fn default_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

//! # modempoll
//!
//! Network plumbing for polling statistics from devices such as cable
//! modems.
//!
//! ## Modules
//!
//! - [`fetcher`]: bounded-concurrency HTTP fetching
//! - [`tls`]: clients trusting system roots plus device certificates
//! - [`probe`]: TCP reachability checks
//! - [`modem`]: the trait device stat parsers implement
//! - [`config`]: `~/.config/modempoll/config.toml`
//! - [`app`]: context wiring and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modempoll::fetcher::parallel::fetch_all;
//! use modempoll::fetcher::http_fetcher::HttpFetcher;
//! use modempoll::tls::build_client;
//!
//! let client = build_client(&[std::fs::read("modem.pem")?])?;
//! let fetcher = Arc::new(HttpFetcher::from_client(client));
//! let mut results = fetch_all(urls, 4, Some(fetcher)).await?;
//! results.sort_by_key(|r| r.index);
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) builds the TLS client and fetch pool
/// from [`Config`](config::Config).
pub mod app;

/// Configuration loaded from `~/.config/modempoll/config.toml`.
pub mod config;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for a single GET
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): semaphore-bounded batches
/// - [`fetch_timed`](fetcher::timed::fetch_timed): single GET with elapsed time
pub mod fetcher;

pub mod modem;

pub mod probe;

/// Tracing subscriber setup.
pub mod telemetry;

/// Trust-extended TLS clients.
///
/// - [`TrustedClientBuilder`](tls::TrustedClientBuilder): reqwest client with extra trust anchors
/// - [`TrustPolicy`](tls::TrustPolicy): the certificate check used for every handshake
pub mod tls;

//! HTTP clients for devices with self-signed or private-CA certificates.
//!
//! ```rust,ignore
//! use modempoll::tls::build_client;
//!
//! let modem_ca = std::fs::read("/etc/modempoll/modem-ca.pem")?;
//! let client = build_client(&[modem_ca])?;
//! ```

mod builder;
mod policy;
mod trust_set;

pub use builder::{build_client, default_provider, TrustedClientBuilder};
pub use policy::{find_trust_error, TrustPolicy};
pub use trust_set::TrustSet;

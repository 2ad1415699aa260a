use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum PollerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Concurrency limit must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("Permit pool closed")]
    PermitPoolClosed,

    #[error("Fetch task failed: {0}")]
    TaskJoin(String),

    #[error("TLS error: {0}")]
    Tls(#[from] TrustError),

    #[error("Failed to read certificate file {path}: {source}")]
    CertificateFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Device error: {0}")]
    Device(String),
}

/// Failures of trust-set construction and of the per-handshake
/// certificate check.
#[derive(Error, Debug)]
pub enum TrustError {
    #[error("failed to append trusted certificate #{index}: {reason}")]
    CertificateAppend { index: usize, reason: String },

    #[error("no certificates provided by peer")]
    NoCertificate,

    #[error("failed to parse certificate: {0}")]
    CertificateParse(webpki::Error),

    #[error("certificate verification failed: {0}")]
    CertificateVerification(webpki::Error),

    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),
}

pub type Result<T> = std::result::Result<T, PollerError>;

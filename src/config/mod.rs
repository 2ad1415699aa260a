//! Configuration for the poller.
//!
//! Read from `~/.config/modempoll/config.toml`. If the file doesn't exist, a
//! default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::http_fetcher::USER_AGENT;
use crate::fetcher::parallel::DEFAULT_WORKERS;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub tls: TlsConfig,
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum requests in flight (default: 10)
    pub concurrency: usize,

    /// Whole-request timeout in seconds (default: 10)
    pub timeout_secs: u64,

    /// Connect timeout in seconds (default: 5)
    pub connect_timeout_secs: u64,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_WORKERS,
            timeout_secs: 10,
            connect_timeout_secs: 5,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// PEM files trusted in addition to the system roots
    pub trusted_certificates: Vec<PathBuf>,

    /// Require the certificate to name the host (default: false)
    pub verify_hostname: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// TCP connect timeout in seconds (default: 5)
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// Creates a commented default file when none exists. Missing fields use
    /// default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/modempoll/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("modempoll").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!("Created default config at {}", path.display());
        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# modempoll configuration

[fetch]
# Maximum number of requests in flight at once
concurrency = 10

# Per-request timeouts in seconds
timeout_secs = 10
connect_timeout_secs = 5

[tls]
# Extra PEM certificates to trust on top of the system roots, e.g. the
# self-signed certificate of a modem's web interface
trusted_certificates = []

# Also require the certificate to match the host name
verify_hostname = false

[probe]
# TCP reachability check timeout in seconds
timeout_secs = 5
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config = toml::from_str(Config::default_config_content())
            .expect("Default config should be valid TOML");

        assert_eq!(config.fetch.concurrency, 10);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert!(config.tls.trusted_certificates.is_empty());
        assert!(!config.tls.verify_hostname);
        assert_eq!(config.probe.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[fetch]
concurrency = 3

[tls]
trusted_certificates = ["/etc/modempoll/modem.pem"]
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.fetch.concurrency, 3);
        assert_eq!(
            config.tls.trusted_certificates,
            vec![PathBuf::from("/etc/modempoll/modem.pem")]
        );
        // Defaults for the rest
        assert_eq!(config.fetch.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.fetch.user_agent, USER_AGENT);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.fetch.concurrency, DEFAULT_WORKERS);
        assert_eq!(config.probe.timeout_secs, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[probe]\ntimeout_secs = 2\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.probe.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\nconcurrency = \"many\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_create_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default_config(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.fetch.concurrency, DEFAULT_WORKERS);
    }
}

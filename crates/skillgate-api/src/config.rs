//! Configuration management for the skillgate HTTP boundary.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use skillgate_verify::{
    ChainPolicy, FetchConfig, TimestampPolicy, UrlPolicy, VerifierConfig,
};

const CONFIG_FILE: &str = "config.toml";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// The defaults carry the platform's production values; only deployment
/// specifics (bind address, application id) normally need overriding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Verification
    /// Symmetric timestamp tolerance in seconds.
    ///
    /// Environment variable: `TIMESTAMP_TOLERANCE_SECONDS`
    #[serde(default = "default_tolerance_seconds", alias = "TIMESTAMP_TOLERANCE_SECONDS")]
    pub timestamp_tolerance_seconds: u64,
    /// Required host of the signing-certificate chain URL.
    ///
    /// Environment variable: `CERTIFICATE_HOST`
    #[serde(default = "default_certificate_host", alias = "CERTIFICATE_HOST")]
    pub certificate_host: String,
    /// Required first path component of the chain URL.
    ///
    /// Environment variable: `CERTIFICATE_PATH_ROOT`
    #[serde(default = "default_certificate_path_root", alias = "CERTIFICATE_PATH_ROOT")]
    pub certificate_path_root: String,
    /// Domain that must appear in the leaf certificate's SANs.
    ///
    /// Environment variable: `EXPECTED_SAN`
    #[serde(default = "default_expected_san", alias = "EXPECTED_SAN")]
    pub expected_san: String,
    /// Certificate fetch timeout in seconds.
    ///
    /// Environment variable: `FETCH_TIMEOUT_SECONDS`
    #[serde(default = "default_fetch_timeout", alias = "FETCH_TIMEOUT_SECONDS")]
    pub fetch_timeout_seconds: u64,
    /// When set, authenticated requests must carry this application id.
    ///
    /// Environment variable: `EXPECTED_APPLICATION_ID`
    #[serde(default, alias = "EXPECTED_APPLICATION_ID")]
    pub expected_application_id: Option<String>,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Converts to the verification pipeline's configuration.
    pub fn to_verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            timestamp: TimestampPolicy::new(Duration::from_secs(
                self.timestamp_tolerance_seconds,
            )),
            url: UrlPolicy {
                host: self.certificate_host.clone(),
                path_root: self.certificate_path_root.clone(),
                ..UrlPolicy::default()
            },
            fetch: FetchConfig {
                timeout: Duration::from_secs(self.fetch_timeout_seconds),
                ..FetchConfig::default()
            },
            chain: ChainPolicy {
                expected_san: self.expected_san.clone(),
                ..ChainPolicy::default()
            },
            expected_application_id: self.expected_application_id.clone(),
        }
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.timestamp_tolerance_seconds == 0 {
            anyhow::bail!("timestamp_tolerance_seconds must be greater than 0");
        }

        if self.certificate_host.is_empty() {
            anyhow::bail!("certificate_host must not be empty");
        }

        if self.certificate_path_root.is_empty() {
            anyhow::bail!("certificate_path_root must not be empty");
        }

        if self.expected_san.is_empty() {
            anyhow::bail!("expected_san must not be empty");
        }

        if self.fetch_timeout_seconds == 0 {
            anyhow::bail!("fetch_timeout_seconds must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            timestamp_tolerance_seconds: default_tolerance_seconds(),
            certificate_host: default_certificate_host(),
            certificate_path_root: default_certificate_path_root(),
            expected_san: default_expected_san(),
            fetch_timeout_seconds: default_fetch_timeout(),
            expected_application_id: None,
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_tolerance_seconds() -> u64 {
    150
}

fn default_certificate_host() -> String {
    "s3.amazonaws.com".to_string()
}

fn default_certificate_path_root() -> String {
    "echo-api".to_string()
}

fn default_expected_san() -> String {
    "echo-api.amazon.com".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

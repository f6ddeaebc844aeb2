//! Client configuration.
//!
//! Defaults suit a production network. Override through a TOML document,
//! environment variables or explicit construction.

use std::time::Duration;

use serde::Deserialize;
use spclient_auth::AddressingStyle;
use spclient_transport::RetryPolicy;

/// Highest piece index accepted by a challenge, inclusive.
pub const DEFAULT_ENCODE_SHARDS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Addressing {
    #[default]
    Path,
    VirtualHost,
}

impl Addressing {
    pub fn style(self) -> AddressingStyle {
        match self {
            Addressing::Path => AddressingStyle::Path,
            Addressing::VirtualHost => AddressingStyle::VirtualHost,
        }
    }
}

impl std::str::FromStr for Addressing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(Addressing::Path),
            "virtual-host" | "virtual_host" | "virtualhost" => Ok(Addressing::VirtualHost),
            other => Err(format!("unknown addressing style {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Use `https://` for provider endpoints registered without a scheme.
    pub secure: bool,
    pub addressing: Addressing,
    /// Per-attempt timeout.
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub retry_jitter_ms: u64,
    pub retry_statuses: Vec<u16>,
    /// Highest accepted challenge piece index.
    pub encode_shards: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            secure: true,
            addressing: Addressing::Path,
            timeout_secs: 30,
            max_attempts: 3,
            retry_base_ms: 100,
            retry_max_ms: 5_000,
            retry_jitter_ms: 50,
            retry_statuses: vec![429, 503],
            encode_shards: DEFAULT_ENCODE_SHARDS,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPCLIENT_SECURE` (default: `true`)
    /// - `SPCLIENT_ADDRESSING` (`path` or `virtual-host`, default: `path`)
    /// - `SPCLIENT_TIMEOUT_SECS` (default: 30)
    /// - `SPCLIENT_MAX_ATTEMPTS` (default: 3)
    /// - `SPCLIENT_RETRY_BASE_MS` (default: 100)
    /// - `SPCLIENT_ENCODE_SHARDS` (default: 6)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = env_parse(&lookup, "SPCLIENT_SECURE", parse_bool)? {
            config.secure = v;
        }
        if let Some(v) = env_parse(&lookup, "SPCLIENT_ADDRESSING", str::parse::<Addressing>)? {
            config.addressing = v;
        }
        if let Some(v) = env_parse(&lookup, "SPCLIENT_TIMEOUT_SECS", parse_num)? {
            config.timeout_secs = v;
        }
        if let Some(v) = env_parse(&lookup, "SPCLIENT_MAX_ATTEMPTS", parse_num)? {
            config.max_attempts = v;
        }
        if let Some(v) = env_parse(&lookup, "SPCLIENT_RETRY_BASE_MS", parse_num)? {
            config.retry_base_ms = v;
        }
        if let Some(v) = env_parse(&lookup, "SPCLIENT_ENCODE_SHARDS", parse_num)? {
            config.encode_shards = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".to_string()));
        }
        if self.retry_max_ms < self.retry_base_ms {
            return Err(ConfigError::Invalid(
                "retry_max_ms must not be below retry_base_ms".to_string(),
            ));
        }
        if let Some(bad) = self.retry_statuses.iter().find(|s| !(100..=599).contains(*s)) {
            return Err(ConfigError::Invalid(format!("retry status {bad} is not an HTTP status")));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .max_attempts(self.max_attempts)
            .base_delay(Duration::from_millis(self.retry_base_ms))
            .max_delay(Duration::from_millis(self.retry_max_ms))
            .jitter(Duration::from_millis(self.retry_jitter_ms))
            .retry_statuses(self.retry_statuses.clone())
    }
}

fn env_parse<F, T>(
    lookup: &F,
    var: &'static str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse(raw.trim())
            .map(Some)
            .map_err(|reason| ConfigError::InvalidValue {
                var,
                value: raw,
                reason,
            }),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got {other}")),
    }
}

fn parse_num<T: std::str::FromStr>(s: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    s.parse().map_err(|e: T::Err| e.to_string())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid TOML configuration: {0}")]
    Toml(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

//! Configuration management for the checker harness.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `CHECKER_SERVICE_NAME` - Optional. Name of the checked service. Defaults to `kvstore`.
//! - `CHECKER_LOG_SINK` - Optional. `json` (one JSON record per line on stdout) or
//!   `tracing` (records become tracing events). Defaults to `json`.
//! - `CHECKER_HTTP_TIMEOUT_SECS` - Optional. Timeout of the checker's HTTP client. Defaults to `10`.
//! - `CHECKER_SERVICE_PORT` - Optional. Port the checked service listens on. Defaults to `8080`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::logging::{JsonLinesSink, LogSink, TracingSink};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Destination of structured task records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogSinkKind {
    /// JSON lines on stdout
    #[default]
    Json,
    /// Events on the process-wide tracing subscriber
    Tracing,
}

impl LogSinkKind {
    pub fn build(&self) -> Arc<dyn LogSink> {
        match self {
            LogSinkKind::Json => Arc::new(JsonLinesSink::stdout()),
            LogSinkKind::Tracing => Arc::new(TracingSink),
        }
    }
}

impl FromStr for LogSinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogSinkKind::Json),
            "tracing" => Ok(LogSinkKind::Tracing),
            other => Err(format!("unknown log sink '{}', expected 'json' or 'tracing'", other)),
        }
    }
}

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Name of the service being checked
    pub service_name: String,

    /// Where task records go
    pub log_sink: LogSinkKind,

    /// Timeout applied by the checker's HTTP client
    pub http_timeout: Duration,

    /// Port of the checked service on each team's address
    pub service_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            service_name: "kvstore".to_string(),
            log_sink: LogSinkKind::Json,
            http_timeout: Duration::from_secs(10),
            service_port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "PORT", defaults.port)?;
        let service_name = lookup("CHECKER_SERVICE_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.service_name);
        let log_sink = parse_var(&lookup, "CHECKER_LOG_SINK", defaults.log_sink)?;
        let http_timeout = Duration::from_secs(parse_var(
            &lookup,
            "CHECKER_HTTP_TIMEOUT_SECS",
            defaults.http_timeout.as_secs(),
        )?);
        let service_port = parse_var(&lookup, "CHECKER_SERVICE_PORT", defaults.service_port)?;

        Ok(Self {
            host,
            port,
            service_name,
            log_sink,
            http_timeout,
            service_port,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

//! Configuration management for FlowState.
//!
//! Configuration can be set via environment variables:
//! - `GEMINI_API_KEY` - Required (falls back to `API_KEY`). Key for the Generative Language API.
//! - `FLOWSTATE_MODEL` - Optional. Extraction model. Defaults to `gemini-2.5-flash`.
//! - `FLOWSTATE_API_BASE` - Optional. API base URL. Defaults to the public v1beta endpoint.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `HOURLY_RATE` - Optional. Budget rate per estimated hour. Defaults to `150`.
//! - `EXTRACTION_TIMEOUT_SECS` - Optional. Extraction request timeout. Defaults to `60`.
//! - `EXTRACTION_MAX_RETRIES` - Optional. Retries for transient errors. Defaults to `0`.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::budget::DEFAULT_HOURLY_RATE;
use crate::extraction::DEFAULT_MODEL;
use crate::llm::DEFAULT_API_BASE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Extraction service configuration.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Generative Language API key
    pub api_key: String,

    /// Model identifier (e.g. `gemini-2.5-flash`)
    pub model: String,

    /// API base URL
    pub api_base: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retry budget for transient errors
    pub max_retries: u32,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub extraction: ExtractionConfig,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Budget rate per estimated hour
    pub hourly_rate: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no API key is set, and
    /// `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` (environment or a test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model = lookup("FLOWSTATE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = lookup("FLOWSTATE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_var(&lookup, "PORT", 3000u16)?;
        let hourly_rate = parse_var(&lookup, "HOURLY_RATE", DEFAULT_HOURLY_RATE)?;
        let timeout_secs = parse_var(&lookup, "EXTRACTION_TIMEOUT_SECS", 60u64)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "EXTRACTION_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let max_retries = parse_var(&lookup, "EXTRACTION_MAX_RETRIES", 0u32)?;

        Ok(Self {
            extraction: ExtractionConfig {
                api_key,
                model,
                api_base,
                timeout: Duration::from_secs(timeout_secs),
                max_retries,
            },
            host,
            port,
            hourly_rate,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: String) -> Self {
        Self {
            extraction: ExtractionConfig {
                api_key,
                model: DEFAULT_MODEL.to_string(),
                api_base: DEFAULT_API_BASE.to_string(),
                timeout: Duration::from_secs(60),
                max_retries: 0,
            },
            host: "127.0.0.1".to_string(),
            port: 3000,
            hourly_rate: DEFAULT_HOURLY_RATE,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
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
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

//! Errors from the extraction service and the retry policy applied to them.
//!
//! Transient kinds (rate limits, 5xx, transport failures) may be retried when a
//! retry budget is configured. Everything else fails the attempt immediately.

use std::fmt;
use std::time::Duration;

/// Upper bound for any single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// What went wrong talking to the model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx or an unexpected status
    ServerError,
    /// HTTP 4xx other than 429 (bad key, bad request, unknown model)
    ClientError,
    NetworkError,
    /// Request exceeded the configured timeout
    Timeout,
    /// Provider answered 2xx with a body we could not read
    ParseError,
}

impl LlmErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, LlmErrorKind::ClientError | LlmErrorKind::ParseError)
    }

    fn base_delay(self) -> Duration {
        match self {
            LlmErrorKind::RateLimited => Duration::from_secs(5),
            LlmErrorKind::ServerError => Duration::from_secs(2),
            _ => Duration::from_secs(1),
        }
    }

    fn label(self) -> &'static str {
        match self {
            LlmErrorKind::RateLimited => "Rate limited",
            LlmErrorKind::ServerError => "Server error",
            LlmErrorKind::ClientError => "Client error",
            LlmErrorKind::NetworkError => "Network error",
            LlmErrorKind::Timeout => "Timeout",
            LlmErrorKind::ParseError => "Parse error",
        }
    }
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a non-success HTTP status to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}

/// A failed provider call.
#[derive(Debug)]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    /// From the provider's Retry-After header
    pub retry_after: Option<Duration>,
}

impl LlmError {
    fn new(kind: LlmErrorKind, message: String) -> Self {
        Self {
            kind,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Build from a non-success HTTP response.
    pub fn from_http(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let kind = classify_http_status(status);
        Self {
            kind,
            status_code: Some(status),
            message: body.to_string(),
            retry_after: retry_after.filter(|_| kind == LlmErrorKind::RateLimited),
        }
    }

    pub fn rate_limited(message: String, retry_after: Option<Duration>) -> Self {
        Self::from_http(429, &message, retry_after)
    }

    pub fn server_error(status_code: u16, message: String) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::new(LlmErrorKind::ServerError, message)
        }
    }

    pub fn client_error(status_code: u16, message: String) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::new(LlmErrorKind::ClientError, message)
        }
    }

    pub fn network_error(message: String) -> Self {
        Self::new(LlmErrorKind::NetworkError, message)
    }

    pub fn timeout(message: String) -> Self {
        Self::new(LlmErrorKind::Timeout, message)
    }

    pub fn parse_error(message: String) -> Self {
        Self::new(LlmErrorKind::ParseError, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Sleep before retry number `attempt` (0-based).
    ///
    /// Honors Retry-After when the provider sent one, otherwise doubles the
    /// kind's base delay per attempt. Never exceeds one minute.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }
        self.kind
            .base_delay()
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF)
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

/// How many times a failed call may be repeated.
///
/// The default is zero: one attempt per upload, the user re-uploads to try again.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Wall-clock cap across all attempts
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            max_retry_duration: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Whether `error` may be retried after `attempt` previous retries.
    pub fn should_retry(&self, error: &LlmError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.max_retries
    }
}

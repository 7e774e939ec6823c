use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Judge config error: {0}")]
    Config(String),

    /// Network failure: connection refused, DNS, request timeout.
    #[error("Judge transport error: {0}")]
    Transport(String),

    #[error("Judge server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("ServiceUnavailable after {retries} retries: {reason}")]
    ServiceUnavailable { retries: u32, reason: String },

    /// Throttled by the judge. Carries the `Retry-After` value when present.
    #[error("Judge rate limit exceeded{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Judge rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Judge rejected request: {status} - {message}")]
    BadRequest { status: u16, message: String },

    #[error("Invalid judge response: {0}")]
    InvalidResponse(String),

    #[error("Polling timeout: submission {token} still pending after {attempts} polls")]
    PollingTimeout { token: String, attempts: u32 },

    #[error("Unknown judge token: {0}")]
    UnknownToken(String),
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

impl JudgeError {
    /// Transient failures that are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }

    /// Failures that would repeat for every test case of a submission:
    /// the judge is unreachable, throttling us, or refusing our credentials.
    pub fn is_service_level(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. } | Self::RateLimited { .. } | Self::Unauthorized { .. }
        )
    }
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JudgeError::InvalidResponse(err.to_string())
        } else {
            JudgeError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, JudgeError>;

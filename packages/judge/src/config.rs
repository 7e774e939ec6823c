use std::time::Duration;

use common::retry::RetryPolicy;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{JudgeError, Result};
use crate::models::ResourceLimits;

/// Connection settings for the remote judge.
#[derive(Debug, Deserialize, Clone)]
pub struct JudgeClientConfig {
    /// Base URL of the judge API, e.g. "http://judge:2358".
    #[serde(default)]
    pub base_url: String,
    /// Bearer token sent on every request when set.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Per-request timeout. Default: 10000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Timeout for the health check. Default: 5000.
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
    /// Total attempts for a transiently failing call. Default: 3.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Default: 500.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Default: 8000.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Delay between result polls. Default: 1000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Polls before giving up on a pending job. Default: 30.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default)]
    pub limits: ResourceLimits,
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_health_timeout_ms() -> u64 {
    5_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    500
}
fn default_retry_max_delay_ms() -> u64 {
    8_000
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_max_poll_attempts() -> u32 {
    30
}

impl Default for JudgeClientConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl JudgeClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout_ms: default_timeout_ms(),
            health_timeout_ms: default_health_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            limits: ResourceLimits::default(),
        }
    }

    /// Check the config and return the parsed base URL.
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|e| JudgeError::Config(format!("Invalid base URL '{}': {e}", self.base_url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(JudgeError::Config(format!(
                "Base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let positive = [
            ("timeout_ms", self.timeout_ms),
            ("health_timeout_ms", self.health_timeout_ms),
            ("max_retries", u64::from(self.max_retries)),
            ("poll_interval_ms", self.poll_interval_ms),
            ("max_poll_attempts", u64::from(self.max_poll_attempts)),
            ("limits.memory_limit", self.limits.memory_limit),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(JudgeError::Config(format!("{name} must be positive")));
        }

        for (name, value) in [
            ("limits.cpu_time_limit", self.limits.cpu_time_limit),
            ("limits.wall_time_limit", self.limits.wall_time_limit),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(JudgeError::Config(format!("{name} must be positive")));
            }
        }

        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(JudgeError::Config(
                "retry_max_delay_ms must not be less than retry_base_delay_ms".into(),
            ));
        }

        Ok(url)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = JudgeClientConfig::new("http://localhost:2358");
        let url = config.validate().unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(config.retry_policy().max_retries, 3);
    }

    #[test]
    fn test_rejects_malformed_url() {
        let config = JudgeClientConfig::new("not a url");
        assert!(matches!(config.validate(), Err(JudgeError::Config(_))));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = JudgeClientConfig::new("ftp://judge.example.com");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_zero_values() {
        let mut config = JudgeClientConfig::new("http://localhost:2358");
        config.max_retries = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_retries"));

        let mut config = JudgeClientConfig::new("http://localhost:2358");
        config.limits.cpu_time_limit = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: JudgeClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://judge.example.com",
            "max_retries": 5,
        }))
        .unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.limits, ResourceLimits::default());
        assert!(config.auth_token.is_none());
    }
}

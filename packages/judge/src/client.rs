use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::retry::RetryPolicy;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use crate::config::JudgeClientConfig;
use crate::error::{JudgeError, Result};
use crate::models::{ExecutionRequest, ExecutionResponse, JudgeLanguage, SubmissionToken};
use crate::sleep::{Sleeper, TokioSleeper};
use crate::stats::{ClientStats, StatsSnapshot};

/// HTTP client for one remote judge.
pub struct JudgeClient {
    http: Client,
    base_url: Url,
    config: JudgeClientConfig,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    stats: ClientStats,
}

impl std::fmt::Debug for JudgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("max_retries", &self.config.max_retries)
            .field("auth_enabled", &self.config.auth_token.is_some())
            .finish()
    }
}

impl JudgeClient {
    pub fn new(config: JudgeClientConfig) -> Result<Self> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    /// Build a client whose backoff and polling delays go through `sleeper`.
    pub fn with_sleeper(config: JudgeClientConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let mut base_url = config.validate()?;
        // Keep the last path segment when joining relative endpoints.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| JudgeError::Config(format!("Invalid auth token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
            debug!("Configured bearer token authentication");
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .user_agent(format!("executor-judge-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JudgeError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            retry: config.retry_policy(),
            config,
            sleeper,
            stats: ClientStats::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Check `GET /system_info`. Never fails: any error means unhealthy.
    pub async fn check_health(&self) -> bool {
        let Ok(url) = self.endpoint("system_info") else {
            return false;
        };

        match self
            .http
            .get(url)
            .timeout(self.config.health_timeout())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Judge health check failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Judge unreachable");
                false
            }
        }
    }

    /// Languages the judge can run.
    pub async fn list_languages(&self) -> Result<Vec<JudgeLanguage>> {
        let url = self.endpoint("languages")?;
        self.with_retry("languages", || self.send_json(self.http.get(url.clone())))
            .await
    }

    /// Queue a program on the judge and return its job token.
    #[instrument(skip_all, fields(language_id = request.language_id))]
    pub async fn submit_execution(&self, request: &ExecutionRequest) -> Result<String> {
        let url = self.endpoint("submissions")?;
        let submitted: SubmissionToken = self
            .with_retry("submit", || {
                self.send_json(
                    self.http
                        .post(url.clone())
                        .query(&[("base64_encoded", "false"), ("wait", "false")])
                        .json(request),
                )
            })
            .await?;

        if submitted.token.trim().is_empty() {
            return Err(JudgeError::InvalidResponse(
                "Judge returned an empty token".into(),
            ));
        }

        debug!(token = %submitted.token, "Submission queued on judge");
        Ok(submitted.token)
    }

    /// Poll a job until it reaches a terminal status or the poll ceiling.
    #[instrument(skip(self))]
    pub async fn get_execution_result(&self, token: &str) -> Result<ExecutionResponse> {
        let max_polls = self.config.max_poll_attempts;

        for poll in 1..=max_polls {
            let response = self.fetch_execution(token).await?;
            if response.is_terminal() {
                debug!(
                    poll,
                    status = response.status.id,
                    description = %response.status.description,
                    "Judge job finished"
                );
                return Ok(response);
            }

            debug!(poll, status = response.status.id, "Judge job still pending");
            if poll < max_polls {
                self.sleeper.sleep(self.config.poll_interval()).await;
            }
        }

        warn!(token, polls = max_polls, "Gave up polling judge job");
        Err(JudgeError::PollingTimeout {
            token: token.to_string(),
            attempts: max_polls,
        })
    }

    /// Single `GET /submissions/{token}`, with transport retries.
    pub async fn fetch_execution(&self, token: &str) -> Result<ExecutionResponse> {
        let url = self.endpoint(&format!("submissions/{token}"))?;
        let mut response: ExecutionResponse = self
            .with_retry("poll", || {
                self.send_json(
                    self.http
                        .get(url.clone())
                        .query(&[("base64_encoded", "false")]),
                )
            })
            .await?;

        if response.token.is_empty() {
            response.token = token.to_string();
        }
        Ok(response)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| JudgeError::Config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Run `call` under the retry policy.
    ///
    /// Transport and 5xx failures are retried with exponential backoff until
    /// `max_retries` attempts have been made; anything else returns at once.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match call().await {
                Ok(value) => {
                    self.stats.record_success(started.elapsed());
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying judge request"
                    );
                    self.stats.record_retry();
                    self.sleeper.sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    error!(operation, attempts = attempt, error = %e, "Judge retries exhausted");
                    self.stats.record_failure();
                    return Err(JudgeError::ServiceUnavailable {
                        retries: attempt,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(operation, error = %e, "Judge request failed");
                    self.stats.record_failure();
                    return Err(e);
                }
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(JudgeError::from)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(JudgeError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(JudgeError::Unauthorized {
                status: status.as_u16(),
            }),
            _ => {
                let message = response.text().await.unwrap_or_default();
                if status.is_server_error() {
                    Err(JudgeError::Server {
                        status: status.as_u16(),
                        message,
                    })
                } else {
                    Err(JudgeError::BadRequest {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
        }
    }
}

/// `Retry-After` in delay-seconds form.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

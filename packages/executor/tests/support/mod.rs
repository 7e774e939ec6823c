#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use common::{Attempt, AttemptStatus, NewSubmission, TestCase};
use executor::{
    ExecutionBackend, ExecutionOrchestrator, InMemoryStore, ServiceMode, SimulatedJudge,
    StoreError, SubmissionStore,
};
use judge::{ExecutionRequest, ExecutionResponse, JudgeClientConfig, JudgeError};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

pub const ATTEMPT: &str = "attempt-1";
pub const CHALLENGE: &str = "challenge-1";

pub fn attempt(languages: &str, status: AttemptStatus) -> Attempt {
    Attempt {
        id: ATTEMPT.into(),
        challenge_id: CHALLENGE.into(),
        status,
        supported_languages: languages.into(),
    }
}

/// Store holding one in-progress attempt on a challenge with `test_cases`.
pub async fn seeded_store(languages: &str, test_cases: Vec<TestCase>) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_attempt(attempt(languages, AttemptStatus::InProgress))
        .await;
    store.insert_test_cases(CHALLENGE, test_cases).await;
    store
}

pub fn orchestrator(
    backend: Arc<dyn ExecutionBackend>,
    store: Arc<InMemoryStore>,
) -> ExecutionOrchestrator {
    ExecutionOrchestrator::new(backend, store.clone(), store)
}

/// Simulated judge whose submissions block until [`GatedBackend::open`].
pub struct GatedBackend {
    inner: SimulatedJudge,
    gate: Semaphore,
    entered: AtomicUsize,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self {
            inner: SimulatedJudge::new(),
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// Submissions that reached the gate.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionBackend for GatedBackend {
    fn mode(&self) -> ServiceMode {
        ServiceMode::Simulated
    }

    fn endpoint(&self) -> Option<String> {
        None
    }

    async fn submit(&self, request: &ExecutionRequest) -> judge::Result<String> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;
        self.inner.submit(request).await
    }

    async fn poll(&self, token: &str) -> judge::Result<ExecutionResponse> {
        self.inner.poll(token).await
    }

    async fn check_health(&self) -> bool {
        true
    }
}

/// Backend for a judge that cannot be reached at all.
#[derive(Default)]
pub struct UnreachableBackend {
    submits: AtomicUsize,
}

impl UnreachableBackend {
    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionBackend for UnreachableBackend {
    fn mode(&self) -> ServiceMode {
        ServiceMode::Remote
    }

    fn endpoint(&self) -> Option<String> {
        Some("http://judge.invalid/".into())
    }

    async fn submit(&self, _request: &ExecutionRequest) -> judge::Result<String> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Err(JudgeError::ServiceUnavailable {
            retries: 3,
            reason: "connection refused".into(),
        })
    }

    async fn poll(&self, token: &str) -> judge::Result<ExecutionResponse> {
        Err(JudgeError::UnknownToken(token.to_string()))
    }

    async fn check_health(&self) -> bool {
        false
    }
}

/// Submission store that refuses every write.
#[derive(Default)]
pub struct FailingSubmissionStore {
    writes: AtomicUsize,
}

impl FailingSubmissionStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionStore for FailingSubmissionStore {
    async fn create_submission(&self, _submission: NewSubmission) -> Result<String, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("database is read-only".into()))
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_judge(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn judge_config(base_url: &str) -> JudgeClientConfig {
    let mut config = JudgeClientConfig::new(base_url);
    config.timeout_ms = 2_000;
    config.health_timeout_ms = 1_000;
    config.retry_base_delay_ms = 100;
    config.retry_max_delay_ms = 1_000;
    config.poll_interval_ms = 250;
    config.max_poll_attempts = 4;
    config
}

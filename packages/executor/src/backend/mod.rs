//! Strategies for running one program against one test case.
//!
//! The orchestrator only sees [`ExecutionBackend`]; which implementation it
//! gets is decided once, at construction.

mod remote;
mod simulated;

pub use remote::RemoteJudge;
pub use simulated::SimulatedJudge;

use async_trait::async_trait;
use judge::{ExecutionRequest, ExecutionResponse, JudgeLanguage, StatsSnapshot};

use crate::health::ServiceMode;

#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    fn mode(&self) -> ServiceMode;

    /// Remote endpoint, if any.
    fn endpoint(&self) -> Option<String>;

    /// Queue a program and return the job token.
    async fn submit(&self, request: &ExecutionRequest) -> judge::Result<String>;

    /// Wait for a queued job to reach a terminal status.
    async fn poll(&self, token: &str) -> judge::Result<ExecutionResponse>;

    async fn check_health(&self) -> bool;

    /// Client statistics, when the backend keeps any.
    fn stats(&self) -> Option<StatsSnapshot> {
        None
    }

    /// Languages the backend accepts. Defaults to the local registry.
    async fn languages(&self) -> judge::Result<Vec<JudgeLanguage>> {
        Ok(common::language::languages()
            .map(|(name, id)| JudgeLanguage {
                id,
                name: name.to_string(),
            })
            .collect())
    }
}

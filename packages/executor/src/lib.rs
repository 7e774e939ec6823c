//! Code execution orchestration.
//!
//! [`ExecutionOrchestrator`] takes a code submission for a candidate's
//! attempt, runs it against every test case of the attempt's challenge
//! through an [`ExecutionBackend`], scores the results and records exactly
//! one submission. At most one execution per attempt is in flight.

pub mod backend;
pub mod challenge_file;
pub mod classify;
pub mod config;
pub mod error;
pub mod health;
pub mod lock;
pub mod orchestrator;
pub mod store;

pub use backend::{ExecutionBackend, RemoteJudge, SimulatedJudge};
pub use config::ExecutorAppConfig;
pub use error::{ExecutionError, Result};
pub use health::{HealthReport, ServiceInfo, ServiceMode};
pub use lock::{AttemptGuard, AttemptLocks};
pub use orchestrator::ExecutionOrchestrator;
pub use store::{ChallengeStore, InMemoryStore, StoreError, SubmissionStore};

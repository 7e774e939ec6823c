//! HTTP client for a remote asynchronous judging backend.
//!
//! The backend runs code in two steps: a submission returns a token, and the
//! token is polled until the job reaches a terminal status. [`JudgeClient`]
//! hides that protocol together with retries, timeouts and health checks.
//! It knows nothing about challenges or scoring.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod sleep;
pub mod stats;
pub mod status;

pub use client::JudgeClient;
pub use config::JudgeClientConfig;
pub use error::{JudgeError, Result};
pub use models::{ExecutionRequest, ExecutionResponse, JudgeLanguage, ResourceLimits, StatusInfo};
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
pub use stats::{ClientStats, StatsSnapshot};
pub use status::{JudgeStatus, RuntimeErrorKind};

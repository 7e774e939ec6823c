use common::AttemptStatus;
use thiserror::Error;

use crate::store::StoreError;

/// Reasons an execution is rejected before a result can be formed.
///
/// Judge failures during execution are not errors: they are recorded on
/// the test case results.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Code must not be empty")]
    EmptyCode,

    #[error("Attempt not found: {0}")]
    AttemptNotFound(String),

    #[error("Attempt {attempt_id} is {status}, expected in_progress")]
    InvalidAttemptState {
        attempt_id: String,
        status: AttemptStatus,
    },

    #[error("Language '{language}' is not supported for this challenge (supported: {supported})")]
    UnsupportedLanguage { language: String, supported: String },

    #[error("Challenge {0} has no test cases")]
    NoTestCases(String),

    #[error("An execution is already in progress for attempt {0}")]
    ConcurrentExecution(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ExecutionError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyCode => "EMPTY_CODE",
            Self::AttemptNotFound(_) => "ATTEMPT_NOT_FOUND",
            Self::InvalidAttemptState { .. } => "INVALID_ATTEMPT_STATE",
            Self::UnsupportedLanguage { .. } => "UNSUPPORTED_LANGUAGE",
            Self::NoTestCases(_) => "NO_TEST_CASES",
            Self::ConcurrentExecution(_) => "CONCURRENT_EXECUTION",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

//! Challenge definitions stored as TOML, for running the executor outside a
//! hosting service.
//!
//! ```toml
//! id = "sum"
//! languages = "python,javascript"
//!
//! [[test_cases]]
//! id = "small"
//! kind = "io"
//! input = "1 2"
//! expected_output = "3"
//!
//! [[test_cases]]
//! id = "harness"
//! kind = "harness"
//! harness_code = "assert solve(2, 3) == 5"
//! weight = 2
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use common::{Attempt, AttemptStatus, TestCase};
use serde::Deserialize;
use thiserror::Error;

use crate::store::InMemoryStore;

#[derive(Debug, Error)]
pub enum ChallengeFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid challenge file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid challenge: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeFile {
    pub id: String,
    /// Comma-separated language names.
    pub languages: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl ChallengeFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChallengeFileError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ChallengeFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ChallengeFileError> {
        let mut challenge: ChallengeFile = toml::from_str(raw)?;
        challenge.validate()?;
        for test_case in &mut challenge.test_cases {
            test_case.challenge_id = challenge.id.clone();
        }
        Ok(challenge)
    }

    fn validate(&self) -> Result<(), ChallengeFileError> {
        if self.id.trim().is_empty() {
            return Err(ChallengeFileError::Invalid("id must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for test_case in &self.test_cases {
            if !seen.insert(test_case.id.as_str()) {
                return Err(ChallengeFileError::Invalid(format!(
                    "duplicate test case id '{}'",
                    test_case.id
                )));
            }
            if test_case.weight == 0 {
                return Err(ChallengeFileError::Invalid(format!(
                    "test case '{}' must have a positive weight",
                    test_case.id
                )));
            }
        }
        Ok(())
    }

    /// An in-progress attempt on this challenge.
    pub fn attempt(&self, attempt_id: impl Into<String>) -> Attempt {
        Attempt {
            id: attempt_id.into(),
            challenge_id: self.id.clone(),
            status: AttemptStatus::InProgress,
            supported_languages: self.languages.clone(),
        }
    }

    /// Register this challenge and an in-progress attempt on it.
    pub async fn seed(&self, store: &InMemoryStore, attempt_id: &str) {
        store.insert_attempt(self.attempt(attempt_id)).await;
        store
            .insert_test_cases(&self.id, self.test_cases.clone())
            .await;
    }
}

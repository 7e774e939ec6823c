use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::language::parse_language_list;

/// Lifecycle state of a candidate's attempt on a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Session created but the challenge has not been opened.
    NotStarted,
    /// Candidate is working on the challenge. The only executable state.
    InProgress,
    /// Candidate finished the challenge.
    Completed,
    /// Session time ran out.
    Expired,
}

impl AttemptStatus {
    /// All possible status values.
    pub const ALL: &'static [AttemptStatus] = &[
        Self::NotStarted,
        Self::InProgress,
        Self::Completed,
        Self::Expired,
    ];

    /// Returns true if code may be executed against this attempt.
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid attempt status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid attempt status '{invalid}'. Valid values: {}", valid_statuses())]
pub struct ParseStatusError {
    invalid: String,
}

fn valid_statuses() -> String {
    AttemptStatus::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for AttemptStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttemptStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}

/// A candidate's association with one challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub challenge_id: String,
    pub status: AttemptStatus,
    /// Comma-separated language names configured on the challenge.
    pub supported_languages: String,
}

impl Attempt {
    /// Normalized list of languages the challenge accepts.
    pub fn languages(&self) -> Vec<String> {
        parse_language_list(&self.supported_languages)
    }
}

/// Code submitted for execution against an attempt's challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSubmission {
    pub attempt_id: String,
    pub code: String,
    pub language: String,
}

impl CodeSubmission {
    pub fn new(
        attempt_id: impl Into<String>,
        code: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            code: code.into(),
            language: language.into(),
        }
    }
}

/// Submission row handed to the submission store. Written once, never updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub attempt_id: String,
    pub code: String,
    pub language: String,
    /// Opaque reference to the judge jobs that ran this submission.
    pub judge_ref: Option<String>,
    pub passed: u32,
    pub total: u32,
    pub stdout: String,
    pub stderr: Option<String>,
    pub time_ms: u64,
}

/// A persisted submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: String,
    #[serde(flatten)]
    pub submission: NewSubmission,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&AttemptStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: AttemptStatus = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(parsed, AttemptStatus::Expired);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "in_progress".parse::<AttemptStatus>().unwrap(),
            AttemptStatus::InProgress
        );
        let err = "running".parse::<AttemptStatus>().unwrap_err();
        assert!(err.to_string().contains("not_started, in_progress"));
    }

    #[test]
    fn test_only_in_progress_is_executable() {
        let executable: Vec<_> = AttemptStatus::ALL
            .iter()
            .filter(|s| s.is_executable())
            .collect();
        assert_eq!(executable, vec![&AttemptStatus::InProgress]);
    }

    #[test]
    fn test_attempt_languages() {
        let attempt = Attempt {
            id: "a1".into(),
            challenge_id: "c1".into(),
            status: AttemptStatus::InProgress,
            supported_languages: "JavaScript, Python".into(),
        };
        assert_eq!(attempt.languages(), vec!["javascript", "python"]);
    }
}

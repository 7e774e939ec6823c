use async_trait::async_trait;
use common::{Attempt, NewSubmission, TestCase};

use super::error::StoreError;

/// Read access to attempts and their challenge's test cases.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Fetch an attempt, or `None` if it does not exist.
    async fn get_attempt(&self, attempt_id: &str) -> Result<Option<Attempt>, StoreError>;

    /// All test cases of a challenge, ordered by ascending weight.
    async fn get_test_cases(&self, challenge_id: &str) -> Result<Vec<TestCase>, StoreError>;
}

/// Append-only submission history.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a submission and return its id. Records are never updated.
    async fn create_submission(&self, submission: NewSubmission) -> Result<String, StoreError>;
}

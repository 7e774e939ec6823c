use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::test_case::sort_by_weight;
use common::{Attempt, NewSubmission, SubmissionRecord, TestCase};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreError;
use super::traits::{ChallengeStore, SubmissionStore};

/// Process-local store for attempts, test cases and submissions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    attempts: RwLock<HashMap<String, Attempt>>,
    test_cases: RwLock<HashMap<String, Vec<TestCase>>>,
    submissions: RwLock<Vec<SubmissionRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_attempt(&self, attempt: Attempt) {
        self.attempts
            .write()
            .await
            .insert(attempt.id.clone(), attempt);
    }

    /// Replace the test cases of a challenge.
    pub async fn insert_test_cases(&self, challenge_id: &str, test_cases: Vec<TestCase>) {
        self.test_cases
            .write()
            .await
            .insert(challenge_id.to_string(), test_cases);
    }

    /// Submissions recorded for an attempt, oldest first.
    pub async fn submissions_for(&self, attempt_id: &str) -> Vec<SubmissionRecord> {
        self.submissions
            .read()
            .await
            .iter()
            .filter(|s| s.submission.attempt_id == attempt_id)
            .cloned()
            .collect()
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }
}

#[async_trait]
impl ChallengeStore for InMemoryStore {
    async fn get_attempt(&self, attempt_id: &str) -> Result<Option<Attempt>, StoreError> {
        Ok(self.attempts.read().await.get(attempt_id).cloned())
    }

    async fn get_test_cases(&self, challenge_id: &str) -> Result<Vec<TestCase>, StoreError> {
        let mut cases = self
            .test_cases
            .read()
            .await
            .get(challenge_id)
            .cloned()
            .unwrap_or_default();
        sort_by_weight(&mut cases);
        Ok(cases)
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn create_submission(&self, submission: NewSubmission) -> Result<String, StoreError> {
        let id = Uuid::now_v7().to_string();
        self.submissions.write().await.push(SubmissionRecord {
            id: id.clone(),
            submission,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

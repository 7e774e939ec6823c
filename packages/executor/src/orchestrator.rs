use std::sync::Arc;

use chrono::Utc;
use common::language::{language_id, same_language};
use common::test_case::sort_by_weight;
use common::{
    Aggregate, Attempt, CodeSubmission, ExecutionResult, NewSubmission, TestCase, TestCaseKind,
    TestCaseResult,
};
use judge::{ExecutionRequest, ResourceLimits};
use tracing::{debug, error, info, instrument, warn};

use crate::backend::ExecutionBackend;
use crate::classify::{Halt, classify_failure, classify_response};
use crate::error::{ExecutionError, Result};
use crate::health::{HealthReport, ServiceInfo, ServiceMode};
use crate::lock::AttemptLocks;
use crate::store::{ChallengeStore, SubmissionStore};

/// Runs a submission against every test case of its challenge, scores it
/// and records it.
pub struct ExecutionOrchestrator {
    backend: Arc<dyn ExecutionBackend>,
    challenges: Arc<dyn ChallengeStore>,
    submissions: Arc<dyn SubmissionStore>,
    locks: AttemptLocks,
    limits: ResourceLimits,
}

impl ExecutionOrchestrator {
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        challenges: Arc<dyn ChallengeStore>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            backend,
            challenges,
            submissions,
            locks: AttemptLocks::new(),
            limits: ResourceLimits::default(),
        }
    }

    /// Resource ceilings sent with every program.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns true while an execution for `attempt_id` is running.
    pub fn is_executing(&self, attempt_id: &str) -> bool {
        self.locks.is_locked(attempt_id)
    }

    /// Execute `submission` against its challenge's test cases.
    ///
    /// Rejects the call without waiting if the attempt already has an
    /// execution in flight. Judge failures are reported inside the result;
    /// only input problems and store failures are errors.
    #[instrument(
        skip_all,
        fields(attempt_id = %submission.attempt_id, language = %submission.language)
    )]
    pub async fn execute(&self, submission: CodeSubmission) -> Result<ExecutionResult> {
        let Some(_guard) = self.locks.try_acquire(&submission.attempt_id) else {
            warn!("Execution already in progress for attempt");
            return Err(ExecutionError::ConcurrentExecution(submission.attempt_id));
        };

        let (attempt, language_id) = self.validate(&submission).await?;

        let mut test_cases = self.challenges.get_test_cases(&attempt.challenge_id).await?;
        if test_cases.is_empty() {
            warn!(challenge_id = %attempt.challenge_id, "Challenge has no test cases");
            return Err(ExecutionError::NoTestCases(attempt.challenge_id));
        }
        sort_by_weight(&mut test_cases);

        debug!(
            challenge_id = %attempt.challenge_id,
            test_cases = test_cases.len(),
            mode = %self.backend.mode(),
            "Executing submission"
        );

        let test_results = self
            .run_test_cases(&submission.code, language_id, &test_cases)
            .await;

        let mut result = ExecutionResult::new(String::new(), test_results);
        result.submission_id = self.persist(&submission, &result).await?;

        info!(
            submission_id = %result.submission_id,
            passed = result.passed_tests,
            total = result.total_tests,
            score = result.score,
            max_score = result.max_score,
            service_error = result.service_error.is_some(),
            "Execution finished"
        );
        Ok(result)
    }

    pub async fn check_service_health(&self) -> bool {
        self.backend.check_health().await
    }

    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            mode: self.backend.mode(),
            endpoint: self.backend.endpoint(),
        }
    }

    pub async fn health_report(&self) -> HealthReport {
        let healthy = self.backend.check_health().await;
        HealthReport {
            mode: self.backend.mode(),
            endpoint: self.backend.endpoint(),
            healthy,
            checked_at: Utc::now(),
            stats: self.backend.stats(),
        }
    }

    /// Check the submission against its attempt; returns the attempt and the
    /// judge language id.
    async fn validate(&self, submission: &CodeSubmission) -> Result<(Attempt, u32)> {
        if submission.code.trim().is_empty() {
            return Err(ExecutionError::EmptyCode);
        }

        let attempt = self
            .challenges
            .get_attempt(&submission.attempt_id)
            .await?
            .ok_or_else(|| ExecutionError::AttemptNotFound(submission.attempt_id.clone()))?;

        if !attempt.status.is_executable() {
            return Err(ExecutionError::InvalidAttemptState {
                attempt_id: attempt.id,
                status: attempt.status,
            });
        }

        let unsupported = || ExecutionError::UnsupportedLanguage {
            language: submission.language.clone(),
            supported: attempt.supported_languages.clone(),
        };

        let allowed = attempt
            .languages()
            .iter()
            .any(|l| same_language(l, &submission.language));
        if !allowed {
            return Err(unsupported());
        }
        let id = language_id(&submission.language).ok_or_else(unsupported)?;

        Ok((attempt, id))
    }

    /// Run test cases one at a time, in order.
    ///
    /// After a judge failure that would repeat for every case, the judge is
    /// not called again; the failing case and every remaining one carry the
    /// same error.
    async fn run_test_cases(
        &self,
        code: &str,
        language_id: u32,
        test_cases: &[TestCase],
    ) -> Vec<TestCaseResult> {
        let mut results = Vec::with_capacity(test_cases.len());
        let mut halted: Option<Halt> = None;

        for test_case in test_cases {
            if let Some(halt) = &halted {
                results.push(halt.result(test_case));
                continue;
            }

            let (result, halt) = self.run_test_case(code, language_id, test_case).await;
            if let Some(halt) = halt {
                error!(
                    test_case_id = %test_case.id,
                    remaining = test_cases.len() - results.len() - 1,
                    error = halt.message(),
                    "Judge call failed for the whole submission, failing remaining test cases"
                );
                halted = Some(halt);
            }
            results.push(result);
        }

        results
    }

    /// Submit and poll one test case. Also returns the halt when the judge
    /// failure applies to every remaining case.
    async fn run_test_case(
        &self,
        code: &str,
        language_id: u32,
        test_case: &TestCase,
    ) -> (TestCaseResult, Option<Halt>) {
        let request = self.build_request(code, language_id, test_case);

        let token = match self.backend.submit(&request).await {
            Ok(token) => token,
            Err(e) => {
                warn!(test_case_id = %test_case.id, error = %e, "Judge submission failed");
                return (classify_failure(test_case, &e, None), Halt::from_error(&e));
            }
        };

        let judge_token = (self.backend.mode() == ServiceMode::Remote).then(|| token.clone());
        match self.backend.poll(&token).await {
            Ok(response) => {
                let result = classify_response(test_case, &response, judge_token);
                debug!(
                    test_case_id = %test_case.id,
                    passed = result.passed,
                    status = response.status.id,
                    time_ms = result.execution_time,
                    "Test case finished"
                );
                (result, None)
            }
            Err(e) => {
                warn!(test_case_id = %test_case.id, token = %token, error = %e, "Judge polling failed");
                (
                    classify_failure(test_case, &e, judge_token),
                    Halt::from_error(&e),
                )
            }
        }
    }

    fn build_request(&self, code: &str, language_id: u32, test_case: &TestCase) -> ExecutionRequest {
        let (source_code, stdin, expected_output) = match &test_case.kind {
            TestCaseKind::Io {
                input,
                expected_output,
            } => (code.to_string(), input.clone(), Some(expected_output.clone())),
            TestCaseKind::Harness { harness_code } => {
                (format!("{code}\n\n{harness_code}"), String::new(), None)
            }
        };

        ExecutionRequest {
            source_code,
            language_id,
            stdin,
            expected_output,
            limits: self.limits,
        }
    }

    async fn persist(
        &self,
        submission: &CodeSubmission,
        result: &ExecutionResult,
    ) -> Result<String> {
        let results = &result.test_results;
        let tokens: Vec<&str> = results
            .iter()
            .filter_map(|r| r.judge_token.as_deref())
            .collect();

        let record = NewSubmission {
            attempt_id: submission.attempt_id.clone(),
            code: submission.code.clone(),
            language: submission.language.clone(),
            judge_ref: (!tokens.is_empty()).then(|| tokens.join(",")),
            passed: result.passed_tests,
            total: result.total_tests,
            stdout: results
                .iter()
                .map(|r| r.actual_output.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            stderr: Aggregate::first_error(results).map(str::to_string),
            time_ms: result.total_execution_time,
        };

        let id = self
            .submissions
            .create_submission(record)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to persist submission"))?;
        Ok(id)
    }
}

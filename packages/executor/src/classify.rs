//! Turning judge responses and judge failures into test case results.

use common::{TestCase, TestCaseResult, TestOutcome};
use judge::{ExecutionResponse, JudgeError, JudgeStatus};

/// Classify a terminal judge response for `test_case`.
///
/// `judge_token` is recorded on the result as-is; callers pass `None` when
/// the token is not a real judge reference.
pub fn classify_response(
    test_case: &TestCase,
    response: &ExecutionResponse,
    judge_token: Option<String>,
) -> TestCaseResult {
    let status = response.judge_status();
    let actual_output = response.stdout.as_deref().unwrap_or_default().trim().to_string();

    let (outcome, error) = match status {
        JudgeStatus::Accepted => (TestOutcome::Passed, None),
        JudgeStatus::WrongAnswer => (TestOutcome::WrongAnswer, None),
        JudgeStatus::TimeLimitExceeded => (
            TestOutcome::TimeLimitExceeded,
            Some("Time Limit Exceeded: execution timeout".to_string()),
        ),
        JudgeStatus::CompilationError => (
            TestOutcome::CompilationError,
            Some(format!(
                "Compilation Error: {}",
                first_present(&[&response.compile_output, &response.message])
            )),
        ),
        JudgeStatus::RuntimeError(_) => (
            TestOutcome::RuntimeError,
            Some(format!(
                "{}: {}",
                status.description(),
                first_present(&[&response.stderr, &response.message])
            )),
        ),
        // Still pending is only reachable through a misbehaving backend.
        JudgeStatus::InQueue
        | JudgeStatus::Processing
        | JudgeStatus::InternalError
        | JudgeStatus::ExecFormatError
        | JudgeStatus::Unknown(_) => (
            TestOutcome::InternalError,
            Some(format!(
                "{}: {}",
                status.description(),
                first_present(&[&response.message, &response.stderr])
            )),
        ),
    };

    TestCaseResult {
        test_case_id: test_case.id.clone(),
        passed: outcome == TestOutcome::Passed,
        outcome,
        expected_output: test_case.expected_output().to_string(),
        actual_output,
        execution_time: response.time_ms(),
        weight: test_case.weight,
        error,
        judge_token,
    }
}

/// Failed result for a judge call that never produced a terminal response.
pub fn classify_failure(
    test_case: &TestCase,
    error: &JudgeError,
    judge_token: Option<String>,
) -> TestCaseResult {
    if let Some(halt) = Halt::from_error(error) {
        let mut result = halt.result(test_case);
        result.judge_token = judge_token;
        return result;
    }
    failed(test_case, TestOutcome::InternalError, error.to_string(), judge_token)
}

/// A judge failure that would repeat for every test case of a submission.
///
/// The failing case and all remaining ones get the same result. Only an
/// unreachable judge is reported as `ServiceUnavailable`; a judge that
/// answered with a throttling or credential refusal yields an
/// `InternalError` naming the refusal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    outcome: TestOutcome,
    message: String,
}

impl Halt {
    pub fn from_error(error: &JudgeError) -> Option<Self> {
        if !error.is_service_level() {
            return None;
        }
        let halt = match error {
            JudgeError::ServiceUnavailable { .. } => Self {
                outcome: TestOutcome::ServiceUnavailable,
                message: format!("Judge service unavailable: {error}"),
            },
            _ => Self {
                outcome: TestOutcome::InternalError,
                message: format!("Judge refused execution: {error}"),
            },
        };
        Some(halt)
    }

    pub fn outcome(&self) -> TestOutcome {
        self.outcome
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Result for a test case that was not sent to the judge.
    pub fn result(&self, test_case: &TestCase) -> TestCaseResult {
        failed(test_case, self.outcome, self.message.clone(), None)
    }
}

fn failed(
    test_case: &TestCase,
    outcome: TestOutcome,
    message: String,
    judge_token: Option<String>,
) -> TestCaseResult {
    TestCaseResult {
        test_case_id: test_case.id.clone(),
        passed: false,
        outcome,
        expected_output: test_case.expected_output().to_string(),
        actual_output: String::new(),
        execution_time: 0,
        weight: test_case.weight,
        error: Some(message),
        judge_token,
    }
}

fn first_present(candidates: &[&Option<String>]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("no details")
        .to_string()
}

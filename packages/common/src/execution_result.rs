use serde::{Deserialize, Serialize};

const COMPILATION_MARKERS: &[&str] = &["compilation error", "syntaxerror", "syntax error"];
const TIMEOUT_MARKERS: &[&str] = &["time limit exceeded", "timeout", "timed out"];

fn contains_marker(message: &str, markers: &[&str]) -> bool {
    let message = message.to_lowercase();
    markers.iter().any(|m| message.contains(m))
}

/// Returns true if an error message reports a compilation/syntax failure.
pub fn is_compilation_error(message: &str) -> bool {
    contains_marker(message, COMPILATION_MARKERS)
}

/// Returns true if an error message reports a timeout.
pub fn is_timeout(message: &str) -> bool {
    contains_marker(message, TIMEOUT_MARKERS)
}

/// What happened to a single test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    WrongAnswer,
    CompilationError,
    RuntimeError,
    TimeLimitExceeded,
    /// The judging backend could not be reached; the code never ran.
    ServiceUnavailable,
    InternalError,
}

/// Result for a single test case execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub test_case_id: String,
    pub passed: bool,
    pub outcome: TestOutcome,
    pub expected_output: String,
    pub actual_output: String,
    /// Milliseconds.
    pub execution_time: u64,
    /// Copied from the test case.
    pub weight: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Remote judge token, for audit only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_token: Option<String>,
}

/// Aggregate view over a list of test case results.
///
/// Pure function of its input: computing it twice over the same results
/// yields the same value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub total_tests: u32,
    pub passed_tests: u32,
    /// Sum of weights of passed tests.
    pub score: u32,
    /// Sum of weights of all tests.
    pub max_score: u32,
    /// Milliseconds.
    pub total_execution_time: u64,
    /// First error carrying a compilation marker.
    pub compilation_error: Option<String>,
    /// Any error carrying a timeout marker.
    pub execution_timeout: bool,
    /// Set only when the judging backend itself could not be reached.
    pub service_error: Option<String>,
}

impl Aggregate {
    pub fn from_results(results: &[TestCaseResult]) -> Self {
        let mut aggregate = Aggregate {
            total_tests: results.len() as u32,
            ..Default::default()
        };

        for result in results {
            aggregate.max_score = aggregate.max_score.saturating_add(result.weight);
            aggregate.total_execution_time = aggregate
                .total_execution_time
                .saturating_add(result.execution_time);

            if result.passed {
                aggregate.passed_tests += 1;
                aggregate.score = aggregate.score.saturating_add(result.weight);
            }

            let Some(error) = result.error.as_deref() else {
                continue;
            };

            if result.outcome == TestOutcome::ServiceUnavailable {
                if aggregate.service_error.is_none() {
                    aggregate.service_error = Some(error.to_string());
                }
                continue;
            }
            if aggregate.compilation_error.is_none() && is_compilation_error(error) {
                aggregate.compilation_error = Some(error.to_string());
            }
            if is_timeout(error) {
                aggregate.execution_timeout = true;
            }
        }

        aggregate
    }

    /// First error reported by any test case.
    pub fn first_error(results: &[TestCaseResult]) -> Option<&str> {
        results.iter().find_map(|r| r.error.as_deref())
    }
}

/// Outcome of one orchestration call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Id of the persisted submission record.
    pub submission_id: String,
    pub total_tests: u32,
    pub passed_tests: u32,
    /// Ordered like the challenge's test cases (ascending weight).
    pub test_results: Vec<TestCaseResult>,
    pub score: u32,
    pub max_score: u32,
    pub total_execution_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compilation_error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub execution_timeout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_error: Option<String>,
}

impl ExecutionResult {
    pub fn new(submission_id: impl Into<String>, test_results: Vec<TestCaseResult>) -> Self {
        let aggregate = Aggregate::from_results(&test_results);
        Self {
            submission_id: submission_id.into(),
            total_tests: aggregate.total_tests,
            passed_tests: aggregate.passed_tests,
            test_results,
            score: aggregate.score,
            max_score: aggregate.max_score,
            total_execution_time: aggregate.total_execution_time,
            compilation_error: aggregate.compilation_error,
            execution_timeout: aggregate.execution_timeout,
            service_error: aggregate.service_error,
        }
    }

    /// Returns true if every test case passed.
    pub fn all_passed(&self) -> bool {
        self.total_tests > 0 && self.passed_tests == self.total_tests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, passed: bool, weight: u32, error: Option<&str>) -> TestCaseResult {
        TestCaseResult {
            test_case_id: id.into(),
            passed,
            outcome: if passed {
                TestOutcome::Passed
            } else {
                TestOutcome::WrongAnswer
            },
            expected_output: "3".into(),
            actual_output: if passed { "3".into() } else { String::new() },
            execution_time: 12,
            weight,
            error: error.map(str::to_string),
            judge_token: None,
        }
    }

    #[test]
    fn test_weighted_score() {
        let results = vec![result("t1", true, 1, None), result("t2", false, 2, None)];
        let agg = Aggregate::from_results(&results);
        assert_eq!(agg.score, 1);
        assert_eq!(agg.max_score, 3);
        assert_eq!(agg.passed_tests, 1);
        assert_eq!(agg.total_tests, 2);
        assert_eq!(agg.total_execution_time, 24);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let results = vec![
            result("t1", true, 1, None),
            result("t2", false, 5, Some("Time Limit Exceeded: execution timeout")),
            result("t3", true, 2, None),
        ];
        assert_eq!(
            Aggregate::from_results(&results),
            Aggregate::from_results(&results)
        );
    }

    #[test]
    fn test_flags_are_independent() {
        let results = vec![
            result("t1", false, 1, Some("Compilation Error: SyntaxError: bad token")),
            result("t2", false, 1, Some("Time Limit Exceeded: execution timeout")),
            result("t3", false, 1, Some("Compilation Error: second")),
        ];
        let agg = Aggregate::from_results(&results);
        assert_eq!(
            agg.compilation_error.as_deref(),
            Some("Compilation Error: SyntaxError: bad token")
        );
        assert!(agg.execution_timeout);
        assert!(agg.service_error.is_none());
    }

    #[test]
    fn test_service_error_is_not_classified_as_timeout() {
        let mut r = result("t1", false, 1, Some("Judge service unavailable: timed out"));
        r.outcome = TestOutcome::ServiceUnavailable;
        let agg = Aggregate::from_results(&[r]);
        assert_eq!(
            agg.service_error.as_deref(),
            Some("Judge service unavailable: timed out")
        );
        assert!(!agg.execution_timeout);
    }

    #[test]
    fn test_empty_results() {
        let agg = Aggregate::from_results(&[]);
        assert_eq!(agg, Aggregate::default());
        assert!(!ExecutionResult::new("s1", vec![]).all_passed());
    }

    #[test]
    fn test_execution_result_serializes_camel_case() {
        let exec = ExecutionResult::new("s1", vec![result("t1", true, 2, None)]);
        let json = serde_json::to_value(&exec).unwrap();
        assert_eq!(json["submissionId"], "s1");
        assert_eq!(json["maxScore"], 2);
        assert_eq!(json["testResults"][0]["testCaseId"], "t1");
        assert!(json.get("serviceError").is_none());
        assert!(exec.all_passed());
    }

    #[test]
    fn test_first_error() {
        let results = vec![
            result("t1", true, 1, None),
            result("t2", false, 1, Some("boom")),
            result("t3", false, 1, Some("later")),
        ];
        assert_eq!(Aggregate::first_error(&results), Some("boom"));
    }
}

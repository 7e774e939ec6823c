pub mod execution_result;
pub mod language;
pub mod retry;
pub mod submission;
pub mod test_case;

pub use execution_result::{Aggregate, ExecutionResult, TestCaseResult, TestOutcome};
pub use submission::{Attempt, AttemptStatus, CodeSubmission, NewSubmission, SubmissionRecord};
pub use test_case::{TestCase, TestCaseKind};

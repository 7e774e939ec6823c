use serde::{Deserialize, Serialize};

/// How a test case validates a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestCaseKind {
    /// Feed `input` on stdin and compare stdout with `expected_output`.
    Io {
        input: String,
        #[serde(rename = "expectedOutput", alias = "expected_output")]
        expected_output: String,
    },
    /// Append `harness_code` to the submission; the harness asserts and exits.
    Harness {
        #[serde(rename = "harnessCode", alias = "harness_code")]
        harness_code: String,
    },
}

/// A test case owned by the challenge-authoring side. Read-only here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub challenge_id: String,
    #[serde(flatten)]
    pub kind: TestCaseKind,
    /// Points awarded when this case passes. Default: 1.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Visibility only; does not affect execution.
    #[serde(default)]
    pub hidden: bool,
}

fn default_weight() -> u32 {
    1
}

impl TestCase {
    pub fn io(
        id: impl Into<String>,
        challenge_id: impl Into<String>,
        input: impl Into<String>,
        expected_output: impl Into<String>,
        weight: u32,
    ) -> Self {
        Self {
            id: id.into(),
            challenge_id: challenge_id.into(),
            kind: TestCaseKind::Io {
                input: input.into(),
                expected_output: expected_output.into(),
            },
            weight,
            hidden: false,
        }
    }

    pub fn harness(
        id: impl Into<String>,
        challenge_id: impl Into<String>,
        harness_code: impl Into<String>,
        weight: u32,
    ) -> Self {
        Self {
            id: id.into(),
            challenge_id: challenge_id.into(),
            kind: TestCaseKind::Harness {
                harness_code: harness_code.into(),
            },
            weight,
            hidden: false,
        }
    }

    /// Expected stdout, or empty for harness cases.
    pub fn expected_output(&self) -> &str {
        match &self.kind {
            TestCaseKind::Io {
                expected_output, ..
            } => expected_output,
            TestCaseKind::Harness { .. } => "",
        }
    }
}

/// Stable ascending sort by weight; equal weights keep their authored order.
pub fn sort_by_weight(test_cases: &mut [TestCase]) {
    test_cases.sort_by_key(|tc| tc.weight);
}

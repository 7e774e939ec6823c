use serde::{Deserialize, Deserializer, Serialize};

use crate::status::{JudgeStatus, is_terminal_id};

/// Per-job resource ceilings sent with every submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU time limit in seconds. Default: 2.0.
    #[serde(default = "default_cpu_time_limit")]
    pub cpu_time_limit: f64,
    /// Wall clock limit in seconds. Default: 5.0.
    #[serde(default = "default_wall_time_limit")]
    pub wall_time_limit: f64,
    /// Memory ceiling in kilobytes. Default: 128000.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: u64,
}

fn default_cpu_time_limit() -> f64 {
    2.0
}
fn default_wall_time_limit() -> f64 {
    5.0
}
fn default_memory_limit() -> u64 {
    128_000
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_time_limit: default_cpu_time_limit(),
            wall_time_limit: default_wall_time_limit(),
            memory_limit: default_memory_limit(),
        }
    }
}

/// One program run to hand to the judge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(flatten)]
    pub limits: ResourceLimits,
}

/// Body of `POST /submissions`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmissionToken {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

/// Body of `GET /submissions/{token}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    #[serde(default)]
    pub token: String,
    pub status: StatusInfo,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Seconds. The judge reports this as a decimal string.
    #[serde(default, deserialize_with = "de_seconds")]
    pub time: Option<f64>,
    /// Kilobytes.
    #[serde(default)]
    pub memory: Option<u64>,
}

impl ExecutionResponse {
    pub fn judge_status(&self) -> JudgeStatus {
        JudgeStatus::from_id(self.status.id)
    }

    pub fn is_terminal(&self) -> bool {
        is_terminal_id(self.status.id)
    }

    /// Execution time in whole milliseconds.
    pub fn time_ms(&self) -> u64 {
        self.time
            .filter(|t| t.is_finite() && *t > 0.0)
            .map(|t| (t * 1000.0).round() as u64)
            .unwrap_or(0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn de_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::String(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Entry of `GET /languages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeLanguage {
    pub id: u32,
    pub name: String,
}

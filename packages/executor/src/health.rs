use std::fmt;

use chrono::{DateTime, Utc};
use judge::StatsSnapshot;
use serde::{Deserialize, Serialize};

/// Which backend executes test cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    /// Programs run on a remote judge over HTTP.
    Remote,
    /// Programs are evaluated locally by a deterministic simulator.
    Simulated,
}

impl ServiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Simulated => "simulated",
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub mode: ServiceMode,
    /// Judge base URL. Absent in simulated mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Point-in-time view of the execution backend.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub mode: ServiceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub healthy: bool,
    pub checked_at: DateTime<Utc>,
    /// Judge client statistics, remote mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_info_serialization() {
        let info = ServiceInfo {
            mode: ServiceMode::Simulated,
            endpoint: None,
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({ "mode": "simulated" })
        );

        let info = ServiceInfo {
            mode: ServiceMode::Remote,
            endpoint: Some("http://judge:2358/".into()),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["mode"], "remote");
        assert_eq!(json["endpoint"], "http://judge:2358/");
    }
}

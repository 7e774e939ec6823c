//! Judge status codes.
//!
//! Raw numeric ids reported by the judge are translated in exactly one
//! place, [`STATUS_TABLE`]. Ids missing from the table degrade to
//! [`JudgeStatus::Unknown`] instead of being guessed at.

use std::fmt;

/// Highest status id that still means "not finished" (1 = queued, 2 = processing).
pub const LAST_PENDING_STATUS: u32 = 2;

/// Returns true if the raw status id is terminal.
///
/// This is a threshold test rather than a table lookup so that codes newer
/// than the table still end polling.
pub fn is_terminal_id(id: u32) -> bool {
    id > LAST_PENDING_STATUS
}

/// Runtime error subclasses reported by the judge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeErrorKind {
    Segfault,
    FileSizeExceeded,
    FloatingPoint,
    Aborted,
    NonZeroExit,
    Other,
}

/// Domain view of a judge status id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JudgeStatus {
    InQueue,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    RuntimeError(RuntimeErrorKind),
    InternalError,
    ExecFormatError,
    Unknown(u32),
}

/// Known status ids and their descriptions.
pub const STATUS_TABLE: &[(u32, JudgeStatus, &str)] = &[
    (1, JudgeStatus::InQueue, "In Queue"),
    (2, JudgeStatus::Processing, "Processing"),
    (3, JudgeStatus::Accepted, "Accepted"),
    (4, JudgeStatus::WrongAnswer, "Wrong Answer"),
    (5, JudgeStatus::TimeLimitExceeded, "Time Limit Exceeded"),
    (6, JudgeStatus::CompilationError, "Compilation Error"),
    (
        7,
        JudgeStatus::RuntimeError(RuntimeErrorKind::Segfault),
        "Runtime Error (SIGSEGV)",
    ),
    (
        8,
        JudgeStatus::RuntimeError(RuntimeErrorKind::FileSizeExceeded),
        "Runtime Error (SIGXFSZ)",
    ),
    (
        9,
        JudgeStatus::RuntimeError(RuntimeErrorKind::FloatingPoint),
        "Runtime Error (SIGFPE)",
    ),
    (
        10,
        JudgeStatus::RuntimeError(RuntimeErrorKind::Aborted),
        "Runtime Error (SIGABRT)",
    ),
    (
        11,
        JudgeStatus::RuntimeError(RuntimeErrorKind::NonZeroExit),
        "Runtime Error (NZEC)",
    ),
    (
        12,
        JudgeStatus::RuntimeError(RuntimeErrorKind::Other),
        "Runtime Error (Other)",
    ),
    (13, JudgeStatus::InternalError, "Internal Error"),
    (14, JudgeStatus::ExecFormatError, "Exec Format Error"),
];

const UNKNOWN_DESCRIPTION: &str = "Unknown execution status";

impl JudgeStatus {
    pub fn from_id(id: u32) -> Self {
        STATUS_TABLE
            .iter()
            .find(|(known, _, _)| *known == id)
            .map(|(_, status, _)| *status)
            .unwrap_or(JudgeStatus::Unknown(id))
    }

    pub fn id(&self) -> u32 {
        if let JudgeStatus::Unknown(id) = self {
            return *id;
        }
        STATUS_TABLE
            .iter()
            .find(|(_, status, _)| status == self)
            .map(|(id, _, _)| *id)
            .unwrap_or_default()
    }

    pub fn description(&self) -> &'static str {
        STATUS_TABLE
            .iter()
            .find(|(_, status, _)| status == self)
            .map(|(_, _, description)| *description)
            .unwrap_or(UNKNOWN_DESCRIPTION)
    }

    /// Returns true if the job is still queued or running.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::InQueue | Self::Processing)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for JudgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeStatus::Unknown(id) => write!(f, "{UNKNOWN_DESCRIPTION} ({id})"),
            other => f.write_str(other.description()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_round_trips_ids() {
        for (id, status, _) in STATUS_TABLE {
            assert_eq!(JudgeStatus::from_id(*id), *status);
            assert_eq!(status.id(), *id);
        }
    }

    #[test]
    fn test_terminal_threshold() {
        assert!(!is_terminal_id(1));
        assert!(!is_terminal_id(2));
        assert!(is_terminal_id(3));
        assert!(is_terminal_id(14));
        assert!(is_terminal_id(42));
    }

    #[test]
    fn test_unknown_ids_degrade() {
        let status = JudgeStatus::from_id(42);
        assert_eq!(status, JudgeStatus::Unknown(42));
        assert_eq!(status.id(), 42);
        assert_eq!(status.description(), "Unknown execution status");
        assert_eq!(status.to_string(), "Unknown execution status (42)");
        assert!(!status.is_pending());
    }

    #[test]
    fn test_runtime_subclasses() {
        assert_eq!(
            JudgeStatus::from_id(11),
            JudgeStatus::RuntimeError(RuntimeErrorKind::NonZeroExit)
        );
        assert_eq!(JudgeStatus::from_id(7).to_string(), "Runtime Error (SIGSEGV)");
    }
}

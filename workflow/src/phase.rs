//! Workflow phases and the verification display state.

use std::fmt;

/// Exactly one phase is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkflowPhase {
    Idle,
    Verifying,
    Verified,
    VerifyFailed,
    Submitting,
    SubmitFailed,
    Done,
}

impl WorkflowPhase {
    /// A worker is outstanding; the triggering action is disabled.
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowPhase::Verifying | WorkflowPhase::Submitting)
    }

    pub fn is_terminal(&self) -> bool {
        *self == WorkflowPhase::Done
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Verifying => "verifying",
            WorkflowPhase::Verified => "verified",
            WorkflowPhase::VerifyFailed => "verify-failed",
            WorkflowPhase::Submitting => "submitting",
            WorkflowPhase::SubmitFailed => "submit-failed",
            WorkflowPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Status line next to the verify control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyStatus {
    Pending,
    Verifying,
    Success,
    Error,
}

/// Which verify control is offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyControl {
    Verify,
    Retry,
    /// An attempt is running; no control is offered.
    Busy,
    /// The workflow finished; verification is no longer offered.
    Hidden,
}

/// What the surface shows about verification.
///
/// Tracked separately from the stored resource: it is reset explicitly when
/// an attempt starts, not derived from whether a resource is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyDisplay {
    pub status: VerifyStatus,
    pub control: VerifyControl,
}

impl VerifyDisplay {
    pub fn pending() -> Self {
        Self {
            status: VerifyStatus::Pending,
            control: VerifyControl::Verify,
        }
    }

    pub fn verifying() -> Self {
        Self {
            status: VerifyStatus::Verifying,
            control: VerifyControl::Busy,
        }
    }

    pub fn success() -> Self {
        Self {
            status: VerifyStatus::Success,
            control: VerifyControl::Verify,
        }
    }

    pub fn error() -> Self {
        Self {
            status: VerifyStatus::Error,
            control: VerifyControl::Retry,
        }
    }
}

impl Default for VerifyDisplay {
    fn default() -> Self {
        Self::pending()
    }
}

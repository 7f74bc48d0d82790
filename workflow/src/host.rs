//! Collaborators provided by the surface hosting a workflow.
//!
//! The controller never reaches for global state: everything user-visible
//! goes through the [`HostContext`] it was constructed with.

use keylink_submission::ProgressEvent;
use std::fmt;
use std::sync::Arc;

use crate::lifecycle::SurfaceLifecycle;

/// Why the user is being notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A verification attempt failed.
    VerifyFailed,
    /// The backend rejected or failed a submission.
    SubmitFailed,
    /// Submit was requested without a verified resource.
    NeedVerify,
    /// The backend needs more input before it can persist the attestation.
    InputRequired,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::VerifyFailed => "verify-failed",
            NotificationKind::SubmitFailed => "submit-failed",
            NotificationKind::NeedVerify => "need-verify",
            NotificationKind::InputRequired => "input-required",
        };
        f.write_str(s)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Modal progress shown while a submission is in flight.
///
/// `dismiss` may be called when nothing is shown, including after the
/// surface was torn down; implementations must tolerate that.
pub trait ProgressIndicator: Send + Sync {
    fn show(&self, title: &str);
    fn update(&self, event: &ProgressEvent);
    fn dismiss(&self);
}

/// Leaving the workflow.
pub trait WorkflowExit: Send + Sync {
    /// The attestation was persisted. Called exactly once per workflow.
    fn on_done(&self);
    /// The user asked to go back.
    fn on_back(&self);
}

/// Everything the controller needs from its host.
#[derive(Clone)]
pub struct HostContext {
    pub notifier: Arc<dyn Notifier>,
    pub progress: Arc<dyn ProgressIndicator>,
    pub exit: Arc<dyn WorkflowExit>,
    pub lifecycle: SurfaceLifecycle,
}

impl HostContext {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        progress: Arc<dyn ProgressIndicator>,
        exit: Arc<dyn WorkflowExit>,
    ) -> Self {
        Self {
            notifier,
            progress,
            exit,
            lifecycle: SurfaceLifecycle::new(),
        }
    }
}

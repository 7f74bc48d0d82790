//! The key-management backend seam.

use crate::channel::BackendReply;
use crate::request::SubmissionRequest;

/// A long-lived service that persists attestations.
///
/// `dispatch` must return promptly: implementations hand the work to their
/// own task and answer through `reply`. Every dispatched request must
/// eventually receive exactly one terminal message (dropping `reply` counts
/// as a failure).
pub trait SubmissionBackend: Send + Sync {
    fn dispatch(&self, request: SubmissionRequest, reply: BackendReply);
}

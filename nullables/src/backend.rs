//! Nullable submission backend: records requests and answers from a script.

use keylink_submission::{
    BackendReply, ProgressEvent, RequiredInput, SubmissionBackend, SubmissionRequest,
    SubmissionResult,
};
use keylink_types::{LogLevel, OperationLog};
use std::collections::VecDeque;
use std::sync::Mutex;

/// How the backend answers one dispatch.
#[derive(Clone, Debug)]
pub enum BackendScript {
    /// Report the given progress steps, then succeed.
    Succeed(Vec<ProgressEvent>),
    /// Fail with the given error message.
    Fail(String),
    /// Ask for more input.
    RequireInput(RequiredInput),
    /// Succeed, then send a second terminal message.
    SucceedTwice,
    /// Keep the reply handle; the test answers via [`NullBackend::take_held`].
    Hold,
    /// Drop the reply handle without answering.
    Drop,
}

/// A backend that never persists anything.
///
/// Scripts are consumed one per dispatch; once exhausted every dispatch
/// succeeds.
pub struct NullBackend {
    scripts: Mutex<VecDeque<BackendScript>>,
    requests: Mutex<Vec<SubmissionRequest>>,
    held: Mutex<Vec<BackendReply>>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::scripted([])
    }

    pub fn scripted(scripts: impl IntoIterator<Item = BackendScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    /// All requests dispatched so far (for assertions).
    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Take the oldest held reply handle.
    pub fn take_held(&self) -> Option<BackendReply> {
        let mut held = self.held.lock().unwrap();
        if held.is_empty() {
            None
        } else {
            Some(held.remove(0))
        }
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionBackend for NullBackend {
    fn dispatch(&self, request: SubmissionRequest, reply: BackendReply) {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(BackendScript::Succeed(Vec::new()));
        tracing::debug!(correlation = %request.correlation(), ?script, "null backend dispatch");
        self.requests.lock().unwrap().push(request);

        match script {
            BackendScript::Succeed(steps) => {
                for step in steps {
                    reply.progress(step);
                }
                reply.succeed(SubmissionResult::default());
            }
            BackendScript::Fail(message) => {
                let mut log = OperationLog::new();
                log.add(LogLevel::Error, message);
                reply.fail(log);
            }
            BackendScript::RequireInput(input) => reply.require_input(input),
            BackendScript::SucceedTwice => {
                reply.succeed(SubmissionResult::default());
                reply.succeed(SubmissionResult::default());
            }
            BackendScript::Hold => self.held.lock().unwrap().push(reply),
            BackendScript::Drop => drop(reply),
        }
    }
}

//! Message channel between a submission and the backend serving it.
//!
//! The backend answers through a [`BackendReply`]: zero or more progress
//! messages, then exactly one terminal message. The receiving side, a
//! [`SubmissionStream`], only accepts messages tagged with its own
//! correlation id and stops after the first terminal message, so late or
//! duplicated results are ignored.

use keylink_types::{KeyId, LogLevel, OperationLog};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::SubmissionError;
use crate::request::CorrelationId;

/// A progress notification from the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub message: String,
    pub progress: u32,
    pub max: u32,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>, progress: u32, max: u32) -> Self {
        Self {
            message: message.into(),
            progress,
            max,
        }
    }
}

/// Input the backend needs before it can finish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredInput {
    /// The passphrase unlocking the given key.
    Passphrase(KeyId),
    /// Signature time must be fixed by the caller, for repeatable retries.
    SignatureTime,
}

/// Successful persistence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionResult {
    pub log: OperationLog,
}

/// Terminal result of one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Succeeded(SubmissionResult),
    Failed(SubmissionError),
    InputRequired(RequiredInput),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded(_))
    }
}

/// One element of a submission's response stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionProgress {
    Progress(ProgressEvent),
    Finished(SubmissionOutcome),
}

#[derive(Debug)]
enum BackendMessage {
    Progress(ProgressEvent),
    Finished(SubmissionOutcome),
}

#[derive(Debug)]
struct Envelope {
    correlation: CorrelationId,
    message: BackendMessage,
}

/// The backend's side of the channel.
///
/// Sending never blocks and never fails loudly: if the submitter has gone
/// away the message is dropped.
#[derive(Clone, Debug)]
pub struct BackendReply {
    correlation: CorrelationId,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl BackendReply {
    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    pub fn progress(&self, event: ProgressEvent) {
        self.send(BackendMessage::Progress(event));
    }

    pub fn succeed(&self, result: SubmissionResult) {
        self.send(BackendMessage::Finished(SubmissionOutcome::Succeeded(result)));
    }

    pub fn fail(&self, log: OperationLog) {
        self.send(BackendMessage::Finished(SubmissionOutcome::Failed(
            SubmissionError::from_log(log),
        )));
    }

    pub fn require_input(&self, input: RequiredInput) {
        self.send(BackendMessage::Finished(SubmissionOutcome::InputRequired(
            input,
        )));
    }

    /// Whether the submitter is still listening.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, message: BackendMessage) {
        let envelope = Envelope {
            correlation: self.correlation,
            message,
        };
        if self.tx.send(envelope).is_err() {
            tracing::debug!(correlation = %self.correlation, "submitter gone, dropping backend message");
        }
    }
}

/// The submitter's side of the channel.
#[derive(Debug)]
pub struct SubmissionStream {
    correlation: CorrelationId,
    rx: mpsc::UnboundedReceiver<Envelope>,
    finished: bool,
}

/// Open a channel for the request identified by `correlation`.
pub fn channel(correlation: CorrelationId) -> (BackendReply, SubmissionStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        BackendReply { correlation, tx },
        SubmissionStream {
            correlation,
            rx,
            finished: false,
        },
    )
}

impl SubmissionStream {
    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    /// Next element of the stream, or `None` once the terminal element has
    /// been yielded.
    ///
    /// If the backend drops every reply handle without a terminal message,
    /// a synthesized failure is yielded instead.
    pub async fn next(&mut self) -> Option<SubmissionProgress> {
        if self.finished {
            return None;
        }
        loop {
            let Some(envelope) = self.rx.recv().await else {
                self.finished = true;
                tracing::warn!(correlation = %self.correlation, "backend closed channel without a result");
                let mut log = OperationLog::new();
                log.add(LogLevel::Error, "backend closed the channel without a result");
                return Some(SubmissionProgress::Finished(SubmissionOutcome::Failed(
                    SubmissionError::from_log(log),
                )));
            };

            if envelope.correlation != self.correlation {
                tracing::debug!(
                    expected = %self.correlation,
                    got = %envelope.correlation,
                    "ignoring message for another submission"
                );
                continue;
            }

            return match envelope.message {
                BackendMessage::Progress(event) => Some(SubmissionProgress::Progress(event)),
                BackendMessage::Finished(outcome) => {
                    self.finished = true;
                    self.rx.close();
                    Some(SubmissionProgress::Finished(outcome))
                }
            };
        }
    }

    /// Drain the stream, passing progress to `on_progress`, and return the
    /// terminal outcome.
    pub async fn finish(mut self, mut on_progress: impl FnMut(ProgressEvent)) -> SubmissionOutcome {
        loop {
            match self.next().await {
                Some(SubmissionProgress::Progress(event)) => on_progress(event),
                Some(SubmissionProgress::Finished(outcome)) => return outcome,
                None => {
                    let mut log = OperationLog::new();
                    log.add(LogLevel::Error, "submission stream was already finished");
                    return SubmissionOutcome::Failed(SubmissionError::from_log(log));
                }
            }
        }
    }
}

//! The verify-then-submit state machine.
//!
//! The controller owns the current phase and the single slot holding the last
//! verified resource. It runs on one task (the interactive context): user
//! requests call its methods directly, and workers report back through
//! [`WorkflowEvent`]s which the host feeds to [`WorkflowController::handle_event`].
//! Nothing else mutates it, so no locking is needed.
//!
//! Rules:
//! - Starting a verification clears the stored resource in the same step.
//! - Submission requires a stored resource; otherwise the user is told to
//!   verify first and nothing changes.
//! - At most one verification and one submission are outstanding; further
//!   requests are rejected.
//! - Results for a torn-down surface, an older attempt or an already finished
//!   submission are discarded.

use keylink_submission::{
    CorrelationId, CryptoInput, ProgressEvent, RequiredInput, SubmissionBackend,
    SubmissionCoordinator, SubmissionError, SubmissionOutcome, SubmissionProgress,
    SubmissionTarget,
};
use keylink_verification::{
    ResourceProvider, ResourceSpec, VerificationOutcome, VerificationRunner, VerifiedResource,
};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::WorkflowConfig;
use crate::host::{HostContext, NotificationKind};
use crate::lifecycle::SurfaceLifecycle;
use crate::phase::{VerifyControl, VerifyDisplay, WorkflowPhase};
use crate::WorkflowError;

const NEED_VERIFY_MESSAGE: &str = "Verify the resource before linking it to your key.";

/// Results marshalled from workers back onto the controller's task.
#[derive(Debug)]
pub enum WorkflowEvent {
    VerificationFinished(VerificationOutcome),
    SubmissionProgress {
        correlation: CorrelationId,
        event: ProgressEvent,
    },
    SubmissionFinished {
        correlation: CorrelationId,
        outcome: SubmissionOutcome,
    },
}

/// What to link, and the services that do the work.
pub struct WorkflowSetup {
    pub target: SubmissionTarget,
    pub spec: ResourceSpec,
    pub provider: Arc<dyn ResourceProvider>,
    pub backend: Arc<dyn SubmissionBackend>,
}

pub struct WorkflowController {
    target: SubmissionTarget,
    spec: ResourceSpec,
    provider: Arc<dyn ResourceProvider>,
    runner: VerificationRunner,
    coordinator: SubmissionCoordinator,
    host: HostContext,
    progress_title: String,
    events: mpsc::Sender<WorkflowEvent>,

    phase: WorkflowPhase,
    verified: Option<VerifiedResource>,
    display: VerifyDisplay,
    attempt: u64,
    correlation: u64,
    in_flight: Option<CorrelationId>,
    pending_input: Option<RequiredInput>,
    done_signalled: bool,
}

impl WorkflowController {
    /// Create a controller in [`WorkflowPhase::Idle`].
    ///
    /// The returned receiver carries worker results; the host must feed them
    /// back through [`handle_event`](Self::handle_event).
    pub fn new(
        setup: WorkflowSetup,
        host: HostContext,
        config: &WorkflowConfig,
    ) -> (Self, mpsc::Receiver<WorkflowEvent>) {
        let (events, rx) = mpsc::channel(config.event_capacity.max(1));
        let controller = Self {
            target: setup.target,
            spec: setup.spec,
            provider: setup.provider,
            runner: VerificationRunner::new(config.min_verify_duration()),
            coordinator: SubmissionCoordinator::new(setup.backend),
            host,
            progress_title: config.progress_title.clone(),
            events,
            phase: WorkflowPhase::Idle,
            verified: None,
            display: VerifyDisplay::pending(),
            attempt: 0,
            correlation: 0,
            in_flight: None,
            pending_input: None,
            done_signalled: false,
        };
        (controller, rx)
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn verified_resource(&self) -> Option<&VerifiedResource> {
        self.verified.as_ref()
    }

    pub fn display(&self) -> VerifyDisplay {
        self.display
    }

    /// Input the backend asked for on the last submission, if any.
    pub fn pending_input(&self) -> Option<&RequiredInput> {
        self.pending_input.as_ref()
    }

    /// Number of verification attempts started so far.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn target(&self) -> &SubmissionTarget {
        &self.target
    }

    pub fn lifecycle(&self) -> &SurfaceLifecycle {
        &self.host.lifecycle
    }

    /// Whether the verify control should be enabled.
    pub fn verify_enabled(&self) -> bool {
        self.ensure_can_verify().is_ok()
    }

    /// Whether the submit control should be enabled. It stays enabled
    /// without a verified resource so the user gets the guard message.
    pub fn submit_enabled(&self) -> bool {
        !matches!(self.phase, WorkflowPhase::Submitting | WorkflowPhase::Done)
    }

    // ── User requests ──────────────────────────────────────────────────

    /// Start a verification attempt.
    ///
    /// Any stored resource is invalidated immediately, before the new
    /// outcome is known.
    pub fn request_verify(&mut self) -> Result<(), WorkflowError> {
        self.ensure_can_verify()?;

        self.verified = None;
        self.pending_input = None;
        self.attempt += 1;
        self.display = VerifyDisplay::verifying();
        self.set_phase(WorkflowPhase::Verifying);

        let attempt = self.attempt;
        let runner = self.runner.clone();
        let provider = Arc::clone(&self.provider);
        let spec = self.spec.clone();
        let fingerprint = self.target.fingerprint;
        let events = self.events.clone();
        let lifecycle = self.host.lifecycle.clone();

        tokio::spawn(async move {
            let outcome = runner.run(provider, spec, fingerprint, attempt).await;
            if !lifecycle.is_alive() {
                tracing::debug!(attempt, "surface gone, discarding verification outcome");
                return;
            }
            if events
                .send(WorkflowEvent::VerificationFinished(outcome))
                .await
                .is_err()
            {
                tracing::debug!(attempt, "controller gone, discarding verification outcome");
            }
        });

        Ok(())
    }

    /// Submit the stored resource without extra crypto input.
    pub fn request_submit(&mut self) -> Result<(), WorkflowError> {
        self.request_submit_with(CryptoInput::default())
    }

    /// Submit the stored resource.
    ///
    /// Without a stored resource the user is notified and nothing changes.
    pub fn request_submit_with(&mut self, input: CryptoInput) -> Result<(), WorkflowError> {
        match self.phase {
            WorkflowPhase::Submitting => return Err(WorkflowError::SubmissionInProgress),
            WorkflowPhase::Done => return Err(WorkflowError::Finished),
            _ => {}
        }

        // While verifying the slot is always empty, so this also covers
        // submit requests racing a verification attempt.
        if self.verified.is_none() {
            tracing::info!(phase = %self.phase, "submit requested without a verified resource");
            self.host
                .notifier
                .notify(NotificationKind::NeedVerify, NEED_VERIFY_MESSAGE);
            return Ok(());
        }

        self.correlation += 1;
        let correlation = CorrelationId::new(self.correlation);
        let mut stream = match self.coordinator.submit_verified(
            correlation,
            self.target,
            self.verified.as_ref(),
            input,
        ) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(%correlation, error = %e, "could not build submission request");
                self.host
                    .notifier
                    .notify(NotificationKind::SubmitFailed, &e.to_string());
                return Err(e.into());
            }
        };

        self.in_flight = Some(correlation);
        self.pending_input = None;
        self.set_phase(WorkflowPhase::Submitting);
        self.host.progress.show(&self.progress_title);

        let events = self.events.clone();
        let lifecycle = self.host.lifecycle.clone();

        tokio::spawn(async move {
            // Drain to the terminal element even if nobody is listening:
            // the backend request is never cancelled.
            while let Some(item) = stream.next().await {
                let event = match item {
                    SubmissionProgress::Progress(event) => {
                        WorkflowEvent::SubmissionProgress { correlation, event }
                    }
                    SubmissionProgress::Finished(outcome) => {
                        WorkflowEvent::SubmissionFinished {
                            correlation,
                            outcome,
                        }
                    }
                };
                if !lifecycle.is_alive() {
                    tracing::debug!(%correlation, "surface gone, discarding submission message");
                    continue;
                }
                if events.send(event).await.is_err() {
                    tracing::debug!(%correlation, "controller gone, discarding submission message");
                }
            }
        });

        Ok(())
    }

    /// The user wants to leave the workflow. No state changes.
    pub fn back(&self) {
        tracing::debug!(phase = %self.phase, "back requested");
        self.host.exit.on_back();
    }

    // ── Worker results ─────────────────────────────────────────────────

    /// Apply a worker result. Stale results are ignored.
    pub fn handle_event(&mut self, event: WorkflowEvent) {
        if !self.host.lifecycle.is_alive() {
            tracing::debug!("surface gone, ignoring workflow event");
            return;
        }
        match event {
            WorkflowEvent::VerificationFinished(outcome) => self.on_verification(outcome),
            WorkflowEvent::SubmissionProgress { correlation, event } => {
                if self.is_current_submission(correlation) {
                    self.host.progress.update(&event);
                } else {
                    tracing::debug!(%correlation, "ignoring progress for stale submission");
                }
            }
            WorkflowEvent::SubmissionFinished {
                correlation,
                outcome,
            } => self.on_submission(correlation, outcome),
        }
    }

    /// The hosting surface went away. Safe to call in any phase.
    pub fn on_torn_down(&mut self) {
        if self.phase == WorkflowPhase::Submitting {
            // the backend keeps running; only the indicator goes
            self.host.progress.dismiss();
        }
        tracing::debug!(phase = %self.phase, "workflow surface torn down");
    }

    fn on_verification(&mut self, outcome: VerificationOutcome) {
        if self.phase != WorkflowPhase::Verifying || outcome.attempt() != self.attempt {
            tracing::debug!(
                attempt = outcome.attempt(),
                current = self.attempt,
                phase = %self.phase,
                "ignoring stale verification outcome"
            );
            return;
        }

        let attempt = outcome.attempt();
        let (log, result) = outcome.into_result();
        match result {
            Ok(resource) => {
                tracing::info!(attempt, uri = resource.resource().uri(), "resource verified");
                self.verified = Some(resource);
                self.display = VerifyDisplay::success();
                self.set_phase(WorkflowPhase::Verified);
            }
            Err(e) => {
                tracing::info!(attempt, error = %e, kind = %e.kind(), "verification failed");
                self.display = VerifyDisplay::error();
                self.set_phase(WorkflowPhase::VerifyFailed);
                let message = log.summary().map(str::to_string).unwrap_or_else(|| e.to_string());
                self.host
                    .notifier
                    .notify(NotificationKind::VerifyFailed, &message);
            }
        }
    }

    fn on_submission(&mut self, correlation: CorrelationId, outcome: SubmissionOutcome) {
        if !self.is_current_submission(correlation) {
            tracing::debug!(%correlation, "ignoring duplicate or stale submission result");
            return;
        }
        self.in_flight = None;
        self.host.progress.dismiss();

        match outcome {
            SubmissionOutcome::Succeeded(_) => {
                tracing::info!(%correlation, key_id = %self.target.key_id, "attestation persisted");
                self.set_phase(WorkflowPhase::Done);
                self.display.control = VerifyControl::Hidden;
                if !self.done_signalled {
                    self.done_signalled = true;
                    self.host.exit.on_done();
                }
            }
            SubmissionOutcome::Failed(e) => {
                if e.kind().is_retryable() {
                    tracing::warn!(%correlation, error = %e, "submission failed");
                } else {
                    tracing::error!(%correlation, error = %e, "submission failed and cannot be retried");
                }
                self.set_phase(WorkflowPhase::SubmitFailed);
                let message = match &e {
                    SubmissionError::BackendFailure { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                self.host
                    .notifier
                    .notify(NotificationKind::SubmitFailed, &message);
            }
            SubmissionOutcome::InputRequired(required) => {
                tracing::info!(%correlation, ?required, "backend requires more input");
                let message = match &required {
                    RequiredInput::Passphrase(key_id) => {
                        format!("Enter the passphrase for key {key_id} to continue.")
                    }
                    RequiredInput::SignatureTime => {
                        "A fixed signature time is required to continue.".to_string()
                    }
                };
                self.pending_input = Some(required);
                self.set_phase(WorkflowPhase::SubmitFailed);
                self.host
                    .notifier
                    .notify(NotificationKind::InputRequired, &message);
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    fn ensure_can_verify(&self) -> Result<(), WorkflowError> {
        match self.phase {
            WorkflowPhase::Verifying => Err(WorkflowError::VerificationInProgress),
            WorkflowPhase::Submitting => Err(WorkflowError::SubmissionInProgress),
            WorkflowPhase::Done => Err(WorkflowError::Finished),
            _ => Ok(()),
        }
    }

    fn is_current_submission(&self, correlation: CorrelationId) -> bool {
        self.phase == WorkflowPhase::Submitting && self.in_flight == Some(correlation)
    }

    fn set_phase(&mut self, next: WorkflowPhase) {
        tracing::debug!(from = %self.phase, to = %next, "workflow phase transition");
        self.phase = next;
    }
}

//! The interactive context: one task that owns the controller and applies
//! user actions and worker results in arrival order.

use keylink_submission::CryptoInput;
use tokio::sync::mpsc;

use crate::controller::{WorkflowController, WorkflowEvent};
use crate::phase::WorkflowPhase;

/// A user-triggered request.
#[derive(Debug)]
pub enum UserAction {
    Verify,
    Submit,
    SubmitWith(CryptoInput),
    Back,
}

pub struct WorkflowDriver {
    controller: WorkflowController,
    events: mpsc::Receiver<WorkflowEvent>,
}

impl WorkflowDriver {
    pub fn new(controller: WorkflowController, events: mpsc::Receiver<WorkflowEvent>) -> Self {
        Self { controller, events }
    }

    pub fn controller(&self) -> &WorkflowController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut WorkflowController {
        &mut self.controller
    }

    /// Process worker results until no verification or submission is
    /// outstanding, or the surface is torn down. Returns the phase reached.
    pub async fn settle(&mut self) -> WorkflowPhase {
        let lifecycle = self.controller.lifecycle().clone();
        while self.controller.phase().is_busy() {
            tokio::select! {
                biased;
                _ = lifecycle.torn_down() => {
                    self.controller.on_torn_down();
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.controller.handle_event(event),
                    None => break,
                },
            }
        }
        self.controller.phase()
    }

    /// Run until the workflow is done, the surface is torn down, or the
    /// action channel closes with nothing outstanding.
    pub async fn run(mut self, mut actions: mpsc::Receiver<UserAction>) -> WorkflowController {
        let lifecycle = self.controller.lifecycle().clone();
        let mut actions_open = true;

        loop {
            let phase = self.controller.phase();
            if phase.is_terminal() || (!actions_open && !phase.is_busy()) {
                break;
            }

            tokio::select! {
                biased;
                _ = lifecycle.torn_down() => {
                    self.controller.on_torn_down();
                    break;
                }
                Some(event) = self.events.recv() => self.controller.handle_event(event),
                action = actions.recv(), if actions_open => match action {
                    Some(action) => self.apply(action),
                    None => actions_open = false,
                },
            }
        }

        tracing::debug!(phase = %self.controller.phase(), "workflow driver stopped");
        self.controller
    }

    fn apply(&mut self, action: UserAction) {
        let result = match action {
            UserAction::Verify => self.controller.request_verify(),
            UserAction::Submit => self.controller.request_submit(),
            UserAction::SubmitWith(input) => self.controller.request_submit_with(input),
            UserAction::Back => {
                self.controller.back();
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, phase = %self.controller.phase(), "user action rejected");
        }
    }
}

//! Verify-then-submit workflow for linked identities.
//!
//! Two phases, strictly ordered:
//! 1. **Verify**: check off the interactive path that the external resource
//!    contains the proof token, with a minimum perceived duration.
//! 2. **Submit**: only with a fresh verified resource, send the attestation to
//!    the key-management backend and follow its progress to a terminal result.
//!
//! [`WorkflowController`] is the state machine, [`WorkflowDriver`] the
//! single-task event loop hosting it, and [`HostContext`] the explicit set of
//! user-facing collaborators.

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod phase;

pub use config::WorkflowConfig;
pub use controller::{WorkflowController, WorkflowEvent, WorkflowSetup};
pub use driver::{UserAction, WorkflowDriver};
pub use error::WorkflowError;
pub use host::{HostContext, NotificationKind, Notifier, ProgressIndicator, WorkflowExit};
pub use lifecycle::SurfaceLifecycle;
pub use logging::{init_logging, LogFormat};
pub use phase::{VerifyControl, VerifyDisplay, VerifyStatus, WorkflowPhase};

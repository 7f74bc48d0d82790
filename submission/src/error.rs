use keylink_types::{ErrorKind, OperationLog};
use keylink_verification::VerificationError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("no verified resource: the resource must be verified before submitting")]
    NoVerifiedResource,

    #[error("backend failure: {message}")]
    BackendFailure { message: String, log: OperationLog },

    #[error("attestation could not be built: {0}")]
    Attestation(#[from] VerificationError),
}

impl SubmissionError {
    /// A backend failure whose message is the log's summary.
    pub fn from_log(log: OperationLog) -> Self {
        let message = log
            .summary()
            .unwrap_or("backend reported failure")
            .to_string();
        SubmissionError::BackendFailure { message, log }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmissionError::NoVerifiedResource => ErrorKind::NoVerifiedResource,
            SubmissionError::BackendFailure { .. } | SubmissionError::Attestation(_) => {
                ErrorKind::SubmissionBackendFailure
            }
        }
    }

    /// Diagnostics attached by the backend, if any.
    pub fn log(&self) -> Option<&OperationLog> {
        match self {
            SubmissionError::BackendFailure { log, .. } => Some(log),
            _ => None,
        }
    }
}

use keylink_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("resource could not be resolved: {0}")]
    ResolutionFailed(String),

    #[error("resource does not contain the expected proof: {0}")]
    VerificationMismatch(String),

    #[error("verification attempt was interrupted: {0}")]
    Interrupted(String),

    #[error("attestation encoding failed: {0}")]
    Encoding(String),
}

impl VerificationError {
    /// Map onto the shared taxonomy. An interrupted attempt is reported as a
    /// mismatch: the proof was not confirmed, and retrying is the remedy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerificationError::ResolutionFailed(_) => ErrorKind::ResolutionFailed,
            VerificationError::VerificationMismatch(_)
            | VerificationError::Interrupted(_)
            | VerificationError::Encoding(_) => ErrorKind::VerificationMismatch,
        }
    }
}

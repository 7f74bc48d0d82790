//! Error types shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Parse errors for the fundamental types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("invalid key id: {0}")]
    InvalidKeyId(String),
}

/// Coarse classification of every failure the linking workflow can produce.
///
/// Each crate keeps its own detailed error enum; this is the common
/// vocabulary used for notifications and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The resource handle could not be obtained. Retryable.
    ResolutionFailed,
    /// The resource was reachable but did not contain the expected proof. Retryable.
    VerificationMismatch,
    /// Submission was attempted without a currently valid verified resource.
    NoVerifiedResource,
    /// The backend rejected or failed the persistence request. Retryable
    /// with the same verified resource.
    SubmissionBackendFailure,
}

impl ErrorKind {
    /// Whether the user can recover by simply trying again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::NoVerifiedResource)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ResolutionFailed => "resolution failed",
            ErrorKind::VerificationMismatch => "verification mismatch",
            ErrorKind::NoVerifiedResource => "no verified resource",
            ErrorKind::SubmissionBackendFailure => "submission backend failure",
        };
        f.write_str(s)
    }
}

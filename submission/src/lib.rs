//! Attestation submission.
//!
//! Once a resource is verified, its attestation is sent to a key-management
//! backend over a message channel. The backend streams progress and finishes
//! with exactly one terminal result; a request is only ever built from a
//! verified resource.

pub mod backend;
pub mod channel;
pub mod coordinator;
pub mod error;
pub mod request;

pub use backend::SubmissionBackend;
pub use channel::{
    channel, BackendReply, ProgressEvent, RequiredInput, SubmissionOutcome, SubmissionProgress,
    SubmissionResult, SubmissionStream,
};
pub use coordinator::SubmissionCoordinator;
pub use error::SubmissionError;
pub use request::{CorrelationId, CryptoInput, SubmissionRequest, SubmissionTarget};

//! Linked resource verification.
//!
//! A user proves control of an external resource by publishing a proof token
//! there. This crate checks such a resource:
//! 1. **Resolve** the resource spec into a handle.
//! 2. **Verify** the handle contains the token for the key fingerprint.
//!
//! Resolution and checking are supplied by a [`ResourceProvider`]; the
//! [`VerificationRunner`] sequences them off the interactive path and enforces
//! a minimum perceived duration.

pub mod attestation;
pub mod error;
pub mod outcome;
pub mod resource;
pub mod runner;
pub mod token;

pub use attestation::{AttestationPayload, LinkedAttribute};
pub use error::VerificationError;
pub use outcome::{VerificationOutcome, VerifiedResource};
pub use resource::{LinkedResource, ResourceKind, ResourceProvider, ResourceSpec, VerifyReport};
pub use runner::{VerificationRunner, DEFAULT_MIN_DURATION};

//! Fundamental types for keylink.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! key fingerprints, key ids, operation logs and the common error vocabulary.

pub mod error;
pub mod fingerprint;
pub mod keys;
pub mod log;

pub use error::{ErrorKind, TypesError};
pub use fingerprint::Fingerprint;
pub use keys::KeyId;
pub use log::{LogEntry, LogLevel, OperationLog};

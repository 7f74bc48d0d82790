//! Nullable infrastructure for deterministic testing.
//!
//! Everything the workflow talks to (resource provider, submission backend,
//! host surface) is abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Answer from a script the test controls
//! - Record every call for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod backend;
pub mod host;
pub mod provider;

pub use backend::{BackendScript, NullBackend};
pub use host::{NullHost, RecordingExit, RecordingNotifier, RecordingProgress};
pub use provider::{NullProvider, ProviderScript};

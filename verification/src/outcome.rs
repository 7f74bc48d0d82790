//! Results of a single verification attempt.

use keylink_types::{Fingerprint, OperationLog};
use std::time::Duration;

use crate::attestation::{AttestationPayload, LinkedAttribute};
use crate::error::VerificationError;
use crate::resource::LinkedResource;

/// A resource confirmed, as of attempt `attempt`, to contain the proof token
/// for `fingerprint`.
///
/// Deliberately not `Clone`: the workflow keeps exactly one and replaces it
/// rather than sharing it.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifiedResource {
    resource: LinkedResource,
    fingerprint: Fingerprint,
    attempt: u64,
}

impl VerifiedResource {
    pub(crate) fn new(resource: LinkedResource, fingerprint: Fingerprint, attempt: u64) -> Self {
        Self {
            resource,
            fingerprint,
            attempt,
        }
    }

    pub fn resource(&self) -> &LinkedResource {
        &self.resource
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// The verification attempt that produced this resource.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Build the payload that binds this resource to the key.
    pub fn to_attestation(&self) -> Result<AttestationPayload, VerificationError> {
        LinkedAttribute::new(self.resource.uri()).encode()
    }
}

/// Immutable result of one verification attempt.
///
/// `resource()` is `Some` exactly when `success()` is true, and `error()` is
/// `Some` exactly when it is false.
#[derive(Debug)]
pub struct VerificationOutcome {
    attempt: u64,
    log: OperationLog,
    result: Result<VerifiedResource, VerificationError>,
    appendix: Option<String>,
    elapsed: Duration,
}

impl VerificationOutcome {
    pub fn succeeded(
        attempt: u64,
        resource: LinkedResource,
        fingerprint: Fingerprint,
        log: OperationLog,
        appendix: Option<String>,
    ) -> Self {
        Self {
            attempt,
            log,
            result: Ok(VerifiedResource::new(resource, fingerprint, attempt)),
            appendix,
            elapsed: Duration::ZERO,
        }
    }

    pub fn unresolved(attempt: u64, log: OperationLog) -> Self {
        let reason = log.summary().unwrap_or("no resource handle").to_string();
        Self::failed(attempt, log, VerificationError::ResolutionFailed(reason), None)
    }

    pub fn mismatched(attempt: u64, log: OperationLog, appendix: Option<String>) -> Self {
        let reason = log.summary().unwrap_or("proof token not found").to_string();
        Self::failed(
            attempt,
            log,
            VerificationError::VerificationMismatch(reason),
            appendix,
        )
    }

    pub fn interrupted(attempt: u64, log: OperationLog, reason: impl Into<String>) -> Self {
        Self::failed(attempt, log, VerificationError::Interrupted(reason.into()), None)
    }

    fn failed(
        attempt: u64,
        log: OperationLog,
        error: VerificationError,
        appendix: Option<String>,
    ) -> Self {
        Self {
            attempt,
            log,
            result: Err(error),
            appendix,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    pub fn resource(&self) -> Option<&VerifiedResource> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&VerificationError> {
        self.result.as_ref().err()
    }

    pub fn appendix(&self) -> Option<&str> {
        self.appendix.as_deref()
    }

    /// Wall-clock time from the start of the attempt to delivery.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Consume the outcome, yielding the verified resource or the error.
    pub fn into_result(self) -> (OperationLog, Result<VerifiedResource, VerificationError>) {
        (self.log, self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSpec;
    use keylink_types::LogLevel;

    fn resource() -> LinkedResource {
        LinkedResource::from_spec(ResourceSpec::Https {
            uri: "https://example.org/proof".into(),
        })
    }

    #[test]
    fn success_carries_resource_and_no_error() {
        let fp = Fingerprint::new([1; 20]);
        let outcome = VerificationOutcome::succeeded(3, resource(), fp, OperationLog::new(), None);
        assert!(outcome.success());
        assert!(outcome.error().is_none());
        let verified = outcome.resource().unwrap();
        assert_eq!(verified.attempt(), 3);
        assert_eq!(verified.fingerprint(), &fp);
    }

    #[test]
    fn unresolved_uses_log_summary() {
        let mut log = OperationLog::new();
        log.add(LogLevel::Error, "host not found");
        let outcome = VerificationOutcome::unresolved(1, log);
        assert!(!outcome.success());
        assert!(outcome.resource().is_none());
        assert_eq!(
            outcome.error(),
            Some(&VerificationError::ResolutionFailed("host not found".into()))
        );
    }

    #[test]
    fn mismatch_without_log_has_default_reason() {
        let outcome = VerificationOutcome::mismatched(1, OperationLog::new(), None);
        assert_eq!(
            outcome.error(),
            Some(&VerificationError::VerificationMismatch(
                "proof token not found".into()
            ))
        );
    }

    #[test]
    fn attestation_binds_resource_uri() {
        let verified = VerifiedResource::new(resource(), Fingerprint::new([2; 20]), 1);
        let payload = verified.to_attestation().unwrap();
        assert_eq!(payload.decode().unwrap().uri, "https://example.org/proof");
    }
}

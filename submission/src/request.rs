//! Submission requests and the inputs that go into them.

use keylink_types::{Fingerprint, KeyId};
use keylink_verification::{AttestationPayload, VerifiedResource};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::SubmissionError;

/// Identifies one in-flight submission on a backend channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(u64);

impl CorrelationId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The key an attestation is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionTarget {
    pub key_id: KeyId,
    pub fingerprint: Fingerprint,
}

impl SubmissionTarget {
    pub fn new(key_id: KeyId, fingerprint: Fingerprint) -> Self {
        Self {
            key_id,
            fingerprint,
        }
    }

    /// Target the master key the fingerprint belongs to.
    pub fn from_fingerprint(fingerprint: Fingerprint) -> Self {
        Self::new(KeyId::from_fingerprint(&fingerprint), fingerprint)
    }
}

/// Extra input a backend may need before it can modify key material.
///
/// The passphrase is wiped from memory on drop and never printed.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CryptoInput {
    pub passphrase: Option<String>,
    /// Signature creation time, seconds since the Unix epoch.
    pub signature_time: Option<u64>,
}

impl CryptoInput {
    pub fn with_passphrase(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Some(passphrase.into()),
            signature_time: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passphrase.is_none() && self.signature_time.is_none()
    }
}

impl fmt::Debug for CryptoInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoInput")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("signature_time", &self.signature_time)
            .finish()
    }
}

/// Everything the backend needs to persist one attestation.
#[derive(Clone, Debug)]
pub struct SubmissionRequest {
    correlation: CorrelationId,
    target: SubmissionTarget,
    uri: String,
    payload: AttestationPayload,
    crypto_input: CryptoInput,
}

impl SubmissionRequest {
    /// Build a request from the currently held verified resource.
    ///
    /// Fails with [`SubmissionError::NoVerifiedResource`] when there is no
    /// resource, or when it was verified for a different fingerprint.
    pub fn build(
        correlation: CorrelationId,
        target: SubmissionTarget,
        resource: Option<&VerifiedResource>,
        crypto_input: CryptoInput,
    ) -> Result<Self, SubmissionError> {
        let resource = resource.ok_or(SubmissionError::NoVerifiedResource)?;
        if resource.fingerprint() != &target.fingerprint {
            return Err(SubmissionError::NoVerifiedResource);
        }
        let payload = resource.to_attestation()?;
        Ok(Self {
            correlation,
            target,
            uri: resource.resource().uri().to_string(),
            payload,
            crypto_input,
        })
    }

    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    pub fn target(&self) -> &SubmissionTarget {
        &self.target
    }

    pub fn target_key_id(&self) -> KeyId {
        self.target.key_id
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.target.fingerprint
    }

    /// URI of the linked resource the payload was derived from.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn payload(&self) -> &AttestationPayload {
        &self.payload
    }

    pub fn crypto_input(&self) -> &CryptoInput {
        &self.crypto_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylink_types::OperationLog;
    use keylink_verification::{LinkedResource, ResourceSpec, VerificationOutcome};

    fn verified(fp: Fingerprint) -> VerifiedResource {
        let resource = LinkedResource::from_spec(ResourceSpec::Dns {
            fqdn: "example.org".into(),
        });
        let (_, result) =
            VerificationOutcome::succeeded(1, resource, fp, OperationLog::new(), None).into_result();
        result.unwrap()
    }

    #[test]
    fn build_without_resource_fails_fast() {
        let target = SubmissionTarget::from_fingerprint(Fingerprint::new([1; 20]));
        let err =
            SubmissionRequest::build(CorrelationId::new(1), target, None, CryptoInput::default())
                .unwrap_err();
        assert_eq!(err, SubmissionError::NoVerifiedResource);
    }

    #[test]
    fn build_rejects_resource_for_other_key() {
        let resource = verified(Fingerprint::new([2; 20]));
        let target = SubmissionTarget::from_fingerprint(Fingerprint::new([1; 20]));
        let err = SubmissionRequest::build(
            CorrelationId::new(1),
            target,
            Some(&resource),
            CryptoInput::default(),
        )
        .unwrap_err();
        assert_eq!(err, SubmissionError::NoVerifiedResource);
    }

    #[test]
    fn build_derives_payload_from_resource() {
        let fp = Fingerprint::new([3; 20]);
        let resource = verified(fp);
        let request = SubmissionRequest::build(
            CorrelationId::new(7),
            SubmissionTarget::from_fingerprint(fp),
            Some(&resource),
            CryptoInput::default(),
        )
        .unwrap();
        assert_eq!(request.correlation(), CorrelationId::new(7));
        assert_eq!(request.uri(), "dns:example.org?TYPE=TXT");
        assert_eq!(
            request.payload(),
            &resource.to_attestation().unwrap()
        );
        assert_eq!(request.target_key_id(), KeyId::from_fingerprint(&fp));
    }

    #[test]
    fn crypto_input_debug_redacts_passphrase() {
        let input = CryptoInput::with_passphrase("hunter2");
        let printed = format!("{input:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}

//! Attestation payloads derived from verified resources.
//!
//! The payload is what the backend stores next to the key: a versioned
//! record of the linked URI. Its byte encoding is opaque to the workflow.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VerificationError;

type Blake2b256 = Blake2b<U32>;

/// Current [`LinkedAttribute`] encoding version.
pub const LINKED_ATTRIBUTE_VERSION: u8 = 1;

/// The record persisted as a user attribute on the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAttribute {
    pub version: u8,
    pub uri: String,
}

impl LinkedAttribute {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            version: LINKED_ATTRIBUTE_VERSION,
            uri: uri.into(),
        }
    }

    pub fn encode(&self) -> Result<AttestationPayload, VerificationError> {
        bincode::serialize(self)
            .map(AttestationPayload)
            .map_err(|e| VerificationError::Encoding(e.to_string()))
    }
}

/// Opaque attestation bytes handed to the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationPayload(Vec<u8>);

impl AttestationPayload {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// BLAKE2b-256 digest of the payload bytes.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Blake2b256::new();
        hasher.update(&self.0);
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        output
    }

    /// Decode back into the attribute record.
    pub fn decode(&self) -> Result<LinkedAttribute, VerificationError> {
        bincode::deserialize(&self.0).map_err(|e| VerificationError::Encoding(e.to_string()))
    }
}

impl fmt::Debug for AttestationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digest = self.digest();
        write!(f, "AttestationPayload({} bytes, ", self.0.len())?;
        for b in &digest[..4] {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_preserves_uri() {
        let attr = LinkedAttribute::new("dns:example.org?TYPE=TXT");
        let payload = attr.encode().unwrap();
        assert_eq!(payload.decode().unwrap(), attr);
    }

    #[test]
    fn digest_distinguishes_uris() {
        let a = LinkedAttribute::new("https://a.example").encode().unwrap();
        let b = LinkedAttribute::new("https://b.example").encode().unwrap();
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), a.clone().digest());
    }

    #[test]
    fn garbage_fails_to_decode() {
        let payload = AttestationPayload::from_bytes(vec![0xff]);
        assert!(matches!(
            payload.decode(),
            Err(VerificationError::Encoding(_))
        ));
    }
}

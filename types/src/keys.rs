//! Key identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;
use crate::fingerprint::Fingerprint;

/// A 64-bit OpenPGP master key id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(u64);

impl KeyId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The v4 key id is the low 64 bits of the fingerprint.
    pub fn from_fingerprint(fingerprint: &Fingerprint) -> Self {
        let bytes = fingerprint.as_bytes();
        let mut low = [0u8; 8];
        low.copy_from_slice(&bytes[12..]);
        Self(u64::from_be_bytes(low))
    }
}

impl FromStr for KeyId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| TypesError::InvalidKeyId(format!("{s:?}: {e}")))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({self})")
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

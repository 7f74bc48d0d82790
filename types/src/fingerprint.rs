//! OpenPGP key fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A 20-byte OpenPGP v4 fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    pub const LEN: usize = 20;

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a fingerprint from hex.
    ///
    /// Accepts an optional `0x` prefix, embedded spaces (as printed by most
    /// OpenPGP tools) and either case.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

        let bytes = hex::decode(&compact)
            .map_err(|e| TypesError::InvalidFingerprint(format!("{s:?}: {e}")))?;
        let arr: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| {
            TypesError::InvalidFingerprint(format!(
                "{s:?}: expected {} bytes, got {}",
                Self::LEN,
                v.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(&self.0[16..]))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

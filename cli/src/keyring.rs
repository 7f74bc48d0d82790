//! A JSON file standing in for a key store.
//!
//! Each key entry records its fingerprint, whether it is passphrase
//! protected, and the linked attributes attached to it so far.

use keylink_submission::{
    BackendReply, ProgressEvent, RequiredInput, SubmissionBackend, SubmissionRequest,
    SubmissionResult,
};
use keylink_types::{LogLevel, OperationLog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STEPS: u32 = 3;

/// On-disk keyring document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyring {
    #[serde(default)]
    pub keys: BTreeMap<String, KeyEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub fingerprint: String,
    /// Modifying a locked key needs a passphrase.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub linked: Vec<LinkedRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedRecord {
    pub version: u8,
    pub uri: String,
    /// Hex digest of the attestation payload.
    pub digest: String,
    /// Signature creation time, if the caller fixed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<u64>,
}

impl Keyring {
    /// Load from `path`; a missing file is an empty keyring.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

/// Result of applying one request to the keyring.
enum Applied {
    Saved(OperationLog),
    NeedsInput(RequiredInput),
    Failed(OperationLog),
}

/// Persists attestations into a [`Keyring`] file.
#[derive(Clone, Debug)]
pub struct FileKeyringBackend {
    path: PathBuf,
}

impl FileKeyringBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SubmissionBackend for FileKeyringBackend {
    fn dispatch(&self, request: SubmissionRequest, reply: BackendReply) {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || match apply(&path, &request, &reply) {
            Applied::Saved(log) => reply.succeed(SubmissionResult { log }),
            Applied::NeedsInput(input) => reply.require_input(input),
            Applied::Failed(log) => reply.fail(log),
        });
    }
}

fn apply(path: &Path, request: &SubmissionRequest, reply: &BackendReply) -> Applied {
    let mut log = OperationLog::new();
    let key = request.target_key_id().to_string();

    reply.progress(ProgressEvent::new("loading keyring", 1, STEPS));
    let mut keyring = match Keyring::load(path) {
        Ok(keyring) => keyring,
        Err(e) => {
            log.add(LogLevel::Error, format!("cannot load keyring {}: {e}", path.display()));
            return Applied::Failed(log);
        }
    };

    let fingerprint = request.fingerprint().to_hex();
    let entry = keyring.keys.entry(key.clone()).or_insert_with(|| KeyEntry {
        fingerprint: fingerprint.clone(),
        ..KeyEntry::default()
    });
    if !entry.fingerprint.eq_ignore_ascii_case(&fingerprint) {
        log.add(
            LogLevel::Error,
            format!("key {key} belongs to a different fingerprint"),
        );
        return Applied::Failed(log);
    }
    if entry.locked && request.crypto_input().passphrase.is_none() {
        return Applied::NeedsInput(RequiredInput::Passphrase(request.target_key_id()));
    }

    reply.progress(ProgressEvent::new("adding linked attribute", 2, STEPS));
    let attribute = match request.payload().decode() {
        Ok(attribute) => attribute,
        Err(e) => {
            log.add(LogLevel::Error, format!("attestation is unreadable: {e}"));
            return Applied::Failed(log);
        }
    };
    let digest = hex::encode(request.payload().digest());
    if entry.linked.iter().any(|r| r.digest == digest) {
        log.add(LogLevel::Info, format!("{} is already linked to {key}", attribute.uri));
    } else {
        entry.linked.push(LinkedRecord {
            version: attribute.version,
            uri: attribute.uri.clone(),
            digest,
            signed_at: request.crypto_input().signature_time,
        });
        log.add(LogLevel::Info, format!("linked {} to {key}", attribute.uri));
    }

    reply.progress(ProgressEvent::new("saving keyring", 3, STEPS));
    if let Err(e) = keyring.save(path) {
        log.add(LogLevel::Error, format!("cannot save keyring {}: {e}", path.display()));
        return Applied::Failed(log);
    }
    tracing::info!(key_id = %key, uri = request.uri(), "attestation saved to keyring");
    Applied::Saved(log)
}

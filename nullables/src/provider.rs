//! Nullable resource provider: scripted resolve/verify results.

use keylink_types::{Fingerprint, LogLevel, OperationLog};
use keylink_verification::{LinkedResource, ResourceProvider, ResourceSpec, VerifyReport};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What one verification attempt should see.
#[derive(Clone, Debug)]
pub enum ProviderScript {
    /// Resolve, then find the token.
    Verified,
    /// Resolve, but the token is missing.
    Mismatch(String),
    /// The resource cannot be resolved.
    Unresolved(String),
    /// Resolve, then panic inside the check.
    Panic,
}

/// A provider that never touches the network.
///
/// Scripts are consumed one per attempt; once exhausted every attempt
/// verifies successfully.
pub struct NullProvider {
    scripts: Mutex<VecDeque<ProviderScript>>,
    current: Mutex<Option<ProviderScript>>,
    resolve_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::scripted([])
    }

    pub fn scripted(scripts: impl IntoIterator<Item = ProviderScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            current: Mutex::new(None),
            resolve_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProvider for NullProvider {
    fn resolve(&self, spec: &ResourceSpec, log: &mut OperationLog) -> Option<LinkedResource> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ProviderScript::Verified);

        if let ProviderScript::Unresolved(reason) = &script {
            log.add(LogLevel::Error, reason.clone());
            return None;
        }
        log.add(LogLevel::Info, format!("resolved {}", spec.uri()));
        *self.current.lock().unwrap() = Some(script);
        Some(LinkedResource::from_spec(spec.clone()))
    }

    fn verify(&self, resource: &LinkedResource, fingerprint: &Fingerprint) -> VerifyReport {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        let script = self
            .current
            .lock()
            .unwrap()
            .take()
            .unwrap_or(ProviderScript::Verified);

        let mut log = OperationLog::new();
        match script {
            ProviderScript::Verified => {
                log.add(
                    LogLevel::Info,
                    format!("token for {} found at {}", fingerprint.to_hex(), resource.uri()),
                );
                VerifyReport::ok(log)
            }
            ProviderScript::Mismatch(reason) => {
                log.add(LogLevel::Error, reason);
                VerifyReport::failed(log)
            }
            ProviderScript::Unresolved(reason) => {
                log.add(LogLevel::Error, reason);
                VerifyReport::failed(log)
            }
            ProviderScript::Panic => panic!("provider blew up while checking {}", resource.uri()),
        }
    }
}

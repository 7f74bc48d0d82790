//! Linked resources and the pluggable capability that checks them.
//!
//! The workflow does not know HOW a given resource is checked, only THAT a
//! provider can resolve it and confirm the proof token. Resource variants are
//! plain data; behaviour comes from a [`ResourceProvider`] supplied by the host.

use keylink_types::{Fingerprint, OperationLog};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Fieldless tag for a [`ResourceSpec`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Https,
    Dns,
    GitHub,
    Local,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Https => "https",
            ResourceKind::Dns => "dns",
            ResourceKind::GitHub => "github",
            ResourceKind::Local => "local",
        };
        f.write_str(s)
    }
}

/// Which resource should contain the proof token, with its parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceSpec {
    /// A document served over HTTPS.
    Https { uri: String },
    /// A TXT record on a domain.
    Dns { fqdn: String },
    /// A public gist.
    GitHub { user: String, gist_id: String },
    /// A file on the local filesystem.
    Local { path: PathBuf },
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Https { .. } => ResourceKind::Https,
            ResourceSpec::Dns { .. } => ResourceKind::Dns,
            ResourceSpec::GitHub { .. } => ResourceKind::GitHub,
            ResourceSpec::Local { .. } => ResourceKind::Local,
        }
    }

    /// Canonical URI recorded in the attestation.
    pub fn uri(&self) -> String {
        match self {
            ResourceSpec::Https { uri } => uri.clone(),
            ResourceSpec::Dns { fqdn } => format!("dns:{fqdn}?TYPE=TXT"),
            ResourceSpec::GitHub { user, gist_id } => {
                format!("https://gist.github.com/{user}/{gist_id}")
            }
            ResourceSpec::Local { path } => format!("file://{}", path.display()),
        }
    }
}

/// A resolved resource handle.
///
/// Only providers construct these; holding one means resolution succeeded,
/// not that the proof was found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedResource {
    spec: ResourceSpec,
    uri: String,
}

impl LinkedResource {
    pub fn new(spec: ResourceSpec, uri: impl Into<String>) -> Self {
        Self {
            spec,
            uri: uri.into(),
        }
    }

    /// Resolve to the canonical URI of `spec`.
    pub fn from_spec(spec: ResourceSpec) -> Self {
        let uri = spec.uri();
        Self { spec, uri }
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// What a provider reports after checking a resolved resource.
#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    pub success: bool,
    pub log: OperationLog,
    /// Provider-specific extra detail, e.g. the matched line.
    pub appendix: Option<String>,
}

impl VerifyReport {
    pub fn ok(log: OperationLog) -> Self {
        Self {
            success: true,
            log,
            appendix: None,
        }
    }

    pub fn failed(log: OperationLog) -> Self {
        Self {
            success: false,
            log,
            appendix: None,
        }
    }

    pub fn with_appendix(mut self, appendix: impl Into<String>) -> Self {
        self.appendix = Some(appendix.into());
        self
    }
}

/// A pluggable resolve-and-verify capability.
///
/// Both methods are blocking and are only ever called from a worker thread.
pub trait ResourceProvider: Send + Sync {
    /// Turn a spec into a handle. On failure return `None` and explain why
    /// in `log`.
    fn resolve(&self, spec: &ResourceSpec, log: &mut OperationLog) -> Option<LinkedResource>;

    /// Check that `resource` carries the proof token for `fingerprint`.
    fn verify(&self, resource: &LinkedResource, fingerprint: &Fingerprint) -> VerifyReport;
}

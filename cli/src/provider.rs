//! Local-file resource provider.

use keylink_types::{Fingerprint, LogLevel, OperationLog};
use keylink_verification::{token, LinkedResource, ResourceProvider, ResourceSpec, VerifyReport};

/// Checks resources that live on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileProvider;

impl ResourceProvider for LocalFileProvider {
    fn resolve(&self, spec: &ResourceSpec, log: &mut OperationLog) -> Option<LinkedResource> {
        let ResourceSpec::Local { path } = spec else {
            log.add(
                LogLevel::Error,
                format!("{} resources are not supported here, only local files", spec.kind()),
            );
            return None;
        };

        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                log.add(LogLevel::Info, format!("found {}", path.display()));
                Some(LinkedResource::from_spec(spec.clone()))
            }
            Ok(_) => {
                log.add(LogLevel::Error, format!("{} is not a regular file", path.display()));
                None
            }
            Err(e) => {
                log.add(LogLevel::Error, format!("cannot open {}: {e}", path.display()));
                None
            }
        }
    }

    fn verify(&self, resource: &LinkedResource, fingerprint: &Fingerprint) -> VerifyReport {
        let mut log = OperationLog::new();
        let ResourceSpec::Local { path } = resource.spec() else {
            log.add(LogLevel::Error, "resource is not a local file");
            return VerifyReport::failed(log);
        };

        log.add(LogLevel::Info, format!("reading {}", resource.uri()));
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log.add_indented(LogLevel::Error, format!("read failed: {e}"), 1);
                return VerifyReport::failed(log);
            }
        };

        match token::find_token(&text, fingerprint) {
            Some(line) => {
                log.add_indented(LogLevel::Info, "proof token found", 1);
                VerifyReport::ok(log).with_appendix(line)
            }
            None => {
                log.add_indented(
                    LogLevel::Error,
                    format!("proof token for {} not found", fingerprint.to_hex()),
                    1,
                );
                VerifyReport::failed(log)
            }
        }
    }
}

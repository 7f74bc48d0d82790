//! Timed, off-thread verification attempts.
//!
//! The runner resolves and checks a resource on tokio's blocking pool, then
//! holds delivery until a minimum duration has passed since the attempt
//! started. The floor only ever delays delivery, never the check itself.

use keylink_types::{Fingerprint, LogLevel, OperationLog};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::outcome::VerificationOutcome;
use crate::resource::{ResourceProvider, ResourceSpec};

/// Default floor on perceived verification time.
pub const DEFAULT_MIN_DURATION: Duration = Duration::from_millis(1000);

/// Result of the blocking half of an attempt.
enum Checked {
    /// Resolution failed; deliver at once.
    Unresolved(OperationLog),
    /// The provider ran its check; deliver no earlier than the floor.
    Done(VerificationOutcome),
}

/// Runs verification attempts. Holds no state between calls.
#[derive(Clone, Debug)]
pub struct VerificationRunner {
    min_duration: Duration,
}

impl Default for VerificationRunner {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DURATION)
    }
}

impl VerificationRunner {
    pub fn new(min_duration: Duration) -> Self {
        Self { min_duration }
    }

    /// Run one attempt for `spec` against `fingerprint`.
    ///
    /// Never blocks the calling task. A panicking provider is reported as an
    /// interrupted attempt rather than propagated.
    pub async fn run(
        &self,
        provider: Arc<dyn ResourceProvider>,
        spec: ResourceSpec,
        fingerprint: Fingerprint,
        attempt: u64,
    ) -> VerificationOutcome {
        let started = Instant::now();
        let deadline = started + self.min_duration;
        let kind = spec.kind();

        tracing::debug!(attempt, %kind, %fingerprint, "verification attempt started");

        let checked = tokio::task::spawn_blocking(move || {
            check(provider.as_ref(), &spec, &fingerprint, attempt)
        })
        .await;

        let outcome = match checked {
            Ok(Checked::Unresolved(log)) => {
                tracing::info!(attempt, %kind, "resource could not be resolved");
                return VerificationOutcome::unresolved(attempt, log).with_elapsed(started.elapsed());
            }
            Ok(Checked::Done(outcome)) => outcome,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "verification task failed");
                let mut log = OperationLog::new();
                log.add(LogLevel::Error, "verification was interrupted");
                VerificationOutcome::interrupted(attempt, log, e.to_string())
            }
        };

        if Instant::now() < deadline {
            tokio::time::sleep_until(deadline).await;
        }

        let elapsed = started.elapsed();
        tracing::info!(
            attempt,
            %kind,
            success = outcome.success(),
            elapsed_ms = elapsed.as_millis() as u64,
            "verification attempt finished"
        );
        outcome.with_elapsed(elapsed)
    }
}

fn check(
    provider: &dyn ResourceProvider,
    spec: &ResourceSpec,
    fingerprint: &Fingerprint,
    attempt: u64,
) -> Checked {
    let mut log = OperationLog::new();
    let Some(resource) = provider.resolve(spec, &mut log) else {
        return Checked::Unresolved(log);
    };

    let report = provider.verify(&resource, fingerprint);
    log.extend(report.log);

    if report.success {
        Checked::Done(VerificationOutcome::succeeded(
            attempt,
            resource,
            *fingerprint,
            log,
            report.appendix,
        ))
    } else {
        Checked::Done(VerificationOutcome::mismatched(attempt, log, report.appendix))
    }
}

//! End-to-end workflow scenarios against nullable collaborators.

use keylink_nullables::{BackendScript, NullBackend, NullHost, NullProvider, ProviderScript};
use keylink_submission::{
    CorrelationId, CryptoInput, ProgressEvent, RequiredInput, SubmissionOutcome,
    SubmissionResult, SubmissionTarget,
};
use keylink_types::{Fingerprint, OperationLog};
use keylink_verification::{ResourceSpec, VerificationOutcome};
use keylink_workflow::{
    NotificationKind, UserAction, VerifyControl, VerifyStatus, WorkflowConfig, WorkflowController,
    WorkflowDriver, WorkflowError, WorkflowEvent, WorkflowPhase, WorkflowSetup,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

const MIN_DURATION: Duration = Duration::from_millis(1000);

struct Harness {
    host: NullHost,
    provider: Arc<NullProvider>,
    backend: Arc<NullBackend>,
    driver: WorkflowDriver,
}

fn fingerprint() -> Fingerprint {
    Fingerprint::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap()
}

fn harness(provider: NullProvider, backend: NullBackend) -> Harness {
    let host = NullHost::new();
    let provider = Arc::new(provider);
    let backend = Arc::new(backend);
    let setup = WorkflowSetup {
        target: SubmissionTarget::from_fingerprint(fingerprint()),
        spec: ResourceSpec::Https {
            uri: "https://example.org/proof".into(),
        },
        provider: provider.clone(),
        backend: backend.clone(),
    };
    let (controller, events) =
        WorkflowController::new(setup, host.context(), &WorkflowConfig::default());
    Harness {
        host,
        provider,
        backend,
        driver: WorkflowDriver::new(controller, events),
    }
}

impl Harness {
    fn controller(&mut self) -> &mut WorkflowController {
        self.driver.controller_mut()
    }

    async fn verify(&mut self) -> WorkflowPhase {
        self.controller().request_verify().unwrap();
        self.driver.settle().await
    }

    async fn submit(&mut self) -> WorkflowPhase {
        self.controller().request_submit().unwrap();
        self.driver.settle().await
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn verify_then_submit_reaches_done() {
    let backend = NullBackend::scripted([BackendScript::Succeed(vec![
        ProgressEvent::new("signing", 1, 2),
        ProgressEvent::new("saving", 2, 2),
    ])]);
    let mut h = harness(NullProvider::new(), backend);

    assert_eq!(h.verify().await, WorkflowPhase::Verified);
    let display = h.driver.controller().display();
    assert_eq!(display.status, VerifyStatus::Success);
    assert_eq!(display.control, VerifyControl::Verify);
    assert!(h.driver.controller().verified_resource().is_some());

    assert_eq!(h.submit().await, WorkflowPhase::Done);
    assert_eq!(h.driver.controller().display().control, VerifyControl::Hidden);
    assert_eq!(h.host.exit.done_count(), 1);
    assert_eq!(h.host.progress.titles(), vec!["Saving key…".to_string()]);
    assert_eq!(h.host.progress.updates().len(), 2);
    assert!(!h.host.progress.is_visible());
    assert!(h.host.notifier.notifications().is_empty());

    let requests = h.backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].uri(), "https://example.org/proof");
    assert_eq!(requests[0].fingerprint(), &fingerprint());
}

#[tokio::test(start_paused = true)]
async fn failed_verification_blocks_submission() {
    let provider = NullProvider::scripted([ProviderScript::Mismatch("token not found".into())]);
    let mut h = harness(provider, NullBackend::new());

    assert_eq!(h.verify().await, WorkflowPhase::VerifyFailed);
    let display = h.driver.controller().display();
    assert_eq!(display.status, VerifyStatus::Error);
    assert_eq!(display.control, VerifyControl::Retry);
    assert_eq!(
        h.host.notifier.last(),
        Some((NotificationKind::VerifyFailed, "token not found".to_string()))
    );

    h.controller().request_submit().unwrap();
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::VerifyFailed);
    assert_eq!(h.host.notifier.count(NotificationKind::NeedVerify), 1);
    assert_eq!(h.backend.dispatch_count(), 0);
    assert_eq!(h.host.progress.shown(), 0);
}

#[tokio::test(start_paused = true)]
async fn backend_failure_keeps_resource_for_retry() {
    let backend = NullBackend::scripted([
        BackendScript::Fail("keyring is locked".into()),
        BackendScript::Succeed(Vec::new()),
    ]);
    let mut h = harness(NullProvider::new(), backend);

    h.verify().await;
    assert_eq!(h.submit().await, WorkflowPhase::SubmitFailed);
    assert_eq!(
        h.host.notifier.last(),
        Some((NotificationKind::SubmitFailed, "keyring is locked".to_string()))
    );
    assert!(h.driver.controller().verified_resource().is_some());
    assert!(h.driver.controller().submit_enabled());
    assert!(!h.host.progress.is_visible());
    assert_eq!(h.host.exit.done_count(), 0);

    assert_eq!(h.submit().await, WorkflowPhase::Done);
    assert_eq!(h.host.exit.done_count(), 1);
    assert_eq!(h.provider.verify_calls(), 1);

    let requests = h.backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].payload().digest(), requests[1].payload().digest());
    assert_ne!(requests[0].correlation(), requests[1].correlation());
}

#[tokio::test(start_paused = true)]
async fn unresolved_resource_fails_without_delay() {
    let provider = NullProvider::scripted([ProviderScript::Unresolved("NXDOMAIN".into())]);
    let mut h = harness(provider, NullBackend::new());

    let started = Instant::now();
    assert_eq!(h.verify().await, WorkflowPhase::VerifyFailed);
    assert!(started.elapsed() < MIN_DURATION);
    assert_eq!(h.provider.verify_calls(), 0);
    assert_eq!(
        h.host.notifier.last(),
        Some((NotificationKind::VerifyFailed, "NXDOMAIN".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn reverify_clears_resource_immediately() {
    let mut h = harness(NullProvider::new(), NullBackend::new());
    h.verify().await;
    assert!(h.driver.controller().verified_resource().is_some());

    h.controller().request_verify().unwrap();
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Verifying);
    assert!(h.driver.controller().verified_resource().is_none());
    assert_eq!(h.driver.controller().display().control, VerifyControl::Busy);

    h.controller().request_submit().unwrap();
    assert_eq!(h.host.notifier.count(NotificationKind::NeedVerify), 1);
    assert_eq!(h.backend.dispatch_count(), 0);

    assert_eq!(h.driver.settle().await, WorkflowPhase::Verified);
    assert_eq!(h.driver.controller().attempt(), 2);
}

// ── Properties ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn verification_takes_at_least_the_minimum_duration() {
    let provider = NullProvider::scripted([
        ProviderScript::Verified,
        ProviderScript::Mismatch("stale token".into()),
    ]);
    let mut h = harness(provider, NullBackend::new());

    for expected in [WorkflowPhase::Verified, WorkflowPhase::VerifyFailed] {
        let started = Instant::now();
        assert_eq!(h.verify().await, expected);
        assert!(started.elapsed() >= MIN_DURATION);
    }
}

#[tokio::test(start_paused = true)]
async fn submit_without_resource_only_notifies() {
    let mut h = harness(NullProvider::new(), NullBackend::new());

    h.controller().request_submit().unwrap();
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Idle);

    h.controller().request_verify().unwrap();
    h.controller().request_submit().unwrap();
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Verifying);

    assert_eq!(h.host.notifier.count(NotificationKind::NeedVerify), 2);
    let (_, message) = h.host.notifier.last().unwrap();
    assert_eq!(message, "Verify the resource before linking it to your key.");
    assert_eq!(h.backend.dispatch_count(), 0);
    assert_eq!(h.host.progress.shown(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_are_rejected() {
    let mut h = harness(NullProvider::new(), NullBackend::scripted([BackendScript::Hold]));

    h.controller().request_verify().unwrap();
    assert!(!h.driver.controller().verify_enabled());
    assert!(matches!(
        h.controller().request_verify(),
        Err(WorkflowError::VerificationInProgress)
    ));
    h.driver.settle().await;
    assert_eq!(h.provider.resolve_calls(), 1);

    h.controller().request_submit().unwrap();
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Submitting);
    assert!(!h.driver.controller().submit_enabled());
    assert!(matches!(
        h.controller().request_submit(),
        Err(WorkflowError::SubmissionInProgress)
    ));
    assert!(matches!(
        h.controller().request_verify(),
        Err(WorkflowError::SubmissionInProgress)
    ));
    assert_eq!(h.backend.dispatch_count(), 1);

    let reply = h.backend.take_held().unwrap();
    reply.succeed(SubmissionResult::default());
    assert_eq!(h.driver.settle().await, WorkflowPhase::Done);
    assert!(matches!(
        h.controller().request_submit(),
        Err(WorkflowError::Finished)
    ));
}

#[tokio::test(start_paused = true)]
async fn duplicate_terminal_results_signal_done_once() {
    let mut h = harness(
        NullProvider::new(),
        NullBackend::scripted([BackendScript::SucceedTwice]),
    );
    h.verify().await;
    assert_eq!(h.submit().await, WorkflowPhase::Done);

    h.controller().handle_event(WorkflowEvent::SubmissionFinished {
        correlation: CorrelationId::new(1),
        outcome: SubmissionOutcome::Succeeded(SubmissionResult::default()),
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Done);
    assert_eq!(h.host.exit.done_count(), 1);
    assert_eq!(h.host.progress.dismissed(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_verification_outcome_is_ignored() {
    let mut h = harness(NullProvider::new(), NullBackend::new());
    h.controller().request_verify().unwrap();

    h.controller()
        .handle_event(WorkflowEvent::VerificationFinished(VerificationOutcome::mismatched(
            7,
            OperationLog::new(),
            None,
        )));
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Verifying);
    assert!(h.host.notifier.notifications().is_empty());

    assert_eq!(h.driver.settle().await, WorkflowPhase::Verified);
}

#[tokio::test(start_paused = true)]
async fn stale_submission_progress_is_ignored() {
    let mut h = harness(NullProvider::new(), NullBackend::scripted([BackendScript::Hold]));
    h.verify().await;
    h.controller().request_submit().unwrap();

    h.controller().handle_event(WorkflowEvent::SubmissionProgress {
        correlation: CorrelationId::new(42),
        event: ProgressEvent::new("other", 1, 1),
    });
    assert!(h.host.progress.updates().is_empty());

    let reply = h.backend.take_held().unwrap();
    reply.progress(ProgressEvent::new("saving", 1, 1));
    reply.succeed(SubmissionResult::default());
    assert_eq!(h.driver.settle().await, WorkflowPhase::Done);
    assert_eq!(h.host.progress.updates(), vec![ProgressEvent::new("saving", 1, 1)]);
}

#[tokio::test(start_paused = true)]
async fn teardown_discards_submission_result() {
    let mut h = harness(NullProvider::new(), NullBackend::scripted([BackendScript::Hold]));
    h.verify().await;
    h.controller().request_submit().unwrap();
    assert!(h.host.progress.is_visible());

    h.driver.controller().lifecycle().tear_down();
    assert_eq!(h.driver.settle().await, WorkflowPhase::Submitting);
    assert!(!h.host.progress.is_visible());

    let reply = h.backend.take_held().unwrap();
    reply.succeed(SubmissionResult::default());
    tokio::time::sleep(Duration::from_millis(10)).await;

    h.controller().handle_event(WorkflowEvent::SubmissionFinished {
        correlation: CorrelationId::new(1),
        outcome: SubmissionOutcome::Succeeded(SubmissionResult::default()),
    });
    assert_eq!(h.host.exit.done_count(), 0);
    assert!(h.host.notifier.notifications().is_empty());
    assert_eq!(h.host.progress.dismissed(), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_discards_verification_outcome() {
    let mut h = harness(NullProvider::new(), NullBackend::new());
    h.controller().request_verify().unwrap();
    h.driver.controller().lifecycle().tear_down();

    assert_eq!(h.driver.settle().await, WorkflowPhase::Verifying);
    tokio::time::sleep(MIN_DURATION * 2).await;

    assert_eq!(h.provider.verify_calls(), 1);
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Verifying);
    assert!(h.driver.controller().verified_resource().is_none());
    assert!(h.host.notifier.notifications().is_empty());
    assert_eq!(h.host.progress.dismissed(), 0);
}

#[tokio::test(start_paused = true)]
async fn input_required_then_retry_with_passphrase() {
    let key_id = SubmissionTarget::from_fingerprint(fingerprint()).key_id;
    let backend = NullBackend::scripted([
        BackendScript::RequireInput(RequiredInput::Passphrase(key_id)),
        BackendScript::Succeed(Vec::new()),
    ]);
    let mut h = harness(NullProvider::new(), backend);
    h.verify().await;

    assert_eq!(h.submit().await, WorkflowPhase::SubmitFailed);
    assert_eq!(
        h.driver.controller().pending_input(),
        Some(&RequiredInput::Passphrase(key_id))
    );
    assert_eq!(h.host.notifier.count(NotificationKind::InputRequired), 1);
    assert!(!h.host.progress.is_visible());

    h.controller()
        .request_submit_with(CryptoInput::with_passphrase("correct horse"))
        .unwrap();
    assert!(h.driver.controller().pending_input().is_none());
    assert_eq!(h.driver.settle().await, WorkflowPhase::Done);

    let requests = h.backend.requests();
    assert!(requests[0].crypto_input().is_empty());
    assert_eq!(
        requests[1].crypto_input().passphrase.as_deref(),
        Some("correct horse")
    );
}

#[tokio::test(start_paused = true)]
async fn backend_dropping_reply_fails_submission() {
    let mut h = harness(NullProvider::new(), NullBackend::scripted([BackendScript::Drop]));
    h.verify().await;

    assert_eq!(h.submit().await, WorkflowPhase::SubmitFailed);
    let (kind, message) = h.host.notifier.last().unwrap();
    assert_eq!(kind, NotificationKind::SubmitFailed);
    assert!(message.contains("without a result"));
}

#[tokio::test(start_paused = true)]
async fn panicking_provider_reports_failure() {
    let provider = NullProvider::scripted([ProviderScript::Panic]);
    let mut h = harness(provider, NullBackend::new());

    assert_eq!(h.verify().await, WorkflowPhase::VerifyFailed);
    assert_eq!(h.host.notifier.count(NotificationKind::VerifyFailed), 1);
    assert!(h.driver.controller().verify_enabled());
}

#[tokio::test(start_paused = true)]
async fn back_leaves_state_untouched() {
    let mut h = harness(NullProvider::new(), NullBackend::new());
    h.verify().await;
    h.controller().back();

    assert_eq!(h.host.exit.back_count(), 1);
    assert_eq!(h.driver.controller().phase(), WorkflowPhase::Verified);
    assert!(h.driver.controller().verified_resource().is_some());
}

// ── Driver ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn driver_runs_actions_to_completion() {
    let h = harness(NullProvider::new(), NullBackend::new());
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(h.driver.run(rx));

    tx.send(UserAction::Submit).await.unwrap();
    tx.send(UserAction::Verify).await.unwrap();
    tokio::time::sleep(MIN_DURATION + Duration::from_millis(100)).await;
    tx.send(UserAction::Submit).await.unwrap();
    drop(tx);

    let controller = task.await.unwrap();
    assert_eq!(controller.phase(), WorkflowPhase::Done);
    assert_eq!(h.host.notifier.count(NotificationKind::NeedVerify), 1);
    assert_eq!(h.host.exit.done_count(), 1);
    assert_eq!(h.backend.dispatch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn driver_stops_on_teardown() {
    let h = harness(NullProvider::new(), NullBackend::scripted([BackendScript::Hold]));
    let lifecycle = h.driver.controller().lifecycle().clone();
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(h.driver.run(rx));

    tx.send(UserAction::Verify).await.unwrap();
    tokio::time::sleep(MIN_DURATION + Duration::from_millis(100)).await;
    tx.send(UserAction::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    lifecycle.tear_down();

    let controller = task.await.unwrap();
    assert_eq!(controller.phase(), WorkflowPhase::Submitting);
    assert_eq!(h.host.progress.dismissed(), 1);
    assert_eq!(h.host.exit.done_count(), 0);
}

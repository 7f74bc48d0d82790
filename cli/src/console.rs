//! Terminal host for the workflow: notifications and progress go to stderr.

use keylink_submission::ProgressEvent;
use keylink_workflow::{NotificationKind, Notifier, ProgressIndicator, WorkflowExit};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ConsoleHost {
    progress_visible: AtomicBool,
}

impl Notifier for ConsoleHost {
    fn notify(&self, kind: NotificationKind, message: &str) {
        tracing::debug!(%kind, message, "notification");
        eprintln!("{kind}: {message}");
    }
}

impl ProgressIndicator for ConsoleHost {
    fn show(&self, title: &str) {
        self.progress_visible.store(true, Ordering::SeqCst);
        eprintln!("{title}");
    }

    fn update(&self, event: &ProgressEvent) {
        if self.progress_visible.load(Ordering::SeqCst) {
            eprintln!("  [{}/{}] {}", event.progress, event.max, event.message);
        }
    }

    fn dismiss(&self) {
        self.progress_visible.store(false, Ordering::SeqCst);
    }
}

impl WorkflowExit for ConsoleHost {
    fn on_done(&self) {
        tracing::info!("workflow finished");
    }

    fn on_back(&self) {
        tracing::info!("workflow abandoned");
    }
}

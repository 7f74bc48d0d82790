//! Nullable host surface: records notifications, progress calls and exits.

use keylink_submission::ProgressEvent;
use keylink_workflow::{HostContext, NotificationKind, Notifier, ProgressIndicator, WorkflowExit};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<(NotificationKind, String)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn last(&self) -> Option<(NotificationKind, String)> {
        self.notifications.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((kind, message.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    titles: Mutex<Vec<String>>,
    updates: Mutex<Vec<ProgressEvent>>,
    dismissed: AtomicUsize,
}

impl RecordingProgress {
    pub fn shown(&self) -> usize {
        self.titles.lock().unwrap().len()
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<ProgressEvent> {
        self.updates.lock().unwrap().clone()
    }

    pub fn dismissed(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }

    /// Shown more often than dismissed.
    pub fn is_visible(&self) -> bool {
        self.shown() > self.dismissed()
    }
}

impl ProgressIndicator for RecordingProgress {
    fn show(&self, title: &str) {
        self.titles.lock().unwrap().push(title.to_string());
    }

    fn update(&self, event: &ProgressEvent) {
        self.updates.lock().unwrap().push(event.clone());
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingExit {
    done: AtomicUsize,
    back: AtomicUsize,
}

impl RecordingExit {
    pub fn done_count(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    pub fn back_count(&self) -> usize {
        self.back.load(Ordering::SeqCst)
    }
}

impl WorkflowExit for RecordingExit {
    fn on_done(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    fn on_back(&self) {
        self.back.fetch_add(1, Ordering::SeqCst);
    }
}

/// All three recorders plus the context built from them.
pub struct NullHost {
    pub notifier: Arc<RecordingNotifier>,
    pub progress: Arc<RecordingProgress>,
    pub exit: Arc<RecordingExit>,
    context: HostContext,
}

impl NullHost {
    pub fn new() -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let progress = Arc::new(RecordingProgress::default());
        let exit = Arc::new(RecordingExit::default());
        let context = HostContext::new(notifier.clone(), progress.clone(), exit.clone());
        Self {
            notifier,
            progress,
            exit,
            context,
        }
    }

    pub fn context(&self) -> HostContext {
        self.context.clone()
    }
}

impl Default for NullHost {
    fn default() -> Self {
        Self::new()
    }
}

//! Liveness of the surface hosting a workflow.
//!
//! Workers finishing after the surface is gone must not apply their results.
//! The surface owner calls [`SurfaceLifecycle::tear_down`]; everyone holding a
//! clone can check [`SurfaceLifecycle::is_alive`] or await
//! [`SurfaceLifecycle::torn_down`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug)]
struct Inner {
    alive: AtomicBool,
    tx: broadcast::Sender<()>,
}

/// Shared liveness flag plus a teardown broadcast.
#[derive(Clone, Debug)]
pub struct SurfaceLifecycle {
    inner: Arc<Inner>,
}

impl SurfaceLifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                alive: AtomicBool::new(true),
                tx,
            }),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// Mark the surface as gone and notify waiters. Idempotent.
    pub fn tear_down(&self) {
        if self.inner.alive.swap(false, Ordering::SeqCst) {
            tracing::info!("surface torn down");
            let _ = self.inner.tx.send(());
        }
    }

    /// Get a receiver that will be notified on teardown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.inner.tx.subscribe()
    }

    /// Resolve once the surface has been torn down.
    pub async fn torn_down(&self) {
        let mut rx = self.subscribe();
        if !self.is_alive() {
            return;
        }
        // Lagged or closed both mean the signal fired.
        let _ = rx.recv().await;
    }
}

impl Default for SurfaceLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

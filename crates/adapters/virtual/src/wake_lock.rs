//! Wake lock with a hard timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chime_app::ports::WakeLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Simulated partial wake lock.
///
/// A hold ends on `release()` or when its timeout elapses, whichever comes
/// first. Without a tokio runtime the timeout is not enforced.
#[derive(Default)]
pub struct VirtualWakeLock {
    held: Arc<AtomicBool>,
    expiry: Mutex<Option<JoinHandle<()>>>,
}

impl VirtualWakeLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    fn replace_expiry(&self, next: Option<JoinHandle<()>>) {
        let previous = std::mem::replace(
            &mut *self.expiry.lock().unwrap_or_else(PoisonError::into_inner),
            next,
        );
        if let Some(task) = previous {
            task.abort();
        }
    }
}

impl WakeLock for VirtualWakeLock {
    fn acquire(&self, timeout: Duration) {
        self.held.store(true, Ordering::Release);
        tracing::debug!(timeout_secs = timeout.as_secs(), "wake lock acquired");
        let expiry = Handle::try_current().ok().map(|handle| {
            let held = Arc::clone(&self.held);
            handle.spawn(async move {
                tokio::time::sleep(timeout).await;
                if held.swap(false, Ordering::AcqRel) {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "wake lock timed out");
                }
            })
        });
        self.replace_expiry(expiry);
    }

    fn release(&self) {
        self.replace_expiry(None);
        if self.held.swap(false, Ordering::AcqRel) {
            tracing::debug!("wake lock released");
        }
    }
}

impl Drop for VirtualWakeLock {
    fn drop(&mut self) {
        self.replace_expiry(None);
    }
}

//! Wake lock port: keeps the host awake while rules execute.

use std::time::Duration;

/// Platform wake lock.
///
/// Implementations must release on their own once `timeout` elapses, so a
/// leaked hold cannot keep the host awake forever.
pub trait WakeLock: Send + Sync {
    fn acquire(&self, timeout: Duration);

    fn release(&self);
}

impl<T: WakeLock> WakeLock for std::sync::Arc<T> {
    fn acquire(&self, timeout: Duration) {
        (**self).acquire(timeout);
    }

    fn release(&self) {
        (**self).release();
    }
}

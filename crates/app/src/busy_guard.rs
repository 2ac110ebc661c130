//! Busy guard: a scoped, bounded wake-lock hold around rule execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::ports::WakeLock;

/// Default ceiling for a single hold.
pub const DEFAULT_BUSY_CEILING: Duration = Duration::from_secs(10 * 60);

/// Owns the platform wake lock and hands out at most one hold at a time.
///
/// Releasing happens when the [`BusyHold`] is dropped, on every exit path.
/// The lock is acquired with the configured ceiling so that the platform
/// releases it on its own if a hold ever leaks.
pub struct BusyGuard<L> {
    lock: L,
    ceiling: Duration,
    held: AtomicBool,
}

impl<L: WakeLock> BusyGuard<L> {
    #[must_use]
    pub fn new(lock: L, ceiling: Duration) -> Self {
        Self {
            lock,
            ceiling,
            held: AtomicBool::new(false),
        }
    }

    /// Take the guard. When it is already held, the returned hold is inert
    /// and the outstanding one keeps covering the work.
    #[must_use]
    pub fn hold(&self) -> BusyHold<'_, L> {
        let owner = !self.held.swap(true, Ordering::AcqRel);
        if owner {
            self.lock.acquire(self.ceiling);
        } else {
            tracing::debug!("busy guard already held");
        }
        BusyHold { guard: self, owner }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }
}

/// An outstanding hold on a [`BusyGuard`].
#[must_use = "the guard is released as soon as the hold is dropped"]
pub struct BusyHold<'a, L: WakeLock> {
    guard: &'a BusyGuard<L>,
    owner: bool,
}

impl<L: WakeLock> Drop for BusyHold<'_, L> {
    fn drop(&mut self) {
        if self.owner {
            self.guard.lock.release();
            self.guard.held.store(false, Ordering::Release);
        }
    }
}

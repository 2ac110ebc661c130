//! Clock port: local wall-clock time.

use chrono::NaiveDateTime;

use chime_domain::time::Timestamp;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// The current instant, for records that outlive a time zone change.
    ///
    /// Defaults to reading [`Clock::now`] as UTC.
    fn timestamp(&self) -> Timestamp {
        self.now().and_utc()
    }
}

/// Reads the system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn timestamp(&self) -> Timestamp {
        chime_domain::time::now()
    }
}

impl<T: Clock> Clock for std::sync::Arc<T> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }

    fn timestamp(&self) -> Timestamp {
        (**self).timestamp()
    }
}

use {
    chrono::{DateTime, Utc},
    std::{
        fmt::Debug,
        sync::{Mutex, PoisonError},
    },
};

/// Source of wall-clock time for rotation decisions and entry timestamps.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Useful for exercising rotation boundaries without sleeping.
///
/// # Examples
/// ```
/// use {chrono::{TimeZone, Utc}, levelroll::{Clock, ManualClock}};
///
/// let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap());
/// clock.advance(chrono::Duration::seconds(1));
/// assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        ManualClock { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

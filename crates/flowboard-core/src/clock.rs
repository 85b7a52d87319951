//! Timestamp sources for issue mutations.
//!
//! Every mutation refreshes `updated_at`, and the workflow guarantees that a
//! real transition makes `updated_at` strictly increase. [`SystemClock`]
//! therefore never hands out the same microsecond twice: a reading is
//! `max(now, last + 1µs)`.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

/// Source of mutation timestamps.
pub trait Clock {
    /// Current instant. Successive calls on one clock must strictly increase.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock with a strictly monotonic guarantee.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_us: Cell<i64>,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let next = wall.max(self.last_us.get() + 1);
        self.last_us.set(next);
        DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now)
    }
}

/// Deterministic clock that advances by a fixed step on every reading.
#[derive(Debug)]
pub struct ManualClock {
    current: Cell<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    /// Start at `start`, advancing one second per reading.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self::with_step(start, Duration::seconds(1))
    }

    #[must_use]
    pub const fn with_step(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Cell::new(start),
            step,
        }
    }

    /// The instant the next reading will return.
    #[must_use]
    pub fn peek(&self) -> DateTime<Utc> {
        self.current.get()
    }

    /// Jump forward (or backward) to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.current.set(instant);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let reading = self.current.get();
        self.current.set(reading + self.step);
        reading
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

//! Delay and deadline descriptors.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Relative delay before a job may start, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobDelay(u64);

impl JobDelay {
    /// No delay.
    pub const ZERO: Self = Self(0);

    /// Delay of `nanos` nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Delay from a signed nanosecond count; negative values clamp to zero.
    #[must_use]
    pub fn from_signed_nanos(nanos: i64) -> Self {
        Self(u64::try_from(nanos).unwrap_or(0))
    }

    /// Nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Whether the job should be treated as immediate.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// As a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_nanos(self.0)
    }
}

impl From<Duration> for JobDelay {
    fn from(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }
}

/// Clock domain a deadline is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockId {
    /// Monotonic clock that keeps advancing while the system sleeps.
    Continuous = 1,
    /// Monotonic clock that stops while the system sleeps.
    Suspending = 2,
}

impl TryFrom<i32> for ClockId {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::Continuous),
            2 => Ok(Self::Suspending),
            other => Err(other),
        }
    }
}

fn anchor() -> Instant {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    *ANCHOR.get_or_init(Instant::now)
}

impl ClockId {
    /// Sample the clock.
    ///
    /// Both domains are read from the process monotonic clock, relative to a
    /// fixed process anchor; `Instant` does not expose the distinction.
    #[must_use]
    pub fn now(self) -> Timestamp {
        Timestamp::from_duration(anchor().elapsed())
    }
}

/// A point on a clock, split into seconds and nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds.
    pub seconds: i64,
    /// Nanoseconds within the second.
    pub nanoseconds: i64,
}

impl Timestamp {
    /// Build a timestamp, normalizing nanoseconds into `0..1e9`.
    #[must_use]
    pub const fn new(seconds: i64, nanoseconds: i64) -> Self {
        let seconds = seconds.saturating_add(nanoseconds.div_euclid(NANOS_PER_SEC));
        let nanoseconds = nanoseconds.rem_euclid(NANOS_PER_SEC);
        Self { seconds, nanoseconds }
    }

    fn from_duration(d: Duration) -> Self {
        Self::new(
            i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
            i64::from(d.subsec_nanos()),
        )
    }

    fn as_nanos(self) -> i128 {
        i128::from(self.seconds) * i128::from(NANOS_PER_SEC) + i128::from(self.nanoseconds)
    }

    /// `self + duration`, saturating.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        Self::new(
            self.seconds.saturating_add(secs),
            self.nanoseconds + i64::from(duration.subsec_nanos()),
        )
    }
}

/// Absolute deadline `(target, now, clock)`.
///
/// `now` is sampled by the caller so the backend can reconstruct the offset
/// without reading the clock a second time, even if it waits on a different
/// clock domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    /// Current time on `clock` when the deadline was built.
    pub now: Timestamp,
    /// Earliest start time on `clock`.
    pub target: Timestamp,
    /// Clock both timestamps belong to.
    pub clock: ClockId,
}

impl Deadline {
    /// Deadline from explicit samples.
    #[must_use]
    pub const fn new(now: Timestamp, target: Timestamp, clock: ClockId) -> Self {
        Self { now, target, clock }
    }

    /// Deadline `duration` from now on `clock`.
    #[must_use]
    pub fn after(duration: Duration, clock: ClockId) -> Self {
        let now = clock.now();
        Self::new(now, now.saturating_add(duration), clock)
    }

    /// Time between `now` and `target`, zero if the target is in the past.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        let delta = self.target.as_nanos() - self.now.as_nanos();
        if delta <= 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(u64::try_from(delta).unwrap_or(u64::MAX))
    }

    /// Equivalent relative delay.
    #[must_use]
    pub fn to_delay(&self) -> JobDelay {
        JobDelay::from(self.remaining())
    }
}

//! The monotonic clock collaborator (spec §6).
//!
//! Out of the core's scope in the sense that a real deployment supplies its
//! own `Clock` (a hardware timer, an RTOS tick counter, `Instant::now()`...);
//! we only fix the interface and a tick representation, following
//! `examples/original_source/embed/Core/chrono.hpp`'s nanosecond-resolution,
//! 64-bit-tick `TimePoint`/`Duration` pair.

use core::ops::{Add, AddAssign, Sub};

/// A monotonic instant, represented as a 64-bit nanosecond tick count.
///
/// Matches spec §6: "a monotonic time point with nanosecond resolution
/// (internally represented as a 64-bit tick count with a compile-time tick
/// period)".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimePoint(u64);

/// A signed duration between two [`TimePoint`]s, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(u64);

impl TimePoint {
    /// The time point at tick zero.
    pub const ZERO: TimePoint = TimePoint(0);

    /// Construct a `TimePoint` from a raw nanosecond tick count.
    pub const fn from_nanos(ticks: u64) -> Self {
        TimePoint(ticks)
    }

    /// The raw nanosecond tick count.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Saturating duration since an earlier time point; zero if `earlier`
    /// is actually later than `self`.
    pub const fn saturating_since(self, earlier: TimePoint) -> Duration {
        if self.0 >= earlier.0 {
            Duration(self.0 - earlier.0)
        } else {
            Duration(0)
        }
    }
}

impl Duration {
    /// The zero duration.
    pub const ZERO: Duration = Duration(0);

    /// Construct a `Duration` from a raw nanosecond count.
    pub const fn from_nanos(ns: u64) -> Self {
        Duration(ns)
    }

    /// Construct a `Duration` from a millisecond count.
    pub const fn from_millis(ms: u64) -> Self {
        Duration(ms.saturating_mul(1_000_000))
    }

    /// Construct a `Duration` from a microsecond count.
    pub const fn from_micros(us: u64) -> Self {
        Duration(us.saturating_mul(1_000))
    }

    /// The raw nanosecond count.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Divide this duration's magnitude by a divisor (used by the periodic
    /// integral-offset correction term; see [`crate::periodic::PeriodicTask`]).
    pub const fn checked_div(self, divisor: u64) -> Duration {
        Duration(self.0 / divisor)
    }
}

impl Add<Duration> for TimePoint {
    type Output = TimePoint;
    fn add(self, rhs: Duration) -> TimePoint {
        TimePoint(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign<Duration> for TimePoint {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for TimePoint {
    type Output = Duration;
    fn sub(self, rhs: TimePoint) -> Duration {
        Duration(self.0.saturating_sub(rhs.0))
    }
}

impl Sub<Duration> for TimePoint {
    type Output = TimePoint;
    fn sub(self, rhs: Duration) -> TimePoint {
        TimePoint(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0.saturating_sub(rhs.0))
    }
}

/// A read-only monotonic time source.
///
/// Implementations must be reentrant (the scheduler may call `now()` from
/// within a single resume cycle more than once) but need not be thread-safe,
/// since the scheduler is single-threaded by construction (spec §5).
pub trait Clock {
    /// The current time, as seen by the scheduler.
    fn now(&self) -> TimePoint;
}

/// A [`Clock`] backed by the host's monotonic `std::time::Instant`, for
/// host demos and integration tests that want real wall-clock behavior.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct WallClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl WallClock {
    /// Start a wall clock whose `TimePoint::ZERO` is "now".
    pub fn new() -> Self {
        WallClock {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for WallClock {
    fn now(&self) -> TimePoint {
        TimePoint::from_nanos(self.origin.elapsed().as_nanos() as u64)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> TimePoint {
        (**self).now()
    }
}

/// A manually-advanced clock for deterministic tests, grounded in
/// `examples/original_source/embed/OS/tests/Clock_test.hpp` and
/// `fiber/Chrono/tests/Clock_test.hpp`, which drive scheduler scenarios off a
/// fake clock advanced one tick at a time.
#[derive(Debug, Default)]
pub struct MockClock {
    now: core::cell::Cell<TimePoint>,
}

impl MockClock {
    /// A mock clock starting at `TimePoint::ZERO`.
    pub fn new() -> Self {
        MockClock {
            now: core::cell::Cell::new(TimePoint::ZERO),
        }
    }

    /// Set the clock to an absolute time point.
    pub fn set(&self, at: TimePoint) {
        self.now.set(at);
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for MockClock {
    fn now(&self) -> TimePoint {
        self.now.get()
    }
}

//! `PeriodicTask` and `HardPeriodicTask` (SPEC_FULL.md "Supplemented
//! features" §1–2): [`crate::task::Strategy`] implementations grounded in
//! `examples/original_source/fiber/OS/PeriodicTask.hpp` and
//! `embed/OS/HardPeriodicTask.hpp`.

use crate::clock::{Duration, TimePoint};
use crate::task::{ExecutionWindow, Schedule, Strategy};

/// Reschedule every fixed `period`, measured from the *previous execution
/// start* rather than `now()`, so jitter from scheduling latency doesn't
/// accumulate across cycles.
///
/// Carries the integral-offset correction term from the original
/// `SoftPeriodicTask::next_schedule` (`offset += error / 32`), which spec
/// §9's Open Question flags as possibly needing a bound. We resolve it by
/// clamping `offset` to `±period` (see DESIGN.md): `offset_ns` is a signed
/// nanosecond count so the clamp is a plain `i64` range check.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTask {
    period: Duration,
    relative_deadline: Duration,
    prev_execution_start: TimePoint,
    offset_ns: i64,
}

impl PeriodicTask {
    /// A periodic strategy with fixed `period` and `relative_deadline`,
    /// seeded so the first correction term is zero (the task's own first
    /// `ready` time stands in for a fictitious previous cycle one period
    /// earlier).
    pub fn new(period: Duration, relative_deadline: Duration, first_ready: TimePoint) -> Self {
        PeriodicTask {
            period,
            relative_deadline,
            prev_execution_start: first_ready - period,
            offset_ns: 0,
        }
    }
}

impl Strategy for PeriodicTask {
    fn next_schedule(&mut self, _previous: Schedule, execution: ExecutionWindow) -> Schedule {
        let measured_period_ns = execution.start.saturating_since(self.prev_execution_start).as_nanos() as i64;
        self.prev_execution_start = execution.start;

        let error_ns = self.period.as_nanos() as i64 - measured_period_ns;
        self.offset_ns += error_ns / 32;
        let bound = self.period.as_nanos() as i64;
        self.offset_ns = self.offset_ns.clamp(-bound, bound);

        let ready = offset_time_point(execution.start + self.period, self.offset_ns);
        let deadline = offset_time_point(ready + self.relative_deadline, self.offset_ns);
        Schedule { ready, deadline }
    }
}

fn offset_time_point(base: TimePoint, offset_ns: i64) -> TimePoint {
    if offset_ns >= 0 {
        base + Duration::from_nanos(offset_ns as u64)
    } else {
        base - Duration::from_nanos((-offset_ns) as u64)
    }
}

/// A fixed-phase periodic strategy: every `ready`/`deadline` is exactly
/// `period` past the previous cycle's, with no drift correction at all
/// (`embed/OS/HardPeriodicTask.hpp::update_schedule`, which computes
/// `planned_start = last_schedule.ready + period` and
/// `planned_deadline = last_schedule.deadline + period` directly off the
/// previous `Schedule` — unlike [`PeriodicTask`], it never consults the
/// measured execution window or accumulates an integral-offset term).
/// `missed_deadline` is left at the [`Strategy`] trait default (always
/// `true`): this source file defines no override for it.
#[derive(Debug, Clone, Copy)]
pub struct HardPeriodicTask {
    period: Duration,
}

impl HardPeriodicTask {
    /// A fixed-phase periodic strategy advancing by `period` every cycle.
    pub fn new(period: Duration) -> Self {
        HardPeriodicTask { period }
    }
}

impl Strategy for HardPeriodicTask {
    fn next_schedule(&mut self, previous: Schedule, _execution: ExecutionWindow) -> Schedule {
        Schedule {
            ready: previous.ready + self.period,
            deadline: previous.deadline + self.period,
        }
    }
}

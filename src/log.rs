//! The scheduler's tracing hook (spec §6, "Logger (external)").
//!
//! Mirrors `examples/original_source/embed/OS/RealTimeScheduler.hpp`'s
//! `CRealTimeSchedulerLogger` concept (`log_add`/`log_move`/`log_resume`/
//! `log_delete`/`log_sleep`) one-for-one. [`NoopLog`] is the spec's documented
//! default; [`TracingLog`] (std feature) renders through `tracing`, the way
//! the teacher gates its own high-frequency `serial_println!` calls behind a
//! compile-time switch (`src/interrupts.rs`).

use crate::clock::TimePoint;
use crate::task::TaskId;

/// Which queue a Task was moved into, for [`SchedulerLog::move_queue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queue {
    /// The ready-time min-heap.
    Waiting,
    /// The deadline min-heap.
    Running,
    /// The unordered await bag.
    Await,
}

/// Tracing hooks the [`crate::scheduler::Scheduler`] calls at each queue
/// transition. Default implementations are all no-ops, so a new hook can be
/// added without breaking existing loggers.
pub trait SchedulerLog {
    /// A new Task was admitted via `Scheduler::add`.
    fn add(&self, _at: TimePoint, _name: &str, _id: TaskId) {}
    /// A Task moved between queues.
    fn move_queue(&self, _at: TimePoint, _name: &str, _id: TaskId, _to: Queue) {}
    /// A Task was dispatched (`resume()` called).
    fn resume(&self, _at: TimePoint, _name: &str, _id: TaskId) {}
    /// A Task finished or faulted and was dropped from every queue.
    fn delete_task(&self, _at: TimePoint, _name: &str, _id: TaskId) {}
    /// The running queue was empty; the scheduler is about to idle until
    /// `until`.
    fn sleep(&self, _at: TimePoint, _until: TimePoint) {}
}

/// The spec's documented default: every hook is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLog;

impl SchedulerLog for NoopLog {}

/// A [`SchedulerLog`] that renders through `tracing`, for host demos and
/// integration tests. Gated behind `std` since the core must remain usable
/// with no logging backend at all on bare metal.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

#[cfg(feature = "std")]
impl SchedulerLog for TracingLog {
    fn add(&self, at: TimePoint, name: &str, id: TaskId) {
        tracing::debug!(now = at.as_nanos(), name, id = id.value(), "task added");
    }

    fn move_queue(&self, at: TimePoint, name: &str, id: TaskId, to: Queue) {
        tracing::trace!(now = at.as_nanos(), name, id = id.value(), queue = ?to, "task moved");
    }

    fn resume(&self, at: TimePoint, name: &str, id: TaskId) {
        tracing::trace!(now = at.as_nanos(), name, id = id.value(), "task resumed");
    }

    fn delete_task(&self, at: TimePoint, name: &str, id: TaskId) {
        tracing::debug!(now = at.as_nanos(), name, id = id.value(), "task deleted");
    }

    fn sleep(&self, at: TimePoint, until: TimePoint) {
        tracing::trace!(now = at.as_nanos(), until = until.as_nanos(), "scheduler idle, sleeping");
    }
}

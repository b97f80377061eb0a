//! Error kinds for the runtime.
//!
//! Mirrors the failure taxonomy carried by `embed::Exception` /
//! `fiber::AssertionFailure` in the original source: faults inside a fiber
//! are contained at the [`crate::task::Task`] boundary and never escape as a
//! `Result`; everything else is reported synchronously to the caller.

use core::fmt;

/// Failure modes exposed by the public API (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChronosError {
    /// `Scheduler::add` called on a pool that is already at capacity.
    #[error("scheduler is full: {n_tasks} tasks already admitted")]
    CapacityExceeded {
        /// Number of tasks the scheduler was constructed to hold.
        n_tasks: usize,
    },

    /// The frame allocator ran out of space for a new activation.
    #[error("frame allocator exhausted: requested {requested} bytes, {remaining} remaining")]
    AllocationFailure {
        /// Bytes requested by the failed allocation.
        requested: usize,
        /// Bytes left in the backing region.
        remaining: usize,
    },

    /// A [`crate::future::Future`] was read after its [`crate::future::Promise`]
    /// dropped without ever setting a value.
    #[error("future observed after its promise was dropped without a value")]
    BrokenPromise,

    /// A [`crate::future::Promise`] was set more than once.
    #[error("promise was already set")]
    AlreadySet,

    /// An operation was attempted while the [`crate::task::Task`] was not in
    /// a state that permits it (e.g. `resume()` on a non-resumable task).
    #[error("invalid task state for this operation")]
    InvalidState,

    /// A fault occurred inside a fiber's frame chain; the task was destroyed
    /// and removed from every scheduler queue. The scheduler itself keeps
    /// running.
    #[error("fiber fault in task '{name}' (id={id})")]
    FiberFault {
        /// Name of the task that faulted.
        name: &'static str,
        /// Scheduler-assigned id of the task that faulted.
        id: u64,
    },
}

/// Convenience alias for fallible runtime operations.
pub type Result<T> = core::result::Result<T, ChronosError>;

impl ChronosError {
    /// Render the user-visible one-liner the spec asks for on a fiber fault:
    /// `[FiberFault] <task-name> id=<id>`.
    pub fn fiber_fault_line(name: &'static str, id: u64) -> impl fmt::Display {
        FiberFaultLine { name, id }
    }
}

struct FiberFaultLine {
    name: &'static str,
    id: u64,
}

impl fmt::Display for FiberFaultLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FiberFault] {} id={}", self.name, self.id)
    }
}

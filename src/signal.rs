//! The scheduling [`Signal`] an awaitable hands back to the enclosing
//! [`crate::task::Task`] when it suspends (spec §3/§4.1).
//!
//! Grounded in `examples/original_source/fiber/OS/CoSignal.hpp`'s `CoSignal`
//! class: a tagged union of `None | Await | NextCycle | ImplicitDelay |
//! ExplicitDelay`, copy-cheap, with at most one live value per resume cycle.

use crate::clock::Duration;

/// A single-shot scheduling hint, produced by the deepest suspending
/// [`crate::awaitable`] and consumed by the [`crate::scheduler::Scheduler`]
/// on return from [`crate::task::Task::resume`].
///
/// Reset to `None` at the start of every resume cycle; at most one `Signal`
/// is live per cycle (spec §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    /// The task finished, or produced no scheduling request this cycle.
    #[default]
    None,
    /// The task is blocked on an external [`crate::awaitable::Awaitable`].
    Await,
    /// The task completed one logical cycle; the scheduler should recompute
    /// its schedule via [`crate::task::RealTimeTask::next_schedule`].
    NextCycle,
    /// Defer the ready time by `d`; the next deadline is derived from the
    /// previous *relative* deadline (`deadline - ready`).
    ImplicitDelay(Duration),
    /// Defer the ready time by `d`; set the next deadline to `d + rel_deadline`
    /// from now.
    ExplicitDelay(Duration, Duration),
}

impl Signal {
    /// `true` for every variant other than [`Signal::None`].
    pub fn is_request(&self) -> bool {
        !matches!(self, Signal::None)
    }
}

//! Out-of-band delivery of a [`Signal`] (and, for `Signal::Await`, a leaf
//! readiness probe) from a leaf awaitable back to the [`crate::task::Task`]
//! driving it.
//!
//! `core::future::Future::poll` can only return `Poll<Output>`, so there is
//! no room in its return value for the extra scheduling hint spec §4.2 asks
//! `on_suspend()` to produce. We thread it through an explicit scope-entry
//! context instead of a general-purpose channel: [`crate::task::Task::resume`]
//! installs a pointer to its own [`SignalCell`] for the duration of one
//! `poll` call tree, and built-in awaitables call [`emit`] (or, when
//! suspending on an external event, [`emit_await`]) right before returning
//! [`core::task::Poll::Pending`]. This is the Rust-idiomatic reading of
//! Design Note §9 ("Global 'current frame allocator' → explicit scope-entry
//! context"), applied to signal propagation instead of allocation.
//!
//! `emit_await`'s probe is the Rust realization of spec §3's
//! `leaf_awaitable(T).ready()`: a side-effect-free closure the awaitable
//! hands over at suspension time, callable without resuming the Task's
//! frame chain at all. This is what lets the scheduler's await-bag
//! promotion pass (spec §4.7 step 1) be a pure readiness check rather than
//! an actual resume.
//!
//! Single-threaded only: the scheduler drives exactly one task's `poll` call
//! tree to completion before starting another (spec §5), so a single scoped
//! slot is sufficient and never aliased.

use core::cell::{Cell, RefCell};
use core::ptr;

use alloc::rc::Rc;

use crate::signal::Signal;

/// A side-effect-free closure testing whether a suspended leaf Awaitable has
/// become ready, without polling (and so without executing) the Task that
/// owns it.
pub(crate) type ReadyProbe = Rc<dyn Fn() -> bool>;

/// Per-task storage for the pending [`Signal`] and, when that signal is
/// `Await`, the leaf's [`ReadyProbe`]. Owned by [`crate::task::Task`].
#[derive(Default)]
pub(crate) struct SignalCell {
    signal: Cell<Signal>,
    probe: RefCell<Option<ReadyProbe>>,
}

impl SignalCell {
    pub(crate) fn new() -> Self {
        SignalCell {
            signal: Cell::new(Signal::None),
            probe: RefCell::new(None),
        }
    }

    /// Read and clear the pending signal (spec §4.1: reset to `None` at the
    /// start of every resume cycle / consumed by the scheduler).
    pub(crate) fn take(&self) -> Signal {
        self.signal.replace(Signal::None)
    }

    /// Take the probe registered alongside the last `Signal::Await`, if any.
    pub(crate) fn take_probe(&self) -> Option<ReadyProbe> {
        self.probe.borrow_mut().take()
    }

    fn set(&self, signal: Signal) {
        self.signal.set(signal);
        *self.probe.borrow_mut() = None;
    }

    fn set_await(&self, probe: ReadyProbe) {
        self.signal.set(Signal::Await);
        *self.probe.borrow_mut() = Some(probe);
    }
}

struct CurrentSlot(Cell<*const SignalCell>);

// SAFETY: the runtime is single-threaded cooperative (spec §5); this slot is
// only ever touched from the one scheduling thread driving `Task::resume`.
unsafe impl Sync for CurrentSlot {}

static CURRENT: CurrentSlot = CurrentSlot(Cell::new(ptr::null()));

/// RAII guard installing `cell` as the delivery target for [`emit`]/
/// [`emit_await`] for the lifetime of the guard, restoring the previous
/// target (usually null) on drop.
pub(crate) struct ScopedSignalTarget {
    previous: *const SignalCell,
}

impl ScopedSignalTarget {
    pub(crate) fn install(cell: &SignalCell) -> Self {
        let previous = CURRENT.0.get();
        CURRENT.0.set(cell as *const SignalCell);
        ScopedSignalTarget { previous }
    }
}

impl Drop for ScopedSignalTarget {
    fn drop(&mut self) {
        CURRENT.0.set(self.previous);
    }
}

/// Called by a built-in [`crate::awaitable::Awaitable`] when it returns
/// `Poll::Pending` with a scheduling request other than `Await`.
///
/// A no-op outside of [`crate::task::Task::resume`] (e.g. a unit test
/// polling an awaitable directly without a Task) rather than a panic, since
/// `ready()`/`poll` must stay side-effect-observable in isolation for tests.
pub(crate) fn emit(signal: Signal) {
    debug_assert!(!matches!(signal, Signal::Await), "use emit_await for Signal::Await");
    let ptr = CURRENT.0.get();
    if let Some(cell) = unsafe { ptr.as_ref() } {
        cell.set(signal);
    }
}

/// Called by a built-in [`crate::awaitable::Awaitable`] when it suspends on
/// an external event (`Signal::Await`), handing the enclosing Task a
/// [`ReadyProbe`] it can poll without resuming.
pub(crate) fn emit_await(probe: ReadyProbe) {
    let ptr = CURRENT.0.get();
    if let Some(cell) = unsafe { ptr.as_ref() } {
        cell.set_await(probe);
    }
}

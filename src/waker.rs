//! A do-nothing [`Waker`] for the scheduler's driver loop.
//!
//! The runtime never parks on a wakeup notification — readiness is instead
//! polled explicitly by [`crate::scheduler::Scheduler::spin`] (promotion
//! passes + `Awaitable::ready()`), matching spec §4.7's promote-then-dispatch
//! model. The waker argument `Future::poll` requires is therefore always a
//! no-op, the same role `futures::task::noop_waker` plays in other executors.

use core::task::{RawWaker, RawWakerVTable, Waker};

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake_by_ref, drop);

fn clone(_data: *const ()) -> RawWaker {
    raw()
}

fn wake(_data: *const ()) {}

fn wake_by_ref(_data: *const ()) {}

fn drop(_data: *const ()) {}

fn raw() -> RawWaker {
    RawWaker::new(core::ptr::null(), &VTABLE)
}

/// Construct a [`Waker`] that does nothing when woken.
pub(crate) fn noop_waker() -> Waker {
    // SAFETY: the vtable's functions are all no-ops that never dereference
    // the null data pointer.
    unsafe { Waker::from_raw(raw()) }
}

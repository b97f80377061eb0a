//! Built-in [`Awaitable`]s: [`Delay`], [`NextCycle`], and the [`Plain`]
//! adapter (spec §4.2).
//!
//! Each implements `core::future::Future` directly, so an ordinary `.await`
//! inside an `async fn` fiber body *is* the suspension point described by
//! spec §5. On a `Poll::Pending` return they call [`crate::context::emit`]
//! to hand the owning [`crate::task::Task`] the [`Signal`] spec §4.2's
//! `on_suspend()` would have produced; [`Plain`] suspends on `Signal::Await`
//! and so additionally registers a [`crate::context::ReadyProbe`] via
//! [`crate::context::emit_await`], the Rust realization of spec §3's
//! `leaf_awaitable(T).ready()` — a side-effect-free check the scheduler's
//! await-bag promotion pass can call without resuming anything (spec §4.7
//! step 1; see DESIGN.md).
//!
//! Every `poll` here is required to be deterministic and side-effect-free
//! with respect to *readiness* (spec §4.2's contract for `ready()`), and
//! idempotent while `Pending`.

use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use alloc::rc::Rc;

use crate::clock::Duration;
use crate::context::{emit, emit_await};
use crate::signal::Signal;

/// Suspend the current fiber and ask the scheduler to re-schedule it after
/// a delay (spec §4.2).
///
/// The first `poll` always returns `Pending` and emits a `Signal`; the
/// second `poll` (after the scheduler has re-dispatched the task once time
/// has advanced) returns `Ready(())`. This one-shot latch mirrors
/// `examples/original_source/fiber/OS/Delay.hpp`'s `_ready` flag, which
/// starts `false` and is set `true` inside `await_suspend_signal()`.
#[derive(Debug, Clone, Copy)]
pub struct Delay {
    ready_delay: Duration,
    deadline: Option<Duration>,
    latched: bool,
}

impl Delay {
    /// Defer the ready time by `delay`; the next deadline is derived from
    /// the previous *relative* deadline (`prev.deadline - prev.ready`).
    pub const fn new(delay: Duration) -> Self {
        Delay {
            ready_delay: delay,
            deadline: None,
            latched: false,
        }
    }

    /// Defer the ready time by `delay` and set the next deadline to
    /// `delay + relative_deadline` from now.
    pub const fn with_deadline(delay: Duration, relative_deadline: Duration) -> Self {
        Delay {
            ready_delay: delay,
            deadline: Some(relative_deadline),
            latched: false,
        }
    }

    /// A delay of zero duration: still suspends exactly once (spec §8
    /// boundary behavior — "A Delay with zero duration causes exactly one
    /// yield").
    pub const fn yield_now() -> Self {
        Delay::new(Duration::ZERO)
    }
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.latched {
            return Poll::Ready(());
        }
        this.latched = true;
        let signal = match this.deadline {
            Some(rel_deadline) => Signal::ExplicitDelay(this.ready_delay, rel_deadline),
            None => Signal::ImplicitDelay(this.ready_delay),
        };
        emit(signal);
        Poll::Pending
    }
}

/// Yield exactly one turn without registering as blocked on anything: the
/// task is immediately resumable again, but the scheduler is told the
/// logical cycle has ended so it can recompute the schedule (spec §4.2).
///
/// Grounded in `examples/original_source/fiber/OS/NextCycle.hpp`, which
/// explicitly does *not* register itself as the task's leaf awaitable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextCycle {
    latched: bool,
}

impl NextCycle {
    /// A fresh, unlatched `NextCycle`.
    pub const fn new() -> Self {
        NextCycle { latched: false }
    }
}

impl Future for NextCycle {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.latched {
            return Poll::Ready(());
        }
        this.latched = true;
        emit(Signal::NextCycle);
        Poll::Pending
    }
}

/// Adapts any `ready()`/value-producing object with no scheduling hint into
/// an [`Awaitable`]-shaped `Future`: `on_suspend()` defaults to
/// `Signal::Await` (spec §4.2, "Plain-awaitable adapter").
///
/// `F` is polled on every call until it reports readiness via `poll_ready`;
/// the produced value is taken out exactly once. `poll_ready` is shared
/// behind `Rc<RefCell<_>>` rather than owned directly so the same check can
/// be registered as a [`crate::context::ReadyProbe`] on suspension — the
/// scheduler's await-bag promotion pass needs to call it without resuming
/// the enclosing Task (spec §4.7 step 1).
pub struct Plain<T, F> {
    poll_ready: Rc<RefCell<F>>,
    value: Option<T>,
}

impl<T, F> Plain<T, F>
where
    F: FnMut() -> Option<T>,
{
    /// Wrap a closure that returns `Some(value)` once ready, `None` while
    /// still pending.
    pub fn new(poll_ready: F) -> Self {
        Plain {
            poll_ready: Rc::new(RefCell::new(poll_ready)),
            value: None,
        }
    }
}

impl<T, F> Future for Plain<T, F>
where
    F: FnMut() -> Option<T> + Unpin + 'static,
    T: Unpin,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        if let Some(v) = this.value.take() {
            return Poll::Ready(v);
        }
        match (this.poll_ready.borrow_mut())() {
            Some(v) => Poll::Ready(v),
            None => {
                let poll_ready = this.poll_ready.clone();
                // Calling `poll_ready` again here is exactly what the real
                // `poll` would do next; the adapter's contract already
                // requires it be side-effect-free and idempotent while
                // pending.
                emit_await(Rc::new(move || (*poll_ready.borrow_mut())().is_some()));
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Exit, Task};

    #[test]
    fn delay_yields_exactly_once_then_ready() {
        let mut d = Delay::new(Duration::from_micros(5));
        let mut task = Task::from_future("probe", async move {
            d.await;
            Exit::Success
        });
        let signal = task.resume();
        assert_eq!(signal, Signal::ImplicitDelay(Duration::from_micros(5)));
        assert!(!task.is_done());
    }

    #[test]
    fn next_cycle_emits_and_then_completes() {
        let mut task = Task::from_future("probe", async move {
            NextCycle::new().await;
            Exit::Success
        });
        let signal = task.resume();
        assert_eq!(signal, Signal::NextCycle);
        let signal = task.resume();
        assert_eq!(signal, Signal::None);
        assert!(task.is_done());
    }
}

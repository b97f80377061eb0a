//! [`Task`] (C5) and [`RealTimeTask`] (C6): the owning container for a
//! fiber's frame chain, and its deadline-driven extension.
//!
//! Grounded in `examples/original_source/embed/OS/Coroutine.cpp` (`Task`)
//! and `fiber/OS/RealTimeTask.hpp` (`RealTimeTask`). Where the original uses
//! inheritance (`class RealTimeTask : public Task`), Design Note §9 asks for
//! composition instead: a plain `Task` exposes an opaque `Schedule`, and
//! real-time behavior is supplied by a small strategy object bound at
//! construction (here, the [`Strategy`] trait) rather than a subclass.

use core::future::Future as CoreFuture;
use core::pin::Pin;
use core::task::{Context, Poll};

use alloc::boxed::Box;

use crate::clock::{Duration, TimePoint};
use crate::context::ReadyProbe;
use crate::context::ScopedSignalTarget;
use crate::context::SignalCell;
use crate::signal::Signal;
use crate::waker::noop_waker;

/// Scheduler-assigned task identifier (spec §3, "a numeric id assigned by
/// the scheduler on admission").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// The sentinel id held before a task has been admitted to a scheduler.
    pub const UNASSIGNED: TaskId = TaskId(u64::MAX);

    /// The raw id value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A fiber's terminal outcome. `Fault` corresponds to spec §7's
/// `FiberFault`: an uncaught panic inside the frame chain, contained at the
/// `Task` boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The root frame returned normally and successfully.
    Success,
    /// The root frame returned normally but reported failure.
    Failure,
    /// The root frame panicked; the frame chain was torn down at the `Task`
    /// boundary without the fault escaping to the scheduler.
    Fault,
}

/// The `(ready, deadline)` pair consulted by the scheduler (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Earliest time this task may be dispatched.
    pub ready: TimePoint,
    /// Priority key for dispatch; earlier is higher priority.
    pub deadline: TimePoint,
}

/// The measured start/end of one dispatch, passed to
/// [`Strategy::next_schedule`] (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionWindow {
    /// When the scheduler called `resume()`.
    pub start: TimePoint,
    /// When `resume()` returned.
    pub end: TimePoint,
}

/// The pluggable real-time behavior bound to a [`RealTimeTask`] at
/// construction — the composition Design Note §9 asks for in place of the
/// original's `RealTimeTask` subclassing.
pub trait Strategy {
    /// Compute the next `Schedule` after a `Signal::NextCycle` (spec §4.6).
    /// Default: the task becomes ready again, with an equally tight
    /// deadline, exactly when the current cycle ended.
    fn next_schedule(&mut self, _previous: Schedule, execution: ExecutionWindow) -> Schedule {
        Schedule {
            ready: execution.end,
            deadline: execution.end,
        }
    }

    /// Decide whether a task that has already missed its deadline should
    /// still be dispatched. Default: always run it anyway (a "soft"
    /// real-time task, spec §4.6).
    fn missed_deadline(&mut self, _lateness: Duration) -> bool {
        true
    }
}

/// The default `Strategy`: no further cycles beyond what `next_schedule`'s
/// default computes, always run even when late.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {}

/// A suspendable computation and its frame chain (spec §3/§4.5, C5).
///
/// The frame chain itself is not a separate linked structure in this
/// implementation: it is whatever nested state `rustc` generated for
/// `root`'s `async fn` body, boxed once at the root. See SPEC_FULL.md's
/// "Rust-native realization" section.
pub struct Task {
    name: &'static str,
    id: TaskId,
    root: Pin<Box<dyn CoreFuture<Output = Exit>>>,
    signal_cell: SignalCell,
    last_signal: Signal,
    ready_probe: Option<ReadyProbe>,
    done: bool,
    exit: Option<Exit>,
}

impl Task {
    /// Build a task from a fiber body. The root frame is allocated (boxed)
    /// immediately but not polled until the first `resume()` — spec §4.3's
    /// "suspended immediately, before the first user statement".
    pub fn from_future<F>(name: &'static str, body: F) -> Self
    where
        F: CoreFuture<Output = Exit> + 'static,
    {
        Task {
            name,
            id: TaskId::UNASSIGNED,
            root: Box::pin(body),
            signal_cell: SignalCell::new(),
            last_signal: Signal::None,
            ready_probe: None,
            done: false,
            exit: None,
        }
    }

    /// The task's name, as supplied at construction.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The scheduler-assigned id, or [`TaskId::UNASSIGNED`] before
    /// admission.
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TaskId) {
        self.id = id;
    }

    /// `true` iff the root frame has completed (normally, with failure, or
    /// by fault).
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// `true` iff the task's last resume cycle ended on a `Signal::Await`
    /// and the task has not completed since — the Rust counterpart of spec
    /// §3's `leaf_awaitable != nullptr`.
    pub fn is_awaiting(&self) -> bool {
        !self.done && self.last_signal == Signal::Await
    }

    /// `true` iff the task is blocked on an external event whose leaf
    /// [`ReadyProbe`] now reports ready — spec §3's
    /// `leaf_awaitable(T).ready()`, without resuming the frame chain.
    ///
    /// `false` while not `is_awaiting()` (nothing to probe) and `false` if
    /// the leaf awaitable registered no probe at all (a suspension can only
    /// be promoted without resuming if it told us how to check).
    pub fn ready(&self) -> bool {
        self.is_awaiting() && self.ready_probe.as_ref().is_some_and(|probe| probe())
    }

    /// Preconditions per spec §4.5: callers should not call `resume()` on a
    /// task that `is_done()`. Calling it anyway is a caller bug (debug-only
    /// assertion), not a scheduler-visible failure.
    pub fn is_resumable(&self) -> bool {
        !self.done
    }

    /// The task's exit status. Only meaningful once `is_done()`.
    pub fn exit_status(&self) -> Option<Exit> {
        self.exit
    }

    /// Drive the frame chain forward by exactly one resume cycle.
    ///
    /// Clears the pending signal, polls `root` once, and returns whatever
    /// [`Signal`] the deepest suspending awaitable emitted — `Signal::None`
    /// if the task just completed. The signal is cached so `is_awaiting()`
    /// can answer without a further resume; if the signal is `Await`, the
    /// leaf's [`ReadyProbe`] (if it registered one) is cached too, so
    /// `ready()` can answer without a further resume either.
    ///
    /// Takes no clock: `resume()` only drives the frame chain one step. Any
    /// `now()`-relative rescheduling math implied by the returned `Signal`
    /// is the scheduler's responsibility (it holds the `Clock`), not the
    /// task's.
    pub fn resume(&mut self) -> Signal {
        debug_assert!(self.is_resumable(), "resume() called on a done task");
        self.signal_cell.take(); // reset to None at the start of the cycle
        let guard = ScopedSignalTarget::install(&self.signal_cell);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let poll = self.poll_guarded(&mut cx);
        drop(guard);

        let signal = match poll {
            Poll::Ready(exit) => {
                self.done = true;
                self.exit = Some(exit);
                Signal::None
            }
            Poll::Pending => self.signal_cell.take(),
        };
        self.ready_probe = if signal == Signal::Await {
            self.signal_cell.take_probe()
        } else {
            None
        };
        self.last_signal = signal;
        signal
    }

    #[cfg(feature = "std")]
    fn poll_guarded(&mut self, cx: &mut Context<'_>) -> Poll<Exit> {
        let root = &mut self.root;
        let name = self.name;
        let id = self.id;
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| root.as_mut().poll(cx))) {
            Ok(poll) => poll,
            Err(_) => {
                tracing::error!("{}", crate::error::ChronosError::fiber_fault_line(name, id.value()));
                Poll::Ready(Exit::Fault)
            }
        }
    }

    #[cfg(not(feature = "std"))]
    fn poll_guarded(&mut self, cx: &mut Context<'_>) -> Poll<Exit> {
        // No unwinding machinery without `std`; an uncaught panic aborts
        // the process, matching the "exceptions disabled" degraded
        // behavior Design Note §9 describes.
        self.root.as_mut().poll(cx)
    }

    /// Tear down the frame chain immediately. Idempotent (spec §8): calling
    /// `destroy()` on an already-done task is a no-op.
    pub fn destroy(&mut self) {
        if !self.done {
            self.done = true;
            self.exit.get_or_insert(Exit::Failure);
        }
    }
}

/// A [`Task`] wrapped with an explicit [`Schedule`] and [`Strategy`]
/// (spec §4.6, C6). Composition stands in for the original's
/// `RealTimeTask : public Task` inheritance (Design Note §9).
pub struct RealTimeTask {
    task: Task,
    schedule: Schedule,
    strategy: Box<dyn Strategy>,
    execution_start: Option<TimePoint>,
}

impl RealTimeTask {
    /// Wrap `task` with an initial `schedule` and `strategy`.
    pub fn new(task: Task, schedule: Schedule, strategy: Box<dyn Strategy>) -> Self {
        RealTimeTask {
            task,
            schedule,
            strategy,
            execution_start: None,
        }
    }

    /// Wrap `task` with an initial `schedule` and the [`DefaultStrategy`].
    pub fn with_default_strategy(task: Task, schedule: Schedule) -> Self {
        RealTimeTask::new(task, schedule, Box::new(DefaultStrategy))
    }

    /// The inner task.
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// The inner task, mutably.
    pub fn task_mut(&mut self) -> &mut Task {
        &mut self.task
    }

    /// The current `(ready, deadline)` pair.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Record that a dispatch is beginning at `now` — the scheduler calls
    /// this immediately before `resume()`, so `next_schedule`'s
    /// `ExecutionWindow` can be computed afterward.
    pub fn begin_execution(&mut self, now: TimePoint) {
        self.execution_start = Some(now);
    }

    /// `true` iff `now` is past this task's deadline and the bound
    /// strategy's [`Strategy::missed_deadline`] says it should be skipped
    /// rather than dispatched late.
    pub fn should_skip_missed_deadline(&mut self, now: TimePoint) -> bool {
        if now <= self.schedule.deadline {
            return false;
        }
        let lateness = now.saturating_since(self.schedule.deadline);
        !self.strategy.missed_deadline(lateness)
    }

    /// After a dispatch ends at `now` with `signal`, advance the schedule
    /// when the signal was `NextCycle` (the strategy computes the next
    /// `Schedule`) or an explicit/implicit delay (the ready time moves by
    /// the delay, the deadline per the signal's own rule).
    pub fn on_resumed(&mut self, signal: Signal, now: TimePoint) {
        let start = self.execution_start.unwrap_or(now);
        self.execution_start = None;
        match signal {
            Signal::NextCycle => {
                let window = ExecutionWindow { start, end: now };
                self.schedule = self.strategy.next_schedule(self.schedule, window);
            }
            Signal::ImplicitDelay(delay) => {
                let relative_deadline = self.schedule.deadline.saturating_since(self.schedule.ready);
                let ready = now + delay;
                self.schedule = Schedule {
                    ready,
                    deadline: ready + relative_deadline,
                };
            }
            Signal::ExplicitDelay(delay, relative_deadline) => {
                let ready = now + delay;
                self.schedule = Schedule {
                    ready,
                    deadline: ready + relative_deadline,
                };
            }
            Signal::Await | Signal::None => {}
        }
    }
}

/// Ordering key for the scheduler's waiting queue: smallest `ready` time
/// first (spec §4.7's min-heap over ready times).
pub(crate) fn ready_time_key(task: &RealTimeTask) -> TimePoint {
    task.schedule.ready
}

/// Ordering key for the scheduler's running queue: smallest `deadline`
/// first (earliest-deadline-first, spec §4.7).
pub(crate) fn deadline_key(task: &RealTimeTask) -> TimePoint {
    task.schedule.deadline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(n: u64) -> TimePoint {
        TimePoint::from_nanos(Duration::from_millis(n).as_nanos())
    }

    #[test]
    fn immediate_completion() {
        let mut task = Task::from_future("probe", async { Exit::Success });
        let signal = task.resume();
        assert_eq!(signal, Signal::None);
        assert!(task.is_done());
        assert_eq!(task.exit_status(), Some(Exit::Success));
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut task = Task::from_future("probe", async {
            crate::awaitable::NextCycle::new().await;
            Exit::Success
        });
        task.destroy();
        assert!(task.is_done());
        task.destroy();
        assert!(task.is_done());
    }

    #[test]
    fn delay_signal_does_not_count_as_awaiting() {
        let mut task = Task::from_future("probe", async move {
            crate::awaitable::Delay::new(Duration::from_micros(1)).await;
            Exit::Success
        });
        let signal = task.resume();
        assert_eq!(signal, Signal::ImplicitDelay(Duration::from_micros(1)));
        assert!(!task.is_awaiting());
        assert!(!task.is_done());
    }

    #[test]
    fn default_strategy_holds_cycle_end_as_next_schedule() {
        let mut strategy = DefaultStrategy;
        let prev = Schedule {
            ready: millis(0),
            deadline: millis(10),
        };
        let window = ExecutionWindow {
            start: millis(10),
            end: millis(12),
        };
        let next = strategy.next_schedule(prev, window);
        assert_eq!(next.ready, millis(12));
        assert_eq!(next.deadline, millis(12));
    }

    #[test]
    fn real_time_task_advances_schedule_on_implicit_delay() {
        let task = Task::from_future("probe", async { Exit::Success });
        let schedule = Schedule {
            ready: millis(0),
            deadline: millis(5),
        };
        let mut rtt = RealTimeTask::with_default_strategy(task, schedule);
        rtt.on_resumed(Signal::ImplicitDelay(Duration::from_millis(2)), millis(0));
        let updated = rtt.schedule();
        assert_eq!(updated.ready, millis(2));
        assert_eq!(updated.deadline, millis(7));
    }

    #[test]
    fn missed_deadline_default_strategy_always_runs() {
        let task = Task::from_future("probe", async { Exit::Success });
        let schedule = Schedule {
            ready: millis(0),
            deadline: millis(5),
        };
        let mut rtt = RealTimeTask::with_default_strategy(task, schedule);
        assert!(!rtt.should_skip_missed_deadline(millis(10)));
    }
}

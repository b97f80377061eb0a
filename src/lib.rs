//! A cooperative, earliest-deadline-first fiber scheduling runtime.
//!
//! Application code expresses concurrent activities as `async fn` bodies
//! ("fibers"); [`Task`](task::Task) owns one fiber's frame chain and
//! [`Scheduler`](scheduler::Scheduler) multiplexes many Tasks onto a single
//! execution context by earliest deadline, with explicit ready-time gating
//! and an await facility for external events. There is no preemption: a
//! fiber only yields control at an `.await` point.
//!
//! `no_std` + `alloc` by default; the `std` feature adds a host [`WallClock`](clock::WallClock),
//! a `tracing`-backed logger, and the `chronos-demo` binary.

#![no_std]
#![cfg_attr(not(feature = "std"), allow(dead_code))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod awaitable;
pub mod clock;
mod context;
pub mod error;
pub mod frame;
pub mod future;
pub mod log;
pub mod periodic;
pub mod scheduler;
pub mod signal;
pub mod task;
mod waker;

#[cfg(feature = "embedded-alloc")]
pub mod allocator;

#[cfg(test)]
mod proptest_invariants;

pub use awaitable::{Delay, NextCycle, Plain};
pub use clock::{Clock, Duration, TimePoint};
pub use error::{ChronosError, Result};
pub use frame::Frame;
pub use future::{make_future_promise, Future, Promise};
pub use log::{NoopLog, SchedulerLog};
pub use scheduler::Scheduler;
pub use signal::Signal;
pub use task::{DefaultStrategy, Exit, RealTimeTask, Schedule, Strategy, Task, TaskId};

#[cfg(feature = "std")]
pub use clock::WallClock;
#[cfg(feature = "std")]
pub use log::TracingLog;

//! Property tests for the universal scheduling invariants spec §8 calls out
//! (EDF ordering, ready-time monotonicity of promotion, Future/Promise
//! connection symmetry), supplementing the example-driven S1-S6 unit tests
//! in `scheduler.rs`/`future.rs` with randomized coverage. `proptest` itself
//! is the same property-testing crate `seanchatmangpt-knhk` uses.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use proptest::prelude::*;

use crate::clock::{MockClock, TimePoint};
use crate::future::make_future_promise;
use crate::task::{DefaultStrategy, Exit, Schedule, Task};
use crate::Scheduler;

proptest! {
    /// However many tasks become ready at once, `spin()` always dispatches
    /// them in non-decreasing deadline order (spec §4.7 EDF invariant).
    #[test]
    fn edf_dispatch_order_is_nondecreasing_deadline(
        deadlines in prop::collection::hash_set(1u64..1_000_000, 1..8)
    ) {
        let deadlines: Vec<u64> = deadlines.into_iter().collect();
        let clock = MockClock::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new(deadlines.len(), &clock);

        for d in &deadlines {
            let order = order.clone();
            let deadline = *d;
            let task = Task::from_future("t", async move {
                order.borrow_mut().push(deadline);
                Exit::Success
            });
            scheduler
                .add(
                    task,
                    Schedule { ready: TimePoint::ZERO, deadline: TimePoint::from_nanos(deadline) },
                    Box::new(DefaultStrategy),
                )
                .unwrap();
        }

        for _ in 0..deadlines.len() {
            scheduler.spin();
        }

        let mut expected = deadlines.clone();
        expected.sort_unstable();
        prop_assert_eq!(order.borrow().clone(), expected);
    }

    /// A task is never dispatched before the clock reaches its ready time;
    /// stepping the clock through a sorted set of distinct ready times and
    /// spinning once per step dispatches tasks in that same order.
    #[test]
    fn promotion_respects_ready_time_order(
        readies in prop::collection::hash_set(1u64..1_000_000, 1..6)
    ) {
        let mut readies: Vec<u64> = readies.into_iter().collect();
        readies.sort_unstable();
        let clock = MockClock::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new(readies.len(), &clock);

        for r in &readies {
            let order = order.clone();
            let ready = *r;
            let task = Task::from_future("t", async move {
                order.borrow_mut().push(ready);
                Exit::Success
            });
            scheduler
                .add(
                    task,
                    Schedule {
                        ready: TimePoint::from_nanos(ready),
                        deadline: TimePoint::from_nanos(ready + 1),
                    },
                    Box::new(DefaultStrategy),
                )
                .unwrap();
        }

        for r in &readies {
            clock.set(TimePoint::from_nanos(*r));
            scheduler.spin();
        }

        prop_assert_eq!(order.borrow().clone(), readies);
    }

    /// `Future`/`Promise` connection is symmetric, and exactly one of
    /// waiting/ready/broken holds at any point (spec §4.4).
    #[test]
    fn future_promise_connection_is_symmetric_and_state_is_exclusive(
        set_before_check in any::<bool>(), value in any::<i32>()
    ) {
        let (future, promise) = make_future_promise::<i32>();
        prop_assert!(future.is_connected_to(&promise));
        prop_assert!(promise.is_connected_to(&future));

        if set_before_check {
            promise.set_value(value).unwrap();
        }

        let states = [future.is_waiting(), future.is_ready(), future.is_broken_promise()];
        prop_assert_eq!(states.iter().filter(|b| **b).count(), 1);
    }
}

//! The single-producer/single-consumer rendezvous pair (spec §3/§4.4),
//! grounded in `examples/original_source/embed/OS/tests/Future_test.cpp`.
//!
//! `Future<T>` doubles as an [`Awaitable`](crate::awaitable): it implements
//! `core::future::Future` directly so it can be `.await`ed as a leaf inside
//! a fiber body, exactly the role spec §4.2 assigns it.
//!
//! The C++ original tracks "moved-from" handles at runtime because C++ move
//! leaves the source object alive-but-empty. Rust's ownership model makes
//! that unnecessary: moving a `Future`/`Promise` binding (`let g = f;`)
//! makes the old binding inaccessible at compile time, which is a *stronger*
//! form of spec §4.4's closing guarantee ("enforced by the type system of
//! the target language") than the original's runtime convention. We do not
//! reproduce the C++ test that inspects a moved-from handle's state, since
//! there is no such observable handle in Rust — see DESIGN.md.

use core::cell::RefCell;
use core::future::Future as CoreFuture;
use core::pin::Pin;
use core::task::{Context, Poll};

use alloc::rc::Rc;

use crate::context::emit_await;
use crate::error::ChronosError;

enum Slot<T> {
    Empty,
    Ready(T),
    Broken,
}

struct Cell<T> {
    slot: Slot<T>,
}

/// The consumer side of a [`Promise`]/`Future` rendezvous.
pub struct Future<T> {
    cell: Rc<RefCell<Cell<T>>>,
}

/// The producer side of a [`Future`]/`Promise` rendezvous.
pub struct Promise<T> {
    cell: Rc<RefCell<Cell<T>>>,
}

/// Create a connected `Future`/`Promise` pair sharing a fresh cell in state
/// `Empty` (spec §4.4, "Construction").
pub fn make_future_promise<T>() -> (Future<T>, Promise<T>) {
    let cell = Rc::new(RefCell::new(Cell { slot: Slot::Empty }));
    (
        Future { cell: cell.clone() },
        Promise { cell },
    )
}

impl<T> Future<T> {
    /// `true` iff no value has arrived and the promise has not been
    /// dropped empty.
    pub fn is_waiting(&self) -> bool {
        matches!(self.cell.borrow().slot, Slot::Empty)
    }

    /// `true` iff a value is available to be consumed.
    pub fn is_ready(&self) -> bool {
        matches!(self.cell.borrow().slot, Slot::Ready(_))
    }

    /// `true` iff the matching `Promise` was dropped without ever setting a
    /// value (or this `Future` was default-constructed with no promise at
    /// all).
    pub fn is_broken_promise(&self) -> bool {
        matches!(self.cell.borrow().slot, Slot::Broken)
    }

    /// `true` iff `other` is the `Promise` half of this same cell.
    pub fn is_connected_to(&self, other: &Promise<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Non-blocking check: consumes and returns the value if `Ready`,
    /// otherwise `None` (whether still `Empty` or already `Broken`).
    /// Mirrors `Future::get_if()` in the original source.
    pub fn get_if(&mut self) -> Option<T> {
        let mut cell = self.cell.borrow_mut();
        match core::mem::replace(&mut cell.slot, Slot::Empty) {
            Slot::Ready(v) => Some(v),
            other => {
                cell.slot = other;
                None
            }
        }
    }

    /// Synchronous, non-suspending read. Fails with `BrokenPromise` once the
    /// promise has dropped empty, `InvalidState` while still `Empty` (use
    /// `.await` inside a fiber to suspend until ready instead), and consumes
    /// the value on `Ready`.
    pub fn get(&mut self) -> Result<T, ChronosError> {
        let mut cell = self.cell.borrow_mut();
        match core::mem::replace(&mut cell.slot, Slot::Empty) {
            Slot::Ready(v) => Ok(v),
            Slot::Broken => {
                cell.slot = Slot::Broken;
                Err(ChronosError::BrokenPromise)
            }
            Slot::Empty => Err(ChronosError::InvalidState),
        }
    }
}

impl<T> Default for Future<T> {
    /// A disconnected future with no live promise, already `Broken` — the
    /// default-constructed `embed::Future<int> f;` scenario from
    /// `Future_test.cpp::broken_promise_test`.
    fn default() -> Self {
        Future {
            cell: Rc::new(RefCell::new(Cell { slot: Slot::Broken })),
        }
    }
}

impl<T: 'static> CoreFuture for Future<T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        let mut cell = this.cell.borrow_mut();
        match core::mem::replace(&mut cell.slot, Slot::Empty) {
            Slot::Ready(v) => Poll::Ready(Some(v)),
            Slot::Broken => {
                cell.slot = Slot::Broken;
                Poll::Ready(None)
            }
            Slot::Empty => {
                cell.slot = Slot::Empty;
                drop(cell);
                let shared = this.cell.clone();
                emit_await(Rc::new(move || !matches!(shared.borrow().slot, Slot::Empty)));
                Poll::Pending
            }
        }
    }
}

impl<T> Promise<T> {
    /// `true` iff `other` is the `Future` half of this same cell.
    pub fn is_connected_to(&self, other: &Future<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Transition `Empty -> Ready(v)`. Fails with `AlreadySet` if the cell
    /// is already `Ready` or `Broken` (spec §4.4).
    pub fn set_value(&self, value: T) -> Result<(), ChronosError> {
        let mut cell = self.cell.borrow_mut();
        match cell.slot {
            Slot::Empty => {
                cell.slot = Slot::Ready(value);
                Ok(())
            }
            _ => Err(ChronosError::AlreadySet),
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        // Only one `Promise` handle ever references a cell (move-only), so
        // on drop we either already delivered a value or we must mark the
        // cell `Broken` so the `Future` observer sees a terminal state.
        let mut cell = self.cell.borrow_mut();
        if matches!(cell.slot, Slot::Empty) {
            cell.slot = Slot::Broken;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_pair_is_waiting_and_connected() {
        let (future, promise) = make_future_promise::<i32>();
        assert!(future.is_waiting());
        assert!(!future.is_ready());
        assert!(!future.is_broken_promise());
        assert!(future.is_connected_to(&promise));
        assert!(promise.is_connected_to(&future));
    }

    #[test]
    fn set_value_then_get() {
        let (mut future, promise) = make_future_promise::<i32>();
        promise.set_value(5).unwrap();
        assert!(!future.is_waiting());
        assert!(future.is_ready());
        assert_eq!(future.get().unwrap(), 5);
    }

    #[test]
    fn double_set_fails() {
        let (_future, promise) = make_future_promise::<i32>();
        promise.set_value(1).unwrap();
        assert_eq!(promise.set_value(2), Err(ChronosError::AlreadySet));
    }

    #[test]
    fn dropping_promise_empty_breaks_future() {
        let (mut future, promise) = make_future_promise::<i32>();
        assert!(!future.is_broken_promise());
        drop(promise);
        assert!(future.is_broken_promise());
        assert_eq!(future.get(), Err(ChronosError::BrokenPromise));
        assert_eq!(future.get_if(), None);
    }

    #[test]
    fn default_future_is_broken() {
        let mut f: Future<i32> = Future::default();
        assert!(f.is_broken_promise());
        assert_eq!(f.get_if(), None);
    }
}

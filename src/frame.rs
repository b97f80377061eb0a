//! [`Frame`]: an explicit, separately-boxed suspendable child activation
//! (spec §3/§4.3).
//!
//! Most nested suspension in this runtime needs no explicit `Frame` at all:
//! when one `async fn` awaits another, rustc nests the callee's generated
//! state machine directly inside the caller's, which already gives us the
//! spec's parent/child chain, leaf-caching, and LIFO teardown for free (see
//! SPEC_FULL.md, "Rust-native realization"). `Frame<T>` exists for the case
//! the compiler can't inline: a dynamically chosen or recursive fiber body,
//! which needs its own heap activation the way
//! `examples/original_source/embed/OS/Coroutine.cpp`'s `CoroutineNode` is a
//! separate allocation linked into its parent's chain.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use alloc::boxed::Box;

/// A boxed, pinned child activation of a suspendable function.
///
/// Dropping a `Frame` drops its boxed future, which recursively drops any
/// further-nested frames it owns — the Rust realization of spec §4.3's
/// "unlinked and destroyed on final return, in strict LIFO order".
pub struct Frame<'a, T> {
    inner: Pin<Box<dyn Future<Output = T> + 'a>>,
}

impl<'a, T> Frame<'a, T> {
    /// Box and pin `body` as a new child frame.
    ///
    /// This is the entry point spec §4.3 describes as "suspended
    /// immediately, before the first user statement": the future isn't
    /// polled until the caller first awaits (or explicitly polls) the
    /// returned `Frame`.
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = T> + 'a,
    {
        Frame {
            inner: Box::pin(body),
        }
    }
}

impl<'a, T> Future for Frame<'a, T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recursive_countdown(n: u32) -> Frame<'static, u32> {
        Frame::new(async move {
            if n == 0 {
                0
            } else {
                1 + recursive_countdown(n - 1).await
            }
        })
    }

    #[test]
    fn recursive_frame_chain_resolves() {
        let waker = crate::waker::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut frame = Box::pin(recursive_countdown(5));
        match frame.as_mut().poll(&mut cx) {
            Poll::Ready(v) => assert_eq!(v, 5),
            Poll::Pending => panic!("recursive frame should resolve synchronously"),
        }
    }
}

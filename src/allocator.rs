//! Optional global allocator for bare-metal deployments (feature
//! `embedded-alloc`).
//!
//! The core only requires `extern crate alloc`; a deployment is free to
//! supply its own `#[global_allocator]`. This module is carried over from
//! the teacher's own `linked_list_allocator::LockedHeap` heap (its
//! `src/allocator.rs` maps page tables before initializing the heap; a
//! generic library cannot assume a paging MMU exists, so we drop that part
//! and keep only the heap-region/init shape) for the common case of "a
//! single static byte region reserved for the whole program".

use linked_list_allocator::LockedHeap;

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Hand a single contiguous byte region to the global allocator.
///
/// # Safety
/// `heap_start` must point to at least `heap_size` bytes that are valid for
/// the remainder of the program and not used by anything else; this must be
/// called at most once, before any allocation.
pub unsafe fn init_heap(heap_start: *mut u8, heap_size: usize) {
    ALLOCATOR.lock().init(heap_start, heap_size);
}

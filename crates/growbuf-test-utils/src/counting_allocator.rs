// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

/// Per-thread allocation counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocationStats {
    /// Successful `alloc` / `alloc_zeroed` calls.
    pub allocations: usize,
    /// Successful `realloc` calls.
    pub reallocations: usize,
    /// `dealloc` calls.
    pub deallocations: usize,
    /// Calls that returned null because a failure was injected.
    pub injected_failures: usize,
}

impl AllocationStats {
    const ZERO: Self = Self {
        allocations: 0,
        reallocations: 0,
        deallocations: 0,
        injected_failures: 0,
    };

    /// Counters accumulated since `earlier` was taken.
    pub fn since(self, earlier: Self) -> Self {
        Self {
            allocations: self.allocations.wrapping_sub(earlier.allocations),
            reallocations: self.reallocations.wrapping_sub(earlier.reallocations),
            deallocations: self.deallocations.wrapping_sub(earlier.deallocations),
            injected_failures: self
                .injected_failures
                .wrapping_sub(earlier.injected_failures),
        }
    }

    /// Total calls that touched the heap (allocations plus reallocations).
    pub fn heap_requests(&self) -> usize {
        self.allocations + self.reallocations
    }
}

thread_local! {
    static STATS: Cell<AllocationStats> = const { Cell::new(AllocationStats::ZERO) };
    // Number of allocation requests still allowed to succeed; None disables injection.
    static REMAINING_BEFORE_FAILURE: Cell<Option<usize>> = const { Cell::new(None) };
}

fn record(update: impl FnOnce(&mut AllocationStats)) {
    let _ = STATS.try_with(|cell| {
        let mut stats = cell.get();
        update(&mut stats);
        cell.set(stats);
    });
}

fn should_fail() -> bool {
    REMAINING_BEFORE_FAILURE
        .try_with(|cell| match cell.get() {
            None => false,
            Some(0) => true,
            Some(remaining) => {
                cell.set(Some(remaining - 1));
                false
            }
        })
        .unwrap_or(false)
}

/// Global allocator that forwards to [`System`] while counting calls per thread.
///
/// Install it in a test binary with `#[global_allocator]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if should_fail() {
            record(|stats| stats.injected_failures += 1);
            return core::ptr::null_mut();
        }

        // SAFETY: forwarded with the caller's guarantees.
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record(|stats| stats.allocations += 1);
        }

        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if should_fail() {
            record(|stats| stats.injected_failures += 1);
            return core::ptr::null_mut();
        }

        // SAFETY: forwarded with the caller's guarantees.
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record(|stats| stats.allocations += 1);
        }

        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if should_fail() {
            record(|stats| stats.injected_failures += 1);
            return core::ptr::null_mut();
        }

        // SAFETY: forwarded with the caller's guarantees.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record(|stats| stats.reallocations += 1);
        }

        new_ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        record(|stats| stats.deallocations += 1);

        // SAFETY: forwarded with the caller's guarantees.
        unsafe { System.dealloc(ptr, layout) }
    }
}

/// Returns the counters of the current thread.
pub fn allocation_stats() -> AllocationStats {
    STATS.try_with(Cell::get).unwrap_or_default()
}

/// Runs `f` and returns its result with the allocations it made on this thread.
pub fn measure<R>(f: impl FnOnce() -> R) -> (R, AllocationStats) {
    let before = allocation_stats();
    let result = f();
    let after = allocation_stats();

    (result, after.since(before))
}

/// Makes allocation requests on this thread fail once `successes` more have
/// gone through. Injection stops when the returned guard is dropped.
///
/// Keep the guarded region free of anything that allocates on its own
/// (formatting, panics with messages), since those requests fail too.
#[must_use = "allocation failures stop as soon as the guard is dropped"]
pub fn fail_allocations_after(successes: usize) -> FailureGuard {
    let previous = REMAINING_BEFORE_FAILURE.with(|cell| cell.replace(Some(successes)));

    FailureGuard { previous }
}

/// Restores the previous failure-injection state on drop.
#[derive(Debug)]
pub struct FailureGuard {
    previous: Option<usize>,
}

impl Drop for FailureGuard {
    fn drop(&mut self) {
        let _ = REMAINING_BEFORE_FAILURE.try_with(|cell| cell.set(self.previous));
    }
}

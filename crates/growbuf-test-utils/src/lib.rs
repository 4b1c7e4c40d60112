// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test utilities for growbuf crates.
//!
//! Provides [`CountingAllocator`], a `System`-backed global allocator that
//! counts allocations per thread and can be told to fail them, so tests can
//! observe allocation behaviour and exercise allocation-failure paths.
//!
//! ```rust,ignore
//! use growbuf_test_utils::{CountingAllocator, measure};
//!
//! #[global_allocator]
//! static ALLOCATOR: CountingAllocator = CountingAllocator;
//!
//! let ((), stats) = measure(|| {
//!     let _v: Vec<u8> = Vec::new();
//! });
//! assert_eq!(stats.allocations, 0);
//! ```
//!
//! ## License
//!
//! GPL-3.0-only

mod counting_allocator;

pub use counting_allocator::{
    AllocationStats, CountingAllocator, FailureGuard, allocation_stats, fail_allocations_after,
    measure,
};

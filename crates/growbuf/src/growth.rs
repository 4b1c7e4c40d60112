// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Amortized growth policy.
//!
//! Capacity doubles on every implicit growth (0 → 1 → 2 → 4 → 8 ...), so N
//! appends starting from an empty buffer copy O(N) elements in total and
//! reallocate only O(log N) times.

/// Multiplier applied to the current capacity on implicit growth.
pub const GROWTH_FACTOR: usize = 2;

/// Capacity of the first allocation made by an implicit growth.
pub const MIN_NON_ZERO_CAPACITY: usize = 1;

/// Capacity to grow to when `required` elements must fit and `current` is too small.
///
/// Returns `None` if the doubled capacity overflows `usize`.
#[inline]
pub(crate) fn grown_capacity(current: usize, required: usize) -> Option<usize> {
    let doubled = current
        .checked_mul(GROWTH_FACTOR)?
        .max(MIN_NON_ZERO_CAPACITY);

    Some(doubled.max(required))
}

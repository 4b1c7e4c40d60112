// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for growbuf.

use thiserror::Error;

/// Error type for `GrowableBuffer` operations.
///
/// Every variant is recoverable: when an operation returns an error, the buffer
/// is left exactly as it was before the call.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum GrowableBufferError {
    /// The allocator could not provide storage for `capacity` elements.
    ///
    /// Also returned when the layout for `capacity` elements (plus the header)
    /// would exceed `isize::MAX` bytes, or when the growth computation itself
    /// overflows `usize`.
    #[error("allocation failure: cannot provide storage for {capacity} elements")]
    AllocationFailure {
        /// Capacity that was requested.
        capacity: usize,
    },

    /// `remove_last()` was called on a buffer with no live elements.
    #[error("buffer is empty")]
    EmptyBuffer,

    /// Indexed access past the last live element.
    #[error("index {index} out of range for buffer of length {len}")]
    OutOfRange {
        /// Index that was requested.
        index: usize,
        /// Length of the buffer at the time of the access.
        len: usize,
    },
}

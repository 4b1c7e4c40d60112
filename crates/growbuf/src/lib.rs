// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Growable contiguous buffer with header-adjacent metadata.
//!
//! `GrowableBuffer<T>` is a single-owner dynamic array whose handle is one
//! pointer to element 0. Length and capacity are stored in a header placed just
//! before the elements, inside the same allocation.
//!
//! # Core Guarantees
//!
//! - **Zero-cost empty state**: `GrowableBuffer::new()` does not allocate. The
//!   empty sentinel reports `len() == 0` and `capacity() == 0` and is accepted by
//!   every operation; `clear()` and `release()` on it are no-ops.
//! - **Amortized growth**: `append()` doubles the capacity when full, so N appends
//!   cost O(N) element moves in total.
//! - **Exact capacity control**: `grow(n)` and `truncate(n)` set the capacity to
//!   exactly `n`, clamping the length when `n < len()`.
//! - **Checked access**: out-of-range reads and pops on an empty buffer return an
//!   error instead of touching memory.
//! - **Strong failure guarantee**: a failed allocation leaves the buffer unchanged.
//!
//! # Example: Basic Usage
//!
//! ```rust
//! use growbuf::{GrowableBuffer, GrowableBufferError};
//!
//! fn example() -> Result<(), GrowableBufferError> {
//!     let mut buf = GrowableBuffer::new();
//!
//!     for i in 0..10_000i64 {
//!         buf.append(i)?;
//!     }
//!
//!     assert_eq!(buf.len(), 10_000);
//!     assert_eq!(*buf.element_at(9_999)?, 9_999);
//!     assert!(buf.capacity() >= buf.len());
//!
//!     // Reuse the allocation
//!     buf.clear();
//!     assert_eq!(buf.len(), 0);
//!     assert!(buf.is_allocated());
//!
//!     // Back to the empty sentinel
//!     buf.release();
//!     assert!(!buf.is_allocated());
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! # Example: Explicit Capacity
//!
//! ```rust
//! use growbuf::{GrowableBuffer, GrowableBufferError};
//!
//! fn example() -> Result<(), GrowableBufferError> {
//!     let mut buf = GrowableBuffer::new();
//!     buf.extend_from_slice(&[1.1f32, 1.2, 1.3, 1.4])?;
//!
//!     buf.truncate(3)?;
//!     assert_eq!(buf.len(), 3);
//!     assert_eq!(buf.capacity(), 3);
//!
//!     assert_eq!(buf.remove_last()?, 1.3);
//!     assert_eq!(buf.remove_last()?, 1.2);
//!     assert_eq!(buf.remove_last()?, 1.1);
//!     assert_eq!(buf.remove_last(), Err(GrowableBufferError::EmptyBuffer));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! # Features
//!
//! - `unsafe`: exposes [`GrowableBuffer::as_mut_ptr`] and [`GrowableBuffer::set_len`]
//!   for callers that initialize spare capacity themselves.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

extern crate alloc;

mod error;
mod growable_buffer;
mod header;

pub mod growth;

#[cfg(test)]
mod tests;

pub use error::GrowableBufferError;
pub use growable_buffer::GrowableBuffer;

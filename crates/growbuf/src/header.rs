// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Header-prefixed allocations.
//!
//! A block is a single heap allocation laid out as:
//!
//! ```text
//! +-------------------+---------+-----+-----+-----+------------------+
//! | Header {len, cap} | padding | T 0 | T 1 | ... | T (capacity - 1) |
//! +-------------------+---------+-----+-----+-----+------------------+
//!                               ^
//!                               handle
//! ```
//!
//! The handle always points at element 0; the header is recovered by stepping
//! back `data_offset::<T>()` bytes. The padding only exists when `T` is more
//! aligned than `Header`.

use alloc::alloc::{Layout, alloc, dealloc, realloc};
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

use crate::error::GrowableBufferError;

/// Metadata stored in front of the element array.
#[repr(C)]
pub(crate) struct Header {
    pub(crate) len: usize,
    pub(crate) capacity: usize,
}

/// Byte distance between the start of the block and element 0.
#[inline(always)]
pub(crate) const fn data_offset<T>() -> usize {
    let align = align_of::<T>();
    (size_of::<Header>() + align - 1) & !(align - 1)
}

/// Layout of a block holding `capacity` elements, or `None` if it would overflow.
pub(crate) fn block_layout<T>(capacity: usize) -> Option<Layout> {
    let array = Layout::array::<T>(capacity).ok()?;
    let (layout, offset) = Layout::new::<Header>().extend(array).ok()?;
    debug_assert_eq!(offset, data_offset::<T>());

    Some(layout)
}

/// Returns a pointer to the header of the block whose element 0 is `data`.
///
/// # Safety
///
/// `data` must be a handle returned by [`allocate`] or [`reallocate`] whose
/// block has not been deallocated.
#[inline(always)]
pub(crate) unsafe fn header_ptr<T>(data: NonNull<T>) -> NonNull<Header> {
    // SAFETY: the header sits data_offset::<T>() bytes before element 0 in the same block.
    unsafe { data.cast::<u8>().sub(data_offset::<T>()).cast::<Header>() }
}

/// Allocates a block for `capacity` elements with `len == 0`.
pub(crate) fn allocate<T>(capacity: usize) -> Result<NonNull<T>, GrowableBufferError> {
    let failure = GrowableBufferError::AllocationFailure { capacity };
    let layout = block_layout::<T>(capacity).ok_or(failure)?;

    // SAFETY: layout always includes the header, so its size is non-zero.
    let base = NonNull::new(unsafe { alloc(layout) }).ok_or(failure)?;

    // SAFETY: base is valid for writes of a Header (first field of the layout),
    // and element 0 lies data_offset::<T>() bytes into the same block.
    unsafe {
        base.cast::<Header>().write(Header { len: 0, capacity });
        Ok(base.add(data_offset::<T>()).cast::<T>())
    }
}

/// Moves the block behind `data` to one sized for `new_capacity` elements.
///
/// The header's `len` is kept as is; callers must make sure it does not exceed
/// `new_capacity`. On failure the original block is untouched and still owned
/// by the caller.
///
/// # Safety
///
/// `data` must be a live handle whose header holds `old_capacity`, and the
/// block must contain no live elements at indices `>= new_capacity`.
pub(crate) unsafe fn reallocate<T>(
    data: NonNull<T>,
    old_capacity: usize,
    new_capacity: usize,
) -> Result<NonNull<T>, GrowableBufferError> {
    let failure = GrowableBufferError::AllocationFailure {
        capacity: new_capacity,
    };
    let old_layout = block_layout::<T>(old_capacity).ok_or(failure)?;
    let new_layout = block_layout::<T>(new_capacity).ok_or(failure)?;

    // SAFETY (PRECONDITIONS ARE MET): the block was allocated with old_layout,
    // both layouts share the same alignment and new_layout's size is non-zero.
    let base = unsafe {
        let old_base = header_ptr(data).cast::<u8>();
        realloc(old_base.as_ptr(), old_layout, new_layout.size())
    };
    let base = NonNull::new(base).ok_or(failure)?;

    // SAFETY: realloc preserved the header bytes at the start of the new block.
    unsafe {
        (*base.cast::<Header>().as_ptr()).capacity = new_capacity;
        Ok(base.add(data_offset::<T>()).cast::<T>())
    }
}

/// Frees the block behind `data` without dropping any element.
///
/// # Safety
///
/// `data` must be a live handle whose header holds `capacity`. The handle must
/// not be used afterwards.
pub(crate) unsafe fn deallocate<T>(data: NonNull<T>, capacity: usize) {
    let Some(layout) = block_layout::<T>(capacity) else {
        debug_assert!(false, "deallocate: live block with an invalid layout");
        return;
    };

    // SAFETY: the block was allocated with exactly this layout.
    unsafe { dealloc(header_ptr(data).cast::<u8>().as_ptr(), layout) }
}

/// Deallocates a detached block when dropped, so destructors that panic while
/// its elements are being dropped still release the memory.
pub(crate) struct DeallocOnDrop<T> {
    data: NonNull<T>,
    capacity: usize,
}

impl<T> DeallocOnDrop<T> {
    /// # Safety
    ///
    /// `data` must be a live handle with `capacity` that nothing else will free.
    pub(crate) unsafe fn new(data: NonNull<T>, capacity: usize) -> Self {
        Self { data, capacity }
    }
}

impl<T> Drop for DeallocOnDrop<T> {
    fn drop(&mut self) {
        // SAFETY: guaranteed by the constructor contract.
        unsafe { deallocate(self.data, self.capacity) }
    }
}

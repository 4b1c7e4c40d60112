// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use crate::error::GrowableBufferError;
use crate::growth;
use crate::header::{self, DeallocOnDrop, Header};

/// A growable, contiguous buffer whose handle is a single pointer to element 0.
///
/// Length and capacity live in a header placed right before the elements, in
/// the same allocation. A buffer that never allocated (or was released) holds
/// no pointer at all: that is the empty sentinel, and every operation accepts it.
///
/// Operations that may move the storage (`append()`, `grow()`, `truncate()`,
/// `extend_from_slice()`) take `&mut self`, so the caller's handle is always
/// rebound in place and no borrow of the old storage can survive the call.
///
/// # Example
///
/// ```rust
/// use growbuf::{GrowableBuffer, GrowableBufferError};
///
/// fn example() -> Result<(), GrowableBufferError> {
///     let mut buf = GrowableBuffer::new();
///     assert!(!buf.is_allocated());
///
///     buf.append(1.1f32)?;
///     buf.append(1.2f32)?;
///
///     assert_eq!(buf.len(), 2);
///     assert_eq!(*buf.element_at(1)?, 1.2);
///     assert_eq!(buf.remove_last()?, 1.2);
///
///     buf.release();
///     assert_eq!(buf.capacity(), 0);
///     Ok(())
/// }
/// # example().unwrap();
/// ```
pub struct GrowableBuffer<T> {
    ptr: Option<NonNull<T>>,
    _owns: PhantomData<T>,
}

// SAFETY: GrowableBuffer uniquely owns its elements, like Vec<T>.
unsafe impl<T: Send> Send for GrowableBuffer<T> {}
unsafe impl<T: Sync> Sync for GrowableBuffer<T> {}

impl<T> GrowableBuffer<T> {
    /// Creates the empty sentinel. Does not allocate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growbuf::GrowableBuffer;
    ///
    /// let buf: GrowableBuffer<u64> = GrowableBuffer::new();
    /// assert_eq!(buf.len(), 0);
    /// assert_eq!(buf.capacity(), 0);
    /// assert!(buf.as_ptr().is_null());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            ptr: None,
            _owns: PhantomData,
        }
    }

    /// Creates a buffer with exactly `capacity` slots and no live elements.
    ///
    /// `with_capacity(0)` returns the sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::AllocationFailure`] if the storage cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self, GrowableBufferError> {
        let mut buf = Self::new();
        buf.grow(capacity)?;

        Ok(buf)
    }

    #[inline(always)]
    fn header(&self) -> Option<&Header> {
        // SAFETY: a Some handle always points into a live block.
        self.ptr.map(|data| unsafe { header::header_ptr(data).as_ref() })
    }

    #[inline(always)]
    fn raw_parts_mut(&mut self) -> Option<(NonNull<T>, &mut Header)> {
        // SAFETY: a Some handle always points into a live block, and &mut self
        // guarantees exclusive access to its header.
        self.ptr
            .map(|data| (data, unsafe { header::header_ptr(data).as_mut() }))
    }

    /// Returns the number of live elements. `0` for the sentinel.
    #[inline]
    pub fn len(&self) -> usize {
        self.header().map_or(0, |header| header.len)
    }

    /// Returns the number of elements the current allocation can hold. `0` for the sentinel.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.header().map_or(0, |header| header.capacity)
    }

    /// Returns `true` if the buffer holds no live elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the buffer owns a heap allocation (it is not the sentinel).
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.ptr.is_some()
    }

    /// Returns the raw handle: a pointer to element 0, or null for the sentinel.
    ///
    /// The pointer is invalidated by any operation that may reallocate.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.map_or(ptr::null(), |data| data.as_ptr().cast_const())
    }

    /// Returns the live elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            None => &[],
            // SAFETY: elements [0, len) are initialized and owned by self.
            Some(data) => unsafe { core::slice::from_raw_parts(data.as_ptr(), self.len()) },
        }
    }

    /// Returns the live elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self.raw_parts_mut() {
            None => &mut [],
            // SAFETY: elements [0, len) are initialized and &mut self is exclusive.
            Some((data, header)) => unsafe {
                core::slice::from_raw_parts_mut(data.as_ptr(), header.len)
            },
        }
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::OutOfRange`] if `index >= len()`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growbuf::{GrowableBuffer, GrowableBufferError};
    ///
    /// let mut buf = GrowableBuffer::new();
    /// buf.append(7u8).unwrap();
    ///
    /// assert_eq!(buf.element_at(0), Ok(&7));
    /// assert_eq!(
    ///     buf.element_at(1),
    ///     Err(GrowableBufferError::OutOfRange { index: 1, len: 1 })
    /// );
    /// ```
    pub fn element_at(&self, index: usize) -> Result<&T, GrowableBufferError> {
        let len = self.len();
        self.as_slice()
            .get(index)
            .ok_or(GrowableBufferError::OutOfRange { index, len })
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::OutOfRange`] if `index >= len()`.
    pub fn element_at_mut(&mut self, index: usize) -> Result<&mut T, GrowableBufferError> {
        let len = self.len();
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(GrowableBufferError::OutOfRange { index, len })
    }

    /// Grows the storage so that at least `required` elements fit, following
    /// the doubling policy, and returns the new handle.
    #[cold]
    #[inline(never)]
    fn grow_for(&mut self, required: usize) -> Result<NonNull<T>, GrowableBufferError> {
        let capacity = self.capacity();
        debug_assert!(required > capacity);

        let new_capacity = growth::grown_capacity(capacity, required)
            .ok_or(GrowableBufferError::AllocationFailure { capacity: required })?;

        let data = match self.ptr {
            None => header::allocate::<T>(new_capacity)?,
            // SAFETY (PRECONDITIONS ARE MET): the header holds `capacity` and every
            // live element sits below `len <= capacity < new_capacity`.
            Some(data) => unsafe { header::reallocate(data, capacity, new_capacity)? },
        };
        self.ptr = Some(data);

        Ok(data)
    }

    /// Appends `value` after the last live element.
    ///
    /// When the buffer is full the capacity doubles first (the sentinel grows to 1).
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::AllocationFailure`] if growing fails. The
    /// buffer is left unchanged and `value` is dropped.
    pub fn append(&mut self, value: T) -> Result<(), GrowableBufferError> {
        let len = self.len();
        let required = len
            .checked_add(1)
            .ok_or(GrowableBufferError::AllocationFailure { capacity: usize::MAX })?;

        let data = match self.ptr {
            Some(data) if required <= self.capacity() => data,
            _ => self.grow_for(required)?,
        };

        // SAFETY: data is the live handle of self and &mut self is exclusive.
        let header = unsafe { header::header_ptr(data).as_mut() };
        debug_assert!(header.len < header.capacity);

        // SAFETY: len < capacity, so slot `len` lies inside the block and is uninitialized.
        unsafe { data.as_ptr().add(header.len).write(value) };
        header.len += 1;

        Ok(())
    }

    /// Removes the last live element and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::EmptyBuffer`] if there is nothing to remove.
    pub fn remove_last(&mut self) -> Result<T, GrowableBufferError> {
        let (data, header) = self
            .raw_parts_mut()
            .ok_or(GrowableBufferError::EmptyBuffer)?;

        if header.len == 0 {
            return Err(GrowableBufferError::EmptyBuffer);
        }

        header.len -= 1;

        // SAFETY: the slot at the old last index was initialized; it is no longer
        // counted as live, so ownership moves to the caller.
        Ok(unsafe { data.as_ptr().add(header.len).read() })
    }

    /// Sets the capacity to exactly `new_capacity`.
    ///
    /// If `new_capacity < len()`, the length is clamped to `new_capacity` and the
    /// discarded tail is dropped. `grow(0)` releases the storage.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::AllocationFailure`] if the new storage cannot
    /// be allocated; the buffer is left unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growbuf::{GrowableBuffer, GrowableBufferError};
    ///
    /// fn example() -> Result<(), GrowableBufferError> {
    ///     let mut buf: GrowableBuffer<i64> = GrowableBuffer::new();
    ///     buf.grow(1000)?;
    ///
    ///     assert_eq!(buf.capacity(), 1000);
    ///     assert_eq!(buf.len(), 0);
    ///     Ok(())
    /// }
    /// # example().unwrap();
    /// ```
    pub fn grow(&mut self, new_capacity: usize) -> Result<(), GrowableBufferError> {
        self.set_capacity(new_capacity)
    }

    /// Sets the capacity to exactly `new_capacity`, discarding elements past it.
    ///
    /// Behaves exactly like [`grow()`](Self::grow); the name documents the intent
    /// to shrink.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::AllocationFailure`] if the new storage cannot
    /// be allocated; the buffer is left unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growbuf::{GrowableBuffer, GrowableBufferError};
    ///
    /// fn example() -> Result<(), GrowableBufferError> {
    ///     let mut buf = GrowableBuffer::new();
    ///     buf.extend_from_slice(&[1u8, 2, 3, 4])?;
    ///
    ///     buf.truncate(2)?;
    ///
    ///     assert_eq!(buf.as_slice(), &[1, 2]);
    ///     assert_eq!(buf.capacity(), 2);
    ///     Ok(())
    /// }
    /// # example().unwrap();
    /// ```
    pub fn truncate(&mut self, new_capacity: usize) -> Result<(), GrowableBufferError> {
        self.set_capacity(new_capacity)
    }

    fn set_capacity(&mut self, new_capacity: usize) -> Result<(), GrowableBufferError> {
        let Some(data) = self.ptr else {
            if new_capacity > 0 {
                self.ptr = Some(header::allocate::<T>(new_capacity)?);
            }

            return Ok(());
        };

        let (len, capacity) = (self.len(), self.capacity());

        if new_capacity == capacity {
            return Ok(());
        }

        if new_capacity == 0 {
            self.release();
            return Ok(());
        }

        if new_capacity >= len {
            // SAFETY (PRECONDITIONS ARE MET): the header holds `capacity` and every
            // live element sits below `len <= new_capacity`.
            let moved = unsafe { header::reallocate(data, capacity, new_capacity)? };
            self.ptr = Some(moved);

            return Ok(());
        }

        self.shrink_below_len(data, len, capacity, new_capacity)
    }

    /// Moves the first `new_capacity` elements into a fresh block, then drops the
    /// discarded tail and frees the old block.
    ///
    /// The fresh block is allocated before anything is touched, so a failed
    /// allocation leaves the buffer intact.
    fn shrink_below_len(
        &mut self,
        data: NonNull<T>,
        len: usize,
        capacity: usize,
        new_capacity: usize,
    ) -> Result<(), GrowableBufferError> {
        debug_assert!(0 < new_capacity && new_capacity < len && len <= capacity);

        let fresh = header::allocate::<T>(new_capacity)?;

        // SAFETY (PRECONDITIONS ARE MET): both blocks are live and distinct, the
        // first new_capacity elements of the old block are initialized and the
        // fresh block has room for exactly new_capacity elements.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), fresh.as_ptr(), new_capacity);
            header::header_ptr(fresh).as_mut().len = new_capacity;
        }
        self.ptr = Some(fresh);

        // SAFETY: the old block is detached from self and freed exactly once by the guard.
        let _old_block = unsafe { DeallocOnDrop::new(data, capacity) };

        // SAFETY: elements [new_capacity, len) of the old block are still live and
        // were not copied, so they are dropped exactly once here.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                data.as_ptr().add(new_capacity),
                len - new_capacity,
            ));
        }

        Ok(())
    }

    /// Drops every live element and sets the length to 0.
    ///
    /// Capacity and allocation are kept. On the sentinel this is a no-op and
    /// does not allocate.
    pub fn clear(&mut self) {
        let Some((data, header)) = self.raw_parts_mut() else {
            return;
        };

        let len = header.len;
        header.len = 0;

        // SAFETY: elements [0, len) were live and are no longer counted.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(data.as_ptr(), len)) }
    }

    /// Drops every live element, frees the storage and returns to the sentinel.
    ///
    /// Idempotent: calling it on the sentinel does nothing.
    pub fn release(&mut self) {
        let Some(data) = self.ptr.take() else {
            return;
        };

        // SAFETY: data was the live handle of self, now detached.
        let (len, capacity) = unsafe {
            let header = header::header_ptr(data).as_ref();
            (header.len, header.capacity)
        };

        // SAFETY: the block is detached and freed exactly once by the guard.
        let _block = unsafe { DeallocOnDrop::new(data, capacity) };

        // SAFETY: elements [0, len) are live and dropped exactly once.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(data.as_ptr(), len)) }
    }

    /// Clones every element of `values` onto the end of the buffer.
    ///
    /// Grows at most once, to the larger of the doubled capacity and the
    /// required length.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::AllocationFailure`] if growing fails; the
    /// buffer is left unchanged.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<(), GrowableBufferError>
    where
        T: Clone,
    {
        if values.is_empty() {
            return Ok(());
        }

        let required = self
            .len()
            .checked_add(values.len())
            .ok_or(GrowableBufferError::AllocationFailure { capacity: usize::MAX })?;

        let data = match self.ptr {
            Some(data) if required <= self.capacity() => data,
            _ => self.grow_for(required)?,
        };

        // SAFETY: data is the live handle of self and &mut self is exclusive.
        let header = unsafe { header::header_ptr(data).as_mut() };
        debug_assert!(header.capacity - header.len >= values.len());

        // len is bumped per element so a panicking clone leaves only initialized slots counted.
        for value in values {
            // SAFETY: capacity >= required, so slot `len` is inside the block and uninitialized.
            unsafe { data.as_ptr().add(header.len).write(value.clone()) };
            header.len += 1;
        }

        Ok(())
    }

    /// Copies the live elements into a new, independently owned buffer whose
    /// capacity equals `len()`.
    ///
    /// # Errors
    ///
    /// Returns [`GrowableBufferError::AllocationFailure`] if the copy cannot be allocated.
    pub fn try_clone(&self) -> Result<Self, GrowableBufferError>
    where
        T: Clone,
    {
        let mut copy = Self::with_capacity(self.len())?;
        copy.extend_from_slice(self.as_slice())?;

        Ok(copy)
    }

    /// Returns the raw mutable handle: a pointer to element 0, or null for the sentinel.
    ///
    /// Only available with the `unsafe` feature.
    #[cfg(any(test, feature = "unsafe"))]
    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Sets the length without touching the elements.
    ///
    /// Only available with the `unsafe` feature.
    ///
    /// # Safety
    ///
    /// `new_len` must not exceed `capacity()`, elements `[0, new_len)` must be
    /// initialized, and elements past `new_len` are forgotten without being dropped.
    #[cfg(any(test, feature = "unsafe"))]
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity());

        if let Some((_, header)) = self.raw_parts_mut() {
            header.len = new_len;
        }
    }
}

impl<T> Drop for GrowableBuffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for GrowableBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> DerefMut for GrowableBuffer<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for GrowableBuffer<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsMut<[T]> for GrowableBuffer<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T> IntoIterator for &'a GrowableBuffer<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut GrowableBuffer<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T: Clone> TryFrom<&[T]> for GrowableBuffer<T> {
    type Error = GrowableBufferError;

    fn try_from(values: &[T]) -> Result<Self, Self::Error> {
        let mut buf = Self::with_capacity(values.len())?;
        buf.extend_from_slice(values)?;

        Ok(buf)
    }
}

impl<T: PartialEq> PartialEq for GrowableBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for GrowableBuffer<T> {}

impl<T: core::fmt::Debug> core::fmt::Debug for GrowableBuffer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("data", &self.as_slice())
            .finish()
    }
}

//! Owned byte storage behind a tensor.

use std::alloc::{self, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::{Error, Result};

/// Alignment of direct allocations, wide enough for any SIMD load.
const DIRECT_ALIGNMENT: usize = 64;

/// Storage for a tensor's bytes.
#[derive(Debug)]
pub(crate) enum Buffer {
    /// Memory owned by a `Vec`.
    Heap(Vec<u8>),

    /// Aligned memory taken straight from the global allocator.
    Direct(DirectBuffer),
}

impl Buffer {
    pub fn heap_zeroed(len: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|e| Error::IllegalArgument(format!("invalid buffer size {len}: {e}")))?;
        bytes.resize(len, 0);
        Ok(Buffer::Heap(bytes))
    }

    pub fn heap_from(bytes: &[u8]) -> Self {
        Buffer::Heap(bytes.to_vec())
    }

    pub fn direct_zeroed(len: usize) -> Result<Self> {
        DirectBuffer::zeroed(len).map(Buffer::Direct)
    }

    pub fn direct_from(bytes: &[u8]) -> Result<Self> {
        let mut buffer = DirectBuffer::zeroed(bytes.len())?;
        buffer.copy_from_slice(bytes);
        Ok(Buffer::Direct(buffer))
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Buffer::Direct(_))
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Buffer::Heap(bytes) => bytes,
            Buffer::Direct(buffer) => buffer,
        }
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Buffer::Heap(bytes) => bytes,
            Buffer::Direct(buffer) => buffer,
        }
    }
}

/// A zero-initialised, non-empty allocation freed exactly once on drop.
#[derive(Debug)]
pub(crate) struct DirectBuffer {
    /// SAFETY: points to a live allocation of `layout` from the global
    /// allocator. `layout.size() > 0` and every byte is initialised.
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: the allocation is exclusively owned and has no interior mutability;
// shared access only hands out `&[u8]`.
unsafe impl Send for DirectBuffer {}
unsafe impl Sync for DirectBuffer {}

impl DirectBuffer {
    fn zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::IllegalArgument(
                "direct buffer size must be positive".to_string(),
            ));
        }
        let layout = Layout::from_size_align(len, DIRECT_ALIGNMENT)
            .map_err(|e| Error::IllegalArgument(format!("invalid buffer size {len}: {e}")))?;

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            alloc::handle_alloc_error(layout);
        };

        Ok(Self { ptr, layout })
    }
}

impl Deref for DirectBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: see type invariants
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for DirectBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: see type invariants
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for DirectBuffer {
    fn drop(&mut self) {
        // SAFETY: `ptr` was allocated with `layout` and is only freed here.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

mod host;

pub use host::*;

use std::{alloc::Layout, ptr::NonNull};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Out of memory, failed to allocate {size} bytes with alignment {align}")]
    OutOfMemory { size: usize, align: usize },
    #[error("Invalid allocation layout: {0}")]
    InvalidLayout(String),
}

/// One owned storage allocation. Dropping the handle returns the storage to
/// its backend, so a handle is released exactly once.
///
/// # Safety
///
/// [`crate::MemoryBuffer`] hands out views that read and write through
/// [`StorageHandle::as_ptr`] without further checks. Implementors must
/// guarantee that the pointer is valid for reads and writes of
/// [`StorageHandle::n_bytes`] bytes, that those bytes are initialised, that
/// nothing else accesses them while the handle is alive, and that the pointer
/// stays valid until the handle is dropped.
///
/// Implementing the trait requires `unsafe`:
///
/// ```compile_fail,E0200
/// use std::ptr::NonNull;
/// use stridewise::StorageHandle;
///
/// #[derive(Debug)]
/// struct Dangling;
///
/// impl StorageHandle for Dangling {
///     fn as_ptr(&self) -> NonNull<u8> {
///         NonNull::dangling()
///     }
///
///     fn n_bytes(&self) -> usize {
///         1 << 40
///     }
/// }
/// ```
pub unsafe trait StorageHandle: std::fmt::Debug {
    /// Base address of the allocation, aligned as requested.
    fn as_ptr(&self) -> NonNull<u8>;

    fn n_bytes(&self) -> usize;
}

/// Provider of raw, zero initialised storage.
pub trait StorageBackend {
    type Storage: StorageHandle;

    fn allocate(&self, layout: Layout) -> Result<Self::Storage, BackendError>;
}

impl<B: StorageBackend> StorageBackend for &B {
    type Storage = B::Storage;

    fn allocate(&self, layout: Layout) -> Result<Self::Storage, BackendError> {
        (**self).allocate(layout)
    }
}

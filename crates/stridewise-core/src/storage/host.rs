use std::{alloc::Layout, ptr::NonNull};

use crate::{BackendError, StorageBackend, StorageHandle};

/// Zeroed host allocation backed by the global allocator.
#[derive(Debug)]
pub struct HostStorage {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for HostStorage {}
unsafe impl Sync for HostStorage {}

impl HostStorage {
    pub fn zeroed(layout: Layout) -> Result<Self, BackendError> {
        if layout.size() == 0 {
            // Never dereferenced, never deallocated.
            let ptr = NonNull::new(layout.align() as *mut u8).ok_or_else(|| {
                BackendError::InvalidLayout(format!("zero alignment in {:?}", layout))
            })?;
            return Ok(Self { ptr, layout });
        }
        let raw = unsafe { std::alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(BackendError::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        })?;
        log::trace!("Allocated host storage: {:p} ({} bytes)", ptr, layout.size());
        Ok(Self { ptr, layout })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }
}

// SAFETY: `ptr` comes from `alloc_zeroed` with `layout` and is freed only on
// drop. Zero sized storage is never dereferenced.
unsafe impl StorageHandle for HostStorage {
    fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    fn n_bytes(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for HostStorage {
    fn drop(&mut self) {
        if self.layout.size() > 0 {
            log::trace!("Releasing host storage: {:p}", self.ptr);
            unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) }
        }
    }
}

/// Host memory backend. Every allocation is zero initialised, which is a valid
/// bit pattern for every [`crate::Element`].
#[derive(Clone, Copy, Debug, Default)]
pub struct HostBackend {
    /// Upper bound on a single allocation in bytes. `None` for unlimited.
    max_allocation: Option<usize>,
}

impl HostBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses any single allocation larger than `max_bytes`.
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            max_allocation: Some(max_bytes),
        }
    }
}

impl StorageBackend for HostBackend {
    type Storage = HostStorage;

    fn allocate(&self, layout: Layout) -> Result<HostStorage, BackendError> {
        if let Some(max) = self.max_allocation {
            if layout.size() > max {
                return Err(BackendError::OutOfMemory {
                    size: layout.size(),
                    align: layout.align(),
                });
            }
        }
        HostStorage::zeroed(layout)
    }
}

use std::{cell::Cell, marker::PhantomData};

use crate::{
    Dense1D, DenseX, DenseY, Element, HostStorage, Layout1D, Layout2D, LayoutError,
    StorageHandle, ViewLayout,
};

/// Owns one storage allocation and the layout of the root view over it.
///
/// Views borrow the buffer, so the borrow checker rejects [`MemoryBuffer::release`]
/// while any view derived from [`MemoryBuffer::root_view`] is still alive.
/// Dropping the buffer releases it.
pub struct MemoryBuffer<T: Element, L: ViewLayout, H: StorageHandle = HostStorage> {
    storage: Option<H>,
    layout: L,
    // Views hand out `Cell`s, so the buffer must not be shared across threads.
    _marker: PhantomData<Cell<T>>,
}

pub type Buffer1D<T, H = HostStorage> = MemoryBuffer<T, Layout1D<Dense1D>, H>;
pub type BufferDenseX<T, H = HostStorage> = MemoryBuffer<T, Layout2D<DenseX>, H>;
pub type BufferDenseY<T, H = HostStorage> = MemoryBuffer<T, Layout2D<DenseY>, H>;

impl<T: Element, L: ViewLayout, H: StorageHandle> MemoryBuffer<T, L, H> {
    /// Wraps `storage` with a root view described by `layout`. Fails if the
    /// layout addresses past the end of the storage or the storage is not
    /// aligned for `T`.
    pub fn new(storage: H, layout: L) -> Result<Self, LayoutError> {
        let required = layout
            .required_len()
            .and_then(|len| len.checked_mul(std::mem::size_of::<T>()))
            .ok_or_else(|| {
                LayoutError::InvalidArgument(format!("{:?} cannot back a root view", layout))
            })?;
        if required > storage.n_bytes() {
            return Err(LayoutError::InvalidArgument(format!(
                "{:?} needs {} bytes, storage has {}",
                layout,
                required,
                storage.n_bytes()
            )));
        }
        let addr = storage.as_ptr().as_ptr() as usize;
        if addr % std::mem::align_of::<T>() != 0 {
            return Err(LayoutError::InvalidArgument(format!(
                "storage at {:#x} is not aligned for {}",
                addr,
                std::any::type_name::<T>()
            )));
        }
        Ok(Self {
            storage: Some(storage),
            layout,
            _marker: PhantomData,
        })
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn root_view(&self) -> Result<L::View<'_, T>, LayoutError> {
        let storage = self.storage.as_ref().ok_or(LayoutError::Released)?;
        let data = storage.as_ptr().as_ptr() as *mut T;
        Ok(unsafe { self.layout.bind(data) })
    }

    pub fn n_bytes(&self) -> usize {
        self.storage.as_ref().map_or(0, StorageHandle::n_bytes)
    }

    pub fn is_released(&self) -> bool {
        self.storage.is_none()
    }

    /// Frees the storage. Calling this again is a no-op.
    pub fn release(&mut self) {
        if let Some(storage) = self.storage.take() {
            log::debug!(
                "Releasing buffer {:?} ({} bytes)",
                self.layout,
                storage.n_bytes()
            );
            drop(storage);
        }
    }
}

impl<T: Element, L: ViewLayout, H: StorageHandle> Drop for MemoryBuffer<T, L, H> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Element, L: ViewLayout, H: StorageHandle> std::fmt::Debug for MemoryBuffer<T, L, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBuffer")
            .field("storage", &self.storage)
            .field("layout", &self.layout)
            .finish()
    }
}

use std::{cell::Cell, marker::PhantomData};

use crate::{Axis, Dense1D, Dim1, Element, General1D, LayoutError, RawView1D, Stride1D};

/// Extent and stride tag of a 1D view. All bounds checking and address
/// arithmetic happens here, without touching memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_new::new)]
pub struct Layout1D<S: Stride1D> {
    extent: Dim1,
    tag: S,
}

impl<S: Stride1D> Layout1D<S> {
    pub fn extent(&self) -> Dim1 {
        self.extent
    }

    pub fn tag(&self) -> S {
        self.tag
    }

    #[inline]
    pub fn stride(&self) -> Dim1 {
        self.tag.stride()
    }

    /// Linear element offset of `index`, which must lie in `[0, extent)`.
    #[inline]
    pub fn offset_of(&self, index: Dim1) -> Result<isize, LayoutError> {
        if index.x < 0 || index.x >= self.extent.x {
            return Err(LayoutError::out_of_range(index, self.extent));
        }
        index
            .checked_dot(self.stride())
            .ok_or_else(|| LayoutError::out_of_range(index, self.extent))
    }

    /// Base offset and layout of the `extent` elements starting at `offset`.
    /// `offset + extent == self.extent` is the largest valid window.
    #[inline]
    pub fn sub_layout(&self, offset: Dim1, extent: Dim1) -> Result<(isize, Self), LayoutError> {
        let out_of_range =
            || LayoutError::out_of_range(format!("{}+{}", offset, extent), self.extent);
        if !window_fits(offset.x, extent.x, self.extent.x) {
            return Err(out_of_range());
        }
        let base = offset.checked_dot(self.stride()).ok_or_else(out_of_range)?;
        Ok((base, Self::new(extent, self.tag)))
    }

    pub fn retag<R: Stride1D>(&self, tag: R) -> Layout1D<R> {
        debug_assert_eq!(tag.stride(), self.stride());
        Layout1D::new(self.extent, tag)
    }

    /// Number of storage elements spanned from the base to the last
    /// addressable element. `None` for negative strides or on overflow.
    ///
    /// `extent * stride` must also fit in an `isize`, so the base offset of
    /// every window of a validated layout is representable.
    pub fn required_len(&self) -> Option<usize> {
        let extent = self.extent.numel()?;
        self.extent.checked_dot(self.stride())?;
        if extent == 0 {
            return Some(0);
        }
        let stride = usize::try_from(self.stride().x).ok()?;
        (extent - 1).checked_mul(stride)?.checked_add(1)
    }
}

#[inline]
pub(crate) fn window_fits(offset: isize, extent: isize, parent: isize) -> bool {
    offset >= 0
        && extent >= 0
        && offset
            .checked_add(extent)
            .map_or(false, |end| end <= parent)
}

/// Non-owning 1D view over storage owned by a [`crate::MemoryBuffer`].
///
/// Views are plain descriptors: copying one never touches the storage. Every
/// derived view borrows the same buffer for `'a`.
pub struct ArrayView1D<'a, T: Element, S: Stride1D> {
    data: *mut T,
    layout: Layout1D<S>,
    _marker: PhantomData<&'a [Cell<T>]>,
}

impl<'a, T: Element, S: Stride1D> Clone for ArrayView1D<'a, T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Element, S: Stride1D> Copy for ArrayView1D<'a, T, S> {}

impl<'a, T: Element, S: Stride1D> std::fmt::Debug for ArrayView1D<'a, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayView1D")
            .field("data", &self.data)
            .field("extent", &self.layout.extent)
            .field("tag", &self.layout.tag)
            .finish()
    }
}

impl<'a, T: Element, S: Stride1D> ArrayView1D<'a, T, S> {
    /// # Safety
    /// Every element addressable through `layout` from `data` must lie inside a
    /// live allocation that outlives `'a` and holds initialised `T`s.
    pub(crate) unsafe fn from_raw_parts(data: *mut T, layout: Layout1D<S>) -> Self {
        Self {
            data,
            layout,
            _marker: PhantomData,
        }
    }

    pub fn layout(&self) -> Layout1D<S> {
        self.layout
    }

    pub fn extent(&self) -> Dim1 {
        self.layout.extent
    }

    pub fn stride(&self) -> Dim1 {
        self.layout.stride()
    }

    pub fn tag(&self) -> S {
        self.layout.tag
    }

    pub fn len(&self) -> usize {
        self.layout.extent.x as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_ptr(&self) -> *const T {
        self.data
    }

    /// Drops the lifetime so the descriptor can be sent to another thread.
    pub fn as_raw(&self) -> RawView1D<T, S> {
        RawView1D::from_raw_parts(self.data, self.layout)
    }

    /// Re-tags the view as statically dense. Fails unless the actual stride is 1.
    pub fn as_dense(&self) -> Result<ArrayView1D<'a, T, Dense1D>, LayoutError> {
        let stride = self.stride().x;
        if stride != 1 {
            return Err(LayoutError::InvalidLayoutAssumption {
                axis: Axis::X,
                stride,
            });
        }
        log::trace!("Coerced 1D view to dense");
        Ok(unsafe { ArrayView1D::from_raw_parts(self.data, self.layout.retag(Dense1D)) })
    }

    pub fn as_general(&self) -> ArrayView1D<'a, T, General1D> {
        let tag = General1D::new(self.stride());
        unsafe { ArrayView1D::from_raw_parts(self.data, self.layout.retag(tag)) }
    }

    /// View of `extent` elements starting at `offset`, with the same stride tag.
    pub fn sub_view(&self, offset: Dim1, extent: Dim1) -> Result<Self, LayoutError> {
        let (base, layout) = self.layout.sub_layout(offset, extent)?;
        Ok(unsafe { Self::from_raw_parts(self.data.wrapping_offset(base), layout) })
    }

    /// Mutable reference to the element at `index`.
    #[inline]
    pub fn index(&self, index: Dim1) -> Result<&'a Cell<T>, LayoutError> {
        let offset = self.layout.offset_of(index)?;
        Ok(unsafe { self.cell_at(offset) })
    }

    /// # Safety
    /// `index` must lie in `[0, extent)`.
    #[inline]
    pub unsafe fn index_unchecked(&self, index: Dim1) -> &'a Cell<T> {
        self.cell_at(index.dot(self.stride()))
    }

    #[inline]
    unsafe fn cell_at(&self, offset: isize) -> &'a Cell<T> {
        &*(self.data.wrapping_offset(offset) as *const Cell<T>)
    }

    pub fn get(&self, index: Dim1) -> Result<T, LayoutError> {
        self.index(index).map(Cell::get)
    }

    pub fn set(&self, index: Dim1, value: T) -> Result<(), LayoutError> {
        self.index(index).map(|cell| cell.set(value))
    }

    /// Values in logical order.
    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let view = *self;
        (0..self.layout.extent.x).map(move |i| unsafe { view.index_unchecked(Dim1::new(i)) }.get())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn fill(&self, value: T) {
        for i in 0..self.layout.extent.x {
            unsafe { self.index_unchecked(Dim1::new(i)) }.set(value);
        }
    }

    pub fn copy_from_slice(&self, src: &[T]) -> Result<(), LayoutError> {
        if src.len() != self.len() {
            return Err(LayoutError::InvalidArgument(format!(
                "source has {} elements, view has {}",
                src.len(),
                self.len()
            )));
        }
        for (i, value) in src.iter().enumerate() {
            unsafe { self.index_unchecked(Dim1::new(i as isize)) }.set(*value);
        }
        Ok(())
    }
}

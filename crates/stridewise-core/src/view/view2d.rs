use std::{cell::Cell, marker::PhantomData};

use crate::{
    view::view1d::window_fits, ArrayView1D, Axis, DenseX, DenseY, Dim1, Dim2, Element, General2D,
    Layout1D, LayoutError, RawView2D, Stride2D,
};

/// Extent and stride tag of a 2D view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_new::new)]
pub struct Layout2D<S: Stride2D> {
    extent: Dim2,
    tag: S,
}

impl<S: Stride2D> Layout2D<S> {
    pub fn extent(&self) -> Dim2 {
        self.extent
    }

    pub fn tag(&self) -> S {
        self.tag
    }

    #[inline]
    pub fn stride(&self) -> Dim2 {
        self.tag.stride()
    }

    /// Linear element offset of `index`. Both axes are checked against `[0, extent)`.
    #[inline]
    pub fn offset_of(&self, index: Dim2) -> Result<isize, LayoutError> {
        if index.x < 0 || index.x >= self.extent.x || index.y < 0 || index.y >= self.extent.y {
            return Err(LayoutError::out_of_range(index, self.extent));
        }
        index
            .checked_dot(self.stride())
            .ok_or_else(|| LayoutError::out_of_range(index, self.extent))
    }

    #[inline]
    pub fn sub_layout(&self, offset: Dim2, extent: Dim2) -> Result<(isize, Self), LayoutError> {
        let out_of_range =
            || LayoutError::out_of_range(format!("{}+{}", offset, extent), self.extent);
        if !window_fits(offset.x, extent.x, self.extent.x)
            || !window_fits(offset.y, extent.y, self.extent.y)
        {
            return Err(out_of_range());
        }
        let base = offset.checked_dot(self.stride()).ok_or_else(out_of_range)?;
        Ok((base, Self::new(extent, self.tag)))
    }

    /// Base offset and layout of the row at `y`, running along X.
    #[inline]
    pub fn row_layout(&self, y: isize) -> Result<(isize, Layout1D<S::AlongX>), LayoutError> {
        if y < 0 || y >= self.extent.y {
            return Err(LayoutError::out_of_range(format!("y={}", y), self.extent));
        }
        let base = y
            .checked_mul(self.stride().y)
            .ok_or_else(|| LayoutError::out_of_range(format!("y={}", y), self.extent))?;
        let layout = Layout1D::new(Dim1::new(self.extent.x), self.tag.along_x());
        Ok((base, layout))
    }

    /// Base offset and layout of the column at `x`, running along Y.
    #[inline]
    pub fn column_layout(&self, x: isize) -> Result<(isize, Layout1D<S::AlongY>), LayoutError> {
        if x < 0 || x >= self.extent.x {
            return Err(LayoutError::out_of_range(format!("x={}", x), self.extent));
        }
        let base = x
            .checked_mul(self.stride().x)
            .ok_or_else(|| LayoutError::out_of_range(format!("x={}", x), self.extent))?;
        let layout = Layout1D::new(Dim1::new(self.extent.y), self.tag.along_y());
        Ok((base, layout))
    }

    pub fn retag<R: Stride2D>(&self, tag: R) -> Layout2D<R> {
        debug_assert_eq!(tag.stride(), self.stride());
        Layout2D::new(self.extent, tag)
    }

    /// Number of storage elements spanned from the base to the last
    /// addressable element. `None` for negative strides or on overflow.
    /// Like [`Layout1D::required_len`], also `None` unless `extent . stride`
    /// fits in an `isize`.
    pub fn required_len(&self) -> Option<usize> {
        let x = self.extent.numel()?;
        self.extent.checked_dot(self.stride())?;
        if x == 0 {
            return Some(0);
        }
        let stride = self.stride();
        let sx = usize::try_from(stride.x).ok()?;
        let sy = usize::try_from(stride.y).ok()?;
        let last_x = (self.extent.x as usize - 1).checked_mul(sx)?;
        let last_y = (self.extent.y as usize - 1).checked_mul(sy)?;
        last_x.checked_add(last_y)?.checked_add(1)
    }
}

/// Non-owning 2D view over storage owned by a [`crate::MemoryBuffer`].
pub struct ArrayView2D<'a, T: Element, S: Stride2D> {
    data: *mut T,
    layout: Layout2D<S>,
    _marker: PhantomData<&'a [Cell<T>]>,
}

impl<'a, T: Element, S: Stride2D> Clone for ArrayView2D<'a, T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Element, S: Stride2D> Copy for ArrayView2D<'a, T, S> {}

impl<'a, T: Element, S: Stride2D> std::fmt::Debug for ArrayView2D<'a, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayView2D")
            .field("data", &self.data)
            .field("extent", &self.layout.extent)
            .field("tag", &self.layout.tag)
            .finish()
    }
}

impl<'a, T: Element, S: Stride2D> ArrayView2D<'a, T, S> {
    /// # Safety
    /// Every element addressable through `layout` from `data` must lie inside a
    /// live allocation that outlives `'a` and holds initialised `T`s.
    pub(crate) unsafe fn from_raw_parts(data: *mut T, layout: Layout2D<S>) -> Self {
        Self {
            data,
            layout,
            _marker: PhantomData,
        }
    }

    pub fn layout(&self) -> Layout2D<S> {
        self.layout
    }

    pub fn extent(&self) -> Dim2 {
        self.layout.extent
    }

    pub fn stride(&self) -> Dim2 {
        self.layout.stride()
    }

    pub fn tag(&self) -> S {
        self.layout.tag
    }

    pub fn as_ptr(&self) -> *const T {
        self.data
    }

    pub fn as_raw(&self) -> RawView2D<T, S> {
        RawView2D::from_raw_parts(self.data, self.layout)
    }

    pub fn as_dense_x(&self) -> Result<ArrayView2D<'a, T, DenseX>, LayoutError> {
        let stride = self.stride();
        if stride.x != 1 {
            return Err(LayoutError::InvalidLayoutAssumption {
                axis: Axis::X,
                stride: stride.x,
            });
        }
        log::trace!("Coerced 2D view to dense X, y stride {}", stride.y);
        let layout = self.layout.retag(DenseX::new(stride.y));
        Ok(unsafe { ArrayView2D::from_raw_parts(self.data, layout) })
    }

    pub fn as_dense_y(&self) -> Result<ArrayView2D<'a, T, DenseY>, LayoutError> {
        let stride = self.stride();
        if stride.y != 1 {
            return Err(LayoutError::InvalidLayoutAssumption {
                axis: Axis::Y,
                stride: stride.y,
            });
        }
        log::trace!("Coerced 2D view to dense Y, x stride {}", stride.x);
        let layout = self.layout.retag(DenseY::new(stride.x));
        Ok(unsafe { ArrayView2D::from_raw_parts(self.data, layout) })
    }

    /// Forgets any static density. Never fails.
    pub fn as_general(&self) -> ArrayView2D<'a, T, General2D> {
        let layout = self.layout.retag(General2D::new(self.stride()));
        unsafe { ArrayView2D::from_raw_parts(self.data, layout) }
    }

    /// Tile of `extent` starting at `offset`, with the same stride tag.
    pub fn sub_view(&self, offset: Dim2, extent: Dim2) -> Result<Self, LayoutError> {
        let (base, layout) = self.layout.sub_layout(offset, extent)?;
        Ok(unsafe { Self::from_raw_parts(self.data.wrapping_offset(base), layout) })
    }

    /// Fixes Y at `y` and returns the row running along X.
    ///
    /// The row is statically dense whenever `S` is dense along X: a `DenseX`
    /// view yields an `ArrayView1D<_, Dense1D>`, anything else a `General1D`
    /// view carrying the X stride.
    pub fn slice_along_y(&self, y: isize) -> Result<ArrayView1D<'a, T, S::AlongX>, LayoutError> {
        let (base, layout) = self.layout.row_layout(y)?;
        Ok(unsafe { ArrayView1D::from_raw_parts(self.data.wrapping_offset(base), layout) })
    }

    /// Fixes X at `x` and returns the column running along Y.
    ///
    /// Statically dense whenever `S` is dense along Y.
    pub fn slice_along_x(&self, x: isize) -> Result<ArrayView1D<'a, T, S::AlongY>, LayoutError> {
        let (base, layout) = self.layout.column_layout(x)?;
        Ok(unsafe { ArrayView1D::from_raw_parts(self.data.wrapping_offset(base), layout) })
    }

    /// Mutable reference to the element at `index`.
    #[inline]
    pub fn index(&self, index: Dim2) -> Result<&'a Cell<T>, LayoutError> {
        let offset = self.layout.offset_of(index)?;
        Ok(unsafe { self.cell_at(offset) })
    }

    /// # Safety
    /// Both components of `index` must lie in `[0, extent)`.
    #[inline]
    pub unsafe fn index_unchecked(&self, index: Dim2) -> &'a Cell<T> {
        self.cell_at(index.dot(self.stride()))
    }

    #[inline]
    unsafe fn cell_at(&self, offset: isize) -> &'a Cell<T> {
        &*(self.data.wrapping_offset(offset) as *const Cell<T>)
    }

    pub fn get(&self, index: Dim2) -> Result<T, LayoutError> {
        self.index(index).map(Cell::get)
    }

    pub fn set(&self, index: Dim2, value: T) -> Result<(), LayoutError> {
        self.index(index).map(|cell| cell.set(value))
    }

    pub fn fill(&self, value: T) {
        let extent = self.extent();
        for y in 0..extent.y {
            for x in 0..extent.x {
                unsafe { self.index_unchecked(Dim2::new(x, y)) }.set(value);
            }
        }
    }

    /// Values in logical row-major order (X fastest).
    pub fn to_vec(&self) -> Vec<T> {
        let extent = self.extent();
        let mut out = Vec::with_capacity(extent.numel().unwrap_or(0));
        for y in 0..extent.y {
            for x in 0..extent.x {
                out.push(unsafe { self.index_unchecked(Dim2::new(x, y)) }.get());
            }
        }
        out
    }
}

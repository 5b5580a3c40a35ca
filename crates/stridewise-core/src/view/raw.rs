use crate::{
    ArrayView1D, ArrayView2D, Dim1, Dim2, Element, Layout1D, Layout2D, LayoutError, Stride1D,
    Stride2D,
};

/// Lifetime-free form of an [`ArrayView1D`] that may cross threads.
///
/// Building and slicing a raw view is safe; every element access is `unsafe`
/// because nothing ties the descriptor to the buffer it came from.
#[derive(Clone, Copy, Debug)]
pub struct RawView1D<T: Element, S: Stride1D> {
    data: *mut T,
    layout: Layout1D<S>,
}

/// Lifetime-free form of an [`ArrayView2D`] that may cross threads.
#[derive(Clone, Copy, Debug)]
pub struct RawView2D<T: Element, S: Stride2D> {
    data: *mut T,
    layout: Layout2D<S>,
}

// SAFETY: the descriptor itself is plain data. Accessors are unsafe and leave
// liveness and data races to the caller.
unsafe impl<T: Element, S: Stride1D> Send for RawView1D<T, S> {}
unsafe impl<T: Element, S: Stride1D> Sync for RawView1D<T, S> {}
unsafe impl<T: Element, S: Stride2D> Send for RawView2D<T, S> {}
unsafe impl<T: Element, S: Stride2D> Sync for RawView2D<T, S> {}

impl<T: Element, S: Stride1D> RawView1D<T, S> {
    pub(crate) fn from_raw_parts(data: *mut T, layout: Layout1D<S>) -> Self {
        Self { data, layout }
    }

    pub fn layout(&self) -> Layout1D<S> {
        self.layout
    }

    pub fn extent(&self) -> Dim1 {
        self.layout.extent()
    }

    pub fn stride(&self) -> Dim1 {
        self.layout.stride()
    }

    pub fn sub_view(&self, offset: Dim1, extent: Dim1) -> Result<Self, LayoutError> {
        let (base, layout) = self.layout.sub_layout(offset, extent)?;
        Ok(Self::from_raw_parts(self.data.wrapping_offset(base), layout))
    }

    /// # Safety
    /// The buffer this descriptor was taken from must still be live, and no
    /// other thread may be writing the element concurrently.
    pub unsafe fn read(&self, index: Dim1) -> Result<T, LayoutError> {
        let offset = self.layout.offset_of(index)?;
        Ok(self.data.wrapping_offset(offset).read())
    }

    /// # Safety
    /// As [`RawView1D::read`], and no other thread may access the element
    /// concurrently.
    pub unsafe fn write(&self, index: Dim1, value: T) -> Result<(), LayoutError> {
        let offset = self.layout.offset_of(index)?;
        self.data.wrapping_offset(offset).write(value);
        Ok(())
    }

    /// # Safety
    /// As [`RawView1D::read`], and `index` must lie in `[0, extent)`.
    #[inline]
    pub unsafe fn read_unchecked(&self, index: Dim1) -> T {
        self.data.wrapping_offset(index.dot(self.stride())).read()
    }

    /// # Safety
    /// As [`RawView1D::write`], and `index` must lie in `[0, extent)`.
    #[inline]
    pub unsafe fn write_unchecked(&self, index: Dim1, value: T) {
        self.data.wrapping_offset(index.dot(self.stride())).write(value)
    }

    /// Re-attaches a lifetime.
    ///
    /// # Safety
    /// The buffer must stay live for `'a`, and the returned view must not be
    /// used concurrently with other threads touching the same elements.
    pub unsafe fn as_view<'a>(&self) -> ArrayView1D<'a, T, S> {
        ArrayView1D::from_raw_parts(self.data, self.layout)
    }
}

impl<T: Element, S: Stride2D> RawView2D<T, S> {
    pub(crate) fn from_raw_parts(data: *mut T, layout: Layout2D<S>) -> Self {
        Self { data, layout }
    }

    pub fn layout(&self) -> Layout2D<S> {
        self.layout
    }

    pub fn extent(&self) -> Dim2 {
        self.layout.extent()
    }

    pub fn stride(&self) -> Dim2 {
        self.layout.stride()
    }

    pub fn sub_view(&self, offset: Dim2, extent: Dim2) -> Result<Self, LayoutError> {
        let (base, layout) = self.layout.sub_layout(offset, extent)?;
        Ok(Self::from_raw_parts(self.data.wrapping_offset(base), layout))
    }

    /// Row at `y`, tagged as [`ArrayView2D::slice_along_y`] would tag it.
    pub fn slice_along_y(&self, y: isize) -> Result<RawView1D<T, S::AlongX>, LayoutError> {
        let (base, layout) = self.layout.row_layout(y)?;
        Ok(RawView1D::from_raw_parts(self.data.wrapping_offset(base), layout))
    }

    /// Column at `x`, tagged as [`ArrayView2D::slice_along_x`] would tag it.
    pub fn slice_along_x(&self, x: isize) -> Result<RawView1D<T, S::AlongY>, LayoutError> {
        let (base, layout) = self.layout.column_layout(x)?;
        Ok(RawView1D::from_raw_parts(self.data.wrapping_offset(base), layout))
    }

    /// # Safety
    /// See [`RawView1D::read`].
    pub unsafe fn read(&self, index: Dim2) -> Result<T, LayoutError> {
        let offset = self.layout.offset_of(index)?;
        Ok(self.data.wrapping_offset(offset).read())
    }

    /// # Safety
    /// See [`RawView1D::write`].
    pub unsafe fn write(&self, index: Dim2, value: T) -> Result<(), LayoutError> {
        let offset = self.layout.offset_of(index)?;
        self.data.wrapping_offset(offset).write(value);
        Ok(())
    }

    /// # Safety
    /// See [`RawView1D::read_unchecked`].
    #[inline]
    pub unsafe fn read_unchecked(&self, index: Dim2) -> T {
        self.data.wrapping_offset(index.dot(self.stride())).read()
    }

    /// # Safety
    /// See [`RawView1D::write_unchecked`].
    #[inline]
    pub unsafe fn write_unchecked(&self, index: Dim2, value: T) {
        self.data.wrapping_offset(index.dot(self.stride())).write(value)
    }

    /// # Safety
    /// See [`RawView1D::as_view`].
    pub unsafe fn as_view<'a>(&self) -> ArrayView2D<'a, T, S> {
        ArrayView2D::from_raw_parts(self.data, self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dim, Allocator, Dense1D, DenseX, DenseY, General1D, HostBackend};

    fn assert_send_sync<V: Send + Sync>(_: &V) {}

    #[test]
    fn test_rows_written_from_threads() {
        let buffer = HostBackend::new().allocate_2d_dense_x::<u32>(dim![16, 8]).unwrap();
        let raw: RawView2D<u32, DenseX> = buffer.root_view().unwrap().as_raw();
        assert_send_sync(&raw);

        std::thread::scope(|scope| {
            for y in 0..8 {
                scope.spawn(move || {
                    let row: RawView1D<u32, Dense1D> = raw.slice_along_y(y).unwrap();
                    for x in 0..16 {
                        unsafe { row.write(dim![x], (y * 100 + x) as u32) }.unwrap();
                    }
                });
            }
        });

        let root = buffer.root_view().unwrap();
        assert_eq!(root.get(dim![5, 3]).unwrap(), 305);
        assert_eq!(root.get(dim![15, 7]).unwrap(), 715);
        assert_eq!(root.slice_along_y(0).unwrap().to_vec(), (0..16).collect::<Vec<u32>>());
    }

    #[test]
    fn test_columns_of_dense_y_from_threads() {
        let buffer = HostBackend::new().allocate_2d_dense_y::<i64>(dim![4, 6]).unwrap();
        let raw = buffer.root_view().unwrap().as_raw();
        std::thread::scope(|scope| {
            for x in 0..4 {
                scope.spawn(move || {
                    let column: RawView1D<i64, Dense1D> = raw.slice_along_x(x).unwrap();
                    for y in 0..6 {
                        unsafe { column.write_unchecked(dim![y], -(x as i64) * 10 - y as i64) };
                    }
                });
            }
        });
        let root = buffer.root_view().unwrap();
        assert_eq!(root.get(dim![3, 5]).unwrap(), -35);
        assert_eq!(root.slice_along_y(1).unwrap().to_vec(), vec![-1, -11, -21, -31]);
    }

    #[test]
    fn test_raw_access_is_bounds_checked() {
        let buffer = HostBackend::new().allocate_2d::<f32>(dim![3, 2]).unwrap();
        let raw = buffer.root_view().unwrap().as_raw();
        unsafe {
            raw.write(dim![2, 1], 1.5).unwrap();
            assert_eq!(raw.read(dim![2, 1]).unwrap(), 1.5);
            assert_eq!(raw.read_unchecked(dim![2, 1]), 1.5);
            assert!(matches!(
                raw.read(dim![3, 0]),
                Err(LayoutError::OutOfRange { .. })
            ));
            assert!(matches!(
                raw.write(dim![0, -1], 0.0),
                Err(LayoutError::OutOfRange { .. })
            ));
        }
        let column: RawView1D<f32, General1D> = raw.slice_along_x(2).unwrap();
        assert_eq!(column.stride(), dim![3]);
        assert!(raw.slice_along_x(3).is_err());
        assert!(raw.sub_view(dim![2, 0], dim![2, 2]).is_err());
    }

    #[test]
    fn test_as_view_round_trip() {
        let buffer = HostBackend::new().allocate_1d::<u16>(dim![10]).unwrap();
        let root = buffer.root_view().unwrap();
        let tail = root.as_raw().sub_view(dim![6], dim![4]).unwrap();
        assert_eq!(tail.extent(), dim![4]);
        let view = unsafe { tail.as_view() };
        view.fill(3);
        assert_eq!(root.to_vec(), vec![0, 0, 0, 0, 0, 0, 3, 3, 3, 3]);

        let tile = HostBackend::new().allocate_2d_dense_y::<u16>(dim![4, 4]).unwrap();
        let raw: RawView2D<u16, DenseY> = tile
            .root_view()
            .unwrap()
            .as_raw()
            .sub_view(dim![1, 1], dim![2, 2])
            .unwrap();
        unsafe { raw.as_view() }.set(dim![1, 1], 8).unwrap();
        assert_eq!(tile.root_view().unwrap().get(dim![2, 2]).unwrap(), 8);
    }
}

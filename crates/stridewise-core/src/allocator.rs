use std::alloc::Layout;

use crate::{
    Align, Buffer1D, BufferDenseX, BufferDenseY, Dense1D, DenseX, DenseY, Dim1, Dim2, Element,
    Layout1D, Layout2D, LayoutError, MemoryBuffer, StorageBackend,
};

/// Row pitch, in elements, of a dense-X allocation whose rows of `extent_x`
/// elements are padded to a multiple of `alignment` bytes.
///
/// The element size must be non-zero, no larger than `alignment`, and divide it
/// evenly, otherwise padded rows could not hold a whole number of elements.
pub fn row_pitch<T: Element>(extent_x: isize, alignment: usize) -> Result<isize, LayoutError> {
    let elem_size = std::mem::size_of::<T>();
    if alignment == 0 || !alignment.is_power_of_two() {
        return Err(LayoutError::InvalidArgument(format!(
            "pitch alignment must be a power of two, got {}",
            alignment
        )));
    }
    if elem_size == 0 || elem_size > alignment || alignment % elem_size != 0 {
        return Err(LayoutError::InvalidArgument(format!(
            "element size {} is incompatible with a {} byte pitch alignment",
            elem_size, alignment
        )));
    }
    let row_bytes = Dim1::new(extent_x)
        .numel()
        .and_then(|x| x.checked_mul(elem_size))
        .and_then(|bytes| bytes.align_to(alignment))
        .ok_or_else(|| LayoutError::InvalidArgument(format!("invalid row extent {}", extent_x)))?;
    isize::try_from(row_bytes / elem_size)
        .map_err(|_| LayoutError::InvalidArgument(format!("row pitch overflow for {}", extent_x)))
}

fn checked_numel<D: std::fmt::Debug>(extent: D, numel: Option<usize>) -> Result<usize, LayoutError> {
    numel.ok_or_else(|| LayoutError::InvalidArgument(format!("invalid extent {:?}", extent)))
}

fn array_layout<T: Element>(count: usize, align: usize) -> Result<Layout, LayoutError> {
    count
        .checked_mul(std::mem::size_of::<T>())
        .and_then(|size| Layout::from_size_align(size, align.max(std::mem::align_of::<T>())).ok())
        .ok_or_else(|| {
            LayoutError::InvalidArgument(format!(
                "{} elements of {} exceed the addressable size",
                count,
                std::any::type_name::<T>()
            ))
        })
}

/// Construction of [`MemoryBuffer`]s with specific layouts on top of a
/// [`StorageBackend`]. Implemented for every backend.
///
/// Arguments are validated before the backend is asked for any storage.
pub trait Allocator: StorageBackend + Sized {
    fn allocate_1d<T: Element>(&self, extent: Dim1) -> Result<Buffer1D<T, Self::Storage>, LayoutError> {
        let count = checked_numel(extent, extent.numel())?;
        let layout = array_layout::<T>(count, 1)?;
        log::debug!("Allocating dense 1D buffer {:?} ({} bytes)", extent, layout.size());
        let storage = self.allocate(layout)?;
        MemoryBuffer::new(storage, Layout1D::new(extent, Dense1D))
    }

    /// Dense along X.
    fn allocate_2d<T: Element>(&self, extent: Dim2) -> Result<BufferDenseX<T, Self::Storage>, LayoutError> {
        self.allocate_2d_dense_x(extent)
    }

    /// Row-major, Y stride equal to the X extent.
    fn allocate_2d_dense_x<T: Element>(
        &self,
        extent: Dim2,
    ) -> Result<BufferDenseX<T, Self::Storage>, LayoutError> {
        let count = checked_numel(extent, extent.numel())?;
        let layout = array_layout::<T>(count, 1)?;
        log::debug!("Allocating dense X buffer {:?} ({} bytes)", extent, layout.size());
        let storage = self.allocate(layout)?;
        MemoryBuffer::new(storage, Layout2D::new(extent, DenseX::new(extent.x)))
    }

    /// Column-major, X stride equal to the Y extent.
    fn allocate_2d_dense_y<T: Element>(
        &self,
        extent: Dim2,
    ) -> Result<BufferDenseY<T, Self::Storage>, LayoutError> {
        let count = checked_numel(extent, extent.numel())?;
        let layout = array_layout::<T>(count, 1)?;
        log::debug!("Allocating dense Y buffer {:?} ({} bytes)", extent, layout.size());
        let storage = self.allocate(layout)?;
        MemoryBuffer::new(storage, Layout2D::new(extent, DenseY::new(extent.y)))
    }

    /// Dense along X with every row padded to [`Align::PITCH_ALIGNMENT`] bytes.
    fn allocate_pitched_2d_x<T: Element>(
        &self,
        extent: Dim2,
    ) -> Result<BufferDenseX<T, Self::Storage>, LayoutError> {
        self.allocate_pitched_2d_x_aligned(extent, usize::PITCH_ALIGNMENT)
    }

    /// Dense along X with every row padded to `alignment` bytes. The storage
    /// itself is aligned to `alignment` so every row starts on a boundary.
    ///
    /// The logical extent is unchanged: the padding is unreachable through the
    /// root view.
    fn allocate_pitched_2d_x_aligned<T: Element>(
        &self,
        extent: Dim2,
        alignment: usize,
    ) -> Result<BufferDenseX<T, Self::Storage>, LayoutError> {
        checked_numel(extent, extent.numel())?;
        let pitch = row_pitch::<T>(extent.x, alignment)?;
        let padded = Dim2::new(pitch, extent.y);
        let count = checked_numel(padded, padded.numel())?;
        let layout = array_layout::<T>(count, alignment)?;
        log::debug!(
            "Allocating pitched buffer {:?}, pitch {} elements ({} bytes)",
            extent,
            pitch,
            layout.size()
        );
        let storage = self.allocate(layout)?;
        MemoryBuffer::new(storage, Layout2D::new(extent, DenseX::new(pitch)))
    }
}

impl<B: StorageBackend> Allocator for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dim, BackendError, HostBackend, HostStorage, StorageHandle};
    use half::f16;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use test_strategy::{proptest, Arbitrary};

    /// Host backend that counts allocations and releases.
    #[derive(Debug, Default)]
    struct CountingBackend {
        inner: HostBackend,
        allocations: Cell<usize>,
        releases: Rc<Cell<usize>>,
    }

    #[derive(Debug)]
    struct CountedStorage {
        inner: HostStorage,
        releases: Rc<Cell<usize>>,
    }

    // SAFETY: forwards to the wrapped host storage, which it owns.
    unsafe impl StorageHandle for CountedStorage {
        fn as_ptr(&self) -> std::ptr::NonNull<u8> {
            self.inner.as_ptr()
        }

        fn n_bytes(&self) -> usize {
            self.inner.n_bytes()
        }
    }

    impl Drop for CountedStorage {
        fn drop(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    impl StorageBackend for CountingBackend {
        type Storage = CountedStorage;

        fn allocate(&self, layout: Layout) -> Result<CountedStorage, BackendError> {
            self.allocations.set(self.allocations.get() + 1);
            Ok(CountedStorage {
                inner: self.inner.allocate(layout)?,
                releases: self.releases.clone(),
            })
        }
    }

    #[test]
    fn test_row_pitch() {
        assert_eq!(row_pitch::<f32>(10, 128).unwrap(), 32);
        assert_eq!(row_pitch::<f32>(32, 128).unwrap(), 32);
        assert_eq!(row_pitch::<f32>(33, 128).unwrap(), 64);
        assert_eq!(row_pitch::<u8>(1, 128).unwrap(), 128);
        assert_eq!(row_pitch::<f16>(0, 128).unwrap(), 0);
        assert_eq!(row_pitch::<[u8; 128]>(3, 128).unwrap(), 3);
        assert!(row_pitch::<[u8; 3]>(10, 128).is_err());
        assert!(row_pitch::<[u8; 127]>(10, 128).is_err());
        assert!(row_pitch::<[u8; 256]>(10, 128).is_err());
        assert!(row_pitch::<f32>(10, 96).is_err());
        assert!(row_pitch::<f32>(10, 0).is_err());
        assert!(row_pitch::<f32>(-1, 128).is_err());
    }

    #[test]
    fn test_dense_layouts() {
        let backend = HostBackend::new();
        let x = backend.allocate_2d_dense_x::<f32>(dim![10, 20]).unwrap();
        assert_eq!(x.layout().tag(), DenseX::new(10));
        assert_eq!(x.n_bytes(), 800);
        let y = backend.allocate_2d_dense_y::<f32>(dim![10, 20]).unwrap();
        assert_eq!(y.layout().tag(), DenseY::new(20));
        let default = backend.allocate_2d::<f32>(dim![10, 20]).unwrap();
        assert_eq!(default.layout(), x.layout());
    }

    #[test]
    fn test_dense_x_y_address_every_element_once() {
        let backend = HostBackend::new();
        let buffer = backend.allocate_2d_dense_y::<u32>(dim![7, 5]).unwrap();
        let root = buffer.root_view().unwrap();
        let mut seen = HashSet::new();
        for y in 0..5 {
            for x in 0..7 {
                let offset = root.layout().offset_of(dim![x, y]).unwrap();
                assert!((0..35).contains(&offset));
                assert!(seen.insert(offset));
            }
        }
    }

    #[test]
    fn test_empty_allocations() {
        let backend = HostBackend::new();
        let buffer = backend.allocate_1d::<f32>(dim![0]).unwrap();
        assert!(buffer.root_view().unwrap().is_empty());
        let buffer = backend.allocate_2d::<f32>(dim![0, 4]).unwrap();
        assert!(buffer.root_view().unwrap().index(dim![0, 0]).is_err());
        let buffer = backend.allocate_pitched_2d_x::<f32>(dim![0, 4]).unwrap();
        assert_eq!(buffer.layout().stride(), dim![1, 0]);
    }

    #[test]
    fn test_invalid_extents_rejected_before_backend() {
        let backend = CountingBackend::default();
        assert!(matches!(
            backend.allocate_1d::<f32>(dim![-1]),
            Err(LayoutError::InvalidArgument(_))
        ));
        assert!(matches!(
            backend.allocate_2d::<f32>(dim![4, -2]),
            Err(LayoutError::InvalidArgument(_))
        ));
        assert!(matches!(
            backend.allocate_2d_dense_y::<f32>(dim![isize::MAX, 4]),
            Err(LayoutError::InvalidArgument(_))
        ));
        assert_eq!(backend.allocations.get(), 0);
    }

    #[test]
    fn test_pitched_rejects_element_size_before_backend() {
        let backend = CountingBackend::default();
        assert!(matches!(
            backend.allocate_pitched_2d_x::<[u8; 3]>(dim![10, 10]),
            Err(LayoutError::InvalidArgument(_))
        ));
        assert!(matches!(
            backend.allocate_pitched_2d_x::<[u8; 127]>(dim![10, 10]),
            Err(LayoutError::InvalidArgument(_))
        ));
        assert_eq!(backend.allocations.get(), 0);

        backend.allocate_pitched_2d_x::<[u8; 64]>(dim![10, 10]).unwrap();
        assert_eq!(backend.allocations.get(), 1);
        assert_eq!(backend.releases.get(), 1);
    }

    #[test]
    fn test_release_once() {
        let backend = CountingBackend::default();
        let mut buffer = backend.allocate_1d::<u8>(dim![32]).unwrap();
        buffer.release();
        buffer.release();
        assert_eq!(backend.releases.get(), 1);
        drop(buffer);
        assert_eq!(backend.releases.get(), 1);
    }

    #[test]
    fn test_allocation_failure() {
        let backend = HostBackend::with_limit(1024);
        assert!(backend.allocate_1d::<u8>(dim![1024]).is_ok());
        assert_eq!(
            backend.allocate_2d::<f32>(dim![16, 17]).unwrap_err(),
            LayoutError::AllocationFailure(BackendError::OutOfMemory {
                size: 1088,
                align: 4
            })
        );
    }

    #[test]
    fn test_pitched_rows_are_aligned() {
        let buffer = HostBackend::new()
            .allocate_pitched_2d_x::<f32>(dim![10, 4])
            .unwrap();
        let root = buffer.root_view().unwrap();
        assert_eq!(root.extent(), dim![10, 4]);
        assert_eq!(root.stride(), dim![1, 32]);
        assert_eq!(buffer.n_bytes(), 4 * 128);
        for y in 0..4 {
            let row = root.slice_along_y(y).unwrap();
            assert_eq!(row.as_ptr() as usize % 128, 0);
        }
        assert!(root.index(dim![10, 0]).is_err());
    }

    #[derive(Arbitrary, Debug)]
    struct PitchProblem {
        #[strategy(0isize..300)]
        width: isize,
        #[strategy(1isize..6)]
        height: isize,
        #[strategy(0usize..8)]
        size_log2: usize,
    }

    fn run_pitch_trial<T: Element>(width: isize, height: isize) -> Result<(), TestCaseError> {
        let s = std::mem::size_of::<T>();
        let buffer = HostBackend::new()
            .allocate_pitched_2d_x::<T>(dim![width, height])
            .unwrap();
        let root = buffer.root_view().unwrap();
        let expected = (width as usize * s).div_ceil(128) * 128 / s;
        prop_assert_eq!(root.stride().y, expected as isize);
        prop_assert_eq!(root.extent(), dim![width, height]);

        let mut last = None;
        for y in 0..height {
            for x in 0..width {
                let addr = root.index(dim![x, y]).unwrap().as_ptr() as usize;
                if let Some(prev) = last {
                    prop_assert!(addr > prev);
                }
                last = Some(addr);
            }
        }
        Ok(())
    }

    #[proptest(cases = 64)]
    fn test_pitched_allocation(prob: PitchProblem) {
        let PitchProblem {
            width,
            height,
            size_log2,
        } = prob;
        match size_log2 {
            0 => run_pitch_trial::<u8>(width, height)?,
            1 => run_pitch_trial::<f16>(width, height)?,
            2 => run_pitch_trial::<f32>(width, height)?,
            3 => run_pitch_trial::<f64>(width, height)?,
            4 => run_pitch_trial::<[u64; 2]>(width, height)?,
            5 => run_pitch_trial::<[u64; 4]>(width, height)?,
            6 => run_pitch_trial::<[u64; 8]>(width, height)?,
            _ => run_pitch_trial::<[u64; 16]>(width, height)?,
        }
    }
}

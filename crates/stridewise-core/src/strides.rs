use crate::{Dim1, Dim2};

/// How a unit step along the single logical axis maps to a physical element offset.
pub trait Stride1D: Copy + std::fmt::Debug + PartialEq + Send + Sync + 'static {
    /// True if the stride is statically known to be 1.
    const IS_DENSE: bool;

    fn stride(&self) -> Dim1;
}

/// How unit steps along X and Y map to physical element offsets.
///
/// `AlongX` and `AlongY` name the 1D tag carried by a slice that keeps that
/// axis. A tag that is statically dense along X slices to [`Dense1D`] along X,
/// everything else slices to [`General1D`]. This is what lets slicing pick its
/// return type from the static type of the view rather than at runtime.
pub trait Stride2D: Copy + std::fmt::Debug + PartialEq + Send + Sync + 'static {
    const IS_DENSE_X: bool;
    const IS_DENSE_Y: bool;

    type AlongX: Stride1D;
    type AlongY: Stride1D;

    fn stride(&self) -> Dim2;

    /// Tag of the 1D view running along X (Y held fixed).
    fn along_x(&self) -> Self::AlongX;

    /// Tag of the 1D view running along Y (X held fixed).
    fn along_y(&self) -> Self::AlongY;
}

/// Stride of 1, known at compile time. Zero sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dense1D;

/// Arbitrary stride stored at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_new::new)]
pub struct General1D {
    stride: Dim1,
}

impl Stride1D for Dense1D {
    const IS_DENSE: bool = true;

    #[inline]
    fn stride(&self) -> Dim1 {
        Dim1::ONE
    }
}

impl Stride1D for General1D {
    const IS_DENSE: bool = false;

    #[inline]
    fn stride(&self) -> Dim1 {
        self.stride
    }
}

/// Dense along X (row-major). Only the Y stride (the row pitch) is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_new::new)]
pub struct DenseX {
    y_stride: isize,
}

/// Dense along Y (column-major). Only the X stride is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_new::new)]
pub struct DenseY {
    x_stride: isize,
}

/// Both strides stored at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_new::new)]
pub struct General2D {
    stride: Dim2,
}

impl Stride2D for DenseX {
    const IS_DENSE_X: bool = true;
    const IS_DENSE_Y: bool = false;

    type AlongX = Dense1D;
    type AlongY = General1D;

    #[inline]
    fn stride(&self) -> Dim2 {
        Dim2::new(1, self.y_stride)
    }

    #[inline]
    fn along_x(&self) -> Dense1D {
        Dense1D
    }

    #[inline]
    fn along_y(&self) -> General1D {
        General1D::new(Dim1::new(self.y_stride))
    }
}

impl Stride2D for DenseY {
    const IS_DENSE_X: bool = false;
    const IS_DENSE_Y: bool = true;

    type AlongX = General1D;
    type AlongY = Dense1D;

    #[inline]
    fn stride(&self) -> Dim2 {
        Dim2::new(self.x_stride, 1)
    }

    #[inline]
    fn along_x(&self) -> General1D {
        General1D::new(Dim1::new(self.x_stride))
    }

    #[inline]
    fn along_y(&self) -> Dense1D {
        Dense1D
    }
}

impl Stride2D for General2D {
    const IS_DENSE_X: bool = false;
    const IS_DENSE_Y: bool = false;

    type AlongX = General1D;
    type AlongY = General1D;

    #[inline]
    fn stride(&self) -> Dim2 {
        self.stride
    }

    #[inline]
    fn along_x(&self) -> General1D {
        General1D::new(Dim1::new(self.stride.x))
    }

    #[inline]
    fn along_y(&self) -> General1D {
        General1D::new(Dim1::new(self.stride.y))
    }
}

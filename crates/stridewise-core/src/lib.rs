mod align;
mod allocator;
mod buffer;
mod dim;
mod element;
mod error;
mod storage;
mod strides;
mod view;

pub use align::*;
pub use allocator::*;
pub use buffer::*;
pub use dim::*;
pub use element::*;
pub use error::*;
pub use storage::*;
pub use strides::*;
pub use view::*;

#[macro_export]
macro_rules! dim {
    ($x:expr $(,)?) => {
        $crate::Dim1::new($x)
    };
    ($x:expr, $y:expr $(,)?) => {
        $crate::Dim2::new($x, $y)
    };
}

pub mod prelude {
    pub use crate::{
        dim, Allocator, ArrayView1D, ArrayView2D, Dense1D, DenseX, DenseY, Dim1, Dim2,
        General1D, General2D, HostBackend, LayoutError, MemoryBuffer, RawView1D, RawView2D,
        Stride1D, Stride2D,
    };
}

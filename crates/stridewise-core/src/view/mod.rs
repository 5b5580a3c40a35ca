mod raw;
mod view1d;
mod view2d;

pub use raw::*;
pub use view1d::*;
pub use view2d::*;

use crate::{Element, Stride1D, Stride2D};

/// A layout descriptor that can be bound to a base pointer to produce a view.
pub trait ViewLayout: Copy + std::fmt::Debug {
    type View<'a, T: Element>;

    /// Storage elements the layout spans from its base, `None` if the layout
    /// cannot be backed by a single allocation.
    fn required_len(&self) -> Option<usize>;

    /// # Safety
    /// `data` must satisfy the contract of the view's `from_raw_parts` for `'a`.
    unsafe fn bind<'a, T: Element>(&self, data: *mut T) -> Self::View<'a, T>;
}

impl<S: Stride1D> ViewLayout for Layout1D<S> {
    type View<'a, T: Element> = ArrayView1D<'a, T, S>;

    fn required_len(&self) -> Option<usize> {
        Layout1D::required_len(self)
    }

    unsafe fn bind<'a, T: Element>(&self, data: *mut T) -> ArrayView1D<'a, T, S> {
        ArrayView1D::from_raw_parts(data, *self)
    }
}

impl<S: Stride2D> ViewLayout for Layout2D<S> {
    type View<'a, T: Element> = ArrayView2D<'a, T, S>;

    fn required_len(&self) -> Option<usize> {
        Layout2D::required_len(self)
    }

    unsafe fn bind<'a, T: Element>(&self, data: *mut T) -> ArrayView2D<'a, T, S> {
        ArrayView2D::from_raw_parts(data, *self)
    }
}

/// Types that can be stored in a [`crate::MemoryBuffer`].
///
/// Storage is zero initialised by the backend and handed out through
/// [`std::cell::Cell`], so elements must be plain old data.
pub trait Element: bytemuck::Pod + std::fmt::Debug + PartialEq + Send + Sync + 'static {}

impl<T> Element for T where T: bytemuck::Pod + std::fmt::Debug + PartialEq + Send + Sync + 'static {}

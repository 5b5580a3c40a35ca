use crate::BackendError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Index {index} out of range for extent {extent}")]
    OutOfRange { index: String, extent: String },
    #[error("View is not dense along {axis}, actual stride is {stride}")]
    InvalidLayoutAssumption { axis: Axis, stride: isize },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to allocate storage with error: {0}")]
    AllocationFailure(#[from] BackendError),
    #[error("Buffer has been released")]
    Released,
}

impl LayoutError {
    pub(crate) fn out_of_range(index: impl std::fmt::Display, extent: impl std::fmt::Display) -> Self {
        Self::OutOfRange {
            index: index.to_string(),
            extent: extent.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

use std::ops::{Add, Mul, Sub};

/// Rank 1 coordinate tuple. Used both as an extent and as an index/offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, derive_new::new)]
pub struct Dim1 {
    pub x: isize,
}

/// Rank 2 coordinate tuple. Used both as an extent and as an index/offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, derive_new::new)]
pub struct Dim2 {
    pub x: isize,
    pub y: isize,
}

impl Dim1 {
    pub const ONE: Self = Self { x: 1 };

    /// Linear offset of this coordinate under `stride`.
    #[inline]
    pub fn dot(&self, stride: Dim1) -> isize {
        self.x * stride.x
    }

    /// As [`Dim1::dot`], `None` on overflow.
    #[inline]
    pub fn checked_dot(&self, stride: Dim1) -> Option<isize> {
        self.x.checked_mul(stride.x)
    }

    /// Number of elements described by this tuple when used as an extent.
    /// `None` for negative extents or on overflow.
    pub fn numel(&self) -> Option<usize> {
        usize::try_from(self.x).ok()
    }
}

impl Dim2 {
    #[inline]
    pub fn dot(&self, stride: Dim2) -> isize {
        self.x * stride.x + self.y * stride.y
    }

    #[inline]
    pub fn checked_dot(&self, stride: Dim2) -> Option<isize> {
        self.x
            .checked_mul(stride.x)?
            .checked_add(self.y.checked_mul(stride.y)?)
    }

    pub fn numel(&self) -> Option<usize> {
        let x = usize::try_from(self.x).ok()?;
        let y = usize::try_from(self.y).ok()?;
        x.checked_mul(y)
    }
}

impl std::fmt::Debug for Dim1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.x)
    }
}

impl std::fmt::Debug for Dim2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}x{}]", self.x, self.y)
    }
}

impl std::fmt::Display for Dim1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.x)
    }
}

impl std::fmt::Display for Dim2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<isize> for Dim1 {
    fn from(x: isize) -> Self {
        Self { x }
    }
}

impl From<(isize,)> for Dim1 {
    fn from(v: (isize,)) -> Self {
        Self { x: v.0 }
    }
}

impl From<(isize, isize)> for Dim2 {
    fn from(v: (isize, isize)) -> Self {
        Self { x: v.0, y: v.1 }
    }
}

impl From<[isize; 2]> for Dim2 {
    fn from(v: [isize; 2]) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Promotes a rank 1 tuple to rank 2 with a unit Y component.
impl From<Dim1> for Dim2 {
    fn from(v: Dim1) -> Self {
        Self { x: v.x, y: 1 }
    }
}

macro_rules! impl_dim_arith {
    ($T:ident, $($f:ident),+) => {
        impl Add for $T {
            type Output = $T;

            fn add(self, rhs: $T) -> $T {
                $T { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl Sub for $T {
            type Output = $T;

            fn sub(self, rhs: $T) -> $T {
                $T { $($f: self.$f - rhs.$f),+ }
            }
        }

        impl Mul<isize> for $T {
            type Output = $T;

            fn mul(self, rhs: isize) -> $T {
                $T { $($f: self.$f * rhs),+ }
            }
        }
    };
}

impl_dim_arith!(Dim1, x);
impl_dim_arith!(Dim2, x, y);

//! Index-space extents and slice orientation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceError};

/// Inclusive index bounds `[x0, x1, y0, y1, z0, z1]` of a rectangular sub-volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent(pub [i32; 6]);

impl Extent {
    /// Creates an extent from per-axis bounds.
    pub const fn new(x0: i32, x1: i32, y0: i32, y1: i32, z0: i32, z1: i32) -> Self {
        Self([x0, x1, y0, y1, z0, z1])
    }

    /// Creates an extent covering `dims` samples per axis starting at index zero.
    pub fn from_dims(dims: [usize; 3]) -> Self {
        let hi = |n: usize| i32::try_from(n).unwrap_or(i32::MAX) - 1;
        Self([0, hi(dims[0]), 0, hi(dims[1]), 0, hi(dims[2])])
    }

    /// Returns the extent if every axis has `min <= max`.
    pub fn validated(self) -> Result<Self> {
        if self.is_empty() {
            Err(SliceError::InvalidExtent(self.0))
        } else {
            Ok(self)
        }
    }

    /// Returns `(min, max)` along `axis`.
    pub fn axis(&self, axis: usize) -> (i32, i32) {
        (self.0[2 * axis], self.0[2 * axis + 1])
    }

    /// Returns a copy with the bounds along `axis` replaced.
    #[must_use]
    pub fn with_axis(mut self, axis: usize, lo: i32, hi: i32) -> Self {
        self.0[2 * axis] = lo;
        self.0[2 * axis + 1] = hi;
        self
    }

    /// Number of samples along `axis` (zero when empty).
    pub fn len(&self, axis: usize) -> usize {
        let (lo, hi) = self.axis(axis);
        usize::try_from(i64::from(hi) - i64::from(lo) + 1).unwrap_or(0)
    }

    /// Number of samples along each axis.
    pub fn dims(&self) -> [usize; 3] {
        [self.len(0), self.len(1), self.len(2)]
    }

    /// Total number of samples.
    pub fn num_samples(&self) -> usize {
        self.dims().iter().product()
    }

    /// Whether any axis has `min > max`.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|a| self.0[2 * a] > self.0[2 * a + 1])
    }

    /// Whether `other` lies entirely inside this extent.
    pub fn contains(&self, other: &Extent) -> bool {
        (0..3).all(|a| self.0[2 * a] <= other.0[2 * a] && other.0[2 * a + 1] <= self.0[2 * a + 1])
    }

    /// Intersection of two extents (may be empty).
    #[must_use]
    pub fn intersect(&self, other: &Extent) -> Extent {
        let mut out = *self;
        for a in 0..3 {
            out.0[2 * a] = self.0[2 * a].max(other.0[2 * a]);
            out.0[2 * a + 1] = self.0[2 * a + 1].min(other.0[2 * a + 1]);
        }
        out
    }
}

impl From<[i32; 6]> for Extent {
    fn from(values: [i32; 6]) -> Self {
        Self(values)
    }
}

/// The index axis a slice is taken through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Orientation {
    /// Slice through the X axis (texture spans Y and Z).
    X,
    /// Slice through the Y axis (texture spans X and Z).
    Y,
    /// Slice through the Z axis (texture spans X and Y).
    #[default]
    Z,
}

impl Orientation {
    /// All orientations in axis order.
    pub const ALL: [Orientation; 3] = [Orientation::X, Orientation::Y, Orientation::Z];

    /// Orientation for an axis index, if in range.
    pub fn from_axis(axis: usize) -> Option<Self> {
        Self::ALL.get(axis).copied()
    }

    /// Index of the through-slice axis.
    pub fn axis(self) -> usize {
        match self {
            Orientation::X => 0,
            Orientation::Y => 1,
            Orientation::Z => 2,
        }
    }

    /// Axis indices `(xdim, ydim)` that become texture columns and rows.
    pub fn dimension_indices(self) -> (usize, usize) {
        match self {
            Orientation::X => (1, 2),
            Orientation::Y => (0, 2),
            Orientation::Z => (0, 1),
        }
    }
}

/// Pixel dimensions of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureSize {
    pub width: usize,
    pub height: usize,
}

impl TextureSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// The extent, orientation and slice index of a single render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRequest {
    pub extent: Extent,
    pub orientation: Orientation,
    pub slice_number: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dimension_indices() {
        assert_eq!(Orientation::X.dimension_indices(), (1, 2));
        assert_eq!(Orientation::Y.dimension_indices(), (0, 2));
        assert_eq!(Orientation::Z.dimension_indices(), (0, 1));
    }

    #[test]
    fn test_extent_dims_and_empty() {
        let e = Extent::new(0, 9, 2, 5, 3, 3);
        assert_eq!(e.dims(), [10, 4, 1]);
        assert_eq!(e.num_samples(), 40);
        assert!(!e.is_empty());
        assert!(Extent::new(1, 0, 0, 0, 0, 0).is_empty());
        assert!(Extent::new(1, 0, 0, 0, 0, 0).validated().is_err());
        assert_eq!(Extent::new(1, 0, 0, 0, 0, 0).len(0), 0);
    }

    #[test]
    fn test_extent_intersect() {
        let a = Extent::new(0, 9, 0, 9, 0, 9);
        let b = Extent::new(5, 20, -3, 4, 9, 9);
        assert_eq!(a.intersect(&b), Extent::new(5, 9, 0, 4, 9, 9));
        assert!(a.contains(&a.intersect(&b)));
        assert!(a.intersect(&Extent::new(10, 12, 0, 0, 0, 0)).is_empty());
    }

    #[test]
    fn test_from_dims() {
        assert_eq!(Extent::from_dims([10, 10, 1]), Extent::new(0, 9, 0, 9, 0, 0));
    }

    proptest! {
        #[test]
        fn orientation_mapping_excludes_slice_axis(axis in 0usize..3) {
            let orientation = Orientation::from_axis(axis).unwrap();
            let (xdim, ydim) = orientation.dimension_indices();
            prop_assert_ne!(xdim, ydim);
            prop_assert_ne!(xdim, axis);
            prop_assert_ne!(ydim, axis);
            prop_assert!(xdim < ydim);
        }
    }
}

//! Volumetric image data.

use std::sync::Arc;

use glam::{DMat3, DVec3};

use crate::error::{Result, SliceError};
use crate::extent::Extent;
use crate::revision::{Revision, Stamp};
use crate::transform::WorldTransform;

/// Scalar storage of a volume, shared so texture uploads can borrow it without copying.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarArray {
    U8(Arc<[u8]>),
    I16(Arc<[i16]>),
    U16(Arc<[u16]>),
    F32(Arc<[f32]>),
    F64(Arc<[f64]>),
}

impl ScalarArray {
    /// Number of stored values (tuples times components).
    pub fn len(&self) -> usize {
        match self {
            ScalarArray::U8(v) => v.len(),
            ScalarArray::I16(v) => v.len(),
            ScalarArray::U16(v) => v.len(),
            ScalarArray::F32(v) => v.len(),
            ScalarArray::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at flat index `idx` as `f64`.
    pub fn value(&self, idx: usize) -> f64 {
        match self {
            ScalarArray::U8(v) => f64::from(v[idx]),
            ScalarArray::I16(v) => f64::from(v[idx]),
            ScalarArray::U16(v) => f64::from(v[idx]),
            ScalarArray::F32(v) => f64::from(v[idx]),
            ScalarArray::F64(v) => v[idx],
        }
    }

    /// The underlying bytes when the scalars are already `u8`.
    pub fn as_u8(&self) -> Option<&Arc<[u8]>> {
        match self {
            ScalarArray::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the element type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarArray::U8(_) => "u8",
            ScalarArray::I16(_) => "i16",
            ScalarArray::U16(_) => "u16",
            ScalarArray::F32(_) => "f32",
            ScalarArray::F64(_) => "f64",
        }
    }
}

macro_rules! impl_from_vec {
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for ScalarArray {
            fn from(values: Vec<$t>) -> Self {
                ScalarArray::$variant(values.into())
            }
        }
    };
}

impl_from_vec!(u8, U8);
impl_from_vec!(i16, I16);
impl_from_vec!(u16, U16);
impl_from_vec!(f32, F32);
impl_from_vec!(f64, F64);

/// A regular 3D image: scalars laid out x-fastest over an index extent,
/// placed in the world by a [`WorldTransform`].
#[derive(Debug, Clone)]
pub struct ImageVolume {
    extent: Extent,
    transform: WorldTransform,
    scalars: ScalarArray,
    components: usize,
    revision: Revision,
}

impl ImageVolume {
    /// Creates a volume, checking that `scalars` holds `components` values per sample.
    pub fn new(extent: Extent, components: usize, scalars: impl Into<ScalarArray>) -> Result<Self> {
        let extent = extent.validated()?;
        let scalars = scalars.into();
        Self::check_layout(&extent, components, &scalars)?;
        Ok(Self {
            extent,
            transform: WorldTransform::default(),
            scalars,
            components,
            revision: Revision::new(),
        })
    }

    /// Creates a single-component volume of `dims` samples starting at index zero.
    pub fn from_dims(dims: [usize; 3], scalars: impl Into<ScalarArray>) -> Result<Self> {
        Self::new(Extent::from_dims(dims), 1, scalars)
    }

    fn check_layout(extent: &Extent, components: usize, scalars: &ScalarArray) -> Result<()> {
        if !(1..=4).contains(&components) {
            return Err(SliceError::UnsupportedComponents(components));
        }
        let expected = extent.num_samples() * components;
        if scalars.len() != expected {
            return Err(SliceError::SizeMismatch {
                expected,
                actual: scalars.len(),
            });
        }
        Ok(())
    }

    /// Sets the world placement (builder form).
    #[must_use]
    pub fn with_transform(mut self, transform: WorldTransform) -> Self {
        self.set_transform(transform);
        self
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn transform(&self) -> &WorldTransform {
        &self.transform
    }

    pub fn spacing(&self) -> DVec3 {
        self.transform.spacing()
    }

    pub fn origin(&self) -> DVec3 {
        self.transform.origin()
    }

    pub fn direction(&self) -> DMat3 {
        self.transform.direction()
    }

    pub fn scalars(&self) -> &ScalarArray {
        &self.scalars
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Revision stamp, changed by every setter.
    pub fn stamp(&self) -> Stamp {
        self.revision.stamp()
    }

    /// Replaces the world placement.
    pub fn set_transform(&mut self, transform: WorldTransform) {
        self.transform = transform;
        self.revision.bump();
    }

    /// Replaces the scalars (same extent and component count).
    pub fn set_scalars(&mut self, scalars: impl Into<ScalarArray>) -> Result<()> {
        let scalars = scalars.into();
        Self::check_layout(&self.extent, self.components, &scalars)?;
        self.scalars = scalars;
        self.revision.bump();
        Ok(())
    }

    /// Replaces extent, component count and scalars together.
    pub fn set_data(
        &mut self,
        extent: Extent,
        components: usize,
        scalars: impl Into<ScalarArray>,
    ) -> Result<()> {
        let extent = extent.validated()?;
        let scalars = scalars.into();
        Self::check_layout(&extent, components, &scalars)?;
        self.extent = extent;
        self.components = components;
        self.scalars = scalars;
        self.revision.bump();
        Ok(())
    }

    /// Marks the data as modified after external changes.
    pub fn modified(&mut self) {
        self.revision.bump();
    }

    /// Flat index of the first component of sample `ijk`.
    ///
    /// `ijk` must lie inside the volume extent.
    pub fn tuple_offset(&self, ijk: [i32; 3]) -> usize {
        let [nx, ny, _] = self.extent.dims();
        let rel = |a: usize| usize::try_from(ijk[a] - self.extent.0[2 * a]).unwrap_or(0);
        ((rel(2) * ny + rel(1)) * nx + rel(0)) * self.components
    }

    /// Value of component `c` at sample `ijk`.
    pub fn value(&self, ijk: [i32; 3], c: usize) -> f64 {
        self.scalars.value(self.tuple_offset(ijk) + c)
    }
}

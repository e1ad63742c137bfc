//! Core of slicetex: renders one slice of a volumetric image as a textured polygon.
//!
//! This crate holds everything that does not depend on a graphics API:
//! - [`ImageVolume`], [`LookupTable`] and [`ImageProperty`] describing what to show
//! - [`ImageSliceMapper`], which picks the slice, builds texture pixels and geometry,
//!   and decides when a texture must be reloaded
//! - the [`RenderBackend`] trait the mapper draws through, with a [`RecordingBackend`]
//!   for diagnostics and tests

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
// Index and pixel arithmetic converts between i32, usize and f64 throughout
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]

pub mod background;
pub mod backend;
pub mod cache;
pub mod color_map;
pub mod error;
pub mod extent;
pub mod geometry;
pub mod lookup_table;
pub mod mapper;
pub mod options;
pub mod partition;
pub mod property;
pub mod revision;
pub mod texture;
pub mod texture_data;
pub mod transform;
pub mod volume;

pub use backend::{
    BackendEvent, ContextId, DrawCall, DrawLayer, DrawMaterial, DrawRecord, RecordingBackend, RenderBackend,
    TextureKey, UploadRecord,
};
pub use cache::{LoadStamp, TextureCache};
pub use color_map::{ColorMap, ColorMapRegistry};
pub use error::{Result, SliceError};
pub use extent::{Extent, Orientation, SliceRequest, TextureSize};
pub use geometry::{PolygonBuffer, Quad, Topology};
pub use lookup_table::LookupTable;
pub use mapper::{ImageSlice, ImageSliceMapper};
pub use options::MapperOptions;
pub use partition::{Leaf, SUBDIVISION_FLOOR};
pub use property::{ImageProperty, Interpolation};
pub use revision::{Revision, Stamp};
pub use texture::{Filter, PixelBuffer, TextureImage};
pub use transform::WorldTransform;
pub use volume::{ImageVolume, ScalarArray};

// Re-export glam types for convenience
pub use glam::{DMat3, DMat4, DVec2, DVec3};

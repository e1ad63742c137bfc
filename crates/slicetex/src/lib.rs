//! slicetex: renders one slice of a volumetric image as a texture-mapped polygon.
//!
//! A volume's scalars are mapped through a lookup table (or window/level, or
//! passed through as colors) into a 2D texture. The texture is drawn on a quad
//! or on a user-supplied polygon lying in the slice plane. Textures larger than
//! the backend allows are split into pieces and drawn one after another.
//!
//! # Quick Start
//!
//! ```no_run
//! use slicetex::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let values: Vec<u8> = (0..100).collect();
//!     let volume = ImageVolume::from_dims([10, 10, 1], values)?;
//!     let property = ImageProperty::new().with_lookup_table(LookupTable::grayscale((0.0, 99.0)));
//!
//!     let mut mapper = ImageSliceMapper::new();
//!     render_to_file(&mut mapper, &ImageSlice::new(&volume, &property), "slice.png", 256, 256)?;
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - [`slicetex_core`] holds the data model and the [`ImageSliceMapper`], which
//!   draws through any [`RenderBackend`]
//! - [`slicetex_render`] provides the wgpu backend [`SliceRenderEngine`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]

mod headless;

pub use headless::{render_to_file, render_to_image, slice_view};

// Re-export core types
pub use slicetex_core::{
    BackendEvent, ColorMap, ColorMapRegistry, ContextId, DrawCall, DrawLayer, DrawMaterial, Extent, Filter,
    ImageProperty, ImageSlice, ImageSliceMapper, ImageVolume, Interpolation, LookupTable, MapperOptions,
    Orientation, PixelBuffer, PolygonBuffer, RecordingBackend, RenderBackend, ScalarArray, SliceError, SliceRequest,
    TextureImage, TextureKey, TextureSize, WorldTransform,
};
pub use slicetex_core::{DMat3, DMat4, DVec2, DVec3};

// Re-export render types
pub use slicetex_render::{save_image, save_to_buffer, RenderError, ScreenshotError, SliceRenderEngine, SliceView};

use thiserror::Error;

/// Errors returned by the slicetex facade.
#[derive(Error, Debug)]
pub enum SlicetexError {
    /// Invalid input data or configuration.
    #[error(transparent)]
    Slice(#[from] SliceError),

    /// GPU setup or readback failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Writing or encoding an image failed.
    #[error("screenshot error: {0}")]
    Screenshot(#[from] ScreenshotError),
}

/// A specialized Result type for the slicetex facade.
pub type Result<T> = std::result::Result<T, SlicetexError>;

/// Initializes `env_logger` once; later calls are ignored.
///
/// Log output is controlled by `RUST_LOG`, e.g. `RUST_LOG=slicetex_core=debug`
/// shows texture reloads and partitioning.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

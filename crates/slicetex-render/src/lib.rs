//! Rendering backend for slicetex.
//!
//! This crate provides the wgpu implementation of [`slicetex_core::RenderBackend`]:
//! - Texture upload with in-place reuse when the size is unchanged
//! - Slice pipelines (textured, flat background, depth-only variants)
//! - Orthographic slice views and offscreen capture to images

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// GPU APIs take u32 sizes; slice data uses usize and f64
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod engine;
pub mod error;
pub mod mesh;
pub mod screenshot;
pub mod view;

pub use engine::SliceRenderEngine;
pub use error::{RenderError, RenderResult};
pub use mesh::{expand_to_rgba, DrawUniforms, SliceVertex};
pub use screenshot::{save_image, save_to_buffer, ScreenshotError};
pub use view::SliceView;

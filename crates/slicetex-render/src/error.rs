//! Rendering error types.

use slicetex_core::SliceError;
use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// A textured draw was requested before any texture was uploaded.
    #[error("no texture uploaded")]
    MissingTexture,

    /// Mesh data that cannot be drawn.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Mapping a readback buffer failed.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,
}

impl From<RenderError> for SliceError {
    fn from(err: RenderError) -> Self {
        SliceError::Backend(err.to_string())
    }
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

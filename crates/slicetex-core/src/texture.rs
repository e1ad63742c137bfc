//! Texture sizing policy and the pixel buffers handed to the backend.

use std::ops::{Deref, Range};
use std::sync::Arc;

use crate::extent::{Extent, Orientation, TextureSize};

/// Computes the in-plane axes and the texture size needed for `extent`.
///
/// Textures are allocated at exactly the image size (no power-of-two padding).
pub fn compute_texture_size(extent: &Extent, orientation: Orientation) -> (usize, usize, TextureSize) {
    let (xdim, ydim) = orientation.dimension_indices();
    (xdim, ydim, TextureSize::new(extent.len(xdim), extent.len(ydim)))
}

/// Whether a texture of `size` can be created on a device limited to `max_edge` pixels.
pub fn fits(size: TextureSize, max_edge: u32) -> bool {
    let max_edge = max_edge as usize;
    size.width <= max_edge && size.height <= max_edge
}

/// Texture memory with a single owner.
///
/// Either a freshly built buffer, or a view into the volume's own `u8`
/// scalars when they can be uploaded as-is. Dropping the buffer releases it.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Owned(Vec<u8>),
    Shared { data: Arc<[u8]>, range: Range<usize> },
}

impl PixelBuffer {
    /// Whether this buffer borrows the input scalars instead of a copy.
    pub fn is_shared(&self) -> bool {
        matches!(self, PixelBuffer::Shared { .. })
    }

    /// Converts to an owned buffer, copying only when shared.
    pub fn into_vec(self) -> Vec<u8> {
        match self {
            PixelBuffer::Owned(v) => v,
            PixelBuffer::Shared { data, range } => data[range].to_vec(),
        }
    }
}

impl Deref for PixelBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            PixelBuffer::Owned(v) => v,
            PixelBuffer::Shared { data, range } => &data[range.clone()],
        }
    }
}

/// Texture filtering requested for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

/// A texture ready for upload. Edges are always clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub pixels: PixelBuffer,
    pub size: TextureSize,
    /// 1 (luminance), 2 (luminance + alpha), 3 (RGB) or 4 (RGBA).
    pub bytes_per_pixel: usize,
    pub filter: Filter,
    /// The previous texture has the same size and format and may be written in place.
    pub reuse_texture: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_texture_size() {
        let extent = Extent::new(0, 9, 0, 19, 5, 5);
        let (xdim, ydim, size) = compute_texture_size(&extent, Orientation::Z);
        assert_eq!((xdim, ydim), (0, 1));
        assert_eq!(size, TextureSize::new(10, 20));

        let extent = Extent::new(3, 3, 0, 19, 0, 29);
        let (_, _, size) = compute_texture_size(&extent, Orientation::X);
        assert_eq!(size, TextureSize::new(20, 30));
    }

    #[test]
    fn test_fits() {
        assert!(fits(TextureSize::new(1024, 1024), 1024));
        assert!(!fits(TextureSize::new(1025, 10), 1024));
        assert!(!fits(TextureSize::new(10, 1025), 1024));
        assert!(fits(TextureSize::new(0, 0), 0));
    }

    #[test]
    fn test_shared_buffer_views_input() {
        let data: Arc<[u8]> = vec![1, 2, 3, 4, 5, 6].into();
        let buffer = PixelBuffer::Shared {
            data: Arc::clone(&data),
            range: 2..5,
        };
        assert!(buffer.is_shared());
        assert_eq!(&*buffer, &[3, 4, 5]);
        assert_eq!(Arc::strong_count(&data), 2);
        drop(buffer);
        assert_eq!(Arc::strong_count(&data), 1);
    }
}

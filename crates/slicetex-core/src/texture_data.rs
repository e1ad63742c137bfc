//! Conversion of a volume slice into texture pixels.

use std::sync::Arc;

use crate::extent::{Extent, Orientation, TextureSize};
use crate::property::ImageProperty;
use crate::texture::{compute_texture_size, PixelBuffer};
use crate::volume::ImageVolume;

/// Size and format of the texture currently held by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureState {
    pub size: TextureSize,
    pub bytes_per_pixel: usize,
}

/// Pixels produced for one slice extent.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub pixels: PixelBuffer,
    pub size: TextureSize,
    pub bytes_per_pixel: usize,
    /// The previous texture may be overwritten in place.
    pub reuse_texture: bool,
}

impl TextureData {
    /// Whether the pixels are the volume's own scalars rather than a copy.
    pub fn reused_input(&self) -> bool {
        self.pixels.is_shared()
    }
}

/// Builds the texture pixels for `extent` of `volume`.
///
/// With a lookup table on `property`, component 0 of each sample is mapped to
/// RGB (or RGBA when the table has alpha). Without one, samples are passed
/// through window/level, keeping their component count; `u8` samples at the
/// identity window/level whose rows are contiguous in memory are shared with
/// the volume instead of copied.
///
/// `previous` describes the texture already on the device and
/// `context_unchanged` whether it is still valid; together they decide
/// [`TextureData::reuse_texture`].
pub fn build_pixels(
    volume: &ImageVolume,
    property: Option<&ImageProperty>,
    extent: &Extent,
    orientation: Orientation,
    previous: Option<TextureState>,
    context_unchanged: bool,
) -> TextureData {
    let (xdim, ydim, size) = compute_texture_size(extent, orientation);
    let table = property.and_then(ImageProperty::lookup_table);

    let input_is_colors = table.is_none()
        && volume.scalars().as_u8().is_some()
        && property.map_or(true, ImageProperty::is_identity_window_level);

    let bytes_per_pixel = match table {
        Some(t) if t.has_alpha() => 4,
        Some(_) => 3,
        None => volume.components(),
    };

    let reuse_texture = context_unchanged
        && previous
            == Some(TextureState {
                size,
                bytes_per_pixel,
            });

    if input_is_colors && is_contiguous(volume.extent(), extent, xdim, ydim) {
        if let Some(data) = volume.scalars().as_u8() {
            let start = volume.tuple_offset([extent.0[0], extent.0[2], extent.0[4]]);
            let len = size.area() * bytes_per_pixel;
            return TextureData {
                pixels: PixelBuffer::Shared {
                    data: Arc::clone(data),
                    range: start..start + len,
                },
                size,
                bytes_per_pixel,
                reuse_texture,
            };
        }
    }

    let mut out = Vec::with_capacity(size.area() * bytes_per_pixel);
    let slice = extent.axis(orientation.axis()).0;
    let (x0, x1) = extent.axis(xdim);
    let (y0, y1) = extent.axis(ydim);

    let mut ijk = [0i32; 3];
    ijk[orientation.axis()] = slice;

    if let Some(table) = table {
        let range = property
            .and_then(ImageProperty::effective_table_range)
            .unwrap_or_else(|| table.range());
        for y in y0..=y1 {
            ijk[ydim] = y;
            for x in x0..=x1 {
                ijk[xdim] = x;
                let color = table.map_scalar_in_range(volume.value(ijk, 0), range);
                out.extend_from_slice(&color[..bytes_per_pixel]);
            }
        }
    } else {
        let shift_scale = ShiftScale::from_window(property.map_or((0.0, 255.0), ImageProperty::window_range));
        let components = volume.components();
        for y in y0..=y1 {
            ijk[ydim] = y;
            for x in x0..=x1 {
                ijk[xdim] = x;
                let base = volume.tuple_offset(ijk);
                for c in 0..components {
                    let v = volume.scalars().value(base + c);
                    out.push(if input_is_colors { v as u8 } else { shift_scale.apply(v) });
                }
            }
        }
    }

    TextureData {
        pixels: PixelBuffer::Owned(out),
        size,
        bytes_per_pixel,
        reuse_texture,
    }
}

/// Whether the rows of `extent` are laid out back to back in the volume's memory.
fn is_contiguous(data: Extent, extent: &Extent, xdim: usize, ydim: usize) -> bool {
    let same = |a: usize| data.axis(a) == extent.axis(a);
    let single = |a: usize| {
        let (lo, hi) = data.axis(a);
        lo == hi
    };
    (xdim == 0 && ydim == 1 && same(0))
        || (xdim == 1 && single(0) && same(1))
        || (xdim == 0 && ydim == 2 && single(1) && same(0))
}

/// Linear window/level mapping of scalars to bytes.
struct ShiftScale {
    low: f64,
    window: f64,
}

impl ShiftScale {
    fn from_window((low, high): (f64, f64)) -> Self {
        Self {
            low,
            window: high - low,
        }
    }

    fn apply(&self, v: f64) -> u8 {
        if self.window == 0.0 {
            return if v >= self.low { 255 } else { 0 };
        }
        let mapped = ((v - self.low) * 255.0 / self.window).clamp(0.0, 255.0);
        (mapped + 0.5).floor() as u8
    }
}

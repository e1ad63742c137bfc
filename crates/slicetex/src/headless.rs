//! Headless rendering of a single slice.
//!
//! Creates an offscreen GPU context, draws one frame of the slice seen straight
//! down its normal, and returns or saves the pixels. Useful for tests, batch
//! export and thumbnails.

use glam::DVec3;
use pollster::FutureExt;
use slicetex_core::{ImageSlice, ImageSliceMapper};
use slicetex_render::{SliceRenderEngine, SliceView};

use crate::Result;

/// Background the frame is cleared to before the slice is drawn.
const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Builds an orthographic view that looks at the mapper's display extent
/// along the slice normal, with the texture's row axis pointing up.
pub fn slice_view(mapper: &ImageSliceMapper, slice: &ImageSlice<'_>, aspect_ratio: f32) -> SliceView {
    let volume = slice.volume;
    let transform = volume.transform();
    let extent = mapper.display_extent(volume);
    let orientation = mapper.options().orientation;
    let (_, ydim) = orientation.dimension_indices();

    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for corner in 0..8 {
        let mut ijk = DVec3::ZERO;
        for axis in 0..3 {
            let (lo, hi) = extent.axis(axis);
            // Pixels cover half a sample on each side within the slice plane
            let pad = if axis == orientation.axis() { 0.0 } else { 0.5 };
            ijk[axis] = if corner & (1 << axis) == 0 {
                f64::from(lo) - pad
            } else {
                f64::from(hi) + pad
            };
        }
        let point = slice.data_to_world.transform_point3(transform.index_to_world(ijk));
        min = min.min(point);
        max = max.max(point);
    }

    let normal = slice
        .data_to_world
        .transform_vector3(transform.axis_direction(orientation.axis()));
    let up = slice.data_to_world.transform_vector3(transform.axis_direction(ydim));
    SliceView::fit(min.as_vec3(), max.as_vec3(), normal.as_vec3(), up.as_vec3(), aspect_ratio)
}

/// Renders the slice to a file.
///
/// Creates a headless GPU context, renders one frame and saves it as a PNG or
/// JPEG image depending on the extension.
///
/// # Example
/// ```no_run
/// use slicetex::*;
///
/// let volume = ImageVolume::from_dims([4, 4, 1], vec![0u8; 16]).unwrap();
/// let property = ImageProperty::new();
/// let mut mapper = ImageSliceMapper::new();
/// render_to_file(&mut mapper, &ImageSlice::new(&volume, &property), "out.png", 64, 64).unwrap();
/// ```
pub fn render_to_file(
    mapper: &mut ImageSliceMapper,
    slice: &ImageSlice<'_>,
    filename: impl AsRef<std::path::Path>,
    width: u32,
    height: u32,
) -> Result<()> {
    let data = render_to_image(mapper, slice, width, height)?;
    slicetex_render::save_image(filename, &data, width, height)?;
    Ok(())
}

/// Renders the slice to a raw RGBA pixel buffer.
///
/// The returned buffer holds `width * height * 4` bytes, rows ordered from top
/// to bottom. The mapper's texture is released afterwards because the GPU
/// context does not outlive the call.
pub fn render_to_image(
    mapper: &mut ImageSliceMapper,
    slice: &ImageSlice<'_>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let mut engine = SliceRenderEngine::new_headless(width, height).block_on()?;

    let aspect_ratio = engine.width() as f32 / engine.height() as f32;
    let view = slice_view(mapper, slice, aspect_ratio);
    engine.set_view_projection(view.view_projection_matrix());

    engine.begin_frame(CLEAR_COLOR);
    mapper.render(&mut engine, slice);
    engine.end_frame();

    let pixels = engine.read_pixels()?;
    mapper.release_resources(&mut engine);
    log::debug!("rendered slice to {width}x{height} image");
    Ok(pixels)
}

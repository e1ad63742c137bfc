//! The image slice mapper: turns one slice of a volume into textured polygons.

use glam::{DMat4, DVec3};

use crate::background::{polygon_border, quad_border};
use crate::backend::{DrawCall, DrawLayer, DrawMaterial, RenderBackend, TextureKey};
use crate::cache::{LoadStamp, TextureCache};
use crate::extent::{Extent, Orientation, SliceRequest, TextureSize};
use crate::geometry::{polygon_tcoords, texture_quad, PolygonBuffer, Topology};
use crate::options::MapperOptions;
use crate::partition::{partition, Leaf};
use crate::property::{ImageProperty, Interpolation};
use crate::revision::{Revision, Stamp};
use crate::texture::{self, Filter, TextureImage};
use crate::texture_data::{build_pixels, TextureState};
use crate::transform::WorldTransform;
use crate::volume::ImageVolume;

/// A volume placed in the scene together with its display property.
#[derive(Debug, Clone, Copy)]
pub struct ImageSlice<'a> {
    pub volume: &'a ImageVolume,
    pub property: Option<&'a ImageProperty>,
    /// Maps the volume's data coordinates into world space.
    pub data_to_world: DMat4,
}

impl<'a> ImageSlice<'a> {
    pub fn new(volume: &'a ImageVolume, property: &'a ImageProperty) -> Self {
        Self {
            volume,
            property: Some(property),
            data_to_world: DMat4::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_data_to_world(mut self, matrix: DMat4) -> Self {
        self.data_to_world = matrix;
        self
    }
}

/// Geometry inputs shared by every polygon of one leaf.
struct SliceFrame<'a> {
    extent: &'a Extent,
    orientation: Orientation,
    transform: &'a WorldTransform,
    border: bool,
    texture_size: TextureSize,
}

/// Renders a single slice of an [`ImageVolume`] through a [`RenderBackend`].
///
/// The mapper keeps the last texture load stamp and its three polygon meshes
/// (image, backing, background) between renders, so a render with unchanged
/// inputs draws without re-uploading the texture.
#[derive(Debug, Default)]
pub struct ImageSliceMapper {
    options: MapperOptions,
    points: Option<Vec<DVec3>>,
    revision: Revision,
    texture_key: TextureKey,
    cache: TextureCache,
    transform: WorldTransform,
    last_display_extent: Option<Extent>,
    image_mesh: PolygonBuffer,
    backing_mesh: PolygonBuffer,
    background_mesh: PolygonBuffer,
}

fn update<T: PartialEq>(revision: &mut Revision, field: &mut T, value: T) {
    if *field != value {
        *field = value;
        revision.bump();
    }
}

impl ImageSliceMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MapperOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// Replaces all options at once.
    pub fn set_options(&mut self, options: MapperOptions) {
        update(&mut self.revision, &mut self.options, options);
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        update(&mut self.revision, &mut self.options.orientation, orientation);
    }

    pub fn set_slice_number(&mut self, slice_number: i32) {
        update(&mut self.revision, &mut self.options.slice_number, slice_number);
    }

    pub fn set_cropping(&mut self, cropping: Option<Extent>) {
        update(&mut self.revision, &mut self.options.cropping, cropping);
    }

    pub fn set_border(&mut self, border: bool) {
        update(&mut self.revision, &mut self.options.border, border);
    }

    pub fn set_background(&mut self, background: bool) {
        update(&mut self.revision, &mut self.options.background, background);
    }

    pub fn set_pass_color_data(&mut self, pass: bool) {
        update(&mut self.revision, &mut self.options.pass_color_data, pass);
    }

    pub fn set_exact_pixel_match(&mut self, exact: bool) {
        update(&mut self.revision, &mut self.options.exact_pixel_match, exact);
    }

    pub fn set_slice_faces_camera(&mut self, faces: bool) {
        update(&mut self.revision, &mut self.options.slice_faces_camera, faces);
    }

    pub fn set_depth_enable(&mut self, enabled: bool) {
        update(&mut self.revision, &mut self.options.depth_enable, enabled);
    }

    pub fn set_color_enable(&mut self, enabled: bool) {
        update(&mut self.revision, &mut self.options.color_enable, enabled);
    }

    pub fn set_matte_enable(&mut self, enabled: bool) {
        update(&mut self.revision, &mut self.options.matte_enable, enabled);
    }

    /// The polygon drawn instead of the full slice quad, if any.
    pub fn points(&self) -> Option<&[DVec3]> {
        self.points.as_deref()
    }

    /// Sets a convex polygon, in data coordinates on the slice plane, to draw
    /// instead of the slice quad. An empty polygon draws nothing.
    pub fn set_points(&mut self, points: Option<Vec<DVec3>>) {
        update(&mut self.revision, &mut self.points, points);
    }

    /// The backend texture slot this mapper uploads to and draws from.
    pub fn texture_key(&self) -> TextureKey {
        self.texture_key
    }

    /// Revision stamp, changed by every setter that alters a value.
    pub fn stamp(&self) -> Stamp {
        self.revision.stamp()
    }

    /// Size of the last loaded texture.
    pub fn texture_size(&self) -> TextureSize {
        self.cache.texture_size()
    }

    /// Bytes per pixel of the last loaded texture.
    pub fn texture_bytes_per_pixel(&self) -> usize {
        self.cache.bytes_per_pixel()
    }

    /// In-plane axes and texture size for `extent` at the current orientation.
    pub fn compute_texture_size(&self, extent: &Extent) -> (usize, usize, TextureSize) {
        texture::compute_texture_size(extent, self.options.orientation)
    }

    /// The region of `volume` that is displayed: the whole extent pinned to the
    /// slice number along the orientation axis, then cropped.
    ///
    /// The slice number is clamped into the volume. The result is empty when the
    /// cropping region misses the slice.
    pub fn display_extent(&self, volume: &ImageVolume) -> Extent {
        let whole = volume.extent();
        let axis = self.options.orientation.axis();
        let (lo, hi) = whole.axis(axis);
        let slice = self.options.slice_number.clamp(lo, hi);
        let pinned = whole.with_axis(axis, slice, slice);
        match self.options.cropping {
            Some(crop) => pinned.intersect(&crop),
            None => pinned,
        }
    }

    /// The extent, orientation and slice number a render of `volume` would use.
    pub fn slice_request(&self, volume: &ImageVolume) -> SliceRequest {
        SliceRequest {
            extent: self.display_extent(volume),
            orientation: self.options.orientation,
            slice_number: self.options.slice_number,
        }
    }

    /// The display extent used by the last render.
    pub fn last_display_extent(&self) -> Option<Extent> {
        self.last_display_extent
    }

    /// Draws the slice. Failures are logged; the affected draw is skipped.
    pub fn render(&mut self, backend: &mut dyn RenderBackend, slice: &ImageSlice<'_>) {
        let Some(property) = slice.property else {
            log::warn!("image slice has no property; nothing to render");
            return;
        };
        let volume = slice.volume;

        self.transform = *volume.transform();
        let SliceRequest { extent, orientation, .. } = self.slice_request(volume);
        self.last_display_extent = Some(extent);
        if extent.is_empty() {
            log::debug!("display extent {:?} is empty; nothing to render", extent.0);
            return;
        }

        let MapperOptions {
            depth_enable,
            color_enable,
            matte_enable,
            background,
            ..
        } = self.options;
        let color_masked = !color_enable && !matte_enable;

        backend.set_depth_write(depth_enable);
        if color_masked {
            backend.set_color_write(false);
        }

        let backing = property.backing();
        if backing && (matte_enable || (depth_enable && !color_enable)) {
            let material = DrawMaterial {
                color: property.backing_color(),
                opacity: 1.0,
                ambient: property.ambient(),
                diffuse: property.diffuse(),
            };
            let (_, _, texture_size) = self.compute_texture_size(&extent);
            let frame = SliceFrame {
                extent: &extent,
                orientation,
                transform: &self.transform,
                border: self.options.border,
                texture_size,
            };
            let points = self.points.as_deref();
            if update_polygon(&mut self.backing_mesh, points, &frame, false) {
                submit(
                    backend,
                    &DrawCall {
                        layer: DrawLayer::Backing,
                        mesh: &self.backing_mesh,
                        material,
                        texture: None,
                        model: slice.data_to_world,
                    },
                );
            }
            if background {
                self.draw_background(backend, property, &extent, true, slice.data_to_world);
            }
        }

        if color_enable || (!backing && depth_enable) {
            for leaf in partition(extent, orientation, backend.max_texture_size()) {
                self.render_leaf(backend, property, volume, &leaf, slice.data_to_world);
            }
        }

        backend.set_depth_write(true);
        if color_masked {
            backend.set_color_write(true);
        }
    }

    /// Releases the texture held by `backend` and forgets the load state.
    /// Safe to call repeatedly and before any render.
    pub fn release_resources(&mut self, backend: &mut dyn RenderBackend) {
        backend.release(self.texture_key);
        self.cache.invalidate();
    }

    fn render_leaf(
        &mut self,
        backend: &mut dyn RenderBackend,
        property: &ImageProperty,
        volume: &ImageVolume,
        leaf: &Leaf,
        model: DMat4,
    ) {
        let pass_color_data = self.options.pass_color_data;
        let stamp = LoadStamp {
            context: backend.context_id(),
            context_generation: backend.context_generation(),
            mapper: self.revision.stamp(),
            property: Some(property.stamp()),
            table: if pass_color_data {
                None
            } else {
                property.table_stamp()
            },
            volume: volume.stamp(),
        };

        let decision = self.cache.check(
            &stamp,
            self.options.orientation,
            self.options.slice_number,
            leaf.recursive,
        );

        if decision.reload {
            let texture_property = if pass_color_data { None } else { Some(property) };
            let data = build_pixels(
                volume,
                texture_property,
                &leaf.extent,
                self.options.orientation,
                self.cache.texture(),
                decision.context_unchanged,
            );
            let filter = if property.interpolation() == Interpolation::Nearest && !self.options.exact_pixel_match {
                Filter::Nearest
            } else {
                Filter::Linear
            };
            let state = TextureState {
                size: data.size,
                bytes_per_pixel: data.bytes_per_pixel,
            };

            log::debug!(
                "loading {}x{} texture ({} bytes/pixel, shared input: {}, in place: {})",
                data.size.width,
                data.size.height,
                data.bytes_per_pixel,
                data.reused_input(),
                data.reuse_texture
            );

            let image = TextureImage {
                pixels: data.pixels,
                size: data.size,
                bytes_per_pixel: data.bytes_per_pixel,
                filter,
                reuse_texture: data.reuse_texture,
            };
            if let Err(err) = backend.upload_texture(self.texture_key, image) {
                log::error!("texture upload failed: {err}");
                self.cache.invalidate();
                return;
            }
            self.cache.mark_loaded(stamp, state);
        }

        let use_points = !(self.options.exact_pixel_match && self.options.slice_faces_camera);
        let frame = SliceFrame {
            extent: &leaf.extent,
            orientation: self.options.orientation,
            transform: &self.transform,
            border: self.options.border,
            texture_size: self.cache.texture_size(),
        };
        let points = if use_points { self.points.as_deref() } else { None };
        if update_polygon(&mut self.image_mesh, points, &frame, true) {
            submit(
                backend,
                &DrawCall {
                    layer: DrawLayer::Image,
                    mesh: &self.image_mesh,
                    material: DrawMaterial {
                        color: DVec3::ONE,
                        opacity: property.opacity(),
                        ambient: property.ambient(),
                        diffuse: property.diffuse(),
                    },
                    texture: Some(self.texture_key),
                    model,
                },
            );
        }

        if self.options.background {
            self.draw_background(backend, property, &leaf.extent, use_points, model);
        }
    }

    fn draw_background(
        &mut self,
        backend: &mut dyn RenderBackend,
        property: &ImageProperty,
        extent: &Extent,
        use_points: bool,
        model: DMat4,
    ) {
        let [r, g, b, _] = property.background_color();
        let material = DrawMaterial {
            color: DVec3::new(r, g, b),
            opacity: 1.0,
            ambient: property.ambient(),
            diffuse: property.diffuse(),
        };
        let (_, _, texture_size) = self.compute_texture_size(extent);
        let frame = SliceFrame {
            extent,
            orientation: self.options.orientation,
            transform: &self.transform,
            border: self.options.border,
            texture_size,
        };
        let points = if use_points { self.points.as_deref() } else { None };
        if update_background(&mut self.background_mesh, points, &frame) {
            submit(
                backend,
                &DrawCall {
                    layer: DrawLayer::Background,
                    mesh: &self.background_mesh,
                    material,
                    texture: None,
                    model,
                },
            );
        }
    }
}

/// Refreshes `mesh` with the polygon (or the slice quad when `points` is
/// `None`). Returns `false` when there is nothing to draw.
fn update_polygon(mesh: &mut PolygonBuffer, points: Option<&[DVec3]>, frame: &SliceFrame<'_>, textured: bool) -> bool {
    match points {
        None => {
            let quad = texture_quad(
                frame.extent,
                frame.orientation,
                frame.transform,
                frame.border,
                frame.texture_size,
            );
            let tcoords = textured.then(|| quad.tcoords.to_vec());
            mesh.update(Topology::Fan(4), quad.points.to_vec(), tcoords);
            true
        }
        Some([]) => false,
        Some(points) => {
            let tcoords = textured.then(|| {
                polygon_tcoords(
                    points,
                    frame.extent,
                    frame.orientation,
                    frame.transform,
                    frame.texture_size,
                )
            });
            mesh.update(Topology::Fan(points.len()), points.to_vec(), tcoords);
            !mesh.triangles().is_empty()
        }
    }
}

/// Refreshes `mesh` with the border ring around the polygon or slice quad.
fn update_background(mesh: &mut PolygonBuffer, points: Option<&[DVec3]>, frame: &SliceFrame<'_>) -> bool {
    match points {
        None => {
            let quad = texture_quad(
                frame.extent,
                frame.orientation,
                frame.transform,
                frame.border,
                frame.texture_size,
            );
            mesh.update(
                Topology::QuadBorder,
                quad_border(&quad, frame.orientation, frame.transform),
                None,
            );
            true
        }
        Some(points) if points.len() < 3 => false,
        Some(points) => {
            mesh.update(
                Topology::PolygonBorder(points.len()),
                polygon_border(points, frame.orientation, frame.transform),
                None,
            );
            true
        }
    }
}

fn submit(backend: &mut dyn RenderBackend, call: &DrawCall<'_>) {
    if let Err(err) = backend.draw(call) {
        log::error!("drawing {:?} polygon failed: {err}", call.layer);
    }
}

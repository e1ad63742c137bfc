//! The graphics backend interface and an in-memory recording backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{DMat4, DVec2, DVec3};

use crate::error::{Result, SliceError};
use crate::extent::TextureSize;
use crate::geometry::PolygonBuffer;
use crate::texture::{Filter, TextureImage};

/// Identifies a rendering context. Textures never survive a change of context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextId(pub u64);

static NEXT_TEXTURE_KEY: AtomicU64 = AtomicU64::new(1);

/// Names the texture slot a mapper owns on a backend.
///
/// Every key from [`TextureKey::new`] (or `Default`) is distinct, so mappers
/// sharing a backend never see each other's textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey(u64);

impl TextureKey {
    pub fn new() -> Self {
        Self(NEXT_TEXTURE_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TextureKey {
    fn default() -> Self {
        Self::new()
    }
}

/// Which of the mapper's polygons a draw call renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawLayer {
    /// The textured image slice.
    Image,
    /// Opaque polygon behind the slice.
    Backing,
    /// Wide border around the slice.
    Background,
}

/// Flat surface settings for a draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawMaterial {
    pub color: DVec3,
    pub opacity: f64,
    pub ambient: f64,
    pub diffuse: f64,
}

impl Default for DrawMaterial {
    fn default() -> Self {
        Self {
            color: DVec3::ONE,
            opacity: 1.0,
            ambient: 1.0,
            diffuse: 0.0,
        }
    }
}

/// One polygon to draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub layer: DrawLayer,
    pub mesh: &'a PolygonBuffer,
    pub material: DrawMaterial,
    /// Texture sampled at the mesh's texture coordinates; `None` draws flat.
    pub texture: Option<TextureKey>,
    /// Data-to-world matrix applied to the mesh points.
    pub model: DMat4,
}

impl DrawCall<'_> {
    pub fn textured(&self) -> bool {
        self.texture.is_some()
    }
}

/// Low-level drawing operations the mapper relies on.
pub trait RenderBackend {
    /// The context textures are currently created in.
    fn context_id(&self) -> ContextId;

    /// Incremented whenever the context is recreated.
    fn context_generation(&self) -> u64;

    /// Largest supported texture edge, in pixels.
    fn max_texture_size(&self) -> u32;

    /// Replaces the texture stored under `key`. The backend owns the pixels
    /// until the next upload to that key or [`release`](Self::release).
    fn upload_texture(&mut self, key: TextureKey, texture: TextureImage) -> Result<()>;

    /// Draws a mesh with the current depth and color write state.
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;

    fn set_depth_write(&mut self, enabled: bool);

    fn set_color_write(&mut self, enabled: bool);

    /// Drops the texture stored under `key`. Other keys are untouched.
    fn release(&mut self, key: TextureKey);
}

/// Summary of a texture upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub key: TextureKey,
    pub size: TextureSize,
    pub bytes_per_pixel: usize,
    pub filter: Filter,
    pub reuse_texture: bool,
    /// The pixels were a view of the input scalars.
    pub shared: bool,
    pub pixels: Vec<u8>,
}

/// Copy of a draw call's mesh and settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub layer: DrawLayer,
    pub points: Vec<DVec3>,
    pub tcoords: Option<Vec<DVec2>>,
    pub triangles: Vec<[u32; 3]>,
    pub material: DrawMaterial,
    pub textured: bool,
    pub texture: Option<TextureKey>,
    /// Pixels of the texture bound for this draw.
    pub texture_pixels: Option<Vec<u8>>,
    pub model: DMat4,
    pub depth_write: bool,
    pub color_write: bool,
}

/// Something a [`RecordingBackend`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Upload(UploadRecord),
    Draw(DrawRecord),
    DepthWrite(bool),
    ColorWrite(bool),
    Release(TextureKey),
}

/// Backend that records every call instead of drawing.
#[derive(Debug)]
pub struct RecordingBackend {
    context: ContextId,
    generation: u64,
    max_texture_size: u32,
    depth_write: bool,
    color_write: bool,
    textures: HashMap<TextureKey, TextureImage>,
    fail_uploads: bool,
    events: Vec<BackendEvent>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(16384)
    }
}

impl RecordingBackend {
    pub fn new(max_texture_size: u32) -> Self {
        Self {
            context: ContextId(1),
            generation: 0,
            max_texture_size,
            depth_write: true,
            color_write: true,
            textures: HashMap::new(),
            fail_uploads: false,
            events: Vec::new(),
        }
    }

    /// Switches to another context, dropping every texture.
    pub fn set_context(&mut self, context: ContextId) {
        self.context = context;
        self.textures.clear();
    }

    /// Simulates the context being recreated.
    pub fn recreate_context(&mut self) {
        self.generation += 1;
        self.textures.clear();
    }

    pub fn set_max_texture_size(&mut self, size: u32) {
        self.max_texture_size = size;
    }

    /// Makes every following upload fail.
    pub fn set_fail_uploads(&mut self, fail: bool) {
        self.fail_uploads = fail;
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    /// Returns and clears the recorded events.
    pub fn take_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn uploads(&self) -> impl Iterator<Item = &UploadRecord> {
        self.events.iter().filter_map(|e| match e {
            BackendEvent::Upload(u) => Some(u),
            _ => None,
        })
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.events.iter().filter_map(|e| match e {
            BackendEvent::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// The texture held under `key`.
    pub fn texture(&self, key: TextureKey) -> Option<&TextureImage> {
        self.textures.get(&key)
    }

    /// Number of textures held.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl RenderBackend for RecordingBackend {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn context_generation(&self) -> u64 {
        self.generation
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn upload_texture(&mut self, key: TextureKey, texture: TextureImage) -> Result<()> {
        if self.fail_uploads {
            return Err(SliceError::Backend("texture upload rejected".to_string()));
        }
        self.events.push(BackendEvent::Upload(UploadRecord {
            key,
            size: texture.size,
            bytes_per_pixel: texture.bytes_per_pixel,
            filter: texture.filter,
            reuse_texture: texture.reuse_texture,
            shared: texture.pixels.is_shared(),
            pixels: texture.pixels.to_vec(),
        }));
        self.textures.insert(key, texture);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        let texture_pixels = match call.texture {
            Some(key) => match self.textures.get(&key) {
                Some(texture) => Some(texture.pixels.to_vec()),
                None => return Err(SliceError::Backend(format!("textured draw without a texture for {key:?}"))),
            },
            None => None,
        };
        self.events.push(BackendEvent::Draw(DrawRecord {
            layer: call.layer,
            points: call.mesh.points().to_vec(),
            tcoords: call.mesh.tcoords().map(<[DVec2]>::to_vec),
            triangles: call.mesh.triangles().to_vec(),
            material: call.material,
            textured: call.textured(),
            texture: call.texture,
            texture_pixels,
            model: call.model,
            depth_write: self.depth_write,
            color_write: self.color_write,
        }));
        Ok(())
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
        self.events.push(BackendEvent::DepthWrite(enabled));
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.color_write = enabled;
        self.events.push(BackendEvent::ColorWrite(enabled));
    }

    fn release(&mut self, key: TextureKey) {
        self.textures.remove(&key);
        self.events.push(BackendEvent::Release(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Topology;
    use crate::texture::PixelBuffer;

    fn image() -> TextureImage {
        TextureImage {
            pixels: PixelBuffer::Owned(vec![1, 2, 3, 4]),
            size: TextureSize::new(2, 2),
            bytes_per_pixel: 1,
            filter: Filter::Linear,
            reuse_texture: false,
        }
    }

    #[test]
    fn test_records_uploads_and_draws() {
        let mut backend = RecordingBackend::default();
        let key = TextureKey::new();
        backend.upload_texture(key, image()).unwrap();

        let mut mesh = PolygonBuffer::new();
        mesh.update(Topology::Fan(4), vec![DVec3::ZERO; 4], Some(vec![DVec2::ZERO; 4]));
        backend.set_depth_write(false);
        backend
            .draw(&DrawCall {
                layer: DrawLayer::Image,
                mesh: &mesh,
                material: DrawMaterial::default(),
                texture: Some(key),
                model: DMat4::IDENTITY,
            })
            .unwrap();

        assert_eq!(backend.uploads().count(), 1);
        let draw = backend.draws().next().unwrap();
        assert_eq!(draw.triangles.len(), 2);
        assert_eq!(draw.texture_pixels.as_deref(), Some(&[1, 2, 3, 4][..]));
        assert!(!draw.depth_write);
        assert!(draw.color_write);
    }

    #[test]
    fn test_release_drops_only_its_texture() {
        let mut backend = RecordingBackend::default();
        let (a, b) = (TextureKey::new(), TextureKey::new());
        assert_ne!(a, b);
        backend.upload_texture(a, image()).unwrap();
        backend.upload_texture(b, image()).unwrap();
        assert_eq!(backend.texture_count(), 2);
        backend.release(a);
        backend.release(a);
        assert!(backend.texture(a).is_none());
        assert!(backend.texture(b).is_some());
    }

    #[test]
    fn test_failed_upload_is_an_error() {
        let mut backend = RecordingBackend::default();
        backend.set_fail_uploads(true);
        assert!(matches!(
            backend.upload_texture(TextureKey::new(), image()),
            Err(SliceError::Backend(_))
        ));
        assert!(backend.events().is_empty());
    }
}

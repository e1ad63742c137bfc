//! Texture reload decisions.

use crate::backend::ContextId;
use crate::extent::{Orientation, TextureSize};
use crate::revision::Stamp;
use crate::texture_data::TextureState;

/// Everything a loaded texture was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStamp {
    pub context: ContextId,
    pub context_generation: u64,
    pub mapper: Stamp,
    pub property: Option<Stamp>,
    pub table: Option<Stamp>,
    pub volume: Stamp,
}

impl LoadStamp {
    /// Whether the rendering context is the one the texture was loaded into.
    pub fn same_context(&self, other: &LoadStamp) -> bool {
        self.context == other.context && self.context_generation == other.context_generation
    }
}

/// Outcome of a cache check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadDecision {
    pub reload: bool,
    /// The device texture from the last load is still valid.
    pub context_unchanged: bool,
}

/// Tracks what the current texture was built from.
#[derive(Debug, Clone, Default)]
pub struct TextureCache {
    loaded: Option<LoadStamp>,
    last_orientation: Option<Orientation>,
    last_slice: Option<i32>,
    texture: Option<TextureState>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether the texture must be rebuilt for the given inputs.
    ///
    /// Orientation and slice are remembered on every call, so a change forces
    /// exactly one reload. Recursive (subdivided) pieces always reload.
    pub fn check(
        &mut self,
        current: &LoadStamp,
        orientation: Orientation,
        slice: i32,
        recursive: bool,
    ) -> ReloadDecision {
        let orientation_changed = self.last_orientation != Some(orientation);
        self.last_orientation = Some(orientation);
        let slice_changed = self.last_slice != Some(slice);
        self.last_slice = Some(slice);

        let context_unchanged = self
            .loaded
            .as_ref()
            .is_some_and(|loaded| loaded.same_context(current));

        let reload = self.loaded.as_ref() != Some(current)
            || orientation_changed
            || slice_changed
            || recursive;

        ReloadDecision {
            reload,
            context_unchanged,
        }
    }

    /// Records a completed upload.
    pub fn mark_loaded(&mut self, stamp: LoadStamp, texture: TextureState) {
        self.loaded = Some(stamp);
        self.texture = Some(texture);
    }

    /// Forgets the loaded texture so the next check reloads.
    pub fn invalidate(&mut self) {
        self.loaded = None;
        self.texture = None;
    }

    /// Size and format of the texture last loaded.
    pub fn texture(&self) -> Option<TextureState> {
        self.texture
    }

    pub fn texture_size(&self) -> TextureSize {
        self.texture.map(|t| t.size).unwrap_or_default()
    }

    /// Bytes per pixel of the last texture (1 before any load).
    pub fn bytes_per_pixel(&self) -> usize {
        self.texture.map_or(1, |t| t.bytes_per_pixel)
    }
}

//! Display properties of an image slice.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::lookup_table::LookupTable;
use crate::revision::{Revision, Stamp};

/// Texture sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Interpolation {
    /// Nearest-neighbor sampling (blocky pixels).
    Nearest,
    /// Bilinear sampling.
    #[default]
    Linear,
}

/// Color, lighting and backing settings used when drawing a slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProperty {
    color_window: f64,
    color_level: f64,
    lookup_table: Option<LookupTable>,
    use_lookup_table_scalar_range: bool,
    opacity: f64,
    ambient: f64,
    diffuse: f64,
    interpolation: Interpolation,
    backing: bool,
    backing_color: DVec3,
    #[serde(skip)]
    revision: Revision,
}

impl Default for ImageProperty {
    fn default() -> Self {
        Self {
            color_window: 255.0,
            color_level: 127.5,
            lookup_table: None,
            use_lookup_table_scalar_range: true,
            opacity: 1.0,
            ambient: 1.0,
            diffuse: 0.0,
            interpolation: Interpolation::Linear,
            backing: false,
            backing_color: DVec3::ZERO,
            revision: Revision::new(),
        }
    }
}

impl ImageProperty {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_lookup_table`](Self::set_lookup_table).
    #[must_use]
    pub fn with_lookup_table(mut self, table: LookupTable) -> Self {
        self.set_lookup_table(Some(table));
        self
    }

    pub fn color_window(&self) -> f64 {
        self.color_window
    }

    pub fn color_level(&self) -> f64 {
        self.color_level
    }

    /// Sets the window width and center used for grayscale mapping.
    pub fn set_window_level(&mut self, window: f64, level: f64) {
        self.color_window = window;
        self.color_level = level;
        self.revision.bump();
    }

    /// Whether window/level are at the values that pass `u8` data through unchanged.
    pub fn is_identity_window_level(&self) -> bool {
        (self.color_window - 255.0).abs() < f64::EPSILON
            && (self.color_level - 127.5).abs() < f64::EPSILON
    }

    /// Scalar range `[level - window/2, level + window/2]`.
    pub fn window_range(&self) -> (f64, f64) {
        let half = 0.5 * self.color_window;
        (self.color_level - half, self.color_level + half)
    }

    pub fn lookup_table(&self) -> Option<&LookupTable> {
        self.lookup_table.as_ref()
    }

    /// Mutable access to the table; the table tracks its own modifications.
    pub fn lookup_table_mut(&mut self) -> Option<&mut LookupTable> {
        self.lookup_table.as_mut()
    }

    pub fn set_lookup_table(&mut self, table: Option<LookupTable>) {
        self.lookup_table = table;
        self.revision.bump();
    }

    pub fn use_lookup_table_scalar_range(&self) -> bool {
        self.use_lookup_table_scalar_range
    }

    /// When off, the table is applied over the window/level range instead of its own.
    pub fn set_use_lookup_table_scalar_range(&mut self, enabled: bool) {
        self.use_lookup_table_scalar_range = enabled;
        self.revision.bump();
    }

    /// Range the lookup table is applied over.
    pub fn effective_table_range(&self) -> Option<(f64, f64)> {
        let table = self.lookup_table.as_ref()?;
        Some(if self.use_lookup_table_scalar_range {
            table.range()
        } else {
            self.window_range()
        })
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.revision.bump();
    }

    pub fn ambient(&self) -> f64 {
        self.ambient
    }

    pub fn diffuse(&self) -> f64 {
        self.diffuse
    }

    pub fn set_lighting(&mut self, ambient: f64, diffuse: f64) {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.revision.bump();
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
        self.revision.bump();
    }

    pub fn backing(&self) -> bool {
        self.backing
    }

    /// Enables an opaque polygon drawn behind the slice.
    pub fn set_backing(&mut self, backing: bool) {
        self.backing = backing;
        self.revision.bump();
    }

    pub fn backing_color(&self) -> DVec3 {
        self.backing_color
    }

    pub fn set_backing_color(&mut self, color: DVec3) {
        self.backing_color = color;
        self.revision.bump();
    }

    /// Color used for the background border: the table color at the low end of
    /// its effective range, or opaque black without a table.
    pub fn background_color(&self) -> [f64; 4] {
        match (self.lookup_table.as_ref(), self.effective_table_range()) {
            (Some(table), Some(range)) => {
                let c = table.map_scalar_in_range(range.0, range);
                [
                    f64::from(c[0]) / 255.0,
                    f64::from(c[1]) / 255.0,
                    f64::from(c[2]) / 255.0,
                    f64::from(c[3]) / 255.0,
                ]
            }
            _ => [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Stamp of the property itself.
    pub fn stamp(&self) -> Stamp {
        self.revision.stamp()
    }

    /// Stamp of the attached lookup table, if any.
    pub fn table_stamp(&self) -> Option<Stamp> {
        self.lookup_table.as_ref().map(LookupTable::stamp)
    }
}

//! Scalar-to-color lookup tables.

use serde::{Deserialize, Serialize};

use crate::color_map::ColorMap;
use crate::error::{Result, SliceError};
use crate::revision::{Revision, Stamp};

/// Maps scalar values to RGBA bytes by indexing a table spread over a scalar range.
///
/// Values below the range take the first entry, values above the last; NaN takes
/// the NaN color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTable {
    range: (f64, f64),
    entries: Vec<[u8; 4]>,
    nan_color: [u8; 4],
    #[serde(skip)]
    revision: Revision,
}

impl LookupTable {
    /// Creates a table from explicit entries.
    pub fn new(range: (f64, f64), entries: Vec<[u8; 4]>) -> Result<Self> {
        if entries.is_empty() {
            return Err(SliceError::EmptyLookupTable);
        }
        Ok(Self {
            range,
            entries,
            nan_color: [128, 0, 0, 255],
            revision: Revision::new(),
        })
    }

    /// Creates a table with `num_entries` opaque entries sampled from `map`.
    pub fn from_color_map(map: &ColorMap, range: (f64, f64), num_entries: usize) -> Result<Self> {
        let denom = num_entries.saturating_sub(1).max(1) as f32;
        let entries = (0..num_entries)
            .map(|i| map.sample_rgba8(i as f32 / denom))
            .collect();
        Self::new(range, entries)
    }

    /// Creates a 256-entry grayscale ramp.
    pub fn grayscale(range: (f64, f64)) -> Self {
        let entries = (0..=255u8).map(|v| [v, v, v, 255]).collect();
        Self {
            range,
            entries,
            nan_color: [128, 0, 0, 255],
            revision: Revision::new(),
        }
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn set_range(&mut self, min: f64, max: f64) {
        self.range = (min, max);
        self.revision.bump();
    }

    pub fn entries(&self) -> &[[u8; 4]] {
        &self.entries
    }

    /// Replaces one entry. Out-of-range indices are ignored.
    pub fn set_entry(&mut self, index: usize, color: [u8; 4]) {
        if let Some(entry) = self.entries.get_mut(index) {
            *entry = color;
            self.revision.bump();
        }
    }

    pub fn nan_color(&self) -> [u8; 4] {
        self.nan_color
    }

    pub fn set_nan_color(&mut self, color: [u8; 4]) {
        self.nan_color = color;
        self.revision.bump();
    }

    /// Whether any entry is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.entries.iter().any(|c| c[3] != 255) || self.nan_color[3] != 255
    }

    pub fn stamp(&self) -> Stamp {
        self.revision.stamp()
    }

    /// Table index for `value` over `range`.
    pub fn index_for(&self, value: f64, range: (f64, f64)) -> usize {
        let n = self.entries.len();
        let (lo, hi) = range;
        if hi <= lo {
            return if value > lo { n - 1 } else { 0 };
        }
        let scaled = ((value - lo) * (n as f64 / (hi - lo))).floor();
        if scaled <= 0.0 {
            0
        } else {
            (scaled as usize).min(n - 1)
        }
    }

    /// Maps a scalar using the table's own range.
    pub fn map_scalar(&self, value: f64) -> [u8; 4] {
        self.map_scalar_in_range(value, self.range)
    }

    /// Maps a scalar using an explicit range (e.g. one derived from window/level).
    pub fn map_scalar_in_range(&self, value: f64, range: (f64, f64)) -> [u8; 4] {
        if value.is_nan() {
            return self.nan_color;
        }
        self.entries[self.index_for(value, range)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_map::ColorMapRegistry;

    #[test]
    fn test_index_clamping() {
        let table = LookupTable::grayscale((0.0, 255.0));
        assert_eq!(table.map_scalar(-10.0), [0, 0, 0, 255]);
        assert_eq!(table.map_scalar(0.0), [0, 0, 0, 255]);
        assert_eq!(table.map_scalar(100.0), [100, 100, 100, 255]);
        assert_eq!(table.map_scalar(255.0), [255, 255, 255, 255]);
        assert_eq!(table.map_scalar(1e9), [255, 255, 255, 255]);
        assert_eq!(table.map_scalar(f64::NAN), table.nan_color());
    }

    #[test]
    fn test_degenerate_range() {
        let table = LookupTable::grayscale((5.0, 5.0));
        assert_eq!(table.index_for(4.0, table.range()), 0);
        assert_eq!(table.index_for(5.0, table.range()), 0);
        assert_eq!(table.index_for(6.0, table.range()), 255);
    }

    #[test]
    fn test_from_color_map() {
        let registry = ColorMapRegistry::new();
        let table =
            LookupTable::from_color_map(registry.require("grays").unwrap(), (0.0, 1.0), 256)
                .unwrap();
        assert_eq!(table.entries().len(), 256);
        assert_eq!(table.entries()[0], [0, 0, 0, 255]);
        assert_eq!(table.entries()[255], [255, 255, 255, 255]);
        assert!(!table.has_alpha());
        assert!(matches!(
            LookupTable::new((0.0, 1.0), Vec::new()),
            Err(SliceError::EmptyLookupTable)
        ));
    }

    #[test]
    fn test_mutation_bumps_stamp() {
        let mut table = LookupTable::grayscale((0.0, 1.0));
        let s = table.stamp();
        table.set_entry(3, [1, 2, 3, 4]);
        assert_ne!(s, table.stamp());
        assert!(table.has_alpha());
        let s = table.stamp();
        table.set_entry(1000, [0; 4]);
        assert_eq!(s, table.stamp());
    }
}

//! Configuration options for the slice mapper.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extent::{Extent, Orientation};

/// Settings controlling which slice is shown and how it is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperOptions {
    /// Index axis the slice is taken through.
    pub orientation: Orientation,

    /// Index of the slice along the orientation axis.
    pub slice_number: i32,

    /// Restricts the displayed region (intersected with the whole extent).
    pub cropping: Option<Extent>,

    /// Draw edge pixels in full instead of to the outer pixel edge.
    pub border: bool,

    /// Draw a wide border around the slice in the lowest lookup table color.
    pub background: bool,

    /// Upload scalars as colors, ignoring the property's lookup table.
    pub pass_color_data: bool,

    /// Screen pixels coincide with image pixels; disables nearest filtering.
    pub exact_pixel_match: bool,

    /// The slice plane is perpendicular to the view direction.
    pub slice_faces_camera: bool,

    /// Write to the depth buffer.
    pub depth_enable: bool,

    /// Write to the color buffer.
    pub color_enable: bool,

    /// Draw the backing polygon (when the property enables backing).
    pub matte_enable: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Z,
            slice_number: 0,
            cropping: None,
            border: false,
            background: false,
            pass_color_data: false,
            exact_pixel_match: false,
            slice_faces_camera: false,
            depth_enable: true,
            color_enable: true,
            matte_enable: true,
        }
    }
}

impl MapperOptions {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = MapperOptions::from_json(r#"{ "orientation": "X", "slice_number": 7 }"#).unwrap();
        assert_eq!(options.orientation, Orientation::X);
        assert_eq!(options.slice_number, 7);
        assert!(options.color_enable);
        assert!(options.cropping.is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let options = MapperOptions {
            cropping: Some(Extent::new(1, 5, 2, 8, 0, 3)),
            border: true,
            background: true,
            ..MapperOptions::default()
        };
        let json = options.to_json().unwrap();
        assert_eq!(MapperOptions::from_json(&json).unwrap(), options);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(MapperOptions::from_json("{ \"slice_number\": \"five\" }").is_err());
    }
}

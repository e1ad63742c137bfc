#![allow(clippy::cast_precision_loss)]
//! Demo rendering slices of a synthetic volume to PNG files.
//!
//! Demonstrates:
//! - Axis-aligned slices in all three orientations through a lookup table
//! - Window/level display without a lookup table
//! - A cropped slice with a background border
//! - A polygon slice on a rotated volume
//! - Mapper options loaded from JSON
//!
//! Run with `RUST_LOG=slicetex_core=debug` to see texture reloads.

use slicetex::*;

const SIZE: usize = 64;

/// Distance from the volume center, with a ripple so slices differ.
fn sphere_field() -> Vec<f32> {
    let c = (SIZE - 1) as f32 * 0.5;
    let mut values = Vec::with_capacity(SIZE * SIZE * SIZE);
    for k in 0..SIZE {
        for j in 0..SIZE {
            for i in 0..SIZE {
                let (x, y, z) = (i as f32 - c, j as f32 - c, k as f32 - c);
                let r = (x * x + y * y + z * z).sqrt();
                values.push(r + 4.0 * (x * 0.3).sin());
            }
        }
    }
    values
}

fn main() -> Result<()> {
    init_logging();

    let volume = ImageVolume::from_dims([SIZE, SIZE, SIZE], sphere_field())?;
    let registry = ColorMapRegistry::new();
    let table = LookupTable::from_color_map(registry.require("viridis")?, (0.0, 56.0), 256)?;
    let property = ImageProperty::new().with_lookup_table(table);

    // --- Axis-aligned slices ---
    let mut mapper = ImageSliceMapper::new();
    mapper.set_slice_number(SIZE as i32 / 2);
    for orientation in Orientation::ALL {
        mapper.set_orientation(orientation);
        let filename = format!("slice_{orientation:?}.png").to_lowercase();
        render_to_file(&mut mapper, &ImageSlice::new(&volume, &property), &filename, 512, 512)?;
        println!("wrote {filename}");
    }

    // --- Window/level without a lookup table ---
    let mut gray = ImageProperty::new();
    gray.set_window_level(40.0, 30.0);
    gray.set_interpolation(Interpolation::Nearest);
    render_to_file(&mut mapper, &ImageSlice::new(&volume, &gray), "slice_window_level.png", 512, 512)?;
    println!("wrote slice_window_level.png");

    // --- Cropped slice with a background border, configured from JSON ---
    let options = MapperOptions::from_json(
        r#"{
            "orientation": "Z",
            "slice_number": 20,
            "cropping": [8, 40, 16, 48, 0, 63],
            "background": true
        }"#,
    )?;
    let mut cropped = ImageSliceMapper::with_options(options);
    render_to_file(&mut cropped, &ImageSlice::new(&volume, &property), "slice_cropped.png", 512, 512)?;
    println!("wrote slice_cropped.png");

    // --- Hexagon on a rotated volume ---
    let transform = WorldTransform::new(
        DMat3::from_rotation_z(25f64.to_radians()),
        DVec3::new(0.5, 0.5, 1.0),
        DVec3::new(10.0, -4.0, 0.0),
    )?;
    let rotated = volume.clone().with_transform(transform);
    let center = DVec3::new(31.5, 31.5, 32.0);
    let hexagon = (0..6)
        .map(|i| {
            let a = f64::from(i) * std::f64::consts::FRAC_PI_3;
            transform.index_to_world(center + DVec3::new(a.cos(), a.sin(), 0.0) * 28.0)
        })
        .collect();
    let mut polygon = ImageSliceMapper::new();
    polygon.set_slice_number(32);
    polygon.set_points(Some(hexagon));
    render_to_file(&mut polygon, &ImageSlice::new(&rotated, &property), "slice_hexagon.png", 512, 512)?;
    println!("wrote slice_hexagon.png");

    Ok(())
}

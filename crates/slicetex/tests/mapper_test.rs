//! Mapper integration tests against the recording backend.
//!
//! These exercise the public facade end to end without a GPU: configuration
//! from JSON, texture contents, oblique volumes and polygon slices.

use proptest::prelude::*;
use slicetex::*;

fn ramp_volume() -> ImageVolume {
    let values: Vec<u8> = (0..100).collect();
    ImageVolume::from_dims([10, 10, 1], values).unwrap()
}

#[test]
fn test_table_colors_reach_the_backend() {
    let volume = ramp_volume();
    let table = LookupTable::grayscale((0.0, 99.0));
    let property = ImageProperty::new().with_lookup_table(table.clone());
    let mut mapper = ImageSliceMapper::new();
    let mut backend = RecordingBackend::default();

    mapper.render(&mut backend, &ImageSlice::new(&volume, &property));

    let upload = backend.uploads().next().expect("one upload");
    assert_eq!(upload.size, TextureSize::new(10, 10));
    assert_eq!(upload.bytes_per_pixel, 3);
    assert_eq!(upload.pixels.len(), 300);
    for (v, pixel) in upload.pixels.chunks_exact(3).enumerate() {
        assert_eq!(pixel, &table.map_scalar(v as f64)[..3], "pixel {v}");
    }
    assert_eq!(mapper.texture_size(), TextureSize::new(10, 10));
    assert_eq!(mapper.texture_bytes_per_pixel(), 3);
}

#[test]
fn test_options_from_json_drive_the_slice() {
    let values: Vec<f32> = (0..4 * 5 * 6).map(|v| v as f32).collect();
    let volume = ImageVolume::from_dims([4, 5, 6], values).unwrap();
    let property = ImageProperty::new();
    let options = MapperOptions::from_json(r#"{ "orientation": "X", "slice_number": 2, "border": true }"#).unwrap();
    assert!(options.depth_enable && options.color_enable);

    let mut mapper = ImageSliceMapper::with_options(options);
    let mut backend = RecordingBackend::default();
    mapper.render(&mut backend, &ImageSlice::new(&volume, &property));

    assert_eq!(mapper.last_display_extent(), Some(Extent::new(2, 2, 0, 4, 0, 5)));
    let upload = backend.uploads().next().expect("one upload");
    assert_eq!(upload.size, TextureSize::new(5, 6));
    assert_eq!(upload.bytes_per_pixel, 1);

    // With a border the quad ends on the edge sample centers.
    let draw = backend.draws().next().expect("one draw");
    assert_eq!(draw.points[0], DVec3::new(2.0, 0.0, 0.0));
    assert_eq!(draw.points[2], DVec3::new(2.0, 4.0, 5.0));
}

#[test]
fn test_polygon_on_rotated_volume() {
    let rotation = DMat3::from_rotation_z(30f64.to_radians());
    let transform = WorldTransform::new(rotation, DVec3::ONE, DVec3::new(1.0, 2.0, 0.0)).unwrap();
    let volume = ImageVolume::from_dims([4, 4, 1], vec![0u8; 16])
        .unwrap()
        .with_transform(transform);
    let property = ImageProperty::new();

    let corners = [DVec3::ZERO, DVec3::new(3.0, 0.0, 0.0), DVec3::new(0.0, 3.0, 0.0)];
    let points = corners.iter().map(|&ijk| transform.index_to_world(ijk)).collect();

    let mut mapper = ImageSliceMapper::new();
    mapper.set_points(Some(points));
    let mut backend = RecordingBackend::default();
    mapper.render(&mut backend, &ImageSlice::new(&volume, &property));

    let draw = backend.draws().next().expect("one draw");
    assert_eq!(draw.layer, DrawLayer::Image);
    assert_eq!(draw.triangles.len(), 1);
    let tcoords = draw.tcoords.as_ref().expect("texture coordinates");
    let expected = [DVec2::new(0.125, 0.125), DVec2::new(0.875, 0.125), DVec2::new(0.125, 0.875)];
    for (t, e) in tcoords.iter().zip(expected) {
        assert!((*t - e).length() < 1e-9, "{t} != {e}");
    }
}

#[test]
fn test_data_to_world_matrix_is_passed_through() {
    let volume = ramp_volume();
    let property = ImageProperty::new();
    let model = DMat4::from_translation(DVec3::new(0.0, 0.0, 5.0));
    let mut mapper = ImageSliceMapper::new();
    let mut backend = RecordingBackend::default();

    mapper.render(&mut backend, &ImageSlice::new(&volume, &property).with_data_to_world(model));

    assert!(backend.draws().all(|d| d.model == model));
}

#[test]
fn test_large_slice_is_split_across_uploads() {
    let volume = ImageVolume::from_dims([600, 40, 1], vec![7u8; 600 * 40]).unwrap();
    let property = ImageProperty::new();
    let mut mapper = ImageSliceMapper::new();
    let mut backend = RecordingBackend::new(512);

    mapper.render(&mut backend, &ImageSlice::new(&volume, &property));

    let widths: Vec<usize> = backend.uploads().map(|u| u.size.width).collect();
    assert_eq!(widths, vec![300, 300]);
    assert!(backend.uploads().all(|u| u.size.height == 40));
    assert_eq!(backend.uploads().count(), backend.draws().count());
}

#[test]
fn test_two_slices_in_one_scene_upload_once_each() {
    let values: Vec<u8> = (0..64).collect();
    let volume = ImageVolume::from_dims([4, 4, 4], values).unwrap();
    let property = ImageProperty::new();
    let mut axial = ImageSliceMapper::new();
    let mut sagittal = ImageSliceMapper::new();
    sagittal.set_orientation(Orientation::X);
    let mut backend = RecordingBackend::default();

    for _ in 0..3 {
        axial.render(&mut backend, &ImageSlice::new(&volume, &property));
        sagittal.render(&mut backend, &ImageSlice::new(&volume, &property));
    }

    assert_eq!(backend.uploads().count(), 2);
    assert_eq!(backend.texture_count(), 2);
    for draw in backend.draws() {
        let owner = if draw.texture == Some(axial.texture_key()) { &axial } else { &sagittal };
        let expected = backend.texture(owner.texture_key()).unwrap().pixels.to_vec();
        assert_eq!(draw.texture_pixels.as_ref(), Some(&expected));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_upload_matches_display_extent(axis in 0usize..3, slice in -3i32..10) {
        let volume = ImageVolume::from_dims([3, 4, 5], vec![1u8; 60]).unwrap();
        let property = ImageProperty::new();
        let mut mapper = ImageSliceMapper::new();
        mapper.set_orientation(Orientation::from_axis(axis).unwrap());
        mapper.set_slice_number(slice);
        let mut backend = RecordingBackend::default();

        mapper.render(&mut backend, &ImageSlice::new(&volume, &property));

        let extent = mapper.display_extent(&volume);
        let (_, _, expected) = mapper.compute_texture_size(&extent);
        let upload = backend.uploads().next().unwrap();
        prop_assert_eq!(upload.size, expected);
        prop_assert_eq!(upload.pixels.len(), expected.area());
    }
}

//! Subdivision of slices that exceed the device texture limit.

use crate::extent::{Extent, Orientation};
use crate::texture::{compute_texture_size, fits};

/// Below this edge length a slice is never split further.
pub const SUBDIVISION_FLOOR: usize = 256;

/// A piece of a slice that is uploaded and drawn as one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub extent: Extent,
    /// Produced by splitting; always forces a texture reload.
    pub recursive: bool,
    /// Still larger than the device limit at the subdivision floor.
    pub oversized: bool,
}

/// Splits `extent` into leaves that each fit in a `max_edge` texture.
///
/// Oversized pieces are halved along their longer in-plane axis until they fit
/// or neither side exceeds [`SUBDIVISION_FLOOR`]. Leaves are returned in draw
/// order; they are disjoint and cover `extent` exactly.
pub fn partition(extent: Extent, orientation: Orientation, max_edge: u32) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    subdivide(extent, orientation, max_edge, false, &mut leaves);
    leaves
}

fn subdivide(
    extent: Extent,
    orientation: Orientation,
    max_edge: u32,
    recursive: bool,
    leaves: &mut Vec<Leaf>,
) {
    let (xdim, ydim, size) = compute_texture_size(&extent, orientation);

    if fits(size, max_edge) {
        leaves.push(Leaf {
            extent,
            recursive,
            oversized: false,
        });
    } else if size.width > SUBDIVISION_FLOOR || size.height > SUBDIVISION_FLOOR {
        let (axis, len) = if size.width > size.height {
            (xdim, size.width)
        } else {
            (ydim, size.height)
        };
        let half = i32::try_from(len / 2).unwrap_or(i32::MAX);
        let (lo, hi) = extent.axis(axis);

        log::debug!(
            "splitting {}x{} slice along axis {axis} at index {}",
            size.width,
            size.height,
            lo + half
        );

        subdivide(extent.with_axis(axis, lo, lo + half - 1), orientation, max_edge, true, leaves);
        subdivide(extent.with_axis(axis, lo + half, hi), orientation, max_edge, true, leaves);
    } else {
        log::warn!(
            "{}x{} texture exceeds the device limit of {max_edge} even at the subdivision floor; drawing at reduced quality",
            size.width,
            size.height
        );
        leaves.push(Leaf {
            extent,
            recursive,
            oversized: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extent::TextureSize;
    use proptest::prelude::*;

    #[test]
    fn test_fitting_extent_is_single_leaf() {
        let extent = Extent::new(0, 511, 0, 511, 3, 3);
        let leaves = partition(extent, Orientation::Z, 1024);
        assert_eq!(
            leaves,
            vec![Leaf {
                extent,
                recursive: false,
                oversized: false
            }]
        );
    }

    #[test]
    fn test_split_longer_axis_first() {
        let extent = Extent::new(0, 999, 0, 399, 0, 0);
        let leaves = partition(extent, Orientation::Z, 512);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].extent, Extent::new(0, 499, 0, 399, 0, 0));
        assert_eq!(leaves[1].extent, Extent::new(500, 999, 0, 399, 0, 0));
        assert!(leaves.iter().all(|l| l.recursive && !l.oversized));
    }

    #[test]
    fn test_odd_split_keeps_every_index() {
        let extent = Extent::new(10, 10, -5, 1020, 0, 600);
        let leaves = partition(extent, Orientation::X, 512);
        let total: usize = leaves.iter().map(|l| l.extent.num_samples()).sum();
        assert_eq!(total, extent.num_samples());
    }

    #[test]
    fn test_floor_stops_subdivision() {
        let extent = Extent::new(0, 299, 0, 199, 0, 0);
        let leaves = partition(extent, Orientation::Z, 100);
        assert_eq!(leaves.len(), 2);
        for leaf in &leaves {
            let (_, _, size) = compute_texture_size(&leaf.extent, Orientation::Z);
            assert_eq!(size, TextureSize::new(150, 200));
            assert!(leaf.oversized);
        }
    }

    #[test]
    fn test_unsplittable_small_texture_drawn_anyway() {
        let extent = Extent::new(0, 99, 0, 99, 0, 0);
        let leaves = partition(extent, Orientation::Z, 64);
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].oversized);
        assert!(!leaves[0].recursive);
    }

    fn covers_exactly(extent: Extent, leaves: &[Leaf]) -> bool {
        let [nx, ny, nz] = extent.dims();
        let mut hits = vec![0u8; nx * ny * nz];
        for leaf in leaves {
            if !extent.contains(&leaf.extent) {
                return false;
            }
            for k in leaf.extent.0[4]..=leaf.extent.0[5] {
                for j in leaf.extent.0[2]..=leaf.extent.0[3] {
                    for i in leaf.extent.0[0]..=leaf.extent.0[1] {
                        let idx = ((k - extent.0[4]) as usize * ny + (j - extent.0[2]) as usize)
                            * nx
                            + (i - extent.0[0]) as usize;
                        hits[idx] += 1;
                    }
                }
            }
        }
        hits.iter().all(|&h| h == 1)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn leaves_fit_and_tile_the_extent(
            axis in 0usize..3,
            a0 in -50i32..50,
            a_len in 1i32..1100,
            b0 in -50i32..50,
            b_len in 1i32..1100,
            slice in -5i32..5,
            max_edge in 16u32..1200,
        ) {
            let orientation = Orientation::from_axis(axis).unwrap();
            let (xdim, ydim) = orientation.dimension_indices();
            let extent = Extent::new(0, 0, 0, 0, 0, 0)
                .with_axis(axis, slice, slice)
                .with_axis(xdim, a0, a0 + a_len - 1)
                .with_axis(ydim, b0, b0 + b_len - 1);

            let leaves = partition(extent, orientation, max_edge);
            prop_assert!(covers_exactly(extent, &leaves));
            for leaf in &leaves {
                let (_, _, size) = compute_texture_size(&leaf.extent, orientation);
                if leaf.oversized {
                    prop_assert!(size.width <= SUBDIVISION_FLOOR && size.height <= SUBDIVISION_FLOOR);
                } else {
                    prop_assert!(fits(size, max_edge));
                }
                prop_assert_eq!(leaf.recursive, leaves.len() > 1);
            }
        }
    }
}

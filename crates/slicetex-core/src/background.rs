//! Border geometry drawn around a slice to fill the rest of the viewport.

use glam::{DVec2, DVec3};

use crate::extent::Orientation;
use crate::geometry::Quad;
use crate::transform::WorldTransform;

/// Width of the border ring, large enough to cover any practical viewport.
pub const BORDER_THICKNESS: f64 = 1e6;

/// Ring of 10 points around a quad: the 4 corners plus a closing duplicate,
/// then each of those pushed outward diagonally along the in-plane axes.
pub fn quad_border(quad: &Quad, orientation: Orientation, transform: &WorldTransform) -> Vec<DVec3> {
    let (xdim, ydim) = orientation.dimension_indices();
    let u = transform.axis_direction(xdim);
    let v = transform.axis_direction(ydim);
    let center = quad.points.iter().sum::<DVec3>() * 0.25;

    let inner: Vec<DVec3> = quad.points.iter().copied().chain([quad.points[0]]).collect();
    let outer: Vec<DVec3> = inner
        .iter()
        .map(|&p| {
            let offset = p - center;
            let sx = if offset.dot(u) >= 0.0 { 1.0 } else { -1.0 };
            let sy = if offset.dot(v) >= 0.0 { 1.0 } else { -1.0 };
            p + BORDER_THICKNESS * (sx * u + sy * v)
        })
        .collect();

    inner.into_iter().chain(outer).collect()
}

/// Triangles joining the inner and outer rings of [`quad_border`].
pub fn quad_border_triangles() -> Vec<[u32; 3]> {
    (0..4u32)
        .flat_map(|s| [[s, s + 5, s + 1], [s + 1, s + 5, s + 6]])
        .collect()
}

/// Ring of `2n + 2` points around a polygon of `n` points.
///
/// Points alternate source vertex / offset vertex, with the first pair
/// repeated at the end. Each offset follows the miter between the two
/// adjacent edges, measured in the slice plane, and points away from the
/// interior whatever the winding. Coincident points and edges that double
/// back are reported but not repaired.
pub fn polygon_border(points: &[DVec3], orientation: Orientation, transform: &WorldTransform) -> Vec<DVec3> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let (xdim, ydim) = orientation.dimension_indices();
    let u = transform.axis_direction(xdim);
    let v = transform.axis_direction(ydim);
    let planar: Vec<DVec2> = points
        .iter()
        .map(|&p| {
            let q = transform.world_to_physical(p);
            DVec2::new(q[xdim], q[ydim])
        })
        .collect();

    let outward = if signed_area(&planar) < 0.0 { -1.0 } else { 1.0 };
    let mut degenerate = 0usize;

    let mut ring = Vec::with_capacity(2 * n + 2);
    let mut d0 = unit_edge(planar[n - 1], planar[0], &mut degenerate);
    for i in 0..=n {
        let k = i % n;
        let d1 = unit_edge(planar[k], planar[(k + 1) % n], &mut degenerate);

        let t = if (d0.x + d1.x).abs() > (d0.y + d1.y).abs() {
            (d1.y - d0.y) / (d0.x + d1.x)
        } else {
            (d0.x - d1.x) / (d0.y + d1.y)
        };
        if !t.is_finite() {
            degenerate += 1;
        }
        let miter = DVec2::new(t * d0.x + d0.y, t * d0.y - d0.x) * (outward * BORDER_THICKNESS);

        ring.push(points[k]);
        ring.push(points[k] + miter.x * u + miter.y * v);
        d0 = d1;
    }

    if degenerate > 0 {
        log::warn!("background border around {n}-point polygon has {degenerate} degenerate edge(s)");
    }
    ring
}

/// Triangles joining source and offset points of [`polygon_border`].
pub fn polygon_border_triangles(n: usize) -> Vec<[u32; 3]> {
    (0..n as u32)
        .flat_map(|i| {
            let a = 2 * i;
            [[a, a + 1, a + 2], [a + 2, a + 1, a + 3]]
        })
        .collect()
}

fn unit_edge(from: DVec2, to: DVec2, degenerate: &mut usize) -> DVec2 {
    let d = to - from;
    let r = d.length();
    if r == 0.0 {
        *degenerate += 1;
    }
    d / r
}

fn signed_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extent::{Extent, TextureSize};
    use crate::geometry::texture_quad;
    use glam::DMat3;

    fn square(z: f64) -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, z),
            DVec3::new(4.0, 0.0, z),
            DVec3::new(4.0, 4.0, z),
            DVec3::new(0.0, 4.0, z),
        ]
    }

    fn centroid(points: &[DVec3]) -> DVec3 {
        points.iter().sum::<DVec3>() / points.len() as f64
    }

    #[test]
    fn test_quad_border_layout() {
        let extent = Extent::new(0, 9, 0, 9, 2, 2);
        let quad = texture_quad(&extent, Orientation::Z, &WorldTransform::default(), false, TextureSize::new(10, 10));
        let ring = quad_border(&quad, Orientation::Z, &WorldTransform::default());
        assert_eq!(ring.len(), 10);
        assert_eq!(ring[4], ring[0]);
        assert_eq!(ring[9], ring[5]);
        assert_eq!(ring[5], quad.points[0] + DVec3::new(-BORDER_THICKNESS, -BORDER_THICKNESS, 0.0));
        assert_eq!(ring[7], quad.points[2] + DVec3::new(BORDER_THICKNESS, BORDER_THICKNESS, 0.0));
        assert!(ring.iter().all(|p| p.z == 2.0));
        let center = centroid(&quad.points);
        for (inner, outer) in ring[0..5].iter().zip(&ring[5..10]) {
            assert!(outer.distance(center) > inner.distance(center) + BORDER_THICKNESS);
        }

        let tris = quad_border_triangles();
        assert_eq!(tris.len(), 8);
        assert_eq!(tris[0], [0, 5, 1]);
        assert_eq!(tris[1], [1, 5, 6]);
        assert!(tris.iter().flatten().all(|&i| i < 10));
    }

    #[test]
    fn test_quad_border_encloses_rotated_slice() {
        let direction = DMat3::from_axis_angle(DVec3::new(1.0, 2.0, 0.5).normalize(), 0.8);
        let transform = WorldTransform::new(direction, DVec3::new(0.5, 2.0, 1.5), DVec3::new(-3.0, 4.0, 1.0)).unwrap();
        let extent = Extent::new(0, 7, 3, 3, 0, 4);
        let quad = texture_quad(&extent, Orientation::Y, &transform, true, TextureSize::new(8, 5));
        let ring = quad_border(&quad, Orientation::Y, &transform);
        let center = centroid(&quad.points);
        let normal = transform.axis_direction(1);
        for (inner, outer) in ring[0..5].iter().zip(&ring[5..10]) {
            assert!(outer.is_finite());
            assert!(outer.distance(center) > inner.distance(center) + BORDER_THICKNESS);
            // Offsets stay in the slice plane.
            assert!((*outer - *inner).dot(normal).abs() < 1e-6 * BORDER_THICKNESS);
        }
    }

    #[test]
    fn test_polygon_border_offsets_point_outward() {
        let transform = WorldTransform::default();
        let ccw = square(1.0);
        let mut cw = ccw.clone();
        cw.reverse();
        for polygon in [ccw, cw] {
            let center = centroid(&polygon);
            let ring = polygon_border(&polygon, Orientation::Z, &transform);
            assert_eq!(ring.len(), 2 * polygon.len() + 2);
            for pair in ring.chunks(2) {
                let (src, off) = (pair[0], pair[1]);
                assert!(off.is_finite());
                assert!(off.distance(center) > src.distance(center) + 0.5 * BORDER_THICKNESS);
                assert_eq!(off.z, 1.0);
            }
            assert_eq!(ring[0], ring[2 * polygon.len()]);
        }
    }

    #[test]
    fn test_polygon_border_square_miter() {
        let ring = polygon_border(&square(0.0), Orientation::Z, &WorldTransform::default());
        assert_eq!(ring[1], DVec3::new(-BORDER_THICKNESS, -BORDER_THICKNESS, 0.0));
        assert_eq!(ring[3], DVec3::new(4.0 + BORDER_THICKNESS, -BORDER_THICKNESS, 0.0));
    }

    #[test]
    fn test_polygon_border_in_rotated_plane() {
        let transform =
            WorldTransform::new(DMat3::from_rotation_x(0.7), DVec3::ONE, DVec3::new(2.0, 0.0, 0.0)).unwrap();
        let hexagon: Vec<DVec3> = (0..6)
            .map(|k| {
                let a = f64::from(k) * std::f64::consts::FRAC_PI_3;
                transform.index_to_world(DVec3::new(5.0, 10.0 + 3.0 * a.cos(), 10.0 + 3.0 * a.sin()))
            })
            .collect();
        let center = centroid(&hexagon);
        let normal = transform.axis_direction(0);
        let ring = polygon_border(&hexagon, Orientation::X, &transform);
        for pair in ring.chunks(2) {
            assert!(pair[1].distance(center) > pair[0].distance(center));
            assert!((pair[1] - pair[0]).dot(normal).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_edge_is_not_repaired() {
        let mut points = square(0.0);
        points.insert(1, points[0]);
        let ring = polygon_border(&points, Orientation::Z, &WorldTransform::default());
        assert_eq!(ring.len(), 12);
        assert!(ring.iter().any(|p| !p.is_finite()));
    }

    #[test]
    fn test_polygon_border_triangles() {
        let tris = polygon_border_triangles(3);
        assert_eq!(tris.len(), 6);
        assert_eq!(tris[0], [0, 1, 2]);
        assert_eq!(tris[1], [2, 1, 3]);
        assert_eq!(tris[5], [6, 5, 7]);
        assert!(polygon_border(&[], Orientation::Z, &WorldTransform::default()).is_empty());
    }
}

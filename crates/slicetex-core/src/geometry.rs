//! Slice polygon geometry: quad corners, texture coordinates and triangulation.

use glam::{DVec2, DVec3};

use crate::background;
use crate::extent::{Extent, Orientation, TextureSize};
use crate::transform::WorldTransform;

/// The four corners of a slice and their texture coordinates, counter-clockwise
/// in the (xdim, ydim) index plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub points: [DVec3; 4],
    pub tcoords: [DVec2; 4],
}

/// Builds the textured quad covering `extent` at its slice position.
///
/// Without `border` the quad reaches the outer pixel edges and the texture
/// coordinates span exactly `[0, 1]`. With `border` the quad runs between the
/// outermost pixel centers and the coordinates are inset by half a texel.
pub fn texture_quad(
    extent: &Extent,
    orientation: Orientation,
    transform: &WorldTransform,
    border: bool,
    texture_size: TextureSize,
) -> Quad {
    let (xdim, ydim) = orientation.dimension_indices();
    let (x0, x1) = extent.axis(xdim);
    let (y0, y1) = extent.axis(ydim);
    let slice = f64::from(extent.axis(orientation.axis()).0);

    let (pad, ts0, ts1, tt0, tt1) = if border {
        let w = texture_size.width.max(1) as f64;
        let h = texture_size.height.max(1) as f64;
        (0.0, 0.5 / w, (w - 0.5) / w, 0.5 / h, (h - 0.5) / h)
    } else {
        (0.5, 0.0, 1.0, 0.0, 1.0)
    };

    let lo_x = f64::from(x0) - pad;
    let hi_x = f64::from(x1) + pad;
    let lo_y = f64::from(y0) - pad;
    let hi_y = f64::from(y1) + pad;

    let corner = |x: f64, y: f64| {
        let mut ijk = DVec3::ZERO;
        ijk[xdim] = x;
        ijk[ydim] = y;
        ijk[orientation.axis()] = slice;
        transform.index_to_world(ijk)
    };

    Quad {
        points: [
            corner(lo_x, lo_y),
            corner(hi_x, lo_y),
            corner(hi_x, hi_y),
            corner(lo_x, hi_y),
        ],
        tcoords: [
            DVec2::new(ts0, tt0),
            DVec2::new(ts1, tt0),
            DVec2::new(ts1, tt1),
            DVec2::new(ts0, tt1),
        ],
    }
}

/// Texture coordinates for arbitrary polygon vertices lying in the slice plane.
///
/// Each point is taken back into the volume's axis-aligned frame and
/// normalized against the texture extent, so a vertex at a quad corner gets
/// the same coordinate [`texture_quad`] assigns it (without border).
pub fn polygon_tcoords(
    points: &[DVec3],
    extent: &Extent,
    orientation: Orientation,
    transform: &WorldTransform,
    texture_size: TextureSize,
) -> Vec<DVec2> {
    let (xdim, ydim) = orientation.dimension_indices();
    let spacing = transform.spacing();
    let xshift = (f64::from(extent.axis(xdim).0) - 0.5) * spacing[xdim];
    let yshift = (f64::from(extent.axis(ydim).0) - 0.5) * spacing[ydim];
    let xscale = texture_size.width as f64 * spacing[xdim];
    let yscale = texture_size.height as f64 * spacing[ydim];

    points
        .iter()
        .map(|&p| {
            let q = transform.world_to_physical(p);
            DVec2::new((q[xdim] - xshift) / xscale, (q[ydim] - yshift) / yscale)
        })
        .collect()
}

/// Triangulates a convex polygon of `n` points as a zig-zag fan.
///
/// Produces `n - 2` triangles; for a quad, `(3, 0, 2)` and `(2, 0, 1)`.
pub fn fan_triangles(n: usize) -> Vec<[u32; 3]> {
    let Some(t) = n.checked_sub(2) else {
        return Vec::new();
    };
    (0..t)
        .map(|i| {
            let third = if i % 2 == 0 { t - i / 2 } else { i / 2 + 1 };
            [(t + 1 - (i + 1) / 2) as u32, (i / 2) as u32, third as u32]
        })
        .collect()
}

/// Connectivity of a [`PolygonBuffer`]. Triangles depend only on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// A convex polygon of the given number of points.
    Fan(usize),
    /// The ring around a quad (10 points).
    QuadBorder,
    /// The ring around a polygon of the given number of points.
    PolygonBorder(usize),
}

impl Topology {
    fn triangles(self) -> Vec<[u32; 3]> {
        match self {
            Topology::Fan(n) => fan_triangles(n),
            Topology::QuadBorder => background::quad_border_triangles(),
            Topology::PolygonBorder(n) => background::polygon_border_triangles(n),
        }
    }
}

/// Mesh owned by the mapper and handed to the backend for drawing.
///
/// Points and texture coordinates are replaced on every update; the triangle
/// list is rebuilt only when the topology changes.
#[derive(Debug, Clone, Default)]
pub struct PolygonBuffer {
    points: Vec<DVec3>,
    tcoords: Option<Vec<DVec2>>,
    triangles: Vec<[u32; 3]>,
    topology: Option<Topology>,
    version: u64,
    triangle_builds: u64,
}

impl PolygonBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the vertices, rebuilding triangles if `topology` differs.
    pub fn update(&mut self, topology: Topology, points: Vec<DVec3>, tcoords: Option<Vec<DVec2>>) {
        if self.topology != Some(topology) {
            self.triangles = topology.triangles();
            self.topology = Some(topology);
            self.triangle_builds += 1;
        }
        self.points = points;
        self.tcoords = tcoords;
        self.version += 1;
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn tcoords(&self) -> Option<&[DVec2]> {
        self.tcoords.as_deref()
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn topology(&self) -> Option<Topology> {
        self.topology
    }

    /// Incremented on every update.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of times the triangle list has been rebuilt.
    pub fn triangle_builds(&self) -> u64 {
        self.triangle_builds
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || self.triangles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DMat3;

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_quad_without_border() {
        let extent = Extent::new(0, 9, 0, 9, 5, 5);
        let quad = texture_quad(
            &extent,
            Orientation::Z,
            &WorldTransform::default(),
            false,
            TextureSize::new(10, 10),
        );
        assert!(quad.points.iter().all(|p| p.z == 5.0));
        assert_eq!(quad.points[0], DVec3::new(-0.5, -0.5, 5.0));
        assert_eq!(quad.points[2], DVec3::new(9.5, 9.5, 5.0));
        assert_eq!(
            quad.tcoords,
            [
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(0.0, 1.0)
            ]
        );
    }

    #[test]
    fn test_quad_with_border_insets_tcoords() {
        let extent = Extent::new(0, 3, 0, 1, 0, 0);
        let quad = texture_quad(
            &extent,
            Orientation::Z,
            &WorldTransform::default(),
            true,
            TextureSize::new(4, 2),
        );
        assert_eq!(quad.points[0], DVec3::ZERO);
        assert_eq!(quad.points[2], DVec3::new(3.0, 1.0, 0.0));
        assert!(close(quad.tcoords[0], DVec2::new(0.125, 0.25)));
        assert!(close(quad.tcoords[2], DVec2::new(0.875, 0.75)));
    }

    #[test]
    fn test_quad_x_orientation_uses_transform() {
        let transform = WorldTransform::axis_aligned(DVec3::new(2.0, 3.0, 4.0), DVec3::new(1.0, 1.0, 1.0));
        let extent = Extent::new(2, 2, 0, 3, 0, 1);
        let quad = texture_quad(&extent, Orientation::X, &transform, false, TextureSize::new(4, 2));
        assert!(quad.points.iter().all(|p| p.x == 5.0));
        assert_eq!(quad.points[0], DVec3::new(5.0, -0.5, -1.0));
        assert_eq!(quad.points[2], DVec3::new(5.0, 11.5, 7.0));
    }

    #[test]
    fn test_polygon_tcoords_match_quad_corners() {
        let direction = DMat3::from_rotation_y(0.4) * DMat3::from_rotation_z(1.2);
        let transform =
            WorldTransform::new(direction, DVec3::new(0.7, 1.3, 2.0), DVec3::new(3.0, -2.0, 8.0)).unwrap();
        for orientation in Orientation::ALL {
            let (xdim, ydim) = orientation.dimension_indices();
            let extent = Extent::new(0, 0, 0, 0, 0, 0)
                .with_axis(orientation.axis(), 4, 4)
                .with_axis(xdim, 3, 12)
                .with_axis(ydim, -2, 5);
            let size = TextureSize::new(extent.len(xdim), extent.len(ydim));
            let quad = texture_quad(&extent, orientation, &transform, false, size);
            let tcoords = polygon_tcoords(&quad.points, &extent, orientation, &transform, size);
            for (a, b) in tcoords.iter().zip(quad.tcoords.iter()) {
                assert!(close(*a, *b), "{orientation:?}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_fan_triangles() {
        assert_eq!(fan_triangles(4), vec![[3, 0, 2], [2, 0, 1]]);
        assert_eq!(fan_triangles(3), vec![[2, 0, 1]]);
        assert_eq!(fan_triangles(6).len(), 4);
        assert!(fan_triangles(2).is_empty());
        assert!(fan_triangles(0).is_empty());
    }

    #[test]
    fn test_fan_triangles_use_every_point() {
        for n in 3..12 {
            let tris = fan_triangles(n);
            let mut used = vec![false; n];
            for tri in &tris {
                for &v in tri {
                    used[v as usize] = true;
                }
                assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
            }
            assert!(used.iter().all(|&u| u), "n = {n}");
        }
    }

    #[test]
    fn test_buffer_rebuilds_triangles_on_topology_change_only() {
        let mut buffer = PolygonBuffer::new();
        assert!(buffer.is_empty());
        buffer.update(Topology::Fan(4), vec![DVec3::ZERO; 4], None);
        buffer.update(Topology::Fan(4), vec![DVec3::ONE; 4], None);
        assert_eq!(buffer.triangle_builds(), 1);
        assert_eq!(buffer.version(), 2);
        assert_eq!(buffer.points()[0], DVec3::ONE);

        buffer.update(Topology::Fan(5), vec![DVec3::ZERO; 5], None);
        assert_eq!(buffer.triangle_builds(), 2);
        assert_eq!(buffer.triangles().len(), 3);
    }
}

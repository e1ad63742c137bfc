//! Orthographic views looking straight at a slice.

use glam::{Mat4, Vec3};

/// An orthographic camera aimed along a slice normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceView {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Half the visible height in world units.
    pub half_height: f32,
    pub aspect_ratio: f32,
    /// Half the depth range around the target.
    pub depth: f32,
}

impl SliceView {
    /// Fits the box `[min, max]` into the view, looking along `-normal`
    /// with `up` pointing to the top of the image.
    pub fn fit(min: Vec3, max: Vec3, normal: Vec3, up: Vec3, aspect_ratio: f32) -> Self {
        let center = (min + max) * 0.5;
        let radius = ((max - min).length() * 0.5).max(f32::EPSILON);
        let normal = normal.normalize_or(Vec3::Z);
        // Keep `up` perpendicular to the view direction.
        let up = (up - normal * up.dot(normal)).normalize_or(normal.any_orthonormal_vector());
        let right = up.cross(normal);

        let (mut half_w, mut half_h) = (0.0f32, 0.0f32);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            );
            let d = corner - center;
            half_w = half_w.max(d.dot(right).abs());
            half_h = half_h.max(d.dot(up).abs());
        }

        Self {
            position: center + normal * (radius * 2.0),
            target: center,
            up,
            half_height: half_h.max(half_w / aspect_ratio).max(f32::EPSILON),
            aspect_ratio,
            depth: radius * 4.0,
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        let half_width = self.half_height * self.aspect_ratio;
        let dist = (self.position - self.target).length();
        Mat4::orthographic_rh(
            -half_width,
            half_width,
            -self.half_height,
            self.half_height,
            dist - self.depth,
            dist + self.depth,
        )
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

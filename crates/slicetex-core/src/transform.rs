//! Index-to-world transform of an image volume.

use glam::{DMat3, DVec3};

use crate::error::{Result, SliceError};

/// Direction, spacing and origin of a volume.
///
/// A continuous index `ijk` maps to `origin + direction * (ijk * spacing)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    direction: DMat3,
    spacing: DVec3,
    origin: DVec3,
    inverse_direction: DMat3,
}

impl WorldTransform {
    /// Creates a transform, failing if `direction` is singular.
    pub fn new(direction: DMat3, spacing: DVec3, origin: DVec3) -> Result<Self> {
        let det = direction.determinant();
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return Err(SliceError::SingularDirection);
        }
        Ok(Self {
            direction,
            spacing,
            origin,
            inverse_direction: direction.inverse(),
        })
    }

    /// Axis-aligned transform with the given spacing and origin.
    pub fn axis_aligned(spacing: DVec3, origin: DVec3) -> Self {
        Self {
            direction: DMat3::IDENTITY,
            spacing,
            origin,
            inverse_direction: DMat3::IDENTITY,
        }
    }

    pub fn direction(&self) -> DMat3 {
        self.direction
    }

    pub fn spacing(&self) -> DVec3 {
        self.spacing
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn inverse_direction(&self) -> DMat3 {
        self.inverse_direction
    }

    /// Unit vector of index axis `axis` in world space.
    pub fn axis_direction(&self, axis: usize) -> DVec3 {
        self.direction.col(axis)
    }

    /// Maps a continuous index to world coordinates.
    pub fn index_to_world(&self, ijk: DVec3) -> DVec3 {
        self.origin + self.direction * (ijk * self.spacing)
    }

    /// Maps a world point to physical coordinates aligned with the index axes
    /// (origin removed, direction undone, spacing kept).
    pub fn world_to_physical(&self, point: DVec3) -> DVec3 {
        self.inverse_direction * (point - self.origin)
    }

    /// Maps a world point back to a continuous index.
    pub fn world_to_index(&self, point: DVec3) -> DVec3 {
        self.world_to_physical(point) / self.spacing
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::axis_aligned(DVec3::ONE, DVec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = WorldTransform::default();
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(t.index_to_world(p), p);
        assert_eq!(t.world_to_index(p), p);
    }

    #[test]
    fn test_rotated_round_trip() {
        let direction = DMat3::from_rotation_z(0.3) * DMat3::from_rotation_x(-1.1);
        let t = WorldTransform::new(
            direction,
            DVec3::new(0.5, 2.0, 1.5),
            DVec3::new(-4.0, 1.0, 10.0),
        )
        .unwrap();
        let ijk = DVec3::new(3.0, -2.5, 7.0);
        let back = t.world_to_index(t.index_to_world(ijk));
        assert!((back - ijk).length() < 1e-9);
    }

    #[test]
    fn test_singular_direction_rejected() {
        let singular = DMat3::from_cols(DVec3::X, DVec3::X, DVec3::Z);
        assert!(matches!(
            WorldTransform::new(singular, DVec3::ONE, DVec3::ZERO),
            Err(SliceError::SingularDirection)
        ));
    }
}

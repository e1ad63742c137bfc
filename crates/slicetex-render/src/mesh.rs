//! GPU-side layouts of slice meshes, draw uniforms and texture pixels.

use glam::{DMat4, Mat4};
use slicetex_core::{DrawMaterial, PolygonBuffer};

/// One vertex of a slice polygon.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SliceVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl SliceVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    /// Vertex buffer layout matching `image_slice.wgsl`.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SliceVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Converts a mesh to vertices. Meshes without texture coordinates get zeros.
pub fn mesh_vertices(mesh: &PolygonBuffer) -> Vec<SliceVertex> {
    let tcoords = mesh.tcoords();
    mesh.points()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let t = tcoords.and_then(|t| t.get(i)).copied().unwrap_or_default();
            SliceVertex {
                position: p.as_vec3().to_array(),
                tex_coord: t.as_vec2().to_array(),
            }
        })
        .collect()
}

/// Per-draw uniforms (must match `image_slice.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model_view_proj: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: opacity, y: ambient, z: diffuse, w: 1 when textured.
    pub params: [f32; 4],
}

impl DrawUniforms {
    pub fn new(view_projection: Mat4, model: DMat4, material: &DrawMaterial, textured: bool) -> Self {
        let mvp = view_projection * model.as_mat4();
        let color = material.color.as_vec3();
        Self {
            model_view_proj: mvp.to_cols_array_2d(),
            color: [color.x, color.y, color.z, 1.0],
            params: [
                material.opacity as f32,
                material.ambient as f32,
                material.diffuse as f32,
                if textured { 1.0 } else { 0.0 },
            ],
        }
    }
}

/// Expands 1 (luminance), 2 (luminance + alpha), 3 (RGB) or 4 (RGBA) byte
/// pixels to RGBA8.
pub fn expand_to_rgba(pixels: &[u8], bytes_per_pixel: usize) -> Option<Vec<u8>> {
    let expand: fn(&[u8]) -> [u8; 4] = match bytes_per_pixel {
        1 => |p| [p[0], p[0], p[0], 255],
        2 => |p| [p[0], p[0], p[0], p[1]],
        3 => |p| [p[0], p[1], p[2], 255],
        4 => |p| [p[0], p[1], p[2], p[3]],
        _ => return None,
    };
    Some(pixels.chunks_exact(bytes_per_pixel).flat_map(expand).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec2, DVec3};
    use slicetex_core::Topology;

    #[test]
    fn test_uniforms_size() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 96);
        assert_eq!(std::mem::size_of::<SliceVertex>(), 20);
    }

    #[test]
    fn test_expand_to_rgba() {
        assert_eq!(expand_to_rgba(&[7, 9], 1).unwrap(), vec![7, 7, 7, 255, 9, 9, 9, 255]);
        assert_eq!(expand_to_rgba(&[7, 9], 2).unwrap(), vec![7, 7, 7, 9]);
        assert_eq!(expand_to_rgba(&[1, 2, 3], 3).unwrap(), vec![1, 2, 3, 255]);
        assert_eq!(expand_to_rgba(&[1, 2, 3, 4], 4).unwrap(), vec![1, 2, 3, 4]);
        assert!(expand_to_rgba(&[1, 2, 3, 4, 5], 5).is_none());
    }

    #[test]
    fn test_mesh_vertices_without_tcoords() {
        let mut mesh = PolygonBuffer::new();
        mesh.update(Topology::Fan(3), vec![DVec3::X, DVec3::Y, DVec3::Z], None);
        let vertices = mesh_vertices(&mesh);
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].tex_coord, [0.0, 0.0]);

        mesh.update(Topology::Fan(3), vec![DVec3::ZERO; 3], Some(vec![DVec2::new(0.5, 1.0); 3]));
        assert_eq!(mesh_vertices(&mesh)[2].tex_coord, [0.5, 1.0]);
    }

    #[test]
    fn test_uniforms_identity() {
        let material = DrawMaterial {
            opacity: 0.5,
            ..DrawMaterial::default()
        };
        let u = DrawUniforms::new(Mat4::IDENTITY, DMat4::IDENTITY, &material, true);
        assert_eq!(u.model_view_proj, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(u.params, [0.5, 1.0, 0.0, 1.0]);
    }
}

use glam::{Mat3, Mat4, Vec3};

use crate::math::AABB;
use crate::types::Vertex;

/// Indexed triangle geometry with per-vertex colour
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            name: None,
            vertices,
            indices,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(self.vertices.iter().map(|v| Vec3::from_array(v.position)))
    }

    /// Bake a transform into the vertex data (positions and normals)
    pub fn apply_matrix(&mut self, matrix: Mat4) {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        for vertex in &mut self.vertices {
            vertex.position = matrix.transform_point3(Vec3::from_array(vertex.position)).to_array();
            vertex.normal = (normal_matrix * Vec3::from_array(vertex.normal))
                .normalize_or_zero()
                .to_array();
        }

        // a mirroring transform flips winding
        if matrix.determinant() < 0.0 {
            for triangle in self.indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }
    }

    /// Append another mesh, re-basing its indices
    pub fn merge(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Area-weighted smooth normals from the triangle list
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            let pa = Vec3::from_array(self.vertices[a].position);
            let pb = Vec3::from_array(self.vertices[b].position);
            let pc = Vec3::from_array(self.vertices[c].position);
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }
}

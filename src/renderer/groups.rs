// renderer/groups.rs
// Face-list geometry and its conversion into a non-indexed BufferGeometry
// whose draw groups follow the faces' material indices.

use glam::{Vec2, Vec3};

use crate::renderer::geometry::{BufferAttribute, BufferGeometry};

/// Triangle over three vertex indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face3 {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub normal: Vec3,
    pub vertex_normals: Option<[Vec3; 3]>,
    pub vertex_colors: Option<[Vec3; 3]>,
    pub material_index: usize,
}

impl Face3 {
    pub fn new(a: usize, b: usize, c: usize, material_index: usize) -> Self {
        Self {
            a,
            b,
            c,
            normal: Vec3::ZERO,
            vertex_normals: None,
            vertex_colors: None,
            material_index,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FaceGeometry {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face3>,
    /// One uv triple per face. Ignored unless every face has one.
    pub face_uvs: Vec<[Vec2; 3]>,
}

impl FaceGeometry {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Face3>) -> Self {
        Self {
            vertices,
            faces,
            face_uvs: Vec::new(),
        }
    }

    /// Expands every face into three vertices. Faces are ordered by material
    /// and each run is cut into groups of at most `max_vertices_per_group`
    /// vertices. Faces pointing at missing vertices are dropped.
    pub fn to_buffer_geometry(&self, max_vertices_per_group: u64) -> BufferGeometry {
        let mut order: Vec<usize> = (0..self.faces.len()).collect();
        order.sort_by_key(|&i| self.faces[i].material_index);

        let with_uvs = !self.faces.is_empty() && self.face_uvs.len() == self.faces.len();
        let with_colors = self.faces.iter().any(|f| f.vertex_colors.is_some());

        let mut positions = Vec::with_capacity(self.faces.len() * 9);
        let mut normals = Vec::with_capacity(self.faces.len() * 9);
        let mut colors = Vec::new();
        let mut uvs = Vec::new();
        let mut groups: Vec<(usize, usize, usize)> = Vec::new();
        let max = max_vertices_per_group.max(3) as usize;
        let mut emitted = 0usize;

        for i in order {
            let face = &self.faces[i];
            let corners = [face.a, face.b, face.c];
            let Some(points) = corners
                .iter()
                .map(|&v| self.vertices.get(v).copied())
                .collect::<Option<Vec<Vec3>>>()
            else {
                log::warn!("Face {} references a missing vertex, skipping it", i);
                continue;
            };

            let face_normal = if face.normal.length_squared() > 0.0 {
                face.normal
            } else {
                (points[1] - points[0])
                    .cross(points[2] - points[0])
                    .normalize_or_zero()
            };
            let corner_normals = face.vertex_normals.unwrap_or([face_normal; 3]);

            for corner in 0..3 {
                positions.extend_from_slice(&points[corner].to_array());
                normals.extend_from_slice(&corner_normals[corner].to_array());
                if with_colors {
                    let color = face.vertex_colors.map_or(Vec3::ONE, |c| c[corner]);
                    colors.extend_from_slice(&color.to_array());
                }
                if with_uvs {
                    uvs.extend_from_slice(&self.face_uvs[i][corner].to_array());
                }
            }

            match groups.last_mut() {
                Some((_, count, material))
                    if *material == face.material_index && *count + 3 <= max =>
                {
                    *count += 3;
                }
                _ => groups.push((emitted, 3, face.material_index)),
            }
            emitted += 3;
        }

        let mut geometry = BufferGeometry::new()
            .with_attribute("position", BufferAttribute::f32(positions, 3))
            .with_attribute("normal", BufferAttribute::f32(normals, 3));
        if with_colors {
            geometry.set_attribute("color", BufferAttribute::f32(colors, 3));
        }
        if with_uvs {
            geometry.set_attribute("uv", BufferAttribute::f32(uvs, 2));
        }
        for (start, count, material_index) in groups {
            geometry.add_group(start, count, material_index);
        }
        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::geometry::DrawGroup;

    fn strip(materials: &[usize]) -> FaceGeometry {
        let vertices = (0..materials.len() + 2)
            .map(|i| Vec3::new(i as f32, (i % 2) as f32, 0.0))
            .collect();
        let faces = materials
            .iter()
            .enumerate()
            .map(|(i, &m)| Face3::new(i, i + 1, i + 2, m))
            .collect();
        FaceGeometry::new(vertices, faces)
    }

    #[test]
    fn groups_split_by_material_and_vertex_limit() {
        let geometry = strip(&[1, 0, 0, 1, 0]).to_buffer_geometry(6);
        assert_eq!(geometry.vertex_count(), 15);
        assert_eq!(
            geometry.groups,
            vec![
                DrawGroup { start: 0, count: 6, material_index: 0 },
                DrawGroup { start: 6, count: 3, material_index: 0 },
                DrawGroup { start: 9, count: 6, material_index: 1 },
            ]
        );
    }

    #[test]
    fn single_group_under_the_u16_limit() {
        let geometry = strip(&[0; 10]).to_buffer_geometry(65535);
        assert_eq!(geometry.groups.len(), 1);
        assert_eq!(geometry.groups[0].count, 30);
        assert!(!geometry.has_attribute("uv"));
        assert!(!geometry.has_attribute("color"));
    }

    #[test]
    fn missing_vertices_drop_the_face() {
        let mut geometry = strip(&[0, 0]);
        geometry.faces.push(Face3::new(0, 1, 99, 0));
        let buffer = geometry.to_buffer_geometry(65535);
        assert_eq!(buffer.vertex_count(), 6);
    }
}

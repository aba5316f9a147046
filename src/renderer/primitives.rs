// renderer/primitives.rs
// Built-in geometries. All of them carry position, normal and uv.

use std::f32::consts::PI;

use crate::renderer::geometry::{BufferAttribute, BufferGeometry};

#[derive(Default)]
struct Arrays {
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
}

impl Arrays {
    fn push(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) {
        self.positions.extend_from_slice(&position);
        self.normals.extend_from_slice(&normal);
        self.uvs.extend_from_slice(&uv);
    }

    fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    fn into_geometry(self) -> BufferGeometry {
        BufferGeometry::new()
            .with_attribute("position", BufferAttribute::f32(self.positions, 3))
            .with_attribute("normal", BufferAttribute::f32(self.normals, 3))
            .with_attribute("uv", BufferAttribute::f32(self.uvs, 2))
            .with_index(self.indices)
    }
}

/// Axis-aligned box centred on the origin. Each face has its own four
/// vertices and its own draw group, so a box can take one material per
/// face (+X, -X, +Y, -Y, +Z, -Z).
pub fn box_geometry(width: f32, height: f32, depth: f32) -> BufferGeometry {
    let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);
    // normal, u axis, v axis per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let half = [x, y, z];
    let scale = |axis: [f32; 3], s: f32| -> [f32; 3] {
        [axis[0] * half[0] * s, axis[1] * half[1] * s, axis[2] * half[2] * s]
    };

    let mut arrays = Arrays::default();
    for (normal, u, v) in faces {
        let base = arrays.vertex_count();
        let center = scale(normal, 1.0);
        for (su, sv, uv) in [
            (-1.0, -1.0, [0.0, 0.0]),
            (1.0, -1.0, [1.0, 0.0]),
            (1.0, 1.0, [1.0, 1.0]),
            (-1.0, 1.0, [0.0, 1.0]),
        ] {
            let du = scale(u, su);
            let dv = scale(v, sv);
            arrays.push(
                [
                    center[0] + du[0] + dv[0],
                    center[1] + du[1] + dv[1],
                    center[2] + du[2] + dv[2],
                ],
                normal,
                uv,
            );
        }
        arrays
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut geometry = arrays.into_geometry();
    for face in 0..6 {
        geometry.add_group(face * 6, 6, face);
    }
    geometry
}

/// Plane in the XY plane facing +Z.
pub fn plane_geometry(width: f32, height: f32) -> BufferGeometry {
    let (x, y) = (width * 0.5, height * 0.5);
    let mut arrays = Arrays::default();
    arrays.push([-x, -y, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]);
    arrays.push([x, -y, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]);
    arrays.push([x, y, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]);
    arrays.push([-x, y, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]);
    arrays.indices = vec![0, 1, 2, 0, 2, 3];
    arrays.into_geometry()
}

/// UV sphere. Segments run around Y, rings from pole to pole.
pub fn sphere_geometry(radius: f32, segments: u32, rings: u32) -> BufferGeometry {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut arrays = Arrays::default();

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();
            arrays.push(
                [x * radius, y * radius, z * radius],
                [x, y, z],
                [segment as f32 / segments as f32, 1.0 - ring as f32 / rings as f32],
            );
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;
            arrays
                .indices
                .extend_from_slice(&[current, current + 1, next, current + 1, next + 1, next]);
        }
    }

    arrays.into_geometry()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_counts_look_right() {
        let geometry = box_geometry(1.0, 1.0, 1.0);
        assert_eq!(geometry.vertex_count(), 24);
        assert_eq!(geometry.element_count(), 36);
        assert_eq!(geometry.groups.len(), 6);
        assert_eq!(geometry.groups[5].start, 30);
        assert!(geometry.has_attribute("normal"));
        assert!(geometry.has_attribute("uv"));
    }

    #[test]
    fn box_vertices_lie_on_its_faces() {
        let geometry = box_geometry(2.0, 4.0, 6.0);
        for p in geometry.positions() {
            assert!((p.x.abs() - 1.0).abs() < 1e-6 || (p.y.abs() - 2.0).abs() < 1e-6 || (p.z.abs() - 3.0).abs() < 1e-6);
            assert!(p.x.abs() <= 1.0 + 1e-6 && p.y.abs() <= 2.0 + 1e-6 && p.z.abs() <= 3.0 + 1e-6);
        }
        let sphere = geometry.bounding_sphere().unwrap();
        assert!(sphere.radius >= 3.0);
    }

    #[test]
    fn sphere_counts_look_right() {
        let geometry = sphere_geometry(2.0, 8, 4);
        assert_eq!(geometry.vertex_count(), 9 * 5);
        assert_eq!(geometry.element_count(), 8 * 4 * 6);
        let bounds = geometry.bounding_sphere().unwrap();
        assert!((bounds.radius - 2.0).abs() < 1e-3);
    }

    #[test]
    fn plane_is_two_triangles() {
        let geometry = plane_geometry(2.0, 2.0);
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.element_count(), 6);
    }
}

// renderer/frustum.rs

use glam::{Mat4, Vec3, Vec4};

use crate::renderer::geometry::BoundingSphere;

/// Plane `n . p + d = 0` with a unit normal pointing into the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    fn from_vec4(v: Vec4) -> Self {
        let normal = v.truncate();
        let len = normal.length();
        if len > 0.0 {
            Self {
                normal: normal / len,
                d: v.w / len,
            }
        } else {
            Self { normal, d: v.w }
        }
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Gribb-Hartmann extraction from a GL clip-space view-projection.
    pub fn from_view_projection(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        Self {
            planes: [
                Plane::from_vec4(r3 + r0),
                Plane::from_vec4(r3 - r0),
                Plane::from_vec4(r3 + r1),
                Plane::from_vec4(r3 - r1),
                Plane::from_vec4(r3 + r2),
                Plane::from_vec4(r3 - r2),
            ],
        }
    }

    /// False only when the sphere lies entirely behind one plane.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Tests a local-space bounding sphere placed by `world`.
    pub fn intersects_object(&self, sphere: BoundingSphere, world: &Mat4) -> bool {
        let center = world.transform_point3(sphere.center);
        let scale = max_axis_scale(world);
        self.intersects_sphere(center, sphere.radius * scale)
    }
}

/// Length of the longest basis vector, the radius scale for spheres.
pub fn max_axis_scale(m: &Mat4) -> f32 {
    let sx = m.x_axis.truncate().length_squared();
    let sy = m.y_axis.truncate().length_squared();
    let sz = m.z_axis.truncate().length_squared();
    sx.max(sy).max(sz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_frustum() -> Frustum {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0);
        Frustum::from_view_projection(proj * view)
    }

    #[test]
    fn spheres_inside_straddling_and_outside() {
        let frustum = camera_frustum();
        assert!(frustum.intersects_sphere(Vec3::ZERO, 1.0));
        // behind the camera but large enough to reach the near plane
        assert!(frustum.intersects_sphere(Vec3::new(0.0, 0.0, 6.0), 2.0));
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, 10.0), 1.0));
        assert!(!frustum.intersects_sphere(Vec3::new(100.0, 0.0, 0.0), 1.0));
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, -200.0), 1.0));
    }

    #[test]
    fn object_radius_follows_largest_scale() {
        let frustum = camera_frustum();
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let far_right = Mat4::from_translation(Vec3::new(12.0, 0.0, 0.0));
        assert!(!frustum.intersects_object(sphere, &far_right));

        let scaled = far_right * Mat4::from_scale(Vec3::new(1.0, 1.0, 20.0));
        assert!((max_axis_scale(&scaled) - 20.0).abs() < 1e-5);
        assert!(frustum.intersects_object(sphere, &scaled));
    }
}

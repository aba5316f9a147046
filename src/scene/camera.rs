use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3};

static NEXT_CAMERA_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Aspect ratio comes from the viewport at render time.
    Perspective { fov_y_radians: f32 },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
    id: CameraId,
}

impl Camera {
    pub fn perspective(eye: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            projection: Projection::Perspective { fov_y_radians },
            near,
            far,
            id: Self::next_id(),
        }
    }

    pub fn orthographic(eye: Vec3, target: Vec3, half_extent: f32, near: f32, far: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            projection: Projection::Orthographic {
                left: -half_extent,
                right: half_extent,
                bottom: -half_extent,
                top: half_extent,
            },
            near,
            far,
            id: Self::next_id(),
        }
    }

    fn next_id() -> CameraId {
        CameraId(NEXT_CAMERA_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    pub fn view(&self) -> Mat4 {
        let up = if self.up.cross(self.target - self.eye).length_squared() < 1e-8 {
            // looking straight along `up`
            Vec3::Z
        } else {
            self.up
        };
        Mat4::look_at_rh(self.eye, self.target, up)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y_radians } => {
                Mat4::perspective_rh_gl(fov_y_radians, aspect, self.near, self.far)
            }
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
            } => Mat4::orthographic_rh_gl(left, right, bottom, top, self.near, self.far),
        }
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }

    pub fn position(&self) -> Vec3 {
        self.eye
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::ZERO,
            60f32.to_radians(),
            0.1,
            100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn view_proj_is_reasonable() {
        let cam = Camera::default();
        let vp = cam.view_proj(16.0 / 9.0);
        let inv = vp.inverse();
        let id = vp * inv;
        let eps = 1e-4;
        assert!(id.abs_diff_eq(Mat4::IDENTITY, eps));
    }

    #[test]
    fn cameras_get_distinct_ids() {
        let a = Camera::default();
        let b = Camera::default();
        let a2 = a;
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a2.id());
    }

    #[test]
    fn orthographic_keeps_depth_in_gl_clip_range() {
        let cam = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 5.0, 1.0, 20.0);
        let clip = cam.view_proj(1.0).project_point3(Vec3::ZERO);
        assert!(clip.z > -1.0 && clip.z < 1.0);
    }
}

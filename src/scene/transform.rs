use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// `self` applied after `child`, i.e. the child's transform in the
    /// space `self` lives in.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix() {
        assert!(Transform::default().matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn scale_applies_before_translation() {
        let transform = Transform::from_trs(Vec3::new(0.0, 0.0, -2.0), Quat::IDENTITY, Vec3::splat(3.0));
        let moved = transform.matrix().transform_point3(Vec3::Y);
        assert!(moved.abs_diff_eq(Vec3::new(0.0, 3.0, -2.0), 1e-6));
    }

    #[test]
    fn composition_agrees_with_matrices() {
        let parent = Transform::from_trs(Vec3::Y, Quat::from_rotation_x(0.3), Vec3::splat(0.5));
        let child = Transform::from_trs(Vec3::new(2.0, 0.0, -1.0), Quat::from_rotation_z(1.1), Vec3::ONE);
        let expected = parent.matrix() * child.matrix();
        assert!(parent.mul_transform(&child).matrix().abs_diff_eq(expected, 1e-5));
    }
}

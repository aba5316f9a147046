// renderer/uniforms.rs
// Typed uniform values and their upload. Texture-valued uniforms are bound
// by the texture binder and only their sampler unit is uploaded here.

use std::collections::BTreeMap;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::asset::Handle;
use crate::renderer::gl::{GlContext, UniformLocation};
use crate::renderer::render_target::RenderTarget;
use crate::renderer::texture::Texture;

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    Vec2Array(Vec<Vec2>),
    Vec3Array(Vec<Vec3>),
    Vec4Array(Vec<Vec4>),
    Mat4Array(Vec<Mat4>),
    Texture(Option<Handle<Texture>>),
    TextureArray(Vec<Option<Handle<Texture>>>),
    /// Samples the colour attachment of a render target.
    RenderTarget(Option<Handle<RenderTarget>>),
    RenderTargetArray(Vec<Handle<RenderTarget>>),
}

impl UniformValue {
    pub fn is_sampler(&self) -> bool {
        matches!(
            self,
            UniformValue::Texture(_)
                | UniformValue::TextureArray(_)
                | UniformValue::RenderTarget(_)
                | UniformValue::RenderTargetArray(_)
        )
    }
}

/// Uniform name to value, ordered so uploads are deterministic.
pub type Uniforms = BTreeMap<String, UniformValue>;

/// Uploads a non-sampler value. Returns false for sampler variants, which
/// need texture units first.
pub fn upload_value(gl: &mut dyn GlContext, location: UniformLocation, value: &UniformValue) -> bool {
    match value {
        UniformValue::Int(v) => gl.uniform_1i(location, *v),
        UniformValue::Float(v) => gl.uniform_1f(location, *v),
        UniformValue::Vec2(v) => gl.uniform_2f(location, v.x, v.y),
        UniformValue::Vec3(v) => gl.uniform_3f(location, v.x, v.y, v.z),
        UniformValue::Vec4(v) => gl.uniform_4f(location, v.x, v.y, v.z, v.w),
        UniformValue::Mat3(m) => gl.uniform_matrix_3fv(location, &m.to_cols_array()),
        UniformValue::Mat4(m) => gl.uniform_matrix_4fv(location, &m.to_cols_array()),
        UniformValue::IntArray(values) => gl.uniform_1iv(location, values),
        UniformValue::FloatArray(values) => gl.uniform_1fv(location, values),
        UniformValue::Vec2Array(values) => {
            gl.uniform_2fv(location, bytemuck::cast_slice(values.as_slice()))
        }
        UniformValue::Vec3Array(values) => {
            gl.uniform_3fv(location, bytemuck::cast_slice(values.as_slice()))
        }
        UniformValue::Vec4Array(values) => {
            gl.uniform_4fv(location, bytemuck::cast_slice(values.as_slice()))
        }
        UniformValue::Mat4Array(values) => {
            gl.uniform_matrix_4fv(location, bytemuck::cast_slice(values.as_slice()))
        }
        UniformValue::Texture(_)
        | UniformValue::TextureArray(_)
        | UniformValue::RenderTarget(_)
        | UniformValue::RenderTargetArray(_) => return false,
    }
    true
}

/// Hands out sampler units for one draw.
#[derive(Debug, Clone)]
pub struct TextureUnits {
    next: u32,
    max: u32,
}

impl TextureUnits {
    pub fn new(max: u32) -> Self {
        Self { next: 0, max }
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Past the hardware limit this warns and still returns the unit.
    pub fn allocate(&mut self) -> u32 {
        let unit = self.next;
        if unit >= self.max {
            log::warn!(
                "Trying to use {} texture units while this GPU supports only {}",
                unit + 1,
                self.max
            );
        }
        self.next += 1;
        unit
    }

    pub fn allocated(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gl::{GlCall, RecordingContext};

    #[test]
    fn arrays_upload_flat_floats() {
        let mut gl = RecordingContext::new();
        let location = UniformLocation(7);
        upload_value(
            &mut gl,
            location,
            &UniformValue::Vec3Array(vec![Vec3::X, Vec3::Y]),
        );
        upload_value(&mut gl, location, &UniformValue::Mat4(Mat4::IDENTITY));

        let log = gl.log();
        let log = log.borrow();
        assert_eq!(
            log.calls()[0],
            GlCall::UniformF(location, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
        );
        assert!(matches!(&log.calls()[1], GlCall::UniformMatrix(_, v) if v.len() == 16));
    }

    #[test]
    fn samplers_are_left_to_the_texture_binder() {
        let mut gl = RecordingContext::new();
        assert!(!upload_value(&mut gl, UniformLocation(1), &UniformValue::Texture(None)));
        assert!(gl.log().borrow().is_empty());
    }

    #[test]
    fn texture_units_count_past_the_limit() {
        let mut units = TextureUnits::new(2);
        assert_eq!(units.allocate(), 0);
        assert_eq!(units.allocate(), 1);
        // over the limit: warns, still hands out the unit
        assert_eq!(units.allocate(), 2);
        units.reset();
        assert_eq!(units.allocate(), 0);
    }
}

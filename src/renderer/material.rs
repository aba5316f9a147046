// renderer/material.rs

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;
use glam::{Vec2, Vec3};

use crate::asset::Handle;
use crate::renderer::gl::{BlendEquation, BlendFactor, CompareFunc, Precision};
use crate::renderer::texture::Texture;
use crate::renderer::uniforms::Uniforms;

bitflags! {
    /// What a material's program reacts to. Resolved once when the program
    /// is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFeatures: u32 {
        const LIGHTS = 1 << 0;
        const FOG = 1 << 1;
        const SKINNING = 1 << 2;
        const MORPH = 1 << 3;
        const ENV_MAP = 1 << 4;
        const CAMERA_POSITION = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Blend equation and factors for `Blending::Custom`. Alpha values default
/// to the colour ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomBlend {
    pub equation: BlendEquation,
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub equation_alpha: Option<BlendEquation>,
    pub src_alpha: Option<BlendFactor>,
    pub dst_alpha: Option<BlendFactor>,
}

impl CustomBlend {
    pub fn new(equation: BlendEquation, src: BlendFactor, dst: BlendFactor) -> Self {
        Self {
            equation,
            src,
            dst,
            equation_alpha: None,
            src_alpha: None,
            dst_alpha: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blending {
    None,
    #[default]
    Normal,
    Additive,
    Subtractive,
    Multiply,
    Custom(CustomBlend),
}

/// How the environment map mixes with the surface colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combine {
    #[default]
    Multiply,
    Mix,
    Add,
}

/// User-supplied GLSL. The renderer still prepends its defines and standard
/// declarations.
#[derive(Debug, Clone, Default)]
pub struct ShaderMaterial {
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub uniforms: Uniforms,
    /// Extra attribute names the binder should look up.
    pub attributes: Vec<String>,
    pub defines: BTreeMap<String, String>,
    pub lights: bool,
    pub fog: bool,
}

#[derive(Debug, Clone)]
pub enum MaterialKind {
    Basic,
    Lambert,
    Phong,
    LineBasic,
    LineDashed,
    Points,
    Depth,
    Normal,
    Shader(Box<ShaderMaterial>),
}

impl MaterialKind {
    pub fn name(&self) -> &'static str {
        match self {
            MaterialKind::Basic => "basic",
            MaterialKind::Lambert => "lambert",
            MaterialKind::Phong => "phong",
            MaterialKind::LineBasic => "line_basic",
            MaterialKind::LineDashed => "line_dashed",
            MaterialKind::Points => "points",
            MaterialKind::Depth => "depth",
            MaterialKind::Normal => "normal",
            MaterialKind::Shader(_) => "shader",
        }
    }

    pub fn features(&self) -> MaterialFeatures {
        use MaterialFeatures as F;
        match self {
            MaterialKind::Basic => F::FOG | F::SKINNING | F::MORPH | F::ENV_MAP | F::CAMERA_POSITION,
            MaterialKind::Lambert => {
                F::LIGHTS | F::FOG | F::SKINNING | F::MORPH | F::ENV_MAP | F::CAMERA_POSITION
            }
            MaterialKind::Phong => F::all(),
            MaterialKind::LineBasic | MaterialKind::LineDashed | MaterialKind::Points => F::FOG,
            MaterialKind::Depth | MaterialKind::Normal => F::SKINNING | F::MORPH,
            MaterialKind::Shader(shader) => {
                let mut features = F::SKINNING | F::MORPH | F::CAMERA_POSITION;
                features.set(F::LIGHTS, shader.lights);
                features.set(F::FOG, shader.fog);
                features
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    pub kind: MaterialKind,
    pub name: String,
    pub visible: bool,

    // colour terms
    pub color: Vec3,
    pub opacity: f32,
    pub transparent: bool,
    pub emissive: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub vertex_colors: bool,

    // maps
    pub map: Option<Handle<Texture>>,
    pub light_map: Option<Handle<Texture>>,
    pub specular_map: Option<Handle<Texture>>,
    pub alpha_map: Option<Handle<Texture>>,
    pub env_map: Option<Handle<Texture>>,
    pub normal_map: Option<Handle<Texture>>,
    pub bump_map: Option<Handle<Texture>>,
    pub emissive_map: Option<Handle<Texture>>,
    pub normal_scale: Vec2,
    pub bump_scale: f32,
    pub combine: Combine,
    pub reflectivity: f32,
    pub refraction_ratio: f32,

    // lines and points
    pub line_width: f32,
    pub dash_size: f32,
    pub gap_size: f32,
    pub dash_scale: f32,
    pub size: f32,
    pub size_attenuation: bool,

    // depth material
    pub near: f32,
    pub far: f32,

    // pipeline state
    pub blending: Blending,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_func: CompareFunc,
    pub color_write: bool,
    pub polygon_offset: bool,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,
    pub side: Side,
    pub alpha_test: f32,
    pub flat_shading: bool,
    pub wireframe: bool,
    pub wireframe_line_width: f32,
    pub fog: bool,

    // deformation
    pub skinning: bool,
    pub morph_targets: bool,
    pub morph_normals: bool,

    pub precision: Option<Precision>,
    /// Constant values for attributes the program wants but the geometry
    /// lacks.
    pub default_attribute_values: HashMap<String, Vec<f32>>,

    version: u64,
}

impl Material {
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            kind,
            name: String::new(),
            visible: true,
            color: Vec3::ONE,
            opacity: 1.0,
            transparent: false,
            emissive: Vec3::ZERO,
            specular: Vec3::splat(0.067),
            shininess: 30.0,
            vertex_colors: false,
            map: None,
            light_map: None,
            specular_map: None,
            alpha_map: None,
            env_map: None,
            normal_map: None,
            bump_map: None,
            emissive_map: None,
            normal_scale: Vec2::ONE,
            bump_scale: 1.0,
            combine: Combine::default(),
            reflectivity: 1.0,
            refraction_ratio: 0.98,
            line_width: 1.0,
            dash_size: 3.0,
            gap_size: 1.0,
            dash_scale: 1.0,
            size: 1.0,
            size_attenuation: true,
            near: 1.0,
            far: 1000.0,
            blending: Blending::Normal,
            depth_test: true,
            depth_write: true,
            depth_func: CompareFunc::LessEqual,
            color_write: true,
            polygon_offset: false,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            side: Side::Front,
            alpha_test: 0.0,
            flat_shading: false,
            wireframe: false,
            wireframe_line_width: 1.0,
            fog: true,
            skinning: false,
            morph_targets: false,
            morph_normals: false,
            precision: None,
            default_attribute_values: Self::standard_default_attributes(),
            version: 0,
        }
    }

    fn standard_default_attributes() -> HashMap<String, Vec<f32>> {
        let mut values = HashMap::new();
        values.insert("color".to_string(), vec![1.0, 1.0, 1.0]);
        values.insert("uv".to_string(), vec![0.0, 0.0]);
        values.insert("uv2".to_string(), vec![0.0, 0.0]);
        values
    }

    pub fn basic(color: Vec3) -> Self {
        Self::new(MaterialKind::Basic).with_color(color)
    }

    pub fn lambert(color: Vec3) -> Self {
        Self::new(MaterialKind::Lambert).with_color(color)
    }

    pub fn phong(color: Vec3) -> Self {
        Self::new(MaterialKind::Phong).with_color(color)
    }

    pub fn line_basic(color: Vec3) -> Self {
        Self::new(MaterialKind::LineBasic).with_color(color)
    }

    pub fn line_dashed(color: Vec3, dash_size: f32, gap_size: f32) -> Self {
        let mut material = Self::new(MaterialKind::LineDashed).with_color(color);
        material.dash_size = dash_size;
        material.gap_size = gap_size;
        material
    }

    pub fn points(color: Vec3, size: f32) -> Self {
        let mut material = Self::new(MaterialKind::Points).with_color(color);
        material.size = size;
        material
    }

    pub fn depth() -> Self {
        let mut material = Self::new(MaterialKind::Depth);
        material.blending = Blending::None;
        material
    }

    pub fn normal() -> Self {
        Self::new(MaterialKind::Normal)
    }

    pub fn shader(shader: ShaderMaterial) -> Self {
        Self::new(MaterialKind::Shader(Box::new(shader)))
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the material transparent with the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = true;
        self
    }

    pub fn with_map(mut self, map: Handle<Texture>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_blending(mut self, blending: Blending) -> Self {
        self.blending = blending;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_wireframe(mut self) -> Self {
        self.wireframe = true;
        self
    }

    pub fn with_skinning(mut self) -> Self {
        self.skinning = true;
        self
    }

    pub fn with_morph_targets(mut self, normals: bool) -> Self {
        self.morph_targets = true;
        self.morph_normals = normals;
        self
    }

    pub fn features(&self) -> MaterialFeatures {
        self.kind.features()
    }

    /// Forces the program to be rebuilt on the next draw. Needed after
    /// changing anything that feeds the program key (maps, flags, kind).
    pub fn needs_update(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn uses_fog(&self) -> bool {
        self.fog && self.features().contains(MaterialFeatures::FOG)
    }

    pub fn uses_lights(&self) -> bool {
        self.features().contains(MaterialFeatures::LIGHTS)
    }

    pub fn shader_material(&self) -> Option<&ShaderMaterial> {
        match &self.kind {
            MaterialKind::Shader(shader) => Some(shader),
            _ => None,
        }
    }

    pub fn shader_material_mut(&mut self) -> Option<&mut ShaderMaterial> {
        match &mut self.kind {
            MaterialKind::Shader(shader) => Some(shader),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_update_bumps_version() {
        let mut material = Material::basic(Vec3::X);
        let before = material.version();
        material.needs_update();
        assert_ne!(material.version(), before);
    }

    #[test]
    fn features_follow_kind() {
        assert!(Material::lambert(Vec3::ONE).uses_lights());
        assert!(!Material::basic(Vec3::ONE).uses_lights());
        assert!(!Material::depth().uses_fog());

        let shader = Material::shader(ShaderMaterial {
            lights: true,
            ..ShaderMaterial::default()
        });
        assert!(shader.uses_lights());
        assert!(!shader.uses_fog());
    }

    #[test]
    fn opacity_builder_marks_transparent() {
        let material = Material::phong(Vec3::Z).with_opacity(0.5);
        assert!(material.transparent);
        assert_eq!(material.opacity, 0.5);
    }
}

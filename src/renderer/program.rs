// renderer/program.rs
// Linked programs and the parameters that select them. Two materials whose
// parameters produce the same key share one GL program.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::renderer::capabilities::Capabilities;
use crate::renderer::gl::{GlProgram, Precision, UniformLocation};
use crate::renderer::lights::LightsHash;
use crate::renderer::material::{Material, MaterialFeatures, MaterialKind, Side};
use crate::scene::{FogMode, Skeleton};
use crate::settings::{RenderSettings, ShadowMapKind};

/// Bone matrices a bone texture can hold.
pub const MAX_TEXTURE_BONES: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(u32);

impl ProgramHandle {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
pub struct Program {
    handle: ProgramHandle,
    key: String,
    gl_program: GlProgram,
    /// Active attributes ordered by location.
    attributes: Vec<(String, u32)>,
    uniforms: HashMap<String, UniformLocation>,
    pub(crate) used_times: u32,
    /// Light accumulator version last uploaded into this program.
    pub(crate) lights_version: Option<u64>,
}

impl Program {
    pub(crate) fn new(
        handle: ProgramHandle,
        key: String,
        gl_program: GlProgram,
        mut attributes: Vec<(String, u32)>,
        uniforms: HashMap<String, UniformLocation>,
    ) -> Self {
        attributes.sort_by_key(|(_, location)| *location);
        Self {
            handle,
            key,
            gl_program,
            attributes,
            uniforms,
            used_times: 1,
            lights_version: None,
        }
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn gl_program(&self) -> GlProgram {
        self.gl_program
    }

    pub fn attributes(&self) -> &[(String, u32)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, location)| *location)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, UniformLocation)> {
        self.uniforms
            .iter()
            .map(|(name, location)| (name.as_str(), *location))
    }

    pub fn used_times(&self) -> u32 {
        self.used_times
    }
}

/// Per-draw facts that feed the program parameters besides the material.
pub struct ParameterContext<'a> {
    pub caps: &'a Capabilities,
    pub settings: &'a RenderSettings,
    pub lights: LightsHash,
    pub fog: FogMode,
    pub skeleton: Option<&'a Skeleton>,
    pub receive_shadow: bool,
}

/// Everything that changes the generated shader source.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramParameters {
    pub precision: Precision,
    pub supports_vertex_textures: bool,
    pub standard_derivatives: bool,

    pub map: bool,
    pub env_map: bool,
    pub light_map: bool,
    pub specular_map: bool,
    pub alpha_map: bool,
    pub normal_map: bool,
    pub bump_map: bool,
    pub emissive_map: bool,

    pub vertex_colors: bool,
    pub fog: FogMode,
    pub flat_shading: bool,
    pub size_attenuation: bool,
    pub logarithmic_depth_buffer: bool,

    pub skinning: bool,
    pub max_bones: u32,
    pub use_vertex_texture: bool,

    pub morph_targets: bool,
    pub morph_normals: bool,
    pub max_morph_targets: u32,
    pub max_morph_normals: u32,

    pub max_dir_lights: usize,
    pub max_point_lights: usize,
    pub max_spot_lights: usize,
    pub max_hemi_lights: usize,
    pub max_shadows: usize,
    pub shadow_map_enabled: bool,
    pub shadow_map_type: ShadowMapKind,

    pub alpha_test: f32,
    pub double_sided: bool,
    pub flip_sided: bool,
    pub premultiplied_alpha: bool,
    pub gamma_input: bool,
    pub gamma_output: bool,
    pub gamma_factor: f32,

    pub defines: BTreeMap<String, String>,
}

impl ProgramParameters {
    pub fn from_material(material: &Material, ctx: &ParameterContext<'_>) -> Self {
        let features = material.features();
        let caps = ctx.caps;
        let settings = ctx.settings;

        let precision = match material.precision {
            Some(requested) if requested > caps.precision => {
                log::warn!(
                    "Material '{}' asks for {} precision, using {}",
                    material.name,
                    requested.as_str(),
                    caps.precision.as_str()
                );
                caps.precision
            }
            Some(requested) => requested,
            None => caps.precision,
        };

        let lights = if features.contains(MaterialFeatures::LIGHTS) {
            ctx.lights
        } else {
            LightsHash::default()
        };
        let shadow_map_enabled =
            settings.shadow_map.enabled && ctx.receive_shadow && ctx.lights.shadows > 0;

        let skinning = material.skinning && features.contains(MaterialFeatures::SKINNING);
        let (max_bones, use_vertex_texture) = allocate_bones(caps, ctx.skeleton);

        let morph_targets = material.morph_targets && features.contains(MaterialFeatures::MORPH);
        let morph_normals = morph_targets && material.morph_normals;

        let fog = if material.uses_fog() { ctx.fog } else { FogMode::None };

        let flat_shading = material.flat_shading;
        let normal_map = material.normal_map.is_some();
        let bump_map = material.bump_map.is_some();

        Self {
            precision,
            supports_vertex_textures: caps.vertex_textures(),
            standard_derivatives: caps.standard_derivatives()
                && (flat_shading || normal_map || bump_map),
            map: material.map.is_some(),
            env_map: material.env_map.is_some() && features.contains(MaterialFeatures::ENV_MAP),
            light_map: material.light_map.is_some(),
            specular_map: material.specular_map.is_some(),
            alpha_map: material.alpha_map.is_some(),
            normal_map,
            bump_map,
            emissive_map: material.emissive_map.is_some(),
            vertex_colors: material.vertex_colors,
            fog,
            flat_shading,
            size_attenuation: material.size_attenuation,
            logarithmic_depth_buffer: settings.logarithmic_depth_buffer
                && caps.logarithmic_depth_buffer(),
            skinning,
            max_bones: if skinning { max_bones } else { 0 },
            use_vertex_texture: skinning && use_vertex_texture,
            morph_targets,
            morph_normals,
            max_morph_targets: if morph_targets {
                settings.max_morph_targets
            } else {
                0
            },
            max_morph_normals: if morph_normals {
                settings.max_morph_normals
            } else {
                0
            },
            max_dir_lights: lights.directional,
            max_point_lights: lights.point,
            max_spot_lights: lights.spot,
            max_hemi_lights: lights.hemisphere,
            max_shadows: if shadow_map_enabled { ctx.lights.shadows } else { 0 },
            shadow_map_enabled,
            shadow_map_type: settings.shadow_map.kind,
            alpha_test: material.alpha_test,
            double_sided: material.side == Side::Double,
            flip_sided: material.side == Side::Back,
            premultiplied_alpha: settings.premultiplied_alpha,
            gamma_input: settings.gamma_input,
            gamma_output: settings.gamma_output,
            gamma_factor: settings.gamma_factor,
            defines: material
                .shader_material()
                .map(|shader| shader.defines.clone())
                .unwrap_or_default(),
        }
    }

    /// Program cache key: the source identifier followed by every
    /// parameter as `name=value`.
    pub fn cache_key(&self, source_id: &str) -> String {
        let mut key = String::with_capacity(source_id.len() + 512);
        key.push_str(source_id);

        let mut push = |name: &str, value: &dyn std::fmt::Display| {
            let _ = write!(key, ",{}={}", name, value);
        };

        push("precision", &self.precision.as_str());
        push("supportsVertexTextures", &self.supports_vertex_textures);
        push("standardDerivatives", &self.standard_derivatives);
        push("map", &self.map);
        push("envMap", &self.env_map);
        push("lightMap", &self.light_map);
        push("specularMap", &self.specular_map);
        push("alphaMap", &self.alpha_map);
        push("normalMap", &self.normal_map);
        push("bumpMap", &self.bump_map);
        push("emissiveMap", &self.emissive_map);
        push("vertexColors", &self.vertex_colors);
        push("fog", &self.fog.as_str());
        push("flatShading", &self.flat_shading);
        push("sizeAttenuation", &self.size_attenuation);
        push("logarithmicDepthBuffer", &self.logarithmic_depth_buffer);
        push("skinning", &self.skinning);
        push("maxBones", &self.max_bones);
        push("useVertexTexture", &self.use_vertex_texture);
        push("morphTargets", &self.morph_targets);
        push("morphNormals", &self.morph_normals);
        push("maxMorphTargets", &self.max_morph_targets);
        push("maxMorphNormals", &self.max_morph_normals);
        push("maxDirLights", &self.max_dir_lights);
        push("maxPointLights", &self.max_point_lights);
        push("maxSpotLights", &self.max_spot_lights);
        push("maxHemiLights", &self.max_hemi_lights);
        push("maxShadows", &self.max_shadows);
        push("shadowMapEnabled", &self.shadow_map_enabled);
        push("shadowMapType", &self.shadow_map_type.define());
        push("alphaTest", &self.alpha_test);
        push("doubleSided", &self.double_sided);
        push("flipSided", &self.flip_sided);
        push("premultipliedAlpha", &self.premultiplied_alpha);
        push("gammaInput", &self.gamma_input);
        push("gammaOutput", &self.gamma_output);
        push("gammaFactor", &self.gamma_factor);
        for (name, value) in &self.defines {
            let _ = write!(key, ",define:{}={}", name, value);
        }
        key
    }

    fn uses_uv(&self) -> bool {
        self.map
            || self.specular_map
            || self.alpha_map
            || self.normal_map
            || self.bump_map
            || self.emissive_map
    }

    fn common_defines(&self, out: &mut String, shader_name: &str) {
        let precision = self.precision.as_str();
        let _ = writeln!(out, "precision {} float;", precision);
        let _ = writeln!(out, "precision {} int;", precision);
        let _ = writeln!(out, "#define SHADER_NAME {}", shader_name);
        for (name, value) in &self.defines {
            let _ = writeln!(out, "#define {} {}", name, value);
        }

        let _ = writeln!(out, "#define MAX_DIR_LIGHTS {}", self.max_dir_lights);
        let _ = writeln!(out, "#define MAX_POINT_LIGHTS {}", self.max_point_lights);
        let _ = writeln!(out, "#define MAX_SPOT_LIGHTS {}", self.max_spot_lights);
        let _ = writeln!(out, "#define MAX_HEMI_LIGHTS {}", self.max_hemi_lights);
        let _ = writeln!(out, "#define MAX_SHADOWS {}", self.max_shadows);
        let _ = writeln!(out, "#define GAMMA_FACTOR {:?}", self.gamma_factor);

        let flags = [
            (self.gamma_input, "GAMMA_INPUT"),
            (self.gamma_output, "GAMMA_OUTPUT"),
            (self.map, "USE_MAP"),
            (self.env_map, "USE_ENVMAP"),
            (self.light_map, "USE_LIGHTMAP"),
            (self.light_map, "USE_UV2"),
            (self.specular_map, "USE_SPECULARMAP"),
            (self.alpha_map, "USE_ALPHAMAP"),
            (self.normal_map, "USE_NORMALMAP"),
            (self.bump_map, "USE_BUMPMAP"),
            (self.emissive_map, "USE_EMISSIVEMAP"),
            (self.uses_uv(), "USE_UV"),
            (self.vertex_colors, "USE_COLOR"),
            (self.flat_shading, "FLAT_SHADED"),
            (self.double_sided, "DOUBLE_SIDED"),
            (self.flip_sided, "FLIP_SIDED"),
            (self.shadow_map_enabled, "USE_SHADOWMAP"),
            (self.logarithmic_depth_buffer, "USE_LOGDEPTHBUF"),
        ];
        for (enabled, define) in flags {
            if enabled {
                let _ = writeln!(out, "#define {}", define);
            }
        }
        if self.shadow_map_enabled {
            let _ = writeln!(out, "#define {}", self.shadow_map_type.define());
        }
    }

    /// Defines and standard declarations placed before the vertex body.
    pub fn vertex_prefix(&self, shader_name: &str) -> String {
        let mut out = String::with_capacity(2048);
        self.common_defines(&mut out, shader_name);

        if self.supports_vertex_textures {
            out.push_str("#define VERTEX_TEXTURES\n");
        }
        if self.skinning {
            out.push_str("#define USE_SKINNING\n");
            if self.use_vertex_texture {
                out.push_str("#define BONE_TEXTURE\n");
            }
        }
        let _ = writeln!(out, "#define MAX_BONES {}", self.max_bones);
        if self.morph_targets {
            out.push_str("#define USE_MORPHTARGETS\n");
        }
        if self.morph_normals {
            out.push_str("#define USE_MORPHNORMALS\n");
        }
        let _ = writeln!(out, "#define MAX_MORPH_TARGETS {}", self.morph_target_slots());
        let _ = writeln!(out, "#define MAX_MORPH_NORMALS {}", self.max_morph_normals);
        if self.size_attenuation {
            out.push_str("#define USE_SIZEATTENUATION\n");
        }

        out.push_str(
            "uniform mat4 modelMatrix;\n\
             uniform mat4 modelViewMatrix;\n\
             uniform mat4 projectionMatrix;\n\
             uniform mat4 viewMatrix;\n\
             uniform mat3 normalMatrix;\n\
             uniform vec3 cameraPosition;\n\
             attribute vec3 position;\n\
             attribute vec3 normal;\n\
             attribute vec2 uv;\n\
             attribute vec2 uv2;\n",
        );
        if self.vertex_colors {
            out.push_str("attribute vec3 color;\n");
        }
        for i in 0..self.morph_target_slots() {
            let _ = writeln!(out, "attribute vec3 morphTarget{};", i);
        }
        for i in 0..self.max_morph_normals {
            let _ = writeln!(out, "attribute vec3 morphNormal{};", i);
        }
        if self.skinning {
            out.push_str("attribute vec4 skinIndex;\nattribute vec4 skinWeight;\n");
        }
        out
    }

    /// Defines and standard declarations placed before the fragment body.
    pub fn fragment_prefix(&self, shader_name: &str) -> String {
        let mut out = String::with_capacity(1024);
        if self.standard_derivatives {
            out.push_str("#extension GL_OES_standard_derivatives : enable\n");
        }
        self.common_defines(&mut out, shader_name);

        if self.alpha_test > 0.0 {
            let _ = writeln!(out, "#define ALPHATEST {:?}", self.alpha_test);
        }
        match self.fog {
            FogMode::None => {}
            FogMode::Linear => out.push_str("#define USE_FOG\n"),
            FogMode::Exp2 => out.push_str("#define USE_FOG\n#define FOG_EXP2\n"),
        }
        if self.premultiplied_alpha {
            out.push_str("#define PREMULTIPLIED_ALPHA\n");
        }

        out.push_str("uniform mat4 viewMatrix;\nuniform vec3 cameraPosition;\n");
        out
    }

    /// Morph target attributes the vertex shader declares. Morph normals
    /// share the attribute budget with the targets.
    fn morph_target_slots(&self) -> u32 {
        if self.morph_normals {
            self.max_morph_normals
        } else {
            self.max_morph_targets
        }
    }
}

/// Bone matrices the vertex shader can address, and whether they come from
/// a float texture instead of uniforms.
pub(crate) fn allocate_bones(caps: &Capabilities, skeleton: Option<&Skeleton>) -> (u32, bool) {
    if let Some(skeleton) = skeleton {
        if caps.float_vertex_textures() && skeleton.use_vertex_texture {
            return (MAX_TEXTURE_BONES, true);
        }
    }

    // four vectors per matrix, twenty reserved for the standard uniforms
    let budget = caps.max_vertex_uniforms.saturating_sub(20) / 4;
    match skeleton {
        Some(skeleton) => {
            let bones = skeleton.bones.len() as u32;
            if bones > budget {
                log::warn!(
                    "Skeleton has {} bones, this GPU supports {}",
                    bones,
                    budget
                );
            }
            (bones.min(budget), false)
        }
        None => (budget, false),
    }
}

/// Identifier of the shader source a material compiles from.
pub fn source_id(kind: &MaterialKind) -> String {
    match kind {
        MaterialKind::Shader(shader) => {
            format!("{}\n{}", shader.vertex_shader, shader.fragment_shader)
        }
        other => other.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gl::{GlLimits, RecordingContext};
    use glam::Vec3;

    fn context<'a>(caps: &'a Capabilities, settings: &'a RenderSettings) -> ParameterContext<'a> {
        ParameterContext {
            caps,
            settings,
            lights: LightsHash {
                directional: 1,
                ..LightsHash::default()
            },
            fog: FogMode::Linear,
            skeleton: None,
            receive_shadow: false,
        }
    }

    #[test]
    fn unlit_materials_ignore_light_counts() {
        let gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        let settings = RenderSettings::default();
        let ctx = context(&caps, &settings);

        let basic = ProgramParameters::from_material(&Material::basic(Vec3::ONE), &ctx);
        let lambert = ProgramParameters::from_material(&Material::lambert(Vec3::ONE), &ctx);
        assert_eq!(basic.max_dir_lights, 0);
        assert_eq!(lambert.max_dir_lights, 1);
        assert_eq!(basic.fog, FogMode::Linear);
    }

    #[test]
    fn key_changes_with_any_parameter() {
        let gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        let settings = RenderSettings::default();
        let ctx = context(&caps, &settings);
        let params = ProgramParameters::from_material(&Material::phong(Vec3::ONE), &ctx);

        let key = params.cache_key("phong");
        assert!(key.starts_with("phong,precision=highp,"));
        assert!(key.contains(",maxDirLights=1,"));
        assert_eq!(key, params.clone().cache_key("phong"));

        let mut changed = params.clone();
        changed.alpha_test = 0.5;
        assert_ne!(key, changed.cache_key("phong"));
        assert_ne!(key, params.cache_key("lambert"));
    }

    #[test]
    fn bone_budget_follows_uniform_limit() {
        let gl = RecordingContext::new()
            .with_extensions(crate::renderer::gl::Extensions::empty())
            .with_limits(GlLimits {
                max_vertex_uniform_vectors: 128,
                ..GlLimits::default()
            });
        let caps = Capabilities::detect(&gl, Precision::High);
        let skeleton = Skeleton {
            bones: vec![glam::Mat4::IDENTITY; 40],
            use_vertex_texture: true,
            bone_texture: None,
        };
        // (128 - 20) / 4 = 27, no float textures so the skeleton is clamped
        assert_eq!(allocate_bones(&caps, Some(&skeleton)), (27, false));

        let gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        assert_eq!(
            allocate_bones(&caps, Some(&skeleton)),
            (MAX_TEXTURE_BONES, true)
        );
    }

    #[test]
    fn prefixes_carry_defines() {
        let gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        let settings = RenderSettings::default();
        let ctx = context(&caps, &settings);
        let mut material = Material::lambert(Vec3::ONE).with_morph_targets(false);
        material.alpha_test = 0.25;
        let params = ProgramParameters::from_material(&material, &ctx);

        let vertex = params.vertex_prefix("lambert");
        assert!(vertex.starts_with("precision highp float;"));
        assert!(vertex.contains("#define MAX_DIR_LIGHTS 1\n"));
        assert!(vertex.contains("#define USE_MORPHTARGETS\n"));
        assert!(vertex.contains("attribute vec3 morphTarget7;\n"));

        let fragment = params.fragment_prefix("lambert");
        assert!(fragment.contains("#define ALPHATEST 0.25\n"));
        assert!(fragment.contains("#define USE_FOG\n"));
        assert!(!fragment.contains("FOG_EXP2"));
    }
}

// renderer/refresh.rs
// Chooses the program for a draw and keeps its uniforms current. Camera,
// material and light uniforms are only sent when something they depend on
// changed; per-object matrices go up every draw.

use glam::{Mat3, Vec3, Vec4};

use crate::asset::{Assets, Handle};
use crate::renderer::collector::RenderItem;
use crate::renderer::error::RenderError;
use crate::renderer::gl::UniformLocation;
use crate::renderer::material::{Combine, Material, MaterialKind};
use crate::renderer::program::{allocate_bones, ParameterContext, ProgramHandle, ProgramParameters};
use crate::renderer::renderer_core::{CameraView, RenderCore};
use crate::renderer::shader_lib;
use crate::renderer::texture::{bone_texture_size, Texture};
use crate::renderer::textures::set_texture;
use crate::renderer::uniforms::{upload_value, UniformValue, Uniforms};
use crate::renderer::RenderTarget;
use crate::scene::{Fog, FogMode, MorphTargetInfluences, Scene, Skeleton};

impl RenderCore {
    /// Makes the program for `material_handle` current and uploads whatever
    /// uniforms the draw of `item` needs.
    pub(crate) fn set_program(
        &mut self,
        assets: &Assets,
        scene: &Scene,
        camera: &CameraView,
        material_handle: Handle<Material>,
        item: &RenderItem,
    ) -> Result<ProgramHandle, RenderError> {
        self.texture_units.reset();

        let material = assets
            .materials
            .get(material_handle)
            .ok_or(RenderError::InvalidHandle("material"))?;
        let skeleton = scene.world.get::<&Skeleton>(item.entity).ok();
        let skeleton = skeleton.as_deref();

        let fog = FogMode::of(scene.fog.as_ref());
        let lights_hash = self.lights.hash();
        let version = material.version();

        let entry = self.properties.material_entry(material_handle);
        if entry.failed_version == Some(version) {
            return Err(RenderError::MaterialUnavailable);
        }
        let needs_update = match entry.program {
            None => true,
            Some(_) => {
                entry.version != Some(version)
                    || (material.uses_lights() && entry.lights_hash != lights_hash)
                    || (material.uses_fog() && entry.fog != fog)
            }
        };

        let mut initialised = false;
        if needs_update {
            self.init_material(material_handle, material, fog, skeleton, item.receive_shadow)?;
            initialised = true;
        }

        let entry = self.properties.material_entry(material_handle);
        let program_handle = entry
            .program
            .ok_or(RenderError::MaterialUnavailable)?;
        let program = self
            .programs
            .get(program_handle)
            .ok_or(RenderError::InvalidHandle("program"))?;

        let refresh_program = self.state.use_program(self.gl.as_mut(), program.gl_program());
        let refresh_material =
            refresh_program || initialised || self.frame.material != Some(material_handle);
        self.frame.material = Some(material_handle);

        let gl = self.gl.as_mut();

        if refresh_program || self.frame.camera != Some(camera.id) {
            self.frame.camera = Some(camera.id);
            upload_at(gl, program.uniform("projectionMatrix"), &UniformValue::Mat4(camera.projection));
            upload_at(gl, program.uniform("viewMatrix"), &UniformValue::Mat4(camera.view));
            upload_at(gl, program.uniform("cameraPosition"), &UniformValue::Vec3(camera.position));
            if self.settings.logarithmic_depth_buffer {
                let fc = 2.0 / (camera.far + 1.0).log2();
                upload_at(gl, program.uniform("logDepthBufFC"), &UniformValue::Float(fc));
            }
        }

        if material.skinning {
            if let Some(skeleton) = skeleton {
                let bone_texture = skeleton
                    .bone_texture
                    .filter(|_| self.caps.float_vertex_textures() && skeleton.use_vertex_texture);
                match bone_texture {
                    Some(texture) => {
                        if let Some(location) = program.uniform("boneTexture") {
                            let unit = self.texture_units.allocate();
                            if let Err(err) = set_texture(
                                gl,
                                &mut self.state,
                                &self.caps,
                                &mut self.properties,
                                assets,
                                texture,
                                unit,
                            ) {
                                log::debug!("Bone texture unavailable: {}", err);
                            }
                            gl.uniform_1i(location, unit as i32);
                        }
                        let size = bone_texture_size(skeleton.bones.len()) as i32;
                        if let Some(location) = program.uniform("boneTextureWidth") {
                            gl.uniform_1i(location, size);
                        }
                        if let Some(location) = program.uniform("boneTextureHeight") {
                            gl.uniform_1i(location, size);
                        }
                    }
                    None => {
                        if let Some(location) = program.uniform("boneGlobalMatrices") {
                            let (budget, _) = allocate_bones(&self.caps, Some(skeleton));
                            let count = skeleton.bones.len().min(budget as usize);
                            gl.uniform_matrix_4fv(
                                location,
                                bytemuck::cast_slice(&skeleton.bones[..count]),
                            );
                        }
                    }
                }
            }
        }

        let refresh_lights =
            material.uses_lights() && program.lights_version != Some(self.lights.version());

        if refresh_material {
            let mut uniforms = std::mem::take(&mut self.properties.material_entry(material_handle).uniforms);

            if material.uses_fog() {
                if let Some(fog) = &scene.fog {
                    refresh_fog(&mut uniforms, fog, self.settings.gamma_input);
                }
            }
            refresh_kind(&mut uniforms, material, assets, self.settings.gamma_input, self.height);
            if material.uses_lights() {
                for (name, value) in self.lights.uniforms() {
                    overwrite(&mut uniforms, name, value);
                }
            }
            if item.receive_shadow && !self.shadows.is_empty() {
                self.refresh_shadows(&mut uniforms);
            }

            self.upload_uniforms(assets, program_handle, &uniforms);
            self.properties.material_entry(material_handle).uniforms = uniforms;
        } else if refresh_lights {
            let gl = self.gl.as_mut();
            for (name, value) in self.lights.uniforms() {
                upload_at(gl, program.uniform(name), &value);
            }
        }

        if refresh_lights {
            if let Some(program) = self.programs.get_mut(program_handle) {
                program.lights_version = Some(self.lights.version());
            }
            self.info.render.light_refreshes += 1;
        }

        self.upload_object_uniforms(scene, camera, material, program_handle, item);
        Ok(program_handle)
    }

    /// Builds (or fetches) the program for the material's current state
    /// and resets its uniform map. A failure marks the version unusable.
    pub(crate) fn init_material(
        &mut self,
        material_handle: Handle<Material>,
        material: &Material,
        fog: FogMode,
        skeleton: Option<&Skeleton>,
        receive_shadow: bool,
    ) -> Result<(), RenderError> {
        let lights = self.lights.hash();
        let parameters = ProgramParameters::from_material(
            material,
            &ParameterContext {
                caps: &self.caps,
                settings: &self.settings,
                lights,
                fog,
                skeleton,
                receive_shadow,
            },
        );
        let uniforms = shader_lib::default_uniforms(&material.kind);
        let previous = self.properties.material_entry(material_handle).program.take();

        // acquire before releasing so a shared program is not relinked
        let acquired = self
            .programs
            .acquire(self.gl.as_mut(), material, &parameters, &uniforms);
        if let Some(previous) = previous {
            self.programs.release(self.gl.as_mut(), previous);
        }

        let entry = self.properties.material_entry(material_handle);
        match acquired {
            Ok(program) => {
                entry.program = Some(program);
                entry.version = Some(material.version());
                entry.failed_version = None;
                entry.lights_hash = lights;
                entry.fog = fog;
                entry.features = Some(material.features());
                entry.uniforms = uniforms;
                self.info.memory.programs = self.programs.count();
                Ok(())
            }
            Err(err) => {
                entry.failed_version = Some(material.version());
                entry.version = None;
                self.info.memory.programs = self.programs.count();
                Err(err)
            }
        }
    }

    fn refresh_shadows(&self, uniforms: &mut Uniforms) {
        let maps = &self.shadows;
        overwrite(
            uniforms,
            "shadowMap",
            UniformValue::RenderTargetArray(maps.iter().map(|m| m.target).collect()),
        );
        overwrite(
            uniforms,
            "shadowMapSize",
            UniformValue::Vec2Array(maps.iter().map(|m| m.size).collect()),
        );
        overwrite(
            uniforms,
            "shadowBias",
            UniformValue::FloatArray(maps.iter().map(|m| m.bias).collect()),
        );
        overwrite(
            uniforms,
            "shadowDarkness",
            UniformValue::FloatArray(maps.iter().map(|m| m.darkness).collect()),
        );
        overwrite(
            uniforms,
            "shadowMatrix",
            UniformValue::Mat4Array(maps.iter().map(|m| m.matrix).collect()),
        );
    }

    /// Sends every uniform the program declares. Samplers take units from
    /// the per-draw counter in map order.
    fn upload_uniforms(&mut self, assets: &Assets, program_handle: ProgramHandle, uniforms: &Uniforms) {
        let Some(program) = self.programs.get(program_handle) else {
            return;
        };
        let located: Vec<(UniformLocation, &UniformValue)> = uniforms
            .iter()
            .filter(|(_, value)| !is_empty_array(value))
            .filter_map(|(name, value)| program.uniform(name).map(|location| (location, value)))
            .collect();

        for (location, value) in located {
            if upload_value(self.gl.as_mut(), location, value) {
                continue;
            }

            match value {
                UniformValue::Texture(Some(texture)) => {
                    let unit = self.bind_texture(assets, *texture);
                    self.gl.uniform_1i(location, unit as i32);
                }
                UniformValue::TextureArray(textures) => {
                    let units: Vec<i32> = textures
                        .iter()
                        .flatten()
                        .map(|texture| self.bind_texture(assets, *texture) as i32)
                        .collect();
                    self.gl.uniform_1iv(location, &units);
                }
                UniformValue::RenderTarget(Some(target)) => {
                    let unit = self.bind_render_target(*target);
                    self.gl.uniform_1i(location, unit as i32);
                }
                UniformValue::RenderTargetArray(targets) => {
                    let units: Vec<i32> = targets
                        .iter()
                        .map(|target| self.bind_render_target(*target) as i32)
                        .collect();
                    self.gl.uniform_1iv(location, &units);
                }
                _ => {}
            }
        }
    }

    fn bind_texture(&mut self, assets: &Assets, texture: Handle<Texture>) -> u32 {
        let unit = self.texture_units.allocate();
        if let Err(err) = set_texture(
            self.gl.as_mut(),
            &mut self.state,
            &self.caps,
            &mut self.properties,
            assets,
            texture,
            unit,
        ) {
            log::debug!("Texture {} bound as empty: {}", texture.id(), err);
        }
        unit
    }

    /// Samples a render target's colour texture. Unallocated targets bind
    /// nothing.
    fn bind_render_target(&mut self, target: Handle<RenderTarget>) -> u32 {
        let unit = self.texture_units.allocate();
        let gl = self.gl.as_mut();
        match self.properties.render_target(target) {
            Some(entry) => self
                .state
                .bind_texture(gl, unit, entry.target(), Some(entry.texture)),
            None => self.state.bind_texture(
                gl,
                unit,
                crate::renderer::gl::TextureTarget::Texture2d,
                None,
            ),
        }
        unit
    }

    fn upload_object_uniforms(
        &mut self,
        scene: &Scene,
        camera: &CameraView,
        material: &Material,
        program_handle: ProgramHandle,
        item: &RenderItem,
    ) {
        let Some(program) = self.programs.get(program_handle) else {
            return;
        };
        let gl = self.gl.as_mut();

        let model_view = camera.view * item.world;
        upload_at(gl, program.uniform("modelMatrix"), &UniformValue::Mat4(item.world));
        upload_at(gl, program.uniform("modelViewMatrix"), &UniformValue::Mat4(model_view));
        if let Some(location) = program.uniform("normalMatrix") {
            let normal = Mat3::from_mat4(model_view).inverse().transpose();
            gl.uniform_matrix_3fv(location, &normal.to_cols_array());
        }

        if material.morph_targets {
            if let Some(location) = program.uniform("morphTargetInfluences") {
                let slots = self.settings.max_morph_targets as usize;
                let mut influences = scene
                    .world
                    .get::<&MorphTargetInfluences>(item.entity)
                    .map(|m| m.0.clone())
                    .unwrap_or_default();
                influences.resize(slots, 0.0);
                gl.uniform_1fv(location, &influences);
            }
        }
    }
}

fn upload_at(
    gl: &mut dyn crate::renderer::gl::GlContext,
    location: Option<UniformLocation>,
    value: &UniformValue,
) {
    if let Some(location) = location {
        upload_value(gl, location, value);
    }
}

/// Replaces a uniform the program was built with. Unknown names are
/// ignored since the program never looked them up.
fn overwrite(uniforms: &mut Uniforms, name: &str, value: UniformValue) {
    if let Some(slot) = uniforms.get_mut(name) {
        *slot = value;
    }
}

fn is_empty_array(value: &UniformValue) -> bool {
    match value {
        UniformValue::IntArray(v) => v.is_empty(),
        UniformValue::FloatArray(v) => v.is_empty(),
        UniformValue::Vec2Array(v) => v.is_empty(),
        UniformValue::Vec3Array(v) => v.is_empty(),
        UniformValue::Vec4Array(v) => v.is_empty(),
        UniformValue::Mat4Array(v) => v.is_empty(),
        UniformValue::TextureArray(v) => v.is_empty(),
        UniformValue::RenderTargetArray(v) => v.is_empty(),
        _ => false,
    }
}

fn gamma(color: Vec3, gamma_input: bool) -> Vec3 {
    if gamma_input {
        color * color
    } else {
        color
    }
}

fn refresh_fog(uniforms: &mut Uniforms, fog: &Fog, gamma_input: bool) {
    overwrite(uniforms, "fogColor", UniformValue::Vec3(gamma(fog.color(), gamma_input)));
    match *fog {
        Fog::Linear { near, far, .. } => {
            overwrite(uniforms, "fogNear", UniformValue::Float(near));
            overwrite(uniforms, "fogFar", UniformValue::Float(far));
        }
        Fog::Exp2 { density, .. } => {
            overwrite(uniforms, "fogDensity", UniformValue::Float(density));
        }
    }
}

/// Offset and repeat of the first map that has a texture, packed as
/// `(offset.x, offset.y, repeat.x, repeat.y)`.
fn offset_repeat(material: &Material, assets: &Assets) -> Option<Vec4> {
    [
        material.map,
        material.specular_map,
        material.normal_map,
        material.bump_map,
        material.alpha_map,
    ]
    .into_iter()
    .flatten()
    .find_map(|handle| assets.textures.get(handle))
    .map(|texture| Vec4::new(texture.offset.x, texture.offset.y, texture.repeat.x, texture.repeat.y))
}

fn refresh_common(uniforms: &mut Uniforms, material: &Material, assets: &Assets, gamma_input: bool) {
    overwrite(uniforms, "diffuse", UniformValue::Vec3(gamma(material.color, gamma_input)));
    overwrite(uniforms, "opacity", UniformValue::Float(material.opacity));
    overwrite(uniforms, "map", UniformValue::Texture(material.map));
    overwrite(uniforms, "lightMap", UniformValue::Texture(material.light_map));
    overwrite(uniforms, "specularMap", UniformValue::Texture(material.specular_map));
    overwrite(uniforms, "alphaMap", UniformValue::Texture(material.alpha_map));
    overwrite(uniforms, "envMap", UniformValue::Texture(material.env_map));
    if let Some(value) = offset_repeat(material, assets) {
        overwrite(uniforms, "offsetRepeat", UniformValue::Vec4(value));
    }
    let combine = match material.combine {
        Combine::Multiply => 0,
        Combine::Mix => 1,
        Combine::Add => 2,
    };
    overwrite(uniforms, "combine", UniformValue::Int(combine));
    overwrite(uniforms, "reflectivity", UniformValue::Float(material.reflectivity));
    overwrite(uniforms, "refractionRatio", UniformValue::Float(material.refraction_ratio));
}

fn refresh_kind(
    uniforms: &mut Uniforms,
    material: &Material,
    assets: &Assets,
    gamma_input: bool,
    viewport_height: u32,
) {
    match &material.kind {
        MaterialKind::Basic => refresh_common(uniforms, material, assets, gamma_input),
        MaterialKind::Lambert => {
            refresh_common(uniforms, material, assets, gamma_input);
            overwrite(uniforms, "emissive", UniformValue::Vec3(gamma(material.emissive, gamma_input)));
            overwrite(uniforms, "emissiveMap", UniformValue::Texture(material.emissive_map));
        }
        MaterialKind::Phong => {
            refresh_common(uniforms, material, assets, gamma_input);
            overwrite(uniforms, "emissive", UniformValue::Vec3(gamma(material.emissive, gamma_input)));
            overwrite(uniforms, "emissiveMap", UniformValue::Texture(material.emissive_map));
            overwrite(uniforms, "specular", UniformValue::Vec3(gamma(material.specular, gamma_input)));
            overwrite(uniforms, "shininess", UniformValue::Float(material.shininess));
            overwrite(uniforms, "bumpMap", UniformValue::Texture(material.bump_map));
            overwrite(uniforms, "bumpScale", UniformValue::Float(material.bump_scale));
            overwrite(uniforms, "normalMap", UniformValue::Texture(material.normal_map));
            overwrite(uniforms, "normalScale", UniformValue::Vec2(material.normal_scale));
        }
        MaterialKind::LineBasic | MaterialKind::LineDashed => {
            overwrite(uniforms, "diffuse", UniformValue::Vec3(gamma(material.color, gamma_input)));
            overwrite(uniforms, "opacity", UniformValue::Float(material.opacity));
            if matches!(material.kind, MaterialKind::LineDashed) {
                overwrite(uniforms, "scale", UniformValue::Float(material.dash_scale));
                overwrite(uniforms, "dashSize", UniformValue::Float(material.dash_size));
                overwrite(
                    uniforms,
                    "totalSize",
                    UniformValue::Float(material.dash_size + material.gap_size),
                );
            }
        }
        MaterialKind::Points => {
            overwrite(uniforms, "psColor", UniformValue::Vec3(gamma(material.color, gamma_input)));
            overwrite(uniforms, "opacity", UniformValue::Float(material.opacity));
            overwrite(uniforms, "size", UniformValue::Float(material.size));
            overwrite(uniforms, "scale", UniformValue::Float(viewport_height as f32 / 2.0));
            overwrite(uniforms, "map", UniformValue::Texture(material.map));
            if let Some(value) = offset_repeat(material, assets) {
                overwrite(uniforms, "offsetRepeat", UniformValue::Vec4(value));
            }
        }
        MaterialKind::Depth => {
            overwrite(uniforms, "mNear", UniformValue::Float(material.near));
            overwrite(uniforms, "mFar", UniformValue::Float(material.far));
            overwrite(uniforms, "opacity", UniformValue::Float(material.opacity));
        }
        MaterialKind::Normal => {
            overwrite(uniforms, "opacity", UniformValue::Float(material.opacity));
        }
        MaterialKind::Shader(shader) => {
            for (name, value) in &shader.uniforms {
                uniforms.insert(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::texture::{Image2d, TextureSource};
    use glam::Vec2;

    #[test]
    fn dashed_lines_send_total_size() {
        let material = Material::line_dashed(Vec3::ONE, 3.0, 1.0);
        let mut uniforms = shader_lib::default_uniforms(&material.kind);
        refresh_kind(&mut uniforms, &material, &Assets::new(), false, 600);
        assert_eq!(uniforms.get("totalSize"), Some(&UniformValue::Float(4.0)));
        assert_eq!(uniforms.get("dashSize"), Some(&UniformValue::Float(3.0)));
        // basic-only uniforms are never added
        assert!(uniforms.get("map").is_none());
    }

    #[test]
    fn gamma_input_squares_colors() {
        let material = Material::basic(Vec3::new(0.5, 1.0, 0.0));
        let mut uniforms = shader_lib::default_uniforms(&material.kind);
        refresh_kind(&mut uniforms, &material, &Assets::new(), true, 600);
        assert_eq!(
            uniforms.get("diffuse"),
            Some(&UniformValue::Vec3(Vec3::new(0.25, 1.0, 0.0)))
        );
    }

    #[test]
    fn offset_repeat_follows_first_map() {
        let mut assets = Assets::new();
        let mut texture = Texture::new(TextureSource::Image(Image2d::solid(2, 2, [255; 4])));
        texture.offset = Vec2::new(0.5, 0.25);
        texture.repeat = Vec2::new(2.0, 3.0);
        let handle = assets.textures.insert(texture);

        let mut material = Material::phong(Vec3::ONE);
        material.normal_map = Some(handle);
        assert_eq!(
            offset_repeat(&material, &assets),
            Some(Vec4::new(0.5, 0.25, 2.0, 3.0))
        );
        material.normal_map = None;
        assert_eq!(offset_repeat(&material, &assets), None);
    }

    #[test]
    fn points_scale_with_viewport_height() {
        let material = Material::points(Vec3::ONE, 4.0);
        let mut uniforms = shader_lib::default_uniforms(&material.kind);
        refresh_kind(&mut uniforms, &material, &Assets::new(), false, 600);
        assert_eq!(uniforms.get("scale"), Some(&UniformValue::Float(300.0)));
        assert_eq!(uniforms.get("size"), Some(&UniformValue::Float(4.0)));
    }
}

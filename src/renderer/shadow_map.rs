// renderer/shadow_map.rs
// Depth pass for shadow-casting directional and spot lights. Each caster
// gets a depth render target drawn from the light's point of view; the
// result is published for shadow receivers in the main pass.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec4};

use crate::asset::Handle;
use crate::renderer::collector::{collect, RenderItem};
use crate::renderer::gl::CullFace;
use crate::renderer::lights::CollectedLight;
use crate::renderer::material::Material;
use crate::renderer::plugin::{Plugin, PluginContext, PluginType};
use crate::renderer::render_target::RenderTarget;
use crate::renderer::shader_lib;
use crate::scene::{Camera, Light, ObjectKind, ShadowCaster};

/// A rendered shadow map as the receivers sample it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMap {
    pub target: Handle<RenderTarget>,
    pub size: Vec2,
    pub bias: f32,
    pub darkness: f32,
    /// World space to shadow map texture space.
    pub matrix: Mat4,
}

/// Maps clip space [-1, 1] to texture space [0, 1].
const SHADOW_BIAS_MATRIX: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.5, 0.5, 0.5, 1.0),
);

#[derive(Default)]
pub struct ShadowMapPlugin {
    depth_material: Option<Handle<Material>>,
    targets: HashMap<hecs::Entity, Handle<RenderTarget>>,
    rendered: bool,
}

impl ShadowMapPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn depth_material(&mut self, ctx: &mut PluginContext<'_>) -> Handle<Material> {
        if let Some(handle) = self.depth_material {
            if ctx.assets().materials.contains(handle) {
                return handle;
            }
        }
        let material = Material::shader(shader_lib::depth_rgba()).with_name("shadow_depth");
        let handle = ctx.assets_mut().materials.insert(material);
        self.depth_material = Some(handle);
        handle
    }

    fn target_for(
        &mut self,
        ctx: &mut PluginContext<'_>,
        light: &CollectedLight,
        size: u32,
    ) -> Handle<RenderTarget> {
        let assets = ctx.assets_mut();
        if let Some(&handle) = self.targets.get(&light.entity) {
            if let Some(target) = assets.render_targets.get_mut(handle) {
                if target.width != size || target.height != size {
                    target.set_size(size, size);
                }
                return handle;
            }
        }
        let handle = assets.render_targets.insert(RenderTarget::depth_map(size));
        self.targets.insert(light.entity, handle);
        handle
    }
}

/// Camera looking from the light at its target. `None` for lights that
/// cannot cast shadows.
pub fn shadow_camera(light: &CollectedLight, shadow: &ShadowCaster) -> Option<Camera> {
    match light.light {
        Light::Directional { target, .. } => Some(Camera::orthographic(
            light.position,
            target,
            shadow.camera_extent,
            shadow.camera_near,
            shadow.camera_far,
        )),
        Light::Spot { target, angle, .. } => Some(Camera::perspective(
            light.position,
            target,
            (angle * 2.0).clamp(0.01, std::f32::consts::PI - 0.01),
            shadow.camera_near,
            shadow.camera_far,
        )),
        _ => None,
    }
}

impl Plugin for ShadowMapPlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::PreRender
    }

    fn render(&mut self, ctx: &mut PluginContext<'_>) {
        let settings = ctx.settings().shadow_map.clone();
        if !settings.enabled {
            ctx.clear_shadows();
            return;
        }
        if !settings.auto_update && self.rendered {
            return;
        }
        ctx.clear_shadows();

        let casters: Vec<CollectedLight> = ctx
            .lights()
            .iter()
            .filter(|light| light.casts_shadow())
            .copied()
            .collect();
        if casters.is_empty() {
            return;
        }

        let depth = self.depth_material(ctx);
        {
            let (gl, state) = ctx.gl_and_state();
            if settings.cull_front_faces {
                state.set_cull_face(gl, CullFace::Front);
            }
        }

        for light in &casters {
            let Some(shadow) = light.shadow else {
                continue;
            };
            let Some(camera) = shadow_camera(light, &shadow) else {
                continue;
            };
            let size = shadow.map_size.unwrap_or(settings.map_size).max(1);
            let target = self.target_for(ctx, light, size);

            if let Err(err) = ctx.set_render_target(Some(target)) {
                log::error!("Shadow map for {:?} unavailable: {}", light.entity, err);
                continue;
            }
            ctx.clear_with(true, true, false, [1.0, 1.0, 1.0, 1.0]);

            let view = camera.view();
            let projection = camera.proj(1.0);
            let casting: Vec<RenderItem> = collect(ctx.scene(), view, projection, ctx.assets(), false)
                .lists
                .iter()
                .filter(|item| item.cast_shadow && item.kind == ObjectKind::Mesh)
                .cloned()
                .collect();
            ctx.render_items(&casting, &camera, Some(depth));

            log::trace!(
                "Shadow map {}x{} for {:?}: {} casters",
                size,
                size,
                light.entity,
                casting.len()
            );
            ctx.publish_shadow(ShadowMap {
                target,
                size: Vec2::splat(size as f32),
                bias: shadow.bias,
                darkness: shadow.darkness,
                matrix: SHADOW_BIAS_MATRIX * projection * view,
            });
        }

        let (gl, state) = ctx.gl_and_state();
        state.set_cull_face(gl, CullFace::Back);
        self.rendered = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn directional() -> CollectedLight {
        let mut world = hecs::World::new();
        CollectedLight {
            entity: world.spawn(()),
            light: Light::directional(Vec3::ONE, 1.0),
            position: Vec3::new(0.0, 10.0, 0.0),
            shadow: Some(ShadowCaster::default()),
        }
    }

    #[test]
    fn bias_matrix_maps_clip_to_texture_space() {
        let corner = SHADOW_BIAS_MATRIX * Vec4::new(-1.0, -1.0, -1.0, 1.0);
        assert_eq!(corner, Vec4::new(0.0, 0.0, 0.0, 1.0));
        let center = SHADOW_BIAS_MATRIX * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(center, Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn only_directional_and_spot_lights_get_cameras() {
        let light = directional();
        let camera = shadow_camera(&light, &ShadowCaster::default()).unwrap();
        assert_eq!(camera.eye, Vec3::new(0.0, 10.0, 0.0));
        assert!(matches!(
            camera.projection,
            crate::scene::Projection::Orthographic { right, .. } if right == 5.0
        ));

        let point = CollectedLight {
            light: Light::point(Vec3::ONE, 1.0, 0.0),
            ..light
        };
        assert!(shadow_camera(&point, &ShadowCaster::default()).is_none());
    }
}

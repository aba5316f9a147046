// renderer/plugin.rs
// Render passes that run inside `Renderer::render` around the main pass.

use crate::asset::{Assets, Handle};
use crate::renderer::capabilities::Capabilities;
use crate::renderer::collector::{RenderItem, RenderLists};
use crate::renderer::draw::{self, DrawCall, DrawStatus};
use crate::renderer::error::RenderError;
use crate::renderer::gl::GlContext;
use crate::renderer::lights::CollectedLight;
use crate::renderer::material::Material;
use crate::renderer::render_target::RenderTarget;
use crate::renderer::renderer_core::{CameraView, RenderCore};
use crate::renderer::shadow_map::ShadowMap;
use crate::renderer::state::StateTracker;
use crate::renderer::texture::Texture;
use crate::renderer::textures;
use crate::scene::{Camera, Scene, SceneId};
use crate::settings::RenderSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginType {
    /// Replaces the whole frame. When one runs, nothing else is drawn.
    BasicRender,
    /// Runs after lights are set up and before the main pass.
    PreRender,
    PostRender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginScope {
    AllScenes,
    Scene(SceneId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(u32);

impl PluginId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }
}

pub trait Plugin {
    fn plugin_type(&self) -> PluginType;

    fn scope(&self) -> PluginScope {
        PluginScope::AllScenes
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn render(&mut self, ctx: &mut PluginContext<'_>);

    /// Called when the plugin is removed from the renderer.
    fn dispose(&mut self, _gl: &mut dyn GlContext) {}
}

/// What a plugin may touch while it runs. The renderer's cached GL state
/// is invalidated before and after, so plugins may change anything.
pub struct PluginContext<'a> {
    core: &'a mut RenderCore,
    assets: &'a mut Assets,
    scene: &'a Scene,
    camera: &'a Camera,
    lists: &'a RenderLists,
    lights: &'a [CollectedLight],
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(
        core: &'a mut RenderCore,
        assets: &'a mut Assets,
        scene: &'a Scene,
        camera: &'a Camera,
        lists: &'a RenderLists,
        lights: &'a [CollectedLight],
    ) -> Self {
        Self {
            core,
            assets,
            scene,
            camera,
            lists,
            lights,
        }
    }

    pub fn gl(&mut self) -> &mut dyn GlContext {
        self.core.gl()
    }

    pub fn gl_and_state(&mut self) -> (&mut dyn GlContext, &mut StateTracker) {
        self.core.gl_and_state()
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.core.capabilities()
    }

    pub fn settings(&self) -> &RenderSettings {
        self.core.settings()
    }

    pub fn assets(&self) -> &Assets {
        &*self.assets
    }

    pub fn assets_mut(&mut self) -> &mut Assets {
        &mut *self.assets
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn camera(&self) -> &Camera {
        self.camera
    }

    /// The main pass's draw lists. Empty for `BasicRender` plugins, which
    /// run before collection.
    pub fn lists(&self) -> &RenderLists {
        self.lists
    }

    pub fn lights(&self) -> &[CollectedLight] {
        self.lights
    }

    pub fn set_render_target(&mut self, target: Option<Handle<RenderTarget>>) -> Result<(), RenderError> {
        self.core.set_render_target(&*self.assets, target)
    }

    pub fn clear(&mut self, color: bool, depth: bool, stencil: bool) {
        self.core.clear(color, depth, stencil);
    }

    pub fn clear_with(&mut self, color: bool, depth: bool, stencil: bool, rgba: [f32; 4]) {
        self.core.clear_with(color, depth, stencil, rgba);
    }

    /// Draws `items` from `camera` into the bound target. The aspect ratio
    /// follows the current render target or viewport.
    pub fn render_items(
        &mut self,
        items: &[RenderItem],
        camera: &Camera,
        override_material: Option<Handle<Material>>,
    ) {
        let aspect = self.aspect();
        let view = CameraView::new(camera, aspect);
        self.core.render_items(
            &*self.assets,
            self.scene,
            &view,
            items,
            override_material,
            true,
        );
    }

    /// The frame camera resolved against the current target or viewport.
    pub fn camera_view(&self) -> CameraView {
        CameraView::new(self.camera, self.aspect())
    }

    /// Binds `handle` to texture unit `unit`, uploading it when stale.
    pub fn set_texture(&mut self, handle: Handle<Texture>, unit: u32) -> Result<(), RenderError> {
        let core = &mut *self.core;
        textures::set_texture(
            core.gl.as_mut(),
            &mut core.state,
            &core.caps,
            &mut core.properties,
            &*self.assets,
            handle,
            unit,
        )
    }

    /// Issues a draw for the buffers the plugin bound and counts it in the
    /// frame's render info.
    pub fn draw(&mut self, call: DrawCall) -> DrawStatus {
        let core = &mut *self.core;
        draw::draw(core.gl.as_mut(), &core.caps, &mut core.info, call)
    }

    fn aspect(&self) -> f32 {
        let size = self
            .core
            .current_render_target()
            .and_then(|target| self.assets.render_targets.get(target))
            .map(|target| (target.width, target.height))
            .unwrap_or((self.core.width, self.core.height));
        size.0.max(1) as f32 / size.1.max(1) as f32
    }

    /// Makes a shadow map available to receiving objects in this frame.
    pub fn publish_shadow(&mut self, map: ShadowMap) {
        self.core.shadows.push(map);
    }

    pub fn clear_shadows(&mut self) {
        self.core.shadows.clear();
    }

    pub fn shadows(&self) -> &[ShadowMap] {
        &self.core.shadows
    }
}

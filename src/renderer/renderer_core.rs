// renderer/renderer_core.rs
use glam::{Mat4, Vec3};

use crate::asset::{Assets, Handle};
use crate::renderer::attributes::{bind_attributes, bind_default_attributes, upload_geometry};
use crate::renderer::capabilities::Capabilities;
use crate::renderer::collector::{collect, RenderItem, RenderLists};
use crate::renderer::draw::{draw, DrawCall, DrawStatus};
use crate::renderer::error::RenderError;
use crate::renderer::gl::{ClearMask, CompressedFormat, DrawMode, GlContext, Precision};
use crate::renderer::lights::{CollectedLight, LightAccumulator};
use crate::renderer::material::{Blending, Material};
use crate::renderer::plugin::{Plugin, PluginContext, PluginId, PluginScope, PluginType};
use crate::renderer::program::ProgramHandle;
use crate::renderer::programs::ProgramCache;
use crate::renderer::properties::{AttributeSlot, Properties};
use crate::renderer::render_target::{self, RenderTarget};
use crate::renderer::shadow_map::{ShadowMap, ShadowMapPlugin};
use crate::renderer::state::StateTracker;
use crate::renderer::stats::RenderInfo;
use crate::renderer::uniforms::TextureUnits;
use crate::renderer::{BufferGeometry, Texture};
use crate::scene::{Camera, CameraId, ObjectKind, Scene};
use crate::settings::RenderSettings;

/// Camera matrices resolved for one viewport.
#[derive(Clone, Copy, Debug)]
pub struct CameraView {
    pub id: CameraId,
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

impl CameraView {
    pub fn new(camera: &Camera, aspect: f32) -> Self {
        Self {
            id: camera.id(),
            view: camera.view(),
            projection: camera.proj(aspect),
            position: camera.position(),
            near: camera.near,
            far: camera.far,
        }
    }
}

/// What the previous draw left bound. Anything `None` is unknown and gets
/// re-sent.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FrameCache {
    pub(crate) material: Option<Handle<Material>>,
    pub(crate) camera: Option<CameraId>,
    pub(crate) geometry: Option<(Handle<BufferGeometry>, ProgramHandle, bool)>,
    /// Material version whose constant attribute values are current.
    pub(crate) attribute_defaults: Option<(Handle<Material>, u64)>,
}

/// GL-facing half of the renderer: driver, caches and per-frame state.
/// Plugins reach it through `PluginContext`.
pub struct RenderCore {
    pub(crate) gl: Box<dyn GlContext>,
    pub(crate) caps: Capabilities,
    pub(crate) state: StateTracker,
    pub(crate) properties: Properties,
    pub(crate) programs: ProgramCache,
    pub(crate) lights: LightAccumulator,
    pub(crate) settings: RenderSettings,
    pub(crate) info: RenderInfo,
    pub(crate) texture_units: TextureUnits,
    /// Shadow maps published for this frame's receivers.
    pub(crate) shadows: Vec<ShadowMap>,
    pub(crate) frame: FrameCache,
    pub(crate) width: u32,
    pub(crate) height: u32,
    viewport: [i32; 4],
    current_target: Option<Handle<RenderTarget>>,
}

impl RenderCore {
    fn new(mut gl: Box<dyn GlContext>, width: u32, height: u32, settings: RenderSettings) -> Self {
        let settings = settings.validate();
        let caps = Capabilities::detect(gl.as_ref(), settings.precision);
        let mut state = StateTracker::new(caps.max_attributes, caps.instanced_arrays());
        state.init_defaults(gl.as_mut());

        let viewport = [0, 0, width as i32, height as i32];
        state.set_viewport(gl.as_mut(), viewport);
        let [r, g, b] = settings.clear_color;
        state.set_clear_color(gl.as_mut(), [r, g, b, settings.clear_alpha]);

        log::info!(
            "Renderer {}x{} with {} precision, {} texture units",
            width,
            height,
            caps.precision.as_str(),
            caps.max_textures
        );

        Self {
            texture_units: TextureUnits::new(caps.max_textures),
            gl,
            caps,
            state,
            properties: Properties::new(),
            programs: ProgramCache::new(),
            lights: LightAccumulator::new(),
            settings,
            info: RenderInfo::default(),
            shadows: Vec::new(),
            frame: FrameCache::default(),
            width,
            height,
            viewport,
            current_target: None,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn gl(&mut self) -> &mut dyn GlContext {
        self.gl.as_mut()
    }

    pub fn gl_and_state(&mut self) -> (&mut dyn GlContext, &mut StateTracker) {
        (self.gl.as_mut(), &mut self.state)
    }

    /// Forgets every cached driver value and the current program, material,
    /// camera and geometry binding.
    pub fn invalidate_cached_state(&mut self) {
        self.state.invalidate();
        self.frame = FrameCache::default();
    }

    pub fn current_render_target(&self) -> Option<Handle<RenderTarget>> {
        self.current_target
    }

    /// Binds `target` (or the default framebuffer) and its viewport.
    pub fn set_render_target(
        &mut self,
        assets: &Assets,
        target: Option<Handle<RenderTarget>>,
    ) -> Result<(), RenderError> {
        let gl = self.gl.as_mut();
        match target {
            Some(handle) => {
                render_target::ensure_allocated(
                    gl,
                    &mut self.state,
                    &self.caps,
                    &mut self.properties,
                    assets,
                    handle,
                )?;
                let target = assets
                    .render_targets
                    .get(handle)
                    .ok_or(RenderError::InvalidHandle("render target"))?;
                let framebuffer = self
                    .properties
                    .render_target(handle)
                    .and_then(|entry| entry.framebuffer(target.active_cube_face))
                    .ok_or(RenderError::InvalidHandle("render target"))?;
                self.state.bind_framebuffer(gl, Some(framebuffer));
                self.state
                    .set_viewport(gl, [0, 0, target.width as i32, target.height as i32]);
            }
            None => {
                self.state.bind_framebuffer(gl, None);
                self.state.set_viewport(gl, self.viewport);
            }
        }
        self.current_target = target;
        Ok(())
    }

    /// Clears the bound framebuffer with the configured clear values.
    pub fn clear(&mut self, color: bool, depth: bool, stencil: bool) {
        let [r, g, b] = self.settings.clear_color;
        self.clear_with(color, depth, stencil, [r, g, b, self.settings.clear_alpha]);
    }

    pub fn clear_with(&mut self, color: bool, depth: bool, stencil: bool, rgba: [f32; 4]) {
        let mut mask = ClearMask::empty();
        mask.set(ClearMask::COLOR, color);
        mask.set(ClearMask::DEPTH, depth);
        mask.set(ClearMask::STENCIL, stencil);
        if mask.is_empty() {
            return;
        }
        let gl = self.gl.as_mut();
        if color {
            self.state.set_clear_color(gl, rgba);
        }
        if depth {
            // a masked depth buffer is not cleared
            self.state.set_depth_write(gl, true);
        }
        gl.clear(mask);
    }

    fn apply_material_state(&mut self, material: &Material, use_blending: bool) {
        let gl = self.gl.as_mut();
        if use_blending {
            self.state.set_blending(gl, material.blending);
        }
        self.state.set_depth_test(gl, material.depth_test);
        self.state.set_depth_write(gl, material.depth_write);
        self.state.set_depth_func(gl, material.depth_func);
        self.state.set_color_write(gl, material.color_write);
        self.state.set_polygon_offset(
            gl,
            material.polygon_offset,
            material.polygon_offset_factor,
            material.polygon_offset_units,
        );
    }

    /// Draws `items` in order. With an override material its state is set
    /// once and every item uses it. Failures skip the item.
    pub fn render_items(
        &mut self,
        assets: &Assets,
        scene: &Scene,
        camera: &CameraView,
        items: &[RenderItem],
        override_material: Option<Handle<Material>>,
        use_blending: bool,
    ) {
        if let Some(material) = override_material.and_then(|h| assets.materials.get(h)) {
            self.apply_material_state(material, true);
        }

        for item in items {
            let handle = override_material.unwrap_or(item.material);
            if override_material.is_none() {
                if let Some(material) = assets.materials.get(handle) {
                    self.apply_material_state(material, use_blending);
                }
            }

            match self.render_item(assets, scene, camera, handle, item) {
                Ok(DrawStatus::Issued) | Ok(DrawStatus::Empty) => {}
                Ok(DrawStatus::Unsupported) => self.info.render.skipped += 1,
                Err(err) => {
                    self.info.render.skipped += 1;
                    log::debug!("Skipped entity {:?}: {}", item.entity, err);
                }
            }
        }
    }

    fn render_item(
        &mut self,
        assets: &Assets,
        scene: &Scene,
        camera: &CameraView,
        material_handle: Handle<Material>,
        item: &RenderItem,
    ) -> Result<DrawStatus, RenderError> {
        let material = assets
            .materials
            .get(material_handle)
            .ok_or(RenderError::InvalidHandle("material"))?;
        let geometry = assets
            .geometries
            .get(item.geometry)
            .ok_or(RenderError::InvalidHandle("geometry"))?;

        self.state.set_material_faces(self.gl.as_mut(), material.side);
        let program_handle = self.set_program(assets, scene, camera, material_handle, item)?;
        let wireframe = material.wireframe && item.kind == ObjectKind::Mesh;

        let gl = self.gl.as_mut();
        let props = self.properties.geometry_entry(item.geometry);
        let buffers_before = props.buffers.len();
        upload_geometry(gl, &self.caps, geometry, props, wireframe)?;

        let binding = (item.geometry, program_handle, wireframe);
        let defaults = (material_handle, material.version());
        if self.frame.geometry != Some(binding) || props.buffers.len() != buffers_before {
            self.frame.geometry = None;
            let program = self
                .programs
                .get(program_handle)
                .ok_or(RenderError::InvalidHandle("program"))?;
            props.instance_count = bind_attributes(
                gl,
                &mut self.state,
                &self.caps,
                program,
                geometry,
                props,
                material,
                wireframe,
            )?;
            self.frame.geometry = Some(binding);
        } else if self.frame.attribute_defaults != Some(defaults) {
            let program = self
                .programs
                .get(program_handle)
                .ok_or(RenderError::InvalidHandle("program"))?;
            bind_default_attributes(gl, program, geometry, material);
        }
        self.frame.attribute_defaults = Some(defaults);
        self.info.memory.geometries = self.properties.geometry_count();

        let props = self.properties.geometry_entry(item.geometry);
        let instance_count = geometry.instance_count.or(props.instance_count).unwrap_or(1);

        let call = if wireframe {
            let count = props.wireframe.map_or(0, |(edges, _, _)| edges);
            let index = props
                .buffer(&AttributeSlot::Wireframe)
                .and_then(|entry| entry.index_type);
            self.state.set_line_width(gl, material.wireframe_line_width);
            DrawCall {
                mode: DrawMode::Lines,
                index,
                start: 0,
                count,
                instance_count,
            }
        } else {
            let index = match geometry.index() {
                Some(_) => Some(
                    props
                        .buffer(&AttributeSlot::Index)
                        .and_then(|entry| entry.index_type)
                        .ok_or(RenderError::InvalidHandle("index buffer"))?,
                ),
                None => None,
            };
            let (start, count) = draw_range(geometry, item);
            let mode = match item.kind {
                ObjectKind::Mesh => DrawMode::Triangles,
                ObjectKind::Line { strip } => {
                    self.state.set_line_width(gl, material.line_width);
                    if strip {
                        DrawMode::LineStrip
                    } else {
                        DrawMode::Lines
                    }
                }
                ObjectKind::Points => DrawMode::Points,
            };
            DrawCall {
                mode,
                index,
                start,
                count,
                instance_count,
            }
        };

        Ok(draw(gl, &self.caps, &mut self.info, call))
    }
}

/// Element range of one draw: the geometry's draw range, narrowed to the
/// item's group when it has one.
fn draw_range(geometry: &BufferGeometry, item: &RenderItem) -> (usize, usize) {
    let total = geometry.element_count();
    let (range_start, range_count) = geometry.draw_range;
    let range_start = range_start.min(total);
    let range_end = range_count.map_or(total, |count| (range_start + count).min(total));

    match item.group {
        Some(group) => {
            let start = range_start.max(group.start);
            let end = range_end.min(group.start + group.count);
            (start, end.saturating_sub(start))
        }
        None => (range_start, range_end - range_start),
    }
}

/// Scene renderer over a `GlContext`.
pub struct Renderer {
    core: RenderCore,
    assets: Assets,
    plugins: Vec<(PluginId, Box<dyn Plugin>)>,
    next_plugin_id: u32,
}

impl Renderer {
    /// Detects capabilities and puts the context in its default state. The
    /// shadow map plugin is installed and follows `settings.shadow_map`.
    pub fn new(gl: Box<dyn GlContext>, width: u32, height: u32, settings: RenderSettings) -> Self {
        let mut renderer = Self {
            core: RenderCore::new(gl, width, height, settings),
            assets: Assets::new(),
            plugins: Vec::new(),
            next_plugin_id: 0,
        };
        renderer.add_plugin(Box::new(ShadowMapPlugin::new()));
        renderer
    }

    /// Renders `scene` as seen by `camera` into `target`, or the default
    /// framebuffer. Problems with individual objects are logged and
    /// counted in `info().render.skipped`.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        target: Option<Handle<RenderTarget>>,
        force_clear: bool,
    ) {
        let empty = RenderLists::default();
        if self.render_plugins(PluginType::BasicRender, scene, camera, &empty, &[]) {
            return;
        }

        self.core.frame = FrameCache::default();

        if self.core.settings.auto_update_scene {
            scene.update_world_transforms();
        }

        let aspect = self.aspect(target);
        let view = CameraView::new(camera, aspect);
        let collection = collect(
            scene,
            view.view,
            view.projection,
            &self.assets,
            self.core.settings.sort_objects,
        );
        self.core
            .lights
            .setup(&collection.lights, self.core.settings.gamma_input);

        self.render_plugins(
            PluginType::PreRender,
            scene,
            camera,
            &collection.lists,
            &collection.lights,
        );

        self.core.info.reset_render();

        if let Err(err) = self.core.set_render_target(&self.assets, target) {
            log::error!("Cannot render into target: {}", err);
            return;
        }

        let settings = &self.core.settings;
        if settings.auto_clear || force_clear {
            let (color, depth, stencil) = (
                settings.auto_clear_color,
                settings.auto_clear_depth,
                settings.auto_clear_stencil,
            );
            self.core.clear(color, depth, stencil);
        }

        let lists = &collection.lists;
        match scene.override_material {
            Some(override_material) => {
                let items: Vec<RenderItem> = lists.iter().cloned().collect();
                self.core.render_items(
                    &self.assets,
                    scene,
                    &view,
                    &items,
                    Some(override_material),
                    true,
                );
            }
            None => {
                self.core
                    .state
                    .set_blending(self.core.gl.as_mut(), Blending::None);
                self.core
                    .render_items(&self.assets, scene, &view, &lists.opaque, None, false);
                self.core
                    .render_items(&self.assets, scene, &view, &lists.transparent, None, true);
            }
        }

        self.render_plugins(
            PluginType::PostRender,
            scene,
            camera,
            &collection.lists,
            &collection.lights,
        );

        if let Some(target) = target {
            render_target::update_mipmap(
                self.core.gl.as_mut(),
                &mut self.core.state,
                &self.core.properties,
                &self.assets,
                target,
            );
        }

        let gl = self.core.gl.as_mut();
        self.core.state.set_depth_test(gl, true);
        self.core.state.set_depth_write(gl, true);

        self.update_memory_info();
        log::trace!(
            "Frame: {} calls, {} vertices, {} skipped",
            self.core.info.render.calls,
            self.core.info.render.vertices,
            self.core.info.render.skipped
        );
    }

    /// Renders into the default framebuffer without forcing a clear.
    pub fn render_scene(&mut self, scene: &mut Scene, camera: &Camera) {
        self.render(scene, camera, None, false);
    }

    /// Runs every enabled plugin of `kind` in scope for `scene`. Returns
    /// whether any ran.
    fn render_plugins(
        &mut self,
        kind: PluginType,
        scene: &Scene,
        camera: &Camera,
        lists: &RenderLists,
        lights: &[CollectedLight],
    ) -> bool {
        let mut ran = false;
        for (id, plugin) in self.plugins.iter_mut() {
            if plugin.plugin_type() != kind || !plugin.is_enabled() {
                continue;
            }
            if let PluginScope::Scene(scope) = plugin.scope() {
                if scope != scene.id() {
                    continue;
                }
            }

            log::trace!("Running {:?} plugin {:?}", kind, id);
            self.core.invalidate_cached_state();
            let mut ctx = PluginContext::new(
                &mut self.core,
                &mut self.assets,
                scene,
                camera,
                lists,
                lights,
            );
            plugin.render(&mut ctx);
            self.core.invalidate_cached_state();
            ran = true;
        }
        ran
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>) -> PluginId {
        self.next_plugin_id += 1;
        let id = PluginId::new(self.next_plugin_id);
        self.plugins.push((id, plugin));
        id
    }

    /// Removes the plugin and lets it free its GL objects.
    pub fn delete_plugin(&mut self, id: PluginId) -> Option<Box<dyn Plugin>> {
        let position = self.plugins.iter().position(|(plugin_id, _)| *plugin_id == id)?;
        let mut plugin = self.plugins.remove(position).1;
        plugin.dispose(self.core.gl.as_mut());
        self.core.invalidate_cached_state();
        Some(plugin)
    }

    /// Links the program `material` needs under the scene's current lights
    /// without drawing anything.
    pub fn compile_material(
        &mut self,
        scene: &Scene,
        material: Handle<Material>,
    ) -> Result<ProgramHandle, RenderError> {
        let lights = collect(scene, Mat4::IDENTITY, Mat4::IDENTITY, &self.assets, false).lights;
        self.core.lights.setup(&lights, self.core.settings.gamma_input);

        let material_ref = self
            .assets
            .materials
            .get(material)
            .ok_or(RenderError::InvalidHandle("material"))?;
        let fog = crate::scene::FogMode::of(scene.fog.as_ref());
        self.core.init_material(material, material_ref, fog, None, false)?;
        self.core
            .properties
            .material(material)
            .and_then(|entry| entry.program)
            .ok_or(RenderError::MaterialUnavailable)
    }

    fn aspect(&self, target: Option<Handle<RenderTarget>>) -> f32 {
        let (width, height) = match target.and_then(|t| self.assets.render_targets.get(t)) {
            Some(target) => (target.width, target.height),
            None => (self.core.viewport[2] as u32, self.core.viewport[3] as u32),
        };
        width.max(1) as f32 / height.max(1) as f32
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.core.width = width;
        self.core.height = height;
        self.set_viewport(0, 0, width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.core.width, self.core.height)
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.core.viewport = [x, y, width as i32, height as i32];
        if self.core.current_target.is_none() {
            let viewport = self.core.viewport;
            self.core.state.set_viewport(self.core.gl.as_mut(), viewport);
        }
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.core
            .state
            .set_scissor(self.core.gl.as_mut(), [x, y, width as i32, height as i32]);
    }

    pub fn enable_scissor_test(&mut self, enabled: bool) {
        self.core
            .state
            .set_scissor_test(self.core.gl.as_mut(), enabled);
    }

    pub fn set_clear_color(&mut self, color: Vec3, alpha: f32) {
        self.core.settings.clear_color = color.to_array();
        self.core.settings.clear_alpha = alpha;
        self.core
            .state
            .set_clear_color(self.core.gl.as_mut(), [color.x, color.y, color.z, alpha]);
    }

    pub fn clear(&mut self, color: bool, depth: bool, stencil: bool) {
        self.core.clear(color, depth, stencil);
    }

    /// Binds `target` and clears it. The target stays bound.
    pub fn clear_target(
        &mut self,
        target: Handle<RenderTarget>,
        color: bool,
        depth: bool,
        stencil: bool,
    ) -> Result<(), RenderError> {
        self.core.set_render_target(&self.assets, Some(target))?;
        self.core.clear(color, depth, stencil);
        Ok(())
    }

    pub fn set_render_target(&mut self, target: Option<Handle<RenderTarget>>) -> Result<(), RenderError> {
        self.core.set_render_target(&self.assets, target)
    }

    /// Reads RGBA bytes from a rendered target. `pixels` must hold
    /// `width * height * 4` bytes.
    pub fn read_render_target_pixels(
        &mut self,
        target: Handle<RenderTarget>,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        pixels: &mut [u8],
    ) -> Result<(), RenderError> {
        let needed = width as usize * height as usize * 4;
        if pixels.len() < needed {
            log::error!(
                "Pixel buffer holds {} bytes, {} needed",
                pixels.len(),
                needed
            );
            return Err(RenderError::ResourceCreation(format!(
                "pixel buffer of {} bytes is too small",
                pixels.len()
            )));
        }
        let result = render_target::read_pixels(
            self.core.gl.as_mut(),
            &mut self.core.state,
            &self.core.properties,
            target,
            x,
            y,
            width,
            height,
            pixels,
        );
        // read_pixels binds the target's framebuffer
        let current = self.core.current_target;
        self.core.set_render_target(&self.assets, current)?;
        result
    }

    pub fn supports_vertex_textures(&self) -> bool {
        self.core.caps.vertex_textures()
    }

    pub fn supports_float_textures(&self) -> bool {
        self.core.caps.float_fragment_textures()
    }

    pub fn supports_standard_derivatives(&self) -> bool {
        self.core.caps.standard_derivatives()
    }

    pub fn supports_compressed_texture_s3tc(&self) -> bool {
        self.core.caps.supports_compressed(CompressedFormat::RgbaS3tcDxt5)
    }

    pub fn supports_compressed_texture_pvrtc(&self) -> bool {
        self.core.caps.supports_compressed(CompressedFormat::RgbaPvrtc4Bppv1)
    }

    pub fn supports_compressed_texture_etc1(&self) -> bool {
        self.core.caps.supports_compressed(CompressedFormat::RgbEtc1)
    }

    pub fn supports_instanced_arrays(&self) -> bool {
        self.core.caps.instanced_arrays()
    }

    pub fn supports_element_index_uint(&self) -> bool {
        self.core.caps.element_index_uint()
    }

    pub fn max_anisotropy(&self) -> f32 {
        if self.core.caps.anisotropic_filtering() {
            self.core.caps.max_anisotropy
        } else {
            0.0
        }
    }

    pub fn precision(&self) -> Precision {
        self.core.caps.precision
    }

    pub fn max_textures(&self) -> u32 {
        self.core.caps.max_textures
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.core.caps
    }

    pub fn info(&self) -> &RenderInfo {
        &self.core.info
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut Assets {
        &mut self.assets
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.core.settings
    }

    /// Changes to program-relevant settings only reach materials whose
    /// programs are rebuilt afterwards.
    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.core.settings
    }

    pub fn core(&self) -> &RenderCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RenderCore {
        &mut self.core
    }

    /// Removes the geometry and deletes its GL buffers.
    pub fn dispose_geometry(&mut self, handle: Handle<BufferGeometry>) {
        self.release_geometry(handle);
        self.assets.geometries.remove(handle);
    }

    /// Deletes the geometry's GL buffers but keeps the asset. The next draw
    /// that uses it uploads it again.
    pub fn release_geometry(&mut self, handle: Handle<BufferGeometry>) {
        self.core.properties.dispose_geometry(self.core.gl.as_mut(), handle);
        if matches!(self.core.frame.geometry, Some((geometry, _, _)) if geometry == handle) {
            self.core.frame.geometry = None;
        }
        self.update_memory_info();
    }

    /// Removes the material and drops its program reference.
    pub fn dispose_material(&mut self, handle: Handle<Material>) {
        if let Some(program) = self.core.properties.dispose_material(handle) {
            self.core.programs.release(self.core.gl.as_mut(), program);
        }
        if self.core.frame.material == Some(handle) {
            self.core.frame.material = None;
        }
        if matches!(self.core.frame.attribute_defaults, Some((material, _)) if material == handle) {
            self.core.frame.attribute_defaults = None;
        }
        self.assets.materials.remove(handle);
        self.update_memory_info();
    }

    pub fn dispose_texture(&mut self, handle: Handle<Texture>) {
        self.release_texture(handle);
        self.assets.textures.remove(handle);
    }

    /// Deletes the GL texture but keeps the asset for a later re-upload.
    pub fn release_texture(&mut self, handle: Handle<Texture>) {
        self.core
            .properties
            .dispose_texture(self.core.gl.as_mut(), &mut self.core.state, handle);
        self.update_memory_info();
    }

    pub fn dispose_render_target(&mut self, handle: Handle<RenderTarget>) {
        self.core
            .properties
            .dispose_render_target(self.core.gl.as_mut(), &mut self.core.state, handle);
        if self.core.current_target == Some(handle) {
            self.core.current_target = None;
        }
        self.assets.render_targets.remove(handle);
        self.update_memory_info();
    }

    /// Disables the attribute arrays the renderer enabled and forgets every
    /// cached value, for use after foreign code touched the context.
    pub fn reset_gl_state(&mut self) {
        self.core.state.reset(self.core.gl.as_mut());
        self.core.frame = FrameCache::default();
    }

    fn update_memory_info(&mut self) {
        let memory = &mut self.core.info.memory;
        memory.programs = self.core.programs.count();
        memory.geometries = self.core.properties.geometry_count();
        memory.textures = self.core.properties.texture_count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::geometry::DrawGroup;
    use crate::renderer::gl::RecordingContext;

    fn item(group: Option<DrawGroup>) -> RenderItem {
        let mut world = hecs::World::new();
        let mut assets = Assets::new();
        RenderItem {
            entity: world.spawn(()),
            id: 0,
            kind: ObjectKind::Mesh,
            geometry: assets.geometries.insert(BufferGeometry::new()),
            material: assets.materials.insert(Material::basic(Vec3::ONE)),
            group,
            z: 0.0,
            world: Mat4::IDENTITY,
            render_order: 0,
            material_id: 0,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    #[test]
    fn draw_range_clips_groups() {
        let mut geometry = BufferGeometry::new().with_index((0..30).collect());
        geometry.draw_range = (3, Some(20));
        assert_eq!(draw_range(&geometry, &item(None)), (3, 20));

        let group = DrawGroup {
            start: 18,
            count: 12,
            material_index: 0,
        };
        assert_eq!(draw_range(&geometry, &item(Some(group))), (18, 5));

        geometry.draw_range = (0, None);
        assert_eq!(draw_range(&geometry, &item(Some(group))), (18, 12));
    }

    #[test]
    fn new_renderer_sets_viewport_and_defaults() {
        let gl = RecordingContext::new();
        let log = gl.log();
        let renderer = Renderer::new(Box::new(gl), 640, 480, RenderSettings::default());
        assert!(log
            .borrow()
            .calls()
            .contains(&crate::renderer::gl::GlCall::Viewport([0, 0, 640, 480])));
        assert_eq!(renderer.size(), (640, 480));
        assert_eq!(renderer.info().render.calls, 0);
    }

    #[test]
    fn invalidation_forgets_the_frame_cache() {
        let gl = RecordingContext::new();
        let mut renderer = Renderer::new(Box::new(gl), 64, 64, RenderSettings::default());
        let material = renderer.assets_mut().materials.insert(Material::basic(Vec3::ONE));
        renderer.core_mut().frame.material = Some(material);
        renderer.core_mut().invalidate_cached_state();
        assert!(renderer.core().frame.material.is_none());
        assert!(renderer.core().state.current_program().is_none());
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};

use gl_scene::renderer::gl::{
    Capability, CompressedFormat, DrawMode, Extensions, GlCall, IndexType, TextureParam,
    TextureTarget, Wrapping,
};
use gl_scene::renderer::texture::{CompressedMip, Image2d};
use gl_scene::renderer::{
    box_geometry, plane_geometry, BufferAttribute, BufferGeometry, InterleavedAttribute,
    InterleavedBuffer, Material, Plugin, PluginContext, PluginType, RecordingContext,
    RenderTarget, SpritePlugin, Texture,
};
use gl_scene::renderer::material::ShaderMaterial;
use gl_scene::scene::{
    Camera, EntityBuilder, Light, MaterialSlot, ObjectKind, Renderable, Scene, Sprite, Transform,
};
use gl_scene::{RenderSettings, Renderer};

type Log = Rc<RefCell<gl_scene::renderer::gl::CallLog>>;

fn renderer_with(gl: RecordingContext) -> (Renderer, Log) {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = gl.log();
    let renderer = Renderer::new(Box::new(gl), 320, 240, RenderSettings::default());
    (renderer, log)
}

fn renderer() -> (Renderer, Log) {
    renderer_with(RecordingContext::new())
}

fn camera() -> Camera {
    Camera::perspective(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO, 60f32.to_radians(), 0.1, 100.0)
}

fn spawn_mesh(scene: &mut Scene, renderer: &mut Renderer, at: Vec3, material: Material) -> hecs::Entity {
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let material = assets.materials.insert(material);
    EntityBuilder::new(scene)
        .with_transform(Transform::from_translation(at))
        .with_mesh(geometry, material)
        .spawn()
}

fn count(log: &Log, predicate: impl Fn(&GlCall) -> bool) -> usize {
    log.borrow().count(predicate)
}

#[test]
fn two_boxes_take_two_draw_calls() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::new(-1.0, 0.0, 0.0), Material::basic(Vec3::X));
    spawn_mesh(&mut scene, &mut renderer, Vec3::new(1.0, 0.0, 0.0), Material::basic(Vec3::Y));

    renderer.render_scene(&mut scene, &camera());

    let info = renderer.info();
    assert_eq!(info.render.calls, 2);
    assert_eq!(info.render.vertices, 72);
    assert_eq!(info.render.faces, 24);
    assert_eq!(info.render.skipped, 0);
    // both materials share one program
    assert_eq!(info.memory.programs, 1);
    assert_eq!(info.memory.geometries, 2);

    let draws: Vec<GlCall> = log.borrow().draw_calls().into_iter().cloned().collect();
    assert_eq!(draws.len(), 2);
    for draw in draws {
        assert_eq!(
            draw,
            GlCall::DrawElements {
                mode: DrawMode::Triangles,
                count: 36,
                index_type: IndexType::U16,
                offset: 0,
            }
        );
    }
}

#[test]
fn second_frame_reuses_programs_and_buffers() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, Material::lambert(Vec3::ONE));
    let camera = camera();

    renderer.render_scene(&mut scene, &camera);
    let links = count(&log, |c| matches!(c, GlCall::LinkProgram(_)));
    let buffers = count(&log, |c| matches!(c, GlCall::CreateBuffer(_)));
    assert_eq!(links, 1);
    assert_eq!(buffers, 4);

    renderer.render_scene(&mut scene, &camera);
    assert_eq!(count(&log, |c| matches!(c, GlCall::LinkProgram(_))), links);
    assert_eq!(count(&log, |c| matches!(c, GlCall::CreateBuffer(_))), buffers);
    assert_eq!(renderer.info().render.calls, 1);
}

#[test]
fn objects_outside_the_frustum_are_not_drawn() {
    let (mut renderer, _log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::new(0.0, 0.0, 20.0), Material::basic(Vec3::ONE));

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 0);
    assert_eq!(renderer.info().render.skipped, 0);

    let (mut renderer, _log) = self::renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene)
        .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 20.0)))
        .with_mesh(geometry, material)
        .frustum_culled(false)
        .spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 1);
}

#[test]
fn hidden_objects_and_materials_are_skipped_silently() {
    let (mut renderer, _log) = renderer();
    let mut scene = Scene::new();
    let mut hidden = Material::basic(Vec3::ONE);
    hidden.visible = false;
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, hidden);

    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene)
        .with_mesh(geometry, material)
        .visible(false)
        .spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 0);
    assert_eq!(renderer.info().render.skipped, 0);
}

#[test]
fn empty_draw_range_issues_nothing() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let mut geometry = box_geometry(1.0, 1.0, 1.0);
    geometry.draw_range = (0, Some(0));
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(geometry);
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene).with_mesh(geometry, material).spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 0);
    assert_eq!(renderer.info().render.skipped, 0);
    assert!(log.borrow().draw_calls().is_empty());
}

#[test]
fn draw_range_limits_the_element_count() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let mut geometry = box_geometry(1.0, 1.0, 1.0);
    geometry.draw_range = (6, Some(12));
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(geometry);
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene).with_mesh(geometry, material).spawn();

    renderer.render_scene(&mut scene, &camera());
    let draws: Vec<GlCall> = log.borrow().draw_calls().into_iter().cloned().collect();
    assert_eq!(
        draws,
        vec![GlCall::DrawElements {
            mode: DrawMode::Triangles,
            count: 12,
            index_type: IndexType::U16,
            offset: 12,
        }]
    );
}

fn wide_index_geometry() -> BufferGeometry {
    BufferGeometry::new()
        .with_attribute(
            "position",
            BufferAttribute::f32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 3),
        )
        .with_index(vec![0, 1, 70_000])
}

#[test]
fn wide_indices_need_the_uint_extension() {
    let gl = RecordingContext::new()
        .with_extensions(Extensions::all() - Extensions::ELEMENT_INDEX_UINT);
    let (mut renderer, _log) = renderer_with(gl);
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(wide_index_geometry());
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene).with_mesh(geometry, material).spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 0);
    assert_eq!(renderer.info().render.skipped, 1);

    // still skipped next frame without another upload attempt
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.skipped, 1);
}

#[test]
fn wide_indices_draw_as_u32_when_supported() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(wide_index_geometry());
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene)
        .with_mesh(geometry, material)
        .frustum_culled(false)
        .spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(
        log.borrow().draw_calls()[0],
        &GlCall::DrawElements {
            mode: DrawMode::Triangles,
            count: 3,
            index_type: IndexType::U32,
            offset: 0,
        }
    );
}

#[test]
fn opaque_objects_draw_before_blending_is_enabled() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, Material::basic(Vec3::ONE));

    // default state enables blending once at startup
    log.borrow_mut().clear();
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(count(&log, |c| *c == GlCall::Enable(Capability::Blend)), 0);

    spawn_mesh(
        &mut scene,
        &mut renderer,
        Vec3::new(0.0, 0.0, 1.0),
        Material::basic(Vec3::X).with_opacity(0.5),
    );
    log.borrow_mut().clear();
    renderer.render_scene(&mut scene, &camera());

    let calls = log.borrow().calls().to_vec();
    let blend = calls
        .iter()
        .position(|c| *c == GlCall::Enable(Capability::Blend))
        .expect("transparent pass enables blending");
    let first_draw = calls.iter().position(GlCall::is_draw).expect("opaque draw");
    let last_draw = calls.iter().rposition(GlCall::is_draw).expect("transparent draw");
    assert!(first_draw < blend);
    assert!(blend < last_draw);
    assert_eq!(renderer.info().render.calls, 2);
}

#[test]
fn multi_material_boxes_draw_one_call_per_face() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let materials: Vec<_> = (0..6)
        .map(|i| assets.materials.insert(Material::basic(Vec3::splat(i as f32 / 6.0))))
        .collect();
    EntityBuilder::new(&mut scene)
        .with_renderable(Renderable {
            kind: ObjectKind::Mesh,
            geometry,
            material: MaterialSlot::Multi(materials),
        })
        .spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 6);
    assert_eq!(renderer.info().render.vertices, 36);

    let draws: Vec<GlCall> = log.borrow().draw_calls().into_iter().cloned().collect();
    for draw in draws {
        assert!(matches!(draw, GlCall::DrawElements { count: 6, .. }));
    }
}

#[test]
fn wireframe_draws_edge_lines() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(plane_geometry(1.0, 1.0));
    let material = assets.materials.insert(Material::basic(Vec3::ONE).with_wireframe());
    EntityBuilder::new(&mut scene).with_mesh(geometry, material).spawn();

    renderer.render_scene(&mut scene, &camera());
    let draws: Vec<GlCall> = log.borrow().draw_calls().into_iter().cloned().collect();
    assert_eq!(draws.len(), 1);
    assert!(matches!(
        draws[0],
        GlCall::DrawElements {
            mode: DrawMode::Lines,
            ..
        }
    ));
    assert_eq!(renderer.info().render.faces, 0);
}

#[test]
fn instance_count_needs_the_instancing_extension() {
    let mut geometry = box_geometry(1.0, 1.0, 1.0);
    geometry.instance_count = Some(3);

    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let handle = assets.geometries.insert(geometry.clone());
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene).with_mesh(handle, material).spawn();
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().render.vertices, 36 * 3);
    assert!(matches!(
        log.borrow().draw_calls()[0],
        GlCall::DrawElementsInstanced { instances: 3, .. }
    ));

    let gl = RecordingContext::new()
        .with_extensions(Extensions::all() - Extensions::INSTANCED_ARRAYS);
    let (mut renderer, log) = renderer_with(gl);
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let handle = assets.geometries.insert(geometry);
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene).with_mesh(handle, material).spawn();
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 0);
    assert_eq!(renderer.info().render.skipped, 1);
    assert!(log.borrow().draw_calls().is_empty());
}

#[test]
fn interleaved_positions_use_stride_and_one_buffer() {
    let mut geometry = BufferGeometry::new();
    // position xyz + uv per vertex
    let buffer = geometry.add_interleaved_buffer(InterleavedBuffer::new(
        vec![
            0.0, 0.0, 0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, 1.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 1.0,
        ],
        5,
    ));
    geometry.set_interleaved_attribute(
        "position",
        InterleavedAttribute {
            buffer,
            item_size: 3,
            offset: 0,
            normalized: false,
        },
    );
    geometry.set_interleaved_attribute(
        "uv",
        InterleavedAttribute {
            buffer,
            item_size: 2,
            offset: 3,
            normalized: false,
        },
    );

    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(geometry);
    let material = assets.materials.insert(Material::basic(Vec3::ONE));
    EntityBuilder::new(&mut scene)
        .with_mesh(geometry, material)
        .frustum_culled(false)
        .spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(count(&log, |c| matches!(c, GlCall::CreateBuffer(_))), 1);
    assert_eq!(
        count(&log, |c| matches!(
            c,
            GlCall::VertexAttribPointer {
                size: 3,
                stride: 20,
                offset: 0,
                ..
            }
        )),
        1
    );
    assert_eq!(
        log.borrow().draw_calls()[0],
        &GlCall::DrawArrays {
            mode: DrawMode::Triangles,
            first: 0,
            count: 3,
        }
    );
}

#[test]
fn missing_attributes_fall_back_to_material_defaults() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let mut material = Material::basic(Vec3::ONE);
    material.vertex_colors = true;
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, material);

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(
        count(&log, |c| matches!(c, GlCall::VertexAttrib(_, v) if *v == vec![1.0, 1.0, 1.0])),
        1
    );
}

#[test]
fn disposing_releases_gpu_objects() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let material = assets.materials.insert(Material::phong(Vec3::ONE));
    EntityBuilder::new(&mut scene).with_mesh(geometry, material).spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().memory.programs, 1);
    assert_eq!(renderer.info().memory.geometries, 1);

    renderer.dispose_geometry(geometry);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteBuffer(_))), 4);
    assert_eq!(renderer.info().memory.geometries, 0);

    renderer.dispose_material(material);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteProgram(_))), 1);
    assert_eq!(renderer.info().memory.programs, 0);
}

#[test]
fn npot_textures_are_clamped() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let mut texture = Texture::from_image(Image2d::solid(3, 5, [255, 0, 0, 255]));
    texture.wrap_s = Wrapping::Repeat;
    let texture = renderer.assets_mut().textures.insert(texture);
    spawn_mesh(
        &mut scene,
        &mut renderer,
        Vec3::ZERO,
        Material::basic(Vec3::ONE).with_map(texture),
    );

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().memory.textures, 1);
    assert_eq!(
        count(&log, |c| *c
            == GlCall::TexParameter(TextureTarget::Texture2d, TextureParam::WrapS(Wrapping::Repeat))),
        0
    );
    assert_eq!(
        count(&log, |c| *c
            == GlCall::TexParameter(
                TextureTarget::Texture2d,
                TextureParam::WrapS(Wrapping::ClampToEdge)
            )),
        1
    );
    assert_eq!(count(&log, |c| matches!(c, GlCall::GenerateMipmap(_))), 0);
}

#[test]
fn unsupported_compressed_texture_is_not_uploaded() {
    let (mut renderer, log) = renderer();
    assert!(!renderer.supports_compressed_texture_pvrtc());
    let mut scene = Scene::new();
    let texture = renderer.assets_mut().textures.insert(Texture::compressed(
        CompressedFormat::RgbaPvrtc4Bppv1,
        vec![CompressedMip {
            width: 8,
            height: 8,
            data: vec![0; 32],
        }],
    ));
    spawn_mesh(
        &mut scene,
        &mut renderer,
        Vec3::ZERO,
        Material::basic(Vec3::ONE).with_map(texture),
    );

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(count(&log, |c| matches!(c, GlCall::CompressedTexImage2d { .. })), 0);
    // the object still draws, sampling nothing
    assert_eq!(renderer.info().render.calls, 1);
}

#[test]
fn rendering_into_a_target_sets_its_viewport_and_mipmaps() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, Material::basic(Vec3::ONE));
    let target = renderer.assets_mut().render_targets.insert(RenderTarget::new(64, 64));

    renderer.render(&mut scene, &camera(), Some(target), true);
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(count(&log, |c| matches!(c, GlCall::CreateFramebuffer(_))), 1);
    assert_eq!(count(&log, |c| *c == GlCall::Viewport([0, 0, 64, 64])), 1);

    let calls = log.borrow().calls().to_vec();
    let last_draw = calls.iter().rposition(GlCall::is_draw).expect("draw");
    assert!(calls[last_draw..]
        .iter()
        .any(|c| matches!(c, GlCall::GenerateMipmap(TextureTarget::Texture2d))));

    let mut pixels = vec![0u8; 4 * 4 * 4];
    assert!(renderer
        .read_render_target_pixels(target, 0, 0, 4, 4, &mut pixels)
        .is_ok());
    let mut small = vec![0u8; 8];
    assert!(renderer
        .read_render_target_pixels(target, 0, 0, 4, 4, &mut small)
        .is_err());
}

#[test]
fn auto_clear_can_be_turned_off() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    renderer.settings_mut().auto_clear = false;

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(count(&log, |c| matches!(c, GlCall::Clear(_))), 0);

    renderer.render(&mut scene, &camera(), None, true);
    assert_eq!(count(&log, |c| matches!(c, GlCall::Clear(_))), 1);
}

struct Replace {
    frames: Rc<RefCell<u32>>,
}

impl Plugin for Replace {
    fn plugin_type(&self) -> PluginType {
        PluginType::BasicRender
    }

    fn render(&mut self, _ctx: &mut PluginContext<'_>) {
        *self.frames.borrow_mut() += 1;
    }
}

#[test]
fn basic_render_plugin_replaces_the_frame() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, Material::basic(Vec3::ONE));

    let frames = Rc::new(RefCell::new(0));
    let id = renderer.add_plugin(Box::new(Replace {
        frames: Rc::clone(&frames),
    }));
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(*frames.borrow(), 1);
    assert!(log.borrow().draw_calls().is_empty());

    assert!(renderer.delete_plugin(id).is_some());
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(*frames.borrow(), 1);
    assert_eq!(log.borrow().draw_calls().len(), 1);
}

struct CountItems {
    seen: Rc<RefCell<Vec<usize>>>,
}

impl Plugin for CountItems {
    fn plugin_type(&self) -> PluginType {
        PluginType::PostRender
    }

    fn render(&mut self, ctx: &mut PluginContext<'_>) {
        let lists = ctx.lists();
        self.seen.borrow_mut().push(lists.opaque.len() + lists.transparent.len());
    }
}

#[test]
fn post_render_plugins_see_the_frame_lists() {
    let (mut renderer, _log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, Material::basic(Vec3::ONE));
    spawn_mesh(
        &mut scene,
        &mut renderer,
        Vec3::X,
        Material::basic(Vec3::ONE).with_opacity(0.3),
    );

    let seen = Rc::new(RefCell::new(Vec::new()));
    renderer.add_plugin(Box::new(CountItems {
        seen: Rc::clone(&seen),
    }));
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(*seen.borrow(), vec![2]);
}

#[test]
fn materials_sharing_a_geometry_each_send_their_defaults() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    for (x, color) in [(-1.0, vec![1.0, 0.0, 0.0]), (1.0, vec![0.0, 1.0, 0.0])] {
        let mut material = Material::basic(Vec3::ONE);
        material.vertex_colors = true;
        material
            .default_attribute_values
            .insert("color".to_string(), color);
        let material = renderer.assets_mut().materials.insert(material);
        EntityBuilder::new(&mut scene)
            .with_transform(Transform::from_translation(Vec3::new(x, 0.0, 0.0)))
            .with_mesh(geometry, material)
            .spawn();
    }

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 2);
    assert_eq!(renderer.info().memory.programs, 1);
    for color in [vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]] {
        assert_eq!(
            count(&log, |c| matches!(c, GlCall::VertexAttrib(_, v) if *v == color)),
            1
        );
    }
    // the shared buffers are bound once
    assert_eq!(
        count(&log, |c| matches!(c, GlCall::VertexAttribPointer { size: 3, .. })),
        2
    );
}

#[test]
fn released_resources_are_recreated_on_next_use() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let texture = renderer
        .assets_mut()
        .textures
        .insert(Texture::from_image(Image2d::solid(4, 4, [0, 255, 0, 255])));
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let material = assets
        .materials
        .insert(Material::basic(Vec3::ONE).with_map(texture));
    EntityBuilder::new(&mut scene).with_mesh(geometry, material).spawn();
    let created = |log: &Log| {
        (
            count(log, |c| matches!(c, GlCall::CreateBuffer(_))),
            count(log, |c| matches!(c, GlCall::CreateTexture(_))),
        )
    };

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(created(&log), (4, 1));

    renderer.release_geometry(geometry);
    renderer.release_texture(texture);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteBuffer(_))), 4);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteTexture(_))), 1);
    assert_eq!(renderer.info().memory.geometries, 0);
    assert_eq!(renderer.info().memory.textures, 0);
    assert!(renderer.assets().geometries.contains(geometry));

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(created(&log), (8, 2));
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().memory.geometries, 1);
    assert_eq!(renderer.info().memory.textures, 1);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteBuffer(_))), 4);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteTexture(_))), 1);
}

struct CaptureLists {
    opaque: Rc<RefCell<Vec<hecs::Entity>>>,
    transparent: Rc<RefCell<Vec<hecs::Entity>>>,
}

impl Plugin for CaptureLists {
    fn plugin_type(&self) -> PluginType {
        PluginType::PostRender
    }

    fn render(&mut self, ctx: &mut PluginContext<'_>) {
        let lists = ctx.lists();
        *self.opaque.borrow_mut() = lists.opaque.iter().map(|i| i.entity).collect();
        *self.transparent.borrow_mut() = lists.transparent.iter().map(|i| i.entity).collect();
    }
}

#[test]
fn lit_scene_splits_opaque_and_transparent_cubes() {
    let (mut renderer, _log) = renderer();
    let mut scene = Scene::new();
    EntityBuilder::new(&mut scene)
        .with_transform(Transform::from_translation(Vec3::new(2.0, 5.0, 3.0)))
        .with_light(Light::directional(Vec3::ONE, 1.0))
        .spawn();
    let red = spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, Material::lambert(Vec3::X));
    let blue = spawn_mesh(
        &mut scene,
        &mut renderer,
        Vec3::new(0.0, 0.0, -3.0),
        Material::lambert(Vec3::Z).with_opacity(0.5),
    );

    let opaque = Rc::new(RefCell::new(Vec::new()));
    let transparent = Rc::new(RefCell::new(Vec::new()));
    renderer.add_plugin(Box::new(CaptureLists {
        opaque: Rc::clone(&opaque),
        transparent: Rc::clone(&transparent),
    }));
    renderer.render_scene(&mut scene, &camera());

    assert_eq!(*opaque.borrow(), vec![red]);
    assert_eq!(*transparent.borrow(), vec![blue]);
    assert_eq!(renderer.info().render.calls, 2);
    assert_eq!(renderer.info().render.vertices, 72);
    assert_eq!(renderer.info().render.skipped, 0);
}

#[test]
fn instance_count_follows_the_instanced_attribute() {
    let offsets: Vec<f32> = (0..4).flat_map(|i| [i as f32 * 0.1, 0.0, 0.0]).collect();
    let mut geometry = box_geometry(1.0, 1.0, 1.0);
    geometry.set_attribute("offset", BufferAttribute::instanced(offsets, 3, 1));
    let material = Material::shader(ShaderMaterial {
        vertex_shader: "attribute vec3 offset;\n\
                        void main() {\n\
                        gl_Position = projectionMatrix * modelViewMatrix * vec4(position + offset, 1.0);\n\
                        }\n"
            .to_string(),
        fragment_shader: "void main() {\n\
                          gl_FragColor = vec4(1.0);\n\
                          }\n"
            .to_string(),
        attributes: vec!["offset".to_string()],
        ..Default::default()
    });

    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(geometry);
    let material = assets.materials.insert(material);
    EntityBuilder::new(&mut scene).with_mesh(geometry, material).spawn();

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().render.vertices, 36 * 4);
    assert!(matches!(
        log.borrow().draw_calls()[0],
        GlCall::DrawElementsInstanced { instances: 4, .. }
    ));
    assert_eq!(count(&log, |c| matches!(c, GlCall::VertexAttribDivisor(_, 1))), 1);
}

#[test]
fn sprites_draw_after_the_scene_far_to_near() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new();
    spawn_mesh(&mut scene, &mut renderer, Vec3::ZERO, Material::basic(Vec3::ONE));
    let flare = renderer
        .assets_mut()
        .textures
        .insert(Texture::from_image(Image2d::solid(8, 8, [255, 255, 255, 255])));
    EntityBuilder::new(&mut scene)
        .with_transform(Transform::from_trs(Vec3::new(0.0, 0.0, 2.0), Quat::IDENTITY, Vec3::ONE))
        .with_sprite(Sprite::default())
        .spawn();
    EntityBuilder::new(&mut scene)
        .with_transform(Transform::from_trs(
            Vec3::new(0.0, 0.0, -4.0),
            Quat::IDENTITY,
            Vec3::splat(2.0),
        ))
        .with_sprite(Sprite::with_map(flare))
        .spawn();
    EntityBuilder::new(&mut scene)
        .with_sprite(Sprite::default())
        .visible(false)
        .spawn();
    let sprites = renderer.add_plugin(Box::new(SpritePlugin::new()));

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 3);
    assert_eq!(count(&log, |c| matches!(c, GlCall::LinkProgram(_))), 2);

    let calls = log.borrow().calls().to_vec();
    let draws: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_draw())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(draws.len(), 3);
    for &i in &draws[1..] {
        assert_eq!(
            calls[i],
            GlCall::DrawElements {
                mode: DrawMode::Triangles,
                count: 6,
                index_type: IndexType::U16,
                offset: 0,
            }
        );
    }
    let scales: Vec<Vec<f32>> = {
        let log = log.borrow();
        calls
            .iter()
            .filter_map(|c| match c {
                GlCall::UniformF(loc, v) if log.uniform_name(*loc) == Some("scale") => Some(v.clone()),
                _ => None,
            })
            .collect()
    };
    // the larger, farther sprite first
    assert_eq!(scales, vec![vec![2.0, 2.0], vec![1.0, 1.0]]);

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(count(&log, |c| matches!(c, GlCall::LinkProgram(_))), 2);
    assert_eq!(renderer.info().render.calls, 3);

    assert!(renderer.delete_plugin(sprites).is_some());
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteProgram(_))), 1);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteBuffer(_))), 2);
    assert_eq!(count(&log, |c| matches!(c, GlCall::DeleteTexture(_))), 1);
    renderer.render_scene(&mut scene, &camera());
    assert_eq!(renderer.info().render.calls, 1);
}

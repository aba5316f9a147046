use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use gl_scene::renderer::gl::{CallLog, GlCall};
use gl_scene::renderer::material::ShaderMaterial;
use gl_scene::renderer::{box_geometry, Material, RecordingContext};
use gl_scene::scene::{Camera, EntityBuilder, Fog, Light, Scene, Transform, TransformComponent};
use gl_scene::{Handle, RenderSettings, Renderer};

fn setup(gl: RecordingContext) -> (Renderer, Rc<RefCell<CallLog>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = gl.log();
    (
        Renderer::new(Box::new(gl), 256, 256, RenderSettings::default()),
        log,
    )
}

fn camera() -> Camera {
    Camera::perspective(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO, 50f32.to_radians(), 0.1, 50.0)
}

fn add_box(scene: &mut Scene, renderer: &mut Renderer, material: Material) -> Handle<Material> {
    let assets = renderer.assets_mut();
    let geometry = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let material = assets.materials.insert(material);
    EntityBuilder::new(scene).with_mesh(geometry, material).spawn();
    material
}

fn links(log: &Rc<RefCell<CallLog>>) -> usize {
    log.borrow().count(|c| matches!(c, GlCall::LinkProgram(_)))
}

#[test]
fn identical_materials_share_one_program() {
    let (mut renderer, log) = setup(RecordingContext::new());
    let mut scene = Scene::new();
    add_box(&mut scene, &mut renderer, Material::phong(Vec3::X));
    add_box(&mut scene, &mut renderer, Material::phong(Vec3::Y));
    add_box(&mut scene, &mut renderer, Material::basic(Vec3::Z));

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(links(&log), 2);
    assert_eq!(renderer.info().memory.programs, 2);
    assert_eq!(renderer.info().render.calls, 3);
}

#[test]
fn light_values_change_without_relinking() {
    let (mut renderer, log) = setup(RecordingContext::new());
    let mut scene = Scene::new();
    add_box(&mut scene, &mut renderer, Material::lambert(Vec3::ONE));
    let sun = EntityBuilder::new(&mut scene)
        .with_transform(Transform::from_translation(Vec3::new(1.0, 4.0, 2.0)))
        .with_light(Light::directional(Vec3::ONE, 1.0))
        .spawn();
    let camera = camera();

    renderer.render_scene(&mut scene, &camera);
    assert_eq!(links(&log), 1);
    assert_eq!(renderer.info().render.light_refreshes, 1);

    renderer.render_scene(&mut scene, &camera);
    assert_eq!(renderer.info().render.light_refreshes, 0);

    if let Ok(mut light) = scene.world.get::<&mut Light>(sun) {
        *light = Light::directional(Vec3::new(1.0, 0.5, 0.2), 0.7);
    }
    renderer.render_scene(&mut scene, &camera);
    assert_eq!(renderer.info().render.light_refreshes, 1);

    if let Ok(mut transform) = scene.world.get::<&mut TransformComponent>(sun) {
        transform.0 = Transform::from_translation(Vec3::new(-3.0, 1.0, 0.0));
    }
    renderer.render_scene(&mut scene, &camera);
    assert_eq!(renderer.info().render.light_refreshes, 1);

    assert_eq!(links(&log), 1);
}

#[test]
fn adding_a_light_relinks_and_frees_the_old_program() {
    let (mut renderer, log) = setup(RecordingContext::new());
    let mut scene = Scene::new();
    add_box(&mut scene, &mut renderer, Material::phong(Vec3::ONE));
    EntityBuilder::new(&mut scene)
        .with_light(Light::directional(Vec3::ONE, 1.0))
        .spawn();
    let camera = camera();

    renderer.render_scene(&mut scene, &camera);
    assert_eq!(links(&log), 1);

    EntityBuilder::new(&mut scene)
        .with_transform(Transform::from_translation(Vec3::new(0.0, 3.0, 0.0)))
        .with_light(Light::point(Vec3::ONE, 1.0, 10.0))
        .spawn();
    renderer.render_scene(&mut scene, &camera);

    assert_eq!(links(&log), 2);
    assert_eq!(log.borrow().count(|c| matches!(c, GlCall::DeleteProgram(_))), 1);
    assert_eq!(renderer.info().memory.programs, 1);
    assert_eq!(renderer.info().render.calls, 1);
}

#[test]
fn unlit_materials_ignore_light_changes() {
    let (mut renderer, log) = setup(RecordingContext::new());
    let mut scene = Scene::new();
    add_box(&mut scene, &mut renderer, Material::basic(Vec3::ONE));
    let camera = camera();

    renderer.render_scene(&mut scene, &camera);
    EntityBuilder::new(&mut scene)
        .with_light(Light::directional(Vec3::ONE, 1.0))
        .spawn();
    renderer.render_scene(&mut scene, &camera);

    assert_eq!(links(&log), 1);
    assert_eq!(renderer.info().render.light_refreshes, 0);
}

#[test]
fn switching_fog_mode_relinks() {
    let (mut renderer, log) = setup(RecordingContext::new());
    let mut scene = Scene::new();
    add_box(&mut scene, &mut renderer, Material::lambert(Vec3::ONE));
    let camera = camera();

    renderer.render_scene(&mut scene, &camera);
    scene.fog = Some(Fog::Linear {
        color: Vec3::splat(0.5),
        near: 1.0,
        far: 20.0,
    });
    renderer.render_scene(&mut scene, &camera);
    assert_eq!(links(&log), 2);

    // new values, same mode
    scene.fog = Some(Fog::Linear {
        color: Vec3::ONE,
        near: 2.0,
        far: 30.0,
    });
    renderer.render_scene(&mut scene, &camera);
    assert_eq!(links(&log), 2);
}

#[test]
fn material_updates_reuse_a_matching_program() {
    let (mut renderer, log) = setup(RecordingContext::new());
    let mut scene = Scene::new();
    let material = add_box(&mut scene, &mut renderer, Material::phong(Vec3::ONE));
    let camera = camera();

    renderer.render_scene(&mut scene, &camera);
    if let Some(material) = renderer.assets_mut().materials.get_mut(material) {
        material.color = Vec3::new(0.2, 0.3, 0.4);
        material.needs_update();
    }
    renderer.render_scene(&mut scene, &camera);

    assert_eq!(links(&log), 1);
    assert_eq!(renderer.info().memory.programs, 1);
    assert_eq!(log.borrow().count(|c| matches!(c, GlCall::DeleteProgram(_))), 0);
}

#[test]
fn compile_material_links_ahead_of_the_first_frame() {
    let (mut renderer, log) = setup(RecordingContext::new());
    let mut scene = Scene::new();
    let material = add_box(&mut scene, &mut renderer, Material::lambert(Vec3::ONE));
    EntityBuilder::new(&mut scene)
        .with_light(Light::directional(Vec3::ONE, 1.0))
        .spawn();

    assert!(renderer.compile_material(&scene, material).is_ok());
    assert_eq!(links(&log), 1);
    assert!(log.borrow().draw_calls().is_empty());

    renderer.render_scene(&mut scene, &camera());
    assert_eq!(links(&log), 1);
    assert_eq!(renderer.info().render.calls, 1);
}

fn broken_shader() -> Material {
    Material::shader(ShaderMaterial {
        vertex_shader: "void main() {\n\
                        gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);\n\
                        }\n"
            .to_string(),
        fragment_shader: "void main() {\n\
                          gl_FragColor = vec4(1.0);\n\
                          NOT_GLSL\n\
                          }\n"
            .to_string(),
        ..Default::default()
    })
}

#[test]
fn failed_compiles_are_not_retried_until_the_material_changes() {
    let (mut renderer, log) = setup(RecordingContext::new().with_compile_failure("NOT_GLSL"));
    let mut scene = Scene::new();
    let material = add_box(&mut scene, &mut renderer, broken_shader());
    add_box(&mut scene, &mut renderer, Material::basic(Vec3::ONE));
    let camera = camera();
    let compiles = |log: &Rc<RefCell<CallLog>>| {
        log.borrow().count(|c| matches!(c, GlCall::CompileShader(_)))
    };

    renderer.render_scene(&mut scene, &camera);
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().render.skipped, 1);
    assert_eq!(renderer.info().memory.programs, 1);
    let after_first = compiles(&log);

    renderer.render_scene(&mut scene, &camera);
    assert_eq!(renderer.info().render.skipped, 1);
    assert_eq!(compiles(&log), after_first);

    if let Some(material) = renderer.assets_mut().materials.get_mut(material) {
        material.needs_update();
    }
    renderer.render_scene(&mut scene, &camera);
    assert_eq!(renderer.info().render.skipped, 1);
    assert!(compiles(&log) > after_first);
}

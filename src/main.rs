use glam::{Quat, Vec3};

use gl_scene::renderer::{box_geometry, plane_geometry, sphere_geometry, Material, RecordingContext};
use gl_scene::scene::{Camera, EntityBuilder, Light, Scene, ShadowCaster, Transform};
use gl_scene::{init_logging, RenderSettings, Renderer};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

// Renders a small lit scene against the recording backend and reports
// what reached the driver. Useful for checking settings.json changes
// without a GPU.
fn main() {
    init_logging();

    let gl = RecordingContext::new();
    let log = gl.log();
    let mut renderer = Renderer::new(Box::new(gl), WIDTH, HEIGHT, RenderSettings::load());

    let assets = renderer.assets_mut();
    let cube = assets.geometries.insert(box_geometry(1.0, 1.0, 1.0));
    let ball = assets.geometries.insert(sphere_geometry(0.5, 24, 16));
    let floor = assets.geometries.insert(plane_geometry(10.0, 10.0));
    let red = assets.materials.insert(Material::phong(Vec3::new(0.8, 0.1, 0.1)));
    let grey = assets.materials.insert(Material::lambert(Vec3::splat(0.6)));
    let glass = assets
        .materials
        .insert(Material::basic(Vec3::new(0.2, 0.4, 0.9)).with_opacity(0.5));

    let mut scene = Scene::new();
    EntityBuilder::new(&mut scene)
        .with_name("floor")
        .with_transform(Transform::from_trs(
            Vec3::ZERO,
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            Vec3::ONE,
        ))
        .with_mesh(floor, grey)
        .receive_shadow()
        .spawn();
    EntityBuilder::new(&mut scene)
        .with_name("cube")
        .with_transform(Transform::from_translation(Vec3::new(-1.0, 0.5, 0.0)))
        .with_mesh(cube, red)
        .cast_shadow()
        .spawn();
    EntityBuilder::new(&mut scene)
        .with_name("ball")
        .with_transform(Transform::from_translation(Vec3::new(1.0, 0.5, 0.0)))
        .with_mesh(ball, glass)
        .cast_shadow()
        .spawn();
    EntityBuilder::new(&mut scene)
        .with_name("sun")
        .with_transform(Transform::from_translation(Vec3::new(3.0, 6.0, 2.0)))
        .with_light(Light::directional(Vec3::ONE, 1.0))
        .with_shadow_caster(ShadowCaster::default())
        .spawn();
    EntityBuilder::new(&mut scene)
        .with_light(Light::Ambient {
            color: Vec3::splat(0.2),
        })
        .spawn();

    let camera = Camera::perspective(
        Vec3::new(0.0, 3.0, 6.0),
        Vec3::ZERO,
        45f32.to_radians(),
        0.1,
        100.0,
    );

    for _ in 0..2 {
        renderer.render_scene(&mut scene, &camera);
    }

    let info = renderer.info();
    log::info!(
        "Last frame: {} draw calls, {} vertices, {} faces, {} skipped",
        info.render.calls,
        info.render.vertices,
        info.render.faces,
        info.render.skipped
    );
    log::info!(
        "Live: {} programs, {} geometries, {} textures; {} GL calls recorded",
        info.memory.programs,
        info.memory.geometries,
        info.memory.textures,
        log.borrow().calls().len()
    );
}

// renderer/collector.rs
// Per-frame walk over the scene graph. Produces the sorted opaque and
// transparent draw lists plus the lights, culled against the camera.

use std::cmp::Ordering;

use glam::Mat4;
use hecs::Entity;

use crate::asset::{Assets, Handle};
use crate::renderer::frustum::Frustum;
use crate::renderer::geometry::{BufferGeometry, DrawGroup};
use crate::renderer::lights::CollectedLight;
use crate::renderer::material::Material;
use crate::scene::{
    CastShadow, Children, FrustumCulled, Light, MaterialSlot, ObjectKind, Parent, ReceiveShadow,
    RenderOrder, Renderable, Scene, ShadowCaster, Sprite, TransformComponent, Visible,
    WorldTransform,
};

/// One draw of one object (or one group of it) with one material.
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub entity: Entity,
    pub id: u64,
    pub kind: ObjectKind,
    pub geometry: Handle<BufferGeometry>,
    pub material: Handle<Material>,
    pub group: Option<DrawGroup>,
    /// View-space depth of the object origin. Only used for sorting.
    pub z: f32,
    pub world: Mat4,
    pub render_order: i32,
    pub material_id: u64,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// A visible sprite with its view-space depth, for `SpritePlugin`.
#[derive(Debug, Clone)]
pub struct SpriteItem {
    pub entity: Entity,
    pub id: u64,
    pub sprite: Sprite,
    pub world: Mat4,
    pub z: f32,
}

#[derive(Debug, Clone, Default)]
pub struct RenderLists {
    pub opaque: Vec<RenderItem>,
    pub transparent: Vec<RenderItem>,
    /// In scene order. Not part of `len` or `iter`, which cover meshes only.
    pub sprites: Vec<SpriteItem>,
}

impl RenderLists {
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }

    /// Opaque items first, then transparent ones, each in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderItem> {
        self.opaque.iter().chain(self.transparent.iter())
    }

    pub fn sort(&mut self) {
        self.opaque.sort_by(opaque_order);
        self.transparent.sort_by(transparent_order);
    }
}

/// Render order, then material to batch program switches, then near to
/// far.
pub fn opaque_order(a: &RenderItem, b: &RenderItem) -> Ordering {
    a.render_order
        .cmp(&b.render_order)
        .then(a.material_id.cmp(&b.material_id))
        .then(a.z.total_cmp(&b.z))
        .then(a.id.cmp(&b.id))
}

/// Render order, then far to near.
pub fn transparent_order(a: &RenderItem, b: &RenderItem) -> Ordering {
    a.render_order
        .cmp(&b.render_order)
        .then(b.z.total_cmp(&a.z))
        .then(a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Default)]
pub struct FrameCollection {
    pub lists: RenderLists,
    pub lights: Vec<CollectedLight>,
}

fn world_matrix(entity: &hecs::EntityRef<'_>) -> Mat4 {
    if let Some(world) = entity.get::<&WorldTransform>() {
        return world.0.matrix();
    }
    entity
        .get::<&TransformComponent>()
        .map_or(Mat4::IDENTITY, |local| local.0.matrix())
}

/// Walks `scene` from its roots in entity order and returns everything
/// visible from the camera described by `view` and `projection`.
pub fn collect(
    scene: &Scene,
    view: Mat4,
    projection: Mat4,
    assets: &Assets,
    sort_objects: bool,
) -> FrameCollection {
    let world = &scene.world;
    let frustum = Frustum::from_view_projection(projection * view);
    let mut frame = FrameCollection::default();

    let mut roots: Vec<Entity> = world
        .query::<()>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    roots.sort_by_key(|entity| entity.id());

    let mut stack: Vec<Entity> = roots.into_iter().rev().collect();
    while let Some(entity) = stack.pop() {
        let Ok(entity_ref) = world.entity(entity) else {
            continue;
        };
        if entity_ref.get::<&Visible>().map_or(false, |v| !v.0) {
            continue;
        }

        let matrix = world_matrix(&entity_ref);

        if let Some(light) = entity_ref.get::<&Light>() {
            frame.lights.push(CollectedLight {
                entity,
                light: *light,
                position: matrix.w_axis.truncate(),
                shadow: entity_ref.get::<&ShadowCaster>().map(|s| *s),
            });
        }

        if let Some(renderable) = entity_ref.get::<&Renderable>() {
            let culled = entity_ref.get::<&FrustumCulled>().map_or(true, |c| c.0);
            let object = ObjectInfo {
                entity,
                matrix,
                render_order: entity_ref.get::<&RenderOrder>().map_or(0, |o| o.0),
                cast_shadow: entity_ref.has::<CastShadow>(),
                receive_shadow: entity_ref.has::<ReceiveShadow>(),
            };
            push_renderable(
                &mut frame.lists,
                &renderable,
                &object,
                culled.then_some(&frustum),
                view,
                assets,
            );
        }

        if let Some(sprite) = entity_ref.get::<&Sprite>() {
            frame.lists.sprites.push(SpriteItem {
                entity,
                id: entity.id() as u64,
                sprite: *sprite,
                world: matrix,
                z: -view.transform_point3(matrix.w_axis.truncate()).z,
            });
        }

        if let Some(children) = entity_ref.get::<&Children>() {
            stack.extend(children.0.iter().rev().copied());
        }
    }

    if sort_objects {
        frame.lists.sort();
    }

    log::trace!(
        "Collected {} opaque, {} transparent, {} lights",
        frame.lists.opaque.len(),
        frame.lists.transparent.len(),
        frame.lights.len()
    );
    frame
}

struct ObjectInfo {
    entity: Entity,
    matrix: Mat4,
    render_order: i32,
    cast_shadow: bool,
    receive_shadow: bool,
}

fn push_renderable(
    lists: &mut RenderLists,
    renderable: &Renderable,
    object: &ObjectInfo,
    frustum: Option<&Frustum>,
    view: Mat4,
    assets: &Assets,
) {
    let Some(geometry) = assets.geometries.get(renderable.geometry) else {
        log::trace!("Entity {:?} references a missing geometry", object.entity);
        return;
    };

    if let (Some(frustum), Some(sphere)) = (frustum, geometry.bounding_sphere()) {
        if !frustum.intersects_object(sphere, &object.matrix) {
            return;
        }
    }

    // distance in front of the camera, negative behind it
    let z = -view.transform_point3(object.matrix.w_axis.truncate()).z;

    let draws: Vec<(Option<DrawGroup>, Option<Handle<Material>>)> = match &renderable.material {
        MaterialSlot::Multi(_) if !geometry.groups.is_empty() => geometry
            .groups
            .iter()
            .map(|group| (Some(*group), renderable.material.get(group.material_index)))
            .collect(),
        slot => vec![(None, slot.get(0))],
    };

    for (group, handle) in draws {
        let Some(handle) = handle else {
            continue;
        };
        let Some(material) = assets.materials.get(handle) else {
            continue;
        };
        if !material.visible {
            continue;
        }

        let item = RenderItem {
            entity: object.entity,
            id: object.entity.id() as u64,
            kind: renderable.kind,
            geometry: renderable.geometry,
            material: handle,
            group,
            z,
            world: object.matrix,
            render_order: object.render_order,
            material_id: handle.id(),
            cast_shadow: object.cast_shadow,
            receive_shadow: object.receive_shadow,
        };
        if material.transparent {
            lists.transparent.push(item);
        } else {
            lists.opaque.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::geometry::BufferAttribute;
    use crate::scene::{Camera, EntityBuilder, Transform};
    use glam::Vec3;

    fn triangle() -> BufferGeometry {
        BufferGeometry::new().with_attribute(
            "position",
            BufferAttribute::f32(vec![0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5, 0.0], 3),
        )
    }

    fn camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0, 0.1, 100.0)
    }

    fn collect_from_camera(scene: &Scene, assets: &Assets, sort_objects: bool) -> FrameCollection {
        let camera = camera();
        collect(scene, camera.view(), camera.proj(1.0), assets, sort_objects)
    }

    fn at(z: f32) -> Transform {
        Transform::from_translation(Vec3::new(0.0, 0.0, z))
    }

    #[test]
    fn opaque_near_to_far_transparent_far_to_near() {
        let mut assets = Assets::new();
        let geometry = assets.geometries.insert(triangle());
        let solid = assets.materials.insert(Material::basic(Vec3::ONE));
        let mut glass = Material::basic(Vec3::ONE);
        glass.transparent = true;
        let glass = assets.materials.insert(glass);

        let mut scene = Scene::new();
        let mut spawned = Vec::new();
        for (i, z) in [-3.0, 2.0, 0.0, 2.0].into_iter().enumerate() {
            let material = if i % 2 == 0 { solid } else { glass };
            spawned.push(
                EntityBuilder::new(&mut scene)
                    .with_transform(at(z))
                    .with_mesh(geometry, material)
                    .spawn(),
            );
        }
        for z in [1.0, -1.0] {
            spawned.push(
                EntityBuilder::new(&mut scene)
                    .with_transform(at(z))
                    .with_mesh(geometry, glass)
                    .spawn(),
            );
        }
        scene.update_world_transforms();

        let frame = collect_from_camera(&scene, &assets, true);
        let opaque: Vec<Entity> = frame.lists.opaque.iter().map(|i| i.entity).collect();
        assert_eq!(opaque, vec![spawned[2], spawned[0]]);

        let transparent: Vec<Entity> = frame.lists.transparent.iter().map(|i| i.entity).collect();
        // equal depth falls back to entity order
        assert_eq!(
            transparent,
            vec![spawned[5], spawned[4], spawned[1], spawned[3]]
        );
    }

    #[test]
    fn invisible_subtrees_and_culled_objects_are_dropped() {
        let mut assets = Assets::new();
        let geometry = assets.geometries.insert(triangle());
        let material = assets.materials.insert(Material::basic(Vec3::ONE));

        let mut scene = Scene::new();
        let hidden = EntityBuilder::new(&mut scene).visible(false).spawn();
        EntityBuilder::new(&mut scene)
            .with_mesh(geometry, material)
            .child_of(hidden)
            .spawn();
        let outside = EntityBuilder::new(&mut scene)
            .with_transform(Transform::from_translation(Vec3::new(500.0, 0.0, 0.0)))
            .with_mesh(geometry, material)
            .spawn();
        EntityBuilder::new(&mut scene)
            .with_transform(Transform::from_translation(Vec3::new(500.0, 0.0, 0.0)))
            .with_mesh(geometry, material)
            .frustum_culled(false)
            .spawn();
        scene.update_world_transforms();

        let frame = collect_from_camera(&scene, &assets, true);
        assert_eq!(frame.lists.len(), 1);
        assert_ne!(frame.lists.opaque[0].entity, outside);
    }

    #[test]
    fn multi_material_groups_become_separate_items() {
        let mut assets = Assets::new();
        let mut geometry = triangle();
        geometry.add_group(0, 3, 1);
        geometry.add_group(0, 3, 0);
        geometry.add_group(0, 3, 7);
        let geometry = assets.geometries.insert(geometry);
        let first = assets.materials.insert(Material::basic(Vec3::X));
        let mut hidden = Material::basic(Vec3::Y);
        hidden.visible = false;
        let hidden = assets.materials.insert(hidden);

        let mut scene = Scene::new();
        EntityBuilder::new(&mut scene)
            .with_renderable(Renderable {
                kind: ObjectKind::Mesh,
                geometry,
                material: MaterialSlot::Multi(vec![first, hidden]),
            })
            .spawn();

        let frame = collect_from_camera(&scene, &assets, false);
        // group 0 uses the hidden material and group 2 has no material
        assert_eq!(frame.lists.opaque.len(), 1);
        let item = &frame.lists.opaque[0];
        assert_eq!(item.material, first);
        assert_eq!(item.group.map(|g| g.material_index), Some(0));
    }

    #[test]
    fn lights_carry_world_position() {
        let assets = Assets::new();
        let mut scene = Scene::new();
        EntityBuilder::new(&mut scene)
            .with_transform(Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)))
            .with_light(Light::point(Vec3::ONE, 1.0, 0.0))
            .spawn();
        scene.update_world_transforms();

        let frame = collect_from_camera(&scene, &assets, true);
        assert_eq!(frame.lights.len(), 1);
        assert!(frame.lights[0]
            .position
            .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn unculled_objects_behind_the_camera_sort_nearest() {
        let mut assets = Assets::new();
        let geometry = assets.geometries.insert(triangle());
        let material = assets.materials.insert(Material::basic(Vec3::ONE));

        let mut scene = Scene::new();
        let spawned: Vec<Entity> = [-20.0, 0.0, 15.0]
            .into_iter()
            .map(|z| {
                EntityBuilder::new(&mut scene)
                    .with_transform(at(z))
                    .with_mesh(geometry, material)
                    .frustum_culled(false)
                    .spawn()
            })
            .collect();
        scene.update_world_transforms();

        let frame = collect_from_camera(&scene, &assets, true);
        let opaque: Vec<Entity> = frame.lists.opaque.iter().map(|i| i.entity).collect();
        // z = 15 sits 5 units behind the camera
        assert_eq!(opaque, vec![spawned[2], spawned[1], spawned[0]]);
        assert!(frame.lists.opaque[0].z < 0.0);
        assert!((frame.lists.opaque[1].z - 10.0).abs() < 1e-4);
    }
}

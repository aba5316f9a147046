// scene/scene.rs

use std::sync::atomic::{AtomicU64, Ordering};

use hecs::{Entity, World};

use super::components::{Children, Parent};
use super::fog::Fog;
use super::internal::transforms;
use crate::asset::Handle;
use crate::renderer::Material;

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

pub struct Scene {
    pub world: World,
    pub fog: Option<Fog>,
    /// Drawn with this material instead of each object's own.
    pub override_material: Option<Handle<Material>>,
    id: SceneId,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            fog: None,
            override_material: None,
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Links `child` under `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), hecs::NoSuchEntity> {
        if !self.world.contains(parent) || !self.world.contains(child) {
            return Err(hecs::NoSuchEntity);
        }

        self.detach(child);

        let has_children = self.world.get::<&Children>(parent).is_ok();
        if has_children {
            if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
                children.0.push(child);
            }
        } else {
            self.world.insert_one(parent, Children(vec![child]))?;
        }
        self.world.insert_one(child, Parent(parent))?;
        Ok(())
    }

    /// Removes `child` from its parent's children. It becomes a root.
    pub fn detach(&mut self, child: Entity) {
        let parent = match self.world.get::<&Parent>(child) {
            Ok(parent) => parent.0,
            Err(_) => return,
        };
        if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
            children.0.retain(|&c| c != child);
        }
        let _ = self.world.remove_one::<Parent>(child);
    }

    /// Recomputes every `WorldTransform` from the local transforms.
    pub fn update_world_transforms(&mut self) {
        transforms::propagate_transforms(&mut self.world);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::components::{Name, TransformComponent, WorldTransform};
    use crate::scene::Transform;
    use glam::Vec3;

    #[test]
    fn add_child_links_both_sides_and_reparents() {
        let mut scene = Scene::new();
        let a = scene.world.spawn((Name::new("a"),));
        let b = scene.world.spawn((Name::new("b"),));
        let c = scene.world.spawn((Name::new("c"),));

        scene.add_child(a, c).unwrap();
        scene.add_child(b, c).unwrap();

        assert!(scene.world.get::<&Children>(a).unwrap().0.is_empty());
        assert_eq!(scene.world.get::<&Children>(b).unwrap().0, vec![c]);
        assert_eq!(scene.world.get::<&Parent>(c).unwrap().0, b);
    }

    #[test]
    fn update_world_transforms_composes_hierarchy() {
        let mut scene = Scene::new();
        let parent = scene
            .world
            .spawn((TransformComponent(Transform::from_translation(Vec3::X)),));
        let child = scene
            .world
            .spawn((TransformComponent(Transform::from_translation(Vec3::Y)),));
        scene.add_child(parent, child).unwrap();

        scene.update_world_transforms();

        let world = scene.world.get::<&WorldTransform>(child).unwrap();
        assert_eq!(world.0.translation, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn scenes_have_distinct_ids() {
        assert_ne!(Scene::new().id(), Scene::new().id());
    }
}

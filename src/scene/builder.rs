// scene/builder.rs
// Optional helper for building entities - uses pure hecs

use super::components::*;
use super::Scene;
use crate::asset::Handle;
use crate::renderer::{BufferGeometry, Material};
use crate::scene::Transform;

/// Helper for building entities with a fluent API
/// This is optional - you can also use world.spawn() directly
pub struct EntityBuilder<'s> {
    scene: &'s mut Scene,
    builder: hecs::EntityBuilder,
    parent: Option<hecs::Entity>,
}

impl<'s> EntityBuilder<'s> {
    pub fn new(scene: &'s mut Scene) -> Self {
        Self {
            scene,
            builder: hecs::EntityBuilder::new(),
            parent: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.builder.add(TransformComponent(transform));
        self
    }

    pub fn with_mesh(mut self, geometry: Handle<BufferGeometry>, material: Handle<Material>) -> Self {
        self.builder.add(Renderable::mesh(geometry, material));
        self
    }

    pub fn with_renderable(mut self, renderable: Renderable) -> Self {
        self.builder.add(renderable);
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.builder.add(light);
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.builder.add(sprite);
        self
    }

    pub fn with_shadow_caster(mut self, caster: ShadowCaster) -> Self {
        self.builder.add(caster);
        self
    }

    pub fn cast_shadow(mut self) -> Self {
        self.builder.add(CastShadow);
        self
    }

    pub fn receive_shadow(mut self) -> Self {
        self.builder.add(ReceiveShadow);
        self
    }

    pub fn with_render_order(mut self, order: i32) -> Self {
        self.builder.add(RenderOrder(order));
        self
    }

    pub fn frustum_culled(mut self, culled: bool) -> Self {
        self.builder.add(FrustumCulled(culled));
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.builder.add(Visible(visible));
        self
    }

    pub fn child_of(mut self, parent: hecs::Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Spawn the entity into the scene, linking it under its parent if one
    /// was given.
    pub fn spawn(mut self) -> hecs::Entity {
        let entity = self.scene.world.spawn(self.builder.build());
        if let Some(parent) = self.parent {
            if let Err(err) = self.scene.add_child(parent, entity) {
                log::warn!("Could not attach {:?} to {:?}: {}", entity, parent, err);
            }
        }
        entity
    }
}

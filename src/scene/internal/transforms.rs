use hecs::{Entity, World};

use crate::scene::components::{Children, Parent, TransformComponent, WorldTransform};
use crate::scene::transform::Transform;

/// Writes a `WorldTransform` for every entity reachable from a root.
/// Grouping entities without a local transform pass their parent's through.
pub(crate) fn propagate_transforms(world: &mut World) {
    let mut pending: Vec<(Entity, Transform)> = world
        .query::<()>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, _)| (entity, Transform::IDENTITY))
        .collect();
    // roots popped in spawn order
    pending.sort_by_key(|(entity, _)| std::cmp::Reverse(entity.id()));

    let mut missing = Vec::new();
    let mut visited = 0usize;

    while let Some((entity, parent)) = pending.pop() {
        let local = world
            .get::<&TransformComponent>(entity)
            .map_or(Transform::IDENTITY, |local| local.0);
        let combined = parent.mul_transform(&local);
        visited += 1;

        match world.get::<&mut WorldTransform>(entity) {
            Ok(mut current) => current.0 = combined,
            Err(hecs::ComponentError::MissingComponent(_)) => missing.push((entity, combined)),
            Err(hecs::ComponentError::NoSuchEntity) => continue,
        }

        if let Ok(children) = world.get::<&Children>(entity) {
            pending.extend(children.0.iter().rev().map(|&child| (child, combined)));
        }
    }

    for (entity, transform) in missing {
        if let Err(err) = world.insert_one(entity, WorldTransform(transform)) {
            log::error!("Cannot attach world transform to {:?}: {}", entity, err);
        }
    }
    log::trace!("Updated {} world transforms", visited);
}

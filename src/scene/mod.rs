// scene/mod.rs

pub mod builder;
pub mod camera;
pub mod components;
pub mod fog;
mod internal;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use builder::EntityBuilder;
pub use camera::{Camera, CameraId, Projection};
pub use fog::{Fog, FogMode};
pub use scene::{Scene, SceneId};
pub use transform::Transform;

// Re-export all components
pub use components::{
    CastShadow, Children, FrustumCulled, Light, MaterialSlot, MorphTargetInfluences, Name,
    ObjectKind, Parent, ReceiveShadow, RenderOrder, Renderable, ShadowCaster, Skeleton, Sprite,
    TransformComponent, Visible, WorldTransform,
};

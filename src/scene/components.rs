// scene/components.rs
// Pure hecs components - no custom entity system

use glam::{Mat4, Vec3};

use crate::asset::Handle;
use crate::renderer::material::Blending;
use crate::renderer::{BufferGeometry, Material, Texture};
use crate::scene::Transform;

// ============================================================================
// Core Rendering Components
// ============================================================================

/// Transform component (position, rotation, scale)
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// World-space transform (computed from hierarchy)
#[derive(Debug, Clone, Copy)]
pub struct WorldTransform(pub Transform);

/// Visibility component. An invisible entity hides its whole subtree.
#[derive(Debug, Clone, Copy)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    /// `strip` draws a connected line strip, otherwise segment pairs.
    Line { strip: bool },
    Points,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialSlot {
    Single(Handle<Material>),
    /// Indexed by the geometry's draw-group `material_index`.
    Multi(Vec<Handle<Material>>),
}

impl MaterialSlot {
    pub fn get(&self, material_index: usize) -> Option<Handle<Material>> {
        match self {
            MaterialSlot::Single(handle) => Some(*handle),
            MaterialSlot::Multi(handles) => handles.get(material_index).copied(),
        }
    }
}

/// Something the renderer draws.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub kind: ObjectKind,
    pub geometry: Handle<BufferGeometry>,
    pub material: MaterialSlot,
}

impl Renderable {
    pub fn mesh(geometry: Handle<BufferGeometry>, material: Handle<Material>) -> Self {
        Self {
            kind: ObjectKind::Mesh,
            geometry,
            material: MaterialSlot::Single(material),
        }
    }

    pub fn line(geometry: Handle<BufferGeometry>, material: Handle<Material>, strip: bool) -> Self {
        Self {
            kind: ObjectKind::Line { strip },
            geometry,
            material: MaterialSlot::Single(material),
        }
    }

    pub fn points(geometry: Handle<BufferGeometry>, material: Handle<Material>) -> Self {
        Self {
            kind: ObjectKind::Points,
            geometry,
            material: MaterialSlot::Single(material),
        }
    }
}

/// Whether the collector tests the object against the view frustum.
/// Absent means culled.
#[derive(Debug, Clone, Copy)]
pub struct FrustumCulled(pub bool);

/// Sorted before depth, lower first.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOrder(pub i32);

#[derive(Debug, Clone, Copy, Default)]
pub struct CastShadow;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiveShadow;

// ============================================================================
// Lighting Components
// ============================================================================

/// Light sources. Positions come from the entity's world transform;
/// `target` is a world-space point the light aims at.
#[derive(Debug, Clone, Copy)]
pub enum Light {
    Ambient {
        color: Vec3,
    },
    Directional {
        color: Vec3,
        intensity: f32,
        target: Vec3,
    },
    Point {
        color: Vec3,
        intensity: f32,
        distance: f32,
        decay: f32,
    },
    Spot {
        color: Vec3,
        intensity: f32,
        target: Vec3,
        distance: f32,
        angle: f32,
        exponent: f32,
        decay: f32,
    },
    Hemisphere {
        sky_color: Vec3,
        ground_color: Vec3,
        intensity: f32,
    },
}

impl Light {
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Light::Directional {
            color,
            intensity,
            target: Vec3::ZERO,
        }
    }

    pub fn point(color: Vec3, intensity: f32, distance: f32) -> Self {
        Light::Point {
            color,
            intensity,
            distance,
            decay: 1.0,
        }
    }

    pub fn spot(color: Vec3, intensity: f32, target: Vec3, angle: f32) -> Self {
        Light::Spot {
            color,
            intensity,
            target,
            distance: 0.0,
            angle,
            exponent: 10.0,
            decay: 1.0,
        }
    }
}

/// Makes a directional or spot light render a shadow map.
#[derive(Debug, Clone, Copy)]
pub struct ShadowCaster {
    /// Casts the shadow but adds no light.
    pub only_shadow: bool,
    pub bias: f32,
    pub darkness: f32,
    pub map_size: Option<u32>,
    pub camera_near: f32,
    pub camera_far: f32,
    /// Half size of the orthographic shadow camera of a directional light.
    pub camera_extent: f32,
}

impl Default for ShadowCaster {
    fn default() -> Self {
        Self {
            only_shadow: false,
            bias: 0.0,
            darkness: 0.5,
            map_size: None,
            camera_near: 0.5,
            camera_far: 500.0,
            camera_extent: 5.0,
        }
    }
}

// ============================================================================
// Sprite Components
// ============================================================================

/// Camera-facing textured quad drawn by `SpritePlugin` after the main pass.
/// Its size is the entity's world scale in x and y.
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub color: Vec3,
    pub opacity: f32,
    /// `None` draws a plain coloured quad.
    pub map: Option<Handle<Texture>>,
    /// Screen-plane rotation in radians.
    pub rotation: f32,
    pub alpha_test: f32,
    pub blending: Blending,
    pub depth_test: bool,
    pub depth_write: bool,
    pub fog: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            opacity: 1.0,
            map: None,
            rotation: 0.0,
            alpha_test: 0.0,
            blending: Blending::Normal,
            depth_test: true,
            depth_write: true,
            fog: false,
        }
    }
}

impl Sprite {
    pub fn with_map(map: Handle<Texture>) -> Self {
        Self {
            map: Some(map),
            ..Self::default()
        }
    }
}

// ============================================================================
// Deformation Components
// ============================================================================

/// Bone matrices in bind-relative form, uploaded every frame.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub bones: Vec<Mat4>,
    pub use_vertex_texture: bool,
    pub bone_texture: Option<Handle<Texture>>,
}

/// Morph weights in morph-target order. Only the first
/// `max_morph_targets` are used.
#[derive(Debug, Clone, Default)]
pub struct MorphTargetInfluences(pub Vec<f32>);

// ============================================================================
// Utility Components
// ============================================================================

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

// ============================================================================
// Hierarchy Components
// ============================================================================

/// Parent entity reference
#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

/// List of children entities
#[derive(Debug, Clone)]
pub struct Children(pub Vec<hecs::Entity>);

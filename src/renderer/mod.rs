pub mod attributes;
pub mod capabilities;
pub mod collector;
pub mod draw;
pub mod error;
pub mod frustum;
pub mod geometry;
pub mod gl;
pub mod groups;
pub mod lights;
pub mod material;
pub mod plugin;
pub mod primitives;
pub mod program;
pub mod programs;
pub mod properties;
mod refresh;
pub mod render_target;
pub mod renderer_core;
pub mod shader_lib;
pub mod shadow_map;
pub mod sprite;
pub mod state;
pub mod stats;
pub mod texture;
pub mod textures;
pub mod uniforms;

pub use capabilities::Capabilities;
pub use collector::{RenderItem, RenderLists};
pub use error::RenderError;
pub use geometry::{
    AttributeData, BufferAttribute, BufferGeometry, DrawGroup, InterleavedAttribute,
    InterleavedBuffer,
};
pub use gl::{GlContext, RecordingContext};
pub use material::{Material, MaterialKind};
pub use plugin::{Plugin, PluginContext, PluginId, PluginScope, PluginType};
pub use primitives::{box_geometry, plane_geometry, sphere_geometry};
pub use render_target::RenderTarget;
pub use renderer_core::{CameraView, RenderCore, Renderer};
pub use shadow_map::{ShadowMap, ShadowMapPlugin};
pub use sprite::SpritePlugin;
pub use stats::RenderInfo;
pub use texture::Texture;
pub use uniforms::UniformValue;

// renderer/properties.rs
// Side tables holding the GPU state of logical resources. Logical objects
// never see GL handles; everything the driver allocated for them lives here
// and is released exactly once by the matching dispose call.

use std::collections::HashMap;

use crate::asset::Handle;
use crate::renderer::gl::{GlBuffer, GlContext, GlFramebuffer, GlRenderbuffer, GlTexture, IndexType, TextureTarget};
use crate::renderer::lights::LightsHash;
use crate::renderer::material::MaterialFeatures;
use crate::renderer::program::ProgramHandle;
use crate::renderer::state::StateTracker;
use crate::renderer::uniforms::Uniforms;
use crate::renderer::{BufferGeometry, Material, RenderTarget, Texture};
use crate::scene::FogMode;

#[derive(Debug, Clone, Default)]
pub struct MaterialProperties {
    pub program: Option<ProgramHandle>,
    /// Material version the current program was built for.
    pub version: Option<u64>,
    /// Version whose program failed to build; skipped until it changes.
    pub failed_version: Option<u64>,
    pub lights_hash: LightsHash,
    pub fog: FogMode,
    pub features: Option<MaterialFeatures>,
    pub uniforms: Uniforms,
}

/// Which GL buffer of a geometry an entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeSlot {
    Named(String),
    Interleaved(usize),
    Index,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferEntry {
    pub buffer: GlBuffer,
    pub version: u64,
    pub byte_length: usize,
    /// Element type for index buffers after narrowing.
    pub index_type: Option<IndexType>,
}

#[derive(Debug, Clone, Default)]
pub struct GeometryProperties {
    pub buffers: HashMap<AttributeSlot, BufferEntry>,
    /// Index version that needed 32 bits the GPU cannot draw.
    pub index_failed_version: Option<u64>,
    /// Edge count and the (index version, vertex count) it was built from.
    pub wireframe: Option<(usize, Option<u64>, usize)>,
    /// Instance count derived from divisors by the last bind.
    pub instance_count: Option<u32>,
}

impl GeometryProperties {
    pub fn buffer(&self, slot: &AttributeSlot) -> Option<&BufferEntry> {
        self.buffers.get(slot)
    }
}

#[derive(Debug, Clone)]
pub struct TextureProperties {
    pub texture: GlTexture,
    pub target: TextureTarget,
    pub version: Option<u64>,
    pub failed_version: Option<u64>,
    pub anisotropy: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct RenderTargetProperties {
    pub texture: GlTexture,
    /// One per cube face, else exactly one.
    pub framebuffers: Vec<GlFramebuffer>,
    pub renderbuffers: Vec<GlRenderbuffer>,
    pub width: u32,
    pub height: u32,
    pub is_cube: bool,
}

impl RenderTargetProperties {
    pub fn framebuffer(&self, cube_face: u8) -> Option<GlFramebuffer> {
        if self.is_cube {
            self.framebuffers.get(cube_face as usize).copied()
        } else {
            self.framebuffers.first().copied()
        }
    }

    pub fn target(&self) -> TextureTarget {
        if self.is_cube {
            TextureTarget::CubeMap
        } else {
            TextureTarget::Texture2d
        }
    }
}

#[derive(Debug, Default)]
pub struct Properties {
    materials: HashMap<Handle<Material>, MaterialProperties>,
    geometries: HashMap<Handle<BufferGeometry>, GeometryProperties>,
    textures: HashMap<Handle<Texture>, TextureProperties>,
    render_targets: HashMap<Handle<RenderTarget>, RenderTargetProperties>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn material(&self, handle: Handle<Material>) -> Option<&MaterialProperties> {
        self.materials.get(&handle)
    }

    pub fn material_entry(&mut self, handle: Handle<Material>) -> &mut MaterialProperties {
        self.materials.entry(handle).or_default()
    }

    pub fn geometry(&self, handle: Handle<BufferGeometry>) -> Option<&GeometryProperties> {
        self.geometries.get(&handle)
    }

    pub fn geometry_entry(&mut self, handle: Handle<BufferGeometry>) -> &mut GeometryProperties {
        self.geometries.entry(handle).or_default()
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&TextureProperties> {
        self.textures.get(&handle)
    }

    pub fn texture_mut(&mut self, handle: Handle<Texture>) -> Option<&mut TextureProperties> {
        self.textures.get_mut(&handle)
    }

    pub(crate) fn insert_texture(&mut self, handle: Handle<Texture>, entry: TextureProperties) {
        self.textures.insert(handle, entry);
    }

    pub fn render_target(&self, handle: Handle<RenderTarget>) -> Option<&RenderTargetProperties> {
        self.render_targets.get(&handle)
    }

    pub(crate) fn insert_render_target(
        &mut self,
        handle: Handle<RenderTarget>,
        entry: RenderTargetProperties,
    ) {
        self.render_targets.insert(handle, entry);
    }

    /// Forgets the material entry and hands back its program so the caller
    /// can release it.
    pub fn dispose_material(&mut self, handle: Handle<Material>) -> Option<ProgramHandle> {
        self.materials.remove(&handle).and_then(|entry| entry.program)
    }

    pub fn dispose_geometry(&mut self, gl: &mut dyn GlContext, handle: Handle<BufferGeometry>) -> bool {
        let Some(entry) = self.geometries.remove(&handle) else {
            return false;
        };
        for buffer in entry.buffers.values() {
            gl.delete_buffer(buffer.buffer);
        }
        log::debug!(
            "Disposed geometry {} ({} buffers)",
            handle.id(),
            entry.buffers.len()
        );
        true
    }

    pub fn dispose_texture(
        &mut self,
        gl: &mut dyn GlContext,
        state: &mut StateTracker,
        handle: Handle<Texture>,
    ) -> bool {
        let Some(entry) = self.textures.remove(&handle) else {
            return false;
        };
        state.forget_texture(entry.texture);
        gl.delete_texture(entry.texture);
        true
    }

    pub fn dispose_render_target(
        &mut self,
        gl: &mut dyn GlContext,
        state: &mut StateTracker,
        handle: Handle<RenderTarget>,
    ) -> bool {
        let Some(entry) = self.render_targets.remove(&handle) else {
            return false;
        };
        state.forget_texture(entry.texture);
        gl.delete_texture(entry.texture);
        for framebuffer in entry.framebuffers {
            gl.delete_framebuffer(framebuffer);
        }
        for renderbuffer in entry.renderbuffers {
            gl.delete_renderbuffer(renderbuffer);
        }
        true
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Plain textures plus render target colour textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len() + self.render_targets.len()
    }

    pub fn material_handles(&self) -> impl Iterator<Item = Handle<Material>> + '_ {
        self.materials.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetCache;
    use crate::renderer::gl::{GlCall, RecordingContext};

    #[test]
    fn geometry_dispose_deletes_each_buffer_once() {
        let mut gl = RecordingContext::new();
        let log = gl.log();
        let mut geometries = AssetCache::new();
        let handle = geometries.insert(BufferGeometry::new());

        let mut properties = Properties::new();
        let buffer = gl.create_buffer().unwrap();
        properties.geometry_entry(handle).buffers.insert(
            AttributeSlot::Named("position".into()),
            BufferEntry {
                buffer,
                version: 0,
                byte_length: 12,
                index_type: None,
            },
        );

        assert!(properties.dispose_geometry(&mut gl, handle));
        assert!(!properties.dispose_geometry(&mut gl, handle));
        assert!(properties.geometry(handle).is_none());
        assert_eq!(
            log.borrow().count(|c| matches!(c, GlCall::DeleteBuffer(_))),
            1
        );
    }

    #[test]
    fn material_dispose_returns_program() {
        let mut materials = AssetCache::new();
        let handle = materials.insert(Material::basic(glam::Vec3::ONE));
        let mut properties = Properties::new();
        properties.material_entry(handle).program = Some(ProgramHandle::new(3));

        assert_eq!(properties.dispose_material(handle), Some(ProgramHandle::new(3)));
        assert_eq!(properties.dispose_material(handle), None);
    }
}

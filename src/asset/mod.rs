pub mod handle;
pub mod cache;

pub use handle::Handle;
pub use cache::AssetCache;

use crate::renderer::{BufferGeometry, Material, RenderTarget, Texture};

/// Logical resources owned by a renderer. None of them hold GPU handles;
/// those live in the renderer's properties table, keyed by these handles.
pub struct Assets {
    pub geometries: AssetCache<BufferGeometry>,
    pub materials: AssetCache<Material>,
    pub textures: AssetCache<Texture>,
    pub render_targets: AssetCache<RenderTarget>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            geometries: AssetCache::new(),
            materials: AssetCache::new(),
            textures: AssetCache::new(),
            render_targets: AssetCache::new(),
        }
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}

// renderer/stats.rs

/// Counters for the frame being rendered. Reset at the start of every
/// `Renderer::render`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub calls: u32,
    pub vertices: u64,
    pub faces: u64,
    pub points: u64,
    /// Items that were collected but not drawn because of an error.
    pub skipped: u32,
    pub light_refreshes: u32,
}

/// Live GPU objects owned by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub programs: usize,
    pub geometries: usize,
    pub textures: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderInfo {
    pub render: RenderStats,
    pub memory: MemoryStats,
}

impl RenderInfo {
    pub fn reset_render(&mut self) {
        self.render = RenderStats::default();
    }
}

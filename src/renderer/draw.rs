// renderer/draw.rs
// Issues the final draw call and accounts for it.

use crate::renderer::capabilities::Capabilities;
use crate::renderer::gl::{DrawMode, GlContext, IndexType};
use crate::renderer::stats::RenderInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: DrawMode,
    /// Element type of the bound index buffer, `None` for array draws.
    pub index: Option<IndexType>,
    /// First element, in indices or vertices.
    pub start: usize,
    pub count: usize,
    pub instance_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStatus {
    Issued,
    Empty,
    Unsupported,
}

pub fn draw(
    gl: &mut dyn GlContext,
    caps: &Capabilities,
    info: &mut RenderInfo,
    call: DrawCall,
) -> DrawStatus {
    if call.count == 0 {
        return DrawStatus::Empty;
    }

    let instanced = call.instance_count > 1;
    if instanced && !caps.instanced_arrays() {
        log::error!(
            "Drawing {} instances needs ANGLE_instanced_arrays, which is unavailable",
            call.instance_count
        );
        return DrawStatus::Unsupported;
    }

    let count = call.count as i32;
    let instances = call.instance_count.max(1);
    match (call.index, instanced) {
        (Some(index), false) => {
            gl.draw_elements(call.mode, count, index, call.start * index.size_in_bytes())
        }
        (Some(index), true) => gl.draw_elements_instanced(
            call.mode,
            count,
            index,
            call.start * index.size_in_bytes(),
            instances as i32,
        ),
        (None, false) => gl.draw_arrays(call.mode, call.start as i32, count),
        (None, true) => {
            gl.draw_arrays_instanced(call.mode, call.start as i32, count, instances as i32)
        }
    }

    let drawn = call.count as u64 * instances as u64;
    let stats = &mut info.render;
    stats.calls += 1;
    stats.vertices += drawn;
    match call.mode {
        DrawMode::Triangles => stats.faces += call.count as u64 / 3 * instances as u64,
        DrawMode::TriangleStrip | DrawMode::TriangleFan => {
            stats.faces += call.count.saturating_sub(2) as u64 * instances as u64;
        }
        DrawMode::Points => stats.points += drawn,
        DrawMode::Lines | DrawMode::LineLoop | DrawMode::LineStrip => {}
    }
    DrawStatus::Issued
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gl::{Extensions, GlCall, Precision, RecordingContext};

    fn triangles(count: usize) -> DrawCall {
        DrawCall {
            mode: DrawMode::Triangles,
            index: Some(IndexType::U16),
            start: 6,
            count,
            instance_count: 1,
        }
    }

    #[test]
    fn zero_count_draws_nothing() {
        let mut gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        let mut info = RenderInfo::default();
        assert_eq!(draw(&mut gl, &caps, &mut info, triangles(0)), DrawStatus::Empty);
        assert!(gl.log().borrow().is_empty());
        assert_eq!(info, RenderInfo::default());
    }

    #[test]
    fn indexed_offsets_are_in_bytes() {
        let mut gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        let mut info = RenderInfo::default();
        assert_eq!(draw(&mut gl, &caps, &mut info, triangles(36)), DrawStatus::Issued);
        assert_eq!(
            gl.log().borrow().calls()[0],
            GlCall::DrawElements {
                mode: DrawMode::Triangles,
                count: 36,
                index_type: IndexType::U16,
                offset: 12,
            }
        );
        assert_eq!(info.render.calls, 1);
        assert_eq!(info.render.vertices, 36);
        assert_eq!(info.render.faces, 12);
    }

    #[test]
    fn instancing_without_extension_is_refused() {
        let mut gl = RecordingContext::new().with_extensions(Extensions::empty());
        let caps = Capabilities::detect(&gl, Precision::High);
        let mut info = RenderInfo::default();
        let call = DrawCall {
            instance_count: 4,
            ..triangles(3)
        };
        assert_eq!(draw(&mut gl, &caps, &mut info, call), DrawStatus::Unsupported);
        assert_eq!(info.render.calls, 0);

        let mut gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        let points = DrawCall {
            mode: DrawMode::Points,
            index: None,
            start: 0,
            count: 10,
            instance_count: 4,
        };
        assert_eq!(draw(&mut gl, &caps, &mut info, points), DrawStatus::Issued);
        assert_eq!(info.render.points, 40);
        assert_eq!(gl.log().borrow().draw_calls().len(), 1);
    }

    #[test]
    fn strips_and_fans_count_one_face_per_extra_vertex() {
        let mut gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        let mut info = RenderInfo::default();
        let strip = DrawCall {
            mode: DrawMode::TriangleStrip,
            index: None,
            start: 0,
            count: 6,
            instance_count: 1,
        };
        draw(&mut gl, &caps, &mut info, strip);
        assert_eq!(info.render.faces, 4);

        let fan = DrawCall {
            mode: DrawMode::TriangleFan,
            count: 5,
            instance_count: 2,
            ..strip
        };
        draw(&mut gl, &caps, &mut info, fan);
        assert_eq!(info.render.faces, 4 + 6);
        assert_eq!(info.render.vertices, 6 + 10);
    }
}

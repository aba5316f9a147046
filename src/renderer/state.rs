// renderer/state.rs
// Mirror of the GL pipeline state. Every setter compares against the last
// value it sent and only talks to the driver when something changed. `None`
// means unknown, which makes the next call of that kind always emit.

use std::collections::HashMap;

use crate::renderer::gl::{
    BlendEquation, BlendFactor, Capability, CompareFunc, CullFace, FrontFace, GlContext,
    GlFramebuffer, GlProgram, GlTexture, StencilOp, TextureTarget,
};
use crate::renderer::material::{Blending, CustomBlend, Side};

const MAX_TRACKED_ATTRIBUTES: u32 = 64;

type BlendFactors = (BlendFactor, BlendFactor, BlendFactor, BlendFactor);

pub struct StateTracker {
    capabilities: HashMap<Capability, bool>,
    blending: Option<Blending>,
    blend_equations: Option<(BlendEquation, BlendEquation)>,
    blend_factors: Option<BlendFactors>,
    depth_func: Option<CompareFunc>,
    depth_write: Option<bool>,
    color_write: Option<bool>,
    stencil_func: Option<(CompareFunc, i32, u32)>,
    stencil_op: Option<(StencilOp, StencilOp, StencilOp)>,
    stencil_write: Option<u32>,
    flip_sided: Option<bool>,
    cull_face: Option<CullFace>,
    line_width: Option<f32>,
    polygon_offset: Option<(f32, f32)>,
    program: Option<Option<GlProgram>>,
    framebuffer: Option<Option<GlFramebuffer>>,
    texture_unit: Option<u32>,
    bound_textures: HashMap<(u32, TextureTarget), Option<GlTexture>>,
    clear_color: Option<[f32; 4]>,
    clear_depth: Option<f32>,
    clear_stencil: Option<i32>,
    viewport: Option<[i32; 4]>,
    scissor: Option<[i32; 4]>,
    attribute_limit: u32,
    instancing: bool,
    wanted_attributes: u64,
    enabled_attributes: u64,
    known_attributes: u64,
    attribute_divisors: Vec<Option<u32>>,
}

impl StateTracker {
    pub fn new(max_attributes: u32, instancing: bool) -> Self {
        let attribute_limit = max_attributes.min(MAX_TRACKED_ATTRIBUTES);
        Self {
            capabilities: HashMap::new(),
            blending: None,
            blend_equations: None,
            blend_factors: None,
            depth_func: None,
            depth_write: None,
            color_write: None,
            stencil_func: None,
            stencil_op: None,
            stencil_write: None,
            flip_sided: None,
            cull_face: None,
            line_width: None,
            polygon_offset: None,
            program: None,
            framebuffer: None,
            texture_unit: None,
            bound_textures: HashMap::new(),
            clear_color: None,
            clear_depth: None,
            clear_stencil: None,
            viewport: None,
            scissor: None,
            attribute_limit,
            instancing,
            wanted_attributes: 0,
            enabled_attributes: 0,
            known_attributes: 0,
            attribute_divisors: vec![None; attribute_limit as usize],
        }
    }

    /// Default pipeline state the renderer assumes at startup.
    pub fn init_defaults(&mut self, gl: &mut dyn GlContext) {
        self.set_clear_color(gl, [0.0, 0.0, 0.0, 1.0]);
        self.set_clear_depth(gl, 1.0);
        self.set_clear_stencil(gl, 0);

        self.set_depth_test(gl, true);
        self.set_depth_func(gl, CompareFunc::LessEqual);

        self.set_flip_sided(gl, false);
        self.set_cull_face(gl, CullFace::Back);
        self.enable(gl, Capability::CullFace);

        self.set_blending(gl, Blending::Normal);
    }

    /// Forgets every cached value without touching the driver.
    pub fn invalidate(&mut self) {
        let attribute_limit = self.attribute_limit;
        let instancing = self.instancing;
        *self = Self::new(attribute_limit, instancing);
    }

    /// Disables every attribute array this tracker enabled, then forgets all
    /// cached state.
    pub fn reset(&mut self, gl: &mut dyn GlContext) {
        for index in 0..self.attribute_limit {
            let bit = 1u64 << index;
            if self.enabled_attributes & bit != 0 {
                gl.disable_vertex_attrib_array(index);
            }
        }
        self.invalidate();
    }

    pub fn enable(&mut self, gl: &mut dyn GlContext, capability: Capability) {
        if self.capabilities.get(&capability) != Some(&true) {
            gl.enable(capability);
            self.capabilities.insert(capability, true);
        }
    }

    pub fn disable(&mut self, gl: &mut dyn GlContext, capability: Capability) {
        if self.capabilities.get(&capability) != Some(&false) {
            gl.disable(capability);
            self.capabilities.insert(capability, false);
        }
    }

    pub fn set_capability(&mut self, gl: &mut dyn GlContext, capability: Capability, on: bool) {
        if on {
            self.enable(gl, capability);
        } else {
            self.disable(gl, capability);
        }
    }

    pub fn set_blending(&mut self, gl: &mut dyn GlContext, blending: Blending) {
        if self.blending == Some(blending) {
            return;
        }

        match blending {
            Blending::None => self.disable(gl, Capability::Blend),
            Blending::Normal => {
                self.enable(gl, Capability::Blend);
                gl.blend_equation_separate(BlendEquation::Add, BlendEquation::Add);
                gl.blend_func_separate(
                    BlendFactor::SrcAlpha,
                    BlendFactor::OneMinusSrcAlpha,
                    BlendFactor::One,
                    BlendFactor::OneMinusSrcAlpha,
                );
                self.blend_equations = Some((BlendEquation::Add, BlendEquation::Add));
                self.blend_factors = Some((
                    BlendFactor::SrcAlpha,
                    BlendFactor::OneMinusSrcAlpha,
                    BlendFactor::One,
                    BlendFactor::OneMinusSrcAlpha,
                ));
            }
            Blending::Additive => {
                self.apply_fixed_blend(gl, BlendFactor::SrcAlpha, BlendFactor::One)
            }
            Blending::Subtractive => {
                self.apply_fixed_blend(gl, BlendFactor::Zero, BlendFactor::OneMinusSrcColor)
            }
            Blending::Multiply => {
                self.apply_fixed_blend(gl, BlendFactor::Zero, BlendFactor::SrcColor)
            }
            Blending::Custom(custom) => {
                self.enable(gl, Capability::Blend);
                self.apply_custom_blend(gl, custom);
            }
        }

        self.blending = Some(blending);
    }

    fn apply_fixed_blend(&mut self, gl: &mut dyn GlContext, src: BlendFactor, dst: BlendFactor) {
        self.enable(gl, Capability::Blend);
        gl.blend_equation(BlendEquation::Add);
        gl.blend_func(src, dst);
        self.blend_equations = Some((BlendEquation::Add, BlendEquation::Add));
        self.blend_factors = Some((src, dst, src, dst));
    }

    fn apply_custom_blend(&mut self, gl: &mut dyn GlContext, custom: CustomBlend) {
        let equations = (
            custom.equation,
            custom.equation_alpha.unwrap_or(custom.equation),
        );
        if self.blend_equations != Some(equations) {
            gl.blend_equation_separate(equations.0, equations.1);
            self.blend_equations = Some(equations);
        }

        let factors = (
            custom.src,
            custom.dst,
            custom.src_alpha.unwrap_or(custom.src),
            custom.dst_alpha.unwrap_or(custom.dst),
        );
        if self.blend_factors != Some(factors) {
            gl.blend_func_separate(factors.0, factors.1, factors.2, factors.3);
            self.blend_factors = Some(factors);
        }
    }

    pub fn set_depth_test(&mut self, gl: &mut dyn GlContext, depth_test: bool) {
        self.set_capability(gl, Capability::DepthTest, depth_test);
    }

    pub fn set_depth_write(&mut self, gl: &mut dyn GlContext, depth_write: bool) {
        if self.depth_write != Some(depth_write) {
            gl.depth_mask(depth_write);
            self.depth_write = Some(depth_write);
        }
    }

    pub fn set_depth_func(&mut self, gl: &mut dyn GlContext, func: CompareFunc) {
        if self.depth_func != Some(func) {
            gl.depth_func(func);
            self.depth_func = Some(func);
        }
    }

    pub fn set_color_write(&mut self, gl: &mut dyn GlContext, color_write: bool) {
        if self.color_write != Some(color_write) {
            gl.color_mask(color_write, color_write, color_write, color_write);
            self.color_write = Some(color_write);
        }
    }

    pub fn set_stencil_test(&mut self, gl: &mut dyn GlContext, stencil_test: bool) {
        self.set_capability(gl, Capability::StencilTest, stencil_test);
    }

    pub fn set_stencil_func(
        &mut self,
        gl: &mut dyn GlContext,
        func: CompareFunc,
        reference: i32,
        mask: u32,
    ) {
        let value = (func, reference, mask);
        if self.stencil_func != Some(value) {
            gl.stencil_func(func, reference, mask);
            self.stencil_func = Some(value);
        }
    }

    pub fn set_stencil_op(
        &mut self,
        gl: &mut dyn GlContext,
        fail: StencilOp,
        depth_fail: StencilOp,
        pass: StencilOp,
    ) {
        let value = (fail, depth_fail, pass);
        if self.stencil_op != Some(value) {
            gl.stencil_op(fail, depth_fail, pass);
            self.stencil_op = Some(value);
        }
    }

    pub fn set_stencil_write(&mut self, gl: &mut dyn GlContext, mask: u32) {
        if self.stencil_write != Some(mask) {
            gl.stencil_mask(mask);
            self.stencil_write = Some(mask);
        }
    }

    pub fn set_polygon_offset(
        &mut self,
        gl: &mut dyn GlContext,
        enabled: bool,
        factor: f32,
        units: f32,
    ) {
        self.set_capability(gl, Capability::PolygonOffsetFill, enabled);
        if enabled && self.polygon_offset != Some((factor, units)) {
            gl.polygon_offset(factor, units);
            self.polygon_offset = Some((factor, units));
        }
    }

    pub fn set_material_faces(&mut self, gl: &mut dyn GlContext, side: Side) {
        self.set_capability(gl, Capability::CullFace, side != Side::Double);
        self.set_flip_sided(gl, side == Side::Back);
    }

    pub fn set_flip_sided(&mut self, gl: &mut dyn GlContext, flip_sided: bool) {
        if self.flip_sided != Some(flip_sided) {
            gl.front_face(if flip_sided { FrontFace::Cw } else { FrontFace::Ccw });
            self.flip_sided = Some(flip_sided);
        }
    }

    pub fn set_cull_face(&mut self, gl: &mut dyn GlContext, face: CullFace) {
        if self.cull_face != Some(face) {
            gl.cull_face(face);
            self.cull_face = Some(face);
        }
    }

    pub fn set_line_width(&mut self, gl: &mut dyn GlContext, width: f32) {
        if self.line_width != Some(width) {
            gl.line_width(width);
            self.line_width = Some(width);
        }
    }

    pub fn set_scissor_test(&mut self, gl: &mut dyn GlContext, scissor_test: bool) {
        self.set_capability(gl, Capability::ScissorTest, scissor_test);
    }

    /// Returns true when the program actually changed.
    pub fn use_program(&mut self, gl: &mut dyn GlContext, program: GlProgram) -> bool {
        if self.program == Some(Some(program)) {
            return false;
        }
        gl.use_program(Some(program));
        self.program = Some(Some(program));
        true
    }

    pub fn current_program(&self) -> Option<GlProgram> {
        self.program.flatten()
    }

    pub fn bind_framebuffer(&mut self, gl: &mut dyn GlContext, framebuffer: Option<GlFramebuffer>) {
        if self.framebuffer != Some(framebuffer) {
            gl.bind_framebuffer(framebuffer);
            self.framebuffer = Some(framebuffer);
        }
    }

    pub fn active_texture(&mut self, gl: &mut dyn GlContext, unit: u32) {
        if self.texture_unit != Some(unit) {
            gl.active_texture(unit);
            self.texture_unit = Some(unit);
        }
    }

    pub fn bind_texture(
        &mut self,
        gl: &mut dyn GlContext,
        unit: u32,
        target: TextureTarget,
        texture: Option<GlTexture>,
    ) {
        self.active_texture(gl, unit);
        if self.bound_textures.get(&(unit, target)) != Some(&texture) {
            gl.bind_texture(target, texture);
            self.bound_textures.insert((unit, target), texture);
        }
    }

    /// Drops any binding of `texture`, used when the texture is deleted.
    pub fn forget_texture(&mut self, texture: GlTexture) {
        self.bound_textures.retain(|_, bound| *bound != Some(texture));
    }

    pub fn set_clear_color(&mut self, gl: &mut dyn GlContext, color: [f32; 4]) {
        if self.clear_color != Some(color) {
            gl.clear_color(color[0], color[1], color[2], color[3]);
            self.clear_color = Some(color);
        }
    }

    pub fn set_clear_depth(&mut self, gl: &mut dyn GlContext, depth: f32) {
        if self.clear_depth != Some(depth) {
            gl.clear_depth(depth);
            self.clear_depth = Some(depth);
        }
    }

    pub fn set_clear_stencil(&mut self, gl: &mut dyn GlContext, stencil: i32) {
        if self.clear_stencil != Some(stencil) {
            gl.clear_stencil(stencil);
            self.clear_stencil = Some(stencil);
        }
    }

    pub fn set_viewport(&mut self, gl: &mut dyn GlContext, viewport: [i32; 4]) {
        if self.viewport != Some(viewport) {
            gl.viewport(viewport[0], viewport[1], viewport[2], viewport[3]);
            self.viewport = Some(viewport);
        }
    }

    pub fn set_scissor(&mut self, gl: &mut dyn GlContext, scissor: [i32; 4]) {
        if self.scissor != Some(scissor) {
            gl.scissor(scissor[0], scissor[1], scissor[2], scissor[3]);
            self.scissor = Some(scissor);
        }
    }

    // Vertex attribute arrays: the binder marks what the next draw wants,
    // then `disable_unused_attributes` turns off whatever is left over.

    pub fn init_attributes(&mut self) {
        self.wanted_attributes = 0;
    }

    pub fn enable_attribute(&mut self, gl: &mut dyn GlContext, index: u32) {
        self.enable_attribute_and_divisor(gl, index, 0);
    }

    pub fn enable_attribute_and_divisor(&mut self, gl: &mut dyn GlContext, index: u32, divisor: u32) {
        if index >= self.attribute_limit {
            log::warn!(
                "Attribute location {} exceeds the {} tracked attributes",
                index,
                self.attribute_limit
            );
            return;
        }

        let bit = 1u64 << index;
        self.wanted_attributes |= bit;

        if self.known_attributes & bit == 0 || self.enabled_attributes & bit == 0 {
            gl.enable_vertex_attrib_array(index);
            self.enabled_attributes |= bit;
            self.known_attributes |= bit;
        }

        let slot = &mut self.attribute_divisors[index as usize];
        if *slot != Some(divisor) {
            if divisor == 0 && !self.instancing {
                *slot = Some(0);
            } else {
                gl.vertex_attrib_divisor(index, divisor);
                *slot = Some(divisor);
            }
        }
    }

    pub fn disable_unused_attributes(&mut self, gl: &mut dyn GlContext) {
        for index in 0..self.attribute_limit {
            let bit = 1u64 << index;
            if self.wanted_attributes & bit != 0 {
                continue;
            }
            let maybe_enabled =
                self.known_attributes & bit == 0 || self.enabled_attributes & bit != 0;
            if maybe_enabled {
                gl.disable_vertex_attrib_array(index);
                self.enabled_attributes &= !bit;
                self.known_attributes |= bit;
            }
        }
    }

    pub fn is_attribute_enabled(&self, index: u32) -> bool {
        index < self.attribute_limit && self.enabled_attributes & (1u64 << index) != 0
    }
}

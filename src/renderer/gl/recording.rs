// renderer/gl/recording.rs
// Headless GlContext that records every call. Used by the tests and the demo
// binary; it hands out object names, tracks shader sources and resolves
// attribute/uniform locations from the declarations that survive the
// preprocessor.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::rc::Rc;

use super::*;

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    Enable(Capability),
    Disable(Capability),
    BlendEquation(BlendEquation),
    BlendEquationSeparate(BlendEquation, BlendEquation),
    BlendFunc(BlendFactor, BlendFactor),
    BlendFuncSeparate(BlendFactor, BlendFactor, BlendFactor, BlendFactor),
    DepthFunc(CompareFunc),
    DepthMask(bool),
    ColorMask([bool; 4]),
    StencilFunc(CompareFunc, i32, u32),
    StencilOp(StencilOp, StencilOp, StencilOp),
    StencilMask(u32),
    FrontFace(FrontFace),
    CullFace(CullFace),
    LineWidth(f32),
    PolygonOffset(f32, f32),
    ClearColor([f32; 4]),
    ClearDepth(f32),
    ClearStencil(i32),
    Clear(ClearMask),
    Viewport([i32; 4]),
    Scissor([i32; 4]),
    CreateBuffer(GlBuffer),
    DeleteBuffer(GlBuffer),
    BindBuffer(BufferTarget, Option<GlBuffer>),
    BufferData {
        target: BufferTarget,
        len: usize,
        usage: BufferUsage,
    },
    BufferSubData {
        target: BufferTarget,
        offset: usize,
        len: usize,
    },
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        data_type: DataType,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    VertexAttribDivisor(u32, u32),
    VertexAttrib(u32, Vec<f32>),
    CreateShader(GlShader, ShaderStage),
    CompileShader(GlShader),
    DeleteShader(GlShader),
    CreateProgram(GlProgram),
    LinkProgram(GlProgram),
    DeleteProgram(GlProgram),
    UseProgram(Option<GlProgram>),
    UniformI(UniformLocation, Vec<i32>),
    UniformF(UniformLocation, Vec<f32>),
    UniformMatrix(UniformLocation, Vec<f32>),
    CreateTexture(GlTexture),
    DeleteTexture(GlTexture),
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<GlTexture>),
    PixelStore(PixelStore),
    TexParameter(TextureTarget, TextureParam),
    TexImage2d {
        target: ImageTarget,
        level: i32,
        format: TextureFormat,
        width: u32,
        height: u32,
        data_type: DataType,
        has_pixels: bool,
    },
    CompressedTexImage2d {
        target: ImageTarget,
        level: i32,
        format: CompressedFormat,
        width: u32,
        height: u32,
    },
    GenerateMipmap(TextureTarget),
    CreateFramebuffer(GlFramebuffer),
    DeleteFramebuffer(GlFramebuffer),
    BindFramebuffer(Option<GlFramebuffer>),
    FramebufferTexture2d(FramebufferAttachment, ImageTarget, Option<GlTexture>),
    CreateRenderbuffer(GlRenderbuffer),
    DeleteRenderbuffer(GlRenderbuffer),
    BindRenderbuffer(Option<GlRenderbuffer>),
    RenderbufferStorage(RenderbufferFormat, u32, u32),
    FramebufferRenderbuffer(FramebufferAttachment, Option<GlRenderbuffer>),
    ReadPixels([i32; 2], [u32; 2]),
    DrawArrays {
        mode: DrawMode,
        first: i32,
        count: i32,
    },
    DrawElements {
        mode: DrawMode,
        count: i32,
        index_type: IndexType,
        offset: usize,
    },
    DrawArraysInstanced {
        mode: DrawMode,
        first: i32,
        count: i32,
        instances: i32,
    },
    DrawElementsInstanced {
        mode: DrawMode,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instances: i32,
    },
}

impl GlCall {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            GlCall::DrawArrays { .. }
                | GlCall::DrawElements { .. }
                | GlCall::DrawArraysInstanced { .. }
                | GlCall::DrawElementsInstanced { .. }
        )
    }
}

/// Shared view of what a `RecordingContext` has been asked to do.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Vec<GlCall>,
    uniform_names: HashMap<u32, String>,
}

impl CallLog {
    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn draw_calls(&self) -> Vec<&GlCall> {
        self.calls.iter().filter(|call| call.is_draw()).collect()
    }

    pub fn uniform_name(&self, location: UniformLocation) -> Option<&str> {
        self.uniform_names.get(&location.0).map(String::as_str)
    }

    /// Number of uploads to any location declared under `name`.
    pub fn uniform_uploads(&self, name: &str) -> usize {
        self.count(|call| match call {
            GlCall::UniformI(loc, _) | GlCall::UniformF(loc, _) | GlCall::UniformMatrix(loc, _) => {
                self.uniform_name(*loc) == Some(name)
            }
            _ => false,
        })
    }

    fn push(&mut self, call: GlCall) {
        log::trace!("gl: {:?}", call);
        self.calls.push(call);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GlLimits {
    pub max_texture_image_units: i32,
    pub max_vertex_texture_image_units: i32,
    pub max_texture_size: i32,
    pub max_cube_map_texture_size: i32,
    pub max_vertex_attribs: i32,
    pub max_vertex_uniform_vectors: i32,
    pub max_varying_vectors: i32,
    pub max_fragment_uniform_vectors: i32,
    pub max_anisotropy: f32,
    pub vertex_precision: Precision,
    pub fragment_precision: Precision,
}

impl Default for GlLimits {
    fn default() -> Self {
        Self {
            max_texture_image_units: 16,
            max_vertex_texture_image_units: 4,
            max_texture_size: 4096,
            max_cube_map_texture_size: 4096,
            max_vertex_attribs: 16,
            max_vertex_uniform_vectors: 256,
            max_varying_vectors: 8,
            max_fragment_uniform_vectors: 64,
            max_anisotropy: 16.0,
            vertex_precision: Precision::High,
            fragment_precision: Precision::High,
        }
    }
}

#[derive(Debug)]
struct ShaderRecord {
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    shaders: Vec<GlShader>,
    linked: bool,
    log: String,
    attributes: HashMap<String, u32>,
    uniforms: HashMap<String, UniformLocation>,
}

pub struct RecordingContext {
    log: Rc<RefCell<CallLog>>,
    limits: GlLimits,
    extensions: Extensions,
    next_name: u32,
    next_uniform: u32,
    shaders: HashMap<GlShader, ShaderRecord>,
    programs: HashMap<GlProgram, ProgramRecord>,
    fail_marker: Option<String>,
    framebuffer_status: FramebufferStatus,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(CallLog::default())),
            limits: GlLimits::default(),
            extensions: Extensions::TEXTURE_FLOAT
                | Extensions::STANDARD_DERIVATIVES
                | Extensions::TEXTURE_FILTER_ANISOTROPIC
                | Extensions::COMPRESSED_TEXTURE_S3TC
                | Extensions::ELEMENT_INDEX_UINT
                | Extensions::INSTANCED_ARRAYS
                | Extensions::FRAG_DEPTH,
            next_name: 0,
            next_uniform: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            fail_marker: None,
            framebuffer_status: FramebufferStatus::Complete,
        }
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_limits(mut self, limits: GlLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Any shader whose source contains `marker` fails to compile.
    pub fn with_compile_failure(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    pub fn with_framebuffer_status(mut self, status: FramebufferStatus) -> Self {
        self.framebuffer_status = status;
        self
    }

    pub fn log(&self) -> Rc<RefCell<CallLog>> {
        Rc::clone(&self.log)
    }

    fn record(&self, call: GlCall) {
        self.log.borrow_mut().push(call);
    }

    fn next(&mut self) -> NonZeroU32 {
        self.next_name += 1;
        NonZeroU32::new(self.next_name).unwrap_or(NonZeroU32::MIN)
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GlContext for RecordingContext {
    fn get_parameter_i32(&self, parameter: GlParameter) -> i32 {
        let limits = &self.limits;
        match parameter {
            GlParameter::MaxTextureImageUnits => limits.max_texture_image_units,
            GlParameter::MaxVertexTextureImageUnits => limits.max_vertex_texture_image_units,
            GlParameter::MaxTextureSize => limits.max_texture_size,
            GlParameter::MaxCubeMapTextureSize => limits.max_cube_map_texture_size,
            GlParameter::MaxVertexAttribs => limits.max_vertex_attribs,
            GlParameter::MaxVertexUniformVectors => limits.max_vertex_uniform_vectors,
            GlParameter::MaxVaryingVectors => limits.max_varying_vectors,
            GlParameter::MaxFragmentUniformVectors => limits.max_fragment_uniform_vectors,
        }
    }

    fn extensions(&self) -> Extensions {
        self.extensions
    }

    fn shader_precision(&self, stage: ShaderStage, precision: Precision) -> i32 {
        let best = match stage {
            ShaderStage::Vertex => self.limits.vertex_precision,
            ShaderStage::Fragment => self.limits.fragment_precision,
        };
        if precision <= best {
            match precision {
                Precision::High => 23,
                Precision::Medium => 10,
                Precision::Low => 8,
            }
        } else {
            0
        }
    }

    fn max_anisotropy(&self) -> f32 {
        if self.extensions.contains(Extensions::TEXTURE_FILTER_ANISOTROPIC) {
            self.limits.max_anisotropy
        } else {
            0.0
        }
    }

    fn enable(&mut self, capability: Capability) {
        self.record(GlCall::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.record(GlCall::Disable(capability));
    }

    fn blend_equation(&mut self, equation: BlendEquation) {
        self.record(GlCall::BlendEquation(equation));
    }

    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation) {
        self.record(GlCall::BlendEquationSeparate(color, alpha));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(GlCall::BlendFunc(src, dst));
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.record(GlCall::BlendFuncSeparate(src_rgb, dst_rgb, src_alpha, dst_alpha));
    }

    fn depth_func(&mut self, func: CompareFunc) {
        self.record(GlCall::DepthFunc(func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(GlCall::DepthMask(write));
    }

    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.record(GlCall::ColorMask([red, green, blue, alpha]));
    }

    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.record(GlCall::StencilFunc(func, reference, mask));
    }

    fn stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        self.record(GlCall::StencilOp(fail, depth_fail, pass));
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.record(GlCall::StencilMask(mask));
    }

    fn front_face(&mut self, face: FrontFace) {
        self.record(GlCall::FrontFace(face));
    }

    fn cull_face(&mut self, face: CullFace) {
        self.record(GlCall::CullFace(face));
    }

    fn line_width(&mut self, width: f32) {
        self.record(GlCall::LineWidth(width));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.record(GlCall::PolygonOffset(factor, units));
    }

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record(GlCall::ClearColor([red, green, blue, alpha]));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(GlCall::ClearDepth(depth));
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.record(GlCall::ClearStencil(stencil));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(GlCall::Clear(mask));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport([x, y, width, height]));
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Scissor([x, y, width, height]));
    }

    fn create_buffer(&mut self) -> Result<GlBuffer, String> {
        let buffer = GlBuffer(self.next());
        self.record(GlCall::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: GlBuffer) {
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GlBuffer>) {
        self.record(GlCall::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(GlCall::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.record(GlCall::BufferSubData {
            target,
            offset,
            len: data.len(),
        });
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record(GlCall::DisableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.record(GlCall::VertexAttribPointer {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
        });
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        self.record(GlCall::VertexAttribDivisor(index, divisor));
    }

    fn vertex_attrib(&mut self, index: u32, value: &[f32]) {
        self.record(GlCall::VertexAttrib(index, value.to_vec()));
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<GlShader, String> {
        let shader = GlShader(self.next());
        self.shaders.insert(
            shader,
            ShaderRecord {
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        self.record(GlCall::CreateShader(shader, stage));
        Ok(shader)
    }

    fn shader_source(&mut self, shader: GlShader, source: &str) {
        if let Some(record) = self.shaders.get_mut(&shader) {
            record.source = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: GlShader) {
        let marker = self.fail_marker.clone();
        if let Some(record) = self.shaders.get_mut(&shader) {
            match marker {
                Some(marker) if record.source.contains(&marker) => {
                    record.compiled = false;
                    record.log = format!("ERROR: 0:1: '{}' : syntax error", marker);
                }
                _ => {
                    record.compiled = true;
                    record.log.clear();
                }
            }
        }
        self.record(GlCall::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: GlShader) -> bool {
        self.shaders.get(&shader).map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: GlShader) -> String {
        self.shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: GlShader) {
        self.record(GlCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> Result<GlProgram, String> {
        let program = GlProgram(self.next());
        self.programs.insert(program, ProgramRecord::default());
        self.record(GlCall::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&mut self, program: GlProgram, shader: GlShader) {
        if let Some(record) = self.programs.get_mut(&program) {
            record.shaders.push(shader);
        }
    }

    fn link_program(&mut self, program: GlProgram) {
        self.record(GlCall::LinkProgram(program));
        let Some(record) = self.programs.get(&program) else {
            return;
        };

        let mut linked = !record.shaders.is_empty();
        let mut attributes = Vec::new();
        let mut uniforms = Vec::new();
        for shader in &record.shaders {
            let Some(source) = self.shaders.get(shader) else {
                linked = false;
                continue;
            };
            linked &= source.compiled;
            let declared = active_declarations(&source.source);
            attributes.extend(declared.attributes);
            uniforms.extend(declared.uniforms);
        }

        let mut attribute_locations = HashMap::new();
        for name in attributes {
            let next = attribute_locations.len() as u32;
            attribute_locations.entry(name).or_insert(next);
        }

        let mut uniform_locations = HashMap::new();
        let mut seen = HashSet::new();
        for name in uniforms {
            if !seen.insert(name.clone()) {
                continue;
            }
            self.next_uniform += 1;
            let location = UniformLocation(self.next_uniform);
            self.log
                .borrow_mut()
                .uniform_names
                .insert(location.0, name.clone());
            uniform_locations.insert(name, location);
        }

        if let Some(record) = self.programs.get_mut(&program) {
            record.linked = linked;
            record.log = if linked {
                String::new()
            } else {
                "link failed: one or more shaders did not compile".to_string()
            };
            record.attributes = attribute_locations;
            record.uniforms = uniform_locations;
        }
    }

    fn program_link_status(&self, program: GlProgram) -> bool {
        self.programs.get(&program).map_or(false, |p| p.linked)
    }

    fn program_info_log(&self, program: GlProgram) -> String {
        self.programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: GlProgram) {
        self.programs.remove(&program);
        self.record(GlCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<GlProgram>) {
        self.record(GlCall::UseProgram(program));
    }

    fn get_attrib_location(&self, program: GlProgram, name: &str) -> Option<u32> {
        self.programs
            .get(&program)
            .and_then(|p| p.attributes.get(name).copied())
    }

    fn get_uniform_location(&self, program: GlProgram, name: &str) -> Option<UniformLocation> {
        self.programs
            .get(&program)
            .and_then(|p| p.uniforms.get(name).copied())
    }

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        self.record(GlCall::UniformI(location, vec![value]));
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        self.record(GlCall::UniformF(location, vec![value]));
    }

    fn uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32) {
        self.record(GlCall::UniformF(location, vec![x, y]));
    }

    fn uniform_3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32) {
        self.record(GlCall::UniformF(location, vec![x, y, z]));
    }

    fn uniform_4f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        self.record(GlCall::UniformF(location, vec![x, y, z, w]));
    }

    fn uniform_1iv(&mut self, location: UniformLocation, values: &[i32]) {
        self.record(GlCall::UniformI(location, values.to_vec()));
    }

    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.record(GlCall::UniformF(location, values.to_vec()));
    }

    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.record(GlCall::UniformF(location, values.to_vec()));
    }

    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.record(GlCall::UniformF(location, values.to_vec()));
    }

    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.record(GlCall::UniformF(location, values.to_vec()));
    }

    fn uniform_matrix_3fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.record(GlCall::UniformMatrix(location, values.to_vec()));
    }

    fn uniform_matrix_4fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.record(GlCall::UniformMatrix(location, values.to_vec()));
    }

    fn create_texture(&mut self) -> Result<GlTexture, String> {
        let texture = GlTexture(self.next());
        self.record(GlCall::CreateTexture(texture));
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: GlTexture) {
        self.record(GlCall::DeleteTexture(texture));
    }

    fn active_texture(&mut self, unit: u32) {
        self.record(GlCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<GlTexture>) {
        self.record(GlCall::BindTexture(target, texture));
    }

    fn pixel_store(&mut self, store: PixelStore) {
        self.record(GlCall::PixelStore(store));
    }

    fn tex_parameter(&mut self, target: TextureTarget, param: TextureParam) {
        self.record(GlCall::TexParameter(target, param));
    }

    fn tex_image_2d(
        &mut self,
        target: ImageTarget,
        level: i32,
        format: TextureFormat,
        width: u32,
        height: u32,
        data_type: DataType,
        pixels: Option<&[u8]>,
    ) {
        self.record(GlCall::TexImage2d {
            target,
            level,
            format,
            width,
            height,
            data_type,
            has_pixels: pixels.is_some(),
        });
    }

    fn compressed_tex_image_2d(
        &mut self,
        target: ImageTarget,
        level: i32,
        format: CompressedFormat,
        width: u32,
        height: u32,
        _data: &[u8],
    ) {
        self.record(GlCall::CompressedTexImage2d {
            target,
            level,
            format,
            width,
            height,
        });
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        self.record(GlCall::GenerateMipmap(target));
    }

    fn create_framebuffer(&mut self) -> Result<GlFramebuffer, String> {
        let framebuffer = GlFramebuffer(self.next());
        self.record(GlCall::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: GlFramebuffer) {
        self.record(GlCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<GlFramebuffer>) {
        self.record(GlCall::BindFramebuffer(framebuffer));
    }

    fn framebuffer_texture_2d(
        &mut self,
        attachment: FramebufferAttachment,
        target: ImageTarget,
        texture: Option<GlTexture>,
        _level: i32,
    ) {
        self.record(GlCall::FramebufferTexture2d(attachment, target, texture));
    }

    fn create_renderbuffer(&mut self) -> Result<GlRenderbuffer, String> {
        let renderbuffer = GlRenderbuffer(self.next());
        self.record(GlCall::CreateRenderbuffer(renderbuffer));
        Ok(renderbuffer)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GlRenderbuffer) {
        self.record(GlCall::DeleteRenderbuffer(renderbuffer));
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<GlRenderbuffer>) {
        self.record(GlCall::BindRenderbuffer(renderbuffer));
    }

    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32) {
        self.record(GlCall::RenderbufferStorage(format, width, height));
    }

    fn framebuffer_renderbuffer(
        &mut self,
        attachment: FramebufferAttachment,
        renderbuffer: Option<GlRenderbuffer>,
    ) {
        self.record(GlCall::FramebufferRenderbuffer(attachment, renderbuffer));
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        self.framebuffer_status
    }

    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, pixels: &mut [u8]) {
        pixels.fill(0);
        self.record(GlCall::ReadPixels([x, y], [width, height]));
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { mode, first, count });
    }

    fn draw_elements(&mut self, mode: DrawMode, count: i32, index_type: IndexType, offset: usize) {
        self.record(GlCall::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: i32, count: i32, instances: i32) {
        self.record(GlCall::DrawArraysInstanced {
            mode,
            first,
            count,
            instances,
        });
    }

    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instances: i32,
    ) {
        self.record(GlCall::DrawElementsInstanced {
            mode,
            count,
            index_type,
            offset,
            instances,
        });
    }
}

#[derive(Debug, Default, PartialEq)]
struct Declarations {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

struct Branch {
    parent_active: bool,
    active: bool,
    taken: bool,
}

/// Collects `attribute` and `uniform` names from the lines a GLSL
/// preprocessor would keep. Understands `#define`, `#ifdef`, `#ifndef`,
/// `#if`, `#else` and `#endif` with simple comparisons.
fn active_declarations(source: &str) -> Declarations {
    let mut defines: HashMap<String, String> = HashMap::new();
    let mut branches: Vec<Branch> = Vec::new();
    let mut declared = Declarations::default();

    for line in source.lines() {
        let line = line.trim();
        let active = branches.last().map_or(true, |b| b.active);

        if let Some(directive) = line.strip_prefix('#') {
            let directive = directive.trim_start();
            let (keyword, rest) = directive
                .split_once(char::is_whitespace)
                .map(|(k, r)| (k, r.trim()))
                .unwrap_or((directive, ""));
            match keyword {
                "define" if active => {
                    let (name, value) = rest
                        .split_once(char::is_whitespace)
                        .map(|(n, v)| (n, v.trim()))
                        .unwrap_or((rest, ""));
                    defines.insert(name.to_string(), value.to_string());
                }
                "ifdef" | "ifndef" | "if" => {
                    let condition = match keyword {
                        "ifdef" => defines.contains_key(rest),
                        "ifndef" => !defines.contains_key(rest),
                        _ => evaluate_condition(rest, &defines),
                    };
                    branches.push(Branch {
                        parent_active: active,
                        active: active && condition,
                        taken: condition,
                    });
                }
                "else" => {
                    if let Some(branch) = branches.last_mut() {
                        branch.active = branch.parent_active && !branch.taken;
                        branch.taken = true;
                    }
                }
                "endif" => {
                    branches.pop();
                }
                _ => {}
            }
            continue;
        }

        if !active {
            continue;
        }

        let (is_attribute, rest) = if let Some(rest) = line.strip_prefix("attribute ") {
            (true, rest)
        } else if let Some(rest) = line.strip_prefix("uniform ") {
            (false, rest)
        } else {
            continue;
        };

        let mut tokens = rest
            .split_whitespace()
            .filter(|t| !matches!(*t, "highp" | "mediump" | "lowp"));
        let _ty = tokens.next();
        let Some(name) = tokens.next() else {
            continue;
        };
        let name = name
            .split(|c: char| c == '[' || c == ';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        if name.is_empty() {
            continue;
        }
        if is_attribute {
            declared.attributes.push(name);
        } else {
            declared.uniforms.push(name);
        }
    }

    declared
}

fn evaluate_condition(expression: &str, defines: &HashMap<String, String>) -> bool {
    let expression = expression.trim();
    if let Some(inner) = expression.strip_prefix("defined") {
        let name = inner.trim().trim_start_matches('(').trim_end_matches(')').trim();
        return defines.contains_key(name);
    }

    let value_of = |token: &str| -> i64 {
        let token = token.trim();
        token
            .parse::<i64>()
            .ok()
            .or_else(|| defines.get(token).and_then(|v| v.parse::<i64>().ok()))
            .unwrap_or(0)
    };

    for op in [">=", "<=", "==", "!=", ">", "<"] {
        if let Some((lhs, rhs)) = expression.split_once(op) {
            let (lhs, rhs) = (value_of(lhs), value_of(rhs));
            return match op {
                ">=" => lhs >= rhs,
                "<=" => lhs <= rhs,
                "==" => lhs == rhs,
                "!=" => lhs != rhs,
                ">" => lhs > rhs,
                _ => lhs < rhs,
            };
        }
    }

    value_of(expression) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocessor_skips_inactive_declarations() {
        let source = "\
#define USE_MAP
#define MAX_DIR_LIGHTS 2
attribute vec3 position;
#ifdef USE_COLOR
attribute vec3 color;
#endif
#ifdef USE_MAP
uniform sampler2D map;
#else
uniform float unused;
#endif
#if MAX_DIR_LIGHTS > 0
uniform vec3 directionalLightColor[ MAX_DIR_LIGHTS ];
#endif
#if MAX_POINT_LIGHTS > 0
uniform vec3 pointLightColor[ MAX_POINT_LIGHTS ];
#endif
uniform highp mat4 modelMatrix;
";
        let declared = active_declarations(source);
        assert_eq!(declared.attributes, vec!["position".to_string()]);
        assert_eq!(
            declared.uniforms,
            vec![
                "map".to_string(),
                "directionalLightColor".to_string(),
                "modelMatrix".to_string()
            ]
        );
    }

    #[test]
    fn nested_branches_respect_parent() {
        let source = "\
#ifdef A
#ifndef B
uniform float inner;
#endif
#else
uniform float other;
#endif
";
        let declared = active_declarations(source);
        assert_eq!(declared.uniforms, vec!["other".to_string()]);
    }

    #[test]
    fn compile_failure_marker_fails_link() {
        let mut gl = RecordingContext::new().with_compile_failure("BROKEN");
        let vs = gl.create_shader(ShaderStage::Vertex).unwrap();
        gl.shader_source(vs, "void main() { BROKEN }");
        gl.compile_shader(vs);
        assert!(!gl.shader_compile_status(vs));
        assert!(gl.shader_info_log(vs).contains("BROKEN"));

        let program = gl.create_program().unwrap();
        gl.attach_shader(program, vs);
        gl.link_program(program);
        assert!(!gl.program_link_status(program));
    }

    #[test]
    fn uniform_locations_are_named_in_the_log() {
        let mut gl = RecordingContext::new();
        let log = gl.log();
        let vs = gl.create_shader(ShaderStage::Vertex).unwrap();
        gl.shader_source(vs, "uniform mat4 viewMatrix;\nattribute vec3 position;");
        gl.compile_shader(vs);
        let program = gl.create_program().unwrap();
        gl.attach_shader(program, vs);
        gl.link_program(program);

        let location = gl.get_uniform_location(program, "viewMatrix").unwrap();
        assert_eq!(gl.get_attrib_location(program, "position"), Some(0));
        gl.uniform_matrix_4fv(location, &[0.0; 16]);
        assert_eq!(log.borrow().uniform_uploads("viewMatrix"), 1);
    }
}

// renderer/gl/glow_backend.rs
// `GlContext` over a native `glow::Context`.

use glow::HasContext;

use super::*;

// Extension enums glow does not name.
const TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FE;
const MAX_TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FF;
const COMPRESSED_RGB_S3TC_DXT1_EXT: u32 = 0x83F0;
const COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
const COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
const COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;
const COMPRESSED_RGB_PVRTC_4BPPV1_IMG: u32 = 0x8C00;
const COMPRESSED_RGB_PVRTC_2BPPV1_IMG: u32 = 0x8C01;
const COMPRESSED_RGBA_PVRTC_4BPPV1_IMG: u32 = 0x8C02;
const COMPRESSED_RGBA_PVRTC_2BPPV1_IMG: u32 = 0x8C03;
const ETC1_RGB8_OES: u32 = 0x8D64;

pub struct GlowContext {
    gl: glow::Context,
    extensions: Extensions,
}

impl GlowContext {
    pub fn new(gl: glow::Context) -> Self {
        let extensions = Extensions::from_names(gl.supported_extensions().iter().map(String::as_str));
        log::info!("GL backend: {:?}", gl.version());
        log::debug!("GL extensions: {:?}", extensions);
        Self { gl, extensions }
    }

    pub fn inner(&self) -> &glow::Context {
        &self.gl
    }
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Dither => glow::DITHER,
        Capability::PolygonOffsetFill => glow::POLYGON_OFFSET_FILL,
        Capability::ScissorTest => glow::SCISSOR_TEST,
        Capability::StencilTest => glow::STENCIL_TEST,
    }
}

fn blend_equation(equation: BlendEquation) -> u32 {
    match equation {
        BlendEquation::Add => glow::FUNC_ADD,
        BlendEquation::Subtract => glow::FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => glow::MIN,
        BlendEquation::Max => glow::MAX,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
    }
}

fn compare(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Never => glow::NEVER,
        CompareFunc::Less => glow::LESS,
        CompareFunc::Equal => glow::EQUAL,
        CompareFunc::LessEqual => glow::LEQUAL,
        CompareFunc::Greater => glow::GREATER,
        CompareFunc::NotEqual => glow::NOTEQUAL,
        CompareFunc::GreaterEqual => glow::GEQUAL,
        CompareFunc::Always => glow::ALWAYS,
    }
}

fn stencil_op(op: StencilOp) -> u32 {
    match op {
        StencilOp::Keep => glow::KEEP,
        StencilOp::Zero => glow::ZERO,
        StencilOp::Replace => glow::REPLACE,
        StencilOp::Incr => glow::INCR,
        StencilOp::IncrWrap => glow::INCR_WRAP,
        StencilOp::Decr => glow::DECR,
        StencilOp::DecrWrap => glow::DECR_WRAP,
        StencilOp::Invert => glow::INVERT,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn data_type(data_type: DataType) -> u32 {
    match data_type {
        DataType::Byte => glow::BYTE,
        DataType::UnsignedByte => glow::UNSIGNED_BYTE,
        DataType::Short => glow::SHORT,
        DataType::UnsignedShort => glow::UNSIGNED_SHORT,
        DataType::Int => glow::INT,
        DataType::UnsignedInt => glow::UNSIGNED_INT,
        DataType::Float => glow::FLOAT,
    }
}

fn index_type(index: IndexType) -> u32 {
    match index {
        IndexType::U16 => glow::UNSIGNED_SHORT,
        IndexType::U32 => glow::UNSIGNED_INT,
    }
}

fn draw_mode(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Points => glow::POINTS,
        DrawMode::Lines => glow::LINES,
        DrawMode::LineLoop => glow::LINE_LOOP,
        DrawMode::LineStrip => glow::LINE_STRIP,
        DrawMode::Triangles => glow::TRIANGLES,
        DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
        DrawMode::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2d => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

fn image_target(target: ImageTarget) -> u32 {
    match target {
        ImageTarget::Texture2d => glow::TEXTURE_2D,
        ImageTarget::CubeFace(face) => glow::TEXTURE_CUBE_MAP_POSITIVE_X + u32::from(face.min(5)),
    }
}

fn wrapping(wrap: Wrapping) -> i32 {
    (match wrap {
        Wrapping::Repeat => glow::REPEAT,
        Wrapping::ClampToEdge => glow::CLAMP_TO_EDGE,
        Wrapping::MirroredRepeat => glow::MIRRORED_REPEAT,
    }) as i32
}

fn filter(filter: Filter) -> i32 {
    (match filter {
        Filter::Nearest => glow::NEAREST,
        Filter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        Filter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        Filter::Linear => glow::LINEAR,
        Filter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        Filter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

fn texture_format(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::Alpha => glow::ALPHA,
        TextureFormat::Rgb => glow::RGB,
        TextureFormat::Rgba => glow::RGBA,
        TextureFormat::Luminance => glow::LUMINANCE,
        TextureFormat::LuminanceAlpha => glow::LUMINANCE_ALPHA,
    }
}

fn compressed_format(format: CompressedFormat) -> u32 {
    match format {
        CompressedFormat::RgbS3tcDxt1 => COMPRESSED_RGB_S3TC_DXT1_EXT,
        CompressedFormat::RgbaS3tcDxt1 => COMPRESSED_RGBA_S3TC_DXT1_EXT,
        CompressedFormat::RgbaS3tcDxt3 => COMPRESSED_RGBA_S3TC_DXT3_EXT,
        CompressedFormat::RgbaS3tcDxt5 => COMPRESSED_RGBA_S3TC_DXT5_EXT,
        CompressedFormat::RgbPvrtc4Bppv1 => COMPRESSED_RGB_PVRTC_4BPPV1_IMG,
        CompressedFormat::RgbPvrtc2Bppv1 => COMPRESSED_RGB_PVRTC_2BPPV1_IMG,
        CompressedFormat::RgbaPvrtc4Bppv1 => COMPRESSED_RGBA_PVRTC_4BPPV1_IMG,
        CompressedFormat::RgbaPvrtc2Bppv1 => COMPRESSED_RGBA_PVRTC_2BPPV1_IMG,
        CompressedFormat::RgbEtc1 => ETC1_RGB8_OES,
    }
}

fn attachment(attachment: FramebufferAttachment) -> u32 {
    match attachment {
        FramebufferAttachment::Color0 => glow::COLOR_ATTACHMENT0,
        FramebufferAttachment::Depth => glow::DEPTH_ATTACHMENT,
        FramebufferAttachment::Stencil => glow::STENCIL_ATTACHMENT,
        FramebufferAttachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
    }
}

fn parameter(parameter: GlParameter) -> u32 {
    match parameter {
        GlParameter::MaxTextureImageUnits => glow::MAX_TEXTURE_IMAGE_UNITS,
        GlParameter::MaxVertexTextureImageUnits => glow::MAX_VERTEX_TEXTURE_IMAGE_UNITS,
        GlParameter::MaxTextureSize => glow::MAX_TEXTURE_SIZE,
        GlParameter::MaxCubeMapTextureSize => glow::MAX_CUBE_MAP_TEXTURE_SIZE,
        GlParameter::MaxVertexAttribs => glow::MAX_VERTEX_ATTRIBS,
        GlParameter::MaxVertexUniformVectors => glow::MAX_VERTEX_UNIFORM_VECTORS,
        GlParameter::MaxVaryingVectors => glow::MAX_VARYING_VECTORS,
        GlParameter::MaxFragmentUniformVectors => glow::MAX_FRAGMENT_UNIFORM_VECTORS,
    }
}

fn uniform(location: UniformLocation) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(location.0)
}

macro_rules! native {
    ($ours:ident, $theirs:ident) => {
        impl From<$ours> for glow::$theirs {
            fn from(handle: $ours) -> Self {
                glow::$theirs(handle.0)
            }
        }

        impl From<glow::$theirs> for $ours {
            fn from(handle: glow::$theirs) -> Self {
                $ours(handle.0)
            }
        }
    };
}

native!(GlBuffer, NativeBuffer);
native!(GlShader, NativeShader);
native!(GlProgram, NativeProgram);
native!(GlTexture, NativeTexture);
native!(GlFramebuffer, NativeFramebuffer);
native!(GlRenderbuffer, NativeRenderbuffer);

impl GlContext for GlowContext {
    fn get_parameter_i32(&self, p: GlParameter) -> i32 {
        unsafe { self.gl.get_parameter_i32(parameter(p)) }
    }

    fn extensions(&self) -> Extensions {
        self.extensions
    }

    fn shader_precision(&self, stage: ShaderStage, precision: Precision) -> i32 {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        let precision_type = match precision {
            Precision::High => glow::HIGH_FLOAT,
            Precision::Medium => glow::MEDIUM_FLOAT,
            Precision::Low => glow::LOW_FLOAT,
        };
        unsafe { self.gl.get_shader_precision_format(shader_type, precision_type) }
            .map_or(0, |format| format.precision)
    }

    fn max_anisotropy(&self) -> f32 {
        if !self.extensions.contains(Extensions::TEXTURE_FILTER_ANISOTROPIC) {
            return 0.0;
        }
        unsafe { self.gl.get_parameter_f32(MAX_TEXTURE_MAX_ANISOTROPY_EXT) }
    }

    fn enable(&mut self, c: Capability) {
        unsafe { self.gl.enable(capability(c)) }
    }

    fn disable(&mut self, c: Capability) {
        unsafe { self.gl.disable(capability(c)) }
    }

    fn blend_equation(&mut self, equation: BlendEquation) {
        unsafe { self.gl.blend_equation(blend_equation(equation)) }
    }

    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation) {
        unsafe {
            self.gl
                .blend_equation_separate(blend_equation(color), blend_equation(alpha))
        }
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_factor(src), blend_factor(dst)) }
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        unsafe {
            self.gl.blend_func_separate(
                blend_factor(src_rgb),
                blend_factor(dst_rgb),
                blend_factor(src_alpha),
                blend_factor(dst_alpha),
            )
        }
    }

    fn depth_func(&mut self, func: CompareFunc) {
        unsafe { self.gl.depth_func(compare(func)) }
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) }
    }

    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        unsafe { self.gl.color_mask(red, green, blue, alpha) }
    }

    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        unsafe { self.gl.stencil_func(compare(func), reference, mask) }
    }

    fn stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        unsafe {
            self.gl
                .stencil_op(stencil_op(fail), stencil_op(depth_fail), stencil_op(pass))
        }
    }

    fn stencil_mask(&mut self, mask: u32) {
        unsafe { self.gl.stencil_mask(mask) }
    }

    fn front_face(&mut self, face: FrontFace) {
        let face = match face {
            FrontFace::Ccw => glow::CCW,
            FrontFace::Cw => glow::CW,
        };
        unsafe { self.gl.front_face(face) }
    }

    fn cull_face(&mut self, face: CullFace) {
        let face = match face {
            CullFace::Back => glow::BACK,
            CullFace::Front => glow::FRONT,
            CullFace::FrontAndBack => glow::FRONT_AND_BACK,
        };
        unsafe { self.gl.cull_face(face) }
    }

    fn line_width(&mut self, width: f32) {
        unsafe { self.gl.line_width(width) }
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        unsafe { self.gl.polygon_offset(factor, units) }
    }

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { self.gl.clear_color(red, green, blue, alpha) }
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) }
    }

    fn clear_stencil(&mut self, stencil: i32) {
        unsafe { self.gl.clear_stencil(stencil) }
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        if mask.contains(ClearMask::STENCIL) {
            bits |= glow::STENCIL_BUFFER_BIT;
        }
        unsafe { self.gl.clear(bits) }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor(x, y, width, height) }
    }

    fn create_buffer(&mut self) -> Result<GlBuffer, String> {
        unsafe { self.gl.create_buffer() }.map(GlBuffer::from)
    }

    fn delete_buffer(&mut self, buffer: GlBuffer) {
        unsafe { self.gl.delete_buffer(buffer.into()) }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GlBuffer>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer.map(Into::into)) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
        };
        unsafe { self.gl.buffer_data_u8_slice(buffer_target(target), data, usage) }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(buffer_target(target), offset as i32, data)
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: DataType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, data_type(ty), normalized, stride, offset)
        }
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(index, divisor) }
    }

    fn vertex_attrib(&mut self, index: u32, value: &[f32]) {
        unsafe {
            match *value {
                [x] => self.gl.vertex_attrib_1_f32(index, x),
                [x, y] => self.gl.vertex_attrib_2_f32(index, x, y),
                [x, y, z] => self.gl.vertex_attrib_3_f32(index, x, y, z),
                [x, y, z, w, ..] => self.gl.vertex_attrib_4_f32(index, x, y, z, w),
                [] => {}
            }
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<GlShader, String> {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(shader_type) }.map(GlShader::from)
    }

    fn shader_source(&mut self, shader: GlShader, source: &str) {
        unsafe { self.gl.shader_source(shader.into(), source) }
    }

    fn compile_shader(&mut self, shader: GlShader) {
        unsafe { self.gl.compile_shader(shader.into()) }
    }

    fn shader_compile_status(&self, shader: GlShader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader.into()) }
    }

    fn shader_info_log(&self, shader: GlShader) -> String {
        unsafe { self.gl.get_shader_info_log(shader.into()) }
    }

    fn delete_shader(&mut self, shader: GlShader) {
        unsafe { self.gl.delete_shader(shader.into()) }
    }

    fn create_program(&mut self) -> Result<GlProgram, String> {
        unsafe { self.gl.create_program() }.map(GlProgram::from)
    }

    fn attach_shader(&mut self, program: GlProgram, shader: GlShader) {
        unsafe { self.gl.attach_shader(program.into(), shader.into()) }
    }

    fn link_program(&mut self, program: GlProgram) {
        unsafe { self.gl.link_program(program.into()) }
    }

    fn program_link_status(&self, program: GlProgram) -> bool {
        unsafe { self.gl.get_program_link_status(program.into()) }
    }

    fn program_info_log(&self, program: GlProgram) -> String {
        unsafe { self.gl.get_program_info_log(program.into()) }
    }

    fn delete_program(&mut self, program: GlProgram) {
        unsafe { self.gl.delete_program(program.into()) }
    }

    fn use_program(&mut self, program: Option<GlProgram>) {
        unsafe { self.gl.use_program(program.map(Into::into)) }
    }

    fn get_attrib_location(&self, program: GlProgram, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program.into(), name) }
    }

    fn get_uniform_location(&self, program: GlProgram, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(program.into(), name) }
            .map(|location| UniformLocation(location.0))
    }

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&uniform(location)), value) }
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&uniform(location)), value) }
    }

    fn uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32) {
        unsafe { self.gl.uniform_2_f32(Some(&uniform(location)), x, y) }
    }

    fn uniform_3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32) {
        unsafe { self.gl.uniform_3_f32(Some(&uniform(location)), x, y, z) }
    }

    fn uniform_4f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        unsafe { self.gl.uniform_4_f32(Some(&uniform(location)), x, y, z, w) }
    }

    fn uniform_1iv(&mut self, location: UniformLocation, values: &[i32]) {
        unsafe { self.gl.uniform_1_i32_slice(Some(&uniform(location)), values) }
    }

    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_1_f32_slice(Some(&uniform(location)), values) }
    }

    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_2_f32_slice(Some(&uniform(location)), values) }
    }

    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_3_f32_slice(Some(&uniform(location)), values) }
    }

    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_4_f32_slice(Some(&uniform(location)), values) }
    }

    fn uniform_matrix_3fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(Some(&uniform(location)), false, values)
        }
    }

    fn uniform_matrix_4fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&uniform(location)), false, values)
        }
    }

    fn create_texture(&mut self) -> Result<GlTexture, String> {
        unsafe { self.gl.create_texture() }.map(GlTexture::from)
    }

    fn delete_texture(&mut self, texture: GlTexture) {
        unsafe { self.gl.delete_texture(texture.into()) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<GlTexture>) {
        unsafe {
            self.gl
                .bind_texture(texture_target(target), texture.map(Into::into))
        }
    }

    fn pixel_store(&mut self, store: PixelStore) {
        match store {
            PixelStore::UnpackAlignment(alignment) => unsafe {
                self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment)
            },
            // WebGL-only unpack flags; native GL uploads rows as given.
            PixelStore::UnpackFlipY(_) | PixelStore::UnpackPremultiplyAlpha(_) => {}
        }
    }

    fn tex_parameter(&mut self, target: TextureTarget, param: TextureParam) {
        let target = texture_target(target);
        unsafe {
            match param {
                TextureParam::WrapS(wrap) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrapping(wrap))
                }
                TextureParam::WrapT(wrap) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrapping(wrap))
                }
                TextureParam::MagFilter(f) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter(f))
                }
                TextureParam::MinFilter(f) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter(f))
                }
                TextureParam::MaxAnisotropy(value) => {
                    self.gl
                        .tex_parameter_f32(target, TEXTURE_MAX_ANISOTROPY_EXT, value)
                }
            }
        }
    }

    fn tex_image_2d(
        &mut self,
        target: ImageTarget,
        level: i32,
        format: TextureFormat,
        width: u32,
        height: u32,
        ty: DataType,
        pixels: Option<&[u8]>,
    ) {
        let format = texture_format(format);
        unsafe {
            self.gl.tex_image_2d(
                image_target(target),
                level,
                format as i32,
                width as i32,
                height as i32,
                0,
                format,
                data_type(ty),
                glow::PixelUnpackData::Slice(pixels),
            )
        }
    }

    fn compressed_tex_image_2d(
        &mut self,
        target: ImageTarget,
        level: i32,
        format: CompressedFormat,
        width: u32,
        height: u32,
        data: &[u8],
    ) {
        unsafe {
            self.gl.compressed_tex_image_2d(
                image_target(target),
                level,
                compressed_format(format) as i32,
                width as i32,
                height as i32,
                0,
                data.len() as i32,
                glow::CompressedPixelUnpackData::Slice(data),
            )
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        unsafe { self.gl.generate_mipmap(texture_target(target)) }
    }

    fn create_framebuffer(&mut self) -> Result<GlFramebuffer, String> {
        unsafe { self.gl.create_framebuffer() }.map(GlFramebuffer::from)
    }

    fn delete_framebuffer(&mut self, framebuffer: GlFramebuffer) {
        unsafe { self.gl.delete_framebuffer(framebuffer.into()) }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<GlFramebuffer>) {
        unsafe {
            self.gl
                .bind_framebuffer(glow::FRAMEBUFFER, framebuffer.map(Into::into))
        }
    }

    fn framebuffer_texture_2d(
        &mut self,
        slot: FramebufferAttachment,
        target: ImageTarget,
        texture: Option<GlTexture>,
        level: i32,
    ) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment(slot),
                image_target(target),
                texture.map(Into::into),
                level,
            )
        }
    }

    fn create_renderbuffer(&mut self) -> Result<GlRenderbuffer, String> {
        unsafe { self.gl.create_renderbuffer() }.map(GlRenderbuffer::from)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GlRenderbuffer) {
        unsafe { self.gl.delete_renderbuffer(renderbuffer.into()) }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<GlRenderbuffer>) {
        unsafe {
            self.gl
                .bind_renderbuffer(glow::RENDERBUFFER, renderbuffer.map(Into::into))
        }
    }

    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32) {
        let format = match format {
            RenderbufferFormat::DepthComponent16 => glow::DEPTH_COMPONENT16,
            RenderbufferFormat::StencilIndex8 => glow::STENCIL_INDEX8,
            RenderbufferFormat::DepthStencil => glow::DEPTH24_STENCIL8,
            RenderbufferFormat::Rgba4 => glow::RGBA4,
        };
        unsafe {
            self.gl
                .renderbuffer_storage(glow::RENDERBUFFER, format, width as i32, height as i32)
        }
    }

    fn framebuffer_renderbuffer(
        &mut self,
        slot: FramebufferAttachment,
        renderbuffer: Option<GlRenderbuffer>,
    ) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment(slot),
                glow::RENDERBUFFER,
                renderbuffer.map(Into::into),
            )
        }
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        match unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) } {
            glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
            glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
                FramebufferStatus::IncompleteMissingAttachment
            }
            glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
            _ => FramebufferStatus::IncompleteDimensions,
        }
    }

    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, pixels: &mut [u8]) {
        unsafe {
            self.gl.read_pixels(
                x,
                y,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(pixels)),
            )
        }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(draw_mode(mode), first, count) }
    }

    fn draw_elements(&mut self, mode: DrawMode, count: i32, index: IndexType, offset: usize) {
        unsafe {
            self.gl
                .draw_elements(draw_mode(mode), count, index_type(index), offset as i32)
        }
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: i32, count: i32, instances: i32) {
        unsafe {
            self.gl
                .draw_arrays_instanced(draw_mode(mode), first, count, instances)
        }
    }

    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: i32,
        index: IndexType,
        offset: usize,
        instances: i32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced(
                draw_mode(mode),
                count,
                index_type(index),
                offset as i32,
                instances,
            )
        }
    }
}

impl std::fmt::Debug for GlowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowContext")
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}


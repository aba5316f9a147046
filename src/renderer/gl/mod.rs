// renderer/gl/mod.rs
// Narrow GL ES 2 style driver boundary. Everything the renderer core sends to
// the GPU goes through `GlContext`.

pub mod recording;

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub mod glow_backend;

use std::num::NonZeroU32;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use recording::{CallLog, GlCall, GlLimits, RecordingContext};

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use glow_backend::GlowContext;

macro_rules! gl_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            pub fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gl_handle!(GlBuffer);
gl_handle!(GlShader);
gl_handle!(GlProgram);
gl_handle!(GlTexture);
gl_handle!(GlFramebuffer);
gl_handle!(GlRenderbuffer);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Blend,
    CullFace,
    DepthTest,
    Dither,
    PolygonOffsetFill,
    ScissorTest,
    StencilTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    DstColor,
    OneMinusDstColor,
    SrcAlphaSaturate,
}

/// Comparison used by both the depth and the stencil test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    #[default]
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Incr,
    IncrWrap,
    Decr,
    DecrWrap,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    Back,
    Front,
    FrontAndBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl DataType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            DataType::Byte | DataType::UnsignedByte => 1,
            DataType::Short | DataType::UnsignedShort => 2,
            DataType::Int | DataType::UnsignedInt | DataType::Float => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Low,
    Medium,
    #[default]
    High,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::High => "highp",
            Precision::Medium => "mediump",
            Precision::Low => "lowp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2d,
    CubeMap,
}

/// Destination of an image upload. Cube faces are +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Texture2d,
    CubeFace(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Wrapping {
    Repeat,
    #[default]
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    NearestMipmapNearest,
    NearestMipmapLinear,
    Linear,
    LinearMipmapNearest,
    LinearMipmapLinear,
}

impl Filter {
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Filter::Nearest | Filter::Linear)
    }

    /// Closest filter that does not sample mipmaps.
    pub fn without_mipmaps(self) -> Filter {
        match self {
            Filter::Nearest | Filter::NearestMipmapNearest | Filter::NearestMipmapLinear => {
                Filter::Nearest
            }
            _ => Filter::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureParam {
    WrapS(Wrapping),
    WrapT(Wrapping),
    MagFilter(Filter),
    MinFilter(Filter),
    MaxAnisotropy(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    Alpha,
    Rgb,
    #[default]
    Rgba,
    Luminance,
    LuminanceAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelStore {
    UnpackFlipY(bool),
    UnpackPremultiplyAlpha(bool),
    UnpackAlignment(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedFormat {
    RgbS3tcDxt1,
    RgbaS3tcDxt1,
    RgbaS3tcDxt3,
    RgbaS3tcDxt5,
    RgbPvrtc4Bppv1,
    RgbPvrtc2Bppv1,
    RgbaPvrtc4Bppv1,
    RgbaPvrtc2Bppv1,
    RgbEtc1,
}

impl CompressedFormat {
    pub fn required_extension(self) -> Extensions {
        match self {
            CompressedFormat::RgbS3tcDxt1
            | CompressedFormat::RgbaS3tcDxt1
            | CompressedFormat::RgbaS3tcDxt3
            | CompressedFormat::RgbaS3tcDxt5 => Extensions::COMPRESSED_TEXTURE_S3TC,
            CompressedFormat::RgbPvrtc4Bppv1
            | CompressedFormat::RgbPvrtc2Bppv1
            | CompressedFormat::RgbaPvrtc4Bppv1
            | CompressedFormat::RgbaPvrtc2Bppv1 => Extensions::COMPRESSED_TEXTURE_PVRTC,
            CompressedFormat::RgbEtc1 => Extensions::COMPRESSED_TEXTURE_ETC1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferAttachment {
    Color0,
    Depth,
    Stencil,
    DepthStencil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    DepthComponent16,
    StencilIndex8,
    DepthStencil,
    Rgba4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    IncompleteAttachment,
    IncompleteMissingAttachment,
    IncompleteDimensions,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlParameter {
    MaxTextureImageUnits,
    MaxVertexTextureImageUnits,
    MaxTextureSize,
    MaxCubeMapTextureSize,
    MaxVertexAttribs,
    MaxVertexUniformVectors,
    MaxVaryingVectors,
    MaxFragmentUniformVectors,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Extensions: u32 {
        const TEXTURE_FLOAT = 1 << 0;
        const TEXTURE_FLOAT_LINEAR = 1 << 1;
        const STANDARD_DERIVATIVES = 1 << 2;
        const TEXTURE_FILTER_ANISOTROPIC = 1 << 3;
        const COMPRESSED_TEXTURE_S3TC = 1 << 4;
        const COMPRESSED_TEXTURE_PVRTC = 1 << 5;
        const COMPRESSED_TEXTURE_ETC1 = 1 << 6;
        const ELEMENT_INDEX_UINT = 1 << 7;
        const INSTANCED_ARRAYS = 1 << 8;
        const FRAG_DEPTH = 1 << 9;
        const BLEND_MINMAX = 1 << 10;
    }
}

impl Extensions {
    /// Maps driver extension strings (with or without vendor prefixes) to flags.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut found = Extensions::empty();
        for name in names {
            let bare = name
                .trim_start_matches("GL_")
                .trim_start_matches("WEBKIT_")
                .trim_start_matches("MOZ_");
            let flag = match bare {
                "OES_texture_float" | "ARB_texture_float" => Extensions::TEXTURE_FLOAT,
                "OES_texture_float_linear" => Extensions::TEXTURE_FLOAT_LINEAR,
                "OES_standard_derivatives" => Extensions::STANDARD_DERIVATIVES,
                "EXT_texture_filter_anisotropic" | "ARB_texture_filter_anisotropic" => {
                    Extensions::TEXTURE_FILTER_ANISOTROPIC
                }
                "WEBGL_compressed_texture_s3tc" | "EXT_texture_compression_s3tc" => {
                    Extensions::COMPRESSED_TEXTURE_S3TC
                }
                "WEBGL_compressed_texture_pvrtc" | "IMG_texture_compression_pvrtc" => {
                    Extensions::COMPRESSED_TEXTURE_PVRTC
                }
                "WEBGL_compressed_texture_etc1" | "OES_compressed_ETC1_RGB8_texture" => {
                    Extensions::COMPRESSED_TEXTURE_ETC1
                }
                "OES_element_index_uint" => Extensions::ELEMENT_INDEX_UINT,
                "ANGLE_instanced_arrays" | "ARB_instanced_arrays" | "EXT_instanced_arrays" => {
                    Extensions::INSTANCED_ARRAYS
                }
                "EXT_frag_depth" | "ARB_fragment_shader" => Extensions::FRAG_DEPTH,
                "EXT_blend_minmax" => Extensions::BLEND_MINMAX,
                _ => Extensions::empty(),
            };
            found |= flag;
        }
        found
    }
}

/// The GPU driver as seen by the renderer core.
///
/// Mirrors the GL ES 2 entry points plus the instancing and anisotropy
/// extensions. Object creation is fallible, state calls are not.
pub trait GlContext {
    // queries
    fn get_parameter_i32(&self, parameter: GlParameter) -> i32;
    fn extensions(&self) -> Extensions;
    /// Bits of float precision for the stage, 0 when unsupported.
    fn shader_precision(&self, stage: ShaderStage, precision: Precision) -> i32;
    fn max_anisotropy(&self) -> f32;

    // fixed-function state
    fn enable(&mut self, capability: Capability);
    fn disable(&mut self, capability: Capability);
    fn blend_equation(&mut self, equation: BlendEquation);
    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );
    fn depth_func(&mut self, func: CompareFunc);
    fn depth_mask(&mut self, write: bool);
    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool);
    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32);
    fn stencil_op(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp);
    fn stencil_mask(&mut self, mask: u32);
    fn front_face(&mut self, face: FrontFace);
    fn cull_face(&mut self, face: CullFace);
    fn line_width(&mut self, width: f32);
    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear_depth(&mut self, depth: f32);
    fn clear_stencil(&mut self, stencil: i32);
    fn clear(&mut self, mask: ClearMask);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);

    // buffers and vertex attributes
    fn create_buffer(&mut self) -> Result<GlBuffer, String>;
    fn delete_buffer(&mut self, buffer: GlBuffer);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GlBuffer>);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]);
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32);
    /// Constant attribute value, 1 to 4 components.
    fn vertex_attrib(&mut self, index: u32, value: &[f32]);

    // shaders and programs
    fn create_shader(&mut self, stage: ShaderStage) -> Result<GlShader, String>;
    fn shader_source(&mut self, shader: GlShader, source: &str);
    fn compile_shader(&mut self, shader: GlShader);
    fn shader_compile_status(&self, shader: GlShader) -> bool;
    fn shader_info_log(&self, shader: GlShader) -> String;
    fn delete_shader(&mut self, shader: GlShader);
    fn create_program(&mut self) -> Result<GlProgram, String>;
    fn attach_shader(&mut self, program: GlProgram, shader: GlShader);
    fn link_program(&mut self, program: GlProgram);
    fn program_link_status(&self, program: GlProgram) -> bool;
    fn program_info_log(&self, program: GlProgram) -> String;
    fn delete_program(&mut self, program: GlProgram);
    fn use_program(&mut self, program: Option<GlProgram>);
    fn get_attrib_location(&self, program: GlProgram, name: &str) -> Option<u32>;
    fn get_uniform_location(&self, program: GlProgram, name: &str) -> Option<UniformLocation>;

    // uniforms
    fn uniform_1i(&mut self, location: UniformLocation, value: i32);
    fn uniform_1f(&mut self, location: UniformLocation, value: f32);
    fn uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32);
    fn uniform_3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32);
    fn uniform_4f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32);
    fn uniform_1iv(&mut self, location: UniformLocation, values: &[i32]);
    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_matrix_3fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_matrix_4fv(&mut self, location: UniformLocation, values: &[f32]);

    // textures
    fn create_texture(&mut self) -> Result<GlTexture, String>;
    fn delete_texture(&mut self, texture: GlTexture);
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<GlTexture>);
    fn pixel_store(&mut self, store: PixelStore);
    fn tex_parameter(&mut self, target: TextureTarget, param: TextureParam);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &mut self,
        target: ImageTarget,
        level: i32,
        format: TextureFormat,
        width: u32,
        height: u32,
        data_type: DataType,
        pixels: Option<&[u8]>,
    );
    fn compressed_tex_image_2d(
        &mut self,
        target: ImageTarget,
        level: i32,
        format: CompressedFormat,
        width: u32,
        height: u32,
        data: &[u8],
    );
    fn generate_mipmap(&mut self, target: TextureTarget);

    // framebuffers
    fn create_framebuffer(&mut self) -> Result<GlFramebuffer, String>;
    fn delete_framebuffer(&mut self, framebuffer: GlFramebuffer);
    fn bind_framebuffer(&mut self, framebuffer: Option<GlFramebuffer>);
    fn framebuffer_texture_2d(
        &mut self,
        attachment: FramebufferAttachment,
        target: ImageTarget,
        texture: Option<GlTexture>,
        level: i32,
    );
    fn create_renderbuffer(&mut self) -> Result<GlRenderbuffer, String>;
    fn delete_renderbuffer(&mut self, renderbuffer: GlRenderbuffer);
    fn bind_renderbuffer(&mut self, renderbuffer: Option<GlRenderbuffer>);
    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32);
    fn framebuffer_renderbuffer(
        &mut self,
        attachment: FramebufferAttachment,
        renderbuffer: Option<GlRenderbuffer>,
    );
    fn check_framebuffer_status(&self) -> FramebufferStatus;
    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, pixels: &mut [u8]);

    // draws
    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32);
    fn draw_elements(&mut self, mode: DrawMode, count: i32, index_type: IndexType, offset: usize);
    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: i32, count: i32, instances: i32);
    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instances: i32,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_names_map_to_flags() {
        let ext = Extensions::from_names([
            "GL_OES_element_index_uint",
            "WEBKIT_EXT_texture_filter_anisotropic",
            "ANGLE_instanced_arrays",
            "GL_SOMETHING_unknown",
        ]);
        assert!(ext.contains(Extensions::ELEMENT_INDEX_UINT));
        assert!(ext.contains(Extensions::TEXTURE_FILTER_ANISOTROPIC));
        assert!(ext.contains(Extensions::INSTANCED_ARRAYS));
        assert!(!ext.contains(Extensions::TEXTURE_FLOAT));
    }

    #[test]
    fn mipmap_filters_fall_back_to_plain_filters() {
        assert_eq!(Filter::LinearMipmapLinear.without_mipmaps(), Filter::Linear);
        assert_eq!(Filter::NearestMipmapLinear.without_mipmaps(), Filter::Nearest);
        assert!(!Filter::Linear.uses_mipmaps());
        assert!(Filter::LinearMipmapNearest.uses_mipmaps());
    }
}

// renderer/capabilities.rs
// What the driver can do, queried once when the renderer is created.

use crate::renderer::gl::{
    CompressedFormat, Extensions, GlContext, GlParameter, Precision, ShaderStage,
};

#[derive(Debug, Clone)]
pub struct Capabilities {
    pub precision: Precision,
    pub max_textures: u32,
    pub max_vertex_textures: u32,
    pub max_texture_size: u32,
    pub max_cubemap_size: u32,
    pub max_attributes: u32,
    pub max_vertex_uniforms: u32,
    pub max_varyings: u32,
    pub max_fragment_uniforms: u32,
    pub max_anisotropy: f32,
    pub extensions: Extensions,
}

impl Capabilities {
    /// Queries the context and settles on the best precision not above
    /// `requested` that both shader stages support.
    pub fn detect(gl: &dyn GlContext, requested: Precision) -> Self {
        let max_precision = Self::max_precision(gl);
        let precision = if requested > max_precision {
            log::warn!(
                "Requested shader precision {} is not supported, using {}",
                requested.as_str(),
                max_precision.as_str()
            );
            max_precision
        } else {
            requested
        };

        let param = |p: GlParameter| gl.get_parameter_i32(p).max(0) as u32;
        let caps = Self {
            precision,
            max_textures: param(GlParameter::MaxTextureImageUnits),
            max_vertex_textures: param(GlParameter::MaxVertexTextureImageUnits),
            max_texture_size: param(GlParameter::MaxTextureSize),
            max_cubemap_size: param(GlParameter::MaxCubeMapTextureSize),
            max_attributes: param(GlParameter::MaxVertexAttribs),
            max_vertex_uniforms: param(GlParameter::MaxVertexUniformVectors),
            max_varyings: param(GlParameter::MaxVaryingVectors),
            max_fragment_uniforms: param(GlParameter::MaxFragmentUniformVectors),
            max_anisotropy: gl.max_anisotropy(),
            extensions: gl.extensions(),
        };

        log::info!(
            "GL capabilities: precision={} textures={} vertex_textures={} attributes={} extensions={:?}",
            caps.precision.as_str(),
            caps.max_textures,
            caps.max_vertex_textures,
            caps.max_attributes,
            caps.extensions
        );

        caps
    }

    fn max_precision(gl: &dyn GlContext) -> Precision {
        let supported = |p: Precision| {
            gl.shader_precision(ShaderStage::Vertex, p) > 0
                && gl.shader_precision(ShaderStage::Fragment, p) > 0
        };
        if supported(Precision::High) {
            Precision::High
        } else if supported(Precision::Medium) {
            Precision::Medium
        } else {
            Precision::Low
        }
    }

    pub fn vertex_textures(&self) -> bool {
        self.max_vertex_textures > 0
    }

    pub fn float_fragment_textures(&self) -> bool {
        self.extensions.contains(Extensions::TEXTURE_FLOAT)
    }

    pub fn float_vertex_textures(&self) -> bool {
        self.vertex_textures() && self.float_fragment_textures()
    }

    pub fn standard_derivatives(&self) -> bool {
        self.extensions.contains(Extensions::STANDARD_DERIVATIVES)
    }

    pub fn anisotropic_filtering(&self) -> bool {
        self.extensions
            .contains(Extensions::TEXTURE_FILTER_ANISOTROPIC)
            && self.max_anisotropy > 0.0
    }

    pub fn element_index_uint(&self) -> bool {
        self.extensions.contains(Extensions::ELEMENT_INDEX_UINT)
    }

    pub fn instanced_arrays(&self) -> bool {
        self.extensions.contains(Extensions::INSTANCED_ARRAYS)
    }

    pub fn logarithmic_depth_buffer(&self) -> bool {
        self.extensions.contains(Extensions::FRAG_DEPTH)
    }

    pub fn supports_compressed(&self, format: CompressedFormat) -> bool {
        self.extensions.contains(format.required_extension())
    }

    /// Largest vertex count a single indexed draw group may address.
    pub fn max_vertices_per_group(&self) -> u64 {
        if self.element_index_uint() {
            u32::MAX as u64
        } else {
            u16::MAX as u64
        }
    }
}

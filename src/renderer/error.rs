// renderer/error.rs

use thiserror::Error;

use crate::renderer::gl::{FramebufferStatus, ShaderStage};

/// Failures inside the renderer core. `Renderer::render` never returns
/// these; they are logged and the affected item is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("{} shader failed to compile: {log}", .stage.label())]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    ProgramLink { log: String },

    #[error("GPU resource creation failed: {0}")]
    ResourceCreation(String),

    #[error("unsupported texture format: {0}")]
    UnsupportedTextureFormat(String),

    #[error("required capability missing: {0}")]
    CapabilityMissing(&'static str),

    #[error("framebuffer incomplete: {0:?}")]
    IncompleteFramebuffer(FramebufferStatus),

    #[error("stale or unknown {0} handle")]
    InvalidHandle(&'static str),

    #[error("material is unavailable until it changes")]
    MaterialUnavailable,
}

impl RenderError {
    /// Whether the resource stays broken until the application changes it.
    pub fn is_resource_fatal(&self) -> bool {
        matches!(
            self,
            RenderError::ShaderCompile { .. }
                | RenderError::ProgramLink { .. }
                | RenderError::UnsupportedTextureFormat(_)
                | RenderError::MaterialUnavailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_stage_and_log() {
        let err = RenderError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:12 syntax error".into(),
        };
        assert_eq!(
            err.to_string(),
            "fragment shader failed to compile: 0:12 syntax error"
        );
        assert!(err.is_resource_fatal());
        assert!(!RenderError::CapabilityMissing("instanced arrays").is_resource_fatal());
    }
}

// renderer/render_target.rs
// Offscreen colour targets with optional depth/stencil renderbuffers.

use crate::asset::{Assets, Handle};
use crate::renderer::capabilities::Capabilities;
use crate::renderer::error::RenderError;
use crate::renderer::gl::{
    DataType, Filter, FramebufferAttachment, FramebufferStatus, GlContext, ImageTarget,
    RenderbufferFormat, TextureFormat, TextureTarget, Wrapping,
};
use crate::renderer::properties::{Properties, RenderTargetProperties};
use crate::renderer::state::StateTracker;
use crate::renderer::textures::{apply_sampler_params, SamplerParams};

#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub format: TextureFormat,
    pub data_type: DataType,
    pub depth_buffer: bool,
    pub stencil_buffer: bool,
    pub generate_mipmaps: bool,
    pub anisotropy: f32,
    pub is_cube: bool,
    /// Cube face rendered into next, 0..6.
    pub active_cube_face: u8,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            wrap_s: Wrapping::ClampToEdge,
            wrap_t: Wrapping::ClampToEdge,
            mag_filter: Filter::Linear,
            min_filter: Filter::LinearMipmapLinear,
            format: TextureFormat::Rgba,
            data_type: DataType::UnsignedByte,
            depth_buffer: true,
            stencil_buffer: true,
            generate_mipmaps: true,
            anisotropy: 1.0,
            is_cube: false,
            active_cube_face: 0,
        }
    }

    pub fn cube(size: u32) -> Self {
        Self {
            is_cube: true,
            ..Self::new(size, size)
        }
    }

    /// Nearest-filtered target with a depth buffer, as used for shadow maps.
    pub fn depth_map(size: u32) -> Self {
        Self {
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            stencil_buffer: false,
            generate_mipmaps: false,
            ..Self::new(size, size)
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    fn uses_mipmaps(&self) -> bool {
        self.generate_mipmaps && self.is_power_of_two() && self.min_filter.uses_mipmaps()
    }

    fn texture_target(&self) -> TextureTarget {
        if self.is_cube {
            TextureTarget::CubeMap
        } else {
            TextureTarget::Texture2d
        }
    }
}

/// Creates the GL objects for a target. Does nothing when they already
/// exist at the current size; a resize releases the old ones first.
pub fn ensure_allocated(
    gl: &mut dyn GlContext,
    state: &mut StateTracker,
    caps: &Capabilities,
    properties: &mut Properties,
    assets: &Assets,
    handle: Handle<RenderTarget>,
) -> Result<(), RenderError> {
    let target = assets
        .render_targets
        .get(handle)
        .ok_or(RenderError::InvalidHandle("render target"))?;

    if let Some(entry) = properties.render_target(handle) {
        if entry.width == target.width && entry.height == target.height && entry.is_cube == target.is_cube {
            return Ok(());
        }
        log::debug!(
            "Render target {} resized to {}x{}",
            handle.id(),
            target.width,
            target.height
        );
        properties.dispose_render_target(gl, state, handle);
    }

    if target.data_type == DataType::Float && !caps.float_fragment_textures() {
        log::error!("Render target {} needs float textures, which are unavailable", handle.id());
        return Err(RenderError::UnsupportedTextureFormat(
            "float render target without OES_texture_float".to_string(),
        ));
    }

    let texture_target = target.texture_target();
    let texture = gl
        .create_texture()
        .map_err(|err| RenderError::ResourceCreation(format!("render target texture: {}", err)))?;
    state.bind_texture(gl, 0, texture_target, Some(texture));

    let mut anisotropy = None;
    apply_sampler_params(
        gl,
        caps,
        texture_target,
        SamplerParams {
            wrap_s: target.wrap_s,
            wrap_t: target.wrap_t,
            mag_filter: target.mag_filter,
            min_filter: target.min_filter,
            anisotropy: target.anisotropy,
        },
        target.is_power_of_two(),
        &mut anisotropy,
    );

    let faces: Vec<ImageTarget> = if target.is_cube {
        (0..6).map(ImageTarget::CubeFace).collect()
    } else {
        vec![ImageTarget::Texture2d]
    };

    let mut entry = RenderTargetProperties {
        texture,
        framebuffers: Vec::with_capacity(faces.len()),
        renderbuffers: Vec::new(),
        width: target.width,
        height: target.height,
        is_cube: target.is_cube,
    };

    for face in faces {
        gl.tex_image_2d(
            face,
            0,
            target.format,
            target.width,
            target.height,
            target.data_type,
            None,
        );

        let framebuffer = gl
            .create_framebuffer()
            .map_err(|err| RenderError::ResourceCreation(format!("framebuffer: {}", err)))?;
        state.bind_framebuffer(gl, Some(framebuffer));
        gl.framebuffer_texture_2d(FramebufferAttachment::Color0, face, Some(texture), 0);
        entry.framebuffers.push(framebuffer);

        let storage = match (target.depth_buffer, target.stencil_buffer) {
            (true, false) => Some((RenderbufferFormat::DepthComponent16, FramebufferAttachment::Depth)),
            (true, true) => Some((RenderbufferFormat::DepthStencil, FramebufferAttachment::DepthStencil)),
            (false, true) => Some((RenderbufferFormat::StencilIndex8, FramebufferAttachment::Stencil)),
            (false, false) => None,
        };
        if let Some((format, attachment)) = storage {
            let renderbuffer = gl
                .create_renderbuffer()
                .map_err(|err| RenderError::ResourceCreation(format!("renderbuffer: {}", err)))?;
            gl.bind_renderbuffer(Some(renderbuffer));
            gl.renderbuffer_storage(format, target.width, target.height);
            gl.framebuffer_renderbuffer(attachment, Some(renderbuffer));
            entry.renderbuffers.push(renderbuffer);
        }
    }

    if target.uses_mipmaps() {
        gl.generate_mipmap(texture_target);
    }

    state.bind_texture(gl, 0, texture_target, None);
    gl.bind_renderbuffer(None);
    state.bind_framebuffer(gl, None);

    log::debug!(
        "Allocated render target {} ({}x{}, {} framebuffers)",
        handle.id(),
        target.width,
        target.height,
        entry.framebuffers.len()
    );
    properties.insert_render_target(handle, entry);
    Ok(())
}

/// Regenerates mipmaps after rendering into a mipmapped target.
pub fn update_mipmap(
    gl: &mut dyn GlContext,
    state: &mut StateTracker,
    properties: &Properties,
    assets: &Assets,
    handle: Handle<RenderTarget>,
) {
    let (Some(target), Some(entry)) = (assets.render_targets.get(handle), properties.render_target(handle)) else {
        return;
    };
    if !target.uses_mipmaps() {
        return;
    }
    let texture_target = entry.target();
    state.bind_texture(gl, 0, texture_target, Some(entry.texture));
    gl.generate_mipmap(texture_target);
    state.bind_texture(gl, 0, texture_target, None);
}

/// Reads RGBA bytes from the target's framebuffer into `pixels`.
#[allow(clippy::too_many_arguments)]
pub fn read_pixels(
    gl: &mut dyn GlContext,
    state: &mut StateTracker,
    properties: &Properties,
    handle: Handle<RenderTarget>,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    pixels: &mut [u8],
) -> Result<(), RenderError> {
    let entry = properties
        .render_target(handle)
        .ok_or(RenderError::InvalidHandle("render target"))?;
    let framebuffer = entry
        .framebuffer(0)
        .ok_or(RenderError::InvalidHandle("render target"))?;

    state.bind_framebuffer(gl, Some(framebuffer));
    let status = gl.check_framebuffer_status();
    if status != FramebufferStatus::Complete {
        log::error!("Cannot read render target {}: framebuffer is {:?}", handle.id(), status);
        return Err(RenderError::IncompleteFramebuffer(status));
    }
    gl.read_pixels(x, y, width, height, pixels);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gl::{GlCall, Precision, RecordingContext};

    fn setup(gl: &RecordingContext) -> (StateTracker, Capabilities, Properties, Assets) {
        let caps = Capabilities::detect(gl, Precision::High);
        (
            StateTracker::new(caps.max_attributes, true),
            caps,
            Properties::new(),
            Assets::new(),
        )
    }

    #[test]
    fn allocation_is_idempotent_and_follows_size() {
        let mut gl = RecordingContext::new();
        let log = gl.log();
        let (mut state, caps, mut properties, mut assets) = setup(&gl);
        let handle = assets.render_targets.insert(RenderTarget::new(256, 256));

        ensure_allocated(&mut gl, &mut state, &caps, &mut properties, &assets, handle).unwrap();
        ensure_allocated(&mut gl, &mut state, &caps, &mut properties, &assets, handle).unwrap();
        assert_eq!(log.borrow().count(|c| matches!(c, GlCall::CreateFramebuffer(_))), 1);
        assert_eq!(log.borrow().count(|c| matches!(c, GlCall::GenerateMipmap(_))), 1);

        assets.render_targets.get_mut(handle).unwrap().set_size(128, 64);
        ensure_allocated(&mut gl, &mut state, &caps, &mut properties, &assets, handle).unwrap();
        let log = log.borrow();
        assert_eq!(log.count(|c| matches!(c, GlCall::DeleteFramebuffer(_))), 1);
        assert_eq!(log.count(|c| matches!(c, GlCall::CreateFramebuffer(_))), 2);
        assert_eq!(properties.render_target(handle).unwrap().width, 128);
    }

    #[test]
    fn cube_targets_get_six_framebuffers() {
        let mut gl = RecordingContext::new();
        let (mut state, caps, mut properties, mut assets) = setup(&gl);
        let handle = assets.render_targets.insert(RenderTarget::cube(64));
        ensure_allocated(&mut gl, &mut state, &caps, &mut properties, &assets, handle).unwrap();

        let entry = properties.render_target(handle).unwrap();
        assert_eq!(entry.framebuffers.len(), 6);
        assert_eq!(entry.renderbuffers.len(), 6);
        assert_eq!(entry.framebuffer(3), Some(entry.framebuffers[3]));
    }

    #[test]
    fn incomplete_framebuffer_refuses_read_back() {
        let mut gl = RecordingContext::new()
            .with_framebuffer_status(FramebufferStatus::IncompleteAttachment);
        let (mut state, caps, mut properties, mut assets) = setup(&gl);
        let handle = assets.render_targets.insert(RenderTarget::new(4, 4));
        ensure_allocated(&mut gl, &mut state, &caps, &mut properties, &assets, handle).unwrap();

        let mut pixels = vec![0u8; 64];
        let err = read_pixels(&mut gl, &mut state, &properties, handle, 0, 0, 4, 4, &mut pixels)
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::IncompleteFramebuffer(FramebufferStatus::IncompleteAttachment)
        );
    }
}

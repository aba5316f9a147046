// renderer/textures.rs
// GPU upload and binding of textures. A texture is uploaded the first time
// it is bound and again whenever its version moves.

use crate::asset::{Assets, Handle};
use crate::renderer::capabilities::Capabilities;
use crate::renderer::error::RenderError;
use crate::renderer::gl::{
    DataType, Filter, GlContext, GlTexture, ImageTarget, PixelStore, TextureParam, TextureTarget,
    Wrapping,
};
use crate::renderer::properties::{Properties, TextureProperties};
use crate::renderer::state::StateTracker;
use crate::renderer::texture::{Texture, TextureSource};

/// Sampling parameters shared by textures and render targets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SamplerParams {
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub anisotropy: f32,
}

/// Applies wrap and filter state for the bound texture. Non-power-of-two
/// images only support clamping and non-mipmapped filters.
pub(crate) fn apply_sampler_params(
    gl: &mut dyn GlContext,
    caps: &Capabilities,
    target: TextureTarget,
    params: SamplerParams,
    power_of_two: bool,
    applied_anisotropy: &mut Option<f32>,
) {
    if power_of_two {
        gl.tex_parameter(target, TextureParam::WrapS(params.wrap_s));
        gl.tex_parameter(target, TextureParam::WrapT(params.wrap_t));
        gl.tex_parameter(target, TextureParam::MagFilter(params.mag_filter));
        gl.tex_parameter(target, TextureParam::MinFilter(params.min_filter));
    } else {
        gl.tex_parameter(target, TextureParam::WrapS(Wrapping::ClampToEdge));
        gl.tex_parameter(target, TextureParam::WrapT(Wrapping::ClampToEdge));
        if params.wrap_s != Wrapping::ClampToEdge || params.wrap_t != Wrapping::ClampToEdge {
            log::warn!("Texture is not power of two; wrapping is forced to ClampToEdge");
        }

        gl.tex_parameter(target, TextureParam::MagFilter(params.mag_filter.without_mipmaps()));
        gl.tex_parameter(target, TextureParam::MinFilter(params.min_filter.without_mipmaps()));
        if params.min_filter.uses_mipmaps() {
            log::warn!("Texture is not power of two; minFilter is forced to a non-mipmap filter");
        }
    }

    if caps.anisotropic_filtering() && params.anisotropy > 1.0 {
        let anisotropy = params.anisotropy.min(caps.max_anisotropy);
        if *applied_anisotropy != Some(anisotropy) {
            gl.tex_parameter(target, TextureParam::MaxAnisotropy(anisotropy));
            *applied_anisotropy = Some(anisotropy);
        }
    }
}

fn check_supported(texture: &Texture, caps: &Capabilities) -> Result<(), RenderError> {
    match &texture.source {
        TextureSource::Compressed { format, .. } if !caps.supports_compressed(*format) => Err(
            RenderError::UnsupportedTextureFormat(format!("compressed {:?}", format)),
        ),
        TextureSource::Data { data, .. }
            if data.data_type() == DataType::Float && !caps.float_fragment_textures() =>
        {
            Err(RenderError::UnsupportedTextureFormat(
                "float texels without OES_texture_float".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// Binds `handle` to `unit`, uploading it first if its GPU copy is stale.
/// A texture whose current version failed is bound as nothing.
pub fn set_texture(
    gl: &mut dyn GlContext,
    state: &mut StateTracker,
    caps: &Capabilities,
    properties: &mut Properties,
    assets: &Assets,
    handle: Handle<Texture>,
    unit: u32,
) -> Result<(), RenderError> {
    let texture = assets
        .textures
        .get(handle)
        .ok_or(RenderError::InvalidHandle("texture"))?;
    let target = texture.target();
    let version = texture.version();

    if let Some(entry) = properties.texture(handle) {
        if entry.failed_version == Some(version) {
            state.bind_texture(gl, unit, target, None);
            return Ok(());
        }
        let current = entry.version == Some(version) || texture.source == TextureSource::Empty;
        if current {
            state.bind_texture(gl, unit, target, Some(entry.texture));
            return Ok(());
        }
    }

    if let Err(err) = check_supported(texture, caps) {
        log::error!("Texture {} skipped: {}", handle.id(), err);
        texture_object(gl, properties, handle, target)?;
        if let Some(entry) = properties.texture_mut(handle) {
            entry.failed_version = Some(version);
        }
        state.bind_texture(gl, unit, target, None);
        return Err(err);
    }

    let gl_texture = texture_object(gl, properties, handle, target)?;
    state.bind_texture(gl, unit, target, Some(gl_texture));

    let Some(entry) = properties.texture_mut(handle) else {
        return Err(RenderError::InvalidHandle("texture"));
    };
    upload(gl, caps, texture, entry);
    entry.version = Some(version);
    entry.failed_version = None;
    Ok(())
}

fn texture_object(
    gl: &mut dyn GlContext,
    properties: &mut Properties,
    handle: Handle<Texture>,
    target: TextureTarget,
) -> Result<GlTexture, RenderError> {
    if let Some(entry) = properties.texture(handle) {
        return Ok(entry.texture);
    }
    let texture = gl
        .create_texture()
        .map_err(|err| RenderError::ResourceCreation(format!("texture: {}", err)))?;
    properties.insert_texture(
        handle,
        TextureProperties {
            texture,
            target,
            version: None,
            failed_version: None,
            anisotropy: None,
        },
    );
    Ok(texture)
}

fn upload(gl: &mut dyn GlContext, caps: &Capabilities, texture: &Texture, entry: &mut TextureProperties) {
    let target = texture.target();
    gl.pixel_store(PixelStore::UnpackFlipY(texture.flip_y));
    gl.pixel_store(PixelStore::UnpackPremultiplyAlpha(texture.premultiply_alpha));
    gl.pixel_store(PixelStore::UnpackAlignment(texture.unpack_alignment));

    let power_of_two = texture.is_power_of_two();
    apply_sampler_params(
        gl,
        caps,
        target,
        SamplerParams {
            wrap_s: texture.wrap_s,
            wrap_t: texture.wrap_t,
            mag_filter: texture.mag_filter,
            min_filter: texture.min_filter,
            anisotropy: texture.anisotropy,
        },
        power_of_two,
        &mut entry.anisotropy,
    );

    let mut can_generate = true;
    match &texture.source {
        TextureSource::Empty => return,
        TextureSource::Image(image) => {
            gl.tex_image_2d(
                ImageTarget::Texture2d,
                0,
                texture.format,
                image.width,
                image.height,
                DataType::UnsignedByte,
                Some(&image.pixels),
            );
        }
        TextureSource::Cube(faces) => {
            for (face, image) in faces.iter().enumerate() {
                gl.tex_image_2d(
                    ImageTarget::CubeFace(face as u8),
                    0,
                    texture.format,
                    image.width,
                    image.height,
                    DataType::UnsignedByte,
                    Some(&image.pixels),
                );
            }
        }
        TextureSource::Data {
            width,
            height,
            data,
        } => {
            gl.tex_image_2d(
                ImageTarget::Texture2d,
                0,
                texture.format,
                *width,
                *height,
                data.data_type(),
                Some(data.as_bytes()),
            );
        }
        TextureSource::Compressed { format, mipmaps } => {
            for (level, mip) in mipmaps.iter().enumerate() {
                gl.compressed_tex_image_2d(
                    ImageTarget::Texture2d,
                    level as i32,
                    *format,
                    mip.width,
                    mip.height,
                    &mip.data,
                );
            }
            can_generate = false;
        }
    }

    if can_generate && texture.generate_mipmaps && power_of_two && texture.min_filter.uses_mipmaps() {
        gl.generate_mipmap(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gl::{CompressedFormat, GlCall, Precision, RecordingContext};
    use crate::renderer::texture::{CompressedMip, Image2d};

    struct Fixture {
        gl: RecordingContext,
        state: StateTracker,
        caps: Capabilities,
        properties: Properties,
        assets: Assets,
    }

    fn fixture() -> Fixture {
        let gl = RecordingContext::new();
        let caps = Capabilities::detect(&gl, Precision::High);
        Fixture {
            state: StateTracker::new(caps.max_attributes, caps.instanced_arrays()),
            gl,
            caps,
            properties: Properties::new(),
            assets: Assets::new(),
        }
    }

    impl Fixture {
        fn bind(&mut self, handle: Handle<Texture>) -> Result<(), RenderError> {
            set_texture(
                &mut self.gl,
                &mut self.state,
                &self.caps,
                &mut self.properties,
                &self.assets,
                handle,
                0,
            )
        }
    }

    #[test]
    fn uploads_once_per_version() {
        let mut fx = fixture();
        let log = fx.gl.log();
        let handle = fx
            .assets
            .textures
            .insert(Texture::from_image(Image2d::solid(4, 4, [255; 4])));

        fx.bind(handle).unwrap();
        fx.bind(handle).unwrap();
        let uploads = |log: &std::cell::RefCell<crate::renderer::gl::CallLog>| {
            log.borrow().count(|c| matches!(c, GlCall::TexImage2d { .. }))
        };
        assert_eq!(uploads(&log), 1);
        assert_eq!(log.borrow().count(|c| matches!(c, GlCall::GenerateMipmap(_))), 1);

        fx.assets.textures.get_mut(handle).unwrap().needs_update();
        fx.bind(handle).unwrap();
        assert_eq!(uploads(&log), 2);
        assert_eq!(log.borrow().count(|c| matches!(c, GlCall::CreateTexture(_))), 1);
    }

    #[test]
    fn npot_images_clamp_and_skip_mipmaps() {
        let mut fx = fixture();
        let log = fx.gl.log();
        let mut texture = Texture::from_image(Image2d::solid(3, 5, [0; 4]));
        texture.wrap_s = Wrapping::Repeat;
        let handle = fx.assets.textures.insert(texture);

        fx.bind(handle).unwrap();
        let log = log.borrow();
        assert!(log.calls().contains(&GlCall::TexParameter(
            TextureTarget::Texture2d,
            TextureParam::WrapS(Wrapping::ClampToEdge)
        )));
        assert!(log.calls().contains(&GlCall::TexParameter(
            TextureTarget::Texture2d,
            TextureParam::MinFilter(Filter::Linear)
        )));
        assert_eq!(log.count(|c| matches!(c, GlCall::GenerateMipmap(_))), 0);
    }

    #[test]
    fn anisotropy_is_clamped_and_applied_once() {
        let mut fx = fixture();
        let log = fx.gl.log();
        let mut texture = Texture::from_image(Image2d::solid(4, 4, [0; 4]));
        texture.anisotropy = 64.0;
        let handle = fx.assets.textures.insert(texture);

        fx.bind(handle).unwrap();
        fx.assets.textures.get_mut(handle).unwrap().needs_update();
        fx.bind(handle).unwrap();
        let applied = log
            .borrow()
            .count(|c| matches!(c, GlCall::TexParameter(_, TextureParam::MaxAnisotropy(a)) if *a == 16.0));
        assert_eq!(applied, 1);
    }

    #[test]
    fn unsupported_compressed_format_fails_until_changed() {
        let mut fx = fixture();
        let log = fx.gl.log();
        let handle = fx.assets.textures.insert(Texture::compressed(
            CompressedFormat::RgbEtc1,
            vec![CompressedMip {
                width: 4,
                height: 4,
                data: vec![0; 8],
            }],
        ));

        let err = fx.bind(handle).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedTextureFormat(_)));
        assert!(fx.bind(handle).is_ok());
        assert_eq!(
            log.borrow()
                .count(|c| matches!(c, GlCall::CompressedTexImage2d { .. })),
            0
        );
        assert_eq!(
            fx.properties.texture(handle).unwrap().failed_version,
            Some(0)
        );
    }

    #[test]
    fn cube_maps_upload_six_faces() {
        let mut fx = fixture();
        let log = fx.gl.log();
        let face = Image2d::solid(2, 2, [0; 4]);
        let faces = [
            face.clone(),
            face.clone(),
            face.clone(),
            face.clone(),
            face.clone(),
            face,
        ];
        let handle = fx.assets.textures.insert(Texture::cube(faces));
        fx.bind(handle).unwrap();
        assert_eq!(
            log.borrow().count(|c| matches!(
                c,
                GlCall::TexImage2d {
                    target: ImageTarget::CubeFace(_),
                    ..
                }
            )),
            6
        );
    }
}

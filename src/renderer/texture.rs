// renderer/texture.rs
// Logical textures. Pixel data is supplied already decoded; the GPU copy
// lives in the properties table and follows `version`.

use glam::{Mat4, Vec2};

use crate::renderer::gl::{CompressedFormat, DataType, Filter, TextureFormat, TextureTarget, Wrapping};

#[derive(Debug, Clone, PartialEq)]
pub struct Image2d {
    pub width: u32,
    pub height: u32,
    /// Tightly packed texels in the texture's `format`, 8 bits per channel.
    pub pixels: Vec<u8>,
}

impl Image2d {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Single colour RGBA image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMip {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TexelData {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

impl TexelData {
    pub fn data_type(&self) -> DataType {
        match self {
            TexelData::U8(_) => DataType::UnsignedByte,
            TexelData::F32(_) => DataType::Float,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TexelData::U8(bytes) => bytes,
            TexelData::F32(floats) => bytemuck::cast_slice(floats),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Nothing to upload yet. Binding such a texture leaves it empty.
    Empty,
    Image(Image2d),
    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    Cube(Box<[Image2d; 6]>),
    Compressed {
        format: CompressedFormat,
        mipmaps: Vec<CompressedMip>,
    },
    Data {
        width: u32,
        height: u32,
        data: TexelData,
    },
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub source: TextureSource,
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub format: TextureFormat,
    pub anisotropy: f32,
    pub flip_y: bool,
    pub premultiply_alpha: bool,
    pub generate_mipmaps: bool,
    pub unpack_alignment: i32,
    pub offset: Vec2,
    pub repeat: Vec2,
    version: u64,
}

impl Texture {
    pub fn new(source: TextureSource) -> Self {
        let is_data = matches!(source, TextureSource::Data { .. });
        Self {
            source,
            wrap_s: Wrapping::ClampToEdge,
            wrap_t: Wrapping::ClampToEdge,
            mag_filter: if is_data { Filter::Nearest } else { Filter::Linear },
            min_filter: if is_data {
                Filter::Nearest
            } else {
                Filter::LinearMipmapLinear
            },
            format: TextureFormat::Rgba,
            anisotropy: 1.0,
            flip_y: !is_data,
            premultiply_alpha: false,
            generate_mipmaps: !is_data,
            unpack_alignment: 4,
            offset: Vec2::ZERO,
            repeat: Vec2::ONE,
            version: 0,
        }
    }

    pub fn from_image(image: Image2d) -> Self {
        Self::new(TextureSource::Image(image))
    }

    pub fn cube(faces: [Image2d; 6]) -> Self {
        let mut texture = Self::new(TextureSource::Cube(Box::new(faces)));
        texture.flip_y = false;
        texture
    }

    pub fn compressed(format: CompressedFormat, mipmaps: Vec<CompressedMip>) -> Self {
        let mut texture = Self::new(TextureSource::Compressed { format, mipmaps });
        texture.flip_y = false;
        texture.generate_mipmaps = false;
        texture
    }

    pub fn data(width: u32, height: u32, data: TexelData, format: TextureFormat) -> Self {
        let mut texture = Self::new(TextureSource::Data {
            width,
            height,
            data,
        });
        texture.format = format;
        texture
    }

    /// RGBA float texture holding 4x4 matrices, one per 4 texels, sized to
    /// the next power of two square that fits `count`.
    pub fn bone_matrices(count: usize) -> Self {
        let size = bone_texture_size(count);
        let data = TexelData::F32(vec![0.0; (size * size * 4) as usize]);
        Self::data(size, size, data, TextureFormat::Rgba)
    }

    /// Writes bone matrices into a float data texture and marks it dirty.
    pub fn write_bone_matrices(&mut self, bones: &[Mat4]) {
        if let TextureSource::Data {
            data: TexelData::F32(texels),
            ..
        } = &mut self.source
        {
            let floats: &[f32] = bytemuck::cast_slice(bones);
            let len = floats.len().min(texels.len());
            texels[..len].copy_from_slice(&floats[..len]);
            self.needs_update();
        }
    }

    pub fn target(&self) -> TextureTarget {
        match self.source {
            TextureSource::Cube(_) => TextureTarget::CubeMap,
            _ => TextureTarget::Texture2d,
        }
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        match &self.source {
            TextureSource::Empty => None,
            TextureSource::Image(image) => Some((image.width, image.height)),
            TextureSource::Cube(faces) => Some((faces[0].width, faces[0].height)),
            TextureSource::Compressed { mipmaps, .. } => {
                mipmaps.first().map(|mip| (mip.width, mip.height))
            }
            TextureSource::Data { width, height, .. } => Some((*width, *height)),
        }
    }

    pub fn is_power_of_two(&self) -> bool {
        self.size()
            .map_or(true, |(w, h)| w.is_power_of_two() && h.is_power_of_two())
    }

    pub fn needs_update(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Side of the square float texture used for `count` bone matrices.
pub fn bone_texture_size(count: usize) -> u32 {
    // four RGBA texels per matrix
    let texels = (count.max(1) * 4) as f64;
    let side = texels.sqrt().ceil() as u32;
    side.next_power_of_two().max(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_textures_default_to_nearest_without_mipmaps() {
        let texture = Texture::data(2, 2, TexelData::U8(vec![0; 16]), TextureFormat::Rgba);
        assert_eq!(texture.min_filter, Filter::Nearest);
        assert!(!texture.generate_mipmaps);
        assert!(!texture.flip_y);
    }

    #[test]
    fn bone_texture_fits_all_matrices() {
        assert_eq!(bone_texture_size(1), 4);
        assert_eq!(bone_texture_size(4), 4);
        assert_eq!(bone_texture_size(5), 8);
        assert_eq!(bone_texture_size(64), 16);

        let mut texture = Texture::bone_matrices(2);
        let before = texture.version();
        texture.write_bone_matrices(&[Mat4::IDENTITY, Mat4::from_scale(glam::Vec3::splat(2.0))]);
        assert_ne!(texture.version(), before);
        match &texture.source {
            TextureSource::Data {
                data: TexelData::F32(texels),
                ..
            } => {
                assert_eq!(texels[0], 1.0);
                assert_eq!(texels[16], 2.0);
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn npot_detection() {
        assert!(Texture::from_image(Image2d::solid(4, 8, [0; 4])).is_power_of_two());
        assert!(!Texture::from_image(Image2d::solid(3, 8, [0; 4])).is_power_of_two());
    }
}

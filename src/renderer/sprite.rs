// renderer/sprite.rs
// Post-render pass for camera-facing sprites. One shared quad is drawn per
// sprite, far to near, with per-sprite colour, map and blending.

use std::collections::HashMap;

use glam::Mat4;

use crate::renderer::collector::SpriteItem;
use crate::renderer::draw::DrawCall;
use crate::renderer::error::RenderError;
use crate::renderer::gl::{
    BufferTarget, BufferUsage, Capability, DataType, DrawMode, Filter, GlBuffer, GlContext,
    GlProgram, GlTexture, ImageTarget, IndexType, TextureFormat, TextureParam, TextureTarget,
    UniformLocation,
};
use crate::renderer::plugin::{Plugin, PluginContext, PluginType};
use crate::renderer::programs;
use crate::scene::Fog;

const VERTEX_SHADER: &str = "\
uniform mat4 modelViewMatrix;
uniform mat4 projectionMatrix;
uniform float rotation;
uniform vec2 scale;
uniform vec2 uvOffset;
uniform vec2 uvScale;
attribute vec2 position;
attribute vec2 uv;
varying vec2 vUV;
void main() {
    vUV = uvOffset + uv * uvScale;
    vec2 alignedPosition = position * scale;
    vec2 rotatedPosition;
    rotatedPosition.x = cos( rotation ) * alignedPosition.x - sin( rotation ) * alignedPosition.y;
    rotatedPosition.y = sin( rotation ) * alignedPosition.x + cos( rotation ) * alignedPosition.y;
    vec4 finalPosition = modelViewMatrix * vec4( 0.0, 0.0, 0.0, 1.0 );
    finalPosition.xy += rotatedPosition;
    gl_Position = projectionMatrix * finalPosition;
}
";

const FRAGMENT_SHADER: &str = "\
precision mediump float;
uniform vec3 color;
uniform sampler2D map;
uniform float opacity;
uniform int fogType;
uniform vec3 fogColor;
uniform float fogDensity;
uniform float fogNear;
uniform float fogFar;
uniform float alphaTest;
varying vec2 vUV;
void main() {
    vec4 texel = texture2D( map, vUV );
    if ( texel.a < alphaTest ) discard;
    gl_FragColor = vec4( color * texel.xyz, texel.a * opacity );
    if ( fogType > 0 ) {
        float depth = gl_FragCoord.z / gl_FragCoord.w;
        float fogFactor = 0.0;
        if ( fogType == 1 ) {
            fogFactor = smoothstep( fogNear, fogFar, depth );
        } else {
            const float LOG2 = 1.442695;
            fogFactor = exp2( - fogDensity * fogDensity * depth * depth * LOG2 );
            fogFactor = 1.0 - clamp( fogFactor, 0.0, 1.0 );
        }
        gl_FragColor = mix( gl_FragColor, vec4( fogColor, gl_FragColor.w ), fogFactor );
    }
}
";

const UNIFORMS: [&str; 15] = [
    "modelViewMatrix",
    "projectionMatrix",
    "rotation",
    "scale",
    "uvOffset",
    "uvScale",
    "color",
    "map",
    "opacity",
    "fogType",
    "fogColor",
    "fogDensity",
    "fogNear",
    "fogFar",
    "alphaTest",
];

/// xy position then uv for each corner of a unit quad.
const QUAD_VERTICES: [f32; 16] = [
    -0.5, -0.5, 0.0, 0.0, //
    0.5, -0.5, 1.0, 0.0, //
    0.5, 0.5, 1.0, 1.0, //
    -0.5, 0.5, 0.0, 1.0,
];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

struct SpriteResources {
    program: GlProgram,
    vertex_buffer: GlBuffer,
    index_buffer: GlBuffer,
    /// 1x1 white texel for sprites without a map.
    white: GlTexture,
    position: u32,
    uv: u32,
    uniforms: HashMap<&'static str, UniformLocation>,
}

impl SpriteResources {
    fn create(gl: &mut dyn GlContext) -> Result<Self, RenderError> {
        let program = programs::link(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let (Some(position), Some(uv)) = (
            gl.get_attrib_location(program, "position"),
            gl.get_attrib_location(program, "uv"),
        ) else {
            gl.delete_program(program);
            return Err(RenderError::ResourceCreation(
                "sprite program lacks its attributes".to_string(),
            ));
        };
        let uniforms = UNIFORMS
            .iter()
            .filter_map(|&name| gl.get_uniform_location(program, name).map(|loc| (name, loc)))
            .collect();

        let vertex_buffer = new_buffer(gl)?;
        gl.bind_buffer(BufferTarget::Array, Some(vertex_buffer));
        gl.buffer_data(
            BufferTarget::Array,
            bytemuck::cast_slice(&QUAD_VERTICES),
            BufferUsage::StaticDraw,
        );
        let index_buffer = new_buffer(gl)?;
        gl.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
        gl.buffer_data(
            BufferTarget::ElementArray,
            bytemuck::cast_slice(&QUAD_INDICES),
            BufferUsage::StaticDraw,
        );

        let white = gl
            .create_texture()
            .map_err(|err| RenderError::ResourceCreation(format!("sprite texture: {}", err)))?;
        gl.bind_texture(TextureTarget::Texture2d, Some(white));
        gl.tex_parameter(TextureTarget::Texture2d, TextureParam::MinFilter(Filter::Nearest));
        gl.tex_parameter(TextureTarget::Texture2d, TextureParam::MagFilter(Filter::Nearest));
        gl.tex_image_2d(
            ImageTarget::Texture2d,
            0,
            TextureFormat::Rgba,
            1,
            1,
            DataType::UnsignedByte,
            Some(&[255, 255, 255, 255]),
        );

        log::debug!("Created sprite resources");
        Ok(Self {
            program,
            vertex_buffer,
            index_buffer,
            white,
            position,
            uv,
            uniforms,
        })
    }
}

fn new_buffer(gl: &mut dyn GlContext) -> Result<GlBuffer, RenderError> {
    gl.create_buffer()
        .map_err(|err| RenderError::ResourceCreation(format!("sprite buffer: {}", err)))
}

/// Draws every `Sprite` entity after the main pass. Not installed by
/// default; add it with `Renderer::add_plugin`.
#[derive(Default)]
pub struct SpritePlugin {
    resources: Option<SpriteResources>,
    failed: bool,
}

impl SpritePlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Far to near, ties in scene order.
fn draw_order(sprites: &[SpriteItem]) -> Vec<&SpriteItem> {
    let mut ordered: Vec<&SpriteItem> = sprites.iter().collect();
    ordered.sort_by(|a, b| b.z.total_cmp(&a.z).then(a.id.cmp(&b.id)));
    ordered
}

fn fog_type(fog: Option<&Fog>) -> i32 {
    match fog {
        None => 0,
        Some(Fog::Linear { .. }) => 1,
        Some(Fog::Exp2 { .. }) => 2,
    }
}

impl Plugin for SpritePlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::PostRender
    }

    fn render(&mut self, ctx: &mut PluginContext<'_>) {
        let sprites: Vec<SpriteItem> = draw_order(&ctx.lists().sprites)
            .into_iter()
            .cloned()
            .collect();
        if sprites.is_empty() || self.failed {
            return;
        }

        if self.resources.is_none() {
            match SpriteResources::create(ctx.gl()) {
                Ok(resources) => self.resources = Some(resources),
                Err(err) => {
                    log::error!("Sprites disabled: {}", err);
                    self.failed = true;
                    return;
                }
            }
        }
        let Some(res) = self.resources.as_ref() else {
            return;
        };
        let uniform = |name: &str| res.uniforms.get(name).copied();

        let view = ctx.camera_view();
        let fog = ctx.scene().fog;
        let scene_fog_type = fog_type(fog.as_ref());

        {
            let (gl, state) = ctx.gl_and_state();
            state.use_program(gl, res.program);
            state.init_attributes();
            state.enable_attribute(gl, res.position);
            state.enable_attribute(gl, res.uv);
            state.disable_unused_attributes(gl);
            state.set_capability(gl, Capability::CullFace, false);

            let stride = 4 * DataType::Float.size_in_bytes() as i32;
            let float_size = DataType::Float.size_in_bytes() as i32;
            gl.bind_buffer(BufferTarget::Array, Some(res.vertex_buffer));
            gl.vertex_attrib_pointer(res.position, 2, DataType::Float, false, stride, 0);
            gl.vertex_attrib_pointer(res.uv, 2, DataType::Float, false, stride, 2 * float_size);
            gl.bind_buffer(BufferTarget::ElementArray, Some(res.index_buffer));

            if let Some(location) = uniform("projectionMatrix") {
                gl.uniform_matrix_4fv(location, &view.projection.to_cols_array());
            }
            if let Some(location) = uniform("map") {
                gl.uniform_1i(location, 0);
            }
            if let Some(fog) = fog {
                let color = fog.color();
                if let Some(location) = uniform("fogColor") {
                    gl.uniform_3f(location, color.x, color.y, color.z);
                }
                match fog {
                    Fog::Linear { near, far, .. } => {
                        if let Some(location) = uniform("fogNear") {
                            gl.uniform_1f(location, near);
                        }
                        if let Some(location) = uniform("fogFar") {
                            gl.uniform_1f(location, far);
                        }
                    }
                    Fog::Exp2 { density, .. } => {
                        if let Some(location) = uniform("fogDensity") {
                            gl.uniform_1f(location, density);
                        }
                    }
                }
            }
        }

        let mut current_fog_type = None;
        for item in &sprites {
            let sprite = &item.sprite;
            let model_view: Mat4 = view.view * item.world;
            let (scale, _, _) = item.world.to_scale_rotation_translation();
            let item_fog_type = if sprite.fog { scene_fog_type } else { 0 };

            let map = sprite
                .map
                .and_then(|handle| ctx.assets().textures.get(handle).map(|texture| (handle, texture)));
            let (uv_offset, uv_scale) = map.map_or(
                (glam::Vec2::ZERO, glam::Vec2::ONE),
                |(_, texture)| (texture.offset, texture.repeat),
            );
            let map = map.map(|(handle, _)| handle);

            {
                let (gl, state) = ctx.gl_and_state();
                if current_fog_type != Some(item_fog_type) {
                    if let Some(location) = uniform("fogType") {
                        gl.uniform_1i(location, item_fog_type);
                    }
                    current_fog_type = Some(item_fog_type);
                }
                if let Some(location) = uniform("alphaTest") {
                    gl.uniform_1f(location, sprite.alpha_test);
                }
                if let Some(location) = uniform("modelViewMatrix") {
                    gl.uniform_matrix_4fv(location, &model_view.to_cols_array());
                }
                if let Some(location) = uniform("uvOffset") {
                    gl.uniform_2f(location, uv_offset.x, uv_offset.y);
                }
                if let Some(location) = uniform("uvScale") {
                    gl.uniform_2f(location, uv_scale.x, uv_scale.y);
                }
                if let Some(location) = uniform("opacity") {
                    gl.uniform_1f(location, sprite.opacity);
                }
                if let Some(location) = uniform("color") {
                    gl.uniform_3f(location, sprite.color.x, sprite.color.y, sprite.color.z);
                }
                if let Some(location) = uniform("rotation") {
                    gl.uniform_1f(location, sprite.rotation);
                }
                if let Some(location) = uniform("scale") {
                    gl.uniform_2f(location, scale.x, scale.y);
                }

                state.set_blending(gl, sprite.blending);
                state.set_depth_test(gl, sprite.depth_test);
                state.set_depth_write(gl, sprite.depth_write);
                if map.is_none() {
                    state.bind_texture(gl, 0, TextureTarget::Texture2d, Some(res.white));
                }
            }

            if let Some(handle) = map {
                if let Err(err) = ctx.set_texture(handle, 0) {
                    log::debug!("Sprite {:?} drawn without its map: {}", item.entity, err);
                }
            }

            ctx.draw(DrawCall {
                mode: DrawMode::Triangles,
                index: Some(IndexType::U16),
                start: 0,
                count: QUAD_INDICES.len(),
                instance_count: 1,
            });
        }

        let (gl, state) = ctx.gl_and_state();
        state.set_capability(gl, Capability::CullFace, true);
        log::trace!("Drew {} sprites", sprites.len());
    }

    fn dispose(&mut self, gl: &mut dyn GlContext) {
        if let Some(resources) = self.resources.take() {
            gl.delete_program(resources.program);
            gl.delete_buffer(resources.vertex_buffer);
            gl.delete_buffer(resources.index_buffer);
            gl.delete_texture(resources.white);
        }
        self.failed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Sprite;
    use glam::Vec3;

    fn item(id: u64, z: f32) -> SpriteItem {
        let mut world = hecs::World::new();
        SpriteItem {
            entity: world.spawn((Sprite::default(),)),
            id,
            sprite: Sprite::default(),
            world: Mat4::from_translation(Vec3::new(0.0, 0.0, -z)),
            z,
        }
    }

    #[test]
    fn sprites_draw_far_to_near() {
        let sprites = vec![item(0, 2.0), item(1, 9.0), item(2, 5.0), item(3, 9.0)];
        let ids: Vec<u64> = draw_order(&sprites).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3, 2, 0]);
    }

    #[test]
    fn fog_type_follows_scene_fog() {
        assert_eq!(fog_type(None), 0);
        let linear = Fog::Linear {
            color: Vec3::ONE,
            near: 1.0,
            far: 2.0,
        };
        assert_eq!(fog_type(Some(&linear)), 1);
        let exp2 = Fog::Exp2 {
            color: Vec3::ONE,
            density: 0.1,
        };
        assert_eq!(fog_type(Some(&exp2)), 2);
    }
}

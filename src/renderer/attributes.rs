// renderer/attributes.rs
// Buffer upload and vertex attribute binding. Uploading runs for every draw
// and only compares versions; binding runs when the geometry, program or
// wireframe mode changes between draws.

use std::collections::HashMap;
use std::ops::Range;

use crate::renderer::capabilities::Capabilities;
use crate::renderer::error::RenderError;
use crate::renderer::geometry::{wireframe_edges, AttributeData, BufferGeometry, GeometryAttribute};
use crate::renderer::gl::{BufferTarget, BufferUsage, DataType, GlBuffer, GlContext, IndexType};
use crate::renderer::material::Material;
use crate::renderer::program::Program;
use crate::renderer::properties::{AttributeSlot, BufferEntry, GeometryProperties};
use crate::renderer::state::StateTracker;

/// One buffer upload request.
pub struct BufferUpload<'a> {
    pub data: &'a [u8],
    pub target: BufferTarget,
    pub usage: BufferUsage,
    pub version: u64,
    /// Byte range to refresh when only the version changed.
    pub update_range: Option<Range<usize>>,
    pub index_type: Option<IndexType>,
}

/// Returns the GL buffer for `slot`, creating it on first use, updating it
/// in place when the version moved and reallocating when the size changed.
pub fn ensure_buffer(
    gl: &mut dyn GlContext,
    buffers: &mut HashMap<AttributeSlot, BufferEntry>,
    slot: AttributeSlot,
    upload: BufferUpload<'_>,
) -> Result<GlBuffer, RenderError> {
    if let Some(entry) = buffers.get_mut(&slot) {
        if entry.version == upload.version && entry.byte_length == upload.data.len() {
            return Ok(entry.buffer);
        }

        gl.bind_buffer(upload.target, Some(entry.buffer));
        if entry.byte_length != upload.data.len() {
            gl.buffer_data(upload.target, upload.data, upload.usage);
        } else {
            let range = upload
                .update_range
                .filter(|r| r.start < r.end && r.end <= upload.data.len())
                .unwrap_or(0..upload.data.len());
            gl.buffer_sub_data(upload.target, range.start, &upload.data[range]);
        }
        entry.version = upload.version;
        entry.byte_length = upload.data.len();
        entry.index_type = upload.index_type;
        return Ok(entry.buffer);
    }

    let buffer = gl
        .create_buffer()
        .map_err(|err| RenderError::ResourceCreation(format!("buffer: {}", err)))?;
    gl.bind_buffer(upload.target, Some(buffer));
    gl.buffer_data(upload.target, upload.data, upload.usage);
    buffers.insert(
        slot,
        BufferEntry {
            buffer,
            version: upload.version,
            byte_length: upload.data.len(),
            index_type: upload.index_type,
        },
    );
    Ok(buffer)
}

fn usage(dynamic: bool) -> BufferUsage {
    if dynamic {
        BufferUsage::DynamicDraw
    } else {
        BufferUsage::StaticDraw
    }
}

fn byte_range(range: &Option<Range<usize>>, element_size: usize) -> Option<Range<usize>> {
    range
        .as_ref()
        .map(|r| r.start * element_size..r.end * element_size)
}

/// Index values as the GPU will read them. u32 data that fits is narrowed
/// to u16; data that needs 32 bits requires the uint extension.
fn index_bytes(values: &[u32], caps: &Capabilities) -> Option<(Vec<u8>, IndexType)> {
    if values.iter().all(|&v| v <= u16::MAX as u32) {
        let narrowed: Vec<u16> = values.iter().map(|&v| v as u16).collect();
        return Some((bytemuck::cast_slice(&narrowed).to_vec(), IndexType::U16));
    }
    if caps.element_index_uint() {
        Some((bytemuck::cast_slice(values).to_vec(), IndexType::U32))
    } else {
        None
    }
}

/// Brings every GL buffer of `geometry` up to date. Wireframe draws also get
/// the generated edge index.
pub fn upload_geometry(
    gl: &mut dyn GlContext,
    caps: &Capabilities,
    geometry: &BufferGeometry,
    props: &mut GeometryProperties,
    wireframe: bool,
) -> Result<(), RenderError> {
    for (name, attribute) in geometry.attributes() {
        let GeometryAttribute::Buffer(attribute) = attribute else {
            continue;
        };
        let element_size = attribute.data.data_type().size_in_bytes();
        ensure_buffer(
            gl,
            &mut props.buffers,
            AttributeSlot::Named(name.to_string()),
            BufferUpload {
                data: attribute.data.as_bytes(),
                target: BufferTarget::Array,
                usage: usage(attribute.dynamic),
                version: attribute.version(),
                update_range: byte_range(&attribute.update_range, element_size),
                index_type: None,
            },
        )?;
    }

    for (i, buffer) in geometry.interleaved.iter().enumerate() {
        ensure_buffer(
            gl,
            &mut props.buffers,
            AttributeSlot::Interleaved(i),
            BufferUpload {
                data: bytemuck::cast_slice(&buffer.data),
                target: BufferTarget::Array,
                usage: usage(buffer.dynamic),
                version: buffer.version(),
                update_range: byte_range(&buffer.update_range, 4),
                index_type: None,
            },
        )?;
    }

    if let Some(index) = geometry.index() {
        upload_index(gl, caps, index, props)?;
    }

    if wireframe {
        upload_wireframe(gl, caps, geometry, props)?;
    }

    Ok(())
}

fn upload_index(
    gl: &mut dyn GlContext,
    caps: &Capabilities,
    index: &crate::renderer::geometry::BufferAttribute,
    props: &mut GeometryProperties,
) -> Result<(), RenderError> {
    let version = index.version();
    let unchanged = props
        .buffers
        .get(&AttributeSlot::Index)
        .map_or(false, |entry| entry.version == version);
    if unchanged {
        return Ok(());
    }
    if props.index_failed_version == Some(version) {
        return Err(RenderError::CapabilityMissing("OES_element_index_uint"));
    }

    let (bytes, index_type) = match &index.data {
        AttributeData::U16(values) => (bytemuck::cast_slice(values).to_vec(), IndexType::U16),
        AttributeData::U8(values) => {
            let widened: Vec<u16> = values.iter().map(|&v| v as u16).collect();
            (bytemuck::cast_slice(&widened).to_vec(), IndexType::U16)
        }
        AttributeData::U32(values) => match index_bytes(values, caps) {
            Some(narrowed) => narrowed,
            None => {
                log::error!(
                    "Geometry index needs 32-bit elements but OES_element_index_uint is unavailable; skipping it"
                );
                props.index_failed_version = Some(version);
                return Err(RenderError::CapabilityMissing("OES_element_index_uint"));
            }
        },
        AttributeData::F32(_) => {
            return Err(RenderError::ResourceCreation(
                "index buffers cannot hold floats".to_string(),
            ))
        }
    };
    props.index_failed_version = None;

    let range = byte_range(&index.update_range, index_type.size_in_bytes());
    ensure_buffer(
        gl,
        &mut props.buffers,
        AttributeSlot::Index,
        BufferUpload {
            data: &bytes,
            target: BufferTarget::ElementArray,
            usage: usage(index.dynamic),
            version,
            update_range: range,
            index_type: Some(index_type),
        },
    )?;
    Ok(())
}

fn upload_wireframe(
    gl: &mut dyn GlContext,
    caps: &Capabilities,
    geometry: &BufferGeometry,
    props: &mut GeometryProperties,
) -> Result<(), RenderError> {
    let source = (geometry.index().map(|i| i.version()), geometry.vertex_count());
    if let Some((_, index_version, vertex_count)) = props.wireframe {
        if (index_version, vertex_count) == source {
            return Ok(());
        }
    }

    let edges = wireframe_edges(geometry);
    let Some((bytes, index_type)) = index_bytes(&edges, caps) else {
        log::error!("Wireframe index needs 32-bit elements but OES_element_index_uint is unavailable");
        return Err(RenderError::CapabilityMissing("OES_element_index_uint"));
    };

    // a fresh version per rebuild so the entry is rewritten
    let version = props
        .buffers
        .get(&AttributeSlot::Wireframe)
        .map_or(0, |entry| entry.version.wrapping_add(1));
    ensure_buffer(
        gl,
        &mut props.buffers,
        AttributeSlot::Wireframe,
        BufferUpload {
            data: &bytes,
            target: BufferTarget::ElementArray,
            usage: BufferUsage::StaticDraw,
            version,
            update_range: None,
            index_type: Some(index_type),
        },
    )?;
    props.wireframe = Some((edges.len(), source.0, source.1));
    Ok(())
}

/// Points every attribute the program reads at its buffer, falls back to
/// the material's constant values for missing ones and binds the index.
/// Returns the instance count implied by instanced attributes.
#[allow(clippy::too_many_arguments)]
pub fn bind_attributes(
    gl: &mut dyn GlContext,
    state: &mut StateTracker,
    caps: &Capabilities,
    program: &Program,
    geometry: &BufferGeometry,
    props: &GeometryProperties,
    material: &Material,
    wireframe: bool,
) -> Result<Option<u32>, RenderError> {
    state.init_attributes();
    let mut instance_count = None;

    for (name, location) in program.attributes() {
        let location = *location;
        match geometry.attribute(name) {
            Some(GeometryAttribute::Buffer(attribute)) => {
                let entry = props
                    .buffer(&AttributeSlot::Named(name.clone()))
                    .ok_or(RenderError::InvalidHandle("attribute buffer"))?;
                gl.bind_buffer(BufferTarget::Array, Some(entry.buffer));
                enable(gl, state, caps, location, attribute.divisor)?;
                if attribute.divisor > 0 {
                    instance_count = Some(attribute.divisor * attribute.count() as u32);
                }
                gl.vertex_attrib_pointer(
                    location,
                    attribute.item_size as i32,
                    attribute.data.data_type(),
                    attribute.normalized,
                    0,
                    0,
                );
            }
            Some(GeometryAttribute::Interleaved(attribute)) => {
                let buffer = geometry
                    .interleaved
                    .get(attribute.buffer)
                    .ok_or(RenderError::InvalidHandle("interleaved buffer"))?;
                let entry = props
                    .buffer(&AttributeSlot::Interleaved(attribute.buffer))
                    .ok_or(RenderError::InvalidHandle("interleaved buffer"))?;
                gl.bind_buffer(BufferTarget::Array, Some(entry.buffer));
                enable(gl, state, caps, location, buffer.divisor)?;
                if buffer.divisor > 0 {
                    instance_count = Some(buffer.divisor * buffer.count() as u32);
                }
                let float_size = DataType::Float.size_in_bytes() as i32;
                gl.vertex_attrib_pointer(
                    location,
                    attribute.item_size as i32,
                    DataType::Float,
                    attribute.normalized,
                    buffer.stride as i32 * float_size,
                    attribute.offset as i32 * float_size,
                );
            }
            None => set_default_attribute(gl, material, name, location),
        }
    }

    state.disable_unused_attributes(gl);

    let index_slot = if wireframe {
        Some(AttributeSlot::Wireframe)
    } else if geometry.index().is_some() {
        Some(AttributeSlot::Index)
    } else {
        None
    };
    if let Some(slot) = index_slot {
        if let Some(entry) = props.buffer(&slot) {
            gl.bind_buffer(BufferTarget::ElementArray, Some(entry.buffer));
        }
    }

    Ok(instance_count)
}

/// Re-sends the material's constant values for the attributes `geometry`
/// lacks. Used when only the material changed since the last bind.
pub fn bind_default_attributes(
    gl: &mut dyn GlContext,
    program: &Program,
    geometry: &BufferGeometry,
    material: &Material,
) {
    for (name, location) in program.attributes() {
        if geometry.attribute(name).is_none() {
            set_default_attribute(gl, material, name, *location);
        }
    }
}

fn set_default_attribute(gl: &mut dyn GlContext, material: &Material, name: &str, location: u32) {
    if let Some(values) = material.default_attribute_values.get(name) {
        if (1..=4).contains(&values.len()) {
            gl.vertex_attrib(location, values);
        }
    }
}

fn enable(
    gl: &mut dyn GlContext,
    state: &mut StateTracker,
    caps: &Capabilities,
    location: u32,
    divisor: u32,
) -> Result<(), RenderError> {
    if divisor == 0 {
        state.enable_attribute(gl, location);
        return Ok(());
    }
    if !caps.instanced_arrays() {
        log::error!("Instanced attribute needs ANGLE_instanced_arrays, which is unavailable");
        return Err(RenderError::CapabilityMissing("ANGLE_instanced_arrays"));
    }
    state.enable_attribute_and_divisor(gl, location, divisor);
    Ok(())
}

// renderer/geometry.rs
// Attribute-array geometry. GPU buffers for it live in the properties table
// and follow each array's version.

use std::collections::BTreeMap;
use std::ops::Range;

use glam::Vec3;

use crate::renderer::gl::{DataType, IndexType};

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    F32(Vec<f32>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl AttributeData {
    pub fn len(&self) -> usize {
        match self {
            AttributeData::F32(v) => v.len(),
            AttributeData::U8(v) => v.len(),
            AttributeData::U16(v) => v.len(),
            AttributeData::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            AttributeData::F32(_) => DataType::Float,
            AttributeData::U8(_) => DataType::UnsignedByte,
            AttributeData::U16(_) => DataType::UnsignedShort,
            AttributeData::U32(_) => DataType::UnsignedInt,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeData::F32(v) => bytemuck::cast_slice(v),
            AttributeData::U8(v) => v,
            AttributeData::U16(v) => bytemuck::cast_slice(v),
            AttributeData::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferAttribute {
    pub data: AttributeData,
    pub item_size: u32,
    pub normalized: bool,
    /// Uploaded with DYNAMIC_DRAW and updated through sub-data.
    pub dynamic: bool,
    /// Elements to re-upload on the next version change, all when `None`.
    pub update_range: Option<Range<usize>>,
    /// Instancing divisor, 0 for per-vertex data.
    pub divisor: u32,
    version: u64,
}

impl BufferAttribute {
    pub fn new(data: AttributeData, item_size: u32) -> Self {
        Self {
            data,
            item_size: item_size.max(1),
            normalized: false,
            dynamic: false,
            update_range: None,
            divisor: 0,
            version: 0,
        }
    }

    pub fn f32(data: Vec<f32>, item_size: u32) -> Self {
        Self::new(AttributeData::F32(data), item_size)
    }

    pub fn instanced(data: Vec<f32>, item_size: u32, divisor: u32) -> Self {
        let mut attribute = Self::f32(data, item_size);
        attribute.divisor = divisor;
        attribute
    }

    pub fn count(&self) -> usize {
        self.data.len() / self.item_size as usize
    }

    pub fn set_data(&mut self, data: AttributeData) {
        self.data = data;
        self.needs_update();
    }

    pub fn needs_update(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Several attributes sharing one float buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct InterleavedBuffer {
    pub data: Vec<f32>,
    /// Floats per vertex.
    pub stride: u32,
    pub dynamic: bool,
    pub divisor: u32,
    pub update_range: Option<Range<usize>>,
    version: u64,
}

impl InterleavedBuffer {
    pub fn new(data: Vec<f32>, stride: u32) -> Self {
        Self {
            data,
            stride: stride.max(1),
            dynamic: false,
            divisor: 0,
            update_range: None,
            version: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.data.len() / self.stride as usize
    }

    pub fn needs_update(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedAttribute {
    /// Index into `BufferGeometry::interleaved`.
    pub buffer: usize,
    pub item_size: u32,
    /// Offset in floats from the start of each vertex.
    pub offset: u32,
    pub normalized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryAttribute {
    Buffer(BufferAttribute),
    Interleaved(InterleavedAttribute),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawGroup {
    pub start: usize,
    pub count: usize,
    pub material_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Default)]
pub struct BufferGeometry {
    attributes: BTreeMap<String, GeometryAttribute>,
    pub interleaved: Vec<InterleavedBuffer>,
    index: Option<BufferAttribute>,
    pub groups: Vec<DrawGroup>,
    /// First element and optional element count to draw.
    pub draw_range: (usize, Option<usize>),
    /// Overrides the instance count the binder derives from divisors.
    pub instance_count: Option<u32>,
    bounding_sphere: Option<BoundingSphere>,
}

impl BufferGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, attribute: BufferAttribute) -> Self {
        self.set_attribute(name, attribute);
        self
    }

    pub fn with_index(mut self, index: Vec<u32>) -> Self {
        self.set_index(index);
        self
    }

    pub fn set_attribute(&mut self, name: &str, attribute: BufferAttribute) {
        self.attributes
            .insert(name.to_string(), GeometryAttribute::Buffer(attribute));
        if name == "position" {
            self.compute_bounding_sphere();
        }
    }

    /// Adds an interleaved buffer and returns its index for
    /// `set_interleaved_attribute`.
    pub fn add_interleaved_buffer(&mut self, buffer: InterleavedBuffer) -> usize {
        self.interleaved.push(buffer);
        self.interleaved.len() - 1
    }

    pub fn set_interleaved_attribute(&mut self, name: &str, attribute: InterleavedAttribute) {
        self.attributes
            .insert(name.to_string(), GeometryAttribute::Interleaved(attribute));
        if name == "position" {
            self.compute_bounding_sphere();
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&GeometryAttribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut GeometryAttribute> {
        self.attributes.get_mut(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &GeometryAttribute)> {
        self.attributes.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<GeometryAttribute> {
        self.attributes.remove(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set_index(&mut self, index: Vec<u32>) {
        let version = self.index.as_ref().map_or(0, |i| i.version().wrapping_add(1));
        let mut attribute = BufferAttribute::new(AttributeData::U32(index), 1);
        attribute.version = version;
        self.index = Some(attribute);
    }

    pub fn set_index_u16(&mut self, index: Vec<u16>) {
        let version = self.index.as_ref().map_or(0, |i| i.version().wrapping_add(1));
        let mut attribute = BufferAttribute::new(AttributeData::U16(index), 1);
        attribute.version = version;
        self.index = Some(attribute);
    }

    pub fn index(&self) -> Option<&BufferAttribute> {
        self.index.as_ref()
    }

    pub fn index_mut(&mut self) -> Option<&mut BufferAttribute> {
        self.index.as_mut()
    }

    pub fn add_group(&mut self, start: usize, count: usize, material_index: usize) {
        self.groups.push(DrawGroup {
            start,
            count,
            material_index,
        });
    }

    /// Number of vertices in the position attribute.
    pub fn vertex_count(&self) -> usize {
        match self.attributes.get("position") {
            Some(GeometryAttribute::Buffer(attribute)) => attribute.count(),
            Some(GeometryAttribute::Interleaved(attribute)) => self
                .interleaved
                .get(attribute.buffer)
                .map_or(0, InterleavedBuffer::count),
            None => 0,
        }
    }

    /// Elements a full draw covers: indices when indexed, else vertices.
    pub fn element_count(&self) -> usize {
        match &self.index {
            Some(index) => index.count(),
            None => self.vertex_count(),
        }
    }

    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.bounding_sphere
    }

    pub fn positions(&self) -> Vec<Vec3> {
        match self.attributes.get("position") {
            Some(GeometryAttribute::Buffer(BufferAttribute {
                data: AttributeData::F32(data),
                item_size,
                ..
            })) if *item_size >= 3 => data
                .chunks_exact(*item_size as usize)
                .map(|c| Vec3::new(c[0], c[1], c[2]))
                .collect(),
            Some(GeometryAttribute::Interleaved(attribute)) if attribute.item_size >= 3 => {
                let Some(buffer) = self.interleaved.get(attribute.buffer) else {
                    return Vec::new();
                };
                let offset = attribute.offset as usize;
                buffer
                    .data
                    .chunks_exact(buffer.stride as usize)
                    .filter(|c| c.len() >= offset + 3)
                    .map(|c| Vec3::new(c[offset], c[offset + 1], c[offset + 2]))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Sphere around the bounding box centre that contains every position.
    pub fn compute_bounding_sphere(&mut self) {
        let positions = self.positions();
        if positions.is_empty() {
            self.bounding_sphere = None;
            return;
        }

        let (min, max) = positions
            .iter()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(min, max), p| {
                (min.min(*p), max.max(*p))
            });
        let center = (min + max) * 0.5;
        let radius = positions
            .iter()
            .map(|p| p.distance_squared(center))
            .fold(0.0f32, f32::max)
            .sqrt();

        self.bounding_sphere = Some(BoundingSphere { center, radius });
    }

    /// Index buffer element type after narrowing: u32 data that fits is
    /// stored as u16.
    pub fn index_type(&self) -> Option<IndexType> {
        self.index.as_ref().map(|index| match &index.data {
            AttributeData::U32(values) if values.iter().any(|&v| v > u16::MAX as u32) => {
                IndexType::U32
            }
            _ => IndexType::U16,
        })
    }
}

/// Each undirected triangle edge once, as line-list indices.
pub fn wireframe_edges(geometry: &BufferGeometry) -> Vec<u32> {
    let triangles: Vec<u32> = match geometry.index() {
        Some(index) => match &index.data {
            AttributeData::U16(values) => values.iter().map(|&v| v as u32).collect(),
            AttributeData::U32(values) => values.clone(),
            AttributeData::U8(values) => values.iter().map(|&v| v as u32).collect(),
            AttributeData::F32(_) => Vec::new(),
        },
        None => (0..geometry.vertex_count() as u32).collect(),
    };

    let mut seen = std::collections::HashSet::new();
    let mut edges = Vec::new();
    for triangle in triangles.chunks_exact(3) {
        for (a, b) in [
            (triangle[0], triangle[1]),
            (triangle[1], triangle[2]),
            (triangle[2], triangle[0]),
        ] {
            let key = (a.min(b), a.max(b));
            if seen.insert(key) {
                edges.push(key.0);
                edges.push(key.1);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> BufferGeometry {
        BufferGeometry::new()
            .with_attribute(
                "position",
                BufferAttribute::f32(
                    vec![
                        -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0,
                    ],
                    3,
                ),
            )
            .with_index(vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn bounding_sphere_covers_positions() {
        let geometry = quad();
        let sphere = geometry.bounding_sphere().unwrap();
        assert!(sphere.center.abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!((sphere.radius - 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn counts_follow_index() {
        let geometry = quad();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.element_count(), 6);
        assert_eq!(geometry.index_type(), Some(IndexType::U16));

        let big = BufferGeometry::new().with_index(vec![0, 70_000, 1]);
        assert_eq!(big.index_type(), Some(IndexType::U32));
    }

    #[test]
    fn wireframe_lists_each_edge_once() {
        let edges = wireframe_edges(&quad());
        // 5 unique edges: four sides plus the shared diagonal
        assert_eq!(edges.len(), 10);
        assert_eq!(&edges[..6], &[0, 1, 1, 2, 0, 2]);
    }

    #[test]
    fn interleaved_positions_are_read_with_stride() {
        let mut geometry = BufferGeometry::new();
        let buffer = geometry.add_interleaved_buffer(InterleavedBuffer::new(
            vec![1.0, 2.0, 3.0, 0.0, 0.0, 4.0, 5.0, 6.0, 1.0, 1.0],
            5,
        ));
        geometry.set_interleaved_attribute(
            "position",
            InterleavedAttribute {
                buffer,
                item_size: 3,
                offset: 0,
                normalized: false,
            },
        );
        assert_eq!(geometry.vertex_count(), 2);
        assert_eq!(geometry.positions()[1], Vec3::new(4.0, 5.0, 6.0));
        assert!(geometry.bounding_sphere().is_some());
    }
}

use std::sync::Arc;

use glam::Vec3;

use crate::error::MeshError;
use crate::scene::Transform;
use crate::shader::{Shader, ShaderLayout};

use super::vertex::VertexValue;

/// Floats reserved for the position at the start of every vertex.
pub const POSITION_COMPONENTS: usize = 3;

/// A flat, strided vertex array plus a triangle index list.
///
/// `vertices.len()` is always `vertex_count * vertex_size`, and every index is
/// below `vertex_count`. The transform is applied lazily by
/// [`Mesh::transformed_vertices`]; stored vertex data is never moved.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub transform: Transform,
    vertices: Vec<f32>,
    indices: Vec<u32>,
    vertex_count: usize,
    vertex_size: usize,
    layout: Option<Arc<ShaderLayout>>,
}

impl Mesh {
    /// A zero-filled mesh of `vertex_count` vertices, `vertex_size` floats each.
    pub fn new(vertex_count: usize, vertex_size: usize) -> Self {
        let vertex_count = if vertex_size == 0 { 0 } else { vertex_count };
        Self {
            name: String::new(),
            transform: Transform::new(),
            vertices: vec![0.0; vertex_count * vertex_size],
            indices: Vec::new(),
            vertex_count,
            vertex_size,
            layout: None,
        }
    }

    /// A zero-filled mesh strided for `shader`, with its attribute layout adopted.
    pub fn with_shader(vertex_count: usize, shader: &Shader) -> Self {
        let mut mesh = Self::new(vertex_count, shader.attribute_size());
        mesh.adapt_layout(shader.layout());
        mesh
    }

    /// Builds a mesh from explicit arrays. A trailing partial vertex is dropped.
    pub fn from_parts(mut vertices: Vec<f32>, indices: Vec<u32>, vertex_size: usize) -> Result<Self, MeshError> {
        let vertex_count = vertices.len().checked_div(vertex_size).unwrap_or(0);
        vertices.truncate(vertex_count * vertex_size);
        let mut mesh = Self {
            vertices,
            vertex_count,
            ..Self::new(0, vertex_size)
        };
        mesh.add_indices(&indices)?;
        Ok(mesh)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adopts `shader`'s attribute map. Has no effect when the shader's stride
    /// differs from this mesh's vertex size.
    pub fn adapt(&mut self, shader: &Shader) -> bool {
        self.adapt_layout(shader.layout())
    }

    pub fn adapt_layout(&mut self, layout: &Arc<ShaderLayout>) -> bool {
        if layout.stride() != self.vertex_size {
            log::debug!(
                "Mesh {:?} not adapted: shader stride {} != vertex size {}",
                self.name,
                layout.stride(),
                self.vertex_size
            );
            return false;
        }
        self.layout = Some(Arc::clone(layout));
        true
    }

    pub fn layout(&self) -> Option<&ShaderLayout> {
        self.layout.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Stride in floats.
    pub fn vertex_size(&self) -> usize {
        self.vertex_size
    }

    /// Stored vertex data, untransformed.
    pub fn raw_vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn range(&self, index: usize, offset: usize, components: usize) -> Result<std::ops::Range<usize>, MeshError> {
        if index >= self.vertex_count || offset + components > self.vertex_size {
            return Err(MeshError::OutOfRange {
                index,
                offset,
                components,
                vertex_count: self.vertex_count,
                vertex_size: self.vertex_size,
            });
        }
        let start = index * self.vertex_size + offset;
        Ok(start..start + components)
    }

    /// Writes `value` at float `offset` inside vertex `index`.
    pub fn set_vertex(&mut self, index: usize, offset: usize, value: impl Into<VertexValue>) -> Result<(), MeshError> {
        let value = value.into();
        let range = self.range(index, offset, value.components())?;
        value.write_to(&mut self.vertices[range]);
        Ok(())
    }

    /// Writes `value` into the attribute called `name` of vertex `index`,
    /// resolved through the adopted shader layout.
    pub fn set_attribute(&mut self, index: usize, name: &str, value: impl Into<VertexValue>) -> Result<(), MeshError> {
        let value = value.into();
        let attribute = self
            .layout
            .as_ref()
            .and_then(|layout| layout.attribute(name))
            .copied()
            .ok_or_else(|| MeshError::UnknownAttribute(name.to_string()))?;
        if attribute.ty != value.attribute_type() {
            return Err(MeshError::TypeMismatch {
                name: name.to_string(),
                expected: attribute.ty,
                found: value.attribute_type(),
            });
        }
        self.set_vertex(index, attribute.offset, value)
    }

    /// Writes `value` into attribute `name` of every vertex.
    pub fn fill_attribute(&mut self, name: &str, value: impl Into<VertexValue>) -> Result<(), MeshError> {
        let value = value.into();
        for index in 0..self.vertex_count {
            self.set_attribute(index, name, value)?;
        }
        Ok(())
    }

    /// Writes `value` at float `offset` of every vertex.
    pub fn fill_offset(&mut self, offset: usize, value: impl Into<VertexValue>) -> Result<(), MeshError> {
        let value = value.into();
        // Check once so a bad offset leaves the buffer untouched.
        if self.vertex_count > 0 {
            self.range(0, offset, value.components())?;
        }
        for index in 0..self.vertex_count {
            self.set_vertex(index, offset, value)?;
        }
        Ok(())
    }

    pub fn vertex(&self, index: usize, offset: usize, components: usize) -> Result<&[f32], MeshError> {
        let range = self.range(index, offset, components)?;
        Ok(&self.vertices[range])
    }

    pub fn position(&self, index: usize) -> Result<Vec3, MeshError> {
        self.vertex(index, 0, POSITION_COMPONENTS).map(Vec3::from_slice)
    }

    /// Appends whole vertices; floats beyond the last complete vertex are dropped.
    /// Returns the number of vertices added.
    pub fn add_vertices(&mut self, data: &[f32]) -> usize {
        if self.vertex_size == 0 {
            return 0;
        }
        let added = data.len() / self.vertex_size;
        let dropped = data.len() % self.vertex_size;
        if dropped > 0 {
            log::debug!("Dropping {} trailing floats of a partial vertex", dropped);
        }
        self.vertices.extend_from_slice(&data[..added * self.vertex_size]);
        self.vertex_count += added;
        added
    }

    /// Appends whole triangles. Rejects the whole batch if its length is not a
    /// multiple of 3 or any index is past the last vertex.
    pub fn add_indices(&mut self, indices: &[u32]) -> Result<(), MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::UnalignedIndices(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= self.vertex_count) {
            return Err(MeshError::IndexOutOfBounds {
                index,
                vertex_count: self.vertex_count,
            });
        }
        self.indices.extend_from_slice(indices);
        Ok(())
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) -> Result<(), MeshError> {
        self.add_indices(&[a, b, c])
    }

    pub fn set_indices(&mut self, indices: &[u32]) -> Result<(), MeshError> {
        let previous = std::mem::take(&mut self.indices);
        self.add_indices(indices).inspect_err(|_| {
            self.indices = previous;
        })
    }

    /// Mean of all vertex positions.
    pub fn centroid(&self) -> Vec3 {
        if self.vertex_count == 0 || self.vertex_size < POSITION_COMPONENTS {
            return Vec3::ZERO;
        }
        let sum: Vec3 = self
            .vertices
            .chunks_exact(self.vertex_size)
            .map(|v| Vec3::from_slice(&v[..POSITION_COMPONENTS]))
            .sum();
        sum / self.vertex_count as f32
    }

    /// A fresh copy of the vertex data with the mesh transform applied to
    /// every position. Scale and rotation pivot on the centroid, then the
    /// result is offset by the transform's position.
    pub fn transformed_vertices(&self) -> Vec<f32> {
        let mut out = self.vertices.clone();
        if self.vertex_size < POSITION_COMPONENTS {
            return out;
        }
        let center = self.centroid();
        let Transform {
            position,
            rotation,
            scale,
            ..
        } = self.transform;
        for vertex in out.chunks_exact_mut(self.vertex_size) {
            let p = Vec3::from_slice(&vertex[..POSITION_COMPONENTS]);
            let p = rotation * ((p - center) * scale) + center + position;
            p.write_to_slice(&mut vertex[..POSITION_COMPONENTS]);
        }
        out
    }
}

use glam::{Vec2, Vec3, Vec4};

use crate::error::MeshError;
use crate::shader::AttributeType;

use super::Mesh;

/// Per-vertex data that can be written into a mesh attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl VertexValue {
    pub fn components(&self) -> usize {
        match self {
            VertexValue::Float(_) => 1,
            VertexValue::Vec2(_) => 2,
            VertexValue::Vec3(_) => 3,
            VertexValue::Vec4(_) => 4,
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            VertexValue::Float(_) => AttributeType::Float,
            VertexValue::Vec2(_) => AttributeType::Vec2,
            VertexValue::Vec3(_) => AttributeType::Vec3,
            VertexValue::Vec4(_) => AttributeType::Vec4,
        }
    }

    pub fn write_to(&self, out: &mut [f32]) {
        match self {
            VertexValue::Float(v) => out[0] = *v,
            VertexValue::Vec2(v) => v.write_to_slice(out),
            VertexValue::Vec3(v) => v.write_to_slice(out),
            VertexValue::Vec4(v) => v.write_to_slice(out),
        }
    }

    /// Builds a value of a per-vertex type from a component list, padding with
    /// zero. Returns `None` for types a vertex cannot hold.
    pub fn from_components(ty: AttributeType, components: &[f32]) -> Option<Self> {
        let at = |i: usize| components.get(i).copied().unwrap_or(0.0);
        match ty {
            AttributeType::Float => Some(VertexValue::Float(at(0))),
            AttributeType::Vec2 => Some(VertexValue::Vec2(Vec2::new(at(0), at(1)))),
            AttributeType::Vec3 => Some(VertexValue::Vec3(Vec3::new(at(0), at(1), at(2)))),
            AttributeType::Vec4 => Some(VertexValue::Vec4(Vec4::new(at(0), at(1), at(2), at(3)))),
            _ => None,
        }
    }
}

impl From<f32> for VertexValue {
    fn from(v: f32) -> Self {
        VertexValue::Float(v)
    }
}

impl From<Vec2> for VertexValue {
    fn from(v: Vec2) -> Self {
        VertexValue::Vec2(v)
    }
}

impl From<Vec3> for VertexValue {
    fn from(v: Vec3) -> Self {
        VertexValue::Vec3(v)
    }
}

impl From<Vec4> for VertexValue {
    fn from(v: Vec4) -> Self {
        VertexValue::Vec4(v)
    }
}

/// Stages several named attribute writes for one vertex and applies them together.
#[derive(Debug, Clone, Default)]
pub struct VertexEditor {
    index: usize,
    values: Vec<(String, VertexValue)>,
}

impl VertexEditor {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            values: Vec::new(),
        }
    }

    pub fn set(mut self, name: &str, value: impl Into<VertexValue>) -> Self {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name.to_string(), value)),
        }
        self
    }

    /// Writes every staged value. Stops at the first rejected write; values
    /// staged before it have already been applied.
    pub fn apply(&self, mesh: &mut Mesh) -> Result<(), MeshError> {
        for (name, value) in &self.values {
            mesh.set_attribute(self.index, name, *value)?;
        }
        Ok(())
    }
}

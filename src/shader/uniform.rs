use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use super::attribute::AttributeType;

/// A value that can be assigned to a shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            UniformValue::Bool(_) => AttributeType::Bool,
            UniformValue::Int(_) => AttributeType::Int,
            UniformValue::Float(_) => AttributeType::Float,
            UniformValue::Vec2(_) => AttributeType::Vec2,
            UniformValue::Vec3(_) => AttributeType::Vec3,
            UniformValue::Vec4(_) => AttributeType::Vec4,
            UniformValue::Mat2(_) => AttributeType::Mat2,
            UniformValue::Mat3(_) => AttributeType::Mat3,
            UniformValue::Mat4(_) => AttributeType::Mat4,
        }
    }

    /// Whether this value may be assigned to a uniform declared as `ty`.
    /// Samplers take a texture unit index.
    pub fn fits(&self, ty: AttributeType) -> bool {
        match (self, ty) {
            (UniformValue::Int(_), AttributeType::Sampler2D) => true,
            _ => self.attribute_type() == ty,
        }
    }

    /// Builds a value of type `ty` from a flat component list, padding missing
    /// components with zero. Matrices are column-major and default to identity
    /// when fewer components than required are given.
    pub fn from_components(ty: AttributeType, components: &[f32]) -> Self {
        let at = |i: usize| components.get(i).copied().unwrap_or(0.0);
        match ty {
            AttributeType::Bool => UniformValue::Bool(at(0) != 0.0),
            AttributeType::Int | AttributeType::Sampler2D => UniformValue::Int(at(0) as i32),
            AttributeType::Float => UniformValue::Float(at(0)),
            AttributeType::Vec2 => UniformValue::Vec2(Vec2::new(at(0), at(1))),
            AttributeType::Vec3 => UniformValue::Vec3(Vec3::new(at(0), at(1), at(2))),
            AttributeType::Vec4 => UniformValue::Vec4(Vec4::new(at(0), at(1), at(2), at(3))),
            AttributeType::Mat2 => UniformValue::Mat2(match components.get(..4) {
                Some(cols) => Mat2::from_cols_slice(cols),
                None => Mat2::IDENTITY,
            }),
            AttributeType::Mat3 => UniformValue::Mat3(match components.get(..9) {
                Some(cols) => Mat3::from_cols_slice(cols),
                None => Mat3::IDENTITY,
            }),
            AttributeType::Mat4 => UniformValue::Mat4(match components.get(..16) {
                Some(cols) => Mat4::from_cols_slice(cols),
                None => Mat4::IDENTITY,
            }),
        }
    }
}

macro_rules! uniform_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }

            impl TryFrom<UniformValue> for $ty {
                type Error = UniformValue;

                fn try_from(value: UniformValue) -> Result<Self, Self::Error> {
                    match value {
                        UniformValue::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

uniform_conversions! {
    Bool => bool,
    Int => i32,
    Float => f32,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
}

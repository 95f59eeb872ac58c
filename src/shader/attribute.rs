use std::fmt;

/// Scalar, vector, matrix and sampler types a shader may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeType {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
}

impl AttributeType {
    pub const ALL: [AttributeType; 10] = [
        AttributeType::Bool,
        AttributeType::Int,
        AttributeType::Float,
        AttributeType::Vec2,
        AttributeType::Vec3,
        AttributeType::Vec4,
        AttributeType::Mat2,
        AttributeType::Mat3,
        AttributeType::Mat4,
        AttributeType::Sampler2D,
    ];

    /// Number of floats one value of this type occupies in a vertex.
    pub const fn component_count(self) -> usize {
        match self {
            AttributeType::Bool | AttributeType::Int | AttributeType::Float => 1,
            AttributeType::Vec2 => 2,
            AttributeType::Vec3 => 3,
            AttributeType::Vec4 | AttributeType::Mat2 => 4,
            AttributeType::Mat3 => 9,
            AttributeType::Mat4 => 16,
            AttributeType::Sampler2D => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            AttributeType::Bool => "bool",
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Vec2 => "vec2",
            AttributeType::Vec3 => "vec3",
            AttributeType::Vec4 => "vec4",
            AttributeType::Mat2 => "mat2",
            AttributeType::Mat3 => "mat3",
            AttributeType::Mat4 => "mat4",
            AttributeType::Sampler2D => "sampler2D",
        }
    }

    /// Exact keyword lookup, as written in shader source.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == keyword)
    }

    /// Case-insensitive lookup for document `type` fields.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Number of `vec4`-sized columns a matrix attribute binds, 1 for everything else.
    pub const fn columns(self) -> usize {
        match self {
            AttributeType::Mat2 => 2,
            AttributeType::Mat3 => 3,
            AttributeType::Mat4 => 4,
            _ => 1,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_counts_match_table() {
        let counts: Vec<usize> = AttributeType::ALL
            .iter()
            .map(|ty| ty.component_count())
            .collect();
        assert_eq!(counts, vec![1, 1, 1, 2, 3, 4, 4, 9, 16, 1]);
    }

    #[test]
    fn keyword_lookup_is_exact() {
        assert_eq!(AttributeType::from_keyword("vec3"), Some(AttributeType::Vec3));
        assert_eq!(AttributeType::from_keyword("sampler2D"), Some(AttributeType::Sampler2D));
        assert_eq!(AttributeType::from_keyword("Vec3"), None);
        assert_eq!(AttributeType::from_keyword("vec"), None);
    }

    #[test]
    fn name_lookup_ignores_case() {
        assert_eq!(AttributeType::from_name("VEC4"), Some(AttributeType::Vec4));
        assert_eq!(AttributeType::from_name(" sampler2d "), Some(AttributeType::Sampler2D));
        assert_eq!(AttributeType::from_name("double"), None);
    }
}

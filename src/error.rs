use thiserror::Error;

use crate::shader::AttributeType;

/// Failures from addressing or growing a [`Mesh`](crate::model::Mesh).
///
/// The mesh never partially applies a write: when one of these is returned the
/// vertex and index storage are exactly as they were before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("vertex write at index {index}, offset {offset} ({components} floats) is outside a mesh of {vertex_count} vertices x {vertex_size} floats")]
    OutOfRange {
        index: usize,
        offset: usize,
        components: usize,
        vertex_count: usize,
        vertex_size: usize,
    },

    #[error("attribute `{0}` is not part of the mesh layout")]
    UnknownAttribute(String),

    #[error("attribute `{name}` is declared as {expected} but a {found} value was supplied")]
    TypeMismatch {
        name: String,
        expected: AttributeType,
        found: AttributeType,
    },

    #[error("{0} indices do not form whole triangles")]
    UnalignedIndices(usize),

    #[error("index {index} references a vertex outside a mesh of {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
}

/// Failures reported by [`Shader`](crate::shader::Shader) and render backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderError {
    #[error("uniform `{0}` is not declared by the shader")]
    UnknownUniform(String),

    #[error("uniform `{name}` is declared as {expected} but a {found} value was supplied")]
    UniformTypeMismatch {
        name: String,
        expected: AttributeType,
        found: AttributeType,
    },

    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{0}")]
    Link(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Rejected generator parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl GeometryError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        GeometryError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// A markup document that could not be read as a tree.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("markup error at {line}:{col}: {message}")]
pub struct MarkupError {
    pub message: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in characters.
    pub col: usize,
}

/// Failures while reading a scene document or applying one of its nodes.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document has no scene nodes: {0}")]
    Shape(String),

    #[error("<{tag}>: {reason}")]
    InvalidNode { tag: String, reason: String },

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl DocumentError {
    pub(crate) fn invalid_node(tag: &str, reason: impl Into<String>) -> Self {
        DocumentError::InvalidNode {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }
}

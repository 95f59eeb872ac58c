//! Declarative scene runtime: markup or JSON scene documents are turned into
//! meshes whose vertex format follows the shader they are drawn with, then
//! flattened into one upload-ready vertex and index buffer.

pub mod document;
pub mod error;
pub mod model;
pub mod renderer;
pub mod scene;
pub mod shader;

pub use document::{load, Format, Node};
pub use error::{DocumentError, GeometryError, MarkupError, MeshError, ShaderError};
pub use model::Mesh;
pub use renderer::{HeadlessBackend, RenderBackend};
pub use scene::{Camera, Scene, Transform};
pub use shader::{AttributeType, Shader, ShaderLayout};

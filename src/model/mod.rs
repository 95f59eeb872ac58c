mod gear;
mod mesh;
mod primitives;
mod vertex;

pub use gear::{create_gear, GearParams};
pub use mesh::{Mesh, POSITION_COMPONENTS};
pub use primitives::{create_box, create_cone, create_cylinder, create_plane, VertexSpec, MAX_COUNT, MAX_VERTICES};
pub use vertex::{VertexEditor, VertexValue};

/// Stride used for generated meshes when no shader is active:
/// position, normal and color, three floats each.
pub const DEFAULT_VERTEX_SIZE: usize = 9;
/// Float offset of the normal in the default layout.
pub const DEFAULT_NORMAL_OFFSET: usize = 3;
/// Float offset of the color in the default layout.
pub const DEFAULT_COLOR_OFFSET: usize = 6;

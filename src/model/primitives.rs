use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec3;

use crate::error::GeometryError;
use crate::shader::{Shader, ShaderLayout};

use super::mesh::{Mesh, POSITION_COMPONENTS};

/// How wide each generated vertex is: a bare float count, or the stride of a
/// shader whose layout the mesh then adopts.
#[derive(Debug, Clone, Copy)]
pub enum VertexSpec<'a> {
    Size(usize),
    Layout(&'a Arc<ShaderLayout>),
}

impl VertexSpec<'_> {
    pub fn size(&self) -> usize {
        match self {
            VertexSpec::Size(size) => *size,
            VertexSpec::Layout(layout) => layout.stride(),
        }
    }
}

impl From<usize> for VertexSpec<'_> {
    fn from(size: usize) -> Self {
        VertexSpec::Size(size)
    }
}

impl<'a> From<&'a Shader> for VertexSpec<'a> {
    fn from(shader: &'a Shader) -> Self {
        VertexSpec::Layout(shader.layout())
    }
}

impl<'a> From<&'a Arc<ShaderLayout>> for VertexSpec<'a> {
    fn from(layout: &'a Arc<ShaderLayout>) -> Self {
        VertexSpec::Layout(layout)
    }
}

/// Largest sector, resolution or tooth count a generator accepts.
pub const MAX_COUNT: u32 = 1 << 20;

/// Largest vertex count a generator allocates. Every generator stays below it
/// for counts up to [`MAX_COUNT`], and indices into it always fit a `u32`.
pub const MAX_VERTICES: usize = 1 << 22;

/// Allocates a zero-filled mesh for a generator and adopts the layout, if any.
pub(crate) fn blank_mesh(name: &str, vertex_count: usize, spec: VertexSpec<'_>) -> Result<Mesh, GeometryError> {
    let size = spec.size();
    if size < POSITION_COMPONENTS {
        return Err(GeometryError::invalid(
            "vertex_size",
            format!("{size} floats cannot hold a position"),
        ));
    }
    if vertex_count > MAX_VERTICES || vertex_count.checked_mul(size).is_none() {
        return Err(GeometryError::invalid(
            "vertex_count",
            format!("{vertex_count} vertices of {size} floats is too large"),
        ));
    }
    let mut mesh = Mesh::new(vertex_count, size).with_name(name);
    if let VertexSpec::Layout(layout) = spec {
        mesh.adapt_layout(layout);
    }
    Ok(mesh)
}

pub(crate) fn check_count(name: &'static str, count: u32) -> Result<usize, GeometryError> {
    if count == 0 {
        return Err(GeometryError::invalid(name, "must be at least 1"));
    }
    if count > MAX_COUNT {
        return Err(GeometryError::invalid(name, format!("{count} exceeds the limit of {MAX_COUNT}")));
    }
    Ok(count as usize)
}

fn write_positions(mesh: &mut Mesh, positions: impl IntoIterator<Item = Vec3>) -> Result<(), GeometryError> {
    for (index, position) in positions.into_iter().enumerate() {
        mesh.set_vertex(index, 0, position)?;
    }
    Ok(())
}

/// Axis-aligned box centred on the origin: 8 corners, 12 triangles.
///
/// `width` runs along X, `height` along Y and `depth` along Z. In documents
/// `h` is the Y extent and `d` the Z extent.
pub fn create_box<'a>(width: f32, height: f32, depth: f32, spec: impl Into<VertexSpec<'a>>) -> Result<Mesh, GeometryError> {
    let (w, h, d) = (width / 2.0, height / 2.0, depth / 2.0);
    let mut mesh = blank_mesh("box", 8, spec.into())?;
    write_positions(
        &mut mesh,
        [
            Vec3::new(-w, -h, -d),
            Vec3::new(w, -h, -d),
            Vec3::new(w, h, -d),
            Vec3::new(-w, h, -d),
            Vec3::new(-w, -h, d),
            Vec3::new(w, -h, d),
            Vec3::new(w, h, d),
            Vec3::new(-w, h, d),
        ],
    )?;
    mesh.add_indices(&[
        0, 1, 2, 2, 3, 0, // back
        1, 5, 6, 6, 2, 1, // right
        5, 4, 7, 7, 6, 5, // front
        4, 0, 3, 3, 7, 4, // left
        3, 2, 6, 6, 7, 3, // top
        4, 5, 1, 1, 0, 4, // bottom
    ])?;
    Ok(mesh)
}

/// Plane in XZ, centred on the origin; `height` runs along Z.
pub fn create_plane<'a>(width: f32, height: f32, spec: impl Into<VertexSpec<'a>>) -> Result<Mesh, GeometryError> {
    let (w, h) = (width / 2.0, height / 2.0);
    let mut mesh = blank_mesh("plane", 4, spec.into())?;
    write_positions(
        &mut mesh,
        [
            Vec3::new(-w, 0.0, -h),
            Vec3::new(w, 0.0, -h),
            Vec3::new(w, 0.0, h),
            Vec3::new(-w, 0.0, h),
        ],
    )?;
    mesh.add_indices(&[0, 1, 2, 2, 3, 0])?;
    Ok(mesh)
}

fn ring(radius: f32, y: f32, sector_count: usize) -> impl Iterator<Item = Vec3> {
    let step = TAU / sector_count as f32;
    (0..sector_count).map(move |i| {
        let (sin, cos) = (i as f32 * step).sin_cos();
        Vec3::new(radius * cos, y, radius * sin)
    })
}

/// Open cylinder along Y. Vertex `2i` is on the bottom ring and `2i + 1` on the
/// top ring; each sector is one quad.
pub fn create_cylinder<'a>(
    radius: f32,
    height: f32,
    sector_count: u32,
    spec: impl Into<VertexSpec<'a>>,
) -> Result<Mesh, GeometryError> {
    let sectors = check_count("sector_count", sector_count)?;
    let mut mesh = blank_mesh("cylinder", sectors * 2, spec.into())?;
    let half = height / 2.0;
    let positions = ring(radius, -half, sectors)
        .zip(ring(radius, half, sectors))
        .flat_map(|(bottom, top)| [bottom, top]);
    write_positions(&mut mesh, positions)?;

    let mut indices = Vec::with_capacity(sectors * 6);
    for i in 0..sectors as u32 {
        let next = (i + 1) % sectors as u32;
        let (b0, t0, b1, t1) = (i * 2, i * 2 + 1, next * 2, next * 2 + 1);
        indices.extend_from_slice(&[b0, t0, t1, t1, b1, b0]);
    }
    mesh.add_indices(&indices)?;
    Ok(mesh)
}

/// Cone along Y: a base ring of `sector_count` vertices and an apex at index `sector_count`.
pub fn create_cone<'a>(
    radius: f32,
    height: f32,
    sector_count: u32,
    spec: impl Into<VertexSpec<'a>>,
) -> Result<Mesh, GeometryError> {
    let sectors = check_count("sector_count", sector_count)?;
    let mut mesh = blank_mesh("cone", sectors + 1, spec.into())?;
    let half = height / 2.0;
    write_positions(
        &mut mesh,
        ring(radius, -half, sectors).chain(std::iter::once(Vec3::new(0.0, half, 0.0))),
    )?;

    let apex = sectors as u32;
    let mut indices = Vec::with_capacity(sectors * 3);
    for i in 0..apex {
        indices.extend_from_slice(&[i, (i + 1) % apex, apex]);
    }
    mesh.add_indices(&indices)?;
    Ok(mesh)
}

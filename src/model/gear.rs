use std::f32::consts::TAU;

use glam::Vec3;

use crate::error::GeometryError;

use super::mesh::{Mesh, POSITION_COMPONENTS};
use super::primitives::{blank_mesh, check_count, VertexSpec};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearParams {
    pub tooth_count: u32,
    /// Angular subdivisions of the body ring.
    pub resolution: u32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Accepted for extruded gears; the generated profile is planar.
    pub height: f32,
    /// Radius of the tooth tips.
    pub tooth_height: f32,
    /// Accepted for extruded gears; each tooth spans one ring sector.
    pub tooth_width: f32,
}

impl Default for GearParams {
    fn default() -> Self {
        Self {
            tooth_count: 12,
            resolution: 48,
            inner_radius: 0.5,
            outer_radius: 1.0,
            height: 1.0,
            tooth_height: 1.2,
            tooth_width: 0.1,
        }
    }
}

/// Planar gear in XY: an annulus between the inner and outer radius, plus one
/// triangle pair per tooth reaching out to `tooth_height`.
///
/// Vertices `0..resolution` form the inner ring and `resolution..2*resolution`
/// the outer ring. Teeth are placed every `resolution / tooth_count` sectors
/// (integer division), each adding two tip vertices after the rings.
pub fn create_gear<'a>(params: &GearParams, spec: impl Into<VertexSpec<'a>>) -> Result<Mesh, GeometryError> {
    let resolution = check_count("resolution", params.resolution)?;
    let teeth = check_count("tooth_count", params.tooth_count)?;
    if teeth > resolution {
        return Err(GeometryError::invalid(
            "tooth_count",
            format!("{teeth} teeth do not fit on {resolution} sectors"),
        ));
    }

    let mut mesh = blank_mesh("gear", resolution * 2, spec.into())?;
    let step = TAU / resolution as f32;
    let direction = |sector: usize| {
        let (sin, cos) = (sector as f32 * step).sin_cos();
        Vec3::new(cos, sin, 0.0)
    };

    for i in 0..resolution {
        mesh.set_vertex(i, 0, direction(i) * params.inner_radius)?;
        mesh.set_vertex(i + resolution, 0, direction(i) * params.outer_radius)?;
    }

    let res = resolution as u32;
    let mut body = Vec::with_capacity(resolution * 6);
    for i in 0..res - 1 {
        body.extend_from_slice(&[i, i + res, i + 1]);
        body.extend_from_slice(&[i + 1, i + res, i + res + 1]);
    }
    body.extend_from_slice(&[res - 1, res * 2 - 1, 0]);
    body.extend_from_slice(&[0, res * 2 - 1, res]);
    mesh.add_indices(&body)?;

    let spacing = resolution / teeth;
    let mut tip = vec![0.0; mesh.vertex_size()];
    for tooth in 0..teeth {
        let sector = tooth * spacing;
        let next = (sector + 1) % resolution;

        let first_tip = mesh.vertex_count() as u32;
        for s in [sector, next] {
            (direction(s) * params.tooth_height).write_to_slice(&mut tip[..POSITION_COMPONENTS]);
            mesh.add_vertices(&tip);
        }

        let outer = sector as u32 + res;
        let outer_next = next as u32 + res;
        mesh.add_indices(&[outer, outer_next, first_tip])?;
        mesh.add_indices(&[first_tip + 1, outer_next, first_tip])?;
    }

    Ok(mesh)
}

//! The scene interpreter.
//!
//! Every node is dispatched by lowercased tag through fixed tables. Top-level
//! nodes are looked up as primitives first, then as other objects (shader,
//! camera). Children of a primitive go to the mesh modifier table and the
//! object modifier table, children of a shader to the uniform table. Unknown
//! tags are skipped and a failing node only loses its own effect.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use glam::Vec3;

use crate::error::{DocumentError, GeometryError};
use crate::model::{
    create_box, create_cone, create_cylinder, create_gear, create_plane, GearParams, Mesh, VertexSpec, VertexValue,
    DEFAULT_COLOR_OFFSET, DEFAULT_NORMAL_OFFSET, DEFAULT_VERTEX_SIZE,
};
use crate::scene::{Camera, Orthographic, Perspective, Projection, Scene, Transform};
use crate::shader::{AttributeType, Shader, ShaderLayout, UniformValue};

use super::Node;

const SECTOR_COUNT: &[&str] = &["sectorCount", "resolution", "sc", "n"];
const DEFAULT_SECTOR_COUNT: i64 = 32;

/// Parse state threaded through one document.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Layout of the most recent shader, adopted by primitives declared after it.
    pub active_layout: Option<Arc<ShaderLayout>>,
    /// Directory shader paths are resolved against.
    pub base_dir: PathBuf,
}

impl ParseContext {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            active_layout: None,
            base_dir: base_dir.into(),
        }
    }

    fn vertex_spec(&self) -> VertexSpec<'_> {
        match &self.active_layout {
            Some(layout) => VertexSpec::Layout(layout),
            None => VertexSpec::Size(DEFAULT_VERTEX_SIZE),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }
}

/// A top-level object that is not a mesh.
pub enum SceneObject {
    Shader(Shader),
    Camera(Camera),
}

type PrimitiveFn = fn(&Node, VertexSpec<'_>) -> Result<Mesh, GeometryError>;
type MeshModifierFn = fn(&Node, &mut Mesh) -> Result<(), DocumentError>;
type ObjectModifierFn = fn(&Node, &mut Transform);
type ObjectFn = fn(&Node, &ParseContext) -> Result<SceneObject, DocumentError>;
type ShaderModifierFn = fn(&Node, &mut Shader) -> Result<(), DocumentError>;

static PRIMITIVES: LazyLock<HashMap<&'static str, PrimitiveFn>> = LazyLock::new(|| {
    HashMap::from([
        ("box", primitive_box as PrimitiveFn),
        ("plane", primitive_plane),
        ("cylinder", primitive_cylinder),
        ("cone", primitive_cone),
        ("gear", primitive_gear),
    ])
});

static MESH_MODIFIERS: LazyLock<HashMap<&'static str, MeshModifierFn>> = LazyLock::new(|| {
    HashMap::from([
        ("color", modify_color as MeshModifierFn),
        ("normal", modify_normal),
        ("set", modify_set),
    ])
});

static OBJECT_MODIFIERS: LazyLock<HashMap<&'static str, ObjectModifierFn>> = LazyLock::new(|| {
    HashMap::from([
        ("translate", modify_translate as ObjectModifierFn),
        ("rotate", modify_rotate),
        ("scale", modify_scale),
        ("lookat", modify_look_at),
    ])
});

static OBJECTS: LazyLock<HashMap<&'static str, ObjectFn>> = LazyLock::new(|| {
    HashMap::from([
        ("shader", object_shader as ObjectFn),
        ("camera", object_camera),
        ("cam", object_camera),
    ])
});

static SHADER_MODIFIERS: LazyLock<HashMap<&'static str, ShaderModifierFn>> = LazyLock::new(|| {
    HashMap::from([
        ("set", shader_set as ShaderModifierFn),
        ("setshader", shader_set),
        ("setuniform", shader_set),
    ])
});

/// Whether `tag` names a top-level scene node.
pub fn is_scene_tag(tag: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    PRIMITIVES.contains_key(tag.as_str()) || OBJECTS.contains_key(tag.as_str())
}

/// The nodes to interpret under a markup root: the root itself when it is a
/// scene node, otherwise its children.
pub fn scene_nodes(root: Node) -> Vec<Node> {
    if is_scene_tag(&root.name) {
        vec![root]
    } else {
        root.children
    }
}

/// Interprets `nodes` in order. The active shader starts unset and is cleared
/// again once the nodes are consumed.
pub fn build_scene(nodes: &[Node], context: &mut ParseContext) -> Scene {
    context.active_layout = None;
    let mut scene = Scene::new();
    for node in nodes {
        let tag = node.tag();
        if let Some(primitive) = PRIMITIVES.get(tag.as_str()) {
            match primitive(node, context.vertex_spec()) {
                Ok(mut mesh) => {
                    if let Some(name) = node.string(&["name", "id"]) {
                        mesh.name = name.to_string();
                    }
                    apply_mesh_children(node, &mut mesh);
                    scene.add_mesh(mesh);
                }
                Err(e) => log::warn!("Skipping <{}>: {}", node.name, e),
            }
        } else if let Some(object) = OBJECTS.get(tag.as_str()) {
            match object(node, context) {
                Ok(SceneObject::Shader(mut shader)) => {
                    apply_shader_children(node, &mut shader);
                    context.active_layout = Some(Arc::clone(shader.layout()));
                    if scene.set_shader(shader).is_some() {
                        log::debug!("<{}> replaces the previous shader", node.name);
                    }
                }
                Ok(SceneObject::Camera(mut camera)) => {
                    for child in &node.children {
                        match OBJECT_MODIFIERS.get(child.tag().as_str()) {
                            Some(modify) => modify(child, &mut camera.transform),
                            None => log::debug!("Ignoring <{}> inside <{}>", child.name, node.name),
                        }
                    }
                    scene.set_camera(camera);
                }
                Err(e) => log::warn!("Skipping <{}>: {}", node.name, e),
            }
        } else {
            log::debug!("Ignoring unknown node <{}>", node.name);
        }
    }
    context.active_layout = None;
    scene
}

fn apply_mesh_children(node: &Node, mesh: &mut Mesh) {
    for child in &node.children {
        let tag = child.tag();
        let mesh_modifier = MESH_MODIFIERS.get(tag.as_str());
        let object_modifier = OBJECT_MODIFIERS.get(tag.as_str());
        if let Some(modify) = mesh_modifier {
            if let Err(e) = modify(child, mesh) {
                log::warn!("<{}> on <{}> had no effect: {}", child.name, node.name, e);
            }
        }
        if let Some(modify) = object_modifier {
            modify(child, &mut mesh.transform);
        }
        if mesh_modifier.is_none() && object_modifier.is_none() {
            log::debug!("Ignoring <{}> inside <{}>", child.name, node.name);
        }
    }
}

fn apply_shader_children(node: &Node, shader: &mut Shader) {
    for child in &node.children {
        match SHADER_MODIFIERS.get(child.tag().as_str()) {
            Some(modify) => {
                if let Err(e) = modify(child, shader) {
                    log::warn!("<{}> on <{}> had no effect: {}", child.name, node.name, e);
                }
            }
            None => log::debug!("Ignoring <{}> inside <{}>", child.name, node.name),
        }
    }
}

fn sector_count(node: &Node) -> Result<u32, GeometryError> {
    let count = node.int(SECTOR_COUNT, DEFAULT_SECTOR_COUNT);
    u32::try_from(count).map_err(|_| GeometryError::invalid("sector_count", format!("{count} is not a valid count")))
}

fn primitive_box(node: &Node, spec: VertexSpec<'_>) -> Result<Mesh, GeometryError> {
    let width = node.float(&["w", "x", "width"], 1.0);
    let depth = node.float(&["d", "z", "depth"], 1.0);
    let height = node.float(&["h", "y", "height"], 1.0);
    create_box(width, height, depth, spec)
}

fn primitive_plane(node: &Node, spec: VertexSpec<'_>) -> Result<Mesh, GeometryError> {
    let width = node.float(&["w", "width"], 1.0);
    let height = node.float(&["h", "height"], 1.0);
    create_plane(width, height, spec)
}

fn primitive_cylinder(node: &Node, spec: VertexSpec<'_>) -> Result<Mesh, GeometryError> {
    let radius = node.float(&["r", "radius"], 1.0);
    let height = node.float(&["h", "height"], 1.0);
    create_cylinder(radius, height, sector_count(node)?, spec)
}

fn primitive_cone(node: &Node, spec: VertexSpec<'_>) -> Result<Mesh, GeometryError> {
    let radius = node.float(&["r", "radius"], 1.0);
    let height = node.float(&["h", "height"], 1.0);
    create_cone(radius, height, sector_count(node)?, spec)
}

fn primitive_gear(node: &Node, spec: VertexSpec<'_>) -> Result<Mesh, GeometryError> {
    let defaults = GearParams::default();
    let count = |keys: &[&str], default: u32, name: &'static str| {
        let value = node.int(keys, i64::from(default));
        u32::try_from(value).map_err(|_| GeometryError::invalid(name, format!("{value} is not a valid count")))
    };
    let params = GearParams {
        tooth_count: count(&["toothCount", "teeth", "tc"], defaults.tooth_count, "tooth_count")?,
        resolution: count(&["resolution", "sectorCount", "n"], defaults.resolution, "resolution")?,
        inner_radius: node.float(&["innerRadius", "ir"], defaults.inner_radius),
        outer_radius: node.float(&["outerRadius", "or", "r"], defaults.outer_radius),
        height: node.float(&["h", "height"], defaults.height),
        tooth_height: node.float(&["toothHeight", "th"], defaults.tooth_height),
        tooth_width: node.float(&["toothWidth", "tw"], defaults.tooth_width),
    };
    create_gear(&params, spec)
}

fn xyz(node: &Node, default: f32) -> Vec3 {
    Vec3::new(
        node.float(&["x"], default),
        node.float(&["y"], default),
        node.float(&["z"], default),
    )
}

/// Fills a named attribute when the mesh follows a shader layout, otherwise
/// the fixed offset of the default vertex format.
fn fill_vec3(mesh: &mut Mesh, name: &str, fallback_offset: usize, value: Vec3) -> Result<(), DocumentError> {
    if mesh.layout().is_some() {
        mesh.fill_attribute(name, value)?;
    } else {
        mesh.fill_offset(fallback_offset, value)?;
    }
    Ok(())
}

fn modify_color(node: &Node, mesh: &mut Mesh) -> Result<(), DocumentError> {
    let color = Vec3::new(
        node.float(&["r", "red"], 1.0),
        node.float(&["g", "green"], 1.0),
        node.float(&["b", "blue"], 1.0),
    );
    fill_vec3(mesh, "color", DEFAULT_COLOR_OFFSET, color)
}

fn modify_normal(node: &Node, mesh: &mut Mesh) -> Result<(), DocumentError> {
    fill_vec3(mesh, "normal", DEFAULT_NORMAL_OFFSET, xyz(node, 0.0))
}

/// Components from a `value` list, or from separate `x`/`y`/`z`/`w` properties.
fn components(node: &Node) -> Result<Vec<f32>, DocumentError> {
    if let Some(list) = node.floats("value") {
        return list;
    }
    Ok(["x", "y", "z", "w"]
        .iter()
        .map(|&key| node.float(&[key], 0.0))
        .collect())
}

fn declared_type(node: &Node, declared: Option<AttributeType>) -> Result<AttributeType, DocumentError> {
    match node.string(&["type"]) {
        Some(name) => AttributeType::from_name(name)
            .ok_or_else(|| DocumentError::invalid_node(&node.name, format!("unknown type {name:?}"))),
        None => declared.ok_or_else(|| DocumentError::invalid_node(&node.name, "no type given or declared")),
    }
}

/// `<set name=".." type=".." value=".."/>` on a mesh. Writes every vertex, or
/// only vertex `index` when given.
fn modify_set(node: &Node, mesh: &mut Mesh) -> Result<(), DocumentError> {
    let name = node
        .string(&["name"])
        .ok_or_else(|| DocumentError::invalid_node(&node.name, "missing name"))?;
    let declared = mesh.layout().and_then(|layout| layout.attribute(name)).map(|a| a.ty);
    let ty = declared_type(node, declared)?;
    let value = VertexValue::from_components(ty, &components(node)?)
        .ok_or_else(|| DocumentError::invalid_node(&node.name, format!("{ty} is not a per-vertex type")))?;

    if node.has(&["index", "i"]) {
        let index = node.int(&["index", "i"], 0);
        let index = usize::try_from(index)
            .map_err(|_| DocumentError::invalid_node(&node.name, format!("bad vertex index {index}")))?;
        mesh.set_attribute(index, name, value)?;
    } else {
        mesh.fill_attribute(name, value)?;
    }
    Ok(())
}

fn modify_translate(node: &Node, transform: &mut Transform) {
    transform.translate(xyz(node, 0.0));
}

/// Euler angles in radians.
fn modify_rotate(node: &Node, transform: &mut Transform) {
    transform.rotate_euler(xyz(node, 0.0));
}

fn modify_scale(node: &Node, transform: &mut Transform) {
    transform.scale_by(xyz(node, 1.0));
}

fn modify_look_at(node: &Node, transform: &mut Transform) {
    transform.look_at(xyz(node, 0.0));
}

fn object_shader(node: &Node, context: &ParseContext) -> Result<SceneObject, DocumentError> {
    let vertex = node
        .string(&["vertex", "vert", "vs"])
        .ok_or_else(|| DocumentError::invalid_node(&node.name, "missing vertex shader path"))?;
    let fragment = node
        .string(&["fragment", "frag", "fs"])
        .ok_or_else(|| DocumentError::invalid_node(&node.name, "missing fragment shader path"))?;
    let shader = Shader::load(context.resolve(vertex), context.resolve(fragment))
        .map_err(|e| DocumentError::invalid_node(&node.name, format!("{e:#}")))?;
    Ok(SceneObject::Shader(shader))
}

fn object_camera(node: &Node, _context: &ParseContext) -> Result<SceneObject, DocumentError> {
    let projection = match node.string(&["type"]) {
        Some(tag) => Projection::from_tag(tag).unwrap_or_else(|| {
            log::warn!("<{}> has unknown type {:?}, using perspective", node.name, tag);
            Projection::default()
        }),
        None => Projection::default(),
    };
    let projection = match projection {
        Projection::Perspective(d) => Projection::Perspective(Perspective {
            fov: node.float(&["fov"], d.fov),
            aspect: node.float(&["aspect"], d.aspect),
            near: node.float(&["near"], d.near),
            far: node.float(&["far"], d.far),
        }),
        Projection::Orthographic(d) => Projection::Orthographic(Orthographic {
            left: node.float(&["left"], d.left),
            right: node.float(&["right"], d.right),
            bottom: node.float(&["bottom"], d.bottom),
            top: node.float(&["top"], d.top),
            near: node.float(&["near"], d.near),
            far: node.float(&["far"], d.far),
        }),
    };
    Ok(SceneObject::Camera(Camera::new(projection)))
}

/// `<set name=".." type=".." value=".."/>` inside a shader.
fn shader_set(node: &Node, shader: &mut Shader) -> Result<(), DocumentError> {
    let name = node
        .string(&["name"])
        .ok_or_else(|| DocumentError::invalid_node(&node.name, "missing name"))?;
    let ty = declared_type(node, shader.layout().uniform(name))?;
    let value = UniformValue::from_components(ty, &components(node)?);
    shader.set(name, value)?;
    Ok(())
}

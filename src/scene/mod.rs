pub mod camera;
pub mod transform;
#[cfg(test)]
mod tests;

pub use camera::{Camera, Orthographic, Perspective, Projection, UniformNames};
pub use transform::Transform;

use crate::model::Mesh;
use crate::renderer::RenderBackend;
use crate::shader::Shader;

/// Meshes plus the shader and camera they are drawn with.
///
/// [`Scene::update`] flattens every mesh into one interleaved vertex buffer
/// and one index buffer; [`Scene::draw`] hands those to a backend.
#[derive(Debug, Default)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    shader: Option<Shader>,
    camera: Option<Camera>,
    uniform_names: UniformNames,
    vertices: Vec<f32>,
    indices: Vec<u32>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    /// Binds `shader`, returning the one it replaces.
    pub fn set_shader(&mut self, shader: Shader) -> Option<Shader> {
        self.shader.replace(shader)
    }

    pub fn shader(&self) -> Option<&Shader> {
        self.shader.as_ref()
    }

    pub fn shader_mut(&mut self) -> Option<&mut Shader> {
        self.shader.as_mut()
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn set_uniform_names(&mut self, names: UniformNames) {
        self.uniform_names = names;
    }

    /// Flattened vertex data from the last [`Scene::update`].
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Flattened, rebased index data from the last [`Scene::update`].
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Rebuilds the flattened buffers and refreshes the camera uniforms.
    ///
    /// Each mesh's indices are shifted by one past the largest index already
    /// in the combined list, not by the number of vertices appended so far.
    pub fn update(&mut self) {
        self.vertices.clear();
        self.indices.clear();

        let stride = self.meshes.first().map(Mesh::vertex_size);
        let mut offset = 0u32;
        for mesh in &self.meshes {
            if Some(mesh.vertex_size()) != stride {
                log::warn!(
                    "Mesh {:?} has {} floats per vertex, scene buffer uses {:?}",
                    mesh.name,
                    mesh.vertex_size(),
                    stride
                );
            }
            self.vertices.extend(mesh.transformed_vertices());
            let start = self.indices.len();
            self.indices.extend(mesh.indices().iter().map(|&i| i + offset));
            // Appended values are all >= offset, so the new tail holds the running max.
            if let Some(max) = self.indices[start..].iter().max() {
                offset = max + 1;
            }
        }
        log::debug!(
            "Scene flattened: {} meshes, {} floats, {} indices",
            self.meshes.len(),
            self.vertices.len(),
            self.indices.len()
        );

        if let (Some(shader), Some(camera)) = (self.shader.as_mut(), self.camera.as_ref()) {
            camera.apply_uniforms(shader, &self.uniform_names);
        }
    }

    /// Uploads the flattened buffers and issues one indexed draw. Does nothing
    /// without a shader or when the shader fails to compile.
    pub fn draw(&mut self, backend: &mut dyn RenderBackend) {
        let Some(shader) = self.shader.as_mut() else {
            return;
        };
        let Some(program) = shader.compile(backend) else {
            return;
        };
        let desc = shader.layout().vertex_buffer_desc();
        backend.upload(
            desc.layout(),
            bytemuck::cast_slice(&self.vertices),
            bytemuck::cast_slice(&self.indices),
        );
        shader.flush_uniforms(backend);
        backend.draw_indexed(program, self.indices.len() as u32);
    }

    /// Frees the backend program owned by this scene's shader.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(shader) = self.shader.as_mut() {
            shader.release(backend);
        }
    }
}

use glam::{Mat4, Vec3};

use crate::shader::Shader;

use super::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            fov: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Perspective {
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orthographic {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Orthographic {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Orthographic {
    pub fn matrix(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective(Perspective),
    Orthographic(Orthographic),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective(Perspective::default())
    }
}

impl Projection {
    /// Parses a projection tag: `perspective`/`p` or `orthographic`/`o`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "perspective" | "p" => Some(Projection::Perspective(Perspective::default())),
            "orthographic" | "o" => Some(Projection::Orthographic(Orthographic::default())),
            _ => None,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match self {
            Projection::Perspective(p) => p.matrix(),
            Projection::Orthographic(o) => o.matrix(),
        }
    }
}

/// Uniform names a camera writes into a shader.
#[derive(Debug, Clone)]
pub struct UniformNames {
    pub model: String,
    pub view: String,
    pub projection: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            model: "model".to_string(),
            view: "view".to_string(),
            projection: "projection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub transform: Transform,
    pub projection: Projection,
}

impl Camera {
    pub fn new(projection: Projection) -> Self {
        Self {
            transform: Transform::new(),
            projection,
        }
    }

    pub fn perspective(perspective: Perspective) -> Self {
        Self::new(Projection::Perspective(perspective))
    }

    pub fn orthographic(orthographic: Orthographic) -> Self {
        Self::new(Projection::Orthographic(orthographic))
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.transform.position;
        Mat4::look_at_rh(eye, eye + self.transform.front(), self.transform.up_vector())
    }

    /// `None` unless the camera is in perspective mode.
    pub fn perspective_matrix(&self) -> Option<Mat4> {
        match &self.projection {
            Projection::Perspective(p) => Some(p.matrix()),
            Projection::Orthographic(_) => None,
        }
    }

    /// `None` unless the camera is in orthographic mode.
    pub fn orthographic_matrix(&self) -> Option<Mat4> {
        match &self.projection {
            Projection::Orthographic(o) => Some(o.matrix()),
            Projection::Perspective(_) => None,
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Scene geometry is already in world space when flattened.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        match &mut self.projection {
            Projection::Perspective(p) => p.aspect = aspect,
            Projection::Orthographic(_) => log::debug!("Ignoring aspect {} for an orthographic camera", aspect),
        }
    }

    pub fn set_fov(&mut self, fov: f32) {
        if let Projection::Perspective(p) = &mut self.projection {
            p.fov = fov;
        }
    }

    /// Near and far planes of whichever projection is active.
    pub fn set_planes(&mut self, near: f32, far: f32) {
        match &mut self.projection {
            Projection::Perspective(p) => (p.near, p.far) = (near, far),
            Projection::Orthographic(o) => (o.near, o.far) = (near, far),
        }
    }

    pub fn set_bounds(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        if let Projection::Orthographic(o) = &mut self.projection {
            (o.left, o.right, o.bottom, o.top) = (left, right, bottom, top);
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.transform.look_at(target);
    }

    /// Writes model, view and projection matrices into `shader`. Names the
    /// shader does not declare are skipped.
    pub fn apply_uniforms(&self, shader: &mut Shader, names: &UniformNames) {
        let matrices = [
            (&names.model, self.model_matrix()),
            (&names.view, self.view_matrix()),
            (&names.projection, self.projection_matrix()),
        ];
        for (name, matrix) in matrices {
            if let Err(e) = shader.set(name, matrix) {
                log::debug!("Camera uniform skipped: {}", e);
            }
        }
    }
}

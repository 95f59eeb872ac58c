use glam::{Mat3, Mat4, Quat, Vec3};

/// Position, orientation and scale of anything placed in a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Always a unit quaternion.
    pub rotation: Quat,
    pub scale: Vec3,
    pub up: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            up: Vec3::Y,
        }
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Applies `delta` after the current rotation.
    pub fn rotate(&mut self, delta: Quat) {
        self.rotation = (delta * self.rotation).normalize();
    }

    /// Rotates by Euler angles in radians, X first, then Y, then Z.
    pub fn rotate_euler(&mut self, angles: Vec3) {
        let delta = Quat::from_rotation_z(angles.z) * Quat::from_rotation_y(angles.y) * Quat::from_rotation_x(angles.x);
        self.rotate(delta);
    }

    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
    }

    /// Turns the front axis toward `target`. Does nothing when the target is
    /// the current position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(direction) = (target - self.position).try_normalize() else {
            return;
        };
        let up = if direction.cross(self.up).length_squared() < 1e-8 {
            direction.any_orthonormal_vector()
        } else {
            self.up
        };
        let right = direction.cross(up).normalize();
        let up = right.cross(direction);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -direction)).normalize();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up.normalize_or_zero();
    }

    /// Unit vector the object faces (-Z in local space).
    pub fn front(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up_vector(&self) -> Vec3 {
        self.rotation * self.up
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

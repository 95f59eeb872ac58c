use super::*;
use crate::model::{create_box, Mesh};
use crate::renderer::HeadlessBackend;
use crate::shader::{Shader, UniformValue};
use approx::assert_abs_diff_eq;
use glam::{Mat4, Quat, Vec3, Vec4Swizzles};
use std::f32::consts::FRAC_PI_2;

const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 position;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
void main() { gl_Position = projection * view * model * vec4(position, 1.0); }
";

const FRAGMENT: &str = "#version 330 core
out vec4 FragColor;
void main() { FragColor = vec4(1.0); }
";

fn triangle_mesh(vertex_count: usize, indices: &[u32]) -> Mesh {
    Mesh::from_parts(vec![0.0; vertex_count * 3], indices.to_vec(), 3).unwrap()
}

fn assert_mat4_eq(a: Mat4, b: Mat4) {
    for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-5);
    }
}

#[test]
fn test_transform_new() {
    let transform = Transform::new();
    assert_eq!(transform.position, Vec3::ZERO);
    assert_eq!(transform.rotation, Quat::IDENTITY);
    assert_eq!(transform.scale, Vec3::ONE);
    assert_eq!(transform.up, Vec3::Y);
}

#[test]
fn test_translate_is_additive() {
    let t1 = Vec3::new(1.0, -2.0, 0.5);
    let t2 = Vec3::new(-3.0, 4.0, 2.5);

    let mut stepwise = Transform::new();
    stepwise.translate(t1);
    stepwise.translate(t2);

    let mut combined = Transform::new();
    combined.translate(t1 + t2);

    assert_abs_diff_eq!(stepwise.position.x, combined.position.x, epsilon = 1e-6);
    assert_abs_diff_eq!(stepwise.position.y, combined.position.y, epsilon = 1e-6);
    assert_abs_diff_eq!(stepwise.position.z, combined.position.z, epsilon = 1e-6);
}

#[test]
fn test_rotation_order_matters() {
    let a = Quat::from_rotation_x(FRAC_PI_2);
    let b = Quat::from_rotation_y(FRAC_PI_2);

    let mut ab = Transform::new();
    ab.rotate(a);
    ab.rotate(b);

    let mut ba = Transform::new();
    ba.rotate(b);
    ba.rotate(a);

    let probe = Vec3::new(0.0, 0.0, 1.0);
    let diff = (ab.rotation * probe - ba.rotation * probe).length();
    assert!(diff > 0.5, "rotations about X and Y should not commute");
    assert!(ab.rotation.is_normalized());
}

#[test]
fn test_rotate_euler_applies_x_first() {
    let mut transform = Transform::new();
    transform.rotate_euler(Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0));

    // +Y goes to +Z about X, then +Z goes to +X about Y.
    let rotated = transform.rotation * Vec3::Y;
    assert_abs_diff_eq!(rotated.x, 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(rotated.y, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(rotated.z, 0.0, epsilon = 1e-5);
}

#[test]
fn test_scale_is_multiplicative() {
    let mut transform = Transform::new();
    transform.scale_by(Vec3::new(2.0, 3.0, 4.0));
    transform.scale_by(Vec3::splat(0.5));
    assert_eq!(transform.scale, Vec3::new(1.0, 1.5, 2.0));
}

#[test]
fn test_look_at_faces_target() {
    let mut transform = Transform::new();
    transform.set_position(Vec3::new(0.0, 0.0, 5.0));
    transform.look_at(Vec3::new(5.0, 0.0, 5.0));

    let front = transform.front();
    assert_abs_diff_eq!(front.x, 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(front.z, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(transform.up_vector().y, 1.0, epsilon = 1e-5);

    let before = transform.rotation;
    transform.look_at(transform.position);
    assert_eq!(transform.rotation, before);
}

#[test]
fn test_look_at_straight_up() {
    let mut transform = Transform::new();
    transform.look_at(Vec3::new(0.0, 10.0, 0.0));
    let front = transform.front();
    assert_abs_diff_eq!(front.y, 1.0, epsilon = 1e-5);
    assert!(transform.rotation.is_normalized());
}

#[test]
fn test_model_matrix() {
    let mut transform = Transform::new();
    transform.set_position(Vec3::new(1.0, 2.0, 3.0));
    transform.set_scale(Vec3::splat(2.0));
    let matrix = transform.model_matrix();
    assert_eq!(matrix.col(3).xyz(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(matrix.col(0).x, 2.0);
    assert_eq!(matrix.col(1).y, 2.0);
    assert_eq!(matrix.col(2).z, 2.0);
}

#[test]
fn test_orthographic_defaults_match_formula() {
    let camera = Camera::new(Projection::from_tag("orthographic").unwrap());
    let Projection::Orthographic(ortho) = camera.projection else {
        panic!("expected an orthographic camera");
    };
    assert_eq!(ortho, Orthographic::default());
    assert_eq!((ortho.left, ortho.right, ortho.bottom, ortho.top), (-1.0, 1.0, -1.0, 1.0));

    let (l, r, b, t, n, f) = (-1.0f32, 1.0f32, -1.0f32, 1.0f32, 0.1f32, 100.0f32);
    let expected = Mat4::from_cols_array(&[
        2.0 / (r - l), 0.0, 0.0, 0.0,
        0.0, 2.0 / (t - b), 0.0, 0.0,
        0.0, 0.0, -2.0 / (f - n), 0.0,
        -(r + l) / (r - l), -(t + b) / (t - b), -(f + n) / (f - n), 1.0,
    ]);
    assert_mat4_eq(camera.orthographic_matrix().unwrap(), expected);
    assert_mat4_eq(camera.projection_matrix(), expected);
    assert!(camera.perspective_matrix().is_none());
}

#[test]
fn test_perspective_defaults() {
    let camera = Camera::default();
    assert_eq!(camera.projection, Projection::Perspective(Perspective::default()));
    assert_mat4_eq(
        camera.perspective_matrix().unwrap(),
        Mat4::perspective_rh_gl(45f32.to_radians(), 1.0, 0.1, 100.0),
    );
    assert_eq!(camera.model_matrix(), Mat4::IDENTITY);
}

#[test]
fn test_projection_tags() {
    assert!(matches!(Projection::from_tag("p"), Some(Projection::Perspective(_))));
    assert!(matches!(Projection::from_tag("O"), Some(Projection::Orthographic(_))));
    assert_eq!(Projection::from_tag("fisheye"), None);
}

#[test]
fn test_camera_setters_follow_mode() {
    let mut camera = Camera::default();
    camera.set_aspect(16.0 / 9.0);
    camera.set_bounds(-2.0, 2.0, -2.0, 2.0);
    camera.set_planes(1.0, 50.0);
    let Projection::Perspective(p) = camera.projection else {
        panic!("expected perspective");
    };
    assert_eq!(p.aspect, 16.0 / 9.0);
    assert_eq!((p.near, p.far), (1.0, 50.0));
}

#[test]
fn test_view_matrix_moves_eye_to_origin() {
    let mut camera = Camera::default();
    camera.transform.set_position(Vec3::new(0.0, 0.0, 5.0));
    let eye = camera.view_matrix().transform_point3(Vec3::new(0.0, 0.0, 5.0));
    assert_abs_diff_eq!(eye.length(), 0.0, epsilon = 1e-5);
    let ahead = camera.view_matrix().transform_point3(Vec3::ZERO);
    assert_abs_diff_eq!(ahead.z, -5.0, epsilon = 1e-5);
}

#[test]
fn test_update_rebases_by_max_index() {
    let mut scene = Scene::new();
    // Six vertices, but the highest referenced index is 3.
    scene.add_mesh(triangle_mesh(6, &[0, 1, 2, 1, 2, 3]));
    scene.add_mesh(triangle_mesh(3, &[0, 1, 2]));
    scene.update();

    assert_eq!(scene.indices(), &[0, 1, 2, 1, 2, 3, 4, 5, 6]);
    assert_eq!(scene.vertices().len(), 9 * 3);
}

#[test]
fn test_update_rebases_after_offset_indices() {
    let mut scene = Scene::new();
    scene.add_mesh(triangle_mesh(5, &[2, 3, 4]));
    scene.add_mesh(triangle_mesh(3, &[]));
    scene.add_mesh(triangle_mesh(3, &[0, 1, 2]));
    scene.update();

    assert_eq!(scene.indices(), &[2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_update_is_repeatable() {
    let mut scene = Scene::new();
    scene.add_mesh(create_box(1.0, 1.0, 1.0, 3).unwrap());
    scene.update();
    let first = scene.indices().to_vec();
    scene.update();
    assert_eq!(scene.indices(), first.as_slice());
}

#[test]
fn test_update_uses_transformed_vertices() {
    let mut mesh = create_box(1.0, 1.0, 1.0, 3).unwrap();
    mesh.transform.translate(Vec3::X * 10.0);
    let mut scene = Scene::new();
    scene.add_mesh(mesh);
    scene.update();

    assert_abs_diff_eq!(scene.vertices()[0], 9.5, epsilon = 1e-6);
    assert_abs_diff_eq!(scene.meshes[0].raw_vertices()[0], -0.5, epsilon = 1e-6);
}

#[test]
fn test_update_applies_camera_uniforms() {
    let mut scene = Scene::new();
    scene.set_shader(Shader::from_sources(VERTEX, FRAGMENT));
    scene.set_camera(Camera::orthographic(Orthographic::default()));
    scene.update();

    let shader = scene.shader().unwrap();
    let projection: Mat4 = shader.get("projection").unwrap();
    assert_mat4_eq(projection, Orthographic::default().matrix());
    assert_eq!(shader.get::<Mat4>("model"), Some(Mat4::IDENTITY));
    assert!(shader.get::<Mat4>("view").is_some());
}

#[test]
fn test_draw_without_shader_is_noop() {
    let mut scene = Scene::new();
    scene.add_mesh(create_box(1.0, 1.0, 1.0, 3).unwrap());
    scene.update();

    let mut backend = HeadlessBackend::new();
    scene.draw(&mut backend);
    assert!(backend.uploads.is_empty());
    assert!(backend.draws.is_empty());
}

#[test]
fn test_draw_uploads_and_draws_once() {
    let shader = Shader::from_sources(VERTEX, FRAGMENT);
    let mut scene = Scene::new();
    scene.add_mesh(create_box(1.0, 1.0, 1.0, &shader).unwrap());
    scene.add_mesh(create_box(2.0, 2.0, 2.0, &shader).unwrap());
    scene.set_shader(shader);
    scene.set_camera(Camera::default());
    scene.update();

    let mut backend = HeadlessBackend::new();
    scene.draw(&mut backend);

    assert_eq!(backend.uploads.len(), 1);
    let upload = &backend.uploads[0];
    assert_eq!(upload.array_stride, 12);
    assert_eq!(upload.vertex_bytes, 16 * 3 * 4);
    assert_eq!(upload.index_bytes, 72 * 4);

    let program = scene.shader().unwrap().program().unwrap();
    assert_eq!(backend.draws, vec![(program, 72)]);
    assert!(matches!(
        backend.uniforms.get(&(program, "projection".to_string())),
        Some(UniformValue::Mat4(_))
    ));

    scene.release(&mut backend);
    assert!(backend.live_programs.is_empty());
}

#[test_log::test]
fn test_draw_skips_failed_shader() {
    let mut scene = Scene::new();
    scene.set_shader(Shader::from_sources("void main() {", FRAGMENT));
    scene.update();

    let mut backend = HeadlessBackend::new();
    scene.draw(&mut backend);
    scene.draw(&mut backend);
    assert!(backend.draws.is_empty());
    assert!(scene.shader().unwrap().program().is_none());
}

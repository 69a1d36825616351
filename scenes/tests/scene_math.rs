use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};
use learngl_scenes::{
  camera::FreeLook,
  model_loading::{attach_flashlight, light_rig},
  outline::Outline,
  stencil_outline::outlined_cubes,
  transform::{normal_matrix, Transform},
  InputAction,
};

fn to_clip(free_look: &FreeLook, world: Vector3<f32>) -> Vector4<f32> {
  free_look.projection() * free_look.view() * world.extend(1.)
}

#[test]
fn walking_towards_a_cube_brings_it_closer() {
  let mut free_look = FreeLook::default();
  let (cube, _) = outlined_cubes()[0];

  // turn right until the cube is straight ahead
  let target = cube.position - Vector3::new(0., 0., 3.);
  let yaw = target.z.atan2(target.x).to_degrees();
  let dx = (yaw - free_look.camera.yaw()) / free_look.camera.sensitivity;

  free_look.handle(&InputAction::CursorMoved { x: 0., y: 0. }, 0.);
  free_look.handle(&InputAction::CursorMoved { x: dx, y: 0. }, 0.);

  let before = to_clip(&free_look, cube.position);
  assert!(before.x.abs() / before.w < 1e-4);

  for _ in 0..10 {
    free_look.handle(&InputAction::Forward, 0.1);
  }

  let after = to_clip(&free_look, cube.position);
  assert!(after.w < before.w);
  assert!(after.x.abs() / after.w < 1e-4);
}

#[test]
fn outline_silhouette_contains_the_object() {
  for (transform, outline) in outlined_cubes().iter() {
    let expanded = outline.expanded(transform);
    let corner = Vector4::new(0.5, 0.5, 0.5, 1.);

    let object = transform.model_matrix() * corner;
    let silhouette = expanded.model_matrix() * corner;

    let from_center = |p: Vector4<f32>| (p.truncate() - transform.position).magnitude();
    assert!(from_center(silhouette) > from_center(object));
  }

  let flat = Outline::new(Vector3::new(1., 1., 1.), 0.);
  assert_eq!(flat.expanded(&Transform::default()), Transform::default());
}

#[test]
fn normals_of_stretched_cubes_stay_perpendicular() {
  let (transform, _) = outlined_cubes()[1];
  let model = transform.model_matrix();
  let normals = normal_matrix(&model);

  // a tangent of the diagonal face x + y = 1 and its normal
  let tangent = (model * Vector4::new(1., -1., 0., 0.)).truncate();
  let normal = normals * Vector3::new(1., 1., 0.);

  assert!(tangent.dot(normal).abs() < 1e-5);
  assert_eq!(normal_matrix(&Matrix4::identity()), cgmath::Matrix3::identity());
}

#[test]
fn flashlight_tracks_the_free_look_camera() {
  let mut free_look = FreeLook::default();
  let mut rig = light_rig(&free_look.camera);
  assert!(rig.fits());

  free_look.handle(&InputAction::CursorMoved { x: 0., y: 0. }, 0.);
  free_look.handle(&InputAction::CursorMoved { x: 250., y: -120. }, 0.);
  free_look.handle(&InputAction::Left, 0.5);
  attach_flashlight(&mut rig, &free_look.camera);

  let eye: Point3<f32> = free_look.camera.position;
  assert_eq!(rig.spot[0].position, Vector3::new(eye.x, eye.y, eye.z));
  assert_eq!(rig.spot[0].direction, free_look.camera.look_dir());
  assert!(free_look.camera.look_dir().y > 0.);
}

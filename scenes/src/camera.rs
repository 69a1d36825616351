//! Free-look camera driven by yaw and pitch.
//!
//! Pitch grows when the cursor moves down, and the camera looks down accordingly. Vertical moves follow the world up
//! axis and forward moves stay in the horizontal plane, whatever the pitch.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3, Zero};

use crate::{
  shared::{aspect_ratio, DEFAULT_DIMENSIONS, FAR_CLIP, NEAR_CLIP},
  InputAction,
};

pub const CAMERA_SPEED: f32 = 3.;
pub const MOUSE_SENSITIVITY: f32 = 0.1;
pub const INIT_YAW: f32 = -90.;
pub const INIT_PITCH: f32 = 0.;
pub const INIT_ZOOM: f32 = 45.;

const PITCH_LIMIT: f32 = 89.;
const MIN_ZOOM: f32 = 1.;
const MAX_ZOOM: f32 = 179.;

/// Direction of a keyboard-driven move.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CameraMovement {
  Forward,
  Backward,
  Left,
  Right,
  Up,
  Down,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
  pub position: Point3<f32>,
  look_dir: Vector3<f32>,
  right: Vector3<f32>,
  up: Vector3<f32>,
  world_up: Vector3<f32>,
  yaw: f32,
  pitch: f32,
  pub speed: f32,
  pub sensitivity: f32,
  zoom: f32,
}

impl Default for Camera {
  fn default() -> Self {
    Self::new(Point3::new(0., 0., 3.))
  }
}

impl Camera {
  /// Camera at the given position, looking down the negative Z axis.
  pub fn new(position: Point3<f32>) -> Self {
    Self::with_angles(position, Vector3::unit_y(), INIT_YAW, INIT_PITCH)
  }

  pub fn with_angles(position: Point3<f32>, world_up: Vector3<f32>, yaw: f32, pitch: f32) -> Self {
    let mut camera = Camera {
      position,
      look_dir: -Vector3::unit_z(),
      right: Vector3::unit_x(),
      up: world_up,
      world_up,
      yaw,
      pitch,
      speed: CAMERA_SPEED,
      sensitivity: MOUSE_SENSITIVITY,
      zoom: INIT_ZOOM,
    };

    camera.update_vectors();
    camera
  }

  pub fn look_dir(&self) -> Vector3<f32> {
    self.look_dir
  }

  pub fn right(&self) -> Vector3<f32> {
    self.right
  }

  pub fn up(&self) -> Vector3<f32> {
    self.up
  }

  /// Yaw, in degrees.
  pub fn yaw(&self) -> f32 {
    self.yaw
  }

  /// Pitch, in degrees.
  pub fn pitch(&self) -> f32 {
    self.pitch
  }

  /// Vertical field of view, in degrees.
  pub fn zoom(&self) -> f32 {
    self.zoom
  }

  /// World-to-view matrix.
  pub fn view(&self) -> Matrix4<f32> {
    Matrix4::look_to_rh(self.position, self.look_dir, self.up)
  }

  /// View-to-clip matrix using the zoom as vertical field of view.
  pub fn projection(&self, aspect_ratio: f32) -> Matrix4<f32> {
    perspective(Deg(self.zoom), aspect_ratio, NEAR_CLIP, FAR_CLIP)
  }

  /// Move the camera; `dt` is the frame delta time, in seconds.
  pub fn process_keyboard(&mut self, movement: CameraMovement, dt: f32) {
    let velocity = self.speed * dt;
    let horizontal = Vector3::new(self.look_dir.x, 0., self.look_dir.z);

    // looking straight up or down leaves no horizontal direction to move along
    let forward = if horizontal.magnitude2() > f32::EPSILON {
      horizontal.normalize()
    } else {
      Vector3::zero()
    };

    match movement {
      CameraMovement::Forward => self.position += forward * velocity,
      CameraMovement::Backward => self.position -= forward * velocity,
      CameraMovement::Left => self.position -= self.right * velocity,
      CameraMovement::Right => self.position += self.right * velocity,
      CameraMovement::Up => self.position += self.up * velocity,
      CameraMovement::Down => self.position -= self.up * velocity,
    }
  }

  /// Rotate the camera from a cursor offset, in pixels.
  pub fn process_mouse_movement(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
    self.yaw += dx * self.sensitivity;
    self.pitch += dy * self.sensitivity;

    if constrain_pitch {
      self.pitch = self.pitch.max(-PITCH_LIMIT).min(PITCH_LIMIT);
    }

    self.update_vectors();
  }

  pub fn process_mouse_scroll(&mut self, dy: f32) {
    self.zoom = (self.zoom - dy).max(MIN_ZOOM).min(MAX_ZOOM);
  }

  fn update_vectors(&mut self) {
    let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
    let dir = Vector3::new(yaw.cos() * pitch.cos(), -pitch.sin(), yaw.sin() * pitch.cos());

    self.look_dir = dir.normalize();
    self.right = self.look_dir.cross(self.world_up).normalize();
    self.up = self.world_up;
  }
}

/// Turns absolute cursor positions into per-event offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MouseTracker {
  last: Option<(f32, f32)>,
}

impl MouseTracker {
  /// Offset from the previous position; the very first position yields no offset.
  pub fn offset(&mut self, x: f32, y: f32) -> (f32, f32) {
    let offset = self.last.map_or((0., 0.), |(lx, ly)| (x - lx, y - ly));
    self.last = Some((x, y));
    offset
  }

  /// Forget the last position, so that the next one yields no offset again.
  pub fn reset(&mut self) {
    self.last = None;
  }
}

/// Camera driven by input actions: movement keys, cursor moves, scrolling and resizes.
#[derive(Clone, Debug, PartialEq)]
pub struct FreeLook {
  pub camera: Camera,
  mouse: MouseTracker,
  aspect_ratio: f32,
}

impl Default for FreeLook {
  fn default() -> Self {
    Self::new(Camera::default())
  }
}

impl FreeLook {
  pub fn new(camera: Camera) -> Self {
    let [width, height] = DEFAULT_DIMENSIONS;

    FreeLook {
      camera,
      mouse: MouseTracker::default(),
      aspect_ratio: aspect_ratio(width, height),
    }
  }

  pub fn aspect_ratio(&self) -> f32 {
    self.aspect_ratio
  }

  /// React to an action; `dt` is the frame delta time. Returns whether the action was consumed.
  pub fn handle(&mut self, action: &InputAction, dt: f32) -> bool {
    let movement = match *action {
      InputAction::Forward => CameraMovement::Forward,
      InputAction::Backward => CameraMovement::Backward,
      InputAction::Left => CameraMovement::Left,
      InputAction::Right => CameraMovement::Right,
      InputAction::Up => CameraMovement::Up,
      InputAction::Down => CameraMovement::Down,

      InputAction::CursorMoved { x, y } => {
        let (dx, dy) = self.mouse.offset(x, y);
        self.camera.process_mouse_movement(dx, dy, true);
        return true;
      }

      InputAction::VScroll { amount } => {
        self.camera.process_mouse_scroll(amount);
        log::debug!("zoom: {}°", self.camera.zoom());
        return true;
      }

      InputAction::Resized { width, height } => {
        self.aspect_ratio = aspect_ratio(width, height);
        return true;
      }

      _ => return false,
    };

    self.camera.process_keyboard(movement, dt);
    true
  }

  pub fn view(&self) -> Matrix4<f32> {
    self.camera.view()
  }

  pub fn projection(&self) -> Matrix4<f32> {
    self.camera.projection(self.aspect_ratio)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (a - b).magnitude() < 1e-5
  }

  #[test]
  fn initial_camera_looks_down_negative_z() {
    let camera = Camera::default();

    assert!(close(camera.look_dir(), Vector3::new(0., 0., -1.)));
    assert!(close(camera.right(), Vector3::new(1., 0., 0.)));
    assert_eq!(camera.up(), Vector3::unit_y());
    assert_eq!(camera.zoom(), INIT_ZOOM);
  }

  #[test]
  fn pitch_is_clamped() {
    let mut camera = Camera::default();
    camera.process_mouse_movement(0., 10_000., true);
    assert_eq!(camera.pitch(), 89.);

    camera.process_mouse_movement(0., -100_000., true);
    assert_eq!(camera.pitch(), -89.);

    camera.process_mouse_movement(0., -100., false);
    assert!((camera.pitch() - -99.).abs() < 1e-3);
  }

  #[test]
  fn moving_cursor_down_looks_down() {
    let mut camera = Camera::default();
    camera.process_mouse_movement(0., 100., true);

    assert!((camera.pitch() - 10.).abs() < 1e-4);
    assert!(camera.look_dir().y < 0.);
  }

  #[test]
  fn zoom_is_clamped() {
    let mut camera = Camera::default();
    camera.process_mouse_scroll(100.);
    assert_eq!(camera.zoom(), 1.);

    camera.process_mouse_scroll(-500.);
    assert_eq!(camera.zoom(), 179.);

    camera.process_mouse_scroll(134.);
    assert_eq!(camera.zoom(), 45.);
  }

  #[test]
  fn forward_stays_horizontal() {
    let mut camera = Camera::new(Point3::new(0., 0., 0.));
    camera.process_mouse_movement(0., 450., true);
    camera.process_keyboard(CameraMovement::Forward, 1.);

    assert!(camera.position.y.abs() < 1e-5);
    assert!((camera.position.z - -CAMERA_SPEED).abs() < 1e-4);
  }

  #[test]
  fn up_follows_world_up() {
    let mut camera = Camera::new(Point3::new(0., 0., 0.));
    camera.process_mouse_movement(300., 200., true);
    camera.process_keyboard(CameraMovement::Up, 0.5);

    assert!((camera.position.y - 1.5).abs() < 1e-5);
    assert!(camera.position.x.abs() < 1e-5);
  }

  #[test]
  fn strafe_then_come_back() {
    let mut camera = Camera::default();
    camera.process_keyboard(CameraMovement::Left, 0.25);
    camera.process_keyboard(CameraMovement::Right, 0.25);

    assert!((camera.position - Point3::new(0., 0., 3.)).magnitude() < 1e-5);
  }

  #[test]
  fn free_look_consumes_camera_actions() {
    let mut free_look = FreeLook::default();

    assert!(free_look.handle(&InputAction::CursorMoved { x: 400., y: 300. }, 0.));
    assert!(free_look.handle(&InputAction::CursorMoved { x: 500., y: 300. }, 0.));
    assert!((free_look.camera.yaw() - (INIT_YAW + 10.)).abs() < 1e-4);

    assert!(free_look.handle(&InputAction::VScroll { amount: 5. }, 0.));
    assert_eq!(free_look.camera.zoom(), 40.);

    assert!(free_look.handle(&InputAction::Resized { width: 1000, height: 500 }, 0.));
    assert_eq!(free_look.aspect_ratio(), 2.);

    assert!(free_look.handle(&InputAction::Up, 1.));
    assert!((free_look.camera.position.y - CAMERA_SPEED).abs() < 1e-5);

    assert!(!free_look.handle(&InputAction::MainToggle, 1.));
    assert!(!free_look.handle(&InputAction::Increase, 1.));
  }

  #[test]
  fn mouse_tracker_first_sample_is_still() {
    let mut tracker = MouseTracker::default();

    assert_eq!(tracker.offset(400., 300.), (0., 0.));
    assert_eq!(tracker.offset(410., 295.), (10., -5.));

    tracker.reset();
    assert_eq!(tracker.offset(0., 0.), (0., 0.));
  }
}

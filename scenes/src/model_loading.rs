//! A backpack model lit by several kinds of lights.
//!
//! Four point lights (shown as small white cubes), a sun shining straight down and a flashlight attached to the
//! camera. Back faces are culled.
//!
//! Move with the <forward>, <backward>, <left>, <right>, <up> and <down> actions, look around with the cursor and
//! zoom with the scroll wheel.

use cgmath::Vector3;
use luminance_front::{
  context::GraphicsContext,
  face_culling::{FaceCulling, FaceCullingMode, FaceCullingOrder},
  framebuffer::Framebuffer,
  pipeline::PipelineState,
  render_state::RenderState,
  shader::types::{Mat33, Mat44},
  tess::Tess,
  texture::Dim2,
  Backend,
};

use crate::{
  camera::{Camera, FreeLook},
  lights::{
    lit_program, render_lamps, DirectionalLight, LightRig, LitProgram, PointLight, SpotLight,
    Viewpoint, WHITE,
  },
  model::Model,
  shader::{flat_program, FlatProgram},
  shared::{new_lit_cube, FrameClock, ModelVertex, CLEAR_COLOR},
  transform::Transform,
  Features, InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

pub const BACKPACK_MODEL: &str = "backpack/backpack.obj";

pub const LIGHT_POSITIONS: [[f32; 3]; 4] = [
  [-1.3, 1., -2.5],
  [2.3, -3.3, -4.],
  [-4., 2., -12.],
  [0., 0., -3.],
];

pub const LIGHT_STRENGTH: f32 = 3.;
pub const SUN_DIRECTION: [f32; 3] = [0., -1., 0.];

/// Flashlight cutoff angles, in degrees.
pub const FLASHLIGHT_CUTOFFS: (f32, f32) = (12.5, 17.5);

/// Point lights, the sun, and a flashlight starting at the first point light and pointing where `camera` looks.
pub fn light_rig(camera: &Camera) -> LightRig {
  let point = LIGHT_POSITIONS
    .iter()
    .map(|&p| PointLight::new(Vector3::from(p), LIGHT_STRENGTH))
    .collect();

  let sun = DirectionalLight {
    color: Vector3::from(WHITE),
    strength: LIGHT_STRENGTH,
    direction: Vector3::from(SUN_DIRECTION),
  };

  let flashlight = SpotLight {
    color: Vector3::from(WHITE),
    strength: LIGHT_STRENGTH,
    position: Vector3::from(LIGHT_POSITIONS[0]),
    direction: camera.look_dir(),
    inner_cutoff: FLASHLIGHT_CUTOFFS.0,
    outer_cutoff: FLASHLIGHT_CUTOFFS.1,
  };

  LightRig {
    point,
    directional: vec![sun],
    spot: vec![flashlight],
  }
}

/// Depth test and back-face culling, counter-clockwise faces being the front ones.
pub fn culled_state() -> RenderState {
  RenderState::default().set_face_culling(FaceCulling::new(
    FaceCullingOrder::CCW,
    FaceCullingMode::Back,
  ))
}

/// Move the flashlights of `rig` to the camera.
pub fn attach_flashlight(rig: &mut LightRig, camera: &Camera) {
  for spot in &mut rig.spot {
    spot.follow(camera.position, camera.look_dir());
  }
}

pub struct LocalScene {
  lit: LitProgram,
  flat: FlatProgram,
  rig: LightRig,
  lamp: Tess<ModelVertex, u32>,
  backpack: Model,
  free_look: FreeLook,
  clock: FrameClock,
}

impl Scene for LocalScene {
  fn features() -> Features {
    Features::none().model(BACKPACK_MODEL).capture_cursor()
  }

  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, SceneError> {
    let free_look = FreeLook::default();
    let rig = light_rig(&free_look.camera);
    let lit = lit_program(context, &rig)?;
    let flat = flat_program(context)?;
    let lamp = new_lit_cube(context)?;
    let backpack = Model::load(context, platform, BACKPACK_MODEL)?;

    Ok(LocalScene {
      lit,
      flat,
      rig,
      lamp,
      backpack,
      free_look,
      clock: FrameClock::default(),
    })
  }

  fn render_frame(
    mut self,
    t: f32,
    back_buffer: Framebuffer<Dim2, (), ()>,
    actions: impl Iterator<Item = InputAction>,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> LoopFeedback<Self> {
    let dt = self.clock.tick(t);

    for action in actions {
      if let InputAction::Quit = action {
        return LoopFeedback::Exit;
      }

      self.free_look.handle(&action, dt);
    }

    attach_flashlight(&mut self.rig, &self.free_look.camera);

    let lit = &mut self.lit;
    let flat = &mut self.flat;
    let rig = &self.rig;
    let lamp = &self.lamp;
    let backpack = &mut self.backpack;
    let viewpoint = Viewpoint::new(&self.free_look);
    let render_state = culled_state();
    let placement = Transform::default();

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default().set_clear_color(CLEAR_COLOR),
        |pipeline, mut shd_gate| {
          shd_gate.shade(lit, |mut iface, uni, mut rdr_gate| {
            viewpoint.set_lit(&mut iface, uni);
            rig.upload(&mut iface, &uni.lights);

            iface.set(&uni.model, Mat44::new(placement.model_matrix()));
            iface.set(&uni.normal_mat, Mat33::new(placement.normal_matrix()));

            backpack.render(&pipeline, &mut iface, uni, &mut rdr_gate, &render_state)
          })?;

          shd_gate.shade(flat, |mut iface, uni, mut rdr_gate| {
            viewpoint.set_flat(&mut iface, uni);
            render_lamps(&mut iface, uni, &mut rdr_gate, lamp, &rig.point)
          })
        },
      )
      .assume();

    if render.is_ok() {
      LoopFeedback::Continue(self)
    } else {
      LoopFeedback::Exit
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::Point3;
  use luminance_front::depth_stencil::Comparison;

  #[test]
  fn rig_has_four_points_a_sun_and_a_flashlight() {
    let camera = Camera::default();
    let rig = light_rig(&camera);

    assert_eq!(rig.point.len(), 4);
    assert_eq!(rig.point[2].position, Vector3::new(-4., 2., -12.));
    assert!(rig.point.iter().all(|light| light.strength == 3.));

    assert_eq!(rig.directional.len(), 1);
    assert_eq!(rig.directional[0].direction, Vector3::new(0., -1., 0.));

    assert_eq!(rig.spot.len(), 1);
    assert_eq!(rig.spot[0].position, Vector3::new(-1.3, 1., -2.5));
    assert_eq!(rig.spot[0].direction, camera.look_dir());
    assert_eq!((rig.spot[0].inner_cutoff, rig.spot[0].outer_cutoff), (12.5, 17.5));
  }

  #[test]
  fn flashlight_follows_camera() {
    let mut camera = Camera::new(Point3::new(1., 2., 3.));
    camera.process_mouse_movement(100., 50., true);

    let mut rig = light_rig(&Camera::default());
    attach_flashlight(&mut rig, &camera);

    assert_eq!(rig.spot[0].position, Vector3::new(1., 2., 3.));
    assert_eq!(rig.spot[0].direction, camera.look_dir());
    assert_eq!(rig.point[0].position, Vector3::new(-1.3, 1., -2.5));
  }

  #[test]
  fn back_faces_are_culled() {
    let state = culled_state();

    assert_eq!(
      state.face_culling(),
      Some(FaceCulling::new(FaceCullingOrder::CCW, FaceCullingMode::Back))
    );
    assert_eq!(state.depth_test(), RenderState::default().depth_test());
    assert_eq!(RenderState::default().depth_test(), Some(Comparison::Less));
  }
}

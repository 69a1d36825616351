//! The lit backpack scene, with outlined objects.
//!
//! Two stretched cubes and the backpack get a colored rim drawn with the stencil buffer; outlines show through
//! whatever stands in front of them.
//!
//! Move with the <forward>, <backward>, <left>, <right>, <up> and <down> actions, look around with the cursor and
//! zoom with the scroll wheel.

use cgmath::Vector3;
use luminance_front::{
  context::GraphicsContext,
  framebuffer::Framebuffer,
  pipeline::PipelineState,
  shader::types::{Mat33, Mat44, Vec3},
  tess::Tess,
  texture::Dim2,
  Backend,
};

use crate::{
  camera::FreeLook,
  lights::{lit_program, render_lamps, LightRig, LitProgram, Viewpoint},
  model::Model,
  model_loading::{attach_flashlight, culled_state, light_rig, BACKPACK_MODEL},
  outline::Outline,
  shader::{flat_program, FlatProgram},
  shared::{new_lit_cube, vec3, FrameClock, ModelVertex, CLEAR_COLOR},
  transform::Transform,
  Features, InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

pub const TEAL: [f32; 3] = [0.04, 0.28, 0.26];
pub const AMBER: [f32; 3] = [0.84, 0.568, 0.06];

pub const CUBE_OUTLINE_THICKNESS: f32 = 0.1;
pub const MODEL_OUTLINE_THICKNESS: f32 = 0.01;

/// Color of the cubes, which are not textured.
pub const CUBE_COLOR: [f32; 3] = [1., 0.5, 0.31];

/// The outlined cubes, in drawing order.
pub fn outlined_cubes() -> [(Transform, Outline); 2] {
  let scale = Vector3::new(2., 2., 1.);

  [
    (
      Transform::new(Vector3::new(5., 0., 0.), scale),
      Outline::new(Vector3::from(TEAL), CUBE_OUTLINE_THICKNESS),
    ),
    (
      Transform::new(Vector3::new(5., 4., 6.), scale),
      Outline::new(Vector3::from(AMBER), CUBE_OUTLINE_THICKNESS),
    ),
  ]
}

pub fn model_outline() -> Outline {
  Outline::new(Vector3::from(AMBER), MODEL_OUTLINE_THICKNESS)
}

pub struct LocalScene {
  lit: LitProgram,
  flat: FlatProgram,
  rig: LightRig,
  cube: Tess<ModelVertex, u32>,
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
    let cube = new_lit_cube(context)?;
    let backpack = Model::load(context, platform, BACKPACK_MODEL)?;

    Ok(LocalScene {
      lit,
      flat,
      rig,
      cube,
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
    let cube = &self.cube;
    let backpack = &mut self.backpack;
    let viewpoint = Viewpoint::new(&self.free_look);
    let mark_state = Outline::mark_state(culled_state());
    let silhouette_state = Outline::silhouette_state();

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default()
          .set_clear_color(CLEAR_COLOR)
          .set_clear_stencil(0),
        |pipeline, mut shd_gate| {
          for (transform, outline) in outlined_cubes().iter() {
            shd_gate.shade(lit, |mut iface, uni, mut rdr_gate| {
              viewpoint.set_lit(&mut iface, uni);
              rig.upload(&mut iface, &uni.lights);

              iface.set(&uni.use_textures, false);
              iface.set(&uni.object_color, Vec3::from(CUBE_COLOR));
              iface.set(&uni.model, Mat44::new(transform.model_matrix()));
              iface.set(&uni.normal_mat, Mat33::new(transform.normal_matrix()));

              rdr_gate.render(&mark_state, |mut tess_gate| tess_gate.render(cube))
            })?;

            shd_gate.shade(flat, |mut iface, uni, mut rdr_gate| {
              viewpoint.set_flat(&mut iface, uni);

              let expanded = outline.expanded(transform);
              iface.set(&uni.model, Mat44::new(expanded.model_matrix()));
              iface.set(&uni.color, vec3(outline.color));

              rdr_gate.render(&silhouette_state, |mut tess_gate| {
                tess_gate.render(cube)
              })
            })?;
          }

          let placement = Transform::default();
          let outline = model_outline();

          shd_gate.shade(lit, |mut iface, uni, mut rdr_gate| {
            viewpoint.set_lit(&mut iface, uni);
            rig.upload(&mut iface, &uni.lights);

            iface.set(&uni.model, Mat44::new(placement.model_matrix()));
            iface.set(&uni.normal_mat, Mat33::new(placement.normal_matrix()));

            backpack.render(&pipeline, &mut iface, uni, &mut rdr_gate, &mark_state)
          })?;

          shd_gate.shade(flat, |mut iface, uni, mut rdr_gate| {
            viewpoint.set_flat(&mut iface, uni);

            let expanded = outline.expanded(&placement);
            iface.set(&uni.model, Mat44::new(expanded.model_matrix()));
            iface.set(&uni.color, vec3(outline.color));

            backpack.render_shape(&mut rdr_gate, &silhouette_state)
          })?;

          shd_gate.shade(flat, |mut iface, uni, mut rdr_gate| {
            viewpoint.set_flat(&mut iface, uni);
            render_lamps(&mut iface, uni, &mut rdr_gate, cube, &rig.point)
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

  #[test]
  fn cubes_are_stretched_and_outlined() {
    let cubes = outlined_cubes();

    assert_eq!(cubes[0].0.position, Vector3::new(5., 0., 0.));
    assert_eq!(cubes[1].0.position, Vector3::new(5., 4., 6.));
    assert!(cubes.iter().all(|(t, _)| t.scale == Vector3::new(2., 2., 1.)));

    assert_eq!(cubes[0].1.color, Vector3::new(0.04, 0.28, 0.26));
    assert_eq!(cubes[1].1.color, Vector3::new(0.84, 0.568, 0.06));
    assert!(cubes.iter().all(|(_, o)| o.thickness == 0.1));
  }

  #[test]
  fn model_outline_is_thin() {
    let outline = model_outline();
    let expanded = outline.expanded(&Transform::default());

    assert_eq!(outline.color, Vector3::from(AMBER));
    assert!((expanded.scale.x - 1.01).abs() < 1e-6);
  }
}

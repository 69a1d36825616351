//! Ten spinning cubes lit by a single point light.
//!
//! The light is shown as a small white cube. The cubes are plain orange at first; the <main toggle> action switches
//! to the wooden container albedo and specular maps and back.
//!
//! Move with the <forward>, <backward>, <left>, <right>, <up> and <down> actions, look around with the cursor and
//! zoom with the scroll wheel.

use cgmath::Vector3;
use luminance_front::{
  context::GraphicsContext,
  framebuffer::Framebuffer,
  pipeline::PipelineState,
  render_state::RenderState,
  shader::types::{Mat33, Mat44, Vec3},
  tess::Tess,
  texture::{Dim2, Wrap},
  Backend,
};

use crate::{
  camera::FreeLook,
  lights::{lit_program, render_lamps, LightRig, LitProgram, PointLight, Viewpoint},
  shader::{flat_program, FlatProgram},
  shared::{
    cube_positions, load_texture, new_lit_cube, FrameClock, ModelVertex, RGBTexture, CLEAR_COLOR,
  },
  transform::{normal_matrix, spinning_cube},
  Features, InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

pub const DIFFUSE_TEXTURE: &str = "container_diffuse.jpg";
pub const SPECULAR_TEXTURE: &str = "container_specular.jpg";

pub const OBJECT_COLOR: [f32; 3] = [1., 0.5, 0.31];
pub const LIGHT_POSITION: [f32; 3] = [-1.3, 1., -2.5];

/// The single light of the scene.
pub fn light_rig() -> LightRig {
  LightRig {
    point: vec![PointLight::new(Vector3::from(LIGHT_POSITION), 1.)],
    ..LightRig::default()
  }
}

pub struct LocalScene {
  lit: LitProgram,
  flat: FlatProgram,
  rig: LightRig,
  cube: Tess<ModelVertex, u32>,
  diffuse: RGBTexture,
  specular: RGBTexture,
  use_textures: bool,
  free_look: FreeLook,
  clock: FrameClock,
}

impl Scene for LocalScene {
  fn features() -> Features {
    Features::none()
      .texture(DIFFUSE_TEXTURE)
      .texture(SPECULAR_TEXTURE)
      .capture_cursor()
  }

  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, SceneError> {
    let rig = light_rig();
    let lit = lit_program(context, &rig)?;
    let flat = flat_program(context)?;
    let cube = new_lit_cube(context)?;

    let diffuse = load_texture(context, platform, DIFFUSE_TEXTURE, Wrap::Repeat)?;
    let specular = load_texture(context, platform, SPECULAR_TEXTURE, Wrap::Repeat)?;

    Ok(LocalScene {
      lit,
      flat,
      rig,
      cube,
      diffuse,
      specular,
      use_textures: false,
      free_look: FreeLook::default(),
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
      match action {
        InputAction::Quit => return LoopFeedback::Exit,

        InputAction::MainToggle => {
          self.use_textures = !self.use_textures;
          log::info!("textures: {}", self.use_textures);
        }

        action => {
          self.free_look.handle(&action, dt);
        }
      }
    }

    let lit = &mut self.lit;
    let flat = &mut self.flat;
    let rig = &self.rig;
    let cube = &self.cube;
    let diffuse = &mut self.diffuse;
    let specular = &mut self.specular;
    let use_textures = self.use_textures;
    let viewpoint = Viewpoint::new(&self.free_look);

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default().set_clear_color(CLEAR_COLOR),
        |pipeline, mut shd_gate| {
          let diffuse = pipeline.bind_texture(diffuse)?;
          let specular = pipeline.bind_texture(specular)?;

          shd_gate.shade(lit, |mut iface, uni, mut rdr_gate| {
            viewpoint.set_lit(&mut iface, uni);
            iface.set(&uni.object_color, Vec3::from(OBJECT_COLOR));
            iface.set(&uni.use_textures, use_textures);
            iface.set(&uni.albedo_map, diffuse.binding());
            iface.set(&uni.specular_map, specular.binding());
            rig.upload(&mut iface, &uni.lights);

            for (i, position) in cube_positions().enumerate() {
              let model = spinning_cube(position, i, t);
              iface.set(&uni.model, Mat44::new(model));
              iface.set(&uni.normal_mat, Mat33::new(normal_matrix(&model)));

              rdr_gate.render(&RenderState::default(), |mut tess_gate| {
                tess_gate.render(cube)
              })?;
            }

            Ok(())
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
  fn single_white_light() {
    let rig = light_rig();

    assert_eq!(rig.point.len(), 1);
    assert!(rig.directional.is_empty());
    assert!(rig.spot.is_empty());
    assert_eq!(rig.point[0].position, Vector3::new(-1.3, 1., -2.5));
    assert_eq!(rig.point[0].color, Vector3::new(1., 1., 1.));
    assert_eq!(rig.point[0].strength, 1.);
  }
}

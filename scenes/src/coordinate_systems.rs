//! Ten textured cubes spinning in front of a free-look camera.
//!
//! Move with the <forward>, <backward>, <left>, <right>, <up> and <down> actions, look around with the cursor and
//! zoom with the scroll wheel. Blend the two textures with <increase> and <decrease>.

use luminance::UniformInterface;
use luminance_front::{
  context::GraphicsContext,
  framebuffer::Framebuffer,
  pipeline::{PipelineState, TextureBinding},
  pixel::NormUnsigned,
  render_state::RenderState,
  shader::{types::Mat44, Program, Uniform},
  tess::{Mode, Tess},
  texture::{Dim2, Wrap},
  Backend,
};

use crate::{
  camera::FreeLook,
  shader::{build_program, ShaderSource},
  shared::{
    cube_positions, load_texture, textured_cube, FrameClock, Opacity, RGBTexture, Semantics,
    UvVertex, CLEAR_COLOR,
  },
  texture_mapping::{CAT_TEXTURE, PLANETS_TEXTURE},
  transform::spinning_cube,
  Features, InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

const VS: &str = include_str!("cube-vs.glsl");
const FS: &str = include_str!("cube-fs.glsl");

#[derive(Debug, UniformInterface)]
struct CubeInterface {
  projection: Uniform<Mat44<f32>>,
  view: Uniform<Mat44<f32>>,
  model: Uniform<Mat44<f32>>,
  cat: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  planets: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  opacity: Uniform<f32>,
}

pub struct LocalScene {
  program: Program<Semantics, (), CubeInterface>,
  cube: Tess<UvVertex, u32>,
  cat: RGBTexture,
  planets: RGBTexture,
  opacity: Opacity,
  free_look: FreeLook,
  clock: FrameClock,
}

impl Scene for LocalScene {
  fn features() -> Features {
    Features::none()
      .texture(CAT_TEXTURE)
      .texture(PLANETS_TEXTURE)
      .capture_cursor()
  }

  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, SceneError> {
    let program = build_program(context, "cube", &ShaderSource::new(VS, FS))?;

    let (vertices, indices) = textured_cube();
    let cube = context
      .new_tess()
      .set_vertices(&vertices[..])
      .set_indices(&indices[..])
      .set_mode(Mode::Triangle)
      .build()
      .map_err(|e| SceneError::CannotCreateTess(e.to_string()))?;

    let cat = load_texture(context, platform, CAT_TEXTURE, Wrap::Repeat)?;
    let planets = load_texture(context, platform, PLANETS_TEXTURE, Wrap::ClampToEdge)?;

    Ok(LocalScene {
      program,
      cube,
      cat,
      planets,
      opacity: Opacity::default(),
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
      if let InputAction::Quit = action {
        return LoopFeedback::Exit;
      }

      if !self.free_look.handle(&action, dt) {
        self.opacity.apply(&action);
      }
    }

    let program = &mut self.program;
    let cube = &self.cube;
    let cat = &mut self.cat;
    let planets = &mut self.planets;
    let opacity = self.opacity.get();
    let projection = Mat44::new(self.free_look.projection());
    let view = Mat44::new(self.free_look.view());

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default().set_clear_color(CLEAR_COLOR),
        |pipeline, mut shd_gate| {
          let cat = pipeline.bind_texture(cat)?;
          let planets = pipeline.bind_texture(planets)?;

          shd_gate.shade(program, |mut iface, uni, mut rdr_gate| {
            iface.set(&uni.projection, projection);
            iface.set(&uni.view, view);
            iface.set(&uni.cat, cat.binding());
            iface.set(&uni.planets, planets.binding());
            iface.set(&uni.opacity, opacity);

            for (i, position) in cube_positions().enumerate() {
              iface.set(&uni.model, Mat44::new(spinning_cube(position, i, t)));

              rdr_gate.render(&RenderState::default(), |mut tess_gate| {
                tess_gate.render(cube)
              })?;
            }

            Ok(())
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

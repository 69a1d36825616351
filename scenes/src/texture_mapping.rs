//! Two textures blended on a colored quad.
//!
//! The cat texture repeats while the planets texture clamps to its edges. Hold the <increase> and <decrease>
//! actions to blend from one to the other.

use luminance::UniformInterface;
use luminance_front::{
  context::GraphicsContext,
  framebuffer::Framebuffer,
  pipeline::{PipelineState, TextureBinding},
  pixel::NormUnsigned,
  render_state::RenderState,
  shader::{Program, Uniform},
  tess::{Mode, Tess},
  texture::{Dim2, Wrap},
  Backend,
};

use crate::{
  shader::{build_program, ShaderSource},
  shared::{
    load_texture, textured_quad, Opacity, RGBTexture, Semantics, TexturedVertex, CLEAR_COLOR,
    QUAD_INDICES,
  },
  Features, InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

const VS: &str = include_str!("textured-vs.glsl");
const FS: &str = include_str!("textured-fs.glsl");

pub const CAT_TEXTURE: &str = "cat2.jpeg";
pub const PLANETS_TEXTURE: &str = "planets.jpeg";

#[derive(Debug, UniformInterface)]
struct TextureInterface {
  cat: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  planets: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  opacity: Uniform<f32>,
}

pub struct LocalScene {
  program: Program<Semantics, (), TextureInterface>,
  quad: Tess<TexturedVertex, u32>,
  cat: RGBTexture,
  planets: RGBTexture,
  opacity: Opacity,
}

impl Scene for LocalScene {
  fn features() -> Features {
    Features::none()
      .texture(CAT_TEXTURE)
      .texture(PLANETS_TEXTURE)
  }

  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, SceneError> {
    let program = build_program(context, "textured", &ShaderSource::new(VS, FS))?;

    let quad = context
      .new_tess()
      .set_vertices(&textured_quad(0.9)[..])
      .set_indices(&QUAD_INDICES[..])
      .set_mode(Mode::Triangle)
      .build()
      .map_err(|e| SceneError::CannotCreateTess(e.to_string()))?;

    let cat = load_texture(context, platform, CAT_TEXTURE, Wrap::Repeat)?;
    let planets = load_texture(context, platform, PLANETS_TEXTURE, Wrap::ClampToEdge)?;

    Ok(LocalScene {
      program,
      quad,
      cat,
      planets,
      opacity: Opacity::default(),
    })
  }

  fn render_frame(
    mut self,
    _: f32,
    back_buffer: Framebuffer<Dim2, (), ()>,
    actions: impl Iterator<Item = InputAction>,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> LoopFeedback<Self> {
    for action in actions {
      if let InputAction::Quit = action {
        return LoopFeedback::Exit;
      }

      if self.opacity.apply(&action) {
        log::debug!("opacity: {}", self.opacity.get());
      }
    }

    let program = &mut self.program;
    let quad = &self.quad;
    let cat = &mut self.cat;
    let planets = &mut self.planets;
    let opacity = self.opacity.get();

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default().set_clear_color(CLEAR_COLOR),
        |pipeline, mut shd_gate| {
          let cat = pipeline.bind_texture(cat)?;
          let planets = pipeline.bind_texture(planets)?;

          shd_gate.shade(program, |mut iface, uni, mut rdr_gate| {
            iface.set(&uni.cat, cat.binding());
            iface.set(&uni.planets, planets.binding());
            iface.set(&uni.opacity, opacity);

            rdr_gate.render(&RenderState::default(), |mut tess_gate| {
              tess_gate.render(quad)
            })
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

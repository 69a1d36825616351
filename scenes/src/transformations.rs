//! The textured quad, drawn twice with animated transforms.
//!
//! The first copy spins slowly around the Z axis; the second one spins fast while its size pulses. The two copies
//! use complementary blend factors, driven by the <increase> and <decrease> actions.

use cgmath::{Matrix4, Rad, Vector3};
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
  shader::{build_program, ShaderSource},
  shared::{
    load_texture, textured_quad, Opacity, RGBTexture, Semantics, TexturedVertex, CLEAR_COLOR,
    QUAD_INDICES,
  },
  texture_mapping::{CAT_TEXTURE, PLANETS_TEXTURE},
  Features, InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

const VS: &str = include_str!("transform-vs.glsl");
const FS: &str = include_str!("textured-fs.glsl");

#[derive(Debug, UniformInterface)]
struct TransformInterface {
  transform: Uniform<Mat44<f32>>,
  cat: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  planets: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  opacity: Uniform<f32>,
}

/// `T(0.3, 0.3, 0.3) · Rz(t) · S(0.5)`.
pub fn slow_spin(t: f32) -> Matrix4<f32> {
  Matrix4::from_translation(Vector3::new(0.3, 0.3, 0.3))
    * Matrix4::from_angle_z(Rad(t))
    * Matrix4::from_scale(0.5)
}

/// `T(-1, 1, 0) · Rz(12t) · S(sin t, sin t, 1)`.
pub fn pulsing_spin(t: f32) -> Matrix4<f32> {
  Matrix4::from_translation(Vector3::new(-1., 1., 0.))
    * Matrix4::from_angle_z(Rad(12. * t))
    * Matrix4::from_nonuniform_scale(t.sin(), t.sin(), 1.)
}

pub struct LocalScene {
  program: Program<Semantics, (), TransformInterface>,
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
    let program = build_program(context, "transform", &ShaderSource::new(VS, FS))?;

    let quad = context
      .new_tess()
      .set_vertices(&textured_quad(0.5)[..])
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
    t: f32,
    back_buffer: Framebuffer<Dim2, (), ()>,
    actions: impl Iterator<Item = InputAction>,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> LoopFeedback<Self> {
    for action in actions {
      if let InputAction::Quit = action {
        return LoopFeedback::Exit;
      }

      self.opacity.apply(&action);
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

            let copies = [(slow_spin(t), opacity), (pulsing_spin(t), 1. - opacity)];

            for (transform, opacity) in copies.iter() {
              iface.set(&uni.transform, Mat44::new(*transform));
              iface.set(&uni.opacity, *opacity);

              rdr_gate.render(&RenderState::default(), |mut tess_gate| {
                tess_gate.render(quad)
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

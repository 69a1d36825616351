//! Randomly placed, randomly colored polygon.
//!
//! The vertices are generated from a fixed seed and triangulated as a fan. Every frame the clear color flickers
//! and the polygon alternates between filled and wireframe rendering.
//!
//! Press the <main action> to freeze (or resume) the fill / wireframe alternation.

use std::f32::consts::PI;

use luminance_front::{
  context::GraphicsContext,
  framebuffer::Framebuffer,
  pipeline::PipelineState,
  render_state::RenderState,
  shader::Program,
  tess::{Mode, Tess},
  texture::Dim2,
  Backend,
};

use crate::{
  shader::{build_program, ShaderSource},
  shared::{ColorVertex, Semantics, VertexColor, VertexPosition},
  InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

const VS: &str = include_str!("color-vs.glsl");
const FS: &str = include_str!("color-fs.glsl");

pub const NUM_VERTICES: usize = 3;
pub const SEED: u32 = 69;

/// Small xorshift generator; the scene only needs a reproducible sequence.
#[derive(Clone, Debug)]
pub struct XorShift(u32);

impl XorShift {
  pub fn new(seed: u32) -> Self {
    // zero is the only state xorshift never leaves
    XorShift(seed.max(1))
  }

  pub fn next_u32(&mut self) -> u32 {
    let mut x = self.0;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    self.0 = x;
    x
  }

  /// Uniform in [0, 1).
  pub fn next_f32(&mut self) -> f32 {
    (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
  }
}

/// Positions in [-1, 1] and colors in [0, 1].
pub fn random_attributes(rng: &mut XorShift, n: usize) -> Vec<([f32; 3], [f32; 3])> {
  (0..n)
    .map(|_| {
      let mut signed = || rng.next_f32() * 2. - 1.;
      let pos = [signed(), signed(), signed()];
      let rgb = [rng.next_f32(), rng.next_f32(), rng.next_f32()];

      (pos, rgb)
    })
    .collect()
}

pub fn random_vertices(rng: &mut XorShift, n: usize) -> Vec<ColorVertex> {
  random_attributes(rng, n)
    .into_iter()
    .map(|(pos, rgb)| ColorVertex::new(VertexPosition::new(pos), VertexColor::new(rgb)))
    .collect()
}

/// Triangles `(v, v + 1, v + 2) mod n` for `v` in `0..n - 2`.
pub fn fan_indices(n: usize) -> Vec<u32> {
  (0..n.saturating_sub(2))
    .flat_map(|v| (v..v + 3).map(move |i| (i % n) as u32))
    .collect()
}

/// Edges of a triangle list, as a line list.
pub fn wireframe_indices(triangles: &[u32]) -> Vec<u32> {
  triangles
    .chunks_exact(3)
    .flat_map(|t| vec![t[0], t[1], t[1], t[2], t[2], t[0]])
    .collect()
}

/// Channel of the flickering clear color.
pub fn flicker(frame: u64, noise: f32) -> f32 {
  (frame as f32 * 0.01 + noise).sin().max(0.)
}

/// Fill / wireframe alternation, starting with a filled frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alternation {
  wireframe: bool,
  frozen: bool,
}

impl Alternation {
  /// Whether the next frame is drawn as a wireframe.
  pub fn next_frame(&mut self) -> bool {
    let wireframe = self.wireframe;

    if !self.frozen {
      self.wireframe = !self.wireframe;
    }

    wireframe
  }

  pub fn toggle_freeze(&mut self) -> bool {
    self.frozen = !self.frozen;
    self.frozen
  }
}

pub struct LocalScene {
  program: Program<Semantics, (), ()>,
  fill: Tess<ColorVertex, u32>,
  wireframe: Tess<ColorVertex, u32>,
  rng: XorShift,
  frame: u64,
  alternation: Alternation,
}

impl Scene for LocalScene {
  fn bootstrap(
    _: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, SceneError> {
    let program = build_program(context, "color", &ShaderSource::new(VS, FS))?;

    let mut rng = XorShift::new(SEED);
    let vertices = random_vertices(&mut rng, NUM_VERTICES);
    let indices = fan_indices(NUM_VERTICES);

    let fill = context
      .new_tess()
      .set_vertices(&vertices[..])
      .set_indices(&indices[..])
      .set_mode(Mode::Triangle)
      .build()
      .map_err(|e| SceneError::CannotCreateTess(e.to_string()))?;

    let wireframe = context
      .new_tess()
      .set_vertices(&vertices[..])
      .set_indices(wireframe_indices(&indices))
      .set_mode(Mode::Line)
      .build()
      .map_err(|e| SceneError::CannotCreateTess(e.to_string()))?;

    Ok(LocalScene {
      program,
      fill,
      wireframe,
      rng,
      frame: 1,
      alternation: Alternation::default(),
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
      match action {
        InputAction::Quit => return LoopFeedback::Exit,

        InputAction::MainToggle => {
          let frozen = self.alternation.toggle_freeze();
          log::info!("fill / wireframe alternation frozen: {}", frozen);
        }

        _ => (),
      }
    }

    let frame = self.frame;
    let rng = &mut self.rng;
    let mut channel = || flicker(frame, rng.next_f32() * 2. * PI);
    let clear_color = [channel(), channel(), channel(), 1.];

    self.frame += 1;

    let program = &mut self.program;
    let tess = if self.alternation.next_frame() {
      &self.wireframe
    } else {
      &self.fill
    };

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default().set_clear_color(clear_color),
        |_, mut shd_gate| {
          shd_gate.shade(program, |_, _, mut rdr_gate| {
            rdr_gate.render(&RenderState::default(), |mut tess_gate| {
              tess_gate.render(tess)
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

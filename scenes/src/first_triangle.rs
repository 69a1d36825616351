//! A single orange triangle on a teal background.
//!
//! The smallest possible scene: a three-vertex tessellation, a program with no uniforms and one draw per frame.

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
  shared::{PlainVertex, Semantics, VertexPosition},
  InputAction, LoopFeedback, PlatformServices, Scene, SceneError,
};

const VS: &str = r#"
in vec3 position;

void main() {
  gl_Position = vec4(position, 1.);
}
"#;

const FS: &str = r#"
out vec4 frag;

void main() {
  frag = vec4(1., .5, .2, 1.);
}
"#;

const BACKGROUND: [f32; 4] = [0.2, 0.3, 0.3, 1.];

const VERTICES: [PlainVertex; 3] = [
  PlainVertex::new(VertexPosition::new([-0.5, -0.5, 0.])),
  PlainVertex::new(VertexPosition::new([0.5, -0.5, 0.])),
  PlainVertex::new(VertexPosition::new([0., 0.5, 0.])),
];

pub struct LocalScene {
  program: Program<Semantics, (), ()>,
  triangle: Tess<PlainVertex>,
}

impl Scene for LocalScene {
  fn bootstrap(
    _: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, SceneError> {
    let program = build_program(context, "triangle", &ShaderSource::new(VS, FS))?;

    let triangle = context
      .new_tess()
      .set_vertices(&VERTICES[..])
      .set_mode(Mode::Triangle)
      .build()
      .map_err(|e| SceneError::CannotCreateTess(e.to_string()))?;

    Ok(LocalScene { program, triangle })
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
    }

    let program = &mut self.program;
    let triangle = &self.triangle;

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default().set_clear_color(BACKGROUND),
        |_, mut shd_gate| {
          shd_gate.shade(program, |_, _, mut rdr_gate| {
            rdr_gate.render(&RenderState::default(), |mut tess_gate| {
              tess_gate.render(triangle)
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

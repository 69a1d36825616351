//! Shader source assembly and program building.
//!
//! Scenes keep their GLSL next to their module and pull it in with `include_str!`. Some shaders are parametrized
//! (the lit shader needs to know how many lights of each kind it receives); those parameters are injected as
//! `#define` directives before compiling.

use std::fmt;

use luminance::{shader::UniformInterface, vertex::Semantics, UniformInterface};
use luminance_front::{
  context::GraphicsContext,
  shader::{
    types::{Mat44, Vec3},
    Program, Uniform,
  },
  Backend,
};

use crate::{shared, SceneError};

const FLAT_VS: &str = include_str!("flat-vs.glsl");
const FLAT_FS: &str = include_str!("flat-fs.glsl");

/// Shader stage a directive is inserted into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
  Vertex,
  Fragment,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Stage::Vertex => f.write_str("vertex"),
      Stage::Fragment => f.write_str("fragment"),
    }
  }
}

/// Sources of a vertex + fragment program.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShaderSource {
  pub vertex: String,
  pub fragment: String,
}

impl ShaderSource {
  pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
    ShaderSource {
      vertex: vertex.into(),
      fragment: fragment.into(),
    }
  }

  fn stage_mut(&mut self, stage: Stage) -> &mut String {
    match stage {
      Stage::Vertex => &mut self.vertex,
      Stage::Fragment => &mut self.fragment,
    }
  }

  /// Insert a line right after the `#version` line of a stage, or at the top if it has none.
  pub fn insert_directive(&mut self, stage: Stage, directive: &str) -> &mut Self {
    let source = self.stage_mut(stage);

    // byte offset right past the #version line, line terminator included
    let at = source
      .split_inclusive('\n')
      .scan(0, |offset, line| {
        *offset += line.len();
        Some((*offset, line))
      })
      .find(|(_, line)| line.trim_start().starts_with("#version"))
      .map(|(end, line)| (end, line.ends_with('\n')));

    match at {
      // the #version line may be the last one, without a trailing newline
      Some((end, false)) => {
        let eol = if source.contains("\r\n") { "\r\n" } else { "\n" };
        source.insert_str(end, &format!("{}{}{}", eol, directive, eol));
      }

      Some((end, true)) => {
        let eol = if source[..end].ends_with("\r\n") { "\r\n" } else { "\n" };
        source.insert_str(end, &format!("{}{}", directive, eol));
      }

      None => source.insert_str(0, &format!("{}\n", directive)),
    }

    self
  }

  /// Insert `#define name value` into a stage.
  pub fn define(&mut self, stage: Stage, name: &str, value: impl fmt::Display) -> &mut Self {
    self.insert_directive(stage, &format!("#define {} {}", name, value))
  }
}

/// Compile and link a program, logging its warnings.
pub fn build_program<Sem, Uni>(
  context: &mut impl GraphicsContext<Backend = Backend>,
  name: &str,
  source: &ShaderSource,
) -> Result<Program<Sem, (), Uni>, SceneError>
where
  Sem: Semantics,
  Uni: UniformInterface<Backend>,
{
  let built = context
    .new_shader_program::<Sem, (), Uni>()
    .from_strings(&source.vertex, None, None, &source.fragment)
    .map_err(|e| SceneError::CannotBuildProgram {
      name: name.to_owned(),
      reason: e.to_string(),
    })?;

  for warning in &built.warnings {
    log::warn!("{} program: {}", name, warning);
  }

  log::debug!("built the {} program", name);
  Ok(built.ignore_warnings())
}

/// Uniforms of the flat program, drawing geometry with a single color.
#[derive(Debug, UniformInterface)]
pub struct FlatInterface {
  pub projection: Uniform<Mat44<f32>>,
  pub view: Uniform<Mat44<f32>>,
  pub model: Uniform<Mat44<f32>>,
  pub color: Uniform<Vec3<f32>>,
}

pub type FlatProgram = Program<shared::Semantics, (), FlatInterface>;

/// Program drawing light sources and outline silhouettes.
pub fn flat_program(
  context: &mut impl GraphicsContext<Backend = Backend>,
) -> Result<FlatProgram, SceneError> {
  build_program(context, "flat", &ShaderSource::new(FLAT_VS, FLAT_FS))
}

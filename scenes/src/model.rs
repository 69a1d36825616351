//! Meshes loaded from model files.
//!
//! [`ModelData`] is what the platform hands over: plain vertices, indices and the names of the textures each
//! mesh's material refers to. [`Model`] is its GPU counterpart, with one tessellation per mesh and the textures
//! the lit program samples.

use luminance_front::{
  context::GraphicsContext,
  pipeline::{Pipeline, PipelineError},
  render_gate::RenderGate,
  render_state::RenderState,
  shader::ProgramInterface,
  tess::{Mode, Tess},
  texture::Wrap,
  Backend,
};

use crate::{
  lights::LitInterface,
  shared::{load_texture, solid_texture, ModelVertex, RGBTexture},
  PlatformServices, SceneError,
};

/// Color of the texture standing in for a missing albedo map.
pub const FALLBACK_ALBEDO: [u8; 3] = [255, 255, 255];

/// Color of the texture standing in for a missing specular map.
pub const FALLBACK_SPECULAR: [u8; 3] = [0, 0, 0];

/// What a material texture is used for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureKind {
  Albedo,
  Specular,
  Normal,
}

/// Texture referenced by a mesh, by the name the platform knows it under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextureRef {
  pub kind: TextureKind,
  pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
  pub vertices: Vec<ModelVertex>,
  /// Triangle list.
  pub indices: Vec<u32>,
  pub textures: Vec<TextureRef>,
}

impl MeshData {
  /// Name of the first texture of a given kind.
  pub fn first_texture(&self, kind: TextureKind) -> Option<&str> {
    self
      .textures
      .iter()
      .find(|tex| tex.kind == kind)
      .map(|tex| tex.name.as_str())
  }

  /// Check that the indices describe whole triangles made of existing vertices.
  pub fn validate(&self) -> Result<(), SceneError> {
    if self.indices.len() % 3 != 0 {
      return Err(SceneError::InvalidModel(format!(
        "{} indices do not make whole triangles",
        self.indices.len()
      )));
    }

    match self
      .indices
      .iter()
      .find(|&&i| i as usize >= self.vertices.len())
    {
      Some(i) => Err(SceneError::InvalidModel(format!(
        "index {} out of {} vertices",
        i,
        self.vertices.len()
      ))),

      None => Ok(()),
    }
  }
}

/// CPU side of a model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelData {
  pub meshes: Vec<MeshData>,
}

impl ModelData {
  pub fn triangle_count(&self) -> usize {
    self.meshes.iter().map(|mesh| mesh.indices.len() / 3).sum()
  }

  /// Every texture name the meshes refer to, without duplicates, in order of first use.
  pub fn texture_names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();

    for tex in self.meshes.iter().flat_map(|mesh| &mesh.textures) {
      if !names.contains(&tex.name.as_str()) {
        names.push(&tex.name);
      }
    }

    names
  }
}

struct Mesh {
  tess: Tess<ModelVertex, u32>,
  albedo: RGBTexture,
  specular: RGBTexture,
}

/// GPU side of a model.
pub struct Model {
  meshes: Vec<Mesh>,
}

impl Model {
  /// Fetch a model from the platform and upload it.
  pub fn load(
    context: &mut impl GraphicsContext<Backend = Backend>,
    platform: &mut impl PlatformServices,
    name: &str,
  ) -> Result<Self, SceneError> {
    let data = platform
      .fetch_model(name)
      .map_err(|e| SceneError::fetch(name, e))?
      .clone();

    log::info!(
      "uploading {}: {} meshes, {} triangles",
      name,
      data.meshes.len(),
      data.triangle_count()
    );

    Self::upload(context, platform, &data)
  }

  /// Upload every mesh along with its first albedo and specular maps.
  pub fn upload(
    context: &mut impl GraphicsContext<Backend = Backend>,
    platform: &mut impl PlatformServices,
    data: &ModelData,
  ) -> Result<Self, SceneError> {
    let mut meshes = Vec::with_capacity(data.meshes.len());

    for mesh in &data.meshes {
      mesh.validate()?;

      let tess = context
        .new_tess()
        .set_vertices(&mesh.vertices[..])
        .set_indices(&mesh.indices[..])
        .set_mode(Mode::Triangle)
        .build()
        .map_err(|e| SceneError::CannotCreateTess(e.to_string()))?;

      let albedo = match mesh.first_texture(TextureKind::Albedo) {
        Some(name) => load_texture(context, platform, name, Wrap::Repeat)?,
        None => solid_texture(context, FALLBACK_ALBEDO)?,
      };

      let specular = match mesh.first_texture(TextureKind::Specular) {
        Some(name) => load_texture(context, platform, name, Wrap::Repeat)?,
        None => solid_texture(context, FALLBACK_SPECULAR)?,
      };

      meshes.push(Mesh {
        tess,
        albedo,
        specular,
      });
    }

    Ok(Model { meshes })
  }

  /// Render every mesh with the lit program; matrices and lights must already be set.
  pub fn render(
    &mut self,
    pipeline: &Pipeline,
    iface: &mut ProgramInterface,
    uni: &LitInterface,
    rdr_gate: &mut RenderGate,
    render_state: &RenderState,
  ) -> Result<(), PipelineError> {
    iface.set(&uni.use_textures, true);

    for mesh in &mut self.meshes {
      let albedo = pipeline.bind_texture(&mut mesh.albedo)?;
      let specular = pipeline.bind_texture(&mut mesh.specular)?;
      let tess = &mesh.tess;

      iface.set(&uni.albedo_map, albedo.binding());
      iface.set(&uni.specular_map, specular.binding());

      rdr_gate.render(render_state, |mut tess_gate| tess_gate.render(tess))?;
    }

    Ok(())
  }

  /// Render the meshes with whatever program is in use, without binding any texture.
  ///
  /// Used to draw silhouettes.
  pub fn render_shape(
    &self,
    rdr_gate: &mut RenderGate,
    render_state: &RenderState,
  ) -> Result<(), PipelineError> {
    for mesh in &self.meshes {
      rdr_gate.render(render_state, |mut tess_gate| tess_gate.render(&mesh.tess))?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::shared::{VertexNormal, VertexPosition, VertexUv};

  fn vertex(x: f32) -> ModelVertex {
    ModelVertex::new(
      VertexPosition::new([x, 0., 0.]),
      VertexNormal::new([0., 0., 1.]),
      VertexUv::new([0., 0.]),
    )
  }

  fn tex(kind: TextureKind, name: &str) -> TextureRef {
    TextureRef {
      kind,
      name: name.to_owned(),
    }
  }

  #[test]
  fn first_texture_of_kind() {
    let mesh = MeshData {
      textures: vec![
        tex(TextureKind::Specular, "backpack/specular.jpg"),
        tex(TextureKind::Albedo, "backpack/diffuse.jpg"),
        tex(TextureKind::Albedo, "backpack/other.jpg"),
      ],
      ..MeshData::default()
    };

    assert_eq!(
      mesh.first_texture(TextureKind::Albedo),
      Some("backpack/diffuse.jpg")
    );
    assert_eq!(
      mesh.first_texture(TextureKind::Specular),
      Some("backpack/specular.jpg")
    );
    assert_eq!(mesh.first_texture(TextureKind::Normal), None);
  }

  #[test]
  fn validate_rejects_bad_indices() {
    let mut mesh = MeshData {
      vertices: vec![vertex(0.), vertex(1.), vertex(2.)],
      indices: vec![0, 1, 2],
      textures: Vec::new(),
    };
    assert!(mesh.validate().is_ok());

    mesh.indices = vec![0, 1, 3];
    assert!(matches!(mesh.validate(), Err(SceneError::InvalidModel(_))));

    mesh.indices = vec![0, 1];
    assert!(matches!(mesh.validate(), Err(SceneError::InvalidModel(_))));
  }

  #[test]
  fn texture_names_are_deduplicated() {
    let shared = MeshData {
      textures: vec![tex(TextureKind::Albedo, "a.png"), tex(TextureKind::Specular, "b.png")],
      ..MeshData::default()
    };

    let model = ModelData {
      meshes: vec![shared.clone(), shared],
    };

    assert_eq!(model.texture_names(), ["a.png", "b.png"]);
  }

  #[test]
  fn triangle_count_sums_meshes() {
    let mesh = MeshData {
      vertices: vec![vertex(0.), vertex(1.), vertex(2.)],
      indices: vec![0, 1, 2, 2, 1, 0],
      textures: Vec::new(),
    };

    let model = ModelData {
      meshes: vec![mesh.clone(), mesh],
    };

    assert_eq!(model.triangle_count(), 4);
  }
}

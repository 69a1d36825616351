//! Platform services implementation.
//!
//! Every asset a scene declares in its [`Features`] is loaded from disk when the services are created, so that
//! fetching during bootstrap never touches the file system. Models are read from Wavefront OBJ files; the textures
//! their materials refer to are loaded along with them and registered under `<model directory>/<texture file>`.

use crate::CLIOpts;
use image::{ImageError, RgbImage};
use learngl_scenes::{
  model::{MeshData, ModelData, TextureKind, TextureRef},
  shared::{ModelVertex, VertexNormal, VertexPosition, VertexUv},
  Features, PlatformServices,
};
use std::{
  collections::HashMap,
  error::Error,
  fmt, fs, io,
  path::{Path, PathBuf},
};
use wavefront_obj::obj::{self, ObjSet, Primitive, VTNIndex};

/// Desktop implementation of the [`PlatformServices`] API.
#[derive(Debug)]
pub struct DesktopPlatformServices {
  textures: HashMap<String, RgbImage>,
  models: HashMap<String, ModelData>,
}

impl DesktopPlatformServices {
  pub fn new(cli_opts: &CLIOpts, features: &Features) -> Result<Self, DesktopFetchError> {
    let mut services = Self {
      textures: HashMap::new(),
      models: HashMap::new(),
    };

    for name in features.textures() {
      services.load_texture(&cli_opts.textures, name)?;
    }

    for name in features.models() {
      let model = load_model(&cli_opts.models, name)?;

      log::info!(
        "loaded model {}: {} meshes, {} triangles",
        name,
        model.meshes.len(),
        model.triangle_count()
      );

      for texture in model.texture_names() {
        services.load_texture(&cli_opts.models, texture)?;
      }

      services.models.insert(name.clone(), model);
    }

    Ok(services)
  }

  fn load_texture(&mut self, root: &Path, name: &str) -> Result<(), DesktopFetchError> {
    if self.textures.contains_key(name) {
      return Ok(());
    }

    let path = root.join(name);
    let texture = image::open(&path)
      .map(|img| img.flipv().to_rgb8())
      .map_err(|source| DesktopFetchError::ImageError { path, source })?;

    log::debug!("loaded texture {} ({}×{})", name, texture.width(), texture.height());
    self.textures.insert(name.to_owned(), texture);

    Ok(())
  }
}

#[derive(Debug)]
pub enum DesktopFetchError {
  UnknownTexture(String),
  UnknownModel(String),
  ImageError { path: PathBuf, source: ImageError },
  CannotRead { path: PathBuf, source: io::Error },
  ObjError { path: PathBuf, line: usize, reason: String },
}

impl fmt::Display for DesktopFetchError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      DesktopFetchError::UnknownTexture(ref name) => write!(f, "unknown texture to load: {}", name),
      DesktopFetchError::UnknownModel(ref name) => write!(f, "unknown model to load: {}", name),
      DesktopFetchError::ImageError { ref path, ref source } => {
        write!(f, "cannot load texture {}: {}", path.display(), source)
      }
      DesktopFetchError::CannotRead { ref path, ref source } => {
        write!(f, "cannot read {}: {}", path.display(), source)
      }
      DesktopFetchError::ObjError {
        ref path,
        line,
        ref reason,
      } => write!(f, "cannot parse {} (line {}): {}", path.display(), line, reason),
    }
  }
}

impl Error for DesktopFetchError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      DesktopFetchError::ImageError { ref source, .. } => Some(source),
      DesktopFetchError::CannotRead { ref source, .. } => Some(source),
      _ => None,
    }
  }
}

impl PlatformServices for DesktopPlatformServices {
  type FetchError = DesktopFetchError;

  fn fetch_texture(&mut self, name: impl AsRef<str>) -> Result<&RgbImage, Self::FetchError> {
    let name = name.as_ref();
    self
      .textures
      .get(name)
      .ok_or_else(|| DesktopFetchError::UnknownTexture(name.to_owned()))
  }

  fn fetch_model(&mut self, name: impl AsRef<str>) -> Result<&ModelData, Self::FetchError> {
    let name = name.as_ref();
    self
      .models
      .get(name)
      .ok_or_else(|| DesktopFetchError::UnknownModel(name.to_owned()))
  }
}

fn read(path: PathBuf) -> Result<String, DesktopFetchError> {
  fs::read_to_string(&path).map_err(|source| DesktopFetchError::CannotRead { path, source })
}

/// Load an OBJ model and the material library it references.
fn load_model(root: &Path, name: &str) -> Result<ModelData, DesktopFetchError> {
  let path = root.join(name);
  let source = read(path.clone())?;

  let obj_set = obj::parse(source).map_err(|e| DesktopFetchError::ObjError {
    path: path.clone(),
    line: e.line_number,
    reason: e.message,
  })?;

  // textures are named relative to the directory of the model
  let texture_dir = Path::new(name)
    .parent()
    .map(|dir| dir.to_string_lossy().replace('\\', "/"))
    .unwrap_or_default();

  let mut materials = HashMap::new();
  if let Some(ref library) = obj_set.material_library {
    match read(path.with_file_name(library)) {
      Ok(mtl) => materials.extend(parse_materials(&mtl, &texture_dir)),
      // the geometry is still usable without its materials
      Err(e) => log::warn!("{}", e),
    }
  }

  Ok(convert_obj(&obj_set, &materials))
}

/// Textures of every material of an MTL file, by material name.
///
/// Only texture maps are read: diffuse (`map_Kd`) maps become albedo textures, specular (`map_Ks`) maps specular
/// textures and bump (`map_Bump`, `bump`, `norm`) maps normal textures.
fn parse_materials(source: &str, texture_dir: &str) -> HashMap<String, Vec<TextureRef>> {
  let mut materials = HashMap::new();
  let mut current: Option<(String, Vec<TextureRef>)> = None;

  for line in source.lines() {
    let mut words = line.split_whitespace();

    let keyword = match words.next() {
      Some(keyword) => keyword,
      None => continue,
    };

    if keyword == "newmtl" {
      if let Some((name, textures)) = current.take() {
        materials.insert(name, textures);
      }

      current = Some((words.collect::<Vec<_>>().join(" "), Vec::new()));
      continue;
    }

    let kind = match keyword {
      "map_Kd" => TextureKind::Albedo,
      "map_Ks" => TextureKind::Specular,
      "map_Bump" | "map_bump" | "bump" | "norm" => TextureKind::Normal,
      _ => continue,
    };

    // options come before the file name
    if let (Some((_, textures)), Some(file)) = (current.as_mut(), words.last()) {
      let file = file.replace('\\', "/");
      let name = if texture_dir.is_empty() {
        file
      } else {
        format!("{}/{}", texture_dir, file)
      };

      textures.push(TextureRef { kind, name });
    }
  }

  if let Some((name, textures)) = current {
    materials.insert(name, textures);
  }

  materials
}

/// Turn parsed OBJ objects into meshes, one per object and material.
///
/// Vertices are shared by the triangles using the same position / uv / normal triple. Missing normals are replaced
/// by the normal of the face and missing uvs by `(0, 0)`.
fn convert_obj(obj_set: &ObjSet, materials: &HashMap<String, Vec<TextureRef>>) -> ModelData {
  let mut meshes = Vec::new();

  for object in &obj_set.objects {
    for geometry in &object.geometry {
      let mut mesh = MeshData::default();
      let mut cache: HashMap<VTNIndex, u32> = HashMap::new();

      for shape in &geometry.shapes {
        let (a, b, c) = match shape.primitive {
          Primitive::Triangle(a, b, c) => (a, b, c),
          _ => continue,
        };

        let position = |key: VTNIndex| {
          let v = object.vertices[key.0];
          [v.x as f32, v.y as f32, v.z as f32]
        };
        let face_normal = triangle_normal(position(a), position(b), position(c));

        for key in [a, b, c] {
          let index = *cache.entry(key).or_insert_with(|| {
            let nor = key.2.map_or(face_normal, |i| {
              let n = object.normals[i];
              [n.x as f32, n.y as f32, n.z as f32]
            });
            let uv = key.1.map_or([0., 0.], |i| {
              let t = object.tex_vertices[i];
              [t.u as f32, t.v as f32]
            });

            mesh.vertices.push(ModelVertex::new(
              VertexPosition::new(position(key)),
              VertexNormal::new(nor),
              VertexUv::new(uv),
            ));

            mesh.vertices.len() as u32 - 1
          });

          mesh.indices.push(index);
        }
      }

      if mesh.indices.is_empty() {
        continue;
      }

      if let Some(material) = geometry.material_name.as_ref() {
        match materials.get(material) {
          Some(textures) => mesh.textures = textures.clone(),
          None => log::warn!("unknown material {} in object {}", material, object.name),
        }
      }

      meshes.push(mesh);
    }
  }

  ModelData { meshes }
}

fn triangle_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
  let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
  let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
  let n = [
    u[1] * v[2] - u[2] * v[1],
    u[2] * v[0] - u[0] * v[2],
    u[0] * v[1] - u[1] * v[0],
  ];
  let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();

  if len > 0. {
    [n[0] / len, n[1] / len, n[2] / len]
  } else {
    [0., 0., 0.]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CUBE_FACE: &str = "\
mtllib face.mtl
o face
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl wood
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

  const FACE_MTL: &str = "\
# two materials
newmtl wood
Kd 0.8 0.8 0.8
map_Kd wood_diffuse.jpg
map_Ks wood_specular.jpg
map_Bump -bm 0.5 wood_normal.png

newmtl bare
Kd 1 1 1
";

  fn parse(source: &str) -> ObjSet {
    obj::parse(source.to_owned()).expect("valid obj")
  }

  #[test]
  fn finds_material_library() {
    assert_eq!(parse(CUBE_FACE).material_library.as_deref(), Some("face.mtl"));
    assert_eq!(parse("o empty\n").material_library, None);
  }

  #[test]
  fn materials_map_to_texture_kinds() {
    let materials = parse_materials(FACE_MTL, "backpack");

    assert_eq!(
      materials["wood"],
      [
        TextureRef {
          kind: TextureKind::Albedo,
          name: "backpack/wood_diffuse.jpg".to_owned()
        },
        TextureRef {
          kind: TextureKind::Specular,
          name: "backpack/wood_specular.jpg".to_owned()
        },
        TextureRef {
          kind: TextureKind::Normal,
          name: "backpack/wood_normal.png".to_owned()
        },
      ]
    );
    assert!(materials["bare"].is_empty());

    let flat = parse_materials(FACE_MTL, "");
    assert_eq!(flat["wood"][0].name, "wood_diffuse.jpg");
  }

  #[test]
  fn shared_corners_are_deduplicated() {
    let materials = parse_materials(FACE_MTL, "face");
    let model = convert_obj(&parse(CUBE_FACE), &materials);

    assert_eq!(model.meshes.len(), 1);

    let mesh = &model.meshes[0];
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices, [0, 1, 2, 0, 2, 3]);
    assert!(mesh.validate().is_ok());
    assert_eq!(
      mesh.first_texture(TextureKind::Albedo),
      Some("face/wood_diffuse.jpg")
    );
    assert_eq!(model.triangle_count(), 2);
  }

  #[test]
  fn missing_normals_use_the_face_normal() {
    let source = "\
o tri
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
    let model = convert_obj(&parse(source), &HashMap::new());
    let mesh = &model.meshes[0];

    assert_eq!(mesh.vertices.len(), 3);
    assert!(mesh.textures.is_empty());
    assert_eq!(
      mesh.vertices[0],
      ModelVertex::new(
        VertexPosition::new([0., 0., 0.]),
        VertexNormal::new([0., 0., 1.]),
        VertexUv::new([0., 0.]),
      )
    );
  }

  #[test]
  fn degenerate_triangle_normal() {
    assert_eq!(triangle_normal([0.; 3], [1., 1., 1.], [2., 2., 2.]), [0., 0., 0.]);
    assert_eq!(
      triangle_normal([0., 0., 0.], [0., 0., 1.], [1., 0., 0.]),
      [0., 1., 0.]
    );
  }
}

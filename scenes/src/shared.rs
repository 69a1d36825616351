use cgmath::Vector3;
use luminance::{Semantics, Vertex};
use luminance_front::{
  context::GraphicsContext,
  pixel::NormRGB8UI,
  shader::types::Vec3,
  tess::{Mode, Tess},
  texture::{Dim2, MagFilter, MinFilter, Sampler, TexelUpload, Texture, Wrap},
  Backend,
};

use crate::{InputAction, PlatformServices, SceneError};

/// Color the 2D and 3D scenes clear the back buffer with.
pub const CLEAR_COLOR: [f32; 4] = [0.09, 0.11, 0.13, 1.];

/// Near clipping plane distance.
pub const NEAR_CLIP: f32 = 0.01;

/// Far clipping plane distance.
pub const FAR_CLIP: f32 = 100.;

/// Default window size; also used as initial aspect ratio until the first resize.
pub const DEFAULT_DIMENSIONS: [u32; 2] = [800, 600];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Semantics)]
pub enum Semantics {
  // reference vertex positions with the position variable in vertex shaders
  #[sem(name = "position", repr = "[f32; 3]", wrapper = "VertexPosition")]
  Position,
  // reference vertex colors with the color variable in vertex shaders
  #[sem(name = "color", repr = "[f32; 3]", wrapper = "VertexColor")]
  Color,
  // reference texture coordinates with the uv variable in vertex shaders
  #[sem(name = "uv", repr = "[f32; 2]", wrapper = "VertexUv")]
  Uv,
  // reference vertex normals with the normal variable in vertex shaders
  #[sem(name = "normal", repr = "[f32; 3]", wrapper = "VertexNormal")]
  Normal,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Vertex)]
#[vertex(sem = "Semantics")]
pub struct PlainVertex {
  pub pos: VertexPosition,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Vertex)]
#[vertex(sem = "Semantics")]
pub struct ColorVertex {
  pub pos: VertexPosition,
  pub rgb: VertexColor,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Vertex)]
#[vertex(sem = "Semantics")]
pub struct TexturedVertex {
  pub pos: VertexPosition,
  pub rgb: VertexColor,
  pub uv: VertexUv,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Vertex)]
#[vertex(sem = "Semantics")]
pub struct UvVertex {
  pub pos: VertexPosition,
  pub uv: VertexUv,
}

// Vertex used by everything that gets lit: cubes and loaded meshes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Vertex)]
#[vertex(sem = "Semantics")]
pub struct ModelVertex {
  pub pos: VertexPosition,
  pub nor: VertexNormal,
  pub uv: VertexUv,
}

/// Where the ten cubes of the 3D scenes are placed.
pub const CUBE_POSITIONS: [[f32; 3]; 10] = [
  [0., 0., 0.],
  [2., 5., -15.],
  [-1.5, -2.2, -2.5],
  [-3.8, -2., -12.3],
  [2.4, -0.4, -3.5],
  [-1.7, 3., -7.5],
  [1.3, -2., -2.5],
  [1.5, 2., -2.5],
  [1.5, 0.2, -1.5],
  [-1.3, 1., -1.5],
];

/// Axis the cubes spin around.
pub const CUBE_SPIN_AXIS: [f32; 3] = [0.5, 0.3, 0.4];

pub fn cube_positions() -> impl Iterator<Item = Vector3<f32>> {
  CUBE_POSITIONS.iter().map(|&p| Vector3::from(p))
}

// position, normal, uv; counter-clockwise front faces
#[rustfmt::skip]
const LIT_CUBE: [[f32; 8]; 36] = [
  [-0.5, -0.5, -0.5,  0.,  0., -1.,  0., 0.],
  [ 0.5,  0.5, -0.5,  0.,  0., -1.,  1., 1.],
  [ 0.5, -0.5, -0.5,  0.,  0., -1.,  1., 0.],
  [ 0.5,  0.5, -0.5,  0.,  0., -1.,  1., 1.],
  [-0.5, -0.5, -0.5,  0.,  0., -1.,  0., 0.],
  [-0.5,  0.5, -0.5,  0.,  0., -1.,  0., 1.],

  [-0.5, -0.5,  0.5,  0.,  0.,  1.,  0., 0.],
  [ 0.5, -0.5,  0.5,  0.,  0.,  1.,  1., 0.],
  [ 0.5,  0.5,  0.5,  0.,  0.,  1.,  1., 1.],
  [ 0.5,  0.5,  0.5,  0.,  0.,  1.,  1., 1.],
  [-0.5,  0.5,  0.5,  0.,  0.,  1.,  0., 1.],
  [-0.5, -0.5,  0.5,  0.,  0.,  1.,  0., 0.],

  [-0.5,  0.5,  0.5, -1.,  0.,  0.,  1., 0.],
  [-0.5,  0.5, -0.5, -1.,  0.,  0.,  1., 1.],
  [-0.5, -0.5, -0.5, -1.,  0.,  0.,  0., 1.],
  [-0.5, -0.5, -0.5, -1.,  0.,  0.,  0., 1.],
  [-0.5, -0.5,  0.5, -1.,  0.,  0.,  0., 0.],
  [-0.5,  0.5,  0.5, -1.,  0.,  0.,  1., 0.],

  [ 0.5,  0.5,  0.5,  1.,  0.,  0.,  1., 0.],
  [ 0.5, -0.5, -0.5,  1.,  0.,  0.,  0., 1.],
  [ 0.5,  0.5, -0.5,  1.,  0.,  0.,  1., 1.],
  [ 0.5, -0.5, -0.5,  1.,  0.,  0.,  0., 1.],
  [ 0.5,  0.5,  0.5,  1.,  0.,  0.,  1., 0.],
  [ 0.5, -0.5,  0.5,  1.,  0.,  0.,  0., 0.],

  [-0.5, -0.5, -0.5,  0., -1.,  0.,  0., 1.],
  [ 0.5, -0.5, -0.5,  0., -1.,  0.,  1., 1.],
  [ 0.5, -0.5,  0.5,  0., -1.,  0.,  1., 0.],
  [ 0.5, -0.5,  0.5,  0., -1.,  0.,  1., 0.],
  [-0.5, -0.5,  0.5,  0., -1.,  0.,  0., 0.],
  [-0.5, -0.5, -0.5,  0., -1.,  0.,  0., 1.],

  [-0.5,  0.5, -0.5,  0.,  1.,  0.,  0., 1.],
  [ 0.5,  0.5,  0.5,  0.,  1.,  0.,  1., 0.],
  [ 0.5,  0.5, -0.5,  0.,  1.,  0.,  1., 1.],
  [ 0.5,  0.5,  0.5,  0.,  1.,  0.,  1., 0.],
  [-0.5,  0.5, -0.5,  0.,  1.,  0.,  0., 1.],
  [-0.5,  0.5,  0.5,  0.,  1.,  0.,  0., 0.],
];

/// Unit cube with per-face normals and texture coordinates, as a plain triangle list.
pub fn lit_cube() -> Vec<ModelVertex> {
  LIT_CUBE
    .iter()
    .map(|v| {
      ModelVertex::new(
        VertexPosition::new([v[0], v[1], v[2]]),
        VertexNormal::new([v[3], v[4], v[5]]),
        VertexUv::new([v[6], v[7]]),
      )
    })
    .collect()
}

/// Indices of the lit cube; it has no shared vertices, so they only enumerate them.
pub fn lit_cube_indices() -> Vec<u32> {
  (0..LIT_CUBE.len() as u32).collect()
}

/// Upload the lit cube.
pub fn new_lit_cube(
  context: &mut impl GraphicsContext<Backend = Backend>,
) -> Result<Tess<ModelVertex, u32>, SceneError> {
  context
    .new_tess()
    .set_vertices(lit_cube())
    .set_indices(lit_cube_indices())
    .set_mode(Mode::Triangle)
    .build()
    .map_err(|e| SceneError::CannotCreateTess(e.to_string()))
}

/// Shader vector from a cgmath one.
pub fn vec3(v: Vector3<f32>) -> Vec3<f32> {
  Vec3::new(v.x, v.y, v.z)
}

/// Unit cube sharing its eight corners between faces, with texture coordinates only.
#[rustfmt::skip]
pub fn textured_cube() -> ([UvVertex; 8], [u32; 36]) {
  let vertices = [
    UvVertex::new(VertexPosition::new([-0.5, -0.5,  0.5]), VertexUv::new([0., 0.])),
    UvVertex::new(VertexPosition::new([-0.5,  0.5,  0.5]), VertexUv::new([0., 1.])),
    UvVertex::new(VertexPosition::new([ 0.5, -0.5,  0.5]), VertexUv::new([1., 0.])),
    UvVertex::new(VertexPosition::new([ 0.5,  0.5,  0.5]), VertexUv::new([1., 1.])),
    UvVertex::new(VertexPosition::new([-0.5, -0.5, -0.5]), VertexUv::new([0., 1.])),
    UvVertex::new(VertexPosition::new([-0.5,  0.5, -0.5]), VertexUv::new([0., 0.])),
    UvVertex::new(VertexPosition::new([ 0.5, -0.5, -0.5]), VertexUv::new([1., 1.])),
    UvVertex::new(VertexPosition::new([ 0.5,  0.5, -0.5]), VertexUv::new([1., 0.])),
  ];

  let indices = [
    0, 1, 2,  2, 1, 3,
    1, 5, 3,  3, 5, 7,
    5, 4, 7,  7, 4, 6,
    4, 0, 6,  6, 0, 2,
    2, 3, 6,  6, 3, 7,
    4, 5, 0,  0, 5, 1,
  ];

  (vertices, indices)
}

/// Indices of [`textured_quad`].
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// Colored, textured square centered on the origin, going from `-half` to `half` on both axes.
pub fn textured_quad(half: f32) -> [TexturedVertex; 4] {
  let vertex = |x: f32, y: f32, rgb: [f32; 3], uv: [f32; 2]| {
    TexturedVertex::new(
      VertexPosition::new([x * half, y * half, 0.]),
      VertexColor::new(rgb),
      VertexUv::new(uv),
    )
  };

  [
    vertex(-1., -1., [0.9, 0.3, 0.6], [0., 0.]),
    vertex(-1., 1., [0.8, 0.2, 0.3], [0., 1.]),
    vertex(1., -1., [0.1, 0.2, 0.8], [1., 0.]),
    vertex(1., 1., [0.4, 0.7, 0.2], [1., 1.]),
  ]
}

/// Amount of change of [`Opacity`] per frame the matching key is held.
pub const OPACITY_STEP: f32 = 0.01;

/// Blend factor between two textures, driven by the increase / decrease actions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Opacity(f32);

impl Opacity {
  pub fn get(self) -> f32 {
    self.0
  }

  /// React to an action; returns whether the action was an opacity one.
  pub fn apply(&mut self, action: &InputAction) -> bool {
    let delta = match action {
      InputAction::Increase => OPACITY_STEP,
      InputAction::Decrease => -OPACITY_STEP,
      _ => return false,
    };

    self.0 = (self.0 + delta).max(0.).min(1.);
    true
  }
}

/// RGB texture.
pub type RGBTexture = Texture<Dim2, NormRGB8UI>;

/// Number of extra mipmap levels for a texture of the given size, down to 1×1.
pub fn mipmap_levels(width: u32, height: u32) -> usize {
  let largest = width.max(height).max(1);
  (31 - largest.leading_zeros()) as usize
}

/// Trilinear sampler with the given wrapping on both axes.
pub fn sampler(wrap: Wrap) -> Sampler {
  Sampler {
    wrap_r: wrap,
    wrap_s: wrap,
    wrap_t: wrap,
    min_filter: MinFilter::LinearMipmapLinear,
    mag_filter: MagFilter::Linear,
    ..Sampler::default()
  }
}

/// Fetch an image from the platform and upload it as a mipmapped texture.
pub fn load_texture(
  context: &mut impl GraphicsContext<Backend = Backend>,
  platform: &mut impl PlatformServices,
  name: &str,
  wrap: Wrap,
) -> Result<RGBTexture, SceneError> {
  let img = platform
    .fetch_texture(name)
    .map_err(|e| SceneError::fetch(name, e))?;
  let (width, height) = img.dimensions();
  let texels = img.as_raw();

  log::debug!("uploading texture {} ({}×{})", name, width, height);

  context
    .new_texture_raw(
      [width, height],
      sampler(wrap),
      TexelUpload::base_level(texels, mipmap_levels(width, height)),
    )
    .map_err(|e| SceneError::CannotCreateTexture(e.to_string()))
}

/// 1×1 texture of a single color, used where a material has no map.
pub fn solid_texture(
  context: &mut impl GraphicsContext<Backend = Backend>,
  rgb: [u8; 3],
) -> Result<RGBTexture, SceneError> {
  context
    .new_texture_raw(
      [1, 1],
      sampler(Wrap::Repeat),
      TexelUpload::base_level(&rgb[..], 0),
    )
    .map_err(|e| SceneError::CannotCreateTexture(e.to_string()))
}

/// Turns the absolute time passed to each frame into per-frame deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameClock {
  last: Option<f32>,
}

impl FrameClock {
  /// Seconds elapsed since the previous tick; the first tick yields zero.
  pub fn tick(&mut self, time: f32) -> f32 {
    let dt = self.last.map_or(0., |last| (time - last).max(0.));
    self.last = Some(time);
    dt
  }
}

/// Aspect ratio of a framebuffer, guarding against minimized windows.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
  width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mipmap_levels_down_to_one_texel() {
    assert_eq!(mipmap_levels(1, 1), 0);
    assert_eq!(mipmap_levels(2, 1), 1);
    assert_eq!(mipmap_levels(512, 256), 9);
    assert_eq!(mipmap_levels(600, 400), 9);
    assert_eq!(mipmap_levels(0, 0), 0);
  }

  #[test]
  fn frame_clock_deltas() {
    let mut clock = FrameClock::default();

    assert_eq!(clock.tick(1.), 0.);
    assert!((clock.tick(1.25) - 0.25).abs() < 1e-6);
    assert!((clock.tick(2.) - 0.75).abs() < 1e-6);
  }

  #[test]
  fn lit_cube_faces_are_consistent() {
    let cube = lit_cube();
    assert_eq!(cube.len(), 36);
    assert_eq!(lit_cube_indices().len(), 36);

    // every face has one normal, and its vertices all lie on the plane that normal points to
    for face in LIT_CUBE.chunks(6) {
      let normal = [face[0][3], face[0][4], face[0][5]];

      for v in face {
        assert_eq!([v[3], v[4], v[5]], normal);
        let along = v[0] * normal[0] + v[1] * normal[1] + v[2] * normal[2];
        assert!((along - 0.5).abs() < 1e-6);
      }
    }
  }

  #[test]
  fn lit_cube_winding_matches_normals() {
    use cgmath::InnerSpace as _;

    for tri in LIT_CUBE.chunks(3) {
      let p = |i: usize| Vector3::new(tri[i][0], tri[i][1], tri[i][2]);
      let n = Vector3::new(tri[0][3], tri[0][4], tri[0][5]);
      let face = (p(1) - p(0)).cross(p(2) - p(0));

      assert!(face.dot(n) > 0., "clockwise triangle: {:?}", tri);
    }
  }

  #[test]
  fn textured_cube_indices_in_range() {
    let (vertices, indices) = textured_cube();
    assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
  }

  #[test]
  fn opacity_is_clamped() {
    let mut opacity = Opacity::default();

    assert!(opacity.apply(&InputAction::Decrease));
    assert_eq!(opacity.get(), 0.);

    for _ in 0..150 {
      opacity.apply(&InputAction::Increase);
    }
    assert_eq!(opacity.get(), 1.);

    opacity.apply(&InputAction::Decrease);
    assert!((opacity.get() - 0.99).abs() < 1e-6);

    assert!(!opacity.apply(&InputAction::Forward));
  }

  #[test]
  fn aspect_ratio_survives_zero_height() {
    assert_eq!(aspect_ratio(800, 600), 800. / 600.);
    assert_eq!(aspect_ratio(800, 0), 800.);
  }
}

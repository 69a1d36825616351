//! Light sources and the lit program.
//!
//! The lit fragment shader receives three arrays of lights (`point_lights`, `dir_lights` and `spot_lights`), the
//! sizes of which are injected as `NR_POINT`, `NR_DIR` and `NR_SPOT` defines when the program is built. The uniform
//! interface always resolves [`MAX_POINT_LIGHTS`], [`MAX_DIR_LIGHTS`] and [`MAX_SPOT_LIGHTS`] lights; the elements a
//! smaller rig leaves out of the arrays stay unbound.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};
use luminance::shader::{UniformBuilder, UniformInterface, UniformWarning};
use luminance_front::{
  context::GraphicsContext,
  pipeline::{PipelineError, TextureBinding},
  pixel::NormUnsigned,
  render_gate::RenderGate,
  render_state::RenderState,
  shader::{
    types::{Mat33, Mat44, Vec3},
    Program, ProgramInterface, Uniform,
  },
  tess::Tess,
  texture::Dim2,
  Backend,
};

use crate::{
  camera::FreeLook,
  shader::{build_program, FlatInterface, ShaderSource, Stage},
  shared::{vec3, ModelVertex, Semantics},
  transform::Transform,
  SceneError,
};

const LIT_VS: &str = include_str!("lit-vs.glsl");
const LIT_FS: &str = include_str!("lit-fs.glsl");

pub const WHITE: [f32; 3] = [1., 1., 1.];

pub const MAX_POINT_LIGHTS: usize = 4;
pub const MAX_DIR_LIGHTS: usize = 1;
pub const MAX_SPOT_LIGHTS: usize = 1;

/// Scale of the cubes showing where point lights are.
pub const LAMP_SCALE: f32 = 0.1;

/// Light shining in every direction from a position, fading with distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
  pub color: Vector3<f32>,
  pub strength: f32,
  pub position: Vector3<f32>,
}

impl PointLight {
  pub fn new(position: Vector3<f32>, strength: f32) -> Self {
    PointLight {
      color: Vector3::from(WHITE),
      strength,
      position,
    }
  }

  /// Where to draw the small cube standing for the light.
  pub fn lamp_transform(&self) -> Transform {
    Transform::at(self.position).uniformly_scaled(LAMP_SCALE)
  }
}

/// Camera-dependent uniforms shared by the lit and flat programs for a frame.
#[derive(Clone, Copy, Debug)]
pub struct Viewpoint {
  pub projection: Mat44<f32>,
  pub view: Mat44<f32>,
  pub eye: Vec3<f32>,
}

impl Viewpoint {
  pub fn new(free_look: &FreeLook) -> Self {
    let eye = free_look.camera.position;

    Viewpoint {
      projection: Mat44::new(free_look.projection()),
      view: Mat44::new(free_look.view()),
      eye: Vec3::new(eye.x, eye.y, eye.z),
    }
  }

  pub fn set_lit(&self, iface: &mut ProgramInterface, uni: &LitInterface) {
    iface.set(&uni.projection, self.projection);
    iface.set(&uni.view, self.view);
    iface.set(&uni.view_pos, self.eye);
  }

  pub fn set_flat(&self, iface: &mut ProgramInterface, uni: &FlatInterface) {
    iface.set(&uni.projection, self.projection);
    iface.set(&uni.view, self.view);
  }
}

/// Draw a small cube of the light color at every point light, with the flat program.
pub fn render_lamps(
  iface: &mut ProgramInterface,
  uni: &FlatInterface,
  rdr_gate: &mut RenderGate,
  cube: &Tess<ModelVertex, u32>,
  lights: &[PointLight],
) -> Result<(), PipelineError> {
  for light in lights {
    iface.set(&uni.model, Mat44::new(light.lamp_transform().model_matrix()));
    iface.set(&uni.color, vec3(light.color));

    rdr_gate.render(&RenderState::default(), |mut tess_gate| {
      tess_gate.render(cube)
    })?;
  }

  Ok(())
}

/// Light coming from infinitely far away, such as the sun.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
  pub color: Vector3<f32>,
  pub strength: f32,
  pub direction: Vector3<f32>,
}

/// Cone of light with a soft edge between the inner and outer cutoff angles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
  pub color: Vector3<f32>,
  pub strength: f32,
  pub position: Vector3<f32>,
  pub direction: Vector3<f32>,
  /// Degrees.
  pub inner_cutoff: f32,
  /// Degrees.
  pub outer_cutoff: f32,
}

impl SpotLight {
  /// Place the light at the camera, pointing where it looks.
  pub fn follow(&mut self, position: Point3<f32>, direction: Vector3<f32>) {
    self.position = Vector3::new(position.x, position.y, position.z);
    self.direction = direction;
  }
}

/// Value of a single light uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightValue {
  Float(f32),
  Vec3([f32; 3]),
}

/// Every light of a scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightRig {
  pub point: Vec<PointLight>,
  pub directional: Vec<DirectionalLight>,
  pub spot: Vec<SpotLight>,
}

impl LightRig {
  /// The largest rig the lit program can be fed with. Only its shape matters.
  pub fn capacity() -> Self {
    let black = Vector3::new(0., 0., 0.);

    LightRig {
      point: vec![PointLight::new(black, 0.); MAX_POINT_LIGHTS],
      directional: vec![
        DirectionalLight {
          color: black,
          strength: 0.,
          direction: black,
        };
        MAX_DIR_LIGHTS
      ],
      spot: vec![
        SpotLight {
          color: black,
          strength: 0.,
          position: black,
          direction: black,
          inner_cutoff: 0.,
          outer_cutoff: 0.,
        };
        MAX_SPOT_LIGHTS
      ],
    }
  }

  /// Whether every light has a uniform in the lit program.
  pub fn fits(&self) -> bool {
    self.point.len() <= MAX_POINT_LIGHTS
      && self.directional.len() <= MAX_DIR_LIGHTS
      && self.spot.len() <= MAX_SPOT_LIGHTS
  }

  /// Inject the number of lights of each kind in the fragment stage.
  pub fn define_counts(&self, source: &mut ShaderSource) {
    source
      .define(Stage::Fragment, "NR_POINT", self.point.len())
      .define(Stage::Fragment, "NR_DIR", self.directional.len())
      .define(Stage::Fragment, "NR_SPOT", self.spot.len());
  }

  /// Every uniform the rig sets, in a stable order.
  pub fn assignments(&self) -> Vec<(String, LightValue)> {
    let mut assignments = Vec::new();

    for (i, light) in self.point.iter().enumerate() {
      let field = |name: &str| format!("point_lights[{}].{}", i, name);
      assignments.push((field("color"), LightValue::Vec3(light.color.into())));
      assignments.push((field("strength"), LightValue::Float(light.strength)));
      assignments.push((field("position"), LightValue::Vec3(light.position.into())));
    }

    for (i, light) in self.directional.iter().enumerate() {
      let field = |name: &str| format!("dir_lights[{}].{}", i, name);
      assignments.push((field("color"), LightValue::Vec3(light.color.into())));
      assignments.push((field("strength"), LightValue::Float(light.strength)));
      assignments.push((field("direction"), LightValue::Vec3(light.direction.into())));
    }

    for (i, light) in self.spot.iter().enumerate() {
      let field = |name: &str| format!("spot_lights[{}].{}", i, name);
      assignments.push((field("color"), LightValue::Vec3(light.color.into())));
      assignments.push((field("strength"), LightValue::Float(light.strength)));
      assignments.push((field("position"), LightValue::Vec3(light.position.into())));
      assignments.push((field("direction"), LightValue::Vec3(light.direction.into())));
      assignments.push((
        field("inner_cutoff"),
        LightValue::Float(light.inner_cutoff.to_radians().cos()),
      ));
      assignments.push((
        field("outer_cutoff"),
        LightValue::Float(light.outer_cutoff.to_radians().cos()),
      ));
    }

    assignments
  }

  /// Set every light uniform.
  pub fn upload(&self, iface: &mut ProgramInterface, uniforms: &LightUniforms) {
    for (name, value) in self.assignments() {
      match (value, uniforms.slots.get(&name)) {
        (LightValue::Float(v), Some(LightSlot::Float(u))) => iface.set(u, v),
        (LightValue::Vec3(v), Some(LightSlot::Vec3(u))) => iface.set(u, Vec3::from(v)),
        (value, slot) => log::warn!("light uniform {}: {:?} for {:?}", name, value, slot),
      }
    }
  }
}

#[derive(Debug)]
enum LightSlot {
  Float(Uniform<f32>),
  Vec3(Uniform<Vec3<f32>>),
}

/// Light uniforms of [`LightRig::capacity`], by name.
#[derive(Debug)]
pub struct LightUniforms {
  slots: HashMap<String, LightSlot>,
}

impl LightUniforms {
  fn resolve(builder: &mut UniformBuilder<Backend>) -> Self {
    let slots = LightRig::capacity()
      .assignments()
      .into_iter()
      .map(|(name, value)| {
        // elements past the NR_* sizes, and lights the compiler optimized away, are left unbound
        let slot = match value {
          LightValue::Float(_) => LightSlot::Float(builder.ask_or_unbound(name.as_str())),
          LightValue::Vec3(_) => LightSlot::Vec3(builder.ask_or_unbound(name.as_str())),
        };

        (name, slot)
      })
      .collect();

    LightUniforms { slots }
  }
}

/// Uniforms of the lit program.
#[derive(Debug)]
pub struct LitInterface {
  pub projection: Uniform<Mat44<f32>>,
  pub view: Uniform<Mat44<f32>>,
  pub model: Uniform<Mat44<f32>>,
  pub normal_mat: Uniform<Mat33<f32>>,
  pub view_pos: Uniform<Vec3<f32>>,
  pub use_textures: Uniform<bool>,
  pub object_color: Uniform<Vec3<f32>>,
  pub albedo_map: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  pub specular_map: Uniform<TextureBinding<Dim2, NormUnsigned>>,
  pub lights: LightUniforms,
}

impl UniformInterface<Backend> for LitInterface {
  fn uniform_interface<'a>(
    builder: &mut UniformBuilder<'a, Backend>,
    _: &mut (),
  ) -> Result<Self, UniformWarning> {
    Ok(LitInterface {
      projection: builder.ask("projection")?,
      view: builder.ask("view")?,
      model: builder.ask("model")?,
      normal_mat: builder.ask_or_unbound("normal_mat"),
      view_pos: builder.ask_or_unbound("view_pos"),
      use_textures: builder.ask_or_unbound("use_textures"),
      object_color: builder.ask_or_unbound("object_color"),
      albedo_map: builder.ask_or_unbound("albedo_map"),
      specular_map: builder.ask_or_unbound("specular_map"),
      lights: LightUniforms::resolve(builder),
    })
  }
}

pub type LitProgram = Program<Semantics, (), LitInterface>;

/// Build the lit program for a given set of lights.
pub fn lit_program(
  context: &mut impl GraphicsContext<Backend = Backend>,
  rig: &LightRig,
) -> Result<LitProgram, SceneError> {
  if !rig.fits() {
    return Err(SceneError::CannotBuildProgram {
      name: "lit".to_owned(),
      reason: format!(
        "at most {} point, {} directional and {} spot lights are supported",
        MAX_POINT_LIGHTS, MAX_DIR_LIGHTS, MAX_SPOT_LIGHTS
      ),
    });
  }

  let mut source = ShaderSource::new(LIT_VS, LIT_FS);
  rig.define_counts(&mut source);

  log::info!(
    "lit program with {} point, {} directional and {} spot lights",
    rig.point.len(),
    rig.directional.len(),
    rig.spot.len()
  );

  build_program(context, "lit", &source)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rig() -> LightRig {
    LightRig {
      point: vec![
        PointLight {
          color: Vector3::from(WHITE),
          strength: 3.,
          position: Vector3::new(-1.3, 1., -2.5),
        },
        PointLight {
          color: Vector3::from(WHITE),
          strength: 3.,
          position: Vector3::new(2.3, -3.3, -4.),
        },
      ],
      directional: vec![DirectionalLight {
        color: Vector3::from(WHITE),
        strength: 3.,
        direction: Vector3::new(0., -1., 0.),
      }],
      spot: vec![SpotLight {
        color: Vector3::from(WHITE),
        strength: 3.,
        position: Vector3::new(0., 0., 3.),
        direction: Vector3::new(0., 0., -1.),
        inner_cutoff: 12.5,
        outer_cutoff: 17.5,
      }],
    }
  }

  #[test]
  fn uniform_names() {
    let names: Vec<_> = rig().assignments().into_iter().map(|(name, _)| name).collect();

    assert_eq!(
      names,
      [
        "point_lights[0].color",
        "point_lights[0].strength",
        "point_lights[0].position",
        "point_lights[1].color",
        "point_lights[1].strength",
        "point_lights[1].position",
        "dir_lights[0].color",
        "dir_lights[0].strength",
        "dir_lights[0].direction",
        "spot_lights[0].color",
        "spot_lights[0].strength",
        "spot_lights[0].position",
        "spot_lights[0].direction",
        "spot_lights[0].inner_cutoff",
        "spot_lights[0].outer_cutoff",
      ]
    );
  }

  #[test]
  fn cutoffs_are_cosines() {
    let assignments = rig().assignments();
    let value = |name: &str| {
      assignments
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| *v)
    };

    match value("spot_lights[0].inner_cutoff") {
      Some(LightValue::Float(c)) => assert!((c - 12.5f32.to_radians().cos()).abs() < 1e-6),
      v => panic!("unexpected inner cutoff: {:?}", v),
    }

    match value("spot_lights[0].outer_cutoff") {
      Some(LightValue::Float(c)) => assert!((c - 0.953_717).abs() < 1e-5),
      v => panic!("unexpected outer cutoff: {:?}", v),
    }

    assert_eq!(
      value("point_lights[1].position"),
      Some(LightValue::Vec3([2.3, -3.3, -4.]))
    );
  }

  #[test]
  fn counts_are_defined_in_the_fragment_stage() {
    let mut source = ShaderSource::new("void main() {}\n", "out vec4 frag;\n");
    rig().define_counts(&mut source);

    assert_eq!(source.vertex, "void main() {}\n");
    assert!(source.fragment.contains("#define NR_POINT 2\n"));
    assert!(source.fragment.contains("#define NR_DIR 1\n"));
    assert!(source.fragment.contains("#define NR_SPOT 1\n"));
  }

  #[test]
  fn spot_follows_camera() {
    let mut spot = rig().spot[0];
    spot.follow(Point3::new(1., 2., 3.), Vector3::new(0., 1., 0.));

    assert_eq!(spot.position, Vector3::new(1., 2., 3.));
    assert_eq!(spot.direction, Vector3::new(0., 1., 0.));
  }

  #[test]
  fn lamps_are_small_cubes_at_the_lights() {
    let light = PointLight::new(Vector3::new(-1.3, 1., -2.5), 1.);
    let lamp = light.lamp_transform();

    assert_eq!(light.color, Vector3::new(1., 1., 1.));
    assert_eq!(lamp.position, light.position);
    assert_eq!(lamp.scale, Vector3::new(0.1, 0.1, 0.1));
  }

  #[test]
  fn empty_rig() {
    assert!(LightRig::default().assignments().is_empty());
    assert!(LightRig::default().fits());
  }

  fn shadeable<Uni: UniformInterface<Backend>>() {}

  #[test]
  fn lit_interface_needs_no_environment() {
    shadeable::<LitInterface>();
    shadeable::<FlatInterface>();
  }

  #[test]
  fn capacity_covers_every_scene_rig() {
    let capacity = LightRig::capacity();
    let names: Vec<_> = capacity.assignments().into_iter().map(|(name, _)| name).collect();

    assert!(capacity.fits());
    assert_eq!(capacity.point.len(), 4);
    assert!(names.contains(&"point_lights[3].position".to_owned()));
    assert!(names.contains(&"spot_lights[0].outer_cutoff".to_owned()));

    // every uniform a smaller rig sets is among the resolved ones
    for (name, _) in rig().assignments() {
      assert!(names.contains(&name), "{} is not resolved", name);
    }
  }

  #[test]
  fn oversized_rig_does_not_fit() {
    let mut rig = rig();
    rig.spot.push(rig.spot[0]);
    assert!(!rig.fits());

    let mut rig = LightRig::capacity();
    rig.point.push(PointLight::new(Vector3::new(0., 0., 0.), 1.));
    assert!(!rig.fits());
  }
}

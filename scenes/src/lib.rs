//! OpenGL tutorial scenes.
//!
//! This crate provides a set of single-scene programs: drawing a triangle and a rectangle, texture mapping,
//! transformations, coordinate systems with a free-look camera, basic lighting, multi-light model loading and
//! stenciled outlines. The scenes are platform-agnostic on purpose: the desktop runner opens the window, polls the
//! events and loads the assets, and the scenes only ever see abstract inputs and already-decoded assets.
//!
//! # Scene architecture
//!
//! Scenes are simple modules exposed from this crate, each one exporting a `LocalScene` type implementing the
//! [`Scene`] trait. They do not depend on any platform-specific concepts, such as system events or window
//! capacities. Whenever a scene requires user interaction, [`InputAction`] is used, and whenever it requires an asset
//! (texture, model), it asks the [`PlatformServices`] passed at bootstrap.
//!
//! The small helpers shared by the scenes live in their own modules:
//!
//! - [`shader`] assembles shader sources and builds programs.
//! - [`camera`] implements the yaw / pitch free-look camera.
//! - [`transform`] composes model matrices and derives normal matrices.
//! - [`lights`] describes point, directional and spot lights and uploads them to the lit shader.
//! - [`model`] holds CPU meshes and uploads them to the GPU.
//! - [`outline`] provides the render states of the two-pass stencil outline.

use std::{error::Error, fmt};

use luminance_front::{context::GraphicsContext, framebuffer::Framebuffer, texture::Dim2, Backend};

pub mod camera;
pub mod lights;
pub mod model;
pub mod outline;
pub mod shader;
pub mod shared;
pub mod transform;

pub mod basic_lighting;
pub mod coordinate_systems;
pub mod first_triangle;
pub mod model_loading;
pub mod rectangle;
pub mod stencil_outline;
pub mod texture_mapping;
pub mod transformations;

use model::ModelData;

/// Scene interface.
pub trait Scene: Sized {
  /// Assets and platform capabilities the scene needs.
  fn features() -> Features {
    Features::none()
  }

  /// Bootstrap the scene.
  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, SceneError>;

  /// Render a frame of the scene.
  fn render_frame(
    self,
    time: f32,
    back_buffer: Framebuffer<Dim2, (), ()>,
    actions: impl Iterator<Item = InputAction>,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> LoopFeedback<Self>;
}

/// A type used to pass “inputs” to scenes.
///
/// Movement and [`InputAction::Increase`] / [`InputAction::Decrease`] actions are emitted once per frame for as
/// long as the matching key is held, so scenes scale them by the frame delta time.
#[derive(Clone, Debug, PartialEq)]
pub enum InputAction {
  /// Quit the application.
  Quit,

  /// Main action. Typically used to switch an effect on and off or to cycle through it.
  MainToggle,

  /// Auxiliary action. Often used to showcase / toggle smaller parts of a bigger effect.
  AuxiliaryToggle,

  /// Left direction. Typically used to strafe left.
  Left,

  /// Right direction. Typically used to strafe right.
  Right,

  /// Forward direction.
  Forward,

  /// Backward direction.
  Backward,

  /// Up direction. Typically used to move up.
  Up,

  /// Down direction. Typically used to move down.
  Down,

  /// Increase a scene parameter, such as the texture opacity.
  Increase,

  /// Decrease a scene parameter, such as the texture opacity.
  Decrease,

  /// Primary action (typically a mouse button) pressed.
  PrimaryPressed,

  /// Primary action released.
  PrimaryReleased,

  /// Cursor moved to a new position, in window coordinates.
  CursorMoved { x: f32, y: f32 },

  /// Vertical scroll.
  VScroll { amount: f32 },

  /// Framebuffer size changed.
  Resized { width: u32, height: u32 },
}

/// What to do after a frame has been rendered.
#[derive(Debug)]
pub enum LoopFeedback<T> {
  Continue(T),
  Exit,
}

/// Features a scene requires from the platform.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Features {
  textures: Vec<String>,
  models: Vec<String>,
  capture_cursor: bool,
}

impl Features {
  /// No feature at all.
  pub fn none() -> Self {
    Self::default()
  }

  /// Require a texture to be loaded.
  pub fn texture(mut self, name: impl Into<String>) -> Self {
    self.textures.push(name.into());
    self
  }

  /// Require a model (and its material textures) to be loaded.
  pub fn model(mut self, name: impl Into<String>) -> Self {
    self.models.push(name.into());
    self
  }

  /// Hide and capture the cursor so that cursor moves drive the camera.
  pub fn capture_cursor(mut self) -> Self {
    self.capture_cursor = true;
    self
  }

  pub fn textures(&self) -> &[String] {
    &self.textures
  }

  pub fn models(&self) -> &[String] {
    &self.models
  }

  pub fn captures_cursor(&self) -> bool {
    self.capture_cursor
  }
}

/// Services the platform offers to scenes.
pub trait PlatformServices {
  type FetchError: Error + 'static;

  /// Fetch a texture previously declared in [`Features`], or referenced by a declared model.
  ///
  /// Images are flipped vertically so that their first row is the bottom row.
  fn fetch_texture(&mut self, name: impl AsRef<str>) -> Result<&image::RgbImage, Self::FetchError>;

  /// Fetch a model previously declared in [`Features`].
  fn fetch_model(&mut self, name: impl AsRef<str>) -> Result<&ModelData, Self::FetchError>;
}

/// What can go wrong while bootstrapping a scene.
#[derive(Debug)]
pub enum SceneError {
  /// The platform could not provide an asset.
  CannotFetch {
    name: String,
    source: Box<dyn Error>,
  },

  /// A shader program failed to compile or link.
  CannotBuildProgram { name: String, reason: String },

  /// A tessellation could not be created.
  CannotCreateTess(String),

  /// A texture could not be created.
  CannotCreateTexture(String),

  /// Model data is unusable (out-of-range indices, etc.).
  InvalidModel(String),
}

impl SceneError {
  pub fn fetch(name: impl Into<String>, source: impl Error + 'static) -> Self {
    SceneError::CannotFetch {
      name: name.into(),
      source: Box::new(source),
    }
  }
}

impl fmt::Display for SceneError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      SceneError::CannotFetch {
        ref name,
        ref source,
      } => write!(f, "cannot fetch {}: {}", name, source),

      SceneError::CannotBuildProgram {
        ref name,
        ref reason,
      } => write!(f, "cannot build the {} program: {}", name, reason),

      SceneError::CannotCreateTess(ref e) => write!(f, "cannot create tessellation: {}", e),

      SceneError::CannotCreateTexture(ref e) => write!(f, "cannot create texture: {}", e),

      SceneError::InvalidModel(ref e) => write!(f, "invalid model: {}", e),
    }
  }
}

impl Error for SceneError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      SceneError::CannotFetch { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn features_accumulate() {
    let features = Features::none()
      .texture("cat2.jpeg")
      .texture("planets.jpeg")
      .model("backpack/backpack.obj")
      .capture_cursor();

    assert_eq!(features.textures(), ["cat2.jpeg", "planets.jpeg"]);
    assert_eq!(features.models(), ["backpack/backpack.obj"]);
    assert!(features.captures_cursor());
  }

  #[test]
  fn no_features() {
    let features = Features::none();

    assert!(features.textures().is_empty());
    assert!(features.models().is_empty());
    assert!(!features.captures_cursor());
  }

  #[test]
  fn fetch_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err = SceneError::fetch("cat2.jpeg", io);

    assert_eq!(err.to_string(), "cannot fetch cat2.jpeg: gone");
    assert!(err.source().is_some());
  }
}

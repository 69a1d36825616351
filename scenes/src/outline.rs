//! Stenciled outlines.
//!
//! Outlining an object takes two draws. The first one renders the object normally and writes 1 into the stencil
//! buffer wherever it lands. The second one renders a slightly enlarged silhouette of the same object with a flat
//! color, only where the stencil is not 1: what remains visible is a rim around the object. The silhouette ignores
//! the depth buffer so that outlines show through other geometry.
//!
//! The framebuffer stencil must be cleared to 0 at the beginning of every frame drawing outlines.

use cgmath::Vector3;
use luminance_front::{
  depth_stencil::{Comparison, StencilOp, StencilOperations, StencilTest},
  render_state::RenderState,
};

use crate::transform::Transform;

/// Stencil value written by the first pass.
pub const STENCIL_MARK: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
  pub color: Vector3<f32>,
  pub thickness: f32,
}

impl Outline {
  pub fn new(color: Vector3<f32>, thickness: f32) -> Self {
    Outline { color, thickness }
  }

  /// Transform of the silhouette: the object's, grown by the thickness on every axis.
  ///
  /// The thickness is added rather than multiplied, so that it does not depend on the size of the object.
  pub fn expanded(&self, transform: &Transform) -> Transform {
    let t = self.thickness;

    Transform {
      scale: transform.scale + Vector3::new(t, t, t),
      ..*transform
    }
  }

  /// State of the first pass: `base` plus stencil marking.
  pub fn mark_state(base: RenderState) -> RenderState {
    base
      .set_stencil_test(StencilTest::new(Comparison::Always, STENCIL_MARK, 0xFF))
      .set_stencil_operations(
        StencilOperations::default().on_depth_stencil_pass(StencilOp::Replace),
      )
  }

  /// State of the silhouette pass.
  pub fn silhouette_state() -> RenderState {
    RenderState::default()
      .set_face_culling(None)
      .set_depth_test(None)
      .set_stencil_test(StencilTest::new(Comparison::NotEqual, STENCIL_MARK, 0xFF))
      // the stencil is only read here
      .set_stencil_operations(StencilOperations::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::InnerSpace;
  use luminance_front::face_culling::{FaceCulling, FaceCullingMode, FaceCullingOrder};

  #[test]
  fn expanded_adds_thickness() {
    let outline = Outline::new(Vector3::new(0.04, 0.28, 0.26), 0.1);
    let transform = Transform::new(Vector3::new(5., 0., 0.), Vector3::new(2., 2., 1.));
    let expanded = outline.expanded(&transform);

    assert_eq!(expanded.position, transform.position);
    assert!((expanded.scale - Vector3::new(2.1, 2.1, 1.1)).magnitude() < 1e-6);
  }

  #[test]
  fn mark_state_keeps_base() {
    let culling = FaceCulling::new(FaceCullingOrder::CCW, FaceCullingMode::Back);
    let base = RenderState::default().set_face_culling(culling);
    let mark = Outline::mark_state(base);

    let expected = RenderState::default()
      .set_face_culling(culling)
      .set_stencil_test(StencilTest::new(Comparison::Always, 1, 0xFF))
      .set_stencil_operations(
        StencilOperations::default()
          .on_depth_passes_stencil_fails(StencilOp::Keep)
          .on_depth_fails_stencil_passes(StencilOp::Keep)
          .on_depth_stencil_pass(StencilOp::Replace),
      );

    assert_eq!(mark, expected);
  }

  #[test]
  fn silhouette_never_writes_stencil() {
    let expected = RenderState::default()
      .set_depth_test(None)
      .set_stencil_test(StencilTest::new(Comparison::NotEqual, 1, 0xFF));

    assert_eq!(Outline::silhouette_state(), expected);
    assert_ne!(
      Outline::silhouette_state(),
      Outline::mark_state(RenderState::default())
    );
  }
}

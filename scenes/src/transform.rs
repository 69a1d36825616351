//! Model and normal matrices.

use cgmath::{Deg, InnerSpace, Matrix, Matrix3, Matrix4, Rad, SquareMatrix, Vector3};

use crate::shared::CUBE_SPIN_AXIS;

/// Placement of an object in the world: translated, then scaled about its origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
  pub position: Vector3<f32>,
  pub scale: Vector3<f32>,
}

impl Default for Transform {
  fn default() -> Self {
    Transform {
      position: Vector3::new(0., 0., 0.),
      scale: Vector3::new(1., 1., 1.),
    }
  }
}

impl Transform {
  pub fn new(position: Vector3<f32>, scale: Vector3<f32>) -> Self {
    Transform { position, scale }
  }

  pub fn at(position: Vector3<f32>) -> Self {
    Transform {
      position,
      ..Self::default()
    }
  }

  pub fn uniformly_scaled(mut self, scale: f32) -> Self {
    self.scale = Vector3::new(scale, scale, scale);
    self
  }

  /// `T(position) · S(scale)`.
  pub fn model_matrix(&self) -> Matrix4<f32> {
    Matrix4::from_translation(self.position)
      * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
  }

  pub fn normal_matrix(&self) -> Matrix3<f32> {
    normal_matrix(&self.model_matrix())
  }
}

/// Upper-left 3×3 block of the inverse transpose of a model matrix.
///
/// Degenerate matrices (a zero scale on an axis, for instance) have no inverse; the identity is returned instead.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
  match model.invert() {
    Some(inverse) => {
      let m = inverse.transpose();
      Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate())
    }

    None => Matrix3::identity(),
  }
}

/// Model matrix of the `index`-th spinning cube: turned by `t` radians plus 20° per index around a fixed axis.
pub fn spinning_cube(position: Vector3<f32>, index: usize, t: f32) -> Matrix4<f32> {
  let axis = Vector3::from(CUBE_SPIN_AXIS).normalize();
  let angle = Rad(t) + Rad::from(Deg(20. * index as f32));

  Matrix4::from_translation(position) * Matrix4::from_axis_angle(axis, angle)
}

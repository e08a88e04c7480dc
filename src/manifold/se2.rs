//! SE(2) - Special Euclidean Group in 2D
//!
//! This module implements the Special Euclidean group SE(2), which represents
//! rigid body transformations in 2D space (rotation + translation).
//!
//! SE(2) elements are a combination of a 2D rotation ([`SO2`]) and a
//! `Vector2<f64>` translation. SE(2) tangent elements are `Vector3<f64>`
//! with component order `[x, y, theta]`.
//!
//! The retraction used crate-wide is the rotation-adjusted chart
//! `X ⊞ δ = (R ⊕ δθ, t + R·δt)`. Under this chart the adjoint-based
//! Jacobian identities hold exactly:
//! `∂(g₁∘g₂)/∂g₁ = Ad(g₂⁻¹)`, `∂(g₁∘g₂)/∂g₂ = I`, `∂(g⁻¹)/∂g = −Ad(g)`.

use crate::manifold::{LieGroup, Point2, SO2};
use nalgebra::{Matrix3, Vector3};
use std::fmt;

/// SE(2) group element representing rigid body transformations in 2D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SE2 {
    /// Rotation part as SO2
    rotation: SO2,
    /// Translation part as 2D vector
    translation: Point2,
}

impl fmt::Display for SE2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SE2(translation: [{:.4}, {:.4}], rotation: {:.4})",
            self.translation.x,
            self.translation.y,
            self.angle()
        )
    }
}

impl SE2 {
    /// Create a new SE2 element from rotation and translation.
    pub fn new(rotation: SO2, translation: Point2) -> Self {
        SE2 {
            rotation,
            translation,
        }
    }

    /// Create SE2 from translation components and angle.
    pub fn from_xy_angle(x: f64, y: f64, theta: f64) -> Self {
        SE2::new(SO2::from_angle(theta), Point2::new(x, y))
    }

    /// Get the rotation part.
    pub fn rotation(&self) -> &SO2 {
        &self.rotation
    }

    /// Get the translation part.
    pub fn translation(&self) -> Point2 {
        self.translation
    }

    /// Get the x component of translation.
    pub fn x(&self) -> f64 {
        self.translation.x
    }

    /// Get the y component of translation.
    pub fn y(&self) -> f64 {
        self.translation.y
    }

    /// Get the rotation angle in radians.
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// Get the homogeneous transformation matrix (3x3).
    pub fn matrix(&self) -> Matrix3<f64> {
        let r = self.rotation.rotation_matrix();
        Matrix3::new(
            r[(0, 0)],
            r[(0, 1)],
            self.translation.x,
            r[(1, 0)],
            r[(1, 1)],
            self.translation.y,
            0.0,
            0.0,
            1.0,
        )
    }

    /// Transform a 2D point: R·p + t.
    pub fn act(&self, point: &Point2) -> Point2 {
        self.rotation.rotate(point) + self.translation
    }

    /// Check approximate equality in all three pose coordinates.
    pub fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        (self.x() - other.x()).abs() < tolerance
            && (self.y() - other.y()).abs() < tolerance
            && (self.angle() - other.angle()).abs() < tolerance
    }
}

impl LieGroup for SE2 {
    type TangentVector = Vector3<f64>;
    type JacobianMatrix = Matrix3<f64>;

    const DOF: usize = 3;

    fn identity() -> Self {
        SE2::new(SO2::identity(), Point2::zeros())
    }

    /// SE(2) composition: rotations multiply; the right translation is
    /// rotated into the left frame and added.
    fn compose(&self, other: &Self) -> Self {
        SE2::new(
            self.rotation.compose(&other.rotation),
            self.translation + self.rotation.rotate(&other.translation),
        )
    }

    /// SE(2) inverse: (R⁻¹, −R⁻¹·t).
    fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        SE2::new(inv_rotation, -inv_rotation.rotate(&self.translation))
    }

    /// Retraction `X ⊞ δ`: the angle component retracts the rotation, the
    /// translation component is rotated into the pose frame and added.
    fn retract(&self, tangent: &Vector3<f64>) -> Self {
        SE2::new(
            self.rotation.retract(&tangent.z),
            self.translation + self.rotation.rotate(&tangent.xy()),
        )
    }

    /// Adjoint matrix for tangent ordering [x, y, θ]:
    ///
    /// ```text
    /// Ad(X) = [ cos −sin   t_y ]
    ///         [ sin  cos  −t_x ]
    ///         [  0    0     1  ]
    /// ```
    fn adjoint(&self) -> Matrix3<f64> {
        let cos = self.rotation.cos_angle();
        let sin = self.rotation.sin_angle();
        Matrix3::new(
            cos,
            -sin,
            self.translation.y,
            sin,
            cos,
            -self.translation.x,
            0.0,
            0.0,
            1.0,
        )
    }

    /// Random pose with angle uniform in [−π, π) and translation in a
    /// [−5, 5) box.
    fn random() -> Self {
        SE2::new(
            SO2::random(),
            Point2::new(
                rand::random::<f64>() * 10.0 - 5.0,
                rand::random::<f64>() * 10.0 - 5.0,
            ),
        )
    }

    fn normalize(&mut self) {
        self.rotation.normalize();
    }

    fn is_valid(&self, tolerance: f64) -> bool {
        self.rotation.is_valid(tolerance)
    }
}

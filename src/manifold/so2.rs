//! SO(2) - Special Orthogonal Group in 2D
//!
//! This module implements the Special Orthogonal group SO(2), which represents
//! rotations in 2D space.
//!
//! SO(2) elements are represented using nalgebra's UnitComplex internally,
//! i.e. the (cos θ, sin θ) pair on the unit circle. SO(2) tangent elements
//! are a single angle in radians.

use crate::manifold::{LieGroup, Point2};
use nalgebra::{Matrix2, UnitComplex};
use std::fmt;

/// SO(2) group element representing rotations in 2D.
///
/// Internally represented using nalgebra's `UnitComplex<f64>`. The unit-circle
/// invariant cos²+sin²=1 holds up to floating-point drift under long
/// composition chains; see [`LieGroup::normalize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SO2 {
    /// Internal representation as a unit complex number
    complex: UnitComplex<f64>,
}

impl fmt::Display for SO2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SO2(angle: {:.4})", self.angle())
    }
}

impl SO2 {
    /// Create a new SO(2) element from a unit complex number.
    pub fn new(complex: UnitComplex<f64>) -> Self {
        SO2 { complex }
    }

    /// Create SO(2) from an angle in radians.
    pub fn from_angle(angle: f64) -> Self {
        SO2::new(UnitComplex::from_angle(angle))
    }

    /// Create SO(2) directly from a (cos, sin) pair.
    ///
    /// The pair is taken as-is; callers are responsible for it lying on the
    /// unit circle.
    pub fn from_cos_sin(cos: f64, sin: f64) -> Self {
        SO2::new(UnitComplex::from_cos_sin_unchecked(cos, sin))
    }

    /// Get the underlying unit complex number.
    pub fn complex(&self) -> UnitComplex<f64> {
        self.complex
    }

    /// Get the rotation angle in radians, continuous branch in (−π, π].
    pub fn angle(&self) -> f64 {
        self.complex.angle()
    }

    /// Cosine of the rotation angle.
    pub fn cos_angle(&self) -> f64 {
        self.complex.re
    }

    /// Sine of the rotation angle.
    pub fn sin_angle(&self) -> f64 {
        self.complex.im
    }

    /// Rotate a 2D vector.
    pub fn rotate(&self, v: &Point2) -> Point2 {
        self.complex.transform_vector(v)
    }

    /// Get the rotation matrix (2x2).
    pub fn rotation_matrix(&self) -> Matrix2<f64> {
        self.complex.to_rotation_matrix().into_inner()
    }
}

impl LieGroup for SO2 {
    type TangentVector = f64;
    type JacobianMatrix = f64;

    const DOF: usize = 1;

    fn identity() -> Self {
        SO2 {
            complex: UnitComplex::identity(),
        }
    }

    /// SO(2) composition: the complex product of the two unit-circle
    /// representations. The product of two unit-modulus numbers stays
    /// unit-modulus up to ULP drift, so no renormalization is applied.
    fn compose(&self, other: &Self) -> Self {
        SO2 {
            complex: self.complex * other.complex,
        }
    }

    /// SO(2) inverse: rotation by −θ, i.e. (cos, −sin).
    fn inverse(&self) -> Self {
        SO2 {
            complex: self.complex.inverse(),
        }
    }

    /// Apply a tangent-space update by composing the rotation of the tangent
    /// angle. SO(2) is abelian, so left and right composition coincide.
    fn retract(&self, tangent: &f64) -> Self {
        SO2::from_angle(*tangent).compose(self)
    }

    /// The adjoint of SO(2) is the identity map on the tangent scalar.
    fn adjoint(&self) -> f64 {
        1.0
    }

    /// Random rotation with angle uniform in [−π, π).
    fn random() -> Self {
        SO2::from_angle(rand::random::<f64>() * std::f64::consts::TAU - std::f64::consts::PI)
    }

    fn normalize(&mut self) {
        self.complex.renormalize_fast();
    }

    fn is_valid(&self, tolerance: f64) -> bool {
        (self.complex.norm_sqr() - 1.0).abs() < tolerance
    }
}

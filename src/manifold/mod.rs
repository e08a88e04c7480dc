//! Manifold representations for optimization over planar poses.
//!
//! This module provides the two Lie groups used by the pose-graph solver:
//! - **SO(2)**: rotations in 2D, stored as a unit complex number
//! - **SE(2)**: rigid transformations in 2D (rotation + translation)
//!
//! Lie group M,° | size | dim | X ∈ M            | Constraint | T_X M     | Comp. | Action
//! ------------- | ---- | --- | ---------------- | ---------- | --------- | ----- | ------
//! Rotation      | SO(2)| 1   | z ∈ C            | z*z = 1    | θ ∈ R     | z₁z₂  | zx
//! Rigid motion  | SE(2)| 3   | M = [R t; 0 1]   | RᵀR = I    | v ∈ R³    | M₁M₂  | Rx+t
//!
//! All group operations here are pure value computations; the matching
//! reverse-mode derivative rules live in [`crate::autodiff`]. Perturbations
//! use the chart `X ⊞ δ = (R ⊕ δθ, t + R·δt)`, which agrees with the
//! exponential map to first order and keeps the adjoint-based Jacobian
//! identities of `compose`, `inverse` and `between` exact.

use nalgebra::Vector2;
use std::fmt::Debug;

pub mod se2;
pub mod so2;

pub use se2::SE2;
pub use so2::SO2;

/// A 2D point / translation. Ordinary vector space; its tangent space is
/// itself.
pub type Point2 = Vector2<f64>;

/// Core trait for the Lie group operations shared by SO(2) and SE(2).
///
/// Retraction replaces the in-place "move along tangent" mutation of other
/// frameworks: it is a pure function from a point and a tangent vector back
/// onto the manifold, used as the optimizer update rule.
pub trait LieGroup: Clone + Debug + PartialEq {
    /// The tangent space vector type (R for SO(2), R³ for SE(2))
    type TangentVector: Clone + Debug + PartialEq;

    /// The Jacobian/adjoint matrix type
    type JacobianMatrix: Clone + Debug + PartialEq;

    /// Degrees of freedom - dimension of the tangent space
    const DOF: usize;

    /// Get the identity element of the group.
    fn identity() -> Self;

    /// Group composition g₁ ∘ g₂.
    fn compose(&self, other: &Self) -> Self;

    /// Group inverse g⁻¹ such that g ∘ g⁻¹ = e.
    fn inverse(&self) -> Self;

    /// Relative transformation g₁⁻¹ ∘ g₂, carrying `self` to `other`.
    ///
    /// This is the residual primitive used by odometry factors.
    fn between(&self, other: &Self) -> Self {
        self.inverse().compose(other)
    }

    /// Apply a tangent-space perturbation and return the retracted element.
    fn retract(&self, tangent: &Self::TangentVector) -> Self;

    /// Adjoint matrix Ad(g), transporting tangent vectors between frames.
    fn adjoint(&self) -> Self::JacobianMatrix;

    /// Generate a random element (useful for property tests).
    fn random() -> Self;

    /// Re-project the element onto the manifold.
    ///
    /// Composition does not renormalize eagerly; long-running optimizations
    /// accumulate ULP-level drift and may call this periodically.
    fn normalize(&mut self);

    /// Check that the element satisfies the manifold constraint.
    fn is_valid(&self, tolerance: f64) -> bool;
}

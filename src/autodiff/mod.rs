//! Reverse-mode automatic differentiation for manifold computations.
//!
//! This is not a general autodiff engine: it differentiates a small fixed
//! set of operations (rotation composition/inversion/angle, pose
//! composition/inversion/between, pose coordinate reads, and the scalar
//! arithmetic needed for squared-error costs). Each forward operation is
//! paired with its hand-derived vector-Jacobian product, and the chain rule
//! is applied explicitly by a single reverse sweep over the [`tape::Tape`].
//!
//! Gradients are expressed in the tangent space of each input: a scalar
//! angle for SO(2), `[x, y, theta]` for SE(2), matching the retraction
//! charts in [`crate::manifold`].

pub mod jacobian;
pub mod tape;

pub use jacobian::pose_jacobian;
pub use tape::{Gradients, PoseVar, RotVar, ScalarVar, Tape};

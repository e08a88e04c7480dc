//! Differentiable planar pose manifolds and a minimal Pose2SLAM solver.
//!
//! The crate is built around three layers:
//! - [`manifold`]: SO(2) and SE(2) Lie group types with composition,
//!   inversion, the `between` operator, adjoint matrices and tangent-space
//!   retraction.
//! - [`autodiff`]: a reverse-mode tape over a fixed set of manifold and
//!   scalar operations, each paired with its hand-derived vector-Jacobian
//!   product.
//! - [`factors`] and [`optimizer`]: odometry-chain cost assembly and
//!   gradient-descent updates by retraction.

pub mod autodiff;
pub mod error;
pub mod factors;
pub mod logger;
pub mod manifold;
pub mod optimizer;
pub mod tracking;

pub use error::{Error, Result};
pub use logger::{init_logger, init_logger_with_level};

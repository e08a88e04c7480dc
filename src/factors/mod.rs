//! Pose-graph cost assembly.
//!
//! A trajectory of N poses and N−1 relative-motion measurements form an
//! odometry chain; its scalar loss is the diagonally weighted squared error
//! of the `between` residuals. The gradient with respect to every pose is
//! obtained in one reverse pass over the [`crate::autodiff`] tape.

pub mod odometry;

pub use odometry::{loop_closure_error, FactorError, OdometryChain};

//! Odometry-chain cost for planar pose graphs.
//!
//! For poses `p[0..N]` and measurements `m[0..N-1]`, residual i is
//!
//! ```text
//! r_i = between(between(p[i+1], p[i]), m[i])
//! ```
//!
//! mapped through the diagonal squared error
//! `e(r) = w_θ·θ² + w_x·x² + w_y·y²` and summed; an overall scale factor
//! completes the loss. The weights encode a diagonal approximation of the
//! measurement covariance.

use crate::autodiff::tape::{PoseVar, ScalarVar, Tape};
use crate::manifold::{LieGroup, SE2};
use nalgebra::Vector3;
use thiserror::Error;

/// Errors raised during cost assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorError {
    /// The trajectory length does not match the measurement chain.
    #[error("trajectory has {poses} poses but the chain expects {expected}")]
    TrajectoryLength { poses: usize, expected: usize },
}

/// Loop-closure residual: magnitude of `between(last, first).translation`.
///
/// Used as the test-level convergence criterion; the optimizer itself never
/// monitors it.
pub fn loop_closure_error(trajectory: &[SE2]) -> f64 {
    match (trajectory.last(), trajectory.first()) {
        (Some(last), Some(first)) => last.between(first).translation().norm(),
        _ => 0.0,
    }
}

/// An odometry chain: relative-motion measurements with diagonal weights.
///
/// Owns its measurements and configuration; the trajectory is always passed
/// in explicitly, so no outer mutable state is captured.
#[derive(Clone, Debug)]
pub struct OdometryChain {
    measurements: Vec<SE2>,
    /// Diagonal weights `[w_x, w_y, w_θ]` in tangent order
    weights: Vector3<f64>,
    /// Overall loss scale
    scale: f64,
}

impl OdometryChain {
    pub fn new(measurements: Vec<SE2>, weights: Vector3<f64>, scale: f64) -> Self {
        OdometryChain {
            measurements,
            weights,
            scale,
        }
    }

    /// Number of poses the chain constrains.
    pub fn num_poses(&self) -> usize {
        self.measurements.len() + 1
    }

    fn check_trajectory(&self, trajectory: &[SE2]) -> Result<(), FactorError> {
        if trajectory.len() != self.num_poses() {
            return Err(FactorError::TrajectoryLength {
                poses: trajectory.len(),
                expected: self.num_poses(),
            });
        }
        Ok(())
    }

    /// Residual of constraint `i` for the given trajectory.
    pub fn residual(&self, trajectory: &[SE2], i: usize) -> Result<SE2, FactorError> {
        self.check_trajectory(trajectory)?;
        Ok(trajectory[i + 1]
            .between(&trajectory[i])
            .between(&self.measurements[i]))
    }

    /// Diagonal squared error of a single residual pose.
    fn error(&self, residual: &SE2) -> f64 {
        self.weights.z * residual.angle() * residual.angle()
            + self.weights.x * residual.x() * residual.x()
            + self.weights.y * residual.y() * residual.y()
    }

    /// Forward-only loss evaluation.
    pub fn loss(&self, trajectory: &[SE2]) -> Result<f64, FactorError> {
        self.check_trajectory(trajectory)?;
        let mut total = 0.0;
        for (i, measurement) in self.measurements.iter().enumerate() {
            let residual = trajectory[i + 1].between(&trajectory[i]).between(measurement);
            total += self.error(&residual);
        }
        Ok(self.scale * total)
    }

    /// Loss and its gradient with respect to every pose's tangent space,
    /// from a single reverse pass.
    pub fn loss_and_gradient(
        &self,
        trajectory: &[SE2],
    ) -> Result<(f64, Vec<Vector3<f64>>), FactorError> {
        self.check_trajectory(trajectory)?;
        if self.measurements.is_empty() {
            return Ok((0.0, vec![Vector3::zeros(); trajectory.len()]));
        }

        let mut tape = Tape::new();
        let poses: Vec<PoseVar> = trajectory.iter().map(|pose| tape.pose(*pose)).collect();

        let mut sum: Option<ScalarVar> = None;
        for (i, measurement) in self.measurements.iter().enumerate() {
            let m = tape.pose(*measurement);
            let rel = tape.pose_between(poses[i + 1], poses[i]);
            let residual = tape.pose_between(rel, m);
            let e = self.error_node(&mut tape, residual);
            sum = Some(match sum {
                Some(acc) => tape.add(acc, e),
                None => e,
            });
        }
        // measurements checked non-empty above
        let Some(sum) = sum else { unreachable!() };
        let total = tape.scale(sum, self.scale);

        let grads = tape.backward(total);
        let gradient = poses.iter().map(|var| grads.wrt_pose(*var)).collect();
        Ok((tape.scalar_value(total), gradient))
    }

    fn error_node(&self, tape: &mut Tape, residual: PoseVar) -> ScalarVar {
        let x = tape.pose_x(residual);
        let y = tape.pose_y(residual);
        let theta = tape.pose_theta(residual);

        let x2 = tape.mul(x, x);
        let y2 = tape.mul(y, y);
        let theta2 = tape.mul(theta, theta);

        let wx2 = tape.scale(x2, self.weights.x);
        let wy2 = tape.scale(y2, self.weights.y);
        let wtheta2 = tape.scale(theta2, self.weights.z);

        let xy = tape.add(wx2, wy2);
        tape.add(xy, wtheta2)
    }
}

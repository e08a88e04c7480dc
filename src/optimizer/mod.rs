//! First-order optimizers over pose trajectories.
//!
//! A gradient step retracts each pose along the negated, scaled tangent
//! gradient, so iterates stay on the manifold with no renormalization step.
//! [`Sgd`] wraps the step in a fixed-iteration driver over an
//! [`OdometryChain`] loss.

use crate::factors::{FactorError, OdometryChain};
use crate::manifold::{LieGroup, SE2};
use nalgebra::Vector3;
use thiserror::Error;

/// Errors raised during optimization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizerError {
    /// The gradient vector and the trajectory disagree in length.
    #[error("gradient has {gradients} components but the trajectory has {poses} poses")]
    DimensionMismatch { poses: usize, gradients: usize },
    /// Cost evaluation failed.
    #[error(transparent)]
    Factor(#[from] FactorError),
}

/// Apply one gradient-descent step in place.
///
/// Each pose moves by `retract(-learning_rate * gradient)` in its own
/// tangent space.
pub fn gradient_descent_step(
    trajectory: &mut [SE2],
    gradient: &[Vector3<f64>],
    learning_rate: f64,
) -> Result<(), OptimizerError> {
    if trajectory.len() != gradient.len() {
        return Err(OptimizerError::DimensionMismatch {
            poses: trajectory.len(),
            gradients: gradient.len(),
        });
    }
    for (pose, g) in trajectory.iter_mut().zip(gradient) {
        *pose = pose.retract(&(-learning_rate * g));
    }
    Ok(())
}

/// Stochastic gradient descent with a constant learning rate.
///
/// With a single cost term per call this reduces to plain gradient descent;
/// the name reflects the intended use with sampled subsets of constraints.
#[derive(Clone, Copy, Debug)]
pub struct Sgd {
    learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Sgd { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Apply one update from an already computed gradient.
    pub fn update(
        &self,
        trajectory: &mut [SE2],
        gradient: &[Vector3<f64>],
    ) -> Result<(), OptimizerError> {
        gradient_descent_step(trajectory, gradient, self.learning_rate)
    }

    /// Minimize the chain loss for a fixed number of iterations.
    ///
    /// Returns the loss after the final update.
    pub fn run(
        &self,
        chain: &OdometryChain,
        trajectory: &mut [SE2],
        iterations: usize,
    ) -> Result<f64, OptimizerError> {
        for iteration in 0..iterations {
            let (loss, gradient) = chain.loss_and_gradient(trajectory)?;
            self.update(trajectory, &gradient)?;
            if iteration % 100 == 0 {
                tracing::debug!(iteration, loss, "sgd iteration");
            }
        }
        Ok(chain.loss(trajectory)?)
    }
}

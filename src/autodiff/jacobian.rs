//! Reverse-mode Jacobian extraction for pose-valued maps.
//!
//! Seeding the backward pass with each basis cotangent of the output pose
//! yields one row of the Jacobian per sweep (a vector-Jacobian product with
//! `eᵢ` recovers row i). The result is expressed in the tangent charts of
//! the inputs and output, so `∂(g₁∘g₂)/∂[g₁|g₂] = [Ad(g₂⁻¹) | I]` and
//! `∂(g⁻¹)/∂g = −Ad(g)` hold exactly.

use crate::autodiff::tape::{PoseVar, Tape};
use crate::manifold::SE2;
use nalgebra::{DMatrix, Vector3};

/// Compute the 3×3N Jacobian of a pose-valued map of N poses.
///
/// The closure records the map on the tape using the supplied input
/// variables and returns the output variable.
///
/// # Example
/// ```
/// use planar_slam::autodiff::pose_jacobian;
/// use planar_slam::manifold::SE2;
///
/// let pose = SE2::from_xy_angle(1.0, 2.0, 0.3);
/// let jac = pose_jacobian(|tape, vars| tape.pose_inverse(vars[0]), &[pose]);
/// assert_eq!(jac.nrows(), 3);
/// assert_eq!(jac.ncols(), 3);
/// ```
pub fn pose_jacobian<F>(f: F, inputs: &[SE2]) -> DMatrix<f64>
where
    F: Fn(&mut Tape, &[PoseVar]) -> PoseVar,
{
    let mut tape = Tape::new();
    let vars: Vec<PoseVar> = inputs.iter().map(|pose| tape.pose(*pose)).collect();
    let output = f(&mut tape, &vars);

    let mut jacobian = DMatrix::<f64>::zeros(3, 3 * inputs.len());
    for row in 0..3 {
        let mut seed = Vector3::zeros();
        seed[row] = 1.0;
        let grads = tape.backward_pose(output, seed);
        for (block, var) in vars.iter().enumerate() {
            let grad = grads.wrt_pose(*var);
            for col in 0..3 {
                jacobian[(row, 3 * block + col)] = grad[col];
            }
        }
    }
    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifold::LieGroup;
    use nalgebra::Matrix3;

    const TOLERANCE: f64 = 1e-10;

    fn assert_matrix_eq(actual: &DMatrix<f64>, expected: &DMatrix<f64>, tolerance: f64) {
        assert_eq!(actual.shape(), expected.shape());
        for row in 0..actual.nrows() {
            for col in 0..actual.ncols() {
                assert!(
                    (actual[(row, col)] - expected[(row, col)]).abs() < tolerance,
                    "mismatch at ({row}, {col}): {} vs {}",
                    actual[(row, col)],
                    expected[(row, col)]
                );
            }
        }
    }

    fn to_dmatrix(m: &Matrix3<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(3, 3, |r, c| m[(r, c)])
    }

    #[test]
    fn test_jacobian_of_identity_is_identity() {
        for _ in 0..10 {
            let pose = SE2::random();
            let jac = pose_jacobian(|_tape, vars| vars[0], &[pose]);
            assert_matrix_eq(&jac, &to_dmatrix(&Matrix3::identity()), TOLERANCE);
        }
    }

    #[test]
    fn test_jacobian_of_inverse_is_negative_adjoint() {
        for _ in 0..10 {
            let pose = SE2::random();
            let jac = pose_jacobian(|tape, vars| tape.pose_inverse(vars[0]), &[pose]);
            assert_matrix_eq(&jac, &to_dmatrix(&-pose.adjoint()), TOLERANCE);
        }
    }

    #[test]
    fn test_jacobian_of_compose() {
        // [Ad(rhs⁻¹) | I], horizontally concatenated.
        for _ in 0..10 {
            let lhs = SE2::random();
            let rhs = SE2::random();
            let jac = pose_jacobian(
                |tape, vars| tape.pose_compose(vars[0], vars[1]),
                &[lhs, rhs],
            );

            let mut expected = DMatrix::<f64>::zeros(3, 6);
            let adj = rhs.inverse().adjoint();
            for row in 0..3 {
                for col in 0..3 {
                    expected[(row, col)] = adj[(row, col)];
                }
                expected[(row, row + 3)] = 1.0;
            }
            assert_matrix_eq(&jac, &expected, TOLERANCE);
        }
    }

    #[test]
    fn test_jacobian_of_between_wrt_target_is_identity() {
        for _ in 0..10 {
            let lhs = SE2::random();
            let rhs = SE2::random();
            let jac = pose_jacobian(
                |tape, vars| tape.pose_between(vars[0], vars[1]),
                &[lhs, rhs],
            );
            for row in 0..3 {
                for col in 0..3 {
                    let expected = if row == col { 1.0 } else { 0.0 };
                    assert!((jac[(row, col + 3)] - expected).abs() < TOLERANCE);
                }
            }
        }
    }

    #[test]
    fn test_jacobian_of_compose_matches_finite_differences() {
        let eps = 1e-7;
        let lhs = SE2::from_xy_angle(0.4, -0.9, 0.7);
        let rhs = SE2::from_xy_angle(-1.2, 0.3, -0.4);
        let jac = pose_jacobian(
            |tape, vars| tape.pose_compose(vars[0], vars[1]),
            &[lhs, rhs],
        );

        let composed = lhs.compose(&rhs);
        for axis in 0..3 {
            let mut delta = nalgebra::Vector3::zeros();
            delta[axis] = eps;
            let plus = lhs.retract(&delta).compose(&rhs);
            // First-order chart difference of the perturbed composition.
            let diff = composed.inverse().compose(&plus);
            let local = composed
                .rotation()
                .inverse()
                .rotate(&(plus.translation() - composed.translation()));
            let fd = nalgebra::Vector3::new(local.x / eps, local.y / eps, diff.angle() / eps);
            for row in 0..3 {
                assert!(
                    (jac[(row, axis)] - fd[row]).abs() < 1e-5,
                    "axis {axis} row {row}: {} vs {}",
                    jac[(row, axis)],
                    fd[row]
                );
            }
        }
    }
}

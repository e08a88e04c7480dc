//! Tape-based reverse-mode differentiation over SO(2)/SE(2) operations.
//!
//! A [`Tape`] records every operation as a node holding its forward value
//! and the indices of its parents. [`Tape::backward`] seeds a cotangent at
//! one node and sweeps the tape in reverse, applying each node's
//! vector-Jacobian product to accumulate cotangents at its parents.
//!
//! Derivative rules (hand-derived, exact under the crate's retraction
//! charts):
//!
//! | operation      | pullback                                      |
//! |----------------|-----------------------------------------------|
//! | rot compose    | pass-through to both operands                 |
//! | rot inverse    | negation                                      |
//! | rot angle      | identity (dθ/dδ = 1)                          |
//! | pose compose   | `Ad(rhs⁻¹)ᵀ·v` to lhs, `v` to rhs             |
//! | pose inverse   | `−Ad(x)ᵀ·v`                                   |
//! | pose x read    | `v·(cos, −sin, 0)`                            |
//! | pose y read    | `v·(sin, cos, 0)`                             |
//! | pose theta read| `v·(0, 0, 1)`                                 |

use crate::manifold::{LieGroup, SE2, SO2};
use nalgebra::Vector3;

/// Handle to a rotation-valued tape node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotVar(usize);

/// Handle to a pose-valued tape node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoseVar(usize);

/// Handle to a scalar-valued tape node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalarVar(usize);

#[derive(Clone, Debug)]
enum Value {
    Rot(SO2),
    Pose(SE2),
    Scalar(f64),
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Input,
    RotCompose { lhs: usize, rhs: usize },
    RotInverse { arg: usize },
    RotAngle { arg: usize },
    PoseCompose { lhs: usize, rhs: usize },
    PoseInverse { arg: usize },
    PoseX { arg: usize },
    PoseY { arg: usize },
    PoseTheta { arg: usize },
    Add { lhs: usize, rhs: usize },
    Mul { lhs: usize, rhs: usize },
    Scale { arg: usize, factor: f64 },
}

/// Cotangent stored per node, matching the node's value kind.
#[derive(Clone, Debug)]
enum Adjoint {
    Rot(f64),
    Pose(Vector3<f64>),
    Scalar(f64),
}

struct Node {
    value: Value,
    op: Op,
}

/// Records a computation over rotations, poses and scalars for one backward
/// pass.
///
/// Nodes only ever reference earlier nodes, so a single reverse iteration
/// implements the chain rule.
#[derive(Default)]
pub struct Tape {
    nodes: Vec<Node>,
}

impl Tape {
    pub fn new() -> Self {
        Tape { nodes: Vec::new() }
    }

    fn push(&mut self, value: Value, op: Op) -> usize {
        self.nodes.push(Node { value, op });
        self.nodes.len() - 1
    }

    fn rot_at(&self, index: usize) -> SO2 {
        match &self.nodes[index].value {
            Value::Rot(r) => *r,
            _ => unreachable!("typed handle pointed at a non-rotation node"),
        }
    }

    fn pose_at(&self, index: usize) -> SE2 {
        match &self.nodes[index].value {
            Value::Pose(p) => *p,
            _ => unreachable!("typed handle pointed at a non-pose node"),
        }
    }

    fn scalar_at(&self, index: usize) -> f64 {
        match &self.nodes[index].value {
            Value::Scalar(s) => *s,
            _ => unreachable!("typed handle pointed at a non-scalar node"),
        }
    }

    // Inputs

    /// Register a rotation input.
    pub fn rot(&mut self, rotation: SO2) -> RotVar {
        RotVar(self.push(Value::Rot(rotation), Op::Input))
    }

    /// Register a pose input.
    pub fn pose(&mut self, pose: SE2) -> PoseVar {
        PoseVar(self.push(Value::Pose(pose), Op::Input))
    }

    /// Register a scalar input.
    pub fn scalar(&mut self, value: f64) -> ScalarVar {
        ScalarVar(self.push(Value::Scalar(value), Op::Input))
    }

    // Rotation operations

    pub fn rot_compose(&mut self, lhs: RotVar, rhs: RotVar) -> RotVar {
        let value = self.rot_at(lhs.0).compose(&self.rot_at(rhs.0));
        RotVar(self.push(
            Value::Rot(value),
            Op::RotCompose {
                lhs: lhs.0,
                rhs: rhs.0,
            },
        ))
    }

    pub fn rot_inverse(&mut self, arg: RotVar) -> RotVar {
        let value = self.rot_at(arg.0).inverse();
        RotVar(self.push(Value::Rot(value), Op::RotInverse { arg: arg.0 }))
    }

    /// Relative rotation `lhs⁻¹ ∘ rhs`, built from the inverse and compose
    /// primitives so the chain rule runs through both.
    pub fn rot_between(&mut self, lhs: RotVar, rhs: RotVar) -> RotVar {
        let inv = self.rot_inverse(lhs);
        self.rot_compose(inv, rhs)
    }

    /// Extract the rotation angle as a differentiable scalar.
    pub fn rot_angle(&mut self, arg: RotVar) -> ScalarVar {
        let value = self.rot_at(arg.0).angle();
        ScalarVar(self.push(Value::Scalar(value), Op::RotAngle { arg: arg.0 }))
    }

    // Pose operations

    pub fn pose_compose(&mut self, lhs: PoseVar, rhs: PoseVar) -> PoseVar {
        let value = self.pose_at(lhs.0).compose(&self.pose_at(rhs.0));
        PoseVar(self.push(
            Value::Pose(value),
            Op::PoseCompose {
                lhs: lhs.0,
                rhs: rhs.0,
            },
        ))
    }

    pub fn pose_inverse(&mut self, arg: PoseVar) -> PoseVar {
        let value = self.pose_at(arg.0).inverse();
        PoseVar(self.push(Value::Pose(value), Op::PoseInverse { arg: arg.0 }))
    }

    /// Relative pose `lhs⁻¹ ∘ rhs`, built from the inverse and compose
    /// primitives.
    pub fn pose_between(&mut self, lhs: PoseVar, rhs: PoseVar) -> PoseVar {
        let inv = self.pose_inverse(lhs);
        self.pose_compose(inv, rhs)
    }

    /// Extract the x translation coordinate as a differentiable scalar.
    pub fn pose_x(&mut self, arg: PoseVar) -> ScalarVar {
        let value = self.pose_at(arg.0).x();
        ScalarVar(self.push(Value::Scalar(value), Op::PoseX { arg: arg.0 }))
    }

    /// Extract the y translation coordinate as a differentiable scalar.
    pub fn pose_y(&mut self, arg: PoseVar) -> ScalarVar {
        let value = self.pose_at(arg.0).y();
        ScalarVar(self.push(Value::Scalar(value), Op::PoseY { arg: arg.0 }))
    }

    /// Extract the rotation angle of a pose as a differentiable scalar.
    pub fn pose_theta(&mut self, arg: PoseVar) -> ScalarVar {
        let value = self.pose_at(arg.0).angle();
        ScalarVar(self.push(Value::Scalar(value), Op::PoseTheta { arg: arg.0 }))
    }

    // Scalar operations

    pub fn add(&mut self, lhs: ScalarVar, rhs: ScalarVar) -> ScalarVar {
        let value = self.scalar_at(lhs.0) + self.scalar_at(rhs.0);
        ScalarVar(self.push(
            Value::Scalar(value),
            Op::Add {
                lhs: lhs.0,
                rhs: rhs.0,
            },
        ))
    }

    pub fn mul(&mut self, lhs: ScalarVar, rhs: ScalarVar) -> ScalarVar {
        let value = self.scalar_at(lhs.0) * self.scalar_at(rhs.0);
        ScalarVar(self.push(
            Value::Scalar(value),
            Op::Mul {
                lhs: lhs.0,
                rhs: rhs.0,
            },
        ))
    }

    pub fn scale(&mut self, arg: ScalarVar, factor: f64) -> ScalarVar {
        let value = self.scalar_at(arg.0) * factor;
        ScalarVar(self.push(Value::Scalar(value), Op::Scale { arg: arg.0, factor }))
    }

    // Forward value accessors

    pub fn rot_value(&self, var: RotVar) -> SO2 {
        self.rot_at(var.0)
    }

    pub fn pose_value(&self, var: PoseVar) -> SE2 {
        self.pose_at(var.0)
    }

    pub fn scalar_value(&self, var: ScalarVar) -> f64 {
        self.scalar_at(var.0)
    }

    // Backward pass

    /// Reverse sweep from a scalar loss, seeded with cotangent 1.
    pub fn backward(&self, loss: ScalarVar) -> Gradients {
        self.backward_seeded(loss.0, Adjoint::Scalar(1.0))
    }

    /// Reverse sweep from a scalar node with an explicit seed.
    pub fn backward_scalar(&self, output: ScalarVar, seed: f64) -> Gradients {
        self.backward_seeded(output.0, Adjoint::Scalar(seed))
    }

    /// Reverse sweep from a pose node with an explicit cotangent seed.
    ///
    /// Seeding the three basis cotangents in turn yields the rows of the
    /// Jacobian of a pose-valued map; see [`crate::autodiff::jacobian`].
    pub fn backward_pose(&self, output: PoseVar, seed: Vector3<f64>) -> Gradients {
        self.backward_seeded(output.0, Adjoint::Pose(seed))
    }

    fn zero_adjoint(value: &Value) -> Adjoint {
        match value {
            Value::Rot(_) => Adjoint::Rot(0.0),
            Value::Pose(_) => Adjoint::Pose(Vector3::zeros()),
            Value::Scalar(_) => Adjoint::Scalar(0.0),
        }
    }

    fn backward_seeded(&self, root: usize, seed: Adjoint) -> Gradients {
        let mut adjoints: Vec<Adjoint> = self
            .nodes
            .iter()
            .map(|node| Self::zero_adjoint(&node.value))
            .collect();
        adjoints[root] = seed;

        // Nodes after the root cannot influence it.
        for index in (0..=root).rev() {
            match self.nodes[index].op {
                Op::Input => {}
                Op::RotCompose { lhs, rhs } => {
                    let v = rot_adjoint(&adjoints[index]);
                    add_rot(&mut adjoints[lhs], v);
                    add_rot(&mut adjoints[rhs], v);
                }
                Op::RotInverse { arg } => {
                    let v = rot_adjoint(&adjoints[index]);
                    add_rot(&mut adjoints[arg], -v);
                }
                Op::RotAngle { arg } => {
                    let v = scalar_adjoint(&adjoints[index]);
                    add_rot(&mut adjoints[arg], v);
                }
                Op::PoseCompose { lhs, rhs } => {
                    let v = pose_adjoint(&adjoints[index]);
                    let transport = self.pose_at(rhs).inverse().adjoint().transpose();
                    add_pose(&mut adjoints[lhs], transport * v);
                    add_pose(&mut adjoints[rhs], v);
                }
                Op::PoseInverse { arg } => {
                    let v = pose_adjoint(&adjoints[index]);
                    let transport = self.pose_at(arg).adjoint().transpose();
                    add_pose(&mut adjoints[arg], -(transport * v));
                }
                Op::PoseX { arg } => {
                    let v = scalar_adjoint(&adjoints[index]);
                    let rot = *self.pose_at(arg).rotation();
                    add_pose(
                        &mut adjoints[arg],
                        v * Vector3::new(rot.cos_angle(), -rot.sin_angle(), 0.0),
                    );
                }
                Op::PoseY { arg } => {
                    let v = scalar_adjoint(&adjoints[index]);
                    let rot = *self.pose_at(arg).rotation();
                    add_pose(
                        &mut adjoints[arg],
                        v * Vector3::new(rot.sin_angle(), rot.cos_angle(), 0.0),
                    );
                }
                Op::PoseTheta { arg } => {
                    let v = scalar_adjoint(&adjoints[index]);
                    add_pose(&mut adjoints[arg], Vector3::new(0.0, 0.0, v));
                }
                Op::Add { lhs, rhs } => {
                    let v = scalar_adjoint(&adjoints[index]);
                    add_scalar(&mut adjoints[lhs], v);
                    add_scalar(&mut adjoints[rhs], v);
                }
                Op::Mul { lhs, rhs } => {
                    let v = scalar_adjoint(&adjoints[index]);
                    let lhs_value = self.scalar_at(lhs);
                    let rhs_value = self.scalar_at(rhs);
                    add_scalar(&mut adjoints[lhs], v * rhs_value);
                    add_scalar(&mut adjoints[rhs], v * lhs_value);
                }
                Op::Scale { arg, factor } => {
                    let v = scalar_adjoint(&adjoints[index]);
                    add_scalar(&mut adjoints[arg], v * factor);
                }
            }
        }

        Gradients { adjoints }
    }
}

fn rot_adjoint(adjoint: &Adjoint) -> f64 {
    match adjoint {
        Adjoint::Rot(v) => *v,
        _ => unreachable!("rotation node carried a non-rotation adjoint"),
    }
}

fn pose_adjoint(adjoint: &Adjoint) -> Vector3<f64> {
    match adjoint {
        Adjoint::Pose(v) => *v,
        _ => unreachable!("pose node carried a non-pose adjoint"),
    }
}

fn scalar_adjoint(adjoint: &Adjoint) -> f64 {
    match adjoint {
        Adjoint::Scalar(v) => *v,
        _ => unreachable!("scalar node carried a non-scalar adjoint"),
    }
}

fn add_rot(adjoint: &mut Adjoint, v: f64) {
    match adjoint {
        Adjoint::Rot(a) => *a += v,
        _ => unreachable!("rotation cotangent propagated to a non-rotation node"),
    }
}

fn add_pose(adjoint: &mut Adjoint, v: Vector3<f64>) {
    match adjoint {
        Adjoint::Pose(a) => *a += v,
        _ => unreachable!("pose cotangent propagated to a non-pose node"),
    }
}

fn add_scalar(adjoint: &mut Adjoint, v: f64) {
    match adjoint {
        Adjoint::Scalar(a) => *a += v,
        _ => unreachable!("scalar cotangent propagated to a non-scalar node"),
    }
}

/// Result of one backward pass: a cotangent per tape node, read out through
/// the typed handles of the inputs of interest.
pub struct Gradients {
    adjoints: Vec<Adjoint>,
}

impl Gradients {
    /// Gradient with respect to a rotation's tangent angle.
    pub fn wrt_rot(&self, var: RotVar) -> f64 {
        rot_adjoint(&self.adjoints[var.0])
    }

    /// Gradient with respect to a pose's tangent `[x, y, theta]`.
    pub fn wrt_pose(&self, var: PoseVar) -> Vector3<f64> {
        pose_adjoint(&self.adjoints[var.0])
    }

    /// Gradient with respect to a scalar input.
    pub fn wrt_scalar(&self, var: ScalarVar) -> f64 {
        scalar_adjoint(&self.adjoints[var.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_rot_between_derivative_signs() {
        // d between(r1, r2).angle is exactly -1 wrt r1 and +1 wrt r2.
        let mut tape = Tape::new();
        let r1 = tape.rot(SO2::from_angle(0.0));
        let r2 = tape.rot(SO2::from_angle(2.0));
        let rel = tape.rot_between(r1, r2);
        let theta = tape.rot_angle(rel);
        let grads = tape.backward(theta);
        assert_eq!(grads.wrt_rot(r1), -1.0);
        assert_eq!(grads.wrt_rot(r2), 1.0);
    }

    #[test]
    fn test_rot_between_derivative_signs_general_angles() {
        // Coverage away from the special angles 0 and 2 rad.
        for k in 0..20 {
            let a = -3.0 + 0.3 * k as f64;
            let b = 2.9 - 0.29 * k as f64;
            let mut tape = Tape::new();
            let r1 = tape.rot(SO2::from_angle(a));
            let r2 = tape.rot(SO2::from_angle(b));
            let rel = tape.rot_between(r1, r2);
            let theta = tape.rot_angle(rel);
            let grads = tape.backward(theta);
            assert_eq!(grads.wrt_rot(r1), -1.0);
            assert_eq!(grads.wrt_rot(r2), 1.0);
        }
    }

    #[test]
    fn test_rot_angle_derivative_is_one() {
        // dθ/dδ through the retraction chart is exactly 1 at every angle.
        for k in 0..30 {
            let angle = -3.0 + 0.2 * k as f64;
            let mut tape = Tape::new();
            let r = tape.rot(SO2::from_angle(angle));
            let theta = tape.rot_angle(r);
            let grads = tape.backward(theta);
            assert_eq!(grads.wrt_rot(r), 1.0);
        }
    }

    #[test]
    fn test_rot_angle_derivative_matches_finite_differences() {
        let eps = 1e-7;
        for k in 0..10 {
            let angle = -2.5 + 0.5 * k as f64;
            let rot = SO2::from_angle(angle);

            let mut tape = Tape::new();
            let r = tape.rot(rot);
            let theta = tape.rot_angle(r);
            let grad = tape.backward(theta).wrt_rot(r);

            let plus = rot.retract(&eps).angle();
            let minus = rot.retract(&(-eps)).angle();
            let fd = (plus - minus) / (2.0 * eps);
            assert!((grad - fd).abs() < 1e-6, "angle {angle}: {grad} vs {fd}");
        }
    }

    #[test]
    fn test_rot_compose_pullback_passthrough() {
        let mut tape = Tape::new();
        let a = tape.rot(SO2::from_angle(0.4));
        let b = tape.rot(SO2::from_angle(-1.1));
        let c = tape.rot_compose(a, b);
        let theta = tape.rot_angle(c);
        let loss = tape.scale(theta, 2.5);
        let grads = tape.backward(loss);
        assert!((grads.wrt_rot(a) - 2.5).abs() < TOLERANCE);
        assert!((grads.wrt_rot(b) - 2.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_scalar_ops() {
        // loss = (a*b + a) * 0.5 => dloss/da = 0.5*(b+1), dloss/db = 0.5*a
        let mut tape = Tape::new();
        let a = tape.scalar(3.0);
        let b = tape.scalar(4.0);
        let ab = tape.mul(a, b);
        let sum = tape.add(ab, a);
        let loss = tape.scale(sum, 0.5);
        assert!((tape.scalar_value(loss) - 7.5).abs() < TOLERANCE);
        let grads = tape.backward(loss);
        assert!((grads.wrt_scalar(a) - 2.5).abs() < TOLERANCE);
        assert!((grads.wrt_scalar(b) - 1.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_pose_between_forward_matches_manifold() {
        let p1 = SE2::from_xy_angle(1.0, 2.0, 0.5);
        let p2 = SE2::from_xy_angle(-0.5, 1.0, -0.7);
        let mut tape = Tape::new();
        let v1 = tape.pose(p1);
        let v2 = tape.pose(p2);
        let rel = tape.pose_between(v1, v2);
        assert!(tape.pose_value(rel).is_approx(&p1.between(&p2), TOLERANCE));
    }

    #[test]
    fn test_pose_coordinate_pullbacks_match_finite_differences() {
        let eps = 1e-7;
        let pose = SE2::from_xy_angle(0.8, -1.3, 0.6);
        for coord in 0..3 {
            let mut tape = Tape::new();
            let p = tape.pose(pose);
            let out = match coord {
                0 => tape.pose_x(p),
                1 => tape.pose_y(p),
                _ => tape.pose_theta(p),
            };
            let grad = tape.backward(out).wrt_pose(p);

            for axis in 0..3 {
                let mut delta = Vector3::zeros();
                delta[axis] = eps;
                let plus = pose.retract(&delta);
                delta[axis] = -eps;
                let minus = pose.retract(&delta);
                let read = |p: &SE2| match coord {
                    0 => p.x(),
                    1 => p.y(),
                    _ => p.angle(),
                };
                let fd = (read(&plus) - read(&minus)) / (2.0 * eps);
                assert!(
                    (grad[axis] - fd).abs() < 1e-6,
                    "coord {coord} axis {axis}: {} vs {fd}",
                    grad[axis]
                );
            }
        }
    }

    #[test]
    fn test_rot_gradient_descent_converges() {
        // Minimize between(r1, r2).angle² / 10 over r1; step size works out
        // to one fifth of the residual angle per iteration.
        let mut r1 = SO2::from_angle(0.0);
        let r2 = SO2::from_angle(1.0);

        for _ in 0..100 {
            let mut tape = Tape::new();
            let v1 = tape.rot(r1);
            let v2 = tape.rot(r2);
            let rel = tape.rot_between(v1, v2);
            let theta = tape.rot_angle(rel);
            let squared = tape.mul(theta, theta);
            let loss = tape.scale(squared, 0.1);
            let grads = tape.backward(loss);
            r1 = r1.retract(&(-grads.wrt_rot(v1)));
        }

        assert!((r1.angle() - r2.angle()).abs() < 1e-5);
    }
}

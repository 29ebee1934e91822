// manip_core/src/models/manipulator.rs

use nalgebra::{Matrix2, Matrix4, Matrix4x2};
use serde::{Deserialize, Serialize};

use crate::error::ControlError;
use crate::types::{JointState, Torque};

/// Physical parameters of the 2-DOF planar manipulator.
///
/// Links are modelled as uniform rods, the tip payload as a solid sphere.
/// Link parameters are fixed properties of the mechanism; the payload mass
/// `m3` and radius `r3` are the uncertain part and vary across the model
/// bank used by the adaptive controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialParams {
    /// First link length [m].
    pub l1: f64,
    /// First link radius [m].
    pub r1: f64,
    /// First link mass [kg].
    pub m1: f64,
    /// Second link length [m].
    pub l2: f64,
    /// Second link radius [m].
    pub r2: f64,
    /// Second link mass [kg].
    pub m2: f64,
    /// Tip payload mass [kg].
    pub m3: f64,
    /// Tip payload radius [m].
    pub r3: f64,
}

impl Default for InertialParams {
    fn default() -> Self {
        Self {
            l1: 0.5,
            r1: 0.04,
            m1: 3.0,
            l2: 0.4,
            r2: 0.04,
            m2: 2.4,
            m3: 0.0,
            r3: 0.05,
        }
    }
}

/// Scalar combinations of the inertial parameters that fully determine the
/// mass and Coriolis matrices. Computed once at model construction.
///
/// For a physically valid mechanism `alpha >= beta >= 0`, which makes the
/// mass matrix positive-definite for every configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicCoefficients {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Rigid-body dynamics of a 2-DOF planar manipulator with a point payload at
/// the tip.
///
/// Pure functions of (parameters, state, input): the model holds no mutable
/// state, so one instance can be shared by value across controllers and the
/// model bank is a plain `Vec` of these.
#[derive(Debug, Clone)]
pub struct ManipulatorModel {
    params: InertialParams,
    coeffs: DynamicCoefficients,
    tp: f64,
}

impl ManipulatorModel {
    /// Model with the fixed link set and the given payload assumption.
    pub fn new(tp: f64, m3: f64, r3: f64) -> Self {
        Self::from_params(
            tp,
            InertialParams {
                m3,
                r3,
                ..InertialParams::default()
            },
        )
    }

    /// Model from an explicit parameter set.
    pub fn from_params(tp: f64, params: InertialParams) -> Self {
        // Uniform rod links, solid sphere payload, mid-link centers of mass.
        let i1 = params.m1 * (3.0 * params.r1.powi(2) + params.l1.powi(2)) / 12.0;
        let i2 = params.m2 * (3.0 * params.r2.powi(2) + params.l2.powi(2)) / 12.0;
        let i3 = 2.0 / 5.0 * params.m3 * params.r3.powi(2);
        let d1 = params.l1 / 2.0;
        let d2 = params.l2 / 2.0;

        let alpha = params.m1 * d1.powi(2)
            + i1
            + params.m2 * (params.l1.powi(2) + d2.powi(2))
            + i2
            + params.m3 * (params.l1.powi(2) + params.l2.powi(2))
            + i3;
        let beta = params.m2 * params.l1 * d2 + params.m3 * params.l1 * params.l2;
        let gamma = params.m2 * d2.powi(2) + i2 + params.m3 * params.l2.powi(2) + i3;

        debug_assert!(
            alpha >= beta && beta >= 0.0,
            "inertial parameters violate alpha >= beta >= 0"
        );

        Self {
            params,
            coeffs: DynamicCoefficients { alpha, beta, gamma },
            tp,
        }
    }

    pub fn params(&self) -> &InertialParams {
        &self.params
    }

    pub fn coefficients(&self) -> &DynamicCoefficients {
        &self.coeffs
    }

    /// Control period the model was configured with [s].
    pub fn sample_period(&self) -> f64 {
        self.tp
    }

    /// Configuration-dependent mass matrix `M(x)`.
    ///
    /// Symmetric and positive-definite for every `q2` given valid
    /// parameters. Recomputed on every call; `q2` changes every tick, so
    /// there is nothing worth caching.
    pub fn mass_matrix(&self, x: &JointState) -> Matrix2<f64> {
        let DynamicCoefficients { alpha, beta, gamma } = self.coeffs;
        let c2 = x[1].cos();

        Matrix2::new(
            alpha + 2.0 * beta * c2,
            gamma + beta * c2,
            gamma + beta * c2,
            gamma,
        )
    }

    /// Velocity-dependent Coriolis/centrifugal matrix `C(x)`.
    ///
    /// Vanishes when both joint velocities are zero.
    pub fn coriolis_matrix(&self, x: &JointState) -> Matrix2<f64> {
        let beta = self.coeffs.beta;
        let s2 = x[1].sin();
        let (q1_dot, q2_dot) = (x[2], x[3]);

        Matrix2::new(
            -beta * s2 * q2_dot,
            -beta * s2 * (q1_dot + q2_dot),
            beta * s2 * q1_dot,
            0.0,
        )
    }

    /// Continuous-time state derivative `x_dot = A(x)·x + B(x)·u` with
    /// `A[2.., 2..] = -M⁻¹C` and `B[2..] = M⁻¹`.
    pub fn dx(&self, u: &Torque, x: &JointState) -> Result<JointState, ControlError> {
        let m_inv = self
            .mass_matrix(x)
            .try_inverse()
            .ok_or(ControlError::SingularMassMatrix { q2: x[1] })?;
        let c = self.coriolis_matrix(x);

        let mut a = Matrix4::<f64>::zeros();
        a.fixed_view_mut::<2, 2>(0, 2)
            .copy_from(&Matrix2::identity());
        a.fixed_view_mut::<2, 2>(2, 2).copy_from(&(-m_inv * c));

        let mut b = Matrix4x2::<f64>::zeros();
        b.fixed_view_mut::<2, 2>(2, 0).copy_from(&m_inv);

        Ok(a * x + b * u)
    }

    /// One forward-Euler tick of the dynamics over the model's period.
    ///
    /// Used for one-step-ahead prediction when scoring candidate models; the
    /// period is short enough that a single Euler step is an adequate
    /// predictor.
    pub fn step(&self, u: &Torque, x: &JointState) -> Result<JointState, ControlError> {
        Ok(x + self.tp * self.dx(u, x)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Vector2, Vector4};
    use std::f64::consts::PI;

    const TP: f64 = 1e-3;

    #[test]
    fn mass_matrix_is_symmetric_positive_definite_over_configuration_grid() {
        let model = ManipulatorModel::new(TP, 1.0, 0.3);

        for k in 0..=100 {
            let q2 = -PI + 2.0 * PI * k as f64 / 100.0;
            let x = Vector4::new(0.3, q2, 0.0, 0.0);
            let m = model.mass_matrix(&x);

            assert_abs_diff_eq!(m[(0, 1)], m[(1, 0)], epsilon = 1e-12);
            assert!(
                m.cholesky().is_some(),
                "M not positive-definite at q2 = {q2}"
            );
        }
    }

    #[test]
    fn coriolis_matrix_vanishes_at_zero_velocity() {
        let model = ManipulatorModel::new(TP, 0.1, 0.05);

        for k in 0..=20 {
            let q2 = -PI + 2.0 * PI * k as f64 / 20.0;
            let x = Vector4::new(1.1, q2, 0.0, 0.0);
            assert_eq!(model.coriolis_matrix(&x), Matrix2::zeros());
        }
    }

    #[test]
    fn mass_matrix_at_origin_matches_coefficients() {
        // Default payload: m3 = 0, r3 = 0.05. Coefficients computed by hand
        // from l1=0.5, r1=0.04, m1=3.0, l2=0.4, r2=0.04, m2=2.4.
        let model = ManipulatorModel::new(TP, 0.0, 0.05);
        let DynamicCoefficients { alpha, beta, gamma } = *model.coefficients();

        let i1 = 3.0 * (3.0 * 0.04f64.powi(2) + 0.5f64.powi(2)) / 12.0;
        let i2 = 2.4 * (3.0 * 0.04f64.powi(2) + 0.4f64.powi(2)) / 12.0;
        assert_abs_diff_eq!(
            alpha,
            3.0 * 0.25f64.powi(2) + i1 + 2.4 * (0.5f64.powi(2) + 0.2f64.powi(2)) + i2,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(beta, 2.4 * 0.5 * 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(gamma, 2.4 * 0.2f64.powi(2) + i2, epsilon = 1e-12);

        let m = model.mass_matrix(&Vector4::zeros());
        assert_abs_diff_eq!(m[(0, 0)], alpha + 2.0 * beta, epsilon = 1e-12);
        assert_abs_diff_eq!(m[(0, 1)], gamma + beta, epsilon = 1e-12);
        assert_abs_diff_eq!(m[(1, 0)], gamma + beta, epsilon = 1e-12);
        assert_abs_diff_eq!(m[(1, 1)], gamma, epsilon = 1e-12);
    }

    #[test]
    fn derivative_has_block_structure() {
        let model = ManipulatorModel::new(TP, 0.1, 0.05);
        let x = Vector4::new(0.4, -0.7, 0.6, -0.2);
        let u = Vector2::new(1.5, -0.5);

        let dx = model.dx(&u, &x).unwrap();

        // Upper block: position derivatives are the velocities.
        assert_abs_diff_eq!(dx[0], x[2], epsilon = 1e-12);
        assert_abs_diff_eq!(dx[1], x[3], epsilon = 1e-12);

        // Lower block: q_ddot = M⁻¹ (u - C q_dot).
        let m_inv = model.mass_matrix(&x).try_inverse().unwrap();
        let q_dot = Vector2::new(x[2], x[3]);
        let q_ddot = m_inv * (u - model.coriolis_matrix(&x) * q_dot);
        assert_abs_diff_eq!(dx[2], q_ddot[0], epsilon = 1e-12);
        assert_abs_diff_eq!(dx[3], q_ddot[1], epsilon = 1e-12);
    }

    #[test]
    fn step_is_forward_euler_over_dx() {
        let model = ManipulatorModel::new(TP, 0.01, 0.01);
        let x = Vector4::new(-0.2, 0.9, 0.1, 0.4);
        let u = Vector2::new(0.3, 0.8);

        let expected = x + TP * model.dx(&u, &x).unwrap();
        assert_eq!(model.step(&u, &x).unwrap(), expected);
    }
}

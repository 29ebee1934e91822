// manip_core/src/controllers/feedback_linearization.rs

use crate::controllers::Controller;
use crate::error::ControlError;
use crate::models::ManipulatorModel;
use crate::types::{JointState, JointVec, Torque};

/// Default target closed-loop natural frequency [rad/s].
const OMEGA_C: f64 = 50.0;
/// Default damping ratio (critically damped).
const XI: f64 = 1.0;

/// Exact feedback linearization on a nominal model.
///
/// Computes `u = M(x)·v + C(x)·q_dot` with a virtual acceleration command
/// `v = q_r_ddot + kd·(q_r_dot − q_dot) + kp·(q_r − q)`, which cancels the
/// manipulator nonlinearities and leaves decoupled second-order error
/// dynamics with poles placed by `(omega_c, xi)`.
///
/// Valid only while the model matches the true plant; there is no robustness
/// margin against payload mismatch. That gap is what the ADRC and
/// multiple-model controllers address.
#[derive(Debug, Clone)]
pub struct FeedbackLinearizationController {
    model: ManipulatorModel,
    kp: f64,
    kd: f64,
}

impl FeedbackLinearizationController {
    /// Controller on the nominal unloaded model with the default pole
    /// placement (`omega_c = 50`, `xi = 1`).
    pub fn new(tp: f64) -> Self {
        Self::with_gains(tp, OMEGA_C, XI)
    }

    /// Controller with explicit pole placement: `kp = omega_c²`,
    /// `kd = 2·xi·omega_c`.
    pub fn with_gains(tp: f64, omega_c: f64, xi: f64) -> Self {
        Self {
            model: ManipulatorModel::new(tp, 0.0, 0.05),
            kp: omega_c.powi(2),
            kd: 2.0 * xi * omega_c,
        }
    }

    pub fn model(&self) -> &ManipulatorModel {
        &self.model
    }
}

impl Controller for FeedbackLinearizationController {
    fn calculate_control(
        &mut self,
        x: &JointState,
        q_r: &JointVec,
        q_r_dot: &JointVec,
        q_r_ddot: &JointVec,
    ) -> Result<Torque, ControlError> {
        let q = x.fixed_rows::<2>(0).into_owned();
        let q_dot = x.fixed_rows::<2>(2).into_owned();

        let v = q_r_ddot + self.kd * (q_r_dot - q_dot) + self.kp * (q_r - q);

        Ok(self.model.mass_matrix(x) * v + self.model.coriolis_matrix(x) * q_dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector4};

    const TP: f64 = 1e-3;

    #[test]
    fn zero_error_on_reference_yields_pure_feedforward() {
        let mut ctrl = FeedbackLinearizationController::new(TP);
        let x = Vector4::new(0.3, -0.4, 0.1, 0.2);
        let q_r = Vector2::new(0.3, -0.4);
        let q_r_dot = Vector2::new(0.1, 0.2);
        let q_r_ddot = Vector2::new(0.5, -0.1);

        let u = ctrl.calculate_control(&x, &q_r, &q_r_dot, &q_r_ddot).unwrap();

        let q_dot = Vector2::new(0.1, 0.2);
        let expected = ctrl.model().mass_matrix(&x) * q_r_ddot
            + ctrl.model().coriolis_matrix(&x) * q_dot;
        assert!((u - expected).norm() < 1e-12);
    }

    #[test]
    fn converges_to_constant_reference_on_matched_plant() {
        // True plant equals the nominal model, so linearization is exact and
        // the error dynamics have a double pole at -omega_c.
        let plant = ManipulatorModel::new(TP, 0.0, 0.05);
        let mut ctrl = FeedbackLinearizationController::new(TP);

        let q_r = Vector2::new(0.5, -0.3);
        let zero = Vector2::zeros();
        let mut x = Vector4::zeros();

        for _ in 0..2000 {
            let u = ctrl.calculate_control(&x, &q_r, &zero, &zero).unwrap();
            x = plant.step(&u, &x).unwrap();
        }

        assert!((x[0] - q_r[0]).abs() < 1e-3, "q1 = {} vs {}", x[0], q_r[0]);
        assert!((x[1] - q_r[1]).abs() < 1e-3, "q2 = {} vs {}", x[1], q_r[1]);
        assert!(x[2].abs() < 1e-3 && x[3].abs() < 1e-3);
    }
}

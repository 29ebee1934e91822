// manip_core/src/controllers/adrc.rs

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::controllers::{AdrcJointController, Controller};
use crate::error::ControlError;
use crate::models::ManipulatorModel;
use crate::types::{JointState, JointVec, Torque};

/// Per-joint ADRC configuration: initial gain, PD gains, observer bandwidth
/// and initial measured state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdrcJointConfig {
    pub b: f64,
    pub kp: f64,
    pub kd: f64,
    pub p: f64,
    pub q0: Vec<f64>,
}

/// Two-joint active disturbance rejection controller.
///
/// Holds one nominal dynamics model and one [`AdrcJointController`] per
/// joint. The plant is treated as locally decoupled: each joint's
/// instantaneous control-to-acceleration gain is the corresponding diagonal
/// entry of `M(x)⁻¹`, re-evaluated every tick, and the inertial coupling is
/// left to the observers as disturbance. [`coupling`](Self::coupling)
/// exposes the neglected part so the residual of that approximation can be
/// measured.
#[derive(Debug, Clone)]
pub struct AdrcController {
    model: ManipulatorModel,
    joints: [AdrcJointController; 2],
}

impl AdrcController {
    /// Aggregator with the nominal payload assumption (`m3 = 0.1`,
    /// `r3 = 0.5`) and one joint controller per config entry.
    pub fn new(tp: f64, configs: [AdrcJointConfig; 2]) -> Result<Self, ControlError> {
        let model = ManipulatorModel::new(tp, 0.1, 0.5);
        let make = |c: &AdrcJointConfig| {
            AdrcJointController::new(c.b, c.kp, c.kd, c.p, &c.q0, tp)
        };
        let joints = [make(&configs[0])?, make(&configs[1])?];
        Ok(Self { model, joints })
    }

    pub fn model(&self) -> &ManipulatorModel {
        &self.model
    }

    pub fn joints(&self) -> &[AdrcJointController; 2] {
        &self.joints
    }

    /// Re-estimate each joint's high-frequency gain at the current
    /// configuration: `b_i = M(x)⁻¹[i, i]`, the true control-to-acceleration
    /// gain of joint `i` with the other joint's input ignored.
    pub fn update_gains(&mut self, x: &JointState) -> Result<(), ControlError> {
        let m_inv = self
            .model
            .mass_matrix(x)
            .try_inverse()
            .ok_or(ControlError::SingularMassMatrix { q2: x[1] })?;
        for (i, joint) in self.joints.iter_mut().enumerate() {
            joint.set_b(m_inv[(i, i)])?;
        }
        Ok(())
    }

    /// Off-diagonal part of `M(x)`: the inertial coupling the per-joint gain
    /// approximation hands to the observers as disturbance.
    pub fn coupling(&self, x: &JointState) -> Matrix2<f64> {
        let m = self.model.mass_matrix(x);
        Matrix2::new(0.0, m[(0, 1)], m[(1, 0)], 0.0)
    }
}

impl Controller for AdrcController {
    fn calculate_control(
        &mut self,
        x: &JointState,
        q_d: &JointVec,
        q_d_dot: &JointVec,
        q_d_ddot: &JointVec,
    ) -> Result<Torque, ControlError> {
        self.update_gains(x)?;

        let mut u = Torque::zeros();
        for (i, joint) in self.joints.iter_mut().enumerate() {
            let x_joint = Vector2::new(x[i], x[i + 2]);
            u[i] = joint.calculate_control(&x_joint, q_d[i], q_d_dot[i], q_d_ddot[i])?;
        }
        Ok(u)
    }
}

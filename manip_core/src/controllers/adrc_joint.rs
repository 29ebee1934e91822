// manip_core/src/controllers/adrc_joint.rs

use nalgebra::{matrix, vector, Vector1, Vector2, Vector3};

use crate::error::ControlError;
use crate::observers::Eso;

/// Gains below this magnitude are rejected; dividing by them would turn a
/// modelling problem into an arbitrarily large torque.
const MIN_GAIN: f64 = 1e-9;

/// Active disturbance rejection control for a single joint.
///
/// Treats the joint as a double integrator with unknown input gain `b` and a
/// lumped disturbance (coupling to the other joint, Coriolis terms, payload
/// mismatch). A third-order ESO estimates position, velocity and the
/// disturbance from the position measurement alone; the control law cancels
/// the disturbance estimate and closes a PD loop on the residual dynamics:
///
/// `u = (q_d_ddot + kd·(q_d_dot − v̂) + kp·(q_d − q̂) − f̂) / b`
///
/// The true gain varies with the manipulator configuration, so the owning
/// aggregator calls [`set_b`](Self::set_b) every tick before the control
/// step.
#[derive(Debug, Clone)]
pub struct AdrcJointController {
    b: f64,
    kp: f64,
    kd: f64,
    eso: Eso<3, 1>,
    last_u: f64,
}

impl AdrcJointController {
    /// Joint controller with initial gain `b`, PD gains `kp`/`kd`, observer
    /// bandwidth `p` (triple observer pole at `-p`) and initial measured
    /// state `q0` (zero-padded to the observer dimension).
    pub fn new(
        b: f64,
        kp: f64,
        kd: f64,
        p: f64,
        q0: &[f64],
        tp: f64,
    ) -> Result<Self, ControlError> {
        if b.abs() < MIN_GAIN {
            return Err(ControlError::DegenerateGain(b));
        }

        // Integrator chain: position <- velocity <- disturbance. The input
        // enters on the velocity channel only.
        let a = matrix![
            0.0, 1.0, 0.0;
            0.0, 0.0, 1.0;
            0.0, 0.0, 0.0
        ];
        let b_eso = vector![0.0, b, 0.0];
        let w = matrix![1.0, 0.0, 0.0];
        let l = vector![3.0 * p, 3.0 * p.powi(2), p.powi(3)];
        let eso = Eso::new(a, b_eso, w, l, q0, tp)?;

        Ok(Self {
            b,
            kp,
            kd,
            eso,
            last_u: 0.0,
        })
    }

    /// Current high-frequency gain.
    pub fn gain(&self) -> f64 {
        self.b
    }

    /// Update the gain and reconfigure the observer's input vector so its
    /// internal model matches the new belief.
    pub fn set_b(&mut self, b: f64) -> Result<(), ControlError> {
        if b.abs() < MIN_GAIN {
            return Err(ControlError::DegenerateGain(b));
        }
        self.b = b;
        self.eso.set_input_gain(vector![0.0, b, 0.0]);
        Ok(())
    }

    /// Estimated `[position, velocity, disturbance]`.
    pub fn estimate(&self) -> &Vector3<f64> {
        self.eso.state()
    }

    /// One control tick for this joint.
    ///
    /// `x_joint` is the measured `[position, velocity]` slice of the full
    /// state; only the position feeds the observer, the velocity estimate
    /// comes from the ESO. The observer is advanced with the previous tick's
    /// torque, matching the one-sample latency of the real loop.
    pub fn calculate_control(
        &mut self,
        x_joint: &Vector2<f64>,
        q_d: f64,
        q_d_dot: f64,
        q_d_ddot: f64,
    ) -> Result<f64, ControlError> {
        self.eso.update(&Vector1::new(x_joint[0]), self.last_u);

        let est = self.eso.state();
        let (q_hat, v_hat, f_hat) = (est[0], est[1], est[2]);

        let u = (q_d_ddot + self.kd * (q_d_dot - v_hat) + self.kp * (q_d - q_hat) - f_hat)
            / self.b;
        self.last_u = u;
        Ok(u)
    }
}

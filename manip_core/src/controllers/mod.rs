// manip_core/src/controllers/mod.rs

pub mod adrc;
pub mod adrc_joint;
pub mod feedback_linearization;
pub mod mma;

pub use adrc::{AdrcController, AdrcJointConfig};
pub use adrc_joint::AdrcJointController;
pub use feedback_linearization::FeedbackLinearizationController;
pub use mma::MmaController;

use crate::error::ControlError;
use crate::types::{JointState, JointVec, Torque};

/// One control tick: full manipulator state plus the desired trajectory
/// slice in, joint torques out.
///
/// Called once per fixed period `tp` by an external simulation or hardware
/// loop. Implementations own their models and observer state exclusively;
/// a tick reads the previous state, computes, mutates, returns. Identical
/// input sequences produce identical torque sequences.
pub trait Controller {
    fn calculate_control(
        &mut self,
        x: &JointState,
        q_r: &JointVec,
        q_r_dot: &JointVec,
        q_r_ddot: &JointVec,
    ) -> Result<Torque, ControlError>;
}

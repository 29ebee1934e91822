// manip_core/src/prelude.rs

// A single import for downstream simulation/driver loops.
pub use crate::controllers::{
    AdrcController, AdrcJointConfig, AdrcJointController, Controller,
    FeedbackLinearizationController, MmaController,
};
pub use crate::error::ControlError;
pub use crate::models::{DynamicCoefficients, InertialParams, ManipulatorModel};
pub use crate::observers::Eso;
pub use crate::types::{JointState, JointVec, Torque};

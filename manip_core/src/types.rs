// manip_core/src/types.rs

use nalgebra::{Vector2, Vector4};

// --- Core Type Aliases ---

/// Full manipulator state: `[q1, q2, q1_dot, q2_dot]`.
/// Angles in radians, velocities in rad/s.
pub type JointState = Vector4<f64>;

/// One value per joint, e.g. a slice of a reference trajectory
/// (positions, velocities or accelerations).
pub type JointVec = Vector2<f64>;

/// Joint torque command, one entry per joint.
pub type Torque = Vector2<f64>;

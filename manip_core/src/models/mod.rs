// manip_core/src/models/mod.rs

pub mod manipulator;

pub use manipulator::{DynamicCoefficients, InertialParams, ManipulatorModel};

// manip_core/src/error.rs

use thiserror::Error;

/// Failures surfaced by the dynamics model, observer and controllers.
///
/// Every error is returned to the caller of the current control tick;
/// nothing is retried or recovered internally. A tick that cannot produce a
/// safe torque must fail loudly rather than emit a plausible-looking value.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ControlError {
    /// The mass matrix has no inverse at the current configuration. This
    /// cannot happen for a physically valid parameter set; hitting it means
    /// the model was constructed from bad data.
    #[error("mass matrix is singular at q2 = {q2} rad")]
    SingularMassMatrix { q2: f64 },

    /// The ADRC high-frequency gain is too close to zero to divide by.
    #[error("high-frequency gain b = {0} is too close to zero")]
    DegenerateGain(f64),

    /// An initial observer state with more entries than the observer
    /// dimension. Shorter states are zero-padded; longer ones are rejected.
    #[error("observer initial state has {got} entries, observer dimension is {dim}")]
    DimensionMismatch { dim: usize, got: usize },

    /// A multiple-model controller was handed no candidate models; there is
    /// nothing to select from.
    #[error("multiple-model bank is empty")]
    EmptyModelBank,
}

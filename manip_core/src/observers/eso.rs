// manip_core/src/observers/eso.rs

use nalgebra::{SMatrix, SVector};

use crate::error::ControlError;

/// Linear discrete-time extended state observer.
///
/// Generic over the augmented state dimension `N` and the measurement
/// dimension `M`; the matrices are supplied by the owning controller, so the
/// observer itself knows nothing about the plant beyond the state-space
/// shape `x_dot = A·x + b·u + L·(y − W·x)`.
///
/// The last augmented state is a lumped disturbance channel: unmodelled
/// dynamics and parameter mismatch land there, where the controller can read
/// and cancel them directly.
#[derive(Debug, Clone)]
pub struct Eso<const N: usize, const M: usize> {
    a: SMatrix<f64, N, N>,
    b: SVector<f64, N>,
    w: SMatrix<f64, M, N>,
    l: SMatrix<f64, N, M>,
    state: SVector<f64, N>,
    tp: f64,
    history: Vec<SVector<f64, N>>,
}

impl<const N: usize, const M: usize> Eso<N, M> {
    /// Observer with the given state-space matrices and period `tp`.
    ///
    /// `q0` is the measured part of the initial condition and is zero-padded
    /// to dimension `N` (the disturbance channel starts at zero). An initial
    /// state longer than `N` is rejected.
    pub fn new(
        a: SMatrix<f64, N, N>,
        b: SVector<f64, N>,
        w: SMatrix<f64, M, N>,
        l: SMatrix<f64, N, M>,
        q0: &[f64],
        tp: f64,
    ) -> Result<Self, ControlError> {
        if q0.len() > N {
            return Err(ControlError::DimensionMismatch {
                dim: N,
                got: q0.len(),
            });
        }
        let mut state = SVector::<f64, N>::zeros();
        for (dst, src) in state.iter_mut().zip(q0) {
            *dst = *src;
        }

        Ok(Self {
            a,
            b,
            w,
            l,
            state,
            tp,
            history: Vec::new(),
        })
    }

    /// Replace the input-distribution vector.
    ///
    /// Called when the owning controller re-estimates the plant gain, so the
    /// observer's internal model stays consistent with that belief.
    pub fn set_input_gain(&mut self, b: SVector<f64, N>) {
        self.b = b;
    }

    /// One forward-Euler step of the observer dynamics:
    /// `state += tp · (A·state + b·u + L·(y − W·state))`.
    ///
    /// The pre-update state is appended to the history first.
    pub fn update(&mut self, y: &SVector<f64, M>, u: f64) {
        self.history.push(self.state);

        let innovation = y - self.w * self.state;
        let state_dot = self.a * self.state + self.b * u + self.l * innovation;
        self.state += self.tp * state_dot;
    }

    /// Current estimate, read-only.
    pub fn state(&self) -> &SVector<f64, N> {
        &self.state
    }

    /// Pre-update states in call order. Append-only; entries are never
    /// mutated after being pushed.
    pub fn history(&self) -> &[SVector<f64, N>] {
        &self.history
    }
}

// manip_core/src/controllers/mma.rs

use log::debug;

use crate::controllers::Controller;
use crate::error::ControlError;
use crate::models::ManipulatorModel;
use crate::types::{JointState, JointVec, Torque};

/// Feedback PD gains of the switching feedback-linearization law.
const KP: f64 = 60.0;
const KD: f64 = 12.0;

/// Payload assumptions `(m3, r3)` of the default model bank, spanning the
/// plausible range of the unknown tip payload.
const DEFAULT_BANK: [(f64, f64); 3] = [(0.1, 0.05), (0.01, 0.01), (1.0, 0.3)];

/// Multiple-model adaptive controller.
///
/// Keeps a fixed bank of candidate dynamics models and, every tick, picks
/// the one whose one-step-ahead prediction from the previous `(u, x)` best
/// explains the observed state. Torque is then computed by feedback
/// linearization on the selected model.
///
/// Selection is a pure arg-min with no hysteresis: near an equal-error
/// boundary the active index can chatter between models. The candidate
/// torques stay close in exactly that region, so the chattering is accepted
/// rather than smoothed.
#[derive(Debug, Clone)]
pub struct MmaController {
    models: Vec<ManipulatorModel>,
    active: usize,
    last_u: Torque,
    last_x: JointState,
}

impl MmaController {
    /// Controller with the default three-model payload bank.
    pub fn new(tp: f64) -> Self {
        let models = DEFAULT_BANK
            .iter()
            .map(|&(m3, r3)| ManipulatorModel::new(tp, m3, r3))
            .collect();
        Self::from_bank(models)
    }

    /// Controller over an explicit model bank. Bank order is significant:
    /// ties in prediction error resolve to the lowest index. An empty bank
    /// is rejected with [`ControlError::EmptyModelBank`].
    pub fn with_models(models: Vec<ManipulatorModel>) -> Result<Self, ControlError> {
        if models.is_empty() {
            return Err(ControlError::EmptyModelBank);
        }
        Ok(Self::from_bank(models))
    }

    fn from_bank(models: Vec<ManipulatorModel>) -> Self {
        Self {
            models,
            active: 0,
            last_u: Torque::zeros(),
            last_x: JointState::zeros(),
        }
    }

    /// Index of the currently active model.
    pub fn active_model(&self) -> usize {
        self.active
    }

    pub fn models(&self) -> &[ManipulatorModel] {
        &self.models
    }

    /// Score every model by the Euclidean distance between its one-step
    /// forward-Euler prediction from the previous tick and the observed
    /// state `x`, and make the arg-min the active model.
    ///
    /// A strict `<` scan keeps the first index on ties, so selection is
    /// deterministic for a fixed bank order.
    pub fn choose_model(&mut self, x: &JointState) -> Result<usize, ControlError> {
        let mut best = 0;
        let mut best_err = f64::INFINITY;
        for (i, model) in self.models.iter().enumerate() {
            let predicted = model.step(&self.last_u, &self.last_x)?;
            let err = (predicted - x).norm();
            if err < best_err {
                best_err = err;
                best = i;
            }
        }

        if best != self.active {
            debug!("switching active model {} -> {}", self.active, best);
        }
        self.active = best;
        Ok(best)
    }
}

impl Controller for MmaController {
    fn calculate_control(
        &mut self,
        x: &JointState,
        q_r: &JointVec,
        q_r_dot: &JointVec,
        q_r_ddot: &JointVec,
    ) -> Result<Torque, ControlError> {
        self.choose_model(x)?;

        let q = x.fixed_rows::<2>(0).into_owned();
        let q_dot = x.fixed_rows::<2>(2).into_owned();
        let v = q_r_ddot + KD * (q_r_dot - q_dot) + KP * (q_r - q);

        let model = &self.models[self.active];
        let u = model.mass_matrix(x) * v + model.coriolis_matrix(x) * q_dot;

        self.last_u = u;
        self.last_x = *x;
        Ok(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector4};

    const TP: f64 = 1e-3;

    #[test]
    fn chooses_model_with_zero_prediction_error() {
        let mut ctrl = MmaController::new(TP);
        ctrl.last_u = Vector2::new(1.0, 0.5);
        ctrl.last_x = Vector4::new(0.2, -0.4, 0.5, 0.3);

        // Observed state produced exactly by bank model 1.
        let x = ctrl.models()[1].step(&ctrl.last_u, &ctrl.last_x).unwrap();

        assert_eq!(ctrl.choose_model(&x).unwrap(), 1);
        assert_eq!(ctrl.active_model(), 1);
    }

    #[test]
    fn empty_bank_is_rejected() {
        let err = MmaController::with_models(Vec::new()).unwrap_err();
        assert_eq!(err, ControlError::EmptyModelBank);
    }

    #[test]
    fn tie_break_prefers_lower_index() {
        // Two identical models produce identical predictions; the scan must
        // keep the first.
        let bank = vec![
            ManipulatorModel::new(TP, 0.1, 0.05),
            ManipulatorModel::new(TP, 0.1, 0.05),
            ManipulatorModel::new(TP, 1.0, 0.3),
        ];
        let mut ctrl = MmaController::with_models(bank).unwrap();
        ctrl.last_u = Vector2::new(0.7, -0.2);
        ctrl.last_x = Vector4::new(0.1, 0.3, -0.2, 0.4);

        let x = ctrl.models()[1].step(&ctrl.last_u, &ctrl.last_x).unwrap();
        assert_eq!(ctrl.choose_model(&x).unwrap(), 0);
    }

    #[test]
    fn control_uses_active_model_and_records_tick() {
        let mut ctrl = MmaController::new(TP);
        let x = Vector4::new(0.1, -0.2, 0.05, 0.02);
        let q_r = Vector2::new(0.5, 0.5);
        let q_r_dot = Vector2::zeros();
        let q_r_ddot = Vector2::zeros();

        let u = ctrl
            .calculate_control(&x, &q_r, &q_r_dot, &q_r_ddot)
            .unwrap();

        let model = &ctrl.models()[ctrl.active_model()];
        let q = Vector2::new(x[0], x[1]);
        let q_dot = Vector2::new(x[2], x[3]);
        let v = KD * (q_r_dot - q_dot) + KP * (q_r - q);
        let expected = model.mass_matrix(&x) * v + model.coriolis_matrix(&x) * q_dot;
        assert!((u - expected).norm() < 1e-12);

        assert_eq!(ctrl.last_u, u);
        assert_eq!(ctrl.last_x, x);
    }

    #[test]
    fn tracks_constant_reference_when_bank_contains_true_plant() {
        // True payload equals bank model 2; once the manipulator is moving
        // the selector locks on and linearization is exact.
        let plant = ManipulatorModel::new(TP, 1.0, 0.3);
        let mut ctrl = MmaController::new(TP);

        let q_r = Vector2::new(0.6, -0.4);
        let zero = Vector2::zeros();
        let mut x = Vector4::zeros();

        for _ in 0..6000 {
            let u = ctrl.calculate_control(&x, &q_r, &zero, &zero).unwrap();
            x = plant.step(&u, &x).unwrap();
        }

        assert!((x[0] - q_r[0]).abs() < 1e-2, "q1 = {} vs {}", x[0], q_r[0]);
        assert!((x[1] - q_r[1]).abs() < 1e-2, "q2 = {} vs {}", x[1], q_r[1]);
        assert!(x[2].abs() < 1e-2 && x[3].abs() < 1e-2);
    }
}

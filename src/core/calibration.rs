use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use crate::models::{clamp_unit, Algorithm};

/// Default reliability of the combined ensemble score
pub const ENSEMBLE_RELIABILITY: f64 = 0.90;

/// Default number of feedback samples retained
pub const FEEDBACK_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSettings {
    pub ensemble_reliability: f64,
    /// Optional per-algorithm reliabilities; used only when every contributing
    /// algorithm has an entry
    pub per_algorithm: BTreeMap<Algorithm, f64>,
    pub steepness: f64,
    pub midpoint: f64,
    pub feedback_capacity: usize,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            ensemble_reliability: ENSEMBLE_RELIABILITY,
            per_algorithm: BTreeMap::new(),
            steepness: 2.0,
            midpoint: 0.5,
            feedback_capacity: FEEDBACK_CAPACITY,
        }
    }
}

/// Maps raw ensemble scores to calibrated confidences
///
/// Calibration itself is stateless. The feedback buffer only collects
/// (prediction, outcome) pairs for a later recalibration pass and is never
/// read while matching.
#[derive(Debug)]
pub struct Calibrator {
    settings: CalibrationSettings,
    feedback: Mutex<VecDeque<(f64, bool)>>,
}

impl Calibrator {
    pub fn new(settings: CalibrationSettings) -> Self {
        Self {
            settings,
            feedback: Mutex::new(VecDeque::new()),
        }
    }

    /// Reliability factor for a set of contributing algorithms
    pub fn reliability(&self, contributing: &[Algorithm]) -> f64 {
        let per_algorithm: Option<Vec<f64>> = contributing
            .iter()
            .map(|a| self.settings.per_algorithm.get(a).copied())
            .collect();

        match per_algorithm {
            Some(factors) if !factors.is_empty() => {
                factors.iter().sum::<f64>() / factors.len() as f64
            }
            _ => self.settings.ensemble_reliability,
        }
    }

    /// `1 / (1 + e^(-k (raw × reliability − midpoint)))`, clamped to [0, 1]
    pub fn calibrate(&self, raw_score: f64, contributing: &[Algorithm]) -> f64 {
        let adjusted = clamp_unit(raw_score) * self.reliability(contributing);
        let exponent = -self.settings.steepness * (adjusted - self.settings.midpoint);
        clamp_unit(1.0 / (1.0 + exponent.exp()))
    }

    /// Store (prediction, outcome) pairs, keeping only the most recent ones
    pub fn record_feedback(&self, predictions: &[f64], outcomes: &[bool]) -> usize {
        let mut buffer = self.feedback.lock().unwrap_or_else(|e| e.into_inner());
        let mut accepted = 0;
        for (prediction, outcome) in predictions.iter().zip(outcomes) {
            buffer.push_back((clamp_unit(*prediction), *outcome));
            accepted += 1;
        }
        while buffer.len() > self.settings.feedback_capacity {
            buffer.pop_front();
        }
        accepted
    }

    pub fn feedback_len(&self) -> usize {
        self.feedback.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn feedback_snapshot(&self) -> Vec<(f64, bool)> {
        self.feedback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .collect()
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(CalibrationSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_score_is_logistic_of_minus_one() {
        let calibrator = Calibrator::default();
        let expected = 1.0 / (1.0 + 1.0_f64.exp());
        assert!((calibrator.calibrate(0.0, &[]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_is_monotonic_and_bounded() {
        let calibrator = Calibrator::default();
        let mut previous = -1.0;
        for i in 0..=100 {
            let value = calibrator.calibrate(i as f64 / 100.0, &[Algorithm::Name]);
            assert!((0.0..=1.0).contains(&value));
            assert!(value > previous);
            previous = value;
        }
        assert!(calibrator.calibrate(f64::NAN, &[]).is_finite());
    }

    #[test]
    fn test_per_algorithm_reliability_requires_full_coverage() {
        let mut settings = CalibrationSettings::default();
        settings.per_algorithm.insert(Algorithm::Name, 0.8);
        settings.per_algorithm.insert(Algorithm::Location, 0.6);
        let calibrator = Calibrator::new(settings);

        assert!((calibrator.reliability(&[Algorithm::Name, Algorithm::Location]) - 0.7).abs() < 1e-12);
        assert_eq!(calibrator.reliability(&[Algorithm::Name, Algorithm::Temporal]), ENSEMBLE_RELIABILITY);
        assert_eq!(calibrator.reliability(&[]), ENSEMBLE_RELIABILITY);
    }

    #[test]
    fn test_feedback_buffer_is_bounded() {
        let settings = CalibrationSettings { feedback_capacity: 3, ..Default::default() };
        let calibrator = Calibrator::new(settings);

        let accepted = calibrator.record_feedback(&[0.1, 0.2, 0.3, 0.4, 0.5], &[true, false, true, false, true]);

        assert_eq!(accepted, 5);
        assert_eq!(calibrator.feedback_len(), 3);
        assert_eq!(calibrator.feedback_snapshot()[0], (0.3, true));
    }
}

use std::time::Duration;
use crate::core::error::MatchError;
use crate::models::MatchOutcome;

pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Hard cap on results for a single request
pub const MAX_RESULTS_CAP: usize = 1000;
/// Cap on results per target in a batch request
pub const BATCH_MAX_RESULTS: usize = 100;

/// Caller-supplied matching parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchParams {
    pub min_confidence: f64,
    pub max_results: usize,
    /// Overrides the engine's default deadline when set
    pub deadline: Option<Duration>,
}

impl MatchParams {
    pub fn new(min_confidence: f64, max_results: usize) -> Self {
        Self {
            min_confidence,
            max_results,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Reject out-of-range values and cap `max_results`
    pub fn validate(self) -> Result<Self, MatchError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(MatchError::InvalidParameters(format!(
                "minConfidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.max_results == 0 {
            return Err(MatchError::InvalidParameters(
                "maxResults must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            max_results: self.max_results.min(MAX_RESULTS_CAP),
            ..self
        })
    }
}

impl Default for MatchParams {
    fn default() -> Self {
        Self::new(0.5, DEFAULT_MAX_RESULTS)
    }
}

/// Filter by minimum confidence, order and truncate
///
/// Ordering is by confidence descending, then candidate id ascending, so
/// the output never depends on input order.
pub fn rank(mut outcomes: Vec<MatchOutcome>, min_confidence: f64, max_results: usize) -> Vec<MatchOutcome> {
    outcomes.retain(|o| o.confidence >= min_confidence);

    outcomes.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    outcomes.truncate(max_results);
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfidenceLevel, MatchType};
    use std::collections::BTreeMap;

    fn outcome(id: &str, confidence: f64) -> MatchOutcome {
        MatchOutcome {
            candidate_id: id.to_string(),
            confidence,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            match_type: MatchType::Community,
            predicted_relationship: "possible connection".to_string(),
            relationship_confidence: 0.5,
            raw_score: confidence,
            algorithm_scores: BTreeMap::new(),
            reasons: vec!["Profile compatibility".to_string()],
            kinship_hint: None,
        }
    }

    #[test]
    fn test_rank_filters_sorts_and_truncates() {
        let outcomes = vec![
            outcome("a", 0.4),
            outcome("b", 0.9),
            outcome("c", 0.7),
            outcome("d", 0.6),
        ];

        let ranked = rank(outcomes, 0.5, 2);

        let ids: Vec<&str> = ranked.iter().map(|o| o.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_rank_ties_by_candidate_id() {
        let outcomes = vec![outcome("zed", 0.7), outcome("amy", 0.7), outcome("max", 0.7)];

        let ranked = rank(outcomes, 0.0, 10);

        let ids: Vec<&str> = ranked.iter().map(|o| o.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["amy", "max", "zed"]);
    }

    #[test]
    fn test_min_confidence_is_inclusive() {
        let ranked = rank(vec![outcome("a", 0.8), outcome("b", 0.79)], 0.8, 10);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_validate_params() {
        assert!(MatchParams::new(1.5, 10).validate().is_err());
        assert!(MatchParams::new(-0.1, 10).validate().is_err());
        assert!(MatchParams::new(f64::NAN, 10).validate().is_err());
        assert!(MatchParams::new(0.5, 0).validate().is_err());

        let capped = MatchParams::new(0.5, 5000).validate().unwrap();
        assert_eq!(capped.max_results, MAX_RESULTS_CAP);
    }
}

use std::collections::BTreeMap;
use crate::core::weights::WeightVector;
use crate::models::{clamp_unit, Algorithm, AlgorithmScore, EnsembleResult};

/// Reason used when no scorer produced one
pub const DEFAULT_REASON: &str = "Profile compatibility";

/// Maximum number of reasons carried by a result
pub const MAX_REASONS: usize = 5;

/// Merge the available sub-scores into one raw score
///
/// `Σ(score × weight) / Σ(weight of present scores)`. Scores whose algorithm
/// has no weight are ignored. Missing scores drop out of the denominator,
/// so the result stays in [0, 1] when some scorers failed. With nothing to
/// combine the score is 0.0 and the reason list is the default placeholder.
pub fn combine(
    candidate_id: &str,
    scores: BTreeMap<Algorithm, AlgorithmScore>,
    weights: &WeightVector,
) -> EnsembleResult {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut reasons: Vec<String> = Vec::with_capacity(MAX_REASONS);

    // BTreeMap iterates in algorithm declaration order
    for (algorithm, score) in &scores {
        let weight = weights.get(*algorithm);
        if weight <= 0.0 {
            continue;
        }
        weighted_sum += score.score * weight;
        weight_total += weight;

        for reason in &score.reasons {
            if reasons.len() >= MAX_REASONS {
                break;
            }
            if !reasons.contains(reason) {
                reasons.push(reason.clone());
            }
        }
    }

    let raw_score = if weight_total > 0.0 {
        clamp_unit(weighted_sum / weight_total)
    } else {
        0.0
    };

    if reasons.is_empty() {
        reasons.push(DEFAULT_REASON.to_string());
    }

    EnsembleResult {
        candidate_id: candidate_id.to_string(),
        raw_score,
        scores,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: f64, reasons: &[&str]) -> AlgorithmScore {
        AlgorithmScore::new(score, reasons.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn test_weighted_average() {
        let mut scores = BTreeMap::new();
        scores.insert(Algorithm::Name, scored(1.0, &["a"]));
        scores.insert(Algorithm::Location, scored(0.0, &[]));

        let weights = WeightVector::from_pairs(&[(Algorithm::Name, 0.5), (Algorithm::Location, 0.5)]);
        let result = combine("c1", scores, &weights);

        assert!((result.raw_score - 0.5).abs() < 1e-9);
        assert_eq!(result.reasons, vec!["a"]);
    }

    #[test]
    fn test_missing_scores_renormalize() {
        let mut scores = BTreeMap::new();
        scores.insert(Algorithm::Name, scored(0.8, &[]));

        // Location failed and is absent: only Name's weight is in the denominator
        let weights = WeightVector::general();
        let result = combine("c1", scores, &weights);

        assert!((result.raw_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_falls_back_to_default_reason() {
        let result = combine("c1", BTreeMap::new(), &WeightVector::general());

        assert_eq!(result.raw_score, 0.0);
        assert_eq!(result.reasons, vec![DEFAULT_REASON]);
    }

    #[test]
    fn test_reasons_ordered_distinct_and_capped() {
        let mut scores = BTreeMap::new();
        // Inserted out of order on purpose
        scores.insert(Algorithm::Temporal, scored(0.8, &["t1"]));
        scores.insert(Algorithm::Name, scored(0.9, &["n1", "shared"]));
        scores.insert(Algorithm::Location, scored(0.9, &["shared", "l1"]));
        scores.insert(Algorithm::Interests, scored(0.5, &["i1", "i2", "i3"]));

        let result = combine("c1", scores, &WeightVector::general());

        assert_eq!(result.reasons, vec!["n1", "shared", "l1", "i1", "i2"]);
    }
}

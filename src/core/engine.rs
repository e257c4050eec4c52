use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use crate::core::calibration::{CalibrationSettings, Calibrator};
use crate::core::ensemble::combine;
use crate::core::error::MatchError;
use crate::core::normalize::{normalize, NormalizedProfile};
use crate::core::ranker::{rank, MatchParams};
use crate::core::relationship::{predict, PairFeatures};
use crate::core::scorers::{default_scorers, Scorer, ScorerError};
use crate::core::weights::{AdaptiveWeighter, CompletenessSignals, WeightVector};
use crate::models::{
    Algorithm, AlgorithmScore, ConfidenceLevel, EnsembleResult, MatchContext, MatchOutcome, Profile,
};
use crate::services::ProfileStore;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 100;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Tunables for a [`MatchEngine`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub general_weights: WeightVector,
    pub family_weights: WeightVector,
    pub calibration: CalibrationSettings,
    /// Maximum number of evaluations scheduled at once
    pub max_in_flight: usize,
    /// Deadline for a whole `find_matches` batch unless the caller sets one
    pub deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            general_weights: WeightVector::general(),
            family_weights: WeightVector::family(),
            calibration: CalibrationSettings::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Main matching orchestrator
///
/// # Pipeline
/// 1. Normalize target and candidate
/// 2. Run every sub-scorer with a positive weight
/// 3. Combine into a raw ensemble score
/// 4. Calibrate into a confidence
/// 5. Predict the relationship
/// 6. Rank (batch operations only)
///
/// Cloning is cheap; all heavy state is shared.
#[derive(Clone)]
pub struct MatchEngine {
    scorers: Arc<Vec<Box<dyn Scorer>>>,
    weighter: AdaptiveWeighter,
    calibrator: Arc<Calibrator>,
    max_in_flight: usize,
    default_deadline: Duration,
    reference_date: Option<NaiveDate>,
    worker_pool: Option<Handle>,
}

impl MatchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scorers: Arc::new(default_scorers()),
            weighter: AdaptiveWeighter::new(config.general_weights, config.family_weights),
            calibrator: Arc::new(Calibrator::new(config.calibration)),
            max_in_flight: config.max_in_flight.max(1),
            default_deadline: config.deadline,
            reference_date: None,
            worker_pool: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Replace the sub-scorers
    pub fn with_scorers(mut self, scorers: Vec<Box<dyn Scorer>>) -> Self {
        self.scorers = Arc::new(scorers);
        self
    }

    /// Compute ages against a fixed date instead of today
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Run batch evaluations on a dedicated runtime instead of the caller's
    pub fn with_worker_pool(mut self, handle: Handle) -> Self {
        self.worker_pool = Some(handle);
        self
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Weights for a request, derived from the target profile once
    pub fn weights_for(&self, target: &Profile, context: MatchContext) -> WeightVector {
        self.weighter.weights(context, &CompletenessSignals::from_profile(target))
    }

    /// Score one pair; `a` is treated as the target
    pub fn evaluate_pair(&self, a: &Profile, b: &Profile, context: MatchContext) -> MatchOutcome {
        self.explain_pair(a, b, context).1
    }

    /// Score one pair, also returning the per-algorithm breakdown
    pub fn explain_pair(
        &self,
        a: &Profile,
        b: &Profile,
        context: MatchContext,
    ) -> (EnsembleResult, MatchOutcome) {
        let today = self.today();
        let weights = self.weights_for(a, context);
        self.evaluate_normalized(&normalize(a, today), &normalize(b, today), context, &weights)
    }

    fn evaluate_normalized(
        &self,
        target: &NormalizedProfile,
        candidate: &NormalizedProfile,
        context: MatchContext,
        weights: &WeightVector,
    ) -> (EnsembleResult, MatchOutcome) {
        let mut scores = BTreeMap::new();
        let mut failed = Vec::new();

        for scorer in self.scorers.iter() {
            let algorithm = scorer.algorithm();
            // Zero weight means the algorithm is switched off for this context
            if weights.get(algorithm) <= 0.0 {
                continue;
            }

            match scorer.score(target, candidate).and_then(|s| check_score(algorithm, s)) {
                Ok(score) => {
                    scores.insert(algorithm, score);
                }
                Err(e) => {
                    tracing::warn!(
                        "Excluding {} for candidate {}: {}",
                        algorithm,
                        candidate.id,
                        e
                    );
                    failed.push(algorithm);
                }
            }
        }

        let weights = if failed.is_empty() {
            *weights
        } else {
            weights.without(&failed)
        };

        let ensemble = combine(&candidate.id, scores, &weights);
        let outcome = self.build_outcome(target, candidate, context, &ensemble);
        (ensemble, outcome)
    }

    fn build_outcome(
        &self,
        target: &NormalizedProfile,
        candidate: &NormalizedProfile,
        context: MatchContext,
        ensemble: &EnsembleResult,
    ) -> MatchOutcome {
        let confidence = self
            .calibrator
            .calibrate(ensemble.raw_score, &ensemble.contributing());

        let features = PairFeatures::from_pair(
            target,
            candidate,
            ensemble.score_of(Algorithm::Name),
            ensemble.raw_score,
        );
        let prediction = predict(context, &features);

        let kinship_hint = ensemble
            .scores
            .get(&Algorithm::Family)
            .and_then(|s| s.relation.clone());

        MatchOutcome {
            candidate_id: ensemble.candidate_id.clone(),
            confidence,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            match_type: prediction.match_type,
            predicted_relationship: prediction.label,
            relationship_confidence: prediction.confidence,
            raw_score: ensemble.raw_score,
            algorithm_scores: ensemble
                .scores
                .iter()
                .map(|(algorithm, s)| (*algorithm, s.score))
                .collect(),
            reasons: ensemble.reasons.clone(),
            kinship_hint,
        }
    }

    /// Evaluate an in-memory candidate pool and rank the outcomes
    ///
    /// Evaluations run concurrently with at most `max_in_flight` scheduled at
    /// once. Results land in a slot per input position, so ordering depends
    /// only on the ranker. When the deadline passes, completed evaluations are
    /// ranked and the rest are dropped.
    pub async fn find_matches_in(
        &self,
        target: &Profile,
        candidates: Vec<Profile>,
        context: MatchContext,
        params: MatchParams,
    ) -> Result<Vec<MatchOutcome>, MatchError> {
        let params = params.validate()?;
        let today = self.today();
        let weights = self.weights_for(target, context);
        let normalized_target = Arc::new(normalize(target, today));

        let total = candidates.len();
        let deadline = Instant::now() + params.deadline.unwrap_or(self.default_deadline);
        let mut slots: Vec<Option<MatchOutcome>> = vec![None; total];
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();

        let run = async {
            for (idx, candidate) in candidates.into_iter().enumerate() {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let engine = self.clone();
                let target = Arc::clone(&normalized_target);

                let evaluation = async move {
                    let _permit = permit;
                    let candidate = normalize(&candidate, today);
                    let (_, outcome) = engine.evaluate_normalized(&target, &candidate, context, &weights);
                    (idx, outcome)
                };

                match &self.worker_pool {
                    Some(handle) => {
                        tasks.spawn_on(evaluation, handle);
                    }
                    None => {
                        tasks.spawn(evaluation);
                    }
                }
            }

            while let Some(joined) = tasks.join_next().await {
                store_result(&mut slots, joined);
            }
        };

        let completed_in_time = tokio::time::timeout_at(deadline, run).await.is_ok();

        if !completed_in_time {
            // Keep whatever already finished, cancel everything else
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                store_result(&mut slots, joined);
            }
        }

        let outcomes: Vec<MatchOutcome> = slots.into_iter().flatten().collect();
        if !completed_in_time {
            tracing::warn!(
                "Deadline exceeded for {}: ranking {} of {} candidates",
                target.id,
                outcomes.len(),
                total
            );
        }

        let ranked = rank(outcomes, params.min_confidence, params.max_results);
        tracing::debug!(
            "Matched {} against {} candidates, {} above {:.2}",
            target.id,
            total,
            ranked.len(),
            params.min_confidence
        );
        Ok(ranked)
    }

    /// Fetch the target and its candidate pool from a store, then match
    pub async fn find_matches(
        &self,
        store: &dyn ProfileStore,
        target_id: &str,
        context: MatchContext,
        params: MatchParams,
    ) -> Result<Vec<MatchOutcome>, MatchError> {
        let params = params.validate()?;

        let target = store
            .fetch_profile(target_id)
            .await?
            .ok_or_else(|| MatchError::NotFound(target_id.to_string()))?;

        let candidates = store.fetch_candidate_pool(target_id, true).await?;

        self.find_matches_in(&target, candidates, context, params).await
    }

    /// Fetch both profiles from a store and explain their match
    pub async fn evaluate_pair_by_id(
        &self,
        store: &dyn ProfileStore,
        id_a: &str,
        id_b: &str,
        context: MatchContext,
    ) -> Result<(EnsembleResult, MatchOutcome), MatchError> {
        let a = store
            .fetch_profile(id_a)
            .await?
            .ok_or_else(|| MatchError::NotFound(id_a.to_string()))?;
        let b = store
            .fetch_profile(id_b)
            .await?
            .ok_or_else(|| MatchError::NotFound(id_b.to_string()))?;

        Ok(self.explain_pair(&a, &b, context))
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn check_score(algorithm: Algorithm, score: AlgorithmScore) -> Result<AlgorithmScore, ScorerError> {
    if (0.0..=1.0).contains(&score.score) {
        Ok(score)
    } else {
        Err(ScorerError::InvalidScore(algorithm, score.score))
    }
}

fn store_result(
    slots: &mut [Option<MatchOutcome>],
    joined: Result<(usize, MatchOutcome), tokio::task::JoinError>,
) {
    match joined {
        Ok((idx, outcome)) => slots[idx] = Some(outcome),
        Err(e) if e.is_cancelled() => {}
        Err(e) => tracing::warn!("Candidate evaluation failed: {}", e),
    }
}

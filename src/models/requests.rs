use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::MatchContext;

/// Request to find matches for one target profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub context: MatchContext,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(alias = "min_confidence", rename = "minConfidence", default)]
    pub min_confidence: Option<f64>,
    #[validate(range(min = 1, max = 1000))]
    #[serde(alias = "max_results", rename = "maxResults", default)]
    pub max_results: Option<u16>,
}

/// Request to find matches for many targets at once
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchMatchRequest {
    #[validate(length(min = 1, max = 100))]
    #[serde(alias = "user_ids", rename = "userIds")]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub context: MatchContext,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(alias = "min_confidence", rename = "minConfidence", default)]
    pub min_confidence: Option<f64>,
    #[validate(range(min = 1, max = 100))]
    #[serde(alias = "max_results", rename = "maxResults", default)]
    pub max_results: Option<u16>,
}

/// Request to score one specific pair
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimilarityRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id_1", rename = "userId1")]
    pub user_id_1: String,
    #[validate(length(min = 1))]
    #[serde(alias = "user_id_2", rename = "userId2")]
    pub user_id_2: String,
    #[serde(default)]
    pub context: MatchContext,
    #[serde(alias = "include_breakdown", rename = "includeBreakdown", default)]
    pub include_breakdown: bool,
}

/// Observed outcomes for earlier predictions, fed to the calibrator
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(length(min = 1, max = 10000))]
    pub predictions: Vec<f64>,
    #[validate(length(min = 1, max = 10000))]
    pub outcomes: Vec<bool>,
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::models::domain::{Algorithm, AlgorithmScore, ConfidenceLevel, MatchContext, MatchOutcome};
use crate::services::CacheStats;

/// Response for find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub user_id: String,
    pub context: MatchContext,
    pub matches: Vec<MatchOutcome>,
    pub total_matches: usize,
    pub processing_time_ms: f64,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for the pairwise similarity endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResponse {
    pub user_id_1: String,
    pub user_id_2: String,
    pub similarity_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub outcome: MatchOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm_breakdown: Option<BTreeMap<Algorithm, AlgorithmScore>>,
    pub processing_time_ms: f64,
    #[serde(default)]
    pub cached: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: CacheStats,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Feedback ingestion response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub accepted: usize,
    pub buffered: usize,
}

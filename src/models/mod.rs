// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    clamp_unit, Algorithm, AlgorithmScore, ConfidenceLevel, EnsembleResult, MatchContext,
    MatchOutcome, MatchType, Profile,
};
pub use requests::{BatchMatchRequest, FeedbackRequest, FindMatchesRequest, SimilarityRequest};
pub use responses::{ErrorResponse, FeedbackResponse, FindMatchesResponse, HealthResponse, SimilarityResponse};

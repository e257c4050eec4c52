use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use std::time::Instant;
use validator::Validate;
use crate::config::MatchingSettings;
use crate::core::{MatchEngine, MatchError, MatchParams};
use crate::models::{
    BatchMatchRequest, ErrorResponse, FeedbackRequest, FeedbackResponse, FindMatchesRequest,
    FindMatchesResponse, HealthResponse, MatchContext, SimilarityRequest, SimilarityResponse,
};
use crate::services::{CacheError, CacheKey, CacheManager, EventKind, EventSink, MatchingEvent, ProfileStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: MatchEngine,
    pub store: Arc<dyn ProfileStore>,
    pub cache: Arc<CacheManager>,
    pub events: Arc<dyn EventSink>,
    pub limits: MatchingSettings,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches/batch", web::post().to(batch_find_matches))
        .route("/matches/similarity", web::post().to(similarity))
        .route("/matches/feedback", web::post().to(record_feedback));
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: message.into(),
        status_code: 400,
    })
}

fn match_error_response(err: &MatchError) -> HttpResponse {
    match err {
        MatchError::NotFound(_) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Profile not found".to_string(),
            message: err.to_string(),
            status_code: 404,
        }),
        MatchError::InvalidParameters(_) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid parameters".to_string(),
            message: err.to_string(),
            status_code: 400,
        }),
        MatchError::Store(_) => {
            tracing::error!("Matching failed: {}", err);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matching failed".to_string(),
                message: err.to_string(),
                status_code: 500,
            })
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await;

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: state.cache.stats(),
        timestamp: chrono::Utc::now(),
    })
}

/// Run one memoized find-matches request
async fn find_for_target(
    state: &AppState,
    user_id: &str,
    context: MatchContext,
    params: MatchParams,
) -> Result<FindMatchesResponse, MatchError> {
    let started = Instant::now();
    let cache_key = CacheKey::matches(user_id, context, params.min_confidence, params.max_results);

    match state.cache.get::<FindMatchesResponse>(&cache_key).await {
        Ok(mut response) => {
            tracing::debug!("Serving cached matches for {}", user_id);
            response.cached = true;
            response.processing_time_ms = elapsed_ms(started);
            return Ok(response);
        }
        Err(CacheError::CacheMiss(_)) => {}
        Err(e) => tracing::warn!("Cache read failed for {}: {}", cache_key, e),
    }

    let matches = state
        .engine
        .find_matches(state.store.as_ref(), user_id, context, params)
        .await?;

    let response = FindMatchesResponse {
        user_id: user_id.to_string(),
        context,
        total_matches: matches.len(),
        matches,
        processing_time_ms: elapsed_ms(started),
        cached: false,
        error: None,
    };

    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache matches for {}: {}", user_id, e);
    }

    Ok(response)
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "context": "family|friend|community|general",
///   "minConfidence": 0.5,
///   "maxResults": 50
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {:?}", errors);
        return bad_request(errors.to_string());
    }

    let limits = &state.limits;
    let params = MatchParams::new(
        req.min_confidence.unwrap_or(limits.default_min_confidence),
        req.max_results
            .map(usize::from)
            .unwrap_or(limits.default_limit)
            .min(limits.max_limit),
    );

    tracing::info!("Finding {} matches for user: {}", req.context, req.user_id);

    match find_for_target(&state, &req.user_id, req.context, params).await {
        Ok(response) => {
            state.events.record(
                MatchingEvent::new(EventKind::FindMatches, &req.user_id, req.context).with_results(
                    response.total_matches,
                    response.processing_time_ms,
                    response.cached,
                ),
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => match_error_response(&e),
    }
}

/// Batch find matches endpoint
///
/// POST /api/v1/matches/batch
///
/// A target that cannot be matched yields an entry with `error` set
/// instead of failing the whole batch.
async fn batch_find_matches(
    state: web::Data<AppState>,
    req: web::Json<BatchMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let limits = &state.limits;
    if req.user_ids.len() > limits.batch_max_targets {
        return bad_request(format!(
            "At most {} user ids per batch",
            limits.batch_max_targets
        ));
    }

    let params = MatchParams::new(
        req.min_confidence.unwrap_or(limits.default_min_confidence),
        req.max_results
            .map(usize::from)
            .unwrap_or(limits.default_limit)
            .min(limits.batch_max_limit),
    );
    if let Err(e) = params.validate() {
        return match_error_response(&e);
    }

    let started = Instant::now();
    let mut responses = Vec::with_capacity(req.user_ids.len());

    for user_id in &req.user_ids {
        let response = match find_for_target(&state, user_id, req.context, params).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Batch entry {} failed: {}", user_id, e);
                FindMatchesResponse {
                    user_id: user_id.clone(),
                    context: req.context,
                    matches: Vec::new(),
                    total_matches: 0,
                    processing_time_ms: 0.0,
                    cached: false,
                    error: Some(e.to_string()),
                }
            }
        };
        responses.push(response);
    }

    let total: usize = responses.iter().map(|r| r.total_matches).sum();
    tracing::info!(
        "Batch matched {} targets ({} matches) in {:.1}ms",
        responses.len(),
        total,
        elapsed_ms(started)
    );
    state.events.record(
        MatchingEvent::new(EventKind::BatchMatches, req.user_ids.join(","), req.context)
            .with_results(total, elapsed_ms(started), false),
    );

    HttpResponse::Ok().json(responses)
}

/// Pairwise similarity endpoint
///
/// POST /api/v1/matches/similarity
async fn similarity(
    state: web::Data<AppState>,
    req: web::Json<SimilarityRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let started = Instant::now();
    match similarity_for_pair(&state, &req, started).await {
        Ok(mut response) => {
            if !req.include_breakdown {
                response.algorithm_breakdown = None;
            }
            state.events.record(
                MatchingEvent::new(EventKind::Similarity, &req.user_id_1, req.context)
                    .with_results(1, response.processing_time_ms, response.cached),
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => match_error_response(&e),
    }
}

/// Run one memoized pairwise evaluation; the cached copy always keeps the breakdown
async fn similarity_for_pair(
    state: &AppState,
    req: &SimilarityRequest,
    started: Instant,
) -> Result<SimilarityResponse, MatchError> {
    let cache_key = CacheKey::similarity(&req.user_id_1, &req.user_id_2, req.context);

    match state.cache.get::<SimilarityResponse>(&cache_key).await {
        Ok(mut response) => {
            tracing::debug!("Serving cached similarity for {}", cache_key);
            response.cached = true;
            response.processing_time_ms = elapsed_ms(started);
            return Ok(response);
        }
        Err(CacheError::CacheMiss(_)) => {}
        Err(e) => tracing::warn!("Cache read failed for {}: {}", cache_key, e),
    }

    let (ensemble, outcome) = state
        .engine
        .evaluate_pair_by_id(state.store.as_ref(), &req.user_id_1, &req.user_id_2, req.context)
        .await?;

    let response = SimilarityResponse {
        user_id_1: req.user_id_1.clone(),
        user_id_2: req.user_id_2.clone(),
        similarity_score: outcome.confidence,
        confidence_level: outcome.confidence_level,
        outcome,
        algorithm_breakdown: Some(ensemble.scores),
        processing_time_ms: elapsed_ms(started),
        cached: false,
    };

    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache similarity for {}: {}", cache_key, e);
    }

    Ok(response)
}

/// Calibration feedback endpoint
///
/// POST /api/v1/matches/feedback
///
/// Request body:
/// ```json
/// { "predictions": [0.7, 0.4], "outcomes": [true, false] }
/// ```
async fn record_feedback(
    state: web::Data<AppState>,
    req: web::Json<FeedbackRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }
    if req.predictions.len() != req.outcomes.len() {
        return bad_request("predictions and outcomes must have the same length");
    }

    let calibrator = state.engine.calibrator();
    let accepted = calibrator.record_feedback(&req.predictions, &req.outcomes);
    let buffered = calibrator.feedback_len();

    tracing::debug!("Accepted {} feedback samples ({} buffered)", accepted, buffered);
    state.events.record(
        MatchingEvent::new(EventKind::Feedback, "", MatchContext::General)
            .with_results(accepted, 0.0, false),
    );

    HttpResponse::Ok().json(FeedbackResponse { accepted, buffered })
}

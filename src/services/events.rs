use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::MatchContext;

/// Kinds of matching activity worth recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    FindMatches,
    BatchMatches,
    Similarity,
    Feedback,
}

/// Structured record of one handled request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingEvent {
    pub event_id: Uuid,
    pub kind: EventKind,
    pub user_id: String,
    pub context: MatchContext,
    pub result_count: usize,
    pub processing_time_ms: f64,
    pub cached: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl MatchingEvent {
    pub fn new(kind: EventKind, user_id: impl Into<String>, context: MatchContext) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            user_id: user_id.into(),
            context,
            result_count: 0,
            processing_time_ms: 0.0,
            cached: false,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_results(mut self, result_count: usize, processing_time_ms: f64, cached: bool) -> Self {
        self.result_count = result_count;
        self.processing_time_ms = processing_time_ms;
        self.cached = cached;
        self
    }
}

/// Observability hook; implementations must not block the caller
pub trait EventSink: Send + Sync {
    fn record(&self, event: MatchingEvent);
}

/// Emits events as structured `tracing` records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: MatchingEvent) {
        tracing::info!(
            target: "kindred_match::events",
            event_id = %event.event_id,
            kind = ?event.kind,
            user_id = %event.user_id,
            context = %event.context,
            result_count = event.result_count,
            processing_time_ms = event.processing_time_ms,
            cached = event.cached,
            "matching event"
        );
    }
}

// Service exports
pub mod cache;
pub mod events;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, ResponseCache};
pub use events::{EventKind, EventSink, MatchingEvent, TracingEventSink};
pub use store::{InMemoryProfileStore, PostgresProfileStore, ProfileStore, StoreError};

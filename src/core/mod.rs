// Core algorithm exports
pub mod calibration;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod normalize;
pub mod ranker;
pub mod relationship;
pub mod scorers;
pub mod similarity;
pub mod weights;

pub use calibration::{CalibrationSettings, Calibrator};
pub use engine::{EngineConfig, MatchEngine};
pub use ensemble::combine;
pub use error::MatchError;
pub use normalize::{normalize, NormalizedProfile};
pub use ranker::{rank, MatchParams};
pub use relationship::{predict, PairFeatures, RelationshipPrediction};
pub use scorers::{default_scorers, Scorer, ScorerError};
pub use weights::{AdaptiveWeighter, CompletenessSignals, WeightVector};

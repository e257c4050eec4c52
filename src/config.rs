use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use crate::core::{CalibrationSettings, EngineConfig, WeightVector};
use crate::models::Algorithm;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

/// Profile source. Without a URL the service runs on an in-memory store,
/// optionally seeded from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub redis_url: Option<String>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            ttl_secs: default_ttl_secs(),
            l1_cache_size: default_l1_cache_size(),
        }
    }
}

fn default_true() -> bool { true }
fn default_ttl_secs() -> u64 { 3600 }
fn default_l1_cache_size() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_batch_max_limit")]
    pub batch_max_limit: usize,
    #[serde(default = "default_batch_max_targets")]
    pub batch_max_targets: usize,
    #[serde(default = "default_min_confidence")]
    pub default_min_confidence: f64,
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Worker threads for candidate evaluation; defaults to the CPU count
    pub workers: Option<usize>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            batch_max_limit: default_batch_max_limit(),
            batch_max_targets: default_batch_max_targets(),
            default_min_confidence: default_min_confidence(),
            deadline_ms: default_deadline_ms(),
            max_in_flight: default_max_in_flight(),
            workers: None,
        }
    }
}

fn default_limit() -> usize { 50 }
fn default_max_limit() -> usize { 1000 }
fn default_batch_max_limit() -> usize { 100 }
fn default_batch_max_targets() -> usize { 100 }
fn default_min_confidence() -> f64 { 0.5 }
fn default_deadline_ms() -> u64 { 30_000 }
fn default_max_in_flight() -> usize { 100 }

/// Context-scoped base weight vectors
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_general_weights")]
    pub general: BTreeMap<Algorithm, f64>,
    #[serde(default = "default_family_weights")]
    pub family: BTreeMap<Algorithm, f64>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            general: default_general_weights(),
            family: default_family_weights(),
        }
    }
}

fn to_map(vector: WeightVector) -> BTreeMap<Algorithm, f64> {
    vector.active().collect()
}

fn default_general_weights() -> BTreeMap<Algorithm, f64> { to_map(WeightVector::general()) }
fn default_family_weights() -> BTreeMap<Algorithm, f64> { to_map(WeightVector::family()) }

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_ensemble_reliability")]
    pub ensemble_reliability: f64,
    #[serde(default)]
    pub per_algorithm: BTreeMap<Algorithm, f64>,
    #[serde(default = "default_steepness")]
    pub steepness: f64,
    #[serde(default = "default_midpoint")]
    pub midpoint: f64,
    #[serde(default = "default_feedback_capacity")]
    pub feedback_capacity: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            ensemble_reliability: default_ensemble_reliability(),
            per_algorithm: BTreeMap::new(),
            steepness: default_steepness(),
            midpoint: default_midpoint(),
            feedback_capacity: default_feedback_capacity(),
        }
    }
}

fn default_ensemble_reliability() -> f64 { 0.90 }
fn default_steepness() -> f64 { 2.0 }
fn default_midpoint() -> f64 { 0.5 }
fn default_feedback_capacity() -> usize { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with KINDRED__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., KINDRED__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("KINDRED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        // Conventional variable name wins over the prefixed one
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("KINDRED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Engine tunables derived from the matching, weights and calibration sections
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            general_weights: WeightVector::from_pairs(&map_pairs(&self.weights.general)),
            family_weights: WeightVector::from_pairs(&map_pairs(&self.weights.family)),
            calibration: CalibrationSettings {
                ensemble_reliability: self.calibration.ensemble_reliability,
                per_algorithm: self.calibration.per_algorithm.clone(),
                steepness: self.calibration.steepness,
                midpoint: self.calibration.midpoint,
                feedback_capacity: self.calibration.feedback_capacity,
            },
            max_in_flight: self.matching.max_in_flight,
            deadline: Duration::from_millis(self.matching.deadline_ms),
        }
    }
}

fn map_pairs(map: &BTreeMap<Algorithm, f64>) -> Vec<(Algorithm, f64)> {
    map.iter().map(|(a, w)| (*a, *w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.general.get(&Algorithm::Name), Some(&0.35));
        assert_eq!(weights.general.get(&Algorithm::Family), None);
        assert_eq!(weights.family.get(&Algorithm::Family), Some(&0.40));
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_empty_config_yields_working_engine_config() {
        let settings: Settings = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.matching.default_limit, 50);
        assert!(settings.database.url.is_none());

        let engine = settings.engine_config();
        assert_eq!(engine.general_weights, WeightVector::general());
        assert_eq!(engine.deadline, Duration::from_secs(30));
        assert_eq!(engine.calibration.ensemble_reliability, 0.90);
    }

    #[test]
    fn test_file_overrides() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "[matching]\nmax_in_flight = 8\n[weights.general]\nname = 1.0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.matching.max_in_flight, 8);
        let general = settings.engine_config().general_weights;
        assert_eq!(general.get(Algorithm::Name), 1.0);
        assert_eq!(general.get(Algorithm::Location), 0.0);
    }
}

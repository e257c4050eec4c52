use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Person record as delivered by the profile store
///
/// Unknown fields are dropped at deserialization; the engine only ever
/// reads this record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(alias = "user_id", alias = "userId")]
    pub id: String,
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(default, alias = "middle_name")]
    pub middle_name: Option<String>,
    #[serde(default, alias = "maiden_name")]
    pub maiden_name: Option<String>,
    #[serde(default, alias = "father_name")]
    pub father_name: Option<String>,
    #[serde(default, alias = "mother_name")]
    pub mother_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// `YYYY-MM-DD`, or any string starting with one (RFC 3339 timestamps)
    #[serde(default, alias = "birth_date", alias = "date_of_birth")]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default, alias = "cultural_background")]
    pub cultural_background: Option<String>,
    #[serde(default, alias = "family_origin")]
    pub family_origin: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default, alias = "known_connections", alias = "connections")]
    pub known_connections: Vec<String>,
    #[serde(default, alias = "signup_at", alias = "created_at")]
    pub signup_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, alias = "has_genetic_markers")]
    pub has_genetic_markers: bool,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
    #[serde(default = "default_schema_version", alias = "schema_version")]
    pub schema_version: u16,
}

fn default_true() -> bool { true }
fn default_schema_version() -> u16 { 1 }

impl Profile {
    /// Minimal active profile with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_active: true,
            schema_version: default_schema_version(),
            ..Default::default()
        }
    }
}

/// Matching mode selecting both the weight vector and the relationship rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchContext {
    Family,
    Friend,
    Community,
    #[default]
    General,
}

impl MatchContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchContext::Family => "family",
            MatchContext::Friend => "friend",
            MatchContext::Community => "community",
            MatchContext::General => "general",
        }
    }
}

impl fmt::Display for MatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "family" => Ok(MatchContext::Family),
            "friend" => Ok(MatchContext::Friend),
            "community" => Ok(MatchContext::Community),
            "general" | "" => Ok(MatchContext::General),
            other => Err(format!(
                "unknown match context '{}', expected family, friend, community or general",
                other
            )),
        }
    }
}

/// Predicted relationship category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Family,
    Friend,
    Community,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::High
        } else if confidence >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Sub-scorer identity
///
/// Declaration order is the order in which reasons are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Name,
    Location,
    Demographic,
    Interests,
    Temporal,
    Family,
    Profession,
    Cultural,
}

impl Algorithm {
    pub const COUNT: usize = 8;

    pub const ALL: [Algorithm; Algorithm::COUNT] = [
        Algorithm::Name,
        Algorithm::Location,
        Algorithm::Demographic,
        Algorithm::Interests,
        Algorithm::Temporal,
        Algorithm::Family,
        Algorithm::Profession,
        Algorithm::Cultural,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Name => "name",
            Algorithm::Location => "location",
            Algorithm::Demographic => "demographic",
            Algorithm::Interests => "interests",
            Algorithm::Temporal => "temporal",
            Algorithm::Family => "family",
            Algorithm::Profession => "profession",
            Algorithm::Cultural => "cultural",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sub-scorer's verdict: a score in [0, 1] and the reasons behind it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmScore {
    pub score: f64,
    pub reasons: Vec<String>,
    /// Relationship label suggested by the scorer itself (family heuristic only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl AlgorithmScore {
    /// No evidence: exactly 0.0 and no reasons
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(score: f64, reasons: Vec<String>) -> Self {
        let mut result = Self::none();
        for reason in reasons {
            result.push_reason(reason);
        }
        result.set_score(score);
        result
    }

    /// Set the score, clamped to [0, 1]. Reasons are dropped when the score is zero.
    pub fn set_score(&mut self, score: f64) {
        self.score = clamp_unit(score);
        if self.score == 0.0 {
            self.reasons.clear();
            self.relation = None;
        }
    }

    /// Append a reason, keeping insertion order and skipping duplicates
    pub fn push_reason(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }

    pub fn with_relation(mut self, relation: Option<String>) -> Self {
        if self.score > 0.0 {
            self.relation = relation;
        }
        self
    }
}

/// Clamp to [0, 1]; NaN maps to 0
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Output of the ensemble combiner for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleResult {
    pub candidate_id: String,
    pub raw_score: f64,
    pub scores: BTreeMap<Algorithm, AlgorithmScore>,
    pub reasons: Vec<String>,
}

impl EnsembleResult {
    pub fn score_of(&self, algorithm: Algorithm) -> f64 {
        self.scores.get(&algorithm).map(|s| s.score).unwrap_or(0.0)
    }

    pub fn contributing(&self) -> Vec<Algorithm> {
        self.scores.keys().copied().collect()
    }
}

/// Final, immutable result for one (target, candidate) evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub candidate_id: String,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub match_type: MatchType,
    pub predicted_relationship: String,
    pub relationship_confidence: f64,
    pub raw_score: f64,
    pub algorithm_scores: BTreeMap<Algorithm, f64>,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinship_hint: Option<String>,
}

use crate::core::normalize::NormalizedProfile;
use crate::models::{MatchContext, MatchType};

/// Confidence multiplier for family labels chosen without both ages
pub const UNKNOWN_AGE_DISCOUNT: f64 = 0.6;

/// Features the decision table is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairFeatures {
    pub name_score: f64,
    pub overall_score: f64,
    pub age_a: Option<u32>,
    pub age_b: Option<u32>,
    pub same_location: bool,
    pub same_profession: bool,
}

impl PairFeatures {
    pub fn from_pair(
        a: &NormalizedProfile,
        b: &NormalizedProfile,
        name_score: f64,
        overall_score: f64,
    ) -> Self {
        let same_location = match (&a.location, &b.location) {
            (Some(x), Some(y)) => x.contains(y.as_str()) || y.contains(x.as_str()),
            _ => false,
        };
        let same_profession = matches!((&a.profession, &b.profession), (Some(x), Some(y)) if x == y);

        Self {
            name_score,
            overall_score,
            age_a: a.age,
            age_b: b.age,
            same_location,
            same_profession,
        }
    }

    /// Absolute age gap in years; 0 when either age is unknown
    pub fn age_diff(&self) -> u32 {
        match (self.age_a, self.age_b) {
            (Some(x), Some(y)) => x.abs_diff(y),
            _ => 0,
        }
    }

    pub fn ages_known(&self) -> bool {
        self.age_a.is_some() && self.age_b.is_some()
    }

    /// True only when both ages are known and `a` is strictly older
    fn a_is_older(&self) -> bool {
        matches!((self.age_a, self.age_b), (Some(x), Some(y)) if x > y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPrediction {
    pub match_type: MatchType,
    /// Human-readable label, always prefixed with "possible "
    pub label: String,
    pub confidence: f64,
}

impl RelationshipPrediction {
    fn new(match_type: MatchType, relation: &str, confidence: f64) -> Self {
        Self {
            match_type,
            label: format!("possible {}", relation),
            confidence,
        }
    }
}

/// Evaluate the relationship decision table for one pair
///
/// Keyed first on context, then on the derived features. Within each
/// branch the first matching rule wins.
pub fn predict(context: MatchContext, features: &PairFeatures) -> RelationshipPrediction {
    match context {
        MatchContext::Family => predict_family(features),
        MatchContext::Friend => predict_friend(features),
        MatchContext::Community => predict_community(features),
        MatchContext::General => predict_general(features),
    }
}

fn predict_family(f: &PairFeatures) -> RelationshipPrediction {
    let diff = f.age_diff();
    let older = f.a_is_older();
    // The age ladder falls to its closest band when an age is missing
    let discount = if f.ages_known() { 1.0 } else { UNKNOWN_AGE_DISCOUNT };
    let family = |relation: &str, confidence: f64| {
        RelationshipPrediction::new(MatchType::Family, relation, confidence * discount)
    };

    if f.name_score > 0.6 {
        match diff {
            0..=3 => family("twin", 0.9),
            4..=8 => family("sibling", 0.85),
            9..=15 => family("cousin", 0.8),
            16..=25 if older => family("uncle/aunt", 0.8),
            16..=25 => family("nephew/niece", 0.8),
            26..=40 if older => family("parent", 0.85),
            26..=40 => family("child", 0.85),
            _ if older => family("grandparent", 0.75),
            _ => family("grandchild", 0.75),
        }
    } else if f.name_score > 0.2 || f.same_location {
        match diff {
            0..=5 => family("sibling", 0.75),
            6..=15 => family("cousin", 0.7),
            16..=30 => family("uncle/aunt or nephew/niece", 0.7),
            _ => family("distant relative", 0.65),
        }
    } else {
        match diff {
            0..=10 => family("distant cousin", 0.6),
            11..=25 => family("distant relative", 0.55),
            _ => family("extended family", 0.5),
        }
    }
}

fn predict_friend(f: &PairFeatures) -> RelationshipPrediction {
    let diff = f.age_diff();
    let friend = |relation: &str, confidence: f64| {
        RelationshipPrediction::new(MatchType::Friend, relation, confidence)
    };

    if f.same_profession && diff <= 10 {
        friend("colleague", 0.8)
    } else if f.same_location {
        match diff {
            0..=5 => friend("childhood friend", 0.8),
            6..=15 => friend("classmate", 0.75),
            _ => friend("neighbor", 0.7),
        }
    } else if f.name_score > 0.3 {
        match diff {
            0..=5 => friend("old friend", 0.75),
            6..=15 => friend("school friend", 0.7),
            _ => friend("acquaintance", 0.65),
        }
    } else if f.same_profession {
        friend("work colleague", 0.7)
    } else if f.overall_score > 0.3 {
        match diff {
            0..=5 => friend("close friend", 0.7),
            6..=15 => friend("old friend", 0.65),
            _ => friend("acquaintance", 0.6),
        }
    } else {
        friend("social connection", 0.55)
    }
}

fn predict_community(f: &PairFeatures) -> RelationshipPrediction {
    let community = |relation: &str, confidence: f64| {
        RelationshipPrediction::new(MatchType::Community, relation, confidence)
    };

    match (f.same_location, f.same_profession) {
        (true, true) => community("local professional", 0.75),
        (true, false) if f.age_diff() <= 10 => community("neighbor", 0.7),
        (true, false) => community("local resident", 0.65),
        (false, true) => community("industry peer", 0.7),
        (false, false) if f.overall_score > 0.3 => community("community member", 0.6),
        (false, false) => community("connection", 0.5),
    }
}

fn predict_general(f: &PairFeatures) -> RelationshipPrediction {
    if f.name_score > 0.7 {
        RelationshipPrediction::new(MatchType::Family, "relative", 0.8)
    } else if f.overall_score > 0.6 {
        RelationshipPrediction::new(MatchType::Friend, "friend", 0.7)
    } else {
        RelationshipPrediction::new(MatchType::Community, "connection", 0.5)
    }
}

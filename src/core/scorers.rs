use thiserror::Error;
use crate::core::normalize::NormalizedProfile;
use crate::core::similarity::{
    classify_industry, given_names_equivalent, has_arabic_given_name, infer_cultural_region,
    ratio, shares_token, surnames_equivalent,
};
use crate::models::{Algorithm, AlgorithmScore};

/// A sub-scorer that failed to produce a usable score
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("{0} scorer produced an invalid score: {1}")]
    InvalidScore(Algorithm, f64),

    #[error("{0} scorer failed: {1}")]
    Failed(Algorithm, String),
}

/// One independent similarity dimension
///
/// Implementations must be pure: the same pair always yields the same score,
/// and a pair missing the scorer's inputs on either side yields
/// [`AlgorithmScore::none`].
pub trait Scorer: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn score(
        &self,
        a: &NormalizedProfile,
        b: &NormalizedProfile,
    ) -> Result<AlgorithmScore, ScorerError>;
}

macro_rules! builtin_scorer {
    ($name:ident, $algorithm:expr, $func:path) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Scorer for $name {
            fn algorithm(&self) -> Algorithm {
                $algorithm
            }

            fn score(
                &self,
                a: &NormalizedProfile,
                b: &NormalizedProfile,
            ) -> Result<AlgorithmScore, ScorerError> {
                Ok($func(a, b))
            }
        }
    };
}

builtin_scorer!(NameScorer, Algorithm::Name, score_name);
builtin_scorer!(LocationScorer, Algorithm::Location, score_location);
builtin_scorer!(DemographicScorer, Algorithm::Demographic, score_demographic);
builtin_scorer!(InterestsScorer, Algorithm::Interests, score_interests);
builtin_scorer!(TemporalScorer, Algorithm::Temporal, score_temporal);
builtin_scorer!(FamilyScorer, Algorithm::Family, score_family);
builtin_scorer!(ProfessionScorer, Algorithm::Profession, score_profession);
builtin_scorer!(CulturalScorer, Algorithm::Cultural, score_cultural);

/// Every built-in scorer, in declaration order
pub fn default_scorers() -> Vec<Box<dyn Scorer>> {
    vec![
        Box::new(NameScorer),
        Box::new(LocationScorer),
        Box::new(DemographicScorer),
        Box::new(InterestsScorer),
        Box::new(TemporalScorer),
        Box::new(FamilyScorer),
        Box::new(ProfessionScorer),
        Box::new(CulturalScorer),
    ]
}

/// Name similarity: surnames, given names and cross-cultural equivalents
pub fn score_name(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    if !a.has_name() || !b.has_name() {
        return AlgorithmScore::none();
    }

    let mut result = AlgorithmScore::none();
    let mut score = 0.0;

    if let (Some(last_a), Some(last_b)) = (&a.last_name, &b.last_name) {
        if last_a == last_b {
            score += 0.8;
            result.push_reason(format!("Same last name: {}", last_a));
        } else if a.maiden_name.as_ref() == Some(last_b) || b.maiden_name.as_ref() == Some(last_a) {
            score += 0.8;
            result.push_reason("Maiden name matches last name");
        } else {
            let similarity = ratio(last_a, last_b);
            if similarity > 0.8 {
                score += 0.6 * similarity;
                result.push_reason(format!("Similar last name: {} / {}", last_a, last_b));
            }
        }
    }

    if let (Some(first_a), Some(first_b)) = (&a.first_name, &b.first_name) {
        let similarity = ratio(first_a, first_b);
        if similarity > 0.7 {
            score += 0.3 * similarity;
            result.push_reason(format!("Similar first name: {} / {}", first_a, first_b));
        }
    }

    let cultural = cultural_name_strength(a, b);
    if cultural > 0.0 {
        score += cultural * 0.4;
        result.push_reason("Similar cultural naming patterns");
    }

    result.set_score(score);
    result
}

/// Strength of cross-cultural name equivalence between two profiles
fn cultural_name_strength(a: &NormalizedProfile, b: &NormalizedProfile) -> f64 {
    let first_equivalent = matches!(
        (&a.first_name, &b.first_name),
        (Some(x), Some(y)) if given_names_equivalent(x, y)
    );
    let last_equivalent = matches!(
        (&a.last_name, &b.last_name),
        (Some(x), Some(y)) if surnames_equivalent(x, y)
    );
    if first_equivalent || last_equivalent {
        return 1.0;
    }

    match (&a.full_name, &b.full_name) {
        (Some(x), Some(y)) if has_arabic_given_name(x) && has_arabic_given_name(y) => 0.6,
        _ => 0.0,
    }
}

/// Location similarity: exact, fuzzy, then shared token
pub fn score_location(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    let (Some(loc_a), Some(loc_b)) = (&a.location, &b.location) else {
        return AlgorithmScore::none();
    };

    let shown_a = a.location_display.as_deref().unwrap_or(loc_a);
    let shown_b = b.location_display.as_deref().unwrap_or(loc_b);

    if loc_a == loc_b {
        AlgorithmScore::new(0.9, vec![format!("Same location: {}", shown_a)])
    } else if ratio(loc_a, loc_b) > 0.6 {
        AlgorithmScore::new(0.6, vec![format!("Nearby locations: {} / {}", shown_a, shown_b)])
    } else if shares_token(loc_a, loc_b) {
        AlgorithmScore::new(0.3, vec![format!("Same region: {} / {}", shown_a, shown_b)])
    } else {
        AlgorithmScore::none()
    }
}

/// Age proximity band for an absolute age difference in years
pub fn age_band(age_diff: u32) -> f64 {
    match age_diff {
        0..=2 => 1.0,
        3..=5 => 0.8,
        6..=10 => 0.6,
        11..=20 => 0.3,
        _ => 0.1,
    }
}

/// Demographic blend of age proximity, gender and profession
///
/// Needs either an age on both sides or a profession on both sides; gender
/// alone is not evidence.
pub fn score_demographic(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    let age_score = match (a.age, b.age) {
        (Some(x), Some(y)) => Some(age_band(x.abs_diff(y))),
        _ => None,
    };
    let profession_score = match (&a.profession, &b.profession) {
        (Some(x), Some(y)) => Some(ratio(x, y)),
        _ => None,
    };
    if age_score.is_none() && profession_score.is_none() {
        return AlgorithmScore::none();
    }

    let gender_score = match (&a.gender, &b.gender) {
        (Some(x), Some(y)) if x == y => 0.7,
        _ => 0.5,
    };

    let mut result = AlgorithmScore::none();
    let mut score = gender_score * 0.3;

    if let Some(age) = age_score {
        score += age * 0.5;
        if age > 0.7 {
            result.push_reason("Similar age group");
        }
    }
    if let Some(profession) = profession_score {
        score += profession * 0.2;
        if profession > 0.7 {
            result.push_reason("Similar profession");
        }
    }

    result.set_score(score);
    result
}

/// Jaccard similarity of interest sets
pub fn score_interests(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    if a.interests.is_empty() || b.interests.is_empty() {
        return AlgorithmScore::none();
    }

    let shared: Vec<&String> = a.interests.intersection(&b.interests).collect();
    if shared.is_empty() {
        return AlgorithmScore::none();
    }
    let union = a.interests.union(&b.interests).count();
    let score = shared.len() as f64 / union as f64;

    let top: Vec<&str> = shared.iter().take(3).map(|s| s.as_str()).collect();
    AlgorithmScore::new(score, vec![format!("Common interests: {}", top.join(", "))])
}

/// Signup-date proximity
pub fn score_temporal(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    let (Some(at), Some(bt)) = (a.signup_at, b.signup_at) else {
        return AlgorithmScore::none();
    };

    match (at - bt).num_days().unsigned_abs() {
        0..=7 => AlgorithmScore::new(0.8, vec!["Joined around the same time".to_string()]),
        8..=30 => AlgorithmScore::new(0.5, Vec::new()),
        31..=90 => AlgorithmScore::new(0.2, Vec::new()),
        _ => AlgorithmScore::none(),
    }
}

/// Family heuristic over recorded parent names and the family name
///
/// Shared-parent detection is symmetric; the parent/child label is
/// oriented so that "parent" means `a` is the parent of `b`.
pub fn score_family(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    let mut result = AlgorithmScore::none();
    let mut score = 0.0;

    let same_father = matches!((&a.father_name, &b.father_name), (Some(x), Some(y)) if x == y);
    let same_mother = matches!((&a.mother_name, &b.mother_name), (Some(x), Some(y)) if x == y);

    let mut relation = match (same_father, same_mother) {
        (true, true) => Some("full sibling"),
        (true, false) => Some("paternal half-sibling"),
        (false, true) => Some("maternal half-sibling"),
        (false, false) => None,
    };

    if same_father {
        score += 0.5;
        result.push_reason(format!("Same father: {}", a.father_name.as_deref().unwrap_or_default()));
    }
    if same_mother {
        score += 0.5;
        result.push_reason(format!("Same mother: {}", a.mother_name.as_deref().unwrap_or_default()));
    }

    let is_parent_of = |parent: &NormalizedProfile, child: &NormalizedProfile| {
        parent.full_name.as_ref().is_some_and(|name| {
            child.father_name.as_ref() == Some(name) || child.mother_name.as_ref() == Some(name)
        })
    };
    if is_parent_of(a, b) {
        score += 0.8;
        result.push_reason("Potential parent-child relationship");
        relation = Some("parent");
    } else if is_parent_of(b, a) {
        score += 0.8;
        result.push_reason("Potential parent-child relationship");
        relation = Some("child");
    }

    if let (Some(last_a), Some(last_b)) = (&a.last_name, &b.last_name) {
        if last_a == last_b {
            score += 0.2;
            result.push_reason(format!("Same family name: {}", last_a));
        }
    }

    result.set_score(score);
    result.with_relation(relation.map(str::to_string))
}

/// Profession similarity: exact, same industry, then fuzzy
pub fn score_profession(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    let (Some(prof_a), Some(prof_b)) = (&a.profession, &b.profession) else {
        return AlgorithmScore::none();
    };

    if prof_a == prof_b {
        return AlgorithmScore::new(1.0, vec![format!("Same profession: {}", prof_a)]);
    }

    let mut result = AlgorithmScore::none();
    let mut score: f64 = 0.0;

    if let (Some(ind_a), Some(ind_b)) = (classify_industry(prof_a), classify_industry(prof_b)) {
        if ind_a == ind_b {
            score += 0.6;
            result.push_reason(format!("Same industry: {}", ind_a));
        }
    }

    let similarity = ratio(prof_a, prof_b);
    if similarity > 0.5 {
        score = score.max(similarity * 0.7);
        result.push_reason("Related profession");
    }

    result.set_score(score);
    result
}

/// Cultural background, family origin and inferred cultural region
pub fn score_cultural(a: &NormalizedProfile, b: &NormalizedProfile) -> AlgorithmScore {
    let mut result = AlgorithmScore::none();
    let mut score = 0.0;

    if let (Some(x), Some(y)) = (&a.cultural_background, &b.cultural_background) {
        if x == y {
            score += 0.5;
            result.push_reason(format!("Shared cultural background: {}", x));
        }
    }
    if let (Some(x), Some(y)) = (&a.family_origin, &b.family_origin) {
        if x == y {
            score += 0.3;
            result.push_reason(format!("Same family origin: {}", x));
        }
    }

    let region_a = a.location.as_deref().and_then(infer_cultural_region);
    let region_b = b.location.as_deref().and_then(infer_cultural_region);
    if let (Some(x), Some(y)) = (region_a, region_b) {
        if x == y {
            score += 0.2;
            result.push_reason(format!("Same cultural region: {}", x));
        }
    }

    result.set_score(score);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn person(first: &str, last: &str) -> NormalizedProfile {
        NormalizedProfile {
            id: format!("{}-{}", first, last),
            first_name: Some(first.to_string()).filter(|s| !s.is_empty()),
            last_name: Some(last.to_string()).filter(|s| !s.is_empty()),
            full_name: Some(format!("{} {}", first, last).trim().to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_exact_last_name() {
        let result = score_name(&person("john", "smith"), &person("jane", "smith"));
        assert!(result.score >= 0.8);
        assert_eq!(result.reasons[0], "Same last name: smith");
    }

    #[test]
    fn test_name_fuzzy_gate_is_hard() {
        // ratio("smith", "smyth") == 0.8, which is not above the cutoff
        let result = score_name(&person("", "smith"), &person("", "smyth"));
        assert_eq!(result.score, 0.0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_first_name_gate_is_hard() {
        // ratio("fredericka", "frederique") == 0.7, not above the cutoff
        let at_cutoff = score_name(&person("fredericka", ""), &person("frederique", ""));
        assert_eq!(at_cutoff.score, 0.0);
        assert!(at_cutoff.reasons.is_empty());

        let above = score_name(&person("frederica", ""), &person("frederika", ""));
        assert!(above.score > 0.0);
        assert_eq!(above.reasons, vec!["Similar first name: frederica / frederika"]);
    }

    #[test]
    fn test_name_equivalence_stands_alone() {
        let result = score_name(&person("wilhelm", "schmidt"), &person("william", "smith"));
        assert!((result.score - 0.4).abs() < 1e-9, "got {}", result.score);
        assert_eq!(result.reasons, vec!["Similar cultural naming patterns"]);
    }

    #[test]
    fn test_name_missing_on_one_side() {
        let empty = NormalizedProfile::default();
        assert_eq!(score_name(&person("john", "smith"), &empty), AlgorithmScore::none());
    }

    #[test]
    fn test_location_tiers() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();

        a.location = Some("dubai".to_string());
        b.location = Some("dubai".to_string());
        assert_eq!(score_location(&a, &b).score, 0.9);

        b.location = Some("dubay".to_string());
        assert_eq!(score_location(&a, &b).score, 0.6);

        a.location = Some("brooklyn, ny".to_string());
        b.location = Some("albany ny".to_string());
        assert_eq!(score_location(&a, &b).score, 0.3);

        b.location = None;
        assert_eq!(score_location(&a, &b), AlgorithmScore::none());
    }

    #[test]
    fn test_location_fuzzy_gate_is_hard() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();

        // ratio("paris", "parma") == 0.6 and no shared token
        a.location = Some("paris".to_string());
        b.location = Some("parma".to_string());
        assert_eq!(score_location(&a, &b), AlgorithmScore::none());

        b.location = Some("parts".to_string());
        assert_eq!(score_location(&a, &b).score, 0.6);
    }

    #[test]
    fn test_location_reasons_show_original_spelling() {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut raw_a = crate::models::Profile::new("a");
        raw_a.location = Some("Kansas City, Missouri".to_string());
        let mut raw_b = crate::models::Profile::new("b");
        raw_b.location = Some("Kansas City, Missouri".to_string());

        let a = crate::core::normalize::normalize(&raw_a, today);
        let b = crate::core::normalize::normalize(&raw_b, today);
        assert_eq!(score_location(&a, &b).reasons, vec!["Same location: Kansas City, Missouri"]);

        raw_b.location = Some("Missouri".to_string());
        let b = crate::core::normalize::normalize(&raw_b, today);
        assert_eq!(
            score_location(&a, &b).reasons,
            vec!["Same region: Kansas City, Missouri / Missouri"]
        );
    }

    #[test]
    fn test_age_bands() {
        assert_eq!(age_band(0), 1.0);
        assert_eq!(age_band(2), 1.0);
        assert_eq!(age_band(5), 0.8);
        assert_eq!(age_band(10), 0.6);
        assert_eq!(age_band(20), 0.3);
        assert_eq!(age_band(21), 0.1);
    }

    #[test]
    fn test_demographic_blend() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();
        assert_eq!(score_demographic(&a, &b), AlgorithmScore::none());

        a.age = Some(30);
        b.age = Some(31);
        a.gender = Some("female".to_string());
        b.gender = Some("female".to_string());
        let result = score_demographic(&a, &b);
        assert!((result.score - (0.5 + 0.21)).abs() < 1e-9);
        assert_eq!(result.reasons, vec!["Similar age group"]);
    }

    #[test]
    fn test_interests_jaccard() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();
        a.interests = ["chess", "hiking", "music"].iter().map(|s| s.to_string()).collect();
        assert_eq!(score_interests(&a, &b).score, 0.0);

        b.interests = ["hiking", "music", "poetry", "rowing"].iter().map(|s| s.to_string()).collect();
        let result = score_interests(&a, &b);
        assert!((result.score - 2.0 / 5.0).abs() < 1e-9);
        assert_eq!(result.reasons, vec!["Common interests: hiking, music"]);
    }

    #[test]
    fn test_temporal_bands() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();
        a.signup_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        b.signup_at = Some(Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap());
        assert_eq!(score_temporal(&a, &b).score, 0.8);
        b.signup_at = Some(Utc.with_ymd_and_hms(2024, 1, 25, 0, 0, 0).unwrap());
        assert_eq!(score_temporal(&a, &b).score, 0.5);
        b.signup_at = Some(Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(score_temporal(&a, &b).score, 0.2);
        b.signup_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(score_temporal(&a, &b), AlgorithmScore::none());
    }

    #[test]
    fn test_family_parent_child() {
        let parent = person("john", "smith");
        let mut child = person("amy", "smith");
        child.father_name = Some("john smith".to_string());

        let forward = score_family(&parent, &child);
        assert_eq!(forward.score, 1.0);
        assert_eq!(forward.relation.as_deref(), Some("parent"));

        let backward = score_family(&child, &parent);
        assert_eq!(backward.relation.as_deref(), Some("child"));
    }

    #[test]
    fn test_profession_industry() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();
        a.profession = Some("software engineer".to_string());
        b.profession = Some("data scientist".to_string());
        let result = score_profession(&a, &b);
        assert_eq!(result.score, 0.6);
        assert_eq!(result.reasons, vec!["Same industry: technology"]);
    }

    #[test]
    fn test_profession_fuzzy_gate_is_hard() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();

        // ratio("welder", "waiter") == 0.5, neither maps to an industry
        a.profession = Some("welder".to_string());
        b.profession = Some("waiter".to_string());
        let at_cutoff = score_profession(&a, &b);
        assert_eq!(at_cutoff.score, 0.0);
        assert!(at_cutoff.reasons.is_empty());

        b.profession = Some("weaver".to_string());
        let above = score_profession(&a, &b);
        assert!((above.score - 0.7 * (4.0 / 6.0)).abs() < 1e-9, "got {}", above.score);
        assert_eq!(above.reasons, vec!["Related profession"]);
    }

    #[test]
    fn test_cultural_signals() {
        let mut a = NormalizedProfile::default();
        let mut b = NormalizedProfile::default();
        a.cultural_background = Some("irish-american".to_string());
        b.cultural_background = Some("irish-american".to_string());
        a.location = Some("dublin, ireland".to_string());
        b.location = Some("cork ireland".to_string());
        let result = score_cultural(&a, &b);
        assert!((result.score - 0.7).abs() < 1e-9);
        assert_eq!(result.reasons.len(), 2);
    }
}

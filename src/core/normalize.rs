use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use crate::models::Profile;

/// Generic words dropped from locations before comparison
const LOCATION_STOPWORDS: [&str; 8] = [
    "city", "town", "village", "area", "district", "county", "state", "province",
];

/// Comparable view of a [`Profile`], derived per request
///
/// Absent or blank fields are `None`, so scorers can tell "missing"
/// apart from "present but different".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedProfile {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub maiden_name: Option<String>,
    /// "first last" when at least one part is present
    pub full_name: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    /// Trimmed original location, for human-readable reasons
    pub location_display: Option<String>,
    pub profession: Option<String>,
    pub cultural_background: Option<String>,
    pub family_origin: Option<String>,
    pub interests: BTreeSet<String>,
    pub signup_at: Option<chrono::DateTime<chrono::Utc>>,
    pub has_connections: bool,
    pub has_genetic_markers: bool,
}

impl NormalizedProfile {
    pub fn has_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }
}

/// Normalize a profile against the given calendar date. Never fails.
pub fn normalize(profile: &Profile, today: NaiveDate) -> NormalizedProfile {
    let first_name = normalize_opt(profile.first_name.as_deref(), normalize_name);
    let last_name = normalize_opt(profile.last_name.as_deref(), normalize_name);

    let full_name = match (&first_name, &last_name) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (None, None) => None,
    };

    let location = normalize_opt(profile.location.as_deref(), normalize_location);
    let location_display = location
        .as_ref()
        .and_then(|_| profile.location.as_deref())
        .map(collapse_whitespace);

    NormalizedProfile {
        id: profile.id.clone(),
        first_name,
        last_name,
        middle_name: normalize_opt(profile.middle_name.as_deref(), normalize_name),
        maiden_name: normalize_opt(profile.maiden_name.as_deref(), normalize_name),
        full_name,
        father_name: normalize_opt(profile.father_name.as_deref(), normalize_name),
        mother_name: normalize_opt(profile.mother_name.as_deref(), normalize_name),
        gender: normalize_opt(profile.gender.as_deref(), normalize_text),
        age: profile
            .birth_date
            .as_deref()
            .and_then(parse_birth_date)
            .and_then(|birth| age_on(birth, today)),
        location,
        location_display,
        profession: normalize_opt(profile.profession.as_deref(), normalize_text),
        cultural_background: normalize_opt(profile.cultural_background.as_deref(), normalize_text),
        family_origin: normalize_opt(profile.family_origin.as_deref(), normalize_text),
        interests: profile
            .interests
            .iter()
            .map(|i| normalize_text(i))
            .filter(|i| !i.is_empty())
            .collect(),
        signup_at: profile.signup_at,
        has_connections: !profile.known_connections.is_empty(),
        has_genetic_markers: profile.has_genetic_markers,
    }
}

#[inline]
fn normalize_opt(value: Option<&str>, f: fn(&str) -> String) -> Option<String> {
    value.map(f).filter(|v| !v.is_empty())
}

/// Compatibility-decompose, strip diacritics, lowercase, keep only alphanumerics and
/// whitespace, collapse whitespace
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    collapse_whitespace(&stripped)
}

/// Lowercase, drop generic place words, collapse whitespace
pub fn normalize_location(location: &str) -> String {
    let lowered = location.to_lowercase();
    lowered
        .split_whitespace()
        .filter(|token| {
            let core = token.trim_matches(|c: char| !c.is_alphanumeric());
            !LOCATION_STOPWORDS.contains(&core)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase and collapse whitespace
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse `YYYY-MM-DD`, also accepting timestamps that start with one
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Whole years elapsed between `birth` and `today`; `None` for future dates
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

use crate::models::{Algorithm, MatchContext, Profile};

/// Per-algorithm weights; zero means "not evaluated"
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightVector {
    weights: [f64; Algorithm::COUNT],
}

impl WeightVector {
    pub fn from_pairs(pairs: &[(Algorithm, f64)]) -> Self {
        let mut vector = Self::default();
        for (algorithm, weight) in pairs {
            vector.set(*algorithm, *weight);
        }
        vector
    }

    /// General-purpose vector: name 0.35, location 0.25, demographic 0.20,
    /// interests 0.15, temporal 0.05
    pub fn general() -> Self {
        Self::from_pairs(&[
            (Algorithm::Name, 0.35),
            (Algorithm::Location, 0.25),
            (Algorithm::Demographic, 0.20),
            (Algorithm::Interests, 0.15),
            (Algorithm::Temporal, 0.05),
        ])
    }

    /// Family-context vector over family/location/profession/age/name/cultural
    pub fn family() -> Self {
        Self::from_pairs(&[
            (Algorithm::Family, 0.40),
            (Algorithm::Location, 0.20),
            (Algorithm::Profession, 0.15),
            (Algorithm::Demographic, 0.10),
            (Algorithm::Name, 0.10),
            (Algorithm::Cultural, 0.05),
        ])
    }

    #[inline]
    pub fn get(&self, algorithm: Algorithm) -> f64 {
        self.weights[algorithm.index()]
    }

    /// Set a weight; negative and non-finite values are stored as zero
    pub fn set(&mut self, algorithm: Algorithm, weight: f64) {
        self.weights[algorithm.index()] = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
    }

    pub fn scale(&mut self, algorithm: Algorithm, factor: f64) {
        let current = self.get(algorithm);
        self.set(algorithm, current * factor);
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Algorithms with a positive weight, in declaration order
    pub fn active(&self) -> impl Iterator<Item = (Algorithm, f64)> + '_ {
        Algorithm::ALL
            .iter()
            .map(|a| (*a, self.get(*a)))
            .filter(|(_, w)| *w > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.total() <= 0.0
    }

    /// Scale so the weights sum to 1.0; an all-zero vector stays all zero
    pub fn normalized(mut self) -> Self {
        let total = self.total();
        if total > 0.0 {
            for w in self.weights.iter_mut() {
                *w /= total;
            }
        }
        self
    }

    /// Drop the given algorithms and redistribute their weight proportionally
    /// among the remaining active ones
    pub fn without(mut self, excluded: &[Algorithm]) -> Self {
        for algorithm in excluded {
            self.set(*algorithm, 0.0);
        }
        self.normalized()
    }
}

/// Profile-quality signals that drive weight adjustment
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompletenessSignals {
    /// Present fields among name, location, birth date, profession,
    /// cultural background and family origin, divided by six
    pub completeness: f64,
    /// Name/location data quality in [0, 1]
    pub quality: f64,
    pub has_connections: bool,
    pub has_genetic_markers: bool,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl CompletenessSignals {
    pub fn from_profile(profile: &Profile) -> Self {
        let fields = [
            present(&profile.first_name) || present(&profile.last_name),
            present(&profile.location),
            present(&profile.birth_date),
            present(&profile.profession),
            present(&profile.cultural_background),
            present(&profile.family_origin),
        ];
        let filled = fields.iter().filter(|f| **f).count();

        Self {
            completeness: filled as f64 / fields.len() as f64,
            quality: name_location_quality(profile),
            has_connections: !profile.known_connections.is_empty(),
            has_genetic_markers: profile.has_genetic_markers,
        }
    }
}

/// Quality of name and location data (0-1)
pub fn name_location_quality(profile: &Profile) -> f64 {
    let good_name = |name: &Option<String>| {
        name.as_deref()
            .map(str::trim)
            .is_some_and(|n| n.chars().count() > 1 && n.chars().all(char::is_alphabetic))
    };

    let mut score = 0.0;
    if good_name(&profile.first_name) {
        score += 0.3;
    }
    if good_name(&profile.last_name) {
        score += 0.3;
    }
    if let Some(location) = profile.location.as_deref().map(str::trim) {
        if location.chars().count() > 3 {
            score += 0.2;
            if location.contains(',') {
                score += 0.2;
            }
        }
    }
    f64::min(score, 1.0)
}

/// Derives the per-request weight vector from context and profile signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveWeighter {
    general: WeightVector,
    family: WeightVector,
}

impl AdaptiveWeighter {
    pub fn new(general: WeightVector, family: WeightVector) -> Self {
        Self { general, family }
    }

    pub fn base(&self, context: MatchContext) -> WeightVector {
        match context {
            MatchContext::Family => self.family,
            MatchContext::Friend | MatchContext::Community | MatchContext::General => self.general,
        }
    }

    /// Apply the multiplicative adjustments and renormalize to 1.0
    pub fn weights(&self, context: MatchContext, signals: &CompletenessSignals) -> WeightVector {
        let mut weights = self.base(context);

        if signals.completeness > 0.8 {
            weights.scale(Algorithm::Demographic, 1.3);
        } else if signals.completeness < 0.3 {
            weights.scale(Algorithm::Demographic, 0.7);
        }

        if signals.quality > 0.8 {
            weights.scale(Algorithm::Name, 1.4);
            weights.scale(Algorithm::Location, 1.4);
        } else if signals.quality < 0.3 {
            weights.scale(Algorithm::Name, 0.6);
            weights.scale(Algorithm::Location, 0.6);
        }

        if signals.has_connections {
            weights.scale(Algorithm::Family, 1.3);
        } else {
            weights.scale(Algorithm::Family, 0.5);
        }

        if signals.has_genetic_markers {
            weights.scale(Algorithm::Family, 1.5);
        }

        weights.normalized()
    }
}

impl Default for AdaptiveWeighter {
    fn default() -> Self {
        Self::new(WeightVector::general(), WeightVector::family())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sums_to_one(weights: &WeightVector) {
        assert!((weights.total() - 1.0).abs() < 1e-9, "sum was {}", weights.total());
    }

    #[test]
    fn test_default_vectors() {
        let general = WeightVector::general();
        assert_eq!(general.get(Algorithm::Name), 0.35);
        assert_eq!(general.get(Algorithm::Family), 0.0);
        assert_sums_to_one(&general);

        let family = WeightVector::family();
        assert_eq!(family.get(Algorithm::Family), 0.40);
        assert_eq!(family.get(Algorithm::Interests), 0.0);
        assert_sums_to_one(&family);
    }

    #[test]
    fn test_weights_always_normalized() {
        let weighter = AdaptiveWeighter::default();
        let cases = [
            CompletenessSignals::default(),
            CompletenessSignals { completeness: 1.0, quality: 1.0, has_connections: true, has_genetic_markers: true },
            CompletenessSignals { completeness: 0.5, quality: 0.5, has_connections: false, has_genetic_markers: true },
        ];
        for context in [MatchContext::General, MatchContext::Family, MatchContext::Friend, MatchContext::Community] {
            for signals in &cases {
                assert_sums_to_one(&weighter.weights(context, signals));
            }
        }
    }

    #[test]
    fn test_high_quality_boosts_name() {
        let weighter = AdaptiveWeighter::default();
        let neutral = CompletenessSignals { completeness: 0.5, quality: 0.5, ..Default::default() };
        let rich = CompletenessSignals { completeness: 0.5, quality: 1.0, ..Default::default() };

        let base = weighter.weights(MatchContext::General, &neutral);
        let boosted = weighter.weights(MatchContext::General, &rich);
        assert!(boosted.get(Algorithm::Name) > base.get(Algorithm::Name));
        assert!(boosted.get(Algorithm::Interests) < base.get(Algorithm::Interests));
    }

    fn neutral() -> CompletenessSignals {
        CompletenessSignals { completeness: 0.5, quality: 0.5, ..Default::default() }
    }

    /// Weight of `a` relative to `b`, which renormalization leaves untouched
    fn relative(weights: &WeightVector, a: Algorithm, b: Algorithm) -> f64 {
        weights.get(a) / weights.get(b)
    }

    #[test]
    fn test_completeness_scales_demographic() {
        let weighter = AdaptiveWeighter::default();
        let base = relative(
            &weighter.weights(MatchContext::General, &neutral()),
            Algorithm::Demographic,
            Algorithm::Interests,
        );
        assert!((base - 0.20 / 0.15).abs() < 1e-9);

        let complete = CompletenessSignals { completeness: 0.9, ..neutral() };
        let sparse = CompletenessSignals { completeness: 0.2, ..neutral() };
        let edge = CompletenessSignals { completeness: 0.8, ..neutral() };

        let scaled = |signals: &CompletenessSignals| {
            relative(
                &weighter.weights(MatchContext::General, signals),
                Algorithm::Demographic,
                Algorithm::Interests,
            ) / base
        };
        assert!((scaled(&complete) - 1.3).abs() < 1e-9);
        assert!((scaled(&sparse) - 0.7).abs() < 1e-9);
        assert!((scaled(&edge) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_connections_halve_family() {
        let weighter = AdaptiveWeighter::default();
        let base = relative(&weighter.base(MatchContext::Family), Algorithm::Family, Algorithm::Location);

        let unconnected = weighter.weights(MatchContext::Family, &neutral());
        let connected = weighter.weights(
            MatchContext::Family,
            &CompletenessSignals { has_connections: true, ..neutral() },
        );

        let unconnected = relative(&unconnected, Algorithm::Family, Algorithm::Location) / base;
        let connected = relative(&connected, Algorithm::Family, Algorithm::Location) / base;
        assert!((unconnected - 0.5).abs() < 1e-9, "got {}", unconnected);
        assert!((connected - 1.3).abs() < 1e-9, "got {}", connected);
    }

    #[test]
    fn test_genetic_markers_alone_boost_family() {
        let weighter = AdaptiveWeighter::default();
        let plain = weighter.weights(MatchContext::Family, &neutral());
        let marked = weighter.weights(
            MatchContext::Family,
            &CompletenessSignals { has_genetic_markers: true, ..neutral() },
        );

        let boost = relative(&marked, Algorithm::Family, Algorithm::Location)
            / relative(&plain, Algorithm::Family, Algorithm::Location);
        assert!((boost - 1.5).abs() < 1e-9, "got {}", boost);
        assert!(marked.get(Algorithm::Family) > plain.get(Algorithm::Family));
    }

    #[test]
    fn test_without_redistributes_proportionally() {
        let weights = WeightVector::general().without(&[Algorithm::Name]);
        assert_eq!(weights.get(Algorithm::Name), 0.0);
        assert_sums_to_one(&weights);
        // location : demographic ratio is preserved
        let ratio = weights.get(Algorithm::Location) / weights.get(Algorithm::Demographic);
        assert!((ratio - 0.25 / 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_signals() {
        let mut profile = Profile::new("p");
        profile.first_name = Some("John".to_string());
        profile.last_name = Some("Smith".to_string());
        profile.location = Some("New York, NY".to_string());
        profile.birth_date = Some("1980-01-01".to_string());

        let signals = CompletenessSignals::from_profile(&profile);
        assert!((signals.completeness - 3.0 / 6.0).abs() < 1e-9);
        assert!((signals.quality - 1.0).abs() < 1e-9);
        assert!(!signals.has_connections);
    }
}

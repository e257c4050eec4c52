// Criterion benchmarks for Kindred Match

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kindred_match::core::{normalize::normalize, MatchEngine, MatchParams};
use kindred_match::models::{MatchContext, Profile};

const LAST_NAMES: &[&str] = &["Smith", "Schmidt", "Cohen", "Hassan", "Nakamura", "Okafor", "Lopez"];
const LOCATIONS: &[&str] = &["Dubai, UAE", "New York City", "Brooklyn, NY", "Dublin, Ireland", "Lagos"];

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

fn create_candidate(id: usize) -> Profile {
    let mut profile = Profile::new(format!("c{}", id));
    profile.first_name = Some(format!("Person{}", id % 37));
    profile.last_name = Some(LAST_NAMES[id % LAST_NAMES.len()].to_string());
    profile.father_name = Some(format!("Father {}", LAST_NAMES[id % 3]));
    profile.location = Some(LOCATIONS[id % LOCATIONS.len()].to_string());
    profile.birth_date = Some(format!("{}-0{}-1{}", 1950 + id % 60, 1 + id % 9, id % 10));
    profile.gender = Some(if id % 2 == 0 { "female" } else { "male" }.to_string());
    profile.profession = Some(if id % 3 == 0 { "Software Engineer" } else { "Teacher" }.to_string());
    profile.interests = vec!["chess".to_string(), format!("hobby{}", id % 5)];
    profile
}

fn create_target() -> Profile {
    let mut target = create_candidate(0);
    target.id = "target".to_string();
    target
}

fn bench_normalize(c: &mut Criterion) {
    let profile = create_candidate(42);
    c.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box(&profile), reference_date()));
    });
}

fn bench_evaluate_pair(c: &mut Criterion) {
    let engine = MatchEngine::with_defaults().with_reference_date(reference_date());
    let target = create_target();
    let candidate = create_candidate(7);

    let mut group = c.benchmark_group("evaluate_pair");
    for context in [MatchContext::General, MatchContext::Family] {
        group.bench_with_input(BenchmarkId::from_parameter(context), &context, |b, ctx| {
            b.iter(|| engine.evaluate_pair(black_box(&target), black_box(&candidate), *ctx));
        });
    }
    group.finish();
}

fn bench_find_matches(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let engine = MatchEngine::with_defaults().with_reference_date(reference_date());
    let target = create_target();

    let mut group = c.benchmark_group("find_matches");

    for candidate_count in [10, 100, 1000].iter() {
        let candidates: Vec<Profile> = (1..=*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("find_matches_in", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    runtime.block_on(engine.find_matches_in(
                        black_box(&target),
                        black_box(candidates.clone()),
                        MatchContext::General,
                        MatchParams::new(0.0, 50),
                    ))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_evaluate_pair, bench_find_matches);

criterion_main!(benches);

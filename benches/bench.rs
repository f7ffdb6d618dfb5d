// Criterion benchmarks for Munch Algo

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use munch_algo::core::{
    apply_filters, dedupe_by_id, distance_miles, relax_criteria, shuffle_candidates,
    ExclusionTracker,
};
use munch_algo::models::{FilterCriteria, GeoPoint, PriceTier, Restaurant, SupplyTuning};

const CUISINES: [&str; 5] = ["Thai", "Mexican", "Italian", "Japanese Ramen", "Indian"];

fn create_candidate(id: usize) -> Restaurant {
    let tier = match id % 3 {
        0 => PriceTier::Low,
        1 => PriceTier::Medium,
        _ => PriceTier::High,
    };

    Restaurant {
        id: format!("r{}", id),
        name: format!("Restaurant {}", id),
        cuisine: CUISINES[id % CUISINES.len()].to_string(),
        price_tier: tier,
        rating: 3.0 + (id % 20) as f64 / 10.0,
        distance_miles: (id % 25) as f64,
        dietary_tags: if id % 4 == 0 { vec!["vegan".to_string()] } else { vec![] },
        eta_minutes: 15 + (id % 30) as u16,
        deal: None,
        latitude: Some(40.7128 + (id as f64 * 0.001) % 0.5),
        longitude: Some(-74.0060 + (id as f64 * 0.001) % 0.5),
        image_url: None,
    }
}

fn create_criteria() -> FilterCriteria {
    FilterCriteria {
        max_price_tier: PriceTier::Medium,
        min_rating: 4.0,
        dietary_tags: vec!["vegan".to_string()],
        cuisine_preferences: vec!["thai".to_string(), "ramen".to_string()],
        ..FilterCriteria::default()
    }
}

fn create_exclusions(count: usize) -> ExclusionTracker {
    let now = Utc::now();
    let mut exclusions = ExclusionTracker::new();
    for i in (0..count).step_by(7) {
        exclusions.record_like(format!("r{}", i));
    }
    for i in (3..count).step_by(11) {
        exclusions.record_pass_at(format!("r{}", i), now);
    }
    exclusions
}

fn bench_distance(c: &mut Criterion) {
    let origin = GeoPoint { latitude: 40.7128, longitude: -74.0060 };
    let target = GeoPoint { latitude: 40.72, longitude: -74.01 };

    c.bench_function("distance_miles", |b| {
        b.iter(|| distance_miles(black_box(origin), black_box(target)));
    });
}

fn bench_filtering(c: &mut Criterion) {
    let criteria = create_criteria();
    let relaxed = relax_criteria(&criteria, &SupplyTuning::default());
    let now = Utc::now();

    let mut group = c.benchmark_group("apply_filters");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<Restaurant> = (0..*candidate_count).map(create_candidate).collect();
        let exclusions = create_exclusions(*candidate_count);

        group.bench_with_input(
            BenchmarkId::new("strict", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    apply_filters(
                        black_box(candidates.clone()),
                        black_box(&criteria),
                        black_box(&exclusions),
                        now,
                    )
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("relaxed", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    apply_filters(
                        black_box(candidates.clone()),
                        black_box(&relaxed),
                        black_box(&exclusions),
                        now,
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_dedupe_and_shuffle(c: &mut Criterion) {
    // Three overlapping stage batches, as the expander sees them
    let mut batches: Vec<Restaurant> = (0..60).map(create_candidate).collect();
    batches.extend((40..100).map(create_candidate));
    batches.extend((80..120).map(create_candidate));

    c.bench_function("dedupe_and_shuffle_160", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let mut unique = dedupe_by_id(black_box(batches.clone()));
            shuffle_candidates(&mut unique, &mut rng);
            black_box(unique)
        });
    });
}

criterion_group!(benches, bench_distance, bench_filtering, bench_dedupe_and_shuffle);

criterion_main!(benches);

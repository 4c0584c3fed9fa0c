//! Criterion benchmarks for riskforest-rf: forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use riskforest_rf::{
    DecisionTreeConfig, FeatureVector, NUMERIC_FEATURES, RandomForestConfig, RiskLevel, Sample,
    Target,
};

fn make_records(n_samples: usize, seed: u64) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n_samples)
        .map(|i| {
            let risk_level = RiskLevel::ALL[i % RiskLevel::COUNT];
            let base = risk_level.index() as f64 * 3.0;
            let features: FeatureVector = NUMERIC_FEATURES
                .iter()
                .enumerate()
                .map(|(f, &name)| {
                    let signal = if f < 3 { base } else { 0.0 };
                    (name, signal + rng.r#gen::<f64>() * 0.5)
                })
                .collect();
            Sample::new(
                features,
                Target {
                    risk_level,
                    failure_probability: rng.r#gen::<f64>(),
                    estimated_days_to_failure: rng.gen_range(1..365),
                },
            )
        })
        .collect()
}

fn bench_rf_train(c: &mut Criterion) {
    let records = make_records(2000, 42);
    let cfg = RandomForestConfig::new(30).unwrap().with_seed(42);

    c.bench_function("rf_train_2000_30trees", |b| {
        b.iter(|| cfg.fit(&records).unwrap());
    });
}

fn bench_rf_predict_batch(c: &mut Criterion) {
    let records = make_records(2000, 42);
    let forest = RandomForestConfig::new(30)
        .unwrap()
        .with_seed(42)
        .fit(&records)
        .unwrap();
    let rows: Vec<FeatureVector> = records.into_iter().map(|s| s.features).collect();

    c.bench_function("rf_predict_batch_2000_30trees", |b| {
        b.iter(|| forest.predict_batch(&rows));
    });
}

fn bench_single_tree(c: &mut Criterion) {
    let records = make_records(2000, 42);
    let cfg = DecisionTreeConfig::new().with_seed(42);

    c.bench_function("rf_single_tree_2000", |b| {
        b.iter(|| cfg.fit(&records).unwrap());
    });
}

criterion_group!(benches, bench_rf_train, bench_rf_predict_batch, bench_single_tree);
criterion_main!(benches);

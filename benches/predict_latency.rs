use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use daycast::batch::{DEFAULT_MAX_BATCH, predict_batch};
use daycast::input::SalesInput;
use daycast::model::{LinearModel, ModelFamily, RegressionTree, TreeEnsemble, TreeNode};
use daycast::{FeatureSchema, ServiceState, TrainedModel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

const FEATURES: [&str; 12] = [
    "transaction_qty",
    "unit_price",
    "month",
    "day",
    "day_of_week",
    "is_weekend",
    "revenue_lag1",
    "revenue_lag7",
    "revenue_rolling3",
    "revenue_rolling7",
    "store_location_Hells_Kitchen",
    "store_location_Lower_Manhattan",
];

fn schema() -> FeatureSchema {
    FeatureSchema::new(
        FEATURES.iter().map(|name| name.to_string()).collect(),
        "Linear Regression",
        BTreeMap::new(),
    )
    .expect("valid schema")
}

fn linear_state(rng: &mut StdRng) -> ServiceState {
    let model = TrainedModel {
        n_features: FEATURES.len(),
        family: ModelFamily::Linear(LinearModel {
            intercept: rng.gen_range(-50.0..50.0),
            coefficients: (0..FEATURES.len()).map(|_| rng.gen_range(-2.0..2.0)).collect(),
        }),
    };
    ServiceState::new(Box::new(model), schema(), Some(25.0))
}

/// Complete binary tree of the given depth over random features.
fn random_tree(rng: &mut StdRng, depth: u32) -> RegressionTree {
    let internal = (1usize << depth) - 1;
    let total = (1usize << (depth + 1)) - 1;
    let nodes = (0..total)
        .map(|i| {
            if i < internal {
                TreeNode::Split {
                    feature: rng.gen_range(0..FEATURES.len()),
                    threshold: rng.gen_range(0.0..300.0),
                    left: 2 * i + 1,
                    right: 2 * i + 2,
                }
            } else {
                TreeNode::Leaf {
                    value: rng.gen_range(-10.0..10.0),
                }
            }
        })
        .collect();
    RegressionTree { nodes }
}

fn ensemble_state(rng: &mut StdRng, n_trees: usize) -> ServiceState {
    let model = TrainedModel {
        n_features: FEATURES.len(),
        family: ModelFamily::TreeEnsemble(TreeEnsemble {
            base_score: 400.0,
            trees: (0..n_trees).map(|_| random_tree(rng, 6)).collect(),
        }),
    };
    ServiceState::new(Box::new(model), schema(), Some(25.0))
}

fn random_input(rng: &mut StdRng) -> SalesInput {
    let location = rng.gen_range(0..3);
    let day_of_week = rng.gen_range(0..7);
    SalesInput {
        transaction_qty: rng.gen_range(0..400),
        unit_price: rng.gen_range(1.0..8.0),
        month: rng.gen_range(1..=12),
        day: rng.gen_range(1..=28),
        day_of_week,
        is_weekend: i64::from(day_of_week >= 5),
        revenue_lag1: rng.gen_range(100.0..900.0),
        revenue_lag7: rng.gen_range(100.0..900.0),
        revenue_rolling3: rng.gen_range(100.0..900.0),
        revenue_rolling7: rng.gen_range(100.0..900.0),
        store_location_hells_kitchen: i64::from(location == 1),
        store_location_lower_manhattan: i64::from(location == 2),
    }
}

fn benchmark_single_prediction(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xDA7_CA57);
    let record = random_input(&mut rng).to_record();
    let states = [
        ("linear", linear_state(&mut rng)),
        ("trees_100", ensemble_state(&mut rng, 100)),
    ];

    let mut group = c.benchmark_group("predict_with_interval");
    for (name, state) in states.iter() {
        group.bench_with_input(BenchmarkId::new("single", name), state, |b, state| {
            b.iter(|| {
                let result = state.predict_with_interval(black_box(&record));
                black_box(result.ok());
            });
        });
    }
    group.finish();
}

fn benchmark_batch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xBA7_C4);
    let state = ensemble_state(&mut rng, 100);
    let sizes = [1_usize, 10, DEFAULT_MAX_BATCH];

    let mut group = c.benchmark_group("predict_batch");
    for size in sizes {
        let inputs: Vec<SalesInput> = (0..size).map(|_| random_input(&mut rng)).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("trees_100", size), &inputs, |b, inputs| {
            b.iter(|| {
                let report = predict_batch(&state, black_box(inputs), DEFAULT_MAX_BATCH);
                black_box(report.ok());
            });
        });
    }
    group.finish();
}

criterion_group!(predict_latency, benchmark_single_prediction, benchmark_batch);
criterion_main!(predict_latency);

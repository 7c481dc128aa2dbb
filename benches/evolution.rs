//! Benchmarks for potion scoring and evolution steps.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use potion_optimizer::{
    compute::evolution::{EvolutionEngine, PotionRng},
    schema::{
        Catalog, EvolutionConfig, Ingredient, IngredientStack, MutationConfig, PopulationConfig,
        Potion, PotionConstraints,
    },
};

fn catalog(size: usize) -> Catalog {
    let ingredients = (0..size)
        .map(|i| {
            Ingredient::healing(
                format!("Reagent {i}"),
                0.2 + (i % 17) as f64 * 0.15,
                (i % 5) as f64 * 0.1,
                1.0 + (i % 3) as f64 * 0.05,
                i % 4 != 0,
            )
        })
        .collect();
    // Names are unique by construction.
    Catalog::new(ingredients).unwrap()
}

fn bench_potion_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("potion_score");
    let catalog = catalog(64);

    for stacks in [1, 4, 16, 64] {
        let potion = Potion::new(
            catalog
                .iter()
                .take(stacks)
                .enumerate()
                .map(|(i, ingredient)| IngredientStack::new(Arc::clone(ingredient), 10.0 + i as f64))
                .collect(),
        );

        group.bench_with_input(BenchmarkId::from_parameter(stacks), &stacks, |b, _| {
            b.iter(|| black_box(&potion).score());
        });
    }

    group.finish();
}

fn bench_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");
    let catalog = catalog(128);
    let constraints = PotionConstraints::new(10000.0, 8000.0, 16);
    let mutation = MutationConfig::default();
    let mut rng = PotionRng::new(42);

    let parent1 = rng.random_potion(&catalog, &constraints);
    let parent2 = rng.random_potion(&catalog, &constraints);

    group.bench_function("random_potion", |b| {
        b.iter(|| rng.random_potion(black_box(&catalog), &constraints));
    });
    group.bench_function("crossover_mutate", |b| {
        b.iter(|| {
            let mut child = rng.crossover(&parent1, &parent2, &catalog, &constraints);
            rng.mutate(&mut child, &catalog, &constraints, &mutation);
            child
        });
    });

    group.finish();
}

fn bench_generation_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation_step");
    group.sample_size(20);

    for size in [100, 1000] {
        let config = EvolutionConfig {
            constraints: PotionConstraints::new(10000.0, 8000.0, 16),
            population: PopulationConfig {
                size,
                generations: usize::MAX,
                elite: size / 10,
                ..Default::default()
            },
            mutation: MutationConfig::default(),
            random_seed: Some(7),
        };

        let mut engine = EvolutionEngine::new(config, catalog(128)).unwrap();
        engine.initialize().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| engine.step_generation().map(|best| best.score).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_potion_score, bench_operators, bench_generation_step);
criterion_main!(benches);

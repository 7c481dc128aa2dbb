//! Genetic search for high Direct Healing potions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::schema::{
    Catalog, ConfigError, EvolutionConfig, EvolutionHistory, EvolutionPhase, EvolutionProgress,
    EvolutionResult, EvolutionStats, Potion, PotionError, ScoredPotion, StopReason,
};

use super::fitness::{ScoreSummary, evaluate_population, rank_by_score};
use super::genome::PotionRng;

/// A candidate individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier within one engine run.
    pub id: u64,
    /// The potion.
    pub potion: Potion,
    /// Direct Healing score; stale until the population is evaluated.
    pub score: f64,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs, `None` for the initial population.
    pub parents: Option<(u64, u64)>,
}

/// Errors that abort an evolution run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid evolution configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Scoring failed: {0}")]
    Potion(#[from] PotionError),
    #[error("No ingredient fits within max weight {max_weight}; cannot build a candidate")]
    InfeasibleCandidate { max_weight: f64 },
}

/// Evolution engine that runs the search.
///
/// The engine moves through `Initializing`, then alternates `Evaluating` with
/// `Selecting`/`Reproducing` until a stop condition holds. The best potion
/// ever evaluated is kept separately from the population, so it survives
/// even if later generations lose it.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    catalog: Catalog,
    rng: PotionRng,
    population: Vec<Candidate>,
    history: EvolutionHistory,
    generation: usize,
    best: Option<ScoredPotion>,
    last_summary: Option<ScoreSummary>,
    stagnation_count: usize,
    phase: EvolutionPhase,
    next_id: u64,
    cancelled: Arc<AtomicBool>,
}

impl EvolutionEngine {
    /// Create a new evolution engine, validating the configuration.
    pub fn new(config: EvolutionConfig, catalog: Catalog) -> Result<Self, EvolutionError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);

        Ok(Self {
            config,
            catalog,
            rng: PotionRng::new(seed),
            population: Vec::new(),
            history: EvolutionHistory::default(),
            generation: 0,
            best: None,
            last_summary: None,
            stagnation_count: 0,
            phase: EvolutionPhase::Initializing,
            next_id: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an existing cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Best potion observed so far.
    pub fn best(&self) -> Option<&ScoredPotion> {
        self.best.as_ref()
    }

    /// Number of generations evaluated so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Current population, ranked after each evaluation.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Build a fresh random population and evaluate it as the first generation.
    ///
    /// Returns the best potion of that generation.
    pub fn initialize(&mut self) -> Result<&ScoredPotion, EvolutionError> {
        self.phase = EvolutionPhase::Initializing;
        self.population.clear();
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.best = None;
        self.last_summary = None;
        self.stagnation_count = 0;

        let constraints = &self.config.constraints;
        for _ in 0..self.config.population.size {
            let potion = self.rng.random_potion(&self.catalog, constraints);
            if potion.is_empty() {
                return Err(EvolutionError::InfeasibleCandidate {
                    max_weight: constraints.max_weight,
                });
            }

            self.population.push(Candidate {
                id: self.next_id,
                potion,
                score: 0.0,
                generation: 0,
                parents: None,
            });
            self.next_id += 1;
        }

        self.evaluate()
    }

    /// Score and rank the population, then update and return the running best.
    fn evaluate(&mut self) -> Result<&ScoredPotion, EvolutionError> {
        self.phase = EvolutionPhase::Evaluating;

        evaluate_population(&mut self.population)?;
        rank_by_score(&mut self.population, |c| c.score);
        self.generation += 1;

        let scores: Vec<f64> = self.population.iter().map(|c| c.score).collect();
        let summary = ScoreSummary::from_scores(&scores);

        let top = &self.population[0];
        let best = match self.best.take() {
            Some(best) if best.score >= top.score => {
                self.stagnation_count += 1;
                best
            }
            _ => {
                log::debug!(
                    "generation {}: new best {:.6} ({} stacks)",
                    self.generation,
                    top.score,
                    top.potion.len()
                );
                self.stagnation_count = 0;
                ScoredPotion {
                    potion: top.potion.clone(),
                    score: top.score,
                    generation: self.generation,
                }
            }
        };

        if let Some(summary) = summary {
            self.history.best_score.push(summary.best);
            self.history.avg_score.push(summary.mean);
            self.history.score_std.push(summary.std_dev);
        }
        self.last_summary = summary;

        Ok(self.best.insert(best))
    }

    /// Keep the elite and refill the population with their offspring.
    fn reproduce(&mut self) {
        self.phase = EvolutionPhase::Selecting;
        let elite = self.config.population.elite.min(self.population.len());
        let offspring = self.config.population.size - elite;

        self.phase = EvolutionPhase::Reproducing;

        // Parent picks and child seeds come from the master RNG up front so
        // the parallel section cannot change the outcome.
        let plans: Vec<(usize, usize, u64)> = (0..offspring)
            .map(|_| {
                let first = self.rng.index(elite);
                let second = self.rng.index(elite);
                (first, second, self.rng.next_seed())
            })
            .collect();

        let parents = &self.population[..elite];
        let catalog = &self.catalog;
        let constraints = &self.config.constraints;
        let mutation = &self.config.mutation;

        let children: Vec<Potion> = plans
            .par_iter()
            .map(|&(first, second, seed)| {
                let mut rng = PotionRng::new(seed);
                let mut child =
                    rng.crossover(&parents[first].potion, &parents[second].potion, catalog, constraints);
                rng.mutate(&mut child, catalog, constraints, mutation);
                child
            })
            .collect();

        let parent_ids: Vec<(u64, u64)> = plans
            .iter()
            .map(|&(first, second, _)| (parents[first].id, parents[second].id))
            .collect();

        self.population.truncate(elite);
        for (potion, ids) in children.into_iter().zip(parent_ids) {
            self.population.push(Candidate {
                id: self.next_id,
                potion,
                score: 0.0,
                generation: self.generation,
                parents: Some(ids),
            });
            self.next_id += 1;
        }
    }

    /// Run a single generation step: select, reproduce, evaluate.
    ///
    /// Requires [`Self::initialize`] to have run. Returns the running best.
    pub fn step_generation(&mut self) -> Result<&ScoredPotion, EvolutionError> {
        self.reproduce();
        self.evaluate()
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        let (generation_best, avg_score) = self
            .last_summary
            .map_or((f64::NEG_INFINITY, 0.0), |s| (s.best, s.mean));

        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.generations,
            best_score: self.best.as_ref().map_or(f64::NEG_INFINITY, |b| b.score),
            generation_best,
            avg_score,
            stagnation_count: self.stagnation_count,
            phase: self.phase,
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.generation >= self.config.population.generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(target) = self.config.population.target_score
            && self.best.as_ref().is_some_and(|b| b.score >= target)
        {
            return Some(StopReason::TargetReached);
        }

        if let Some(limit) = self.config.population.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Run evolution with progress callback.
    ///
    /// The first generation is always evaluated, so a result exists even
    /// when the run is cancelled before it starts.
    pub fn run_with_callback<F>(&mut self, callback: F) -> Result<EvolutionResult, EvolutionError>
    where
        F: Fn(&EvolutionProgress),
    {
        let start_time = Instant::now();
        let size = self.config.population.size;

        log::info!(
            "starting evolution: {} potions x {} generations, elite {}, catalog {}",
            size,
            self.config.population.generations,
            self.config.population.elite,
            self.catalog.len()
        );

        let mut best = self.initialize()?.clone();
        callback(&self.progress());

        let report_every = (self.config.population.generations / 10).max(1);
        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            best = self.step_generation()?.clone();
            callback(&self.progress());

            if self.generation % report_every == 0 {
                log::debug!(
                    "generation {}/{}: best {:.6}, avg {:.6}",
                    self.generation,
                    self.config.population.generations,
                    self.progress().best_score,
                    self.progress().avg_score
                );
            }
        };

        self.phase = if stop_reason == StopReason::MaxGenerations {
            EvolutionPhase::Complete
        } else {
            EvolutionPhase::Stopped
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        let total_evaluations = self.generation as u64 * size as u64;

        log::info!(
            "evolution finished after {} generations ({:?}): best {:.6}",
            self.generation,
            stop_reason,
            best.score
        );

        Ok(EvolutionResult {
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations,
                best_score: best.score,
                final_avg_score: self.last_summary.map_or(0.0, |s| s.mean),
                elapsed_seconds: elapsed,
                evaluations_per_second: total_evaluations as f64 / elapsed.max(f64::EPSILON),
                stop_reason,
            },
            best,
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult, EvolutionError> {
        self.run_with_callback(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Ingredient, MutationConfig, PopulationConfig, PotionConstraints};

    fn small_config(constraints: PotionConstraints, generations: usize) -> EvolutionConfig {
        EvolutionConfig {
            constraints,
            population: PopulationConfig {
                size: 60,
                generations,
                elite: 10,
                ..Default::default()
            },
            mutation: MutationConfig::default(),
            random_seed: Some(42),
        }
    }

    fn mixed_catalog() -> Catalog {
        Catalog::new(
            (0..12)
                .map(|i| {
                    Ingredient::healing(
                        format!("Herb {i}"),
                        0.5 + i as f64 * 0.3,
                        if i % 3 == 0 { 0.4 } else { 0.0 },
                        1.0 + i as f64 * 0.01,
                        i % 5 != 0,
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_evolution_engine_creation() {
        let config = small_config(PotionConstraints::new(100.0, 40.0, 4), 5);
        let mut engine = EvolutionEngine::new(config, mixed_catalog()).unwrap();
        engine.initialize().unwrap();

        assert_eq!(engine.population().len(), 60);
        assert_eq!(engine.generation(), 1);
        assert!(engine.best().is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config(PotionConstraints::default(), 5);
        config.population.elite = 0;
        assert!(matches!(
            EvolutionEngine::new(config, mixed_catalog()),
            Err(EvolutionError::Config(ConfigError::EliteOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_infeasible_catalog_fails_fast() {
        let catalog = Catalog::new(vec![Ingredient::healing("Anvil", 1.0, 0.0, 1.0, true)]).unwrap();
        let config = small_config(PotionConstraints::new(100.0, 0.0, 4), 5);
        let mut engine = EvolutionEngine::new(config, catalog).unwrap();
        assert!(matches!(
            engine.run(),
            Err(EvolutionError::InfeasibleCandidate { .. })
        ));
    }

    #[test]
    fn test_evolution_run() {
        let config = small_config(PotionConstraints::new(100.0, 40.0, 4), 20);
        let mut engine = EvolutionEngine::new(config, mixed_catalog()).unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.generations, 20);
        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.history.best_score.len(), 20);
        assert!(result.best.potion.weight() <= 40.0);
        assert!(result.best.potion.len() <= 4);
        assert!((result.best.potion.score().unwrap() - result.best.score).abs() < 1e-12);
    }

    #[test]
    fn test_population_stays_feasible() {
        let constraints = PotionConstraints::new(100.0, 40.0, 4);
        let config = small_config(constraints.clone(), 10);
        let mut engine = EvolutionEngine::new(config, mixed_catalog()).unwrap();
        engine.initialize().unwrap();

        for _ in 0..10 {
            engine.step_generation().unwrap();
            for candidate in engine.population() {
                assert!(candidate.potion.weight() <= constraints.max_weight);
                assert!(candidate.potion.len() <= constraints.max_stacks);
            }
        }
    }

    #[test]
    fn test_elite_survives_unchanged() {
        let config = small_config(PotionConstraints::new(100.0, 40.0, 4), 10);
        let mut engine = EvolutionEngine::new(config, mixed_catalog()).unwrap();
        engine.initialize().unwrap();

        let elite_ids: Vec<u64> = engine.population()[..10].iter().map(|c| c.id).collect();
        engine.reproduce();
        let kept: Vec<u64> = engine.population()[..10].iter().map(|c| c.id).collect();
        assert_eq!(elite_ids, kept);
        assert_eq!(engine.population().len(), 60);
        for child in &engine.population()[10..] {
            let (a, b) = child.parents.unwrap();
            assert!(elite_ids.contains(&a) && elite_ids.contains(&b));
        }
    }

    #[test]
    fn test_best_is_monotonic() {
        let config = small_config(PotionConstraints::new(100.0, 40.0, 4), 200);
        let mut engine = EvolutionEngine::new(config, mixed_catalog()).unwrap();

        let mut previous = engine.initialize().unwrap().score;
        for _ in 0..100 {
            let current = engine.step_generation().unwrap().score;
            assert!(current >= previous);
            assert_eq!(Some(current), engine.best().map(|b| b.score));
            previous = current;
        }
    }

    #[test]
    fn test_heavy_amounts_under_small_weight_budget() {
        let catalog = Catalog::new(
            (0..20)
                .map(|i| Ingredient::healing(format!("Ore {i}"), 1.0 + i as f64 * 0.1, 0.0, 1.0, true))
                .collect(),
        )
        .unwrap();
        let config = small_config(PotionConstraints::new(10000.0, 10.0, 16), 10);

        let result = EvolutionEngine::new(config, catalog).unwrap().run().unwrap();
        assert!(result.best.score > 0.0);
        assert!(result.best.potion.weight() <= 10.0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = small_config(PotionConstraints::new(100.0, 40.0, 4), 15);
        let a = EvolutionEngine::new(config.clone(), mixed_catalog())
            .unwrap()
            .run()
            .unwrap();
        let b = EvolutionEngine::new(config, mixed_catalog())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(a.best.potion, b.best.potion);
        assert_eq!(a.best.score, b.best.score);
    }

    #[test]
    fn test_cancellation() {
        let config = small_config(PotionConstraints::new(100.0, 40.0, 4), 100);
        let mut engine = EvolutionEngine::new(config, mixed_catalog()).unwrap();
        let cancel = engine.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let result = engine.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.generations, 1);
    }

    #[test]
    fn test_target_score_stops_early() {
        let catalog = Catalog::new(vec![Ingredient::healing("A", 1.2, 0.0, 1.0, true)]).unwrap();
        let mut config = small_config(PotionConstraints::new(100.0, 8000.0, 1), 500);
        config.population.target_score = Some(1.0);

        let result = EvolutionEngine::new(config, catalog).unwrap().run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::TargetReached);
        assert_eq!(result.stats.generations, 1);
    }

    #[test]
    fn test_stagnation_limit() {
        let catalog = Catalog::new(vec![Ingredient::healing("A", 1.2, 0.0, 1.0, true)]).unwrap();
        let mut config = small_config(PotionConstraints::new(100.0, 8000.0, 1), 500);
        config.population.stagnation_limit = Some(5);

        let result = EvolutionEngine::new(config, catalog).unwrap().run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Stagnation);
        assert!(result.stats.generations < 500);
    }

    #[test]
    fn test_single_ingredient_scenario() {
        let catalog = Catalog::new(vec![Ingredient::healing("A", 1.2, 0.0, 1.0, true)]).unwrap();
        let config = small_config(PotionConstraints::new(100.0, 8000.0, 1), 50);

        let result = EvolutionEngine::new(config, catalog).unwrap().run().unwrap();
        assert_eq!(result.best.potion.len(), 1);
        assert!(result.best.potion.stacks[0].amount > 0.0);
        assert!((result.best.score - 1.44).abs() < 1e-9);
    }

    #[test]
    fn test_two_ingredient_convergence() {
        let catalog = Catalog::new(vec![
            Ingredient::healing("Weak", 1.0, 0.0, 1.0, true),
            Ingredient::healing("Strong", 2.0, 0.0, 1.0, true),
        ])
        .unwrap();
        let config = EvolutionConfig {
            constraints: PotionConstraints::new(10000.0, 1.0e6, 2),
            population: PopulationConfig {
                size: 200,
                generations: 300,
                elite: 20,
                ..Default::default()
            },
            mutation: MutationConfig::default(),
            random_seed: Some(7),
        };

        let result = EvolutionEngine::new(config, catalog).unwrap().run().unwrap();
        assert!(result.best.score <= 2.4 + 1e-9);
        assert!(result.best.score > 2.35, "best {}", result.best.score);
    }

    #[test]
    fn test_progress_callback() {
        use std::sync::atomic::AtomicUsize;

        let config = small_config(PotionConstraints::new(100.0, 40.0, 4), 8);
        let mut engine = EvolutionEngine::new(config, mixed_catalog()).unwrap();
        let calls = AtomicUsize::new(0);

        let result = engine
            .run_with_callback(|progress| {
                calls.fetch_add(1, Ordering::Relaxed);
                assert!(progress.generation <= progress.total_generations);
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 8);
        assert_eq!(engine.progress().phase, EvolutionPhase::Complete);
        assert_eq!(result.stats.total_evaluations, 8 * 60);
    }
}

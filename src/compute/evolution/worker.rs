//! Repeated search runs for one labeled configuration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::schema::{BestKnown, SearchProfile};
use crate::store::{PotionStore, StoreError};

use super::search::{EvolutionEngine, EvolutionError};

/// Errors that stop a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Evolution error: {0}")]
    Evolution(#[from] EvolutionError),
}

/// Outcome of a worker's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    /// Engine runs completed.
    pub runs: u64,
    /// Runs that beat the stored best and were persisted.
    pub improvements: u64,
}

/// Runs the engine over and over for one profile, persisting improvements.
///
/// Every run starts from a freshly fetched catalog and best-known record, so
/// records edited by another process between runs are respected.
pub struct SearchWorker<S> {
    store: S,
    profile: SearchProfile,
    cancelled: Arc<AtomicBool>,
}

impl<S: PotionStore> SearchWorker<S> {
    /// Create a worker sharing the given cancellation flag.
    pub fn new(store: S, profile: SearchProfile, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            store,
            profile,
            cancelled,
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Profile label.
    pub fn label(&self) -> &str {
        &self.profile.label
    }

    /// Run until cancelled, `max_runs` is reached, or an error occurs.
    pub fn run(&self) -> Result<WorkerSummary, WorkerError> {
        let mut summary = WorkerSummary::default();

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("[{}] cancelled after {} runs", self.label(), summary.runs);
                break;
            }
            if self.profile.max_runs.is_some_and(|max| summary.runs >= max) {
                break;
            }

            if self.run_once(summary.runs)? {
                summary.improvements += 1;
            }
            summary.runs += 1;
        }

        Ok(summary)
    }

    /// One engine run; returns whether the stored best was replaced.
    fn run_once(&self, iteration: u64) -> Result<bool, WorkerError> {
        let label = self.label();
        let catalog = self.store.fetch_ingredients()?;
        let current = self.store.fetch_best_known(label)?;

        let constraints = &self.profile.evolution.constraints;
        if iteration == 0 && catalog.len() < constraints.max_stacks {
            log::warn!(
                "[{label}] catalog has {} ingredients, fewer than max_stacks {}",
                catalog.len(),
                constraints.max_stacks
            );
        }

        let mut config = self.profile.evolution.clone();
        config.random_seed = config.random_seed.map(|seed| seed.wrapping_add(iteration));

        let mut engine =
            EvolutionEngine::new(config, catalog)?.with_cancel_flag(Arc::clone(&self.cancelled));
        let result = engine.run()?;

        log::info!(
            "[{label}] run {}: best {:.6} after {} generations ({:?}, {:.0} evals/s)",
            iteration + 1,
            result.best.score,
            result.stats.generations,
            result.stats.stop_reason,
            result.stats.evaluations_per_second
        );

        if result.best.score <= current.score {
            return Ok(false);
        }

        self.store.upsert_best_known(&BestKnown {
            label: label.to_string(),
            potion: result.best.potion,
            score: result.best.score,
        })?;
        log::info!(
            "[{label}] new best-known potion: {:.6} -> {:.6}",
            current.score,
            result.best.score
        );

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Ingredient, PotionConstraints};
    use crate::store::MemoryStore;

    fn herbs() -> Vec<Ingredient> {
        vec![
            Ingredient::healing("Troll Sweat", 1.2, 0.0, 1.0, true),
            Ingredient::healing("Healing Moss", 2.0, 0.3, 1.0, true),
            Ingredient::healing("Ash", 0.8, 0.0, 1.1, false),
        ]
    }

    fn profile(max_runs: Option<u64>) -> SearchProfile {
        let mut profile = SearchProfile::new("DH40", PotionConstraints::new(100.0, 40.0, 3));
        profile.evolution.population.size = 20;
        profile.evolution.population.elite = 4;
        profile.evolution.population.generations = 10;
        profile.evolution.random_seed = Some(3);
        profile.max_runs = max_runs;
        profile
    }

    #[test]
    fn test_first_run_replaces_placeholder() {
        let store = MemoryStore::new(herbs()).with_best(BestKnown::empty("DH40"));
        let worker = SearchWorker::new(store, profile(Some(3)), Arc::new(AtomicBool::new(false)));

        let summary = worker.run().unwrap();
        assert_eq!(summary.runs, 3);
        assert!(summary.improvements >= 1);

        let best = worker.store().fetch_best_known("DH40").unwrap();
        assert!(best.score > 0.0);
        assert!(best.potion.weight() <= 40.0);
        assert!((best.potion.score().unwrap() - best.score).abs() < 1e-12);
    }

    #[test]
    fn test_never_downgrades() {
        let mut record = BestKnown::empty("DH40");
        record.score = 1.0e9;
        let store = MemoryStore::new(herbs()).with_best(record.clone());
        let worker = SearchWorker::new(store, profile(Some(2)), Arc::new(AtomicBool::new(false)));

        let summary = worker.run().unwrap();
        assert_eq!(summary, WorkerSummary { runs: 2, improvements: 0 });
        assert_eq!(worker.store().fetch_best_known("DH40").unwrap(), record);
    }

    #[test]
    fn test_missing_record_is_an_error() {
        let store = MemoryStore::new(herbs());
        let worker = SearchWorker::new(store, profile(Some(1)), Arc::new(AtomicBool::new(false)));
        assert!(matches!(
            worker.run(),
            Err(WorkerError::Store(StoreError::MissingBest(_)))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let store = MemoryStore::new(herbs()).with_best(BestKnown::empty("DH40"));
        let worker = SearchWorker::new(store, profile(None), Arc::new(AtomicBool::new(true)));

        assert_eq!(worker.run().unwrap(), WorkerSummary::default());
        assert_eq!(worker.store().fetch_best_known("DH40").unwrap().score, 0.0);
    }

    #[test]
    fn test_invalid_profile_is_an_error() {
        let store = MemoryStore::new(herbs()).with_best(BestKnown::empty("DH40"));
        let mut profile = profile(Some(1));
        profile.evolution.population.generations = 0;
        let worker = SearchWorker::new(store, profile, Arc::new(AtomicBool::new(false)));
        assert!(matches!(
            worker.run(),
            Err(WorkerError::Evolution(EvolutionError::Config(_)))
        ));
    }
}

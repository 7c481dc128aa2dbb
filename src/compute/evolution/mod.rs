//! Evolutionary search for high Direct Healing potions.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Genome Operations** (`genome`): Random generation, crossover, and mutation
//! - **Fitness** (`fitness`): Parallel scoring, ranking and score statistics
//! - **Search** (`search`): The generational engine with elitist selection
//! - **Worker** (`worker`): Repeated runs against a store, keeping the best result
//!
//! # Example
//!
//! ```rust,no_run
//! use potion_optimizer::schema::{Catalog, EvolutionConfig, Ingredient};
//! use potion_optimizer::compute::evolution::EvolutionEngine;
//!
//! let catalog = Catalog::new(vec![
//!     Ingredient::healing("Troll Sweat", 1.2, 0.0, 1.0, true),
//!     Ingredient::healing("Healing Moss", 2.0, 0.5, 1.0, true),
//! ])?;
//!
//! let mut engine = EvolutionEngine::new(EvolutionConfig::default(), catalog)?;
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best = {:.4}", progress.generation, progress.best_score);
//! })?;
//!
//! println!("Best potion scores {:.4}", result.best.score);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Algorithm
//!
//! Each generation scores every potion in parallel, sorts the population by
//! score (ties keep their order), keeps the `elite` best unchanged, and fills
//! the rest with children of two random elite parents: two-point crossover
//! followed by per-stack mutation. Every candidate respects the weight and
//! stack budgets at all times.

mod fitness;
mod genome;
mod search;
mod worker;

pub use fitness::{ScoreSummary, evaluate_population, rank_by_score};
pub use genome::PotionRng;
pub use search::{Candidate, EvolutionEngine, EvolutionError};
pub use worker::{SearchWorker, WorkerError, WorkerSummary};

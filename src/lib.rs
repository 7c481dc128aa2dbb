//! Potion Optimizer - Evolutionary search for high Direct Healing potions.
//!
//! This crate searches the space of potions, mixtures of ingredient stacks
//! under weight and stack-count budgets, for the one with the highest Direct
//! Healing score, using a parallel elitist genetic algorithm.
//!
//! # Architecture
//!
//! The crate is split into three main modules:
//!
//! - `schema`: Ingredients, potions, scoring and configuration types
//! - `compute`: The evolutionary search engine and the search worker
//! - `store`: Persistence for catalogs and best-known results
//!
//! # Example
//!
//! ```rust,no_run
//! use potion_optimizer::{
//!     schema::{BestKnown, SearchProfile, PotionConstraints},
//!     compute::SearchWorker,
//!     store::{JsonStore, PotionStore},
//! };
//! use std::sync::{Arc, atomic::AtomicBool};
//!
//! let store = JsonStore::open("data")?;
//! if store.fetch_best_known("DH40").is_err() {
//!     store.insert_best_known(&BestKnown::empty("DH40"))?;
//! }
//!
//! let mut profile = SearchProfile::new("DH40", PotionConstraints::new(100.0, 40.0, 16));
//! profile.max_runs = Some(1);
//!
//! let worker = SearchWorker::new(store, profile, Arc::new(AtomicBool::new(false)));
//! let summary = worker.run()?;
//! println!("{} runs, {} improvements", summary.runs, summary.improvements);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use compute::{EvolutionEngine, SearchWorker};
pub use schema::{Catalog, EvolutionConfig, Ingredient, Potion};
pub use store::{JsonStore, PotionStore};

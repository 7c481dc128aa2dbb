//! Compute module - Potion search algorithms.

pub mod evolution;

pub use evolution::{EvolutionEngine, EvolutionError, SearchWorker, WorkerSummary};

//! Evolution configuration, progress and result types.
//!
//! This module provides the types for configuring the genetic search for
//! high Direct Healing potions and for reporting on its progress.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Potion, PotionConstraints};

/// Top-level configuration for one evolutionary run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Amount, weight and stack constraints.
    #[serde(default)]
    pub constraints: PotionConstraints,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Mutation settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of potions in the population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to run.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Number of top potions kept unchanged and used as parents.
    #[serde(default = "default_elite")]
    pub elite: usize,
    /// Stop early once the best score reaches this value.
    #[serde(default)]
    pub target_score: Option<f64>,
    /// Stop if no improvement for N generations.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            generations: default_generations(),
            elite: default_elite(),
            target_score: None,
            stagnation_limit: None,
        }
    }
}

fn default_population_size() -> usize {
    1000
}
fn default_generations() -> usize {
    5000
}
fn default_elite() -> usize {
    100
}

/// Per-stack mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability of redrawing a stack's amount.
    #[serde(default = "default_amount_rate")]
    pub amount_rate: f64,
    /// Probability of swapping a stack's ingredient.
    #[serde(default = "default_ingredient_rate")]
    pub ingredient_rate: f64,
    /// Only swap in ingredients not already present in the potion.
    #[serde(default)]
    pub distinct_swaps: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            amount_rate: default_amount_rate(),
            ingredient_rate: default_ingredient_rate(),
            distinct_swaps: false,
        }
    }
}

fn default_amount_rate() -> f64 {
    0.1
}
fn default_ingredient_rate() -> f64 {
    0.05
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.constraints.validate()?;

        let population = &self.population;
        if population.size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if population.elite == 0 || population.elite > population.size {
            return Err(ConfigError::EliteOutOfRange {
                elite: population.elite,
                size: population.size,
            });
        }
        if population.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }

        let check_rate = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidRate { name, value })
            }
        };

        check_rate(self.mutation.amount_rate, "amount_rate")?;
        check_rate(self.mutation.ingredient_rate, "ingredient_rate")?;

        Ok(())
    }
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Progress update emitted after each generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation number.
    pub generation: usize,
    /// Total generations planned.
    pub total_generations: usize,
    /// Best score seen so far.
    pub best_score: f64,
    /// Best score this generation.
    pub generation_best: f64,
    /// Average score of the evaluated population.
    pub avg_score: f64,
    /// Generations since last improvement.
    pub stagnation_count: usize,
    /// Current phase of the algorithm.
    pub phase: EvolutionPhase,
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best score per generation.
    pub best_score: Vec<f64>,
    /// Average score per generation.
    pub avg_score: Vec<f64>,
    /// Standard deviation per generation.
    pub score_std: Vec<f64>,
}

/// Current phase of evolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// Building the initial population.
    #[default]
    Initializing,
    /// Scoring and ranking candidates.
    Evaluating,
    /// Retaining the elite.
    Selecting,
    /// Breeding offspring.
    Reproducing,
    /// Evolution complete.
    Complete,
    /// Evolution stopped early.
    Stopped,
}

/// A potion together with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPotion {
    /// The potion.
    pub potion: Potion,
    /// Its Direct Healing score.
    pub score: f64,
    /// Generation in which it was first observed as the best.
    pub generation: usize,
}

/// Final result of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best potion observed across all generations.
    pub best: ScoredPotion,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Total generations evaluated.
    pub generations: usize,
    /// Total potion evaluations performed.
    pub total_evaluations: u64,
    /// Best score achieved.
    pub best_score: f64,
    /// Average score of the last evaluated population.
    pub final_avg_score: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the configured generation count.
    MaxGenerations,
    /// Reached the target score.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
    /// Cancelled through the cancel handle.
    Cancelled,
}

// ============================================================================
// Stored results
// ============================================================================

/// Best potion recorded for a configuration label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestKnown {
    /// Configuration label, e.g. `DH8000`.
    #[serde(rename = "Type")]
    pub label: String,
    /// The best potion found so far.
    #[serde(rename = "Potion")]
    pub potion: Potion,
    /// Its Direct Healing score.
    #[serde(rename = "DH")]
    pub score: f64,
}

impl BestKnown {
    /// Placeholder record with an empty potion and a zero score.
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            potion: Potion::default(),
            score: 0.0,
        }
    }
}

//! Configuration types for potion constraints.

use serde::{Deserialize, Serialize};

/// Hard constraints every candidate potion must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotionConstraints {
    /// Exclusive upper bound on a single stack's amount.
    #[serde(default = "default_max_amount")]
    pub max_amount: f64,
    /// Maximum total weight of weight-flagged stacks.
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
    /// Maximum number of stacks (distinct ingredients) in a potion.
    #[serde(default = "default_max_stacks")]
    pub max_stacks: usize,
    /// Draw whole-unit amounts instead of continuous ones.
    #[serde(default)]
    pub whole_amounts: bool,
}

impl Default for PotionConstraints {
    fn default() -> Self {
        Self {
            max_amount: default_max_amount(),
            max_weight: default_max_weight(),
            max_stacks: default_max_stacks(),
            whole_amounts: false,
        }
    }
}

fn default_max_amount() -> f64 {
    10000.0
}
fn default_max_weight() -> f64 {
    8000.0
}
fn default_max_stacks() -> usize {
    16
}

impl PotionConstraints {
    /// Create constraints with continuous amounts.
    pub fn new(max_amount: f64, max_weight: f64, max_stacks: usize) -> Self {
        Self {
            max_amount,
            max_weight,
            max_stacks,
            whole_amounts: false,
        }
    }

    /// Check whether a weight fits the budget.
    #[inline]
    pub fn allows_weight(&self, weight: f64) -> bool {
        weight <= self.max_weight
    }

    /// Validate constraint values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_amount.is_finite() || self.max_amount <= 0.0 {
            return Err(ConfigError::InvalidMaxAmount(self.max_amount));
        }
        if self.whole_amounts && self.max_amount <= 1.0 {
            // Only zero would be drawable.
            return Err(ConfigError::InvalidMaxAmount(self.max_amount));
        }
        if self.max_weight.is_nan() || self.max_weight < 0.0 {
            return Err(ConfigError::InvalidMaxWeight(self.max_weight));
        }
        if self.max_stacks == 0 {
            return Err(ConfigError::ZeroStacks);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Maximum ingredient amount must be finite and positive, got {0}")]
    InvalidMaxAmount(f64),
    #[error("Maximum potion weight must be non-negative, got {0}")]
    InvalidMaxWeight(f64),
    #[error("Maximum stack count must be non-zero")]
    ZeroStacks,
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Elite size {elite} must be between 1 and population size {size}")]
    EliteOutOfRange { elite: usize, size: usize },
    #[error("Generation count must be non-zero")]
    ZeroGenerations,
    #[error("Rate {name} must lie in [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Configuration label must not be empty")]
    EmptyLabel,
}

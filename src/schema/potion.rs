//! Potion model: ingredient stacks, weight and Direct Healing score.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Ingredient;

/// Advanced Potion Making multiplier (at skill 100).
pub const APM_MULTIPLIER: f64 = 1.2;

/// One ingredient and its quantity within a potion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientStack {
    /// The ingredient.
    #[serde(rename = "Ingredient")]
    pub ingredient: Arc<Ingredient>,
    /// Quantity, non-negative and below the configured maximum amount.
    #[serde(rename = "Amount")]
    pub amount: f64,
}

impl IngredientStack {
    /// Create a stack.
    pub fn new(ingredient: Arc<Ingredient>, amount: f64) -> Self {
        Self { ingredient, amount }
    }

    /// Name of the stacked ingredient.
    #[inline]
    pub fn name(&self) -> &str {
        &self.ingredient.name
    }
}

/// A candidate solution: an ordered list of ingredient stacks.
///
/// Potions are plain values. Cloning produces independent stack storage;
/// only the immutable ingredients behind the `Arc`s are shared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Potion {
    /// Stacks in insertion order.
    #[serde(rename = "IngredientStacks")]
    pub stacks: Vec<IngredientStack>,
}

impl Potion {
    /// Create a potion from stacks.
    pub fn new(stacks: Vec<IngredientStack>) -> Self {
        Self { stacks }
    }

    /// Number of stacks.
    #[inline]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Whether the potion holds no stacks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Sum of amounts over weight-flagged ingredients.
    pub fn weight(&self) -> f64 {
        self.stacks
            .iter()
            .filter(|s| s.ingredient.weighted)
            .map(|s| s.amount)
            .sum()
    }

    /// Sum of amounts over all stacks, weighted or not.
    pub fn total_amount(&self) -> f64 {
        self.stacks.iter().map(|s| s.amount).sum()
    }

    /// Direct Healing score.
    ///
    /// With `total = Σ amount`, each stack contributes its share `amount / total`
    /// additively as `LM * PDH * share` and multiplicatively as
    /// `1 + DHM * sqrt(share)`. The score is
    /// `APM_MULTIPLIER * additive * multiplicative`.
    pub fn score(&self) -> Result<f64, PotionError> {
        let total = self.total_amount();
        if total <= 0.0 {
            return Err(PotionError::ZeroTotalAmount);
        }

        let mut additive = 0.0;
        let mut multiplicative = 1.0;
        for stack in &self.stacks {
            let share = stack.amount / total;
            let ingredient = &stack.ingredient;
            additive += ingredient.lore_multiplier * ingredient.direct_heal * share;
            multiplicative *= 1.0 + ingredient.direct_heal_multiplier * share.sqrt();
        }

        Ok(APM_MULTIPLIER * additive * multiplicative)
    }

    /// Whether every ingredient name appears at most once.
    pub fn has_distinct_ingredients(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.stacks.len());
        self.stacks.iter().all(|s| seen.insert(s.name()))
    }

    /// Ingredient names in stack order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stacks.iter().map(IngredientStack::name)
    }
}

/// Errors raised while scoring a potion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PotionError {
    #[error("Cannot score a potion whose total amount is zero")]
    ZeroTotalAmount,
}

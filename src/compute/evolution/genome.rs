//! Potion manipulation utilities for evolutionary search.
//!
//! Provides random generation, crossover, and mutation operations. Every
//! stochastic operation draws from an explicitly passed [`PotionRng`], so a
//! seeded run is reproducible.

use std::collections::HashSet;
use std::sync::Arc;

use rand::prelude::*;

use crate::schema::{Catalog, Ingredient, IngredientStack, MutationConfig, Potion, PotionConstraints};

/// Random number generator wrapper for potion operations.
pub struct PotionRng {
    rng: StdRng,
}

impl PotionRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a random potion within constraints.
    ///
    /// Ingredients are drawn uniformly from those not yet used. A weighted
    /// ingredient draws its amount below both `max_amount` and the remaining
    /// weight budget, so every draw fits. An ingredient that cannot take a
    /// positive amount is skipped. The first stack always gets a positive
    /// amount, so a non-empty potion can be scored.
    ///
    /// The result is empty only if no ingredient fits within `max_weight` at
    /// all.
    pub fn random_potion(&mut self, catalog: &Catalog, constraints: &PotionConstraints) -> Potion {
        let ingredients = catalog.as_slice();
        let whole = constraints.whole_amounts;
        let mut stacks = Vec::with_capacity(constraints.max_stacks.min(ingredients.len()));
        let mut unused: Vec<usize> = (0..ingredients.len()).collect();
        let mut weight = 0.0;

        while stacks.len() < constraints.max_stacks && !unused.is_empty() {
            let slot = self.rng.gen_range(0..unused.len());
            let ingredient = &ingredients[unused.swap_remove(slot)];

            let limit = if ingredient.weighted {
                constraints.max_amount.min(constraints.max_weight - weight)
            } else {
                constraints.max_amount
            };
            // The budget only shrinks, so a skipped ingredient never fits later.
            if !admits_positive(limit, whole) {
                continue;
            }

            let mut amount = self.draw_below(limit, whole);
            while stacks.is_empty() && amount <= 0.0 {
                amount = self.draw_below(limit, whole);
            }

            if ingredient.weighted {
                if constraints.allows_weight(weight + amount) {
                    weight += amount;
                } else {
                    // Rounding pushed the sum past the budget.
                    amount = 0.0;
                }
            }

            stacks.push(IngredientStack::new(Arc::clone(ingredient), amount));
        }

        Potion::new(stacks)
    }

    /// Draw an amount in `[0, max_amount)`.
    fn draw_amount(&mut self, constraints: &PotionConstraints) -> f64 {
        self.draw_below(constraints.max_amount, constraints.whole_amounts)
    }

    /// Draw an amount in `[0, limit)`, whole units if `whole`.
    fn draw_below(&mut self, limit: f64, whole: bool) -> f64 {
        if whole {
            let bound = limit.ceil() as u64;
            self.rng.gen_range(0..bound) as f64
        } else {
            self.rng.gen_range(0.0..limit)
        }
    }

    /// Two-point crossover between two potions.
    ///
    /// Positions `[lo, hi)` come from `parent2`, everything else from
    /// `parent1`. A position whose ingredient is already in the child is
    /// backfilled with a random unused catalog ingredient carrying `parent1`'s
    /// amount, or dropped when the catalog has nothing left. Children over the
    /// weight budget fall back to a copy of `parent1`.
    pub fn crossover(
        &mut self,
        parent1: &Potion,
        parent2: &Potion,
        catalog: &Catalog,
        constraints: &PotionConstraints,
    ) -> Potion {
        let shared = parent1.len().min(parent2.len());
        if shared <= 1 {
            return parent1.clone();
        }

        let mut lo = self.rng.gen_range(0..shared);
        let mut hi = self.rng.gen_range(0..shared);
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }

        let mut child = parent1.clone();
        let mut placed: HashSet<&str> = HashSet::with_capacity(parent1.len());
        let mut gaps = Vec::new();

        for i in 0..shared {
            let source = if (lo..hi).contains(&i) {
                &parent2.stacks[i]
            } else {
                &parent1.stacks[i]
            };
            if placed.insert(source.name()) {
                child.stacks[i] = source.clone();
            } else {
                gaps.push(i);
            }
        }

        for i in shared..parent1.len() {
            if !placed.insert(parent1.stacks[i].name()) {
                gaps.push(i);
            }
        }

        let mut dropped = Vec::new();
        for i in gaps {
            match self.unused_ingredient(catalog, &placed) {
                Some(ingredient) => {
                    placed.insert(ingredient.name.as_str());
                    child.stacks[i] =
                        IngredientStack::new(Arc::clone(ingredient), parent1.stacks[i].amount);
                }
                None => dropped.push(i),
            }
        }
        // Gaps were collected in ascending order.
        for i in dropped.into_iter().rev() {
            child.stacks.remove(i);
        }

        if !constraints.allows_weight(child.weight()) || child.total_amount() <= 0.0 {
            return parent1.clone();
        }

        child
    }

    /// Uniformly pick a catalog ingredient whose name is not in `taken`.
    fn unused_ingredient<'a>(
        &mut self,
        catalog: &'a Catalog,
        taken: &HashSet<&str>,
    ) -> Option<&'a Arc<Ingredient>> {
        let free: Vec<&Arc<Ingredient>> = catalog
            .iter()
            .filter(|i| !taken.contains(i.name.as_str()))
            .collect();
        free.choose(&mut self.rng).copied()
    }

    /// Mutate a potion in place, one stack at a time.
    ///
    /// Each stack is a transaction: its amount may be redrawn and its
    /// ingredient swapped, then the whole stack is rolled back if the potion
    /// is now over the weight budget or has no amount left at all.
    pub fn mutate(
        &mut self,
        potion: &mut Potion,
        catalog: &Catalog,
        constraints: &PotionConstraints,
        mutation: &MutationConfig,
    ) {
        for i in 0..potion.len() {
            let snapshot = potion.stacks[i].clone();

            if self.rng.gen_bool(mutation.amount_rate) {
                potion.stacks[i].amount = self.draw_amount(constraints);
            }

            if self.rng.gen_bool(mutation.ingredient_rate) {
                let replacement = if mutation.distinct_swaps {
                    let taken: HashSet<&str> = potion.names().collect();
                    self.unused_ingredient(catalog, &taken).cloned()
                } else {
                    catalog.as_slice().choose(&mut self.rng).cloned()
                };
                if let Some(ingredient) = replacement {
                    potion.stacks[i].ingredient = ingredient;
                }
            }

            if !constraints.allows_weight(potion.weight()) || potion.total_amount() <= 0.0 {
                potion.stacks[i] = snapshot;
            }
        }
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Uniform index into a slice of length `len`.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Whether some positive amount lies in `[0, limit)`.
fn admits_positive(limit: f64, whole: bool) -> bool {
    if whole { limit > 1.0 } else { limit > 0.0 }
}

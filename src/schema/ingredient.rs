//! Ingredient definitions and the validated catalog they are drawn from.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single alchemy ingredient.
///
/// Field names on the wire follow the reagent documents (`PDH`, `DHM`, ...).
/// Only the direct-healing channel is used by the optimizer; the remaining
/// effect coefficients are carried so records round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Identity key, unique within a catalog.
    #[serde(rename = "Name")]
    pub name: String,
    /// Potion direct healing base value.
    #[serde(rename = "PDH")]
    pub direct_heal: f64,
    /// Direct healing multiplier, applied through the square root of the share.
    #[serde(rename = "DHM")]
    pub direct_heal_multiplier: f64,
    /// Potion direct poison.
    #[serde(rename = "PDP", default)]
    pub direct_poison: f64,
    /// Direct poison multiplier.
    #[serde(rename = "DPM", default)]
    pub direct_poison_multiplier: f64,
    /// Potion healing over time.
    #[serde(rename = "PHoT", default)]
    pub heal_over_time: f64,
    /// Healing over time multiplier.
    #[serde(rename = "HoTM", default)]
    pub heal_over_time_multiplier: f64,
    /// Potion healing length.
    #[serde(rename = "PHL", default)]
    pub heal_length: f64,
    /// Healing length multiplier.
    #[serde(rename = "HLM", default)]
    pub heal_length_multiplier: f64,
    /// Potion poison over time.
    #[serde(rename = "PPoT", default)]
    pub poison_over_time: f64,
    /// Poison over time multiplier.
    #[serde(rename = "PoTM", default)]
    pub poison_over_time_multiplier: f64,
    /// Potion poison length.
    #[serde(rename = "PPL", default)]
    pub poison_length: f64,
    /// Poison length multiplier.
    #[serde(rename = "PLM", default)]
    pub poison_length_multiplier: f64,
    /// Potion alcohol.
    #[serde(rename = "PAlc", default)]
    pub alcohol: f64,
    /// Alcohol multiplier.
    #[serde(rename = "AlcM", default)]
    pub alcohol_multiplier: f64,
    /// Lore multiplier, `1 + F * L / 100` for lore factor `F` and lore level `L`.
    #[serde(rename = "LM")]
    pub lore_multiplier: f64,
    /// Whether this ingredient's quantity counts toward potion weight.
    #[serde(rename = "Weight")]
    pub weighted: bool,
}

impl Ingredient {
    /// Create a direct-healing ingredient with every other channel zeroed.
    pub fn healing(
        name: impl Into<String>,
        base: f64,
        multiplier: f64,
        lore_multiplier: f64,
        weighted: bool,
    ) -> Self {
        Self {
            name: name.into(),
            direct_heal: base,
            direct_heal_multiplier: multiplier,
            direct_poison: 0.0,
            direct_poison_multiplier: 0.0,
            heal_over_time: 0.0,
            heal_over_time_multiplier: 0.0,
            heal_length: 0.0,
            heal_length_multiplier: 0.0,
            poison_over_time: 0.0,
            poison_over_time_multiplier: 0.0,
            poison_length: 0.0,
            poison_length_multiplier: 0.0,
            alcohol: 0.0,
            alcohol_multiplier: 0.0,
            lore_multiplier,
            weighted,
        }
    }
}

/// Immutable set of ingredients available to one optimization run.
#[derive(Debug, Clone)]
pub struct Catalog {
    ingredients: Vec<Arc<Ingredient>>,
}

impl Catalog {
    /// Build a catalog, rejecting empty lists and duplicate names.
    pub fn new(ingredients: Vec<Ingredient>) -> Result<Self, CatalogError> {
        if ingredients.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(ingredients.len());
        for ingredient in &ingredients {
            if !seen.insert(ingredient.name.as_str()) {
                return Err(CatalogError::DuplicateName(ingredient.name.clone()));
            }
        }

        Ok(Self {
            ingredients: ingredients.into_iter().map(Arc::new).collect(),
        })
    }

    /// Number of ingredients.
    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    /// Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// All ingredients as a slice.
    pub fn as_slice(&self) -> &[Arc<Ingredient>] {
        &self.ingredients
    }

    /// Look an ingredient up by name.
    pub fn by_name(&self, name: &str) -> Option<&Arc<Ingredient>> {
        self.ingredients.iter().find(|i| i.name == name)
    }

    /// Iterate over all ingredients in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Ingredient>> {
        self.ingredients.iter()
    }
}

/// Catalog construction errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Ingredient catalog is empty")]
    Empty,
    #[error("Ingredient name {0:?} appears more than once")]
    DuplicateName(String),
}

//! Application configuration: where results live and which searches to run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{ConfigError, EvolutionConfig, PotionConstraints};

/// Top-level configuration for the search binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding `reagents.json` and the `potions/` records.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Searches to run concurrently, one thread each.
    #[serde(default = "default_searches")]
    pub searches: Vec<SearchProfile>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            searches: default_searches(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_searches() -> Vec<SearchProfile> {
    vec![
        SearchProfile::new("DH8000", PotionConstraints::new(10000.0, 8000.0, 16)),
        SearchProfile::new("DH40", PotionConstraints::new(100.0, 40.0, 16)),
    ]
}

/// A labeled search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProfile {
    /// Label under which the best-known result is stored.
    pub label: String,
    /// Engine configuration for each run.
    #[serde(default)]
    pub evolution: EvolutionConfig,
    /// Stop after this many runs (unbounded if unset).
    #[serde(default)]
    pub max_runs: Option<u64>,
}

impl SearchProfile {
    /// Profile with default population and mutation settings.
    pub fn new(label: impl Into<String>, constraints: PotionConstraints) -> Self {
        Self {
            label: label.into(),
            evolution: EvolutionConfig {
                constraints,
                ..Default::default()
            },
            max_runs: None,
        }
    }

    /// Validate label and engine configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        self.evolution.validate()
    }
}

impl AppConfig {
    /// Validate every search profile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.searches.iter().try_for_each(SearchProfile::validate)
    }
}

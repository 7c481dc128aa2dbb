//! Persistence for ingredient catalogs and best-known potions.
//!
//! The search core never touches storage directly. Workers go through the
//! [`PotionStore`] trait, which has a directory-backed JSON implementation
//! and an in-memory one.

mod json;
mod memory;

use std::io;
use std::path::PathBuf;

use crate::schema::{BestKnown, Catalog, CatalogError};

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Storage backend for catalogs and per-label best results.
pub trait PotionStore {
    /// Load the full ingredient catalog.
    fn fetch_ingredients(&self) -> Result<Catalog, StoreError>;

    /// Load the best-known record for `label`.
    ///
    /// Fails with [`StoreError::MissingBest`] if no record exists.
    fn fetch_best_known(&self, label: &str) -> Result<BestKnown, StoreError>;

    /// Replace the record for `record.label`, creating it if needed.
    fn upsert_best_known(&self, record: &BestKnown) -> Result<(), StoreError>;

    /// Create the record for `record.label`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if a record exists.
    fn insert_best_known(&self, record: &BestKnown) -> Result<(), StoreError>;
}

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No best-known record for {0:?}")]
    MissingBest(String),
    #[error("A best-known record for {0:?} already exists")]
    AlreadyExists(String),
    #[error("Label {0:?} cannot be used as a record name")]
    InvalidLabel(String),
    #[error("Invalid ingredient catalog: {0}")]
    Catalog(#[from] CatalogError),
}

//! In-memory store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::schema::{BestKnown, Catalog, Ingredient};

use super::{PotionStore, StoreError};

/// Store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ingredients: Mutex<Vec<Ingredient>>,
    records: Mutex<HashMap<String, BestKnown>>,
}

impl MemoryStore {
    /// Create a store holding `ingredients` and no records.
    pub fn new(ingredients: Vec<Ingredient>) -> Self {
        Self {
            ingredients: Mutex::new(ingredients),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Add a best-known record.
    pub fn with_best(self, record: BestKnown) -> Self {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.label.clone(), record);
        self
    }
}

impl PotionStore for MemoryStore {
    fn fetch_ingredients(&self) -> Result<Catalog, StoreError> {
        let ingredients = self
            .ingredients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(Catalog::new(ingredients)?)
    }

    fn fetch_best_known(&self, label: &str) -> Result<BestKnown, StoreError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
            .cloned()
            .ok_or_else(|| StoreError::MissingBest(label.to_string()))
    }

    fn upsert_best_known(&self, record: &BestKnown) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.label.clone(), record.clone());
        Ok(())
    }

    fn insert_best_known(&self, record: &BestKnown) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&record.label) {
            return Err(StoreError::AlreadyExists(record.label.clone()));
        }
        records.insert(record.label.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new(vec![Ingredient::healing("A", 1.2, 0.0, 1.0, true)]);
        assert_eq!(store.fetch_ingredients().unwrap().len(), 1);
        assert!(matches!(
            store.fetch_best_known("DH40"),
            Err(StoreError::MissingBest(_))
        ));

        store.insert_best_known(&BestKnown::empty("DH40")).unwrap();
        assert!(matches!(
            store.insert_best_known(&BestKnown::empty("DH40")),
            Err(StoreError::AlreadyExists(_))
        ));

        let mut record = BestKnown::empty("DH40");
        record.score = 2.0;
        store.upsert_best_known(&record).unwrap();
        assert_eq!(store.fetch_best_known("DH40").unwrap().score, 2.0);
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let store = MemoryStore::default();
        assert!(matches!(
            store.fetch_ingredients(),
            Err(StoreError::Catalog(_))
        ));
    }
}

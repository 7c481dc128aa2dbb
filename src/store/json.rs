//! Directory-backed JSON store.
//!
//! Layout under the root directory:
//!
//! ```text
//! reagents.json          array of ingredient records
//! potions/<label>.json   one best-known record per label
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::schema::{BestKnown, Catalog, Ingredient};

use super::{PotionStore, StoreError};

const REAGENTS_FILE: &str = "reagents.json";
const POTIONS_DIR: &str = "potions";

/// Store backed by JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `dir`, creating the directory layout if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let root = dir.as_ref().to_path_buf();
        let potions = root.join(POTIONS_DIR);
        fs::create_dir_all(&potions).map_err(|source| StoreError::Io {
            path: potions,
            source,
        })?;
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace the ingredient catalog on disk.
    pub fn write_ingredients(&self, ingredients: &[Ingredient]) -> Result<(), StoreError> {
        let path = self.root.join(REAGENTS_FILE);
        let json = to_json(&path, &ingredients)?;
        write_atomic(&path, &json)
    }

    fn record_path(&self, label: &str) -> Result<PathBuf, StoreError> {
        let valid = !label.is_empty()
            && label != "."
            && label != ".."
            && !label.contains(['/', '\\', '\0']);
        if !valid {
            return Err(StoreError::InvalidLabel(label.to_string()));
        }
        Ok(self.root.join(POTIONS_DIR).join(format!("{label}.json")))
    }
}

impl PotionStore for JsonStore {
    fn fetch_ingredients(&self) -> Result<Catalog, StoreError> {
        let path = self.root.join(REAGENTS_FILE);
        let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let records: Vec<Ingredient> =
            serde_json::from_str(&json).map_err(|source| StoreError::Json { path, source })?;
        Ok(Catalog::new(records)?)
    }

    fn fetch_best_known(&self, label: &str) -> Result<BestKnown, StoreError> {
        let path = self.record_path(label)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::MissingBest(label.to_string()));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&json).map_err(|source| StoreError::Json { path, source })
    }

    fn upsert_best_known(&self, record: &BestKnown) -> Result<(), StoreError> {
        let path = self.record_path(&record.label)?;
        let json = to_json(&path, record)?;
        write_atomic(&path, &json)
    }

    fn insert_best_known(&self, record: &BestKnown) -> Result<(), StoreError> {
        let path = self.record_path(&record.label)?;
        let json = to_json(&path, record)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(record.label.clone()));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|source| StoreError::Io { path, source })
    }
}

fn to_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write through a sibling temp file so readers never see a partial record.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

//! JSON-file profile store
//!
//! Persists one font bucket as a single JSON document. Every mutation
//! writes the whole document back, which keeps each operation idempotent
//! at the cost of rewriting a few kilobytes per call — trained state for
//! one font is small.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use inkscan_core::{CharacterVariant, TrainedProfile};

use crate::error::StoreResult;
use crate::ProfileStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    profiles: Vec<TrainedProfile>,
    scalars: BTreeMap<String, f64>,
    custom_spaces: BTreeMap<char, f64>,
    trained: bool,
}

/// A file-backed store holding one font bucket
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    document: StoreDocument,
}

impl JsonStore {
    /// Opens (or initializes) the bucket document at `path`
    ///
    /// A missing file starts as an empty, untrained bucket; the file is
    /// created on the first mutation.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let document = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, document })
    }

    fn write_through(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    fn position_of(&self, key: CharacterVariant) -> Option<usize> {
        self.document.profiles.iter().position(|p| p.key == key)
    }
}

impl ProfileStore for JsonStore {
    fn load_profiles(&self) -> StoreResult<Vec<TrainedProfile>> {
        Ok(self.document.profiles.clone())
    }

    fn save_profile(&mut self, profile: &TrainedProfile) -> StoreResult<()> {
        match self.position_of(profile.key) {
            Some(i) => self.document.profiles[i] = profile.clone(),
            None => self.document.profiles.push(profile.clone()),
        }
        self.write_through()
    }

    fn load_scalar(&self, name: &str) -> StoreResult<Option<f64>> {
        Ok(self.document.scalars.get(name).copied())
    }

    fn save_scalar(&mut self, name: &str, value: f64) -> StoreResult<()> {
        self.document.scalars.insert(name.to_string(), value);
        self.write_through()
    }

    fn load_custom_space(&self, letter: char) -> StoreResult<Option<f64>> {
        Ok(self.document.custom_spaces.get(&letter).copied())
    }

    fn save_custom_space(&mut self, letter: char, ratio: f64) -> StoreResult<()> {
        self.document.custom_spaces.insert(letter, ratio);
        self.write_through()
    }

    fn custom_spaces(&self) -> StoreResult<Vec<(char, f64)>> {
        Ok(self
            .document
            .custom_spaces
            .iter()
            .map(|(&c, &r)| (c, r))
            .collect())
    }

    fn is_trained(&self) -> StoreResult<bool> {
        Ok(self.document.trained)
    }

    fn set_trained(&mut self, trained: bool) -> StoreResult<()> {
        self.document.trained = trained;
        self.write_through()
    }
}

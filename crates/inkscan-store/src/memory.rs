//! In-memory profile store

use std::collections::BTreeMap;

use inkscan_core::{CharacterVariant, TrainedProfile};

use crate::error::StoreResult;
use crate::ProfileStore;

/// An in-process store, used by tests and as training scratch space
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    profiles: BTreeMap<CharacterVariant, TrainedProfile>,
    scalars: BTreeMap<String, f64>,
    custom_spaces: BTreeMap<char, f64>,
    trained: bool,
}

impl MemoryStore {
    /// Creates an empty, untrained store
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryStore {
    fn load_profiles(&self) -> StoreResult<Vec<TrainedProfile>> {
        Ok(self.profiles.values().cloned().collect())
    }

    fn save_profile(&mut self, profile: &TrainedProfile) -> StoreResult<()> {
        self.profiles.insert(profile.key, profile.clone());
        Ok(())
    }

    fn load_scalar(&self, name: &str) -> StoreResult<Option<f64>> {
        Ok(self.scalars.get(name).copied())
    }

    fn save_scalar(&mut self, name: &str, value: f64) -> StoreResult<()> {
        self.scalars.insert(name.to_string(), value);
        Ok(())
    }

    fn load_custom_space(&self, letter: char) -> StoreResult<Option<f64>> {
        Ok(self.custom_spaces.get(&letter).copied())
    }

    fn save_custom_space(&mut self, letter: char, ratio: f64) -> StoreResult<()> {
        self.custom_spaces.insert(letter, ratio);
        Ok(())
    }

    fn custom_spaces(&self) -> StoreResult<Vec<(char, f64)>> {
        Ok(self.custom_spaces.iter().map(|(&c, &r)| (c, r)).collect())
    }

    fn is_trained(&self) -> StoreResult<bool> {
        Ok(self.trained)
    }

    fn set_trained(&mut self, trained: bool) -> StoreResult<()> {
        self.trained = trained;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkscan_core::{FeatureVector, MetaClass, ProfileBuilder};

    fn sample_profile(letter: char) -> TrainedProfile {
        let mut builder = ProfileBuilder::new(CharacterVariant::base(letter));
        builder.accumulate(FeatureVector::default(), 4.0, 8.0, 0.0);
        builder.finalize().unwrap()
    }

    #[test]
    fn test_profile_roundtrip_replaces_by_key() {
        let mut store = MemoryStore::new();
        store.save_profile(&sample_profile('a')).unwrap();
        store.save_profile(&sample_profile('a')).unwrap();
        store.save_profile(&sample_profile('b')).unwrap();
        assert_eq!(store.load_profiles().unwrap().len(), 2);
    }

    #[test]
    fn test_scalars_and_custom_spaces() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load_scalar("dot_above").unwrap(), None);
        store.save_scalar("dot_above", 0.3).unwrap();
        assert_eq!(store.load_scalar("dot_above").unwrap(), Some(0.3));

        store.save_custom_space('!', 0.2).unwrap();
        assert_eq!(store.load_custom_space('!').unwrap(), Some(0.2));
        assert_eq!(store.custom_spaces().unwrap(), vec![('!', 0.2)]);
    }

    #[test]
    fn test_trained_flag() {
        let mut store = MemoryStore::new();
        assert!(!store.is_trained().unwrap());
        store.set_trained(true).unwrap();
        assert!(store.is_trained().unwrap());
    }

    #[test]
    fn test_meta_preserved() {
        let mut store = MemoryStore::new();
        let mut builder = ProfileBuilder::with_meta(
            CharacterVariant::base('i'),
            MetaClass::DotAbove,
            true,
        );
        builder.accumulate(FeatureVector::default(), 3.0, 9.0, 0.0);
        store.save_profile(&builder.finalize().unwrap()).unwrap();

        let loaded = store.load_profiles().unwrap();
        assert_eq!(loaded[0].meta, MetaClass::DotAbove);
        assert!(loaded[0].has_dot);
    }
}

//! Keyed scaling-factor tables with a total lookup.
//!
//! A `MultiplierTable` answers 1.0 for any key it does not hold and
//! for `Other`; an `AddOnTable` answers 0.0. The neutral value is
//! encoded here once, not at each call site.

use crate::keys::TokenKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NEUTRAL_MULTIPLIER: f64 = 1.0;
pub const NEUTRAL_ADD_ON: f64 = 0.0;

/// Ordered map so serialized tables are byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiplierTable<K: Ord> {
    entries: BTreeMap<K, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddOnTable<K: Ord> {
    entries: BTreeMap<K, f64>,
}

fn lookup<K: TokenKey>(entries: &BTreeMap<K, f64>, key: K, neutral: f64) -> f64 {
    if key.is_other() {
        return neutral;
    }
    entries.get(&key).copied().unwrap_or(neutral)
}

impl<K: TokenKey> MultiplierTable<K> {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    pub fn with(mut self, key: K, factor: f64) -> Self {
        self.entries.insert(key, factor);
        self
    }

    /// The factor for `key`; 1.0 when absent.
    pub fn factor(&self, key: K) -> f64 {
        lookup(&self.entries, key, NEUTRAL_MULTIPLIER)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &f64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: TokenKey> Default for MultiplierTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TokenKey> FromIterator<(K, f64)> for MultiplierTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl<K: TokenKey> AddOnTable<K> {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    pub fn with(mut self, key: K, rate: f64) -> Self {
        self.entries.insert(key, rate);
        self
    }

    /// The add-on fraction for `key`; 0.0 when absent.
    pub fn rate(&self, key: K) -> f64 {
        lookup(&self.entries, key, NEUTRAL_ADD_ON)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &f64)> {
        self.entries.iter()
    }
}

impl<K: TokenKey> Default for AddOnTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TokenKey> FromIterator<(K, f64)> for AddOnTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{FloorType, TaskComplexity};

    #[test]
    fn missing_key_is_neutral() {
        let table = MultiplierTable::new().with(FloorType::Carpet, 1.2);
        assert_eq!(table.factor(FloorType::Carpet), 1.2);
        assert_eq!(table.factor(FloorType::Marble), 1.0);
        assert_eq!(table.factor(FloorType::Other), 1.0);

        let add_ons = AddOnTable::new().with(TaskComplexity::Sanitization, 0.15);
        assert_eq!(add_ons.rate(TaskComplexity::Sanitization), 0.15);
        assert_eq!(add_ons.rate(TaskComplexity::Standard), 0.0);
    }

    #[test]
    fn unknown_keys_in_json_never_apply() {
        let table: MultiplierTable<FloorType> =
            serde_json::from_str(r#"{"vct": 1.0, "lava": 9.0}"#).unwrap();
        assert_eq!(table.factor(FloorType::parse("lava")), 1.0);
    }

    #[test]
    fn serialization_is_key_ordered() {
        let a = MultiplierTable::new()
            .with(FloorType::Tile, 1.1)
            .with(FloorType::Carpet, 1.2);
        let b = MultiplierTable::new()
            .with(FloorType::Carpet, 1.2)
            .with(FloorType::Tile, 1.1);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

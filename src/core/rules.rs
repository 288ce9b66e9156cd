//! Rule table — weighted expansion templates keyed by category.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A weighted candidate expansion within a category.
///
/// Weights need not sum to anything; selection is proportional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub weight: f32,
    pub text: String,
}

/// An immutable mapping from category name to an ordered list of weighted
/// expansion templates.
///
/// Loaded once at engine construction and read-only thereafter; generation
/// never mutates it, so one table can back any number of generators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    pub categories: FxHashMap<String, Vec<Alternative>>,
}

impl RuleTable {
    /// Load a rule table from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<RuleTable, RuleError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a rule table from a RON string.
    ///
    /// The format is a map from category name to a list of alternatives:
    /// `{ "sentence": [ (weight: 3.0, text: "<subject> <action>") ] }`.
    pub fn parse_ron(input: &str) -> Result<RuleTable, RuleError> {
        let table: RuleTable = ron::from_str(input)?;
        Ok(table)
    }

    /// Merge another table into this one. Categories from `other` override
    /// categories in `self` with the same name.
    pub fn merge(&mut self, other: RuleTable) {
        for (name, alternatives) in other.categories {
            self.categories.insert(name, alternatives);
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn get(&self, category: &str) -> Option<&[Alternative]> {
        self.categories.get(category).map(|v| v.as_slice())
    }

    /// Weighted-sample one expansion template from a category.
    ///
    /// Returns `None` for unknown or empty categories, or when the weights
    /// are unusable (all zero, negative) — callers degrade rather than fail.
    pub fn sample(&self, category: &str, rng: &mut StdRng) -> Option<String> {
        let alternatives = self.categories.get(category)?;
        if alternatives.is_empty() {
            return None;
        }
        let weights: Vec<f32> = alternatives.iter().map(|a| a.weight).collect();
        let dist = WeightedIndex::new(&weights).ok()?;
        Some(alternatives[dist.sample(rng)].text.clone())
    }

    /// Uniformly sample `count` distinct expansion templates from a category,
    /// ignoring weights. `count` is clamped to the category size.
    pub fn sample_distinct(
        &self,
        category: &str,
        count: usize,
        rng: &mut StdRng,
    ) -> Option<Vec<String>> {
        let alternatives = self.categories.get(category)?;
        if alternatives.is_empty() {
            return None;
        }
        let count = count.min(alternatives.len());
        Some(
            alternatives
                .choose_multiple(rng, count)
                .map(|a| a.text.clone())
                .collect(),
        )
    }
}

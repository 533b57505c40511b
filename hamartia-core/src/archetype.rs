//! Archetype resolution.
//!
//! An archetype is looked up by a key made of trait names, sorted and
//! comma-joined: `"Hubris,Rigidity"` for a pair, `"Apathy,Cynicism,Fear"` for
//! a triplet, or a single name such as `"Hubris"`.
//!
//! The search order is fixed and reproducible:
//!
//! 1. Rank traits by descending magnitude; ties keep declaration order.
//! 2. Take the top three as candidates.
//! 3. Walk pairs `(i, j)` with `i` ascending, then `j` ascending. At `(0, 1)`
//!    the triplet of all three candidates is also tried; [`SearchOrder`]
//!    decides whether it goes before or after the leading pair.
//! 4. If nothing matched and the top trait's magnitude exceeds
//!    [`SINGLE_TRAIT_FLOOR`], try the top trait on its own.
//! 5. Otherwise return the default archetype.

use crate::narrative::ConfigError;
use crate::traits::{Trait, TraitSet, TraitVector, KEY_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of top-ranked traits considered for combination keys.
pub const CANDIDATE_COUNT: usize = 3;

/// Magnitude the top trait must exceed for the single-trait fallback.
pub const SINGLE_TRAIT_FLOOR: f64 = 0.1;

/// A named persona with its narrative lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    #[serde(default)]
    pub lines: Vec<String>,
}

/// Where the top-three triplet sits relative to the leading pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOrder {
    /// Triplet before the (1st, 2nd) pair. A triplet therefore beats every
    /// pair.
    #[default]
    TripletFirst,
    /// (1st, 2nd) pair before the triplet, then the remaining pairs.
    PairFirst,
}

/// What kind of key produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Triplet,
    Pair,
    Single,
    Default,
}

/// The result of resolving a trait vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub archetype: &'a Archetype,
    pub kind: MatchKind,
    /// The table key that matched; `None` for the default archetype.
    pub key: Option<String>,
}

/// Static archetype table plus the default entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeTable {
    entries: HashMap<String, Archetype>,
    default: Archetype,
    order: SearchOrder,
}

impl ArchetypeTable {
    /// Validate keys against the trait set and build the table.
    ///
    /// Keys must name one to three known traits, already sorted and without
    /// repeats. A key in any other form could never be produced by the
    /// resolver.
    pub fn new(
        entries: HashMap<String, Archetype>,
        default: Archetype,
        traits: &TraitSet,
    ) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyArchetypeTable);
        }

        for (key, archetype) in &entries {
            validate_key(key, traits)?;
            if archetype.name.trim().is_empty() {
                return Err(ConfigError::BlankArchetypeName(key.clone()));
            }
        }
        if default.name.trim().is_empty() {
            return Err(ConfigError::BlankArchetypeName("default".to_string()));
        }

        Ok(Self {
            entries,
            default,
            order: SearchOrder::default(),
        })
    }

    /// Re-check every key against `traits`.
    pub(crate) fn check_traits(&self, traits: &TraitSet) -> Result<(), ConfigError> {
        self.entries.keys().try_for_each(|key| validate_key(key, traits))
    }

    pub fn with_search_order(mut self, order: SearchOrder) -> Self {
        self.order = order;
        self
    }

    pub fn search_order(&self) -> SearchOrder {
        self.order
    }

    pub fn get(&self, key: &str) -> Option<&Archetype> {
        self.entries.get(key)
    }

    pub fn default_archetype(&self) -> &Archetype {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a trait vector to its archetype.
    pub fn resolve(&self, traits: &TraitVector) -> &Archetype {
        self.resolve_match(traits).archetype
    }

    /// Resolve a trait vector and report which key matched.
    pub fn resolve_match(&self, traits: &TraitVector) -> Resolution<'_> {
        let ranked = traits.ranked();
        let candidates: Vec<&Trait> = ranked
            .iter()
            .take(CANDIDATE_COUNT)
            .map(|(name, _)| *name)
            .collect();

        for (kind, key) in self.combination_keys(&candidates) {
            if let Some(archetype) = self.entries.get(&key) {
                tracing::debug!(target: "hamartia::archetype", key = %key, ?kind, "archetype.matched");
                return Resolution {
                    archetype,
                    kind,
                    key: Some(key),
                };
            }
        }

        if let Some((top, value)) = ranked.first() {
            if value.abs() > SINGLE_TRAIT_FLOOR {
                if let Some(archetype) = self.entries.get(top.name()) {
                    tracing::debug!(target: "hamartia::archetype", key = %top, "archetype.matched_single");
                    return Resolution {
                        archetype,
                        kind: MatchKind::Single,
                        key: Some(top.name().to_string()),
                    };
                }
            }
        }

        tracing::debug!(target: "hamartia::archetype", "archetype.default");
        Resolution {
            archetype: &self.default,
            kind: MatchKind::Default,
            key: None,
        }
    }

    /// Pair and triplet keys in search order.
    fn combination_keys(&self, candidates: &[&Trait]) -> Vec<(MatchKind, String)> {
        let mut keys = Vec::new();
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let pair = (MatchKind::Pair, combination_key(&[candidates[i], candidates[j]]));
                let triplet = (i == 0 && j == 1 && candidates.len() >= 3)
                    .then(|| (MatchKind::Triplet, combination_key(&candidates[..3])));

                match (self.order, triplet) {
                    (SearchOrder::TripletFirst, Some(triplet)) => {
                        keys.push(triplet);
                        keys.push(pair);
                    }
                    (SearchOrder::PairFirst, Some(triplet)) => {
                        keys.push(pair);
                        keys.push(triplet);
                    }
                    (_, None) => keys.push(pair),
                }
            }
        }
        keys
    }
}

/// Lookup key for a trait combination: names sorted and comma-joined.
pub fn combination_key(traits: &[&Trait]) -> String {
    let mut names: Vec<&str> = traits.iter().map(|t| t.name()).collect();
    names.sort_unstable();
    names.join(KEY_SEPARATOR)
}

fn validate_key(key: &str, traits: &TraitSet) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidArchetypeKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    if parts.len() > CANDIDATE_COUNT {
        return Err(invalid("more than three traits"));
    }
    for part in &parts {
        if !traits.contains(part) {
            return Err(ConfigError::UnknownTrait {
                location: format!("archetype key '{key}'"),
                name: (*part).to_string(),
            });
        }
    }
    if parts.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("traits must be sorted and distinct"));
    }
    Ok(())
}

//! Personality traits and the bounded trait vector.
//!
//! A [`TraitSet`] is the closed, ordered set of trait identifiers declared by
//! the narrative. Declaration order matters: it is the tie-break order used
//! when ranking traits. A [`TraitVector`] holds one value per known trait,
//! always within [`TRAIT_MIN`, `TRAIT_MAX`]. A [`Delta`] is the signed
//! adjustment an option applies to a subset of traits.

use crate::narrative::ConfigError;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Lower bound of every trait value.
pub const TRAIT_MIN: f64 = -1.0;

/// Upper bound of every trait value.
pub const TRAIT_MAX: f64 = 1.0;

/// Joins trait names in archetype keys.
pub const KEY_SEPARATOR: &str = ",";

/// A trait identifier such as `Hubris` or `Fear`.
///
/// Cheap to clone; compares and hashes by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Trait(Arc<str>);

impl Trait {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Trait {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for Trait {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Trait {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Trait::new(name))
    }
}

/// The closed set of traits a narrative tracks, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TraitSet {
    traits: Vec<Trait>,
}

impl TraitSet {
    /// Build a trait set, rejecting empty sets, blank names and duplicates.
    ///
    /// Names may not contain `,`, the separator of archetype keys.
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut traits: Vec<Trait> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(ConfigError::BlankTraitName);
            }
            if name.contains(KEY_SEPARATOR) {
                return Err(ConfigError::InvalidTraitName(name.to_string()));
            }
            if traits.iter().any(|t| t.name() == name) {
                return Err(ConfigError::DuplicateTrait(name.to_string()));
            }
            traits.push(Trait::new(name));
        }

        if traits.is_empty() {
            return Err(ConfigError::EmptyTraitSet);
        }

        Ok(Self { traits })
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trait> {
        self.traits.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up the canonical handle for a trait name.
    pub fn get(&self, name: &str) -> Option<&Trait> {
        self.traits.iter().find(|t| t.name() == name)
    }

    /// Declaration index of a trait.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.traits.iter().position(|t| t.name() == name)
    }
}

impl TryFrom<Vec<String>> for TraitSet {
    type Error = ConfigError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        TraitSet::new(names)
    }
}

impl From<TraitSet> for Vec<String> {
    fn from(set: TraitSet) -> Self {
        set.traits.iter().map(|t| t.name().to_string()).collect()
    }
}

/// Current value of every known trait.
///
/// Entries follow the trait set's declaration order. Values are clamped to
/// [`TRAIT_MIN`, `TRAIT_MAX`] on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitVector {
    values: Vec<(Trait, f64)>,
}

impl TraitVector {
    /// A vector with every trait at 0.0.
    pub fn new(set: &TraitSet) -> Self {
        Self {
            values: set.iter().map(|t| (t.clone(), 0.0)).collect(),
        }
    }

    /// Build a vector from explicit values. Traits not named stay at 0.0 and
    /// values outside the bounds are clamped.
    pub fn from_pairs<'a, I>(set: &TraitSet, pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut vector = Self::new(set);
        for (name, value) in pairs {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteDelta {
                    location: "trait vector".to_string(),
                    name: name.to_string(),
                });
            }
            let slot = vector
                .values
                .iter_mut()
                .find(|(t, _)| t.name() == name)
                .ok_or_else(|| ConfigError::UnknownTrait {
                    location: "trait vector".to_string(),
                    name: name.to_string(),
                })?;
            slot.1 = clamp_trait(value);
        }
        Ok(vector)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(t, _)| t.name() == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Trait, f64)> {
        self.values.iter().map(|(t, v)| (t, *v))
    }

    /// Add `delta` to a trait, saturating at the bounds.
    ///
    /// Returns the new value, or `None` when the trait is not part of this
    /// vector. Validated narratives never reference unknown traits.
    pub(crate) fn apply(&mut self, name: &str, delta: f64) -> Option<f64> {
        let (_, value) = self.values.iter_mut().find(|(t, _)| t.name() == name)?;
        *value = clamp_trait(*value + delta);
        Some(*value)
    }

    /// All traits by descending magnitude. Equal magnitudes keep declaration
    /// order (the sort is stable).
    pub fn ranked(&self) -> Vec<(&Trait, f64)> {
        let mut ranked: Vec<(&Trait, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }

    /// Up to `limit` top-ranked traits whose magnitude exceeds `floor`.
    pub fn dominant(&self, limit: usize, floor: f64) -> Vec<(&Trait, f64)> {
        self.ranked()
            .into_iter()
            .filter(|(_, v)| v.abs() > floor)
            .take(limit)
            .collect()
    }
}

impl Serialize for TraitVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.values, serializer)
    }
}

/// Saturating clamp into the trait bounds.
pub fn clamp_trait(value: f64) -> f64 {
    value.clamp(TRAIT_MIN, TRAIT_MAX)
}

/// Signed adjustments an option applies, in authored order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    entries: Vec<(Trait, f64)>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the adjustment for one trait, replacing any earlier value.
    pub fn with(mut self, name: impl AsRef<str>, value: f64) -> Self {
        let name = name.as_ref();
        match self.entries.iter_mut().find(|(t, _)| t.name() == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((Trait::new(name), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(t, _)| t.name() == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Trait, f64)> {
        self.entries.iter().map(|(t, v)| (t, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest absolute adjustment, 0.0 for an empty delta.
    pub fn max_magnitude(&self) -> f64 {
        self.entries
            .iter()
            .map(|(_, v)| v.abs())
            .fold(0.0, f64::max)
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.entries, serializer)
    }
}

impl<'de> Deserialize<'de> for Delta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Delta {
            entries: unique_pairs(deserializer)?,
        })
    }
}

/// Read a JSON object of trait names to numbers, keeping key order and
/// rejecting repeated keys.
pub(crate) fn unique_pairs<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(Trait, f64)>, D::Error> {
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(Trait, f64)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of trait names to numbers")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries: Vec<(Trait, f64)> = Vec::new();
            while let Some((name, value)) = map.next_entry::<String, f64>()? {
                if entries.iter().any(|(t, _)| t.name() == name) {
                    return Err(de::Error::custom(format!("duplicate trait '{name}'")));
                }
                entries.push((Trait::new(name), value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}

fn serialize_pairs<S: Serializer>(pairs: &[(Trait, f64)], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (name, value) in pairs {
        map.serialize_entry(name.name(), value)?;
    }
    map.end()
}

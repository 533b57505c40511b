//! Session state: the complete mutable play-state of one playthrough.

use crate::milestone;
use crate::traits::{Delta, Trait, TraitSet, TraitVector};
use serde::{Deserialize, Serialize};

/// One recorded choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    #[serde(rename = "scene")]
    pub scene_id: String,

    #[serde(rename = "choice")]
    pub option_id: String,

    /// The delta as authored on the option, before clamping.
    pub delta: Delta,
}

/// Traits, journal, path and cursor for a single playthrough.
///
/// The journal and path grow by exactly one entry per choice and the cursor
/// always equals the number of choices made. Only the choice processor
/// produces new sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub(crate) traits: TraitVector,
    pub(crate) journal: Vec<String>,
    pub(crate) path: Vec<PathEntry>,
    #[serde(rename = "sceneIndex")]
    pub(crate) cursor: usize,
}

impl Session {
    /// A fresh session with every trait at 0.0.
    pub fn new(traits: &TraitSet) -> Self {
        Self {
            traits: TraitVector::new(traits),
            journal: Vec::new(),
            path: Vec::new(),
            cursor: 0,
        }
    }

    pub fn traits(&self) -> &TraitVector {
        &self.traits
    }

    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    pub fn path(&self) -> &[PathEntry] {
        &self.path
    }

    /// Index of the current scene.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn choices_made(&self) -> usize {
        self.path.len()
    }

    /// Milestone traits in the order they were first crossed.
    pub fn milestones(&self) -> Vec<Trait> {
        milestone::replay(&self.path)
    }
}

//! Testing utilities for the persona engine.
//!
//! This module provides tools for integration testing:
//! - `TestHarness` for scripted playthroughs
//! - Assertion helpers for verifying game state

use crate::game::{ChoiceSummary, GameError, PersonaGame};
use crate::narrative::{ConfigError, Narrative};
use crate::persist::SaveSlot;
use std::sync::Arc;

/// Tolerance for comparing trait values.
pub const TRAIT_TOLERANCE: f64 = 1e-9;

/// Test harness for running scripted scenarios.
#[derive(Debug)]
pub struct TestHarness {
    /// The game under test.
    pub game: PersonaGame,
}

impl TestHarness {
    /// Create a harness over `narrative` with an in-memory save slot.
    pub fn new(narrative: Arc<Narrative>) -> Self {
        Self {
            game: PersonaGame::with_narrative(narrative),
        }
    }

    /// Create a harness over the built-in narrative.
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(Narrative::builtin()?)))
    }

    /// Create a harness from narrative JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(Narrative::from_json(json)?)))
    }

    /// Swap in a different save slot.
    pub fn with_slot(mut self, slot: impl SaveSlot + 'static) -> Self {
        self.game = self.game.with_slot(slot);
        self
    }

    /// Make one choice.
    pub fn choose(&mut self, option_id: &str) -> Result<ChoiceSummary, GameError> {
        self.game.apply_choice(option_id)
    }

    /// Make several choices in order, stopping at the first error.
    pub fn play(&mut self, option_ids: &[&str]) -> Result<Vec<ChoiceSummary>, GameError> {
        option_ids.iter().map(|id| self.choose(id)).collect()
    }

    /// Current value of a trait, 0.0 for unknown names.
    pub fn trait_value(&self, name: &str) -> f64 {
        self.game.session().traits().get(name).unwrap_or(0.0)
    }

    /// Names of the revealed milestone traits, in reveal order.
    pub fn revealed(&self) -> Vec<&str> {
        self.game
            .revealed_milestones()
            .iter()
            .map(|t| t.name())
            .collect()
    }

    /// The session as it would be written to disk, for byte-level
    /// comparisons.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self.game.session()).unwrap_or_default()
    }
}

/// Assert that a trait holds `expected`, within [`TRAIT_TOLERANCE`].
#[track_caller]
pub fn assert_trait(game: &PersonaGame, name: &str, expected: f64) {
    let actual = game.session().traits().get(name);
    match actual {
        Some(value) => assert!(
            (value - expected).abs() < TRAIT_TOLERANCE,
            "Expected {name} = {expected}, got {value}"
        ),
        None => panic!("Trait {name} is not tracked"),
    }
}

/// Assert the session cursor.
#[track_caller]
pub fn assert_cursor(game: &PersonaGame, expected: usize) {
    assert_eq!(
        game.session().cursor(),
        expected,
        "Expected cursor {expected}, got {}",
        game.session().cursor()
    );
    assert_eq!(game.session().path().len(), expected, "Path length out of step");
    assert_eq!(
        game.session().journal().len(),
        expected,
        "Journal length out of step"
    );
}

/// Assert the resolved archetype name.
#[track_caller]
pub fn assert_archetype(game: &PersonaGame, expected: &str) {
    let actual = &game.resolve_archetype().name;
    assert_eq!(actual, expected, "Expected archetype {expected}, got {actual}");
}

/// Assert the revealed milestones, in order.
#[track_caller]
pub fn assert_revealed(game: &PersonaGame, expected: &[&str]) {
    let actual: Vec<&str> = game
        .revealed_milestones()
        .iter()
        .map(|t| t.name())
        .collect();
    assert_eq!(actual, expected, "Revealed milestones differ");
}

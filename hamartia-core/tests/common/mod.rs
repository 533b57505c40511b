//! Shared fixtures for the QA suites.
#![allow(dead_code)]

use hamartia_core::Narrative;
use std::sync::Arc;

/// Five scenes with round numbers, milestone edge cases (0.39 vs 0.4) and a
/// triplet archetype.
pub const FIXTURE_NARRATIVE: &str = r#"{
  "traits": ["Hubris", "Avarice", "Deception", "Wrath", "Impulsivity", "Rigidity", "Fear", "Apathy", "Cynicism"],
  "scenes": [
    {
      "id": "gate",
      "title": "The Gate",
      "options": [
        { "id": "rise", "delta": { "Hubris": 0.6, "Impulsivity": 0.2 }, "whisper": "You rose." },
        { "id": "kneel", "delta": { "Hubris": -0.6 }, "whisper": "You knelt." },
        { "id": "pass", "delta": {}, "whisper": "You passed." }
      ]
    },
    {
      "id": "hall",
      "title": "The Hall",
      "options": [
        { "id": "boast", "delta": { "Hubris": 0.6 }, "whisper": "You boasted." },
        { "id": "bow", "delta": { "Hubris": -0.6 }, "whisper": "You bowed." },
        { "id": "brace", "delta": { "Rigidity": 0.39 }, "whisper": "You braced." }
      ]
    },
    {
      "id": "well",
      "title": "The Well",
      "options": [
        { "id": "drink", "delta": { "Fear": 0.4, "Apathy": 0.2 }, "whisper": "You drank." },
        { "id": "refuse", "delta": { "Fear": -0.4 }, "whisper": "You refused." },
        { "id": "peer", "delta": { "Cynicism": 0.39 }, "whisper": "You peered." }
      ]
    },
    {
      "id": "tower",
      "title": "The Tower",
      "options": [
        { "id": "climb", "delta": { "Hubris": 0.8, "Wrath": 0.3 }, "whisper": "You climbed." },
        { "id": "wait", "delta": { "Rigidity": 0.5 }, "whisper": "You waited." }
      ]
    },
    {
      "id": "sea",
      "title": "The Sea",
      "options": [
        { "id": "sail", "delta": { "Impulsivity": 0.5, "Deception": 0.1 }, "whisper": "You sailed." },
        { "id": "stay", "delta": { "Apathy": 0.6, "Cynicism": 0.6 }, "whisper": "You stayed." }
      ]
    }
  ],
  "archetypes": {
    "entries": {
      "Hubris,Rigidity": { "name": "The Sentinel", "lines": ["Structure serves you."] },
      "Apathy,Cynicism": { "name": "The Wanderer", "lines": ["Distance grants perspective."] },
      "Deception,Impulsivity": { "name": "The Trickster", "lines": ["Freedom is your ally."] },
      "Apathy,Cynicism,Fear": { "name": "The Hollow", "lines": ["Nothing reaches you."] },
      "Hubris": { "name": "The Ascendant", "lines": ["Ever higher."] },
      "Fear": { "name": "The Shade", "lines": ["Caution in the dark."] }
    },
    "default": { "name": "The Seeker", "lines": ["An unwritten path."] }
  },
  "trait_texts": {
    "Hubris": { "up": "Pride swells.", "down": "Humility settles.", "memory": "A cracked mirror." },
    "Fear": { "up": "Shadows stretch.", "down": "Courage edges in.", "memory": "A trembling feather." }
  }
}"#;

pub fn fixture() -> Arc<Narrative> {
    Arc::new(Narrative::from_json(FIXTURE_NARRATIVE).expect("fixture narrative is valid"))
}

pub fn builtin() -> Arc<Narrative> {
    Arc::new(Narrative::builtin().expect("builtin narrative is valid"))
}

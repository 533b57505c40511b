//! Interactive-fiction persona engine.
//!
//! This crate provides:
//! - A bounded personality-trait vector nudged by each narrative choice
//! - A linear scene graph loaded and validated from JSON
//! - Milestone detection and archetype resolution
//! - Single-slot session persistence
//! - Seeded autoplay policies for exercising narratives
//!
//! # Quick Start
//!
//! ```no_run
//! use hamartia_core::{GameConfig, PersonaGame};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut game = PersonaGame::new(GameConfig::new().with_save_dir("saves"))?;
//!
//!     let summary = game.apply_choice("disturb")?;
//!     println!("{}", summary.whisper);
//!
//!     game.save()?;
//!     while !game.is_complete() {
//!         let option = match game.current_scene() {
//!             Some(scene) => scene.options[0].id.clone(),
//!             None => break,
//!         };
//!         game.apply_choice(&option)?;
//!     }
//!     println!("You are {}", game.resolve_archetype().name);
//!     Ok(())
//! }
//! ```

pub mod archetype;
pub mod choice;
pub mod game;
pub mod milestone;
pub mod narrative;
pub mod persist;
pub mod scene;
pub mod simulate;
pub mod state;
pub mod testing;
pub mod traits;

// Primary public API
pub use archetype::{Archetype, ArchetypeTable, MatchKind, Resolution, SearchOrder};
pub use choice::{apply_choice, ChoiceError, ChoiceOutcome};
pub use game::{ChoiceSummary, GameConfig, GameError, PersonaGame};
pub use narrative::{ConfigError, Narrative, TraitText};
pub use persist::{FileSlot, MemorySlot, PersistError, SaveSlot};
pub use scene::{Scene, SceneGraph, SceneOption};
pub use state::{PathEntry, Session};
pub use testing::TestHarness;
pub use traits::{Delta, Trait, TraitSet, TraitVector};

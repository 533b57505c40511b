//! PersonaGame - the public operation surface of the engine.
//!
//! Owns one session, the shared narrative, the reveal history and a save
//! slot. Every mutating call either succeeds completely or leaves the game
//! exactly as it was.

use crate::archetype::{Archetype, Resolution, SearchOrder};
use crate::choice::{self, ChoiceError};
use crate::narrative::{load_narrative, ConfigError, Narrative};
use crate::persist::{self, FileSlot, MemorySlot, PersistError, SaveSlot, DEFAULT_SLOT_NAME};
use crate::scene::{Scene, SceneGraph};
use crate::state::Session;
use crate::traits::Trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default pause between an accepted choice and the next scene.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1500);

/// Errors from PersonaGame operations.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid choice: {0}")]
    InvalidChoice(#[from] ChoiceError),

    #[error("no saved session to load")]
    PersistenceMissing,

    #[error("saved session rejected: {0}")]
    PersistenceCorrupt(String),

    #[error("invalid narrative: {0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<PersistError> for GameError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::NotFound => GameError::PersistenceMissing,
            PersistError::Corrupt(reason) => GameError::PersistenceCorrupt(reason),
            PersistError::Io(e) => GameError::Io(e),
            PersistError::Json(e) => GameError::Serialization(e),
        }
    }
}

/// Configuration for creating a game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Narrative file to load. Falls back to `HAMARTIA_NARRATIVE_PATH`, then
    /// to the built-in narrative.
    pub narrative_path: Option<PathBuf>,

    /// Directory for the save slot. `None` keeps saves in memory.
    pub save_dir: Option<PathBuf>,

    /// Name of the save slot.
    pub slot_name: String,

    /// Overrides the narrative's archetype search order.
    pub search_order: Option<SearchOrder>,

    /// Pause the host should leave before showing the next scene.
    pub advance_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            narrative_path: None,
            save_dir: None,
            slot_name: DEFAULT_SLOT_NAME.to_string(),
            search_order: None,
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the narrative from a file.
    pub fn with_narrative_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.narrative_path = Some(path.into());
        self
    }

    /// Persist saves as a JSON file in `dir`.
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    pub fn with_slot_name(mut self, name: impl Into<String>) -> Self {
        self.slot_name = name.into();
        self
    }

    pub fn with_search_order(mut self, order: SearchOrder) -> Self {
        self.search_order = Some(order);
        self
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    /// No pause between scenes.
    pub fn quick_mode(mut self) -> Self {
        self.advance_delay = Duration::ZERO;
        self
    }
}

/// What happened when a choice was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSummary {
    /// Traits whose delta crossed the milestone threshold on this choice.
    pub milestones: Vec<Trait>,

    /// Milestone traits seen for the first time this session.
    pub newly_revealed: Vec<Trait>,

    /// The whisper recorded in the journal.
    pub whisper: String,

    /// Up/down echo lines for each trait the delta moved.
    pub echoes: Vec<String>,

    /// Cursor after the choice.
    pub next_cursor: usize,

    /// Whether the narrative is finished.
    pub complete: bool,
}

/// A single-player persona game.
#[derive(Debug)]
pub struct PersonaGame {
    narrative: Arc<Narrative>,
    session: Session,
    revealed: Vec<Trait>,
    slot: Box<dyn SaveSlot>,
    advance_delay: Duration,
}

impl PersonaGame {
    /// Create a game from configuration, loading and validating the
    /// narrative.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let mut narrative = load_narrative(config.narrative_path.as_deref())?;
        if let Some(order) = config.search_order {
            narrative = Arc::new((*narrative).clone().with_search_order(order));
        }

        let slot: Box<dyn SaveSlot> = match &config.save_dir {
            Some(dir) => Box::new(FileSlot::in_dir(dir, &config.slot_name)),
            None => Box::new(MemorySlot::new()),
        };

        Ok(Self {
            session: Session::new(narrative.traits()),
            narrative,
            revealed: Vec::new(),
            slot,
            advance_delay: config.advance_delay,
        })
    }

    /// Create a game over an already loaded narrative with an in-memory slot.
    pub fn with_narrative(narrative: Arc<Narrative>) -> Self {
        Self {
            session: Session::new(narrative.traits()),
            narrative,
            revealed: Vec::new(),
            slot: Box::new(MemorySlot::new()),
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }

    /// Replace the save slot.
    pub fn with_slot(mut self, slot: impl SaveSlot + 'static) -> Self {
        self.slot = Box::new(slot);
        self
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    /// Begin a fresh session at the first scene. The save slot is untouched.
    pub fn start_session(&mut self) {
        self.session = Session::new(self.narrative.traits());
        self.revealed.clear();
        tracing::info!(
            target: "hamartia::telemetry",
            scenes = self.narrative.scenes().len(),
            "session.started"
        );
    }

    /// Choose `option_id` in the current scene.
    ///
    /// On error the session is unchanged.
    pub fn apply_choice(&mut self, option_id: &str) -> Result<ChoiceSummary, GameError> {
        let cursor = self.session.cursor();
        let scene_id = self
            .current_scene()
            .map(|s| s.id.clone())
            .ok_or(ChoiceError::SessionComplete { cursor })?;

        let outcome =
            choice::apply_choice(&self.session, self.narrative.scenes(), &scene_id, option_id)?;

        let mut newly_revealed = Vec::new();
        for name in &outcome.milestones {
            if !self.revealed.contains(name) {
                self.revealed.push(name.clone());
                newly_revealed.push(name.clone());
            }
        }

        let whisper = outcome.session.journal().last().cloned().unwrap_or_default();
        let echoes = outcome
            .session
            .path()
            .last()
            .map(|entry| {
                entry
                    .delta
                    .iter()
                    .filter_map(|(name, delta)| {
                        self.narrative
                            .trait_text(name.name())
                            .and_then(|text| text.echo(delta))
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();

        self.session = outcome.session;

        Ok(ChoiceSummary {
            milestones: outcome.milestones,
            newly_revealed,
            whisper,
            echoes,
            next_cursor: outcome.next_cursor,
            complete: outcome.complete,
        })
    }

    /// The scene at the cursor; `None` once every scene is played.
    pub fn current_scene(&self) -> Option<&Scene> {
        self.narrative.scenes().get(self.session.cursor())
    }

    pub fn is_complete(&self) -> bool {
        self.session.cursor() >= self.narrative.scenes().len()
    }

    /// The archetype for the current trait vector.
    pub fn resolve_archetype(&self) -> &Archetype {
        self.narrative.archetypes().resolve(self.session.traits())
    }

    /// Like [`resolve_archetype`](Self::resolve_archetype), reporting which
    /// key matched.
    pub fn resolution(&self) -> Resolution<'_> {
        self.narrative.archetypes().resolve_match(self.session.traits())
    }

    /// Write the session to the save slot.
    pub fn save(&mut self) -> Result<(), GameError> {
        persist::save_to(self.slot.as_mut(), &self.session)?;
        tracing::info!(
            target: "hamartia::persist",
            cursor = self.session.cursor(),
            "game.saved"
        );
        Ok(())
    }

    /// Replace the session with the one in the save slot.
    ///
    /// The recorded path must follow this narrative's scenes in order, each
    /// entry naming an option of its scene. Milestone reveals are rebuilt from
    /// the loaded path. On any error the current session is kept.
    pub fn load(&mut self) -> Result<(), GameError> {
        let session = persist::load_from(self.slot.as_ref(), self.narrative.traits())?;

        let scene_count = self.narrative.scenes().len();
        if session.cursor() > scene_count {
            tracing::warn!(
                target: "hamartia::persist",
                cursor = session.cursor(),
                scenes = scene_count,
                "game.load_rejected"
            );
            return Err(GameError::PersistenceCorrupt(format!(
                "sceneIndex {} is past the last of {scene_count} scenes",
                session.cursor()
            )));
        }

        if let Err(reason) = check_path(&session, self.narrative.scenes()) {
            tracing::warn!(target: "hamartia::persist", reason = %reason, "game.load_rejected");
            return Err(GameError::PersistenceCorrupt(reason));
        }

        self.revealed = session.milestones();
        self.session = session;
        tracing::info!(
            target: "hamartia::persist",
            cursor = self.session.cursor(),
            revealed = self.revealed.len(),
            "game.loaded"
        );
        Ok(())
    }

    /// Discard the session and clear the save slot.
    pub fn reset(&mut self) -> Result<(), GameError> {
        self.slot.clear()?;
        self.session = Session::new(self.narrative.traits());
        self.revealed.clear();
        tracing::info!(target: "hamartia::persist", "game.reset");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn narrative(&self) -> &Arc<Narrative> {
        &self.narrative
    }

    /// Milestone traits in the order they were first revealed.
    pub fn revealed_milestones(&self) -> &[Trait] {
        &self.revealed
    }

    /// Memory lines for the revealed milestones, in reveal order.
    pub fn memories(&self) -> Vec<&str> {
        self.revealed
            .iter()
            .filter_map(|name| self.narrative.trait_text(name.name()))
            .map(|text| text.memory.as_str())
            .collect()
    }

    pub fn advance_delay(&self) -> Duration {
        self.advance_delay
    }
}

/// Each path entry must be the scene at its position and one of its options.
fn check_path(session: &Session, scenes: &SceneGraph) -> Result<(), String> {
    for (index, entry) in session.path().iter().enumerate() {
        let scene = scenes
            .get(index)
            .ok_or_else(|| format!("path entry {index} is past the last scene"))?;
        if scene.id != entry.scene_id {
            return Err(format!(
                "path entry {index} is scene '{}', expected '{}'",
                entry.scene_id, scene.id
            ));
        }
        if scene.option(&entry.option_id).is_none() {
            return Err(format!(
                "path entry {index} chose '{}', which scene '{}' does not offer",
                entry.option_id, scene.id
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> PersonaGame {
        PersonaGame::with_narrative(Arc::new(Narrative::builtin().unwrap()))
    }

    #[test]
    fn test_config_builder() {
        let config = GameConfig::new()
            .with_slot_name("other")
            .with_search_order(SearchOrder::PairFirst)
            .quick_mode();
        assert_eq!(config.slot_name, "other");
        assert_eq!(config.search_order, Some(SearchOrder::PairFirst));
        assert_eq!(config.advance_delay, Duration::ZERO);
        assert_eq!(GameConfig::default().advance_delay, DEFAULT_ADVANCE_DELAY);
    }

    #[test]
    fn test_new_builds_from_builtin_narrative() {
        let game = PersonaGame::new(GameConfig::new().quick_mode()).unwrap();
        assert_eq!(game.current_scene().map(|s| s.id.as_str()), Some("mirror_pool"));
        assert_eq!(game.advance_delay(), Duration::ZERO);
    }

    #[test]
    fn test_choice_summary_carries_echoes_and_reveals() {
        let mut game = game();
        let summary = game.apply_choice("disturb").unwrap();

        assert_eq!(summary.whisper, "You broke the stillness first.");
        assert_eq!(
            summary.echoes,
            vec!["Pride swells within you.", "You move before thought can anchor."]
        );
        assert_eq!(summary.newly_revealed, vec![Trait::new("Hubris")]);
        assert_eq!(game.memories(), vec!["A cracked mirror remembers your surge of pride."]);

        let summary = game.apply_choice("dissect").unwrap();
        assert_eq!(summary.milestones, vec![Trait::new("Hubris")]);
        assert!(summary.newly_revealed.is_empty());
    }

    #[test]
    fn test_invalid_choice_leaves_session_alone() {
        let mut game = game();
        let before = game.session().clone();
        assert!(matches!(
            game.apply_choice("nope"),
            Err(GameError::InvalidChoice(ChoiceError::UnknownOption { .. }))
        ));
        assert_eq!(game.session(), &before);
    }

    #[test]
    fn test_load_without_save_is_missing() {
        let mut game = game();
        assert!(matches!(game.load(), Err(GameError::PersistenceMissing)));
    }

    #[test]
    fn test_load_rejects_cursor_past_end() {
        let narrative = Arc::new(Narrative::builtin().unwrap());
        let path: Vec<_> = (0..9)
            .map(|i| serde_json::json!({"scene": format!("s{i}"), "choice": "x", "delta": {}}))
            .collect();
        let journal = vec![""; 9];
        let blob = serde_json::json!({
            "traits": {},
            "journal": journal,
            "path": path,
            "sceneIndex": 9,
        })
        .to_string();

        let mut game = PersonaGame::with_narrative(narrative).with_slot(MemorySlot::with_blob(blob));
        game.apply_choice("wait").unwrap();
        let before = game.session().clone();

        assert!(matches!(game.load(), Err(GameError::PersistenceCorrupt(_))));
        assert_eq!(game.session(), &before);
        assert_eq!(game.revealed_milestones(), [Trait::new("Hubris")]);
    }

    #[test]
    fn test_load_rejects_path_from_another_narrative() {
        let blob = |scene: &str, choice: &str| {
            serde_json::json!({
                "traits": {"Hubris": 0.6},
                "journal": ["x"],
                "path": [{"scene": scene, "choice": choice, "delta": {"Hubris": 0.6}}],
                "sceneIndex": 1,
            })
            .to_string()
        };

        for (scene, choice) in [("gate", "disturb"), ("mirror_pool", "rise")] {
            let mut game = game().with_slot(MemorySlot::with_blob(blob(scene, choice)));
            let before = game.session().clone();
            assert!(
                matches!(game.load(), Err(GameError::PersistenceCorrupt(_))),
                "expected corrupt for {scene}/{choice}"
            );
            assert_eq!(game.session(), &before);
        }

        let mut game = game().with_slot(MemorySlot::with_blob(blob("mirror_pool", "disturb")));
        game.load().unwrap();
        assert_eq!(game.session().cursor(), 1);
        assert_eq!(game.revealed_milestones(), [Trait::new("Hubris")]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut game = game();
        game.apply_choice("disturb").unwrap();
        game.save().unwrap();

        game.reset().unwrap();
        assert_eq!(game.session().cursor(), 0);
        assert!(game.revealed_milestones().is_empty());
        assert!(matches!(game.load(), Err(GameError::PersistenceMissing)));
    }
}

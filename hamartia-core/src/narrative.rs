//! Narrative configuration: traits, scenes, archetypes and trait texts.
//!
//! Loaded from JSON. The built-in content is embedded at compile time and can
//! be replaced with a file named by `HAMARTIA_NARRATIVE_PATH`. Everything is
//! validated at load; a narrative that fails validation never reaches a game.

use crate::archetype::{Archetype, ArchetypeTable, SearchOrder};
use crate::scene::{Scene, SceneGraph};
use crate::traits::{Trait, TraitSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs, io};
use thiserror::Error;

pub const BUILTIN_NARRATIVE: &str = include_str!("data/narrative.json");

/// Environment variable naming a narrative file to load instead of the
/// built-in content.
pub const NARRATIVE_PATH_ENV: &str = "HAMARTIA_NARRATIVE_PATH";

/// Invalid narrative configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse narrative: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read narrative from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("trait set is empty")]
    EmptyTraitSet,

    #[error("trait name is blank")]
    BlankTraitName,

    #[error("trait name '{0}' contains ','")]
    InvalidTraitName(String),

    #[error("trait '{0}' is declared twice")]
    DuplicateTrait(String),

    #[error("scene graph is empty")]
    EmptySceneGraph,

    #[error("scene '{0}' is declared twice")]
    DuplicateScene(String),

    #[error("scene '{0}' has no options")]
    EmptyOptions(String),

    #[error("scene '{scene}' declares option '{option}' twice")]
    DuplicateOption { scene: String, option: String },

    #[error("{location} references unknown trait '{name}'")]
    UnknownTrait { location: String, name: String },

    #[error("{location} has a non-finite value for '{name}'")]
    NonFiniteDelta { location: String, name: String },

    #[error("archetype table is empty")]
    EmptyArchetypeTable,

    #[error("archetype key '{key}' is invalid: {reason}")]
    InvalidArchetypeKey { key: String, reason: String },

    #[error("archetype '{0}' has a blank name")]
    BlankArchetypeName(String),
}

/// Flavor text for one trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitText {
    /// Shown when a choice raises the trait.
    pub up: String,
    /// Shown when a choice lowers the trait.
    pub down: String,
    /// Reveal line once the trait has crossed a milestone.
    pub memory: String,
}

impl TraitText {
    /// The echo line for the direction of `delta`; `None` for a zero delta.
    pub fn echo(&self, delta: f64) -> Option<&str> {
        if delta > 0.0 {
            Some(&self.up)
        } else if delta < 0.0 {
            Some(&self.down)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNarrative {
    traits: TraitSet,
    scenes: Vec<Scene>,
    archetypes: RawArchetypes,
    #[serde(default)]
    trait_texts: HashMap<String, TraitText>,
}

#[derive(Debug, Deserialize)]
struct RawArchetypes {
    entries: HashMap<String, Archetype>,
    default: Archetype,
    #[serde(default)]
    search_order: SearchOrder,
}

/// A validated narrative.
#[derive(Debug, Clone)]
pub struct Narrative {
    traits: TraitSet,
    scenes: SceneGraph,
    archetypes: ArchetypeTable,
    trait_texts: HashMap<Trait, TraitText>,
}

impl Narrative {
    /// Assemble a narrative from parts built separately.
    ///
    /// The scene graph and archetype table are re-checked against `traits`,
    /// since each may have been validated against a different set.
    pub fn new(
        traits: TraitSet,
        scenes: SceneGraph,
        archetypes: ArchetypeTable,
    ) -> Result<Self, ConfigError> {
        scenes.check_traits(&traits)?;
        archetypes.check_traits(&traits)?;
        Ok(Self {
            traits,
            scenes,
            archetypes,
            trait_texts: HashMap::new(),
        })
    }

    /// Parse and validate a narrative from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawNarrative = serde_json::from_str(json)?;

        let scenes = SceneGraph::new(raw.scenes, &raw.traits)?;
        let archetypes =
            ArchetypeTable::new(raw.archetypes.entries, raw.archetypes.default, &raw.traits)?
                .with_search_order(raw.archetypes.search_order);

        let mut trait_texts = HashMap::new();
        for (name, text) in raw.trait_texts {
            let handle = raw
                .traits
                .get(&name)
                .ok_or_else(|| ConfigError::UnknownTrait {
                    location: "trait_texts".to_string(),
                    name: name.clone(),
                })?;
            trait_texts.insert(handle.clone(), text);
        }

        Ok(Self {
            traits: raw.traits,
            scenes,
            archetypes,
            trait_texts,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// The embedded pilot narrative.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_NARRATIVE)
    }

    pub fn with_trait_text(mut self, name: &str, text: TraitText) -> Result<Self, ConfigError> {
        let handle = self
            .traits
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTrait {
                location: "trait_texts".to_string(),
                name: name.to_string(),
            })?
            .clone();
        self.trait_texts.insert(handle, text);
        Ok(self)
    }

    pub fn with_search_order(mut self, order: SearchOrder) -> Self {
        self.archetypes = self.archetypes.with_search_order(order);
        self
    }

    pub fn traits(&self) -> &TraitSet {
        &self.traits
    }

    pub fn scenes(&self) -> &SceneGraph {
        &self.scenes
    }

    pub fn archetypes(&self) -> &ArchetypeTable {
        &self.archetypes
    }

    pub fn trait_text(&self, name: &str) -> Option<&TraitText> {
        self.trait_texts.get(name)
    }
}

/// Load the narrative named by `path`, or fall back to the environment
/// override and then the built-in content.
pub fn load_narrative(path: Option<&Path>) -> Result<Arc<Narrative>, ConfigError> {
    match path {
        Some(path) => load_file(path),
        None => load_narrative_from_env(),
    }
}

/// Load the narrative from `HAMARTIA_NARRATIVE_PATH` if set, otherwise the
/// built-in content. A broken override is an error, not a silent fallback.
pub fn load_narrative_from_env() -> Result<Arc<Narrative>, ConfigError> {
    match env::var(NARRATIVE_PATH_ENV).ok().map(PathBuf::from) {
        Some(path) => load_file(&path),
        None => {
            let narrative = Narrative::builtin()?;
            tracing::info!(
                target: "hamartia::config",
                scenes = narrative.scenes().len(),
                "narrative.loaded=builtin"
            );
            Ok(Arc::new(narrative))
        }
    }
}

fn load_file(path: &Path) -> Result<Arc<Narrative>, ConfigError> {
    match Narrative::from_file(path) {
        Ok(narrative) => {
            tracing::info!(
                target: "hamartia::config",
                path = %path.display(),
                scenes = narrative.scenes().len(),
                "narrative.loaded=file"
            );
            Ok(Arc::new(narrative))
        }
        Err(err) => {
            tracing::warn!(
                target: "hamartia::config",
                path = %path.display(),
                error = %err,
                "narrative.load_failed"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneOption;
    use crate::traits::Delta;
    use std::io::Write;

    #[test]
    fn test_builtin_narrative_is_valid() {
        let narrative = Narrative::builtin().unwrap();
        assert_eq!(narrative.traits().len(), 12);
        assert_eq!(narrative.scenes().len(), 8);
        assert_eq!(narrative.scenes().get(0).map(|s| s.id.as_str()), Some("mirror_pool"));
        assert_eq!(narrative.archetypes().search_order(), SearchOrder::TripletFirst);
        assert_eq!(
            narrative.archetypes().default_archetype().name,
            "The Seeker of Unwritten Paths"
        );
        assert!(narrative
            .traits()
            .iter()
            .all(|t| narrative.trait_text(t.name()).is_some()));
    }

    #[test]
    fn test_trait_text_echo_direction() {
        let narrative = Narrative::builtin().unwrap();
        let text = narrative.trait_text("Hubris").unwrap();
        assert_eq!(text.echo(0.6), Some("Pride swells within you."));
        assert_eq!(text.echo(-0.6), Some("A quiet humility tempers your stance."));
        assert_eq!(text.echo(0.0), None);
    }

    #[test]
    fn test_unknown_trait_in_option_is_rejected() {
        let json = r#"{
            "traits": ["Hubris"],
            "scenes": [{"id": "s", "options": [{"id": "o", "delta": {"Envy": 0.2}}]}],
            "archetypes": {"entries": {"Hubris": {"name": "A"}}, "default": {"name": "D"}}
        }"#;
        assert!(matches!(
            Narrative::from_json(json),
            Err(ConfigError::UnknownTrait { name, .. }) if name == "Envy"
        ));
    }

    #[test]
    fn test_new_rechecks_parts_against_trait_set() {
        let wide = TraitSet::new(["Hubris", "Fear"]).unwrap();
        let narrow = TraitSet::new(["Hubris"]).unwrap();
        let scene = Scene {
            id: "s".to_string(),
            act: String::new(),
            title: String::new(),
            subtitle: String::new(),
            text: String::new(),
            options: vec![SceneOption {
                id: "o".to_string(),
                label: String::new(),
                delta: Delta::new().with("Fear", 0.9),
                whisper: String::new(),
            }],
        };
        let graph = SceneGraph::new(vec![scene], &wide).unwrap();
        let archetype = |name: &str| Archetype {
            name: name.to_string(),
            lines: Vec::new(),
        };
        let table = |key: &str| {
            let entries = HashMap::from([(key.to_string(), archetype("A"))]);
            ArchetypeTable::new(entries, archetype("D"), &wide).unwrap()
        };

        // option delta names a trait outside the set
        assert!(matches!(
            Narrative::new(narrow.clone(), graph.clone(), table("Hubris")),
            Err(ConfigError::UnknownTrait { name, .. }) if name == "Fear"
        ));

        // archetype key names a trait outside the set
        let hubris_only = SceneGraph::new(
            vec![Scene {
                id: "t".to_string(),
                act: String::new(),
                title: String::new(),
                subtitle: String::new(),
                text: String::new(),
                options: vec![SceneOption {
                    id: "o".to_string(),
                    label: String::new(),
                    delta: Delta::new().with("Hubris", 0.5),
                    whisper: String::new(),
                }],
            }],
            &narrow,
        )
        .unwrap();
        assert!(matches!(
            Narrative::new(narrow, hubris_only, table("Fear")),
            Err(ConfigError::UnknownTrait { name, .. }) if name == "Fear"
        ));

        assert!(Narrative::new(wide.clone(), graph, table("Fear")).is_ok());
    }

    #[test]
    fn test_empty_scene_list_is_rejected() {
        let json = r#"{
            "traits": ["Hubris"],
            "scenes": [],
            "archetypes": {"entries": {"Hubris": {"name": "A"}}, "default": {"name": "D"}}
        }"#;
        assert!(matches!(
            Narrative::from_json(json),
            Err(ConfigError::EmptySceneGraph)
        ));
    }

    #[test]
    fn test_duplicate_trait_declaration_is_a_parse_error() {
        let json = r#"{
            "traits": ["Hubris", "Hubris"],
            "scenes": [{"id": "s", "options": [{"id": "o"}]}],
            "archetypes": {"entries": {"Hubris": {"name": "A"}}, "default": {"name": "D"}}
        }"#;
        assert!(matches!(Narrative::from_json(json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_search_order_read_from_config() {
        let json = r#"{
            "traits": ["Hubris"],
            "scenes": [{"id": "s", "options": [{"id": "o"}]}],
            "archetypes": {
                "entries": {"Hubris": {"name": "A"}},
                "default": {"name": "D"},
                "search_order": "pair_first"
            }
        }"#;
        let narrative = Narrative::from_json(json).unwrap();
        assert_eq!(narrative.archetypes().search_order(), SearchOrder::PairFirst);
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUILTIN_NARRATIVE.as_bytes()).unwrap();

        let narrative = load_narrative(Some(file.path())).unwrap();
        assert_eq!(narrative.scenes().len(), 8);

        let missing = load_narrative(Some(Path::new("/definitely/not/here.json")));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}

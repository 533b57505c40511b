//! Scenes, options and the linear scene graph.
//!
//! The graph is a fixed sequence: the scene after index `i` is always `i + 1`.
//! Options differ in the trait consequences they carry, not in where they
//! lead.

use crate::narrative::ConfigError;
use crate::traits::{Delta, TraitSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A selectable branch within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneOption {
    /// Unique within its scene.
    pub id: String,

    /// Display text for the choice.
    #[serde(default)]
    pub label: String,

    /// Trait adjustments applied on selection.
    #[serde(default)]
    pub delta: Delta,

    /// Echo line recorded verbatim in the journal.
    #[serde(default)]
    pub whisper: String,
}

/// One step of the narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,

    #[serde(default)]
    pub act: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub subtitle: String,

    #[serde(default)]
    pub text: String,

    pub options: Vec<SceneOption>,
}

impl Scene {
    pub fn option(&self, id: &str) -> Option<&SceneOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn option_index(&self, id: &str) -> Option<usize> {
        self.options.iter().position(|o| o.id == id)
    }
}

/// The ordered, immutable sequence of scenes.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    scenes: Vec<Scene>,
}

impl SceneGraph {
    /// Validate scenes against the trait set and freeze them.
    pub fn new(scenes: Vec<Scene>, traits: &TraitSet) -> Result<Self, ConfigError> {
        validate(&scenes, traits)?;
        Ok(Self { scenes })
    }

    /// Re-check every option delta against `traits`.
    pub(crate) fn check_traits(&self, traits: &TraitSet) -> Result<(), ConfigError> {
        validate(&self.scenes, traits)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene at a cursor position; `None` once the graph is exhausted.
    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }
}

fn validate(scenes: &[Scene], traits: &TraitSet) -> Result<(), ConfigError> {
    if scenes.is_empty() {
        return Err(ConfigError::EmptySceneGraph);
    }

    let mut scene_ids = HashSet::new();
    for scene in scenes {
        if !scene_ids.insert(scene.id.as_str()) {
            return Err(ConfigError::DuplicateScene(scene.id.clone()));
        }
        if scene.options.is_empty() {
            return Err(ConfigError::EmptyOptions(scene.id.clone()));
        }

        let mut option_ids = HashSet::new();
        for option in &scene.options {
            if !option_ids.insert(option.id.as_str()) {
                return Err(ConfigError::DuplicateOption {
                    scene: scene.id.clone(),
                    option: option.id.clone(),
                });
            }
            for (name, value) in option.delta.iter() {
                let location = format!("scene '{}' option '{}'", scene.id, option.id);
                if !traits.contains(name.name()) {
                    return Err(ConfigError::UnknownTrait {
                        location,
                        name: name.to_string(),
                    });
                }
                if !value.is_finite() {
                    return Err(ConfigError::NonFiniteDelta {
                        location,
                        name: name.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

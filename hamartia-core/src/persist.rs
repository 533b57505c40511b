//! Session persistence.
//!
//! A session is stored as one JSON document in a single named slot. The
//! document carries the trait map, journal, path and cursor (`sceneIndex`)
//! plus a format version and a timestamp. Loading validates the document
//! against the narrative's trait set before any state is touched.

use crate::state::{PathEntry, Session};
use crate::traits::{Trait, TraitSet, TraitVector, TRAIT_MAX, TRAIT_MIN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no saved session")]
    NotFound,

    #[error("saved session is corrupt: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Slot name used when none is configured.
pub const DEFAULT_SLOT_NAME: &str = "janus_state";

#[derive(Serialize)]
struct SavedSession<'a> {
    version: u32,
    #[serde(rename = "savedAt")]
    saved_at: String,
    #[serde(flatten)]
    session: &'a Session,
}

#[derive(Deserialize)]
struct RawSavedSession {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(deserialize_with = "crate::traits::unique_pairs")]
    traits: Vec<(Trait, f64)>,
    journal: Vec<String>,
    path: Vec<PathEntry>,
    #[serde(rename = "sceneIndex")]
    cursor: usize,
}

fn default_version() -> u32 {
    SAVE_VERSION
}

/// Serialize a session to its stored form.
pub fn serialize(session: &Session) -> Result<String, PersistError> {
    let saved = SavedSession {
        version: SAVE_VERSION,
        saved_at: chrono::Utc::now().to_rfc3339(),
        session,
    };
    Ok(serde_json::to_string_pretty(&saved)?)
}

/// Parse and validate a stored session.
///
/// Traits missing from the document start at 0.0. Any other inconsistency,
/// including a trait listed twice, is reported as [`PersistError::Corrupt`].
pub fn deserialize(blob: &str, traits: &TraitSet) -> Result<Session, PersistError> {
    let raw: RawSavedSession =
        serde_json::from_str(blob).map_err(|e| PersistError::Corrupt(e.to_string()))?;

    if raw.version != SAVE_VERSION {
        return Err(PersistError::Corrupt(format!(
            "unsupported version {} (expected {SAVE_VERSION})",
            raw.version
        )));
    }

    for (name, value) in &raw.traits {
        if !(TRAIT_MIN..=TRAIT_MAX).contains(value) {
            return Err(PersistError::Corrupt(format!(
                "trait '{name}' is out of range: {value}"
            )));
        }
    }
    let vector = TraitVector::from_pairs(
        traits,
        raw.traits.iter().map(|(name, value)| (name.name(), *value)),
    )
    .map_err(|e| PersistError::Corrupt(e.to_string()))?;

    for (index, entry) in raw.path.iter().enumerate() {
        for (name, value) in entry.delta.iter() {
            if !traits.contains(name.name()) {
                return Err(PersistError::Corrupt(format!(
                    "path entry {index} references unknown trait '{name}'"
                )));
            }
            if !value.is_finite() {
                return Err(PersistError::Corrupt(format!(
                    "path entry {index} has a non-finite delta for '{name}'"
                )));
            }
        }
    }

    if raw.journal.len() != raw.path.len() {
        return Err(PersistError::Corrupt(format!(
            "journal has {} entries but path has {}",
            raw.journal.len(),
            raw.path.len()
        )));
    }
    if raw.cursor != raw.path.len() {
        return Err(PersistError::Corrupt(format!(
            "sceneIndex {} does not match {} recorded choices",
            raw.cursor,
            raw.path.len()
        )));
    }

    Ok(Session {
        traits: vector,
        journal: raw.journal,
        path: raw.path,
        cursor: raw.cursor,
    })
}

/// Storage for one serialized session.
pub trait SaveSlot: fmt::Debug + Send {
    /// The stored blob, or `None` if the slot is empty.
    fn read(&self) -> Result<Option<String>, PersistError>;

    /// Replace the slot's contents.
    fn write(&mut self, blob: &str) -> Result<(), PersistError>;

    /// Empty the slot. Clearing an empty slot succeeds.
    fn clear(&mut self) -> Result<(), PersistError>;
}

/// In-memory slot, mainly for tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    blob: Option<String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with `blob`.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl SaveSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Ok(self.blob.clone())
    }

    fn write(&mut self, blob: &str) -> Result<(), PersistError> {
        self.blob = Some(blob.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        self.blob = None;
        Ok(())
    }
}

/// Slot backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A slot named `name` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, name: &str) -> Self {
        Self::new(slot_path(dir, name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveSlot for FileSlot {
    fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, blob: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write then rename so a crash never leaves a half-written slot.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// File path for a named slot. Non-alphanumeric characters become `_`.
pub fn slot_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let sanitized = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    dir.as_ref().join(format!("{sanitized}.json"))
}

/// Serialize `session` and write it to `slot`.
pub fn save_to(slot: &mut dyn SaveSlot, session: &Session) -> Result<(), PersistError> {
    let blob = serialize(session)?;
    slot.write(&blob)?;
    tracing::debug!(
        target: "hamartia::persist",
        choices = session.choices_made(),
        bytes = blob.len(),
        "session.saved"
    );
    Ok(())
}

/// Read and validate the session stored in `slot`.
pub fn load_from(slot: &dyn SaveSlot, traits: &TraitSet) -> Result<Session, PersistError> {
    let blob = slot.read()?.ok_or(PersistError::NotFound)?;
    match deserialize(&blob, traits) {
        Ok(session) => {
            tracing::debug!(
                target: "hamartia::persist",
                choices = session.choices_made(),
                "session.loaded"
            );
            Ok(session)
        }
        Err(err) => {
            tracing::warn!(target: "hamartia::persist", error = %err, "session.load_rejected");
            Err(err)
        }
    }
}

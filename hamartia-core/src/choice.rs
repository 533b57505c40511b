//! The choice processor.
//!
//! [`apply_choice`] is a pure function: it borrows the prior session and
//! returns a new one with the option's delta applied, the path and journal
//! extended, and the cursor advanced. A rejected choice leaves the caller's
//! session exactly as it was.

use crate::milestone;
use crate::scene::SceneGraph;
use crate::state::{PathEntry, Session};
use crate::traits::Trait;
use thiserror::Error;

/// Reasons a choice is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("every scene has been played (cursor {cursor})")]
    SessionComplete { cursor: usize },

    #[error("current scene is '{expected}', not '{found}'")]
    SceneMismatch { expected: String, found: String },

    #[error("scene '{scene}' has no option '{option}'")]
    UnknownOption { scene: String, option: String },

    #[error("option '{option}' of scene '{scene}' adjusts unknown trait '{name}'")]
    UnknownTrait {
        scene: String,
        option: String,
        name: String,
    },
}

/// Result of an accepted choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOutcome {
    /// The session after the choice.
    pub session: Session,

    /// Traits whose raw delta crossed the milestone threshold, in delta order.
    pub milestones: Vec<Trait>,

    /// Cursor after the choice.
    pub next_cursor: usize,

    /// Whether the scene graph is now exhausted.
    pub complete: bool,
}

/// Apply the option `option_id` of scene `scene_id` to `session`.
///
/// `scene_id` must be the scene at the session's cursor and `option_id` one of
/// its options. Every trait the option adjusts must be in the session's
/// vector.
pub fn apply_choice(
    session: &Session,
    graph: &SceneGraph,
    scene_id: &str,
    option_id: &str,
) -> Result<ChoiceOutcome, ChoiceError> {
    let scene = graph
        .get(session.cursor)
        .ok_or(ChoiceError::SessionComplete {
            cursor: session.cursor,
        })?;

    if scene.id != scene_id {
        return Err(ChoiceError::SceneMismatch {
            expected: scene.id.clone(),
            found: scene_id.to_string(),
        });
    }

    let option = scene
        .option(option_id)
        .ok_or_else(|| ChoiceError::UnknownOption {
            scene: scene.id.clone(),
            option: option_id.to_string(),
        })?;

    let mut next = session.clone();
    for (name, delta) in option.delta.iter() {
        if next.traits.apply(name.name(), delta).is_none() {
            return Err(ChoiceError::UnknownTrait {
                scene: scene.id.clone(),
                option: option.id.clone(),
                name: name.to_string(),
            });
        }
    }
    let milestones = milestone::crossed(&option.delta);

    next.path.push(PathEntry {
        scene_id: scene.id.clone(),
        option_id: option.id.clone(),
        delta: option.delta.clone(),
    });
    next.journal.push(option.whisper.clone());
    next.cursor += 1;

    tracing::debug!(
        target: "hamartia::telemetry",
        scene = %scene.id,
        choice = %option.id,
        delta = ?option.delta,
        traits = ?next.traits,
        "choice.applied"
    );

    let next_cursor = next.cursor;
    Ok(ChoiceOutcome {
        complete: next_cursor >= graph.len(),
        next_cursor,
        milestones,
        session: next,
    })
}

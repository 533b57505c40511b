//! Milestone detection.
//!
//! A milestone fires for a trait when a single delta moves it by at least
//! [`MILESTONE_THRESHOLD`]. The raw delta is tested, not the clamped result,
//! so a trait already pinned at a bound still fires.

use crate::state::PathEntry;
use crate::traits::{Delta, Trait};

/// Minimum single-step magnitude that counts as a milestone.
pub const MILESTONE_THRESHOLD: f64 = 0.4;

pub fn is_milestone(delta: f64) -> bool {
    delta.abs() >= MILESTONE_THRESHOLD
}

/// Traits in `delta` that cross the threshold, in delta order.
pub fn crossed(delta: &Delta) -> Vec<Trait> {
    let mut crossed: Vec<Trait> = Vec::new();
    for (name, value) in delta.iter() {
        if is_milestone(value) && !crossed.contains(name) {
            crossed.push(name.clone());
        }
    }
    crossed
}

/// Rebuild the reveal history from a recorded path.
///
/// Each trait appears once, at its first crossing. The scan only reads the
/// path, so replaying it any number of times gives the same answer.
pub fn replay(path: &[PathEntry]) -> Vec<Trait> {
    let mut revealed: Vec<Trait> = Vec::new();
    for entry in path {
        for name in crossed(&entry.delta) {
            if !revealed.contains(&name) {
                revealed.push(name);
            }
        }
    }
    revealed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(scene: &str, delta: Delta) -> PathEntry {
        PathEntry {
            scene_id: scene.to_string(),
            option_id: "x".to_string(),
            delta,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_milestone(0.4));
        assert!(is_milestone(-0.4));
        assert!(!is_milestone(0.39));
        assert!(!is_milestone(-0.39));
    }

    #[test]
    fn test_crossed_keeps_delta_order() {
        let delta = Delta::new()
            .with("Wrath", 0.8)
            .with("Hubris", 0.2)
            .with("Fear", -0.5);
        let names: Vec<_> = crossed(&delta).iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["Wrath", "Fear"]);
    }

    #[test]
    fn test_replay_reports_first_crossing_only() {
        let path = vec![
            entry("a", Delta::new().with("Hubris", 0.6)),
            entry("b", Delta::new().with("Fear", 0.2).with("Hubris", -0.6)),
            entry("c", Delta::new()),
            entry("d", Delta::new().with("Fear", 0.4)),
        ];
        let names: Vec<_> = replay(&path).iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["Hubris", "Fear"]);
        assert_eq!(replay(&path), replay(&path));
    }
}

//! Autoplay simulation.
//!
//! Play policies drive full sessions through the same [`PersonaGame`] the
//! host uses, so every run obeys the real clamping, milestone and archetype
//! rules. Runs are seeded; the same policy and seed always give the same
//! report.

use crate::game::{GameError, PersonaGame};
use crate::narrative::Narrative;
use crate::persist::{slot_path, PersistError};
use crate::scene::Scene;
use crate::traits::{Trait, TraitVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Magnitude at which an option counts as a major choice.
pub const MAJOR_WEIGHT: f64 = 0.8;

/// Delta magnitude the balanced policy aims for.
pub const BALANCED_TARGET: f64 = 0.35;

/// Traits above this magnitude count toward a run's top traits.
pub const TOP_TRAIT_FLOOR: f64 = 0.1;

const SCORE_EPSILON: f64 = 1e-9;

/// What a policy sees when asked to choose.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub scene: &'a Scene,
    pub traits: &'a TraitVector,
    /// Zero-based index of the choice being made.
    pub step: usize,
}

/// A strategy that picks an option index for each scene.
pub trait Policy {
    fn name(&self) -> &str;

    /// Index into `ctx.scene.options`. An index out of range fails the run.
    fn choose(&mut self, ctx: &PolicyContext<'_>, rng: &mut StdRng) -> usize;

    /// Forget per-run state before a new run.
    fn reset(&mut self) {}
}

/// Plays a fixed list of option ids, one per step.
///
/// Steps without a matching option pick the first option.
#[derive(Debug, Clone)]
pub struct Scripted {
    choices: Vec<String>,
}

impl Scripted {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl Policy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn choose(&mut self, ctx: &PolicyContext<'_>, _rng: &mut StdRng) -> usize {
        self.choices
            .get(ctx.step)
            .and_then(|id| ctx.scene.option_index(id))
            .unwrap_or(0)
    }
}

/// Rule-based policy that scores options by weighted trait preferences.
///
/// An option scores `sum(delta * prefer) - sum(delta * avoid)`. The best
/// score wins; ties are broken with the rng.
#[derive(Debug, Clone)]
pub struct TraitSeeking {
    name: String,
    prefer: Vec<(String, f64)>,
    avoid: Vec<(String, f64)>,
}

impl TraitSeeking {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefer: Vec::new(),
            avoid: Vec::new(),
        }
    }

    pub fn prefer(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.prefer.push((name.into(), weight));
        self
    }

    pub fn avoid(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.avoid.push((name.into(), weight));
        self
    }

    /// Bold, dominant play: strongly Hubris, mildly Control, away from Fear.
    pub fn hubris_forward() -> Self {
        Self::new("hubris_forward")
            .prefer("Hubris", 2.0)
            .prefer("Control", 1.0)
            .avoid("Fear", 1.0)
    }

    /// Grasping, two-faced play.
    pub fn deception_avarice() -> Self {
        Self::new("deception_avarice")
            .prefer("Deception", 2.0)
            .prefer("Avarice", 2.0)
    }

    /// Anxious, orderly play.
    pub fn control_fear() -> Self {
        Self::new("control_fear")
            .prefer("Control", 2.0)
            .prefer("Fear", 1.5)
            .avoid("Impulsivity", 1.0)
    }

    fn score(&self, scene: &Scene, index: usize) -> f64 {
        let weight = |table: &[(String, f64)], name: &str| {
            table
                .iter()
                .filter(|(t, _)| t == name)
                .map(|(_, w)| *w)
                .sum::<f64>()
        };
        scene.options[index]
            .delta
            .iter()
            .map(|(name, value)| {
                value * weight(&self.prefer, name.name()) - value * weight(&self.avoid, name.name())
            })
            .sum()
    }
}

impl Policy for TraitSeeking {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &PolicyContext<'_>, rng: &mut StdRng) -> usize {
        let scores: Vec<f64> = (0..ctx.scene.options.len())
            .map(|i| self.score(ctx.scene, i))
            .collect();
        let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = (0..scores.len())
            .filter(|&i| (scores[i] - best).abs() < SCORE_EPSILON)
            .collect();
        pick(&tied, rng)
    }
}

/// Uniform random play that favors options this policy has not taken yet and
/// never takes three major options in a row when it can avoid it.
///
/// The seen set outlives [`Policy::reset`], so a batch sharing one policy
/// spreads across the whole option space.
#[derive(Debug, Clone, Default)]
pub struct SeededRandom {
    seen: HashSet<(String, String)>,
    major_streak: usize,
}

impl SeededRandom {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Policy for SeededRandom {
    fn name(&self) -> &str {
        "seeded_random"
    }

    fn choose(&mut self, ctx: &PolicyContext<'_>, rng: &mut StdRng) -> usize {
        let options = &ctx.scene.options;
        let is_major = |i: usize| options[i].delta.max_magnitude() >= MAJOR_WEIGHT;

        let mut candidates: Vec<usize> = (0..options.len()).collect();
        if self.major_streak >= 2 {
            let minor: Vec<usize> = candidates.iter().copied().filter(|&i| !is_major(i)).collect();
            if !minor.is_empty() {
                candidates = minor;
            }
        }

        let unseen: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| {
                !self
                    .seen
                    .contains(&(ctx.scene.id.clone(), options[i].id.clone()))
            })
            .collect();
        let index = if unseen.is_empty() {
            pick(&candidates, rng)
        } else {
            pick(&unseen, rng)
        };

        if is_major(index) {
            self.major_streak += 1;
        } else {
            self.major_streak = 0;
        }
        self.seen
            .insert((ctx.scene.id.clone(), options[index].id.clone()));
        index
    }

    fn reset(&mut self) {
        self.major_streak = 0;
    }
}

/// Moderate play: options whose strongest push sits near
/// [`BALANCED_TARGET`], with an occasional decoy (an option with an empty
/// delta) to mimic human inconsistency.
#[derive(Debug, Clone)]
pub struct Balanced {
    decoy_chance: f64,
}

impl Balanced {
    pub fn new(decoy_chance: f64) -> Self {
        Self {
            decoy_chance: decoy_chance.clamp(0.0, 1.0),
        }
    }
}

impl Default for Balanced {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Policy for Balanced {
    fn name(&self) -> &str {
        "balanced"
    }

    fn choose(&mut self, ctx: &PolicyContext<'_>, rng: &mut StdRng) -> usize {
        let options = &ctx.scene.options;

        let decoys: Vec<usize> = (0..options.len())
            .filter(|&i| options[i].delta.is_empty())
            .collect();
        if !decoys.is_empty() && rng.gen::<f64>() < self.decoy_chance {
            return pick(&decoys, rng);
        }

        let distance = |i: usize| (BALANCED_TARGET - options[i].delta.max_magnitude()).abs();
        let best = (0..options.len())
            .map(distance)
            .fold(f64::INFINITY, f64::min);
        let tied: Vec<usize> = (0..options.len())
            .filter(|&i| (distance(i) - best).abs() < SCORE_EPSILON)
            .collect();
        pick(&tied, rng)
    }
}

fn pick(indices: &[usize], rng: &mut StdRng) -> usize {
    match indices {
        [] => 0,
        [only] => *only,
        _ => indices[rng.gen_range(0..indices.len())],
    }
}

/// One choice in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStep {
    pub step: usize,
    pub scene_id: String,
    pub option_id: String,
    pub milestones: Vec<Trait>,
    pub traits: TraitVector,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub seed: u64,
    pub policy: String,
    pub steps: Vec<RunStep>,
    pub traits: TraitVector,
    pub revealed: Vec<Trait>,
    pub archetype: String,
    /// Up to three strongest traits above [`TOP_TRAIT_FLOOR`].
    pub top_traits: Vec<Trait>,
}

/// Play one full session with `policy`.
pub fn run_policy(
    narrative: &Arc<Narrative>,
    policy: &mut dyn Policy,
    seed: u64,
) -> Result<RunReport, GameError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = PersonaGame::with_narrative(Arc::clone(narrative));
    policy.reset();

    let mut steps = Vec::new();
    while let Some(scene) = game.current_scene() {
        let step = game.session().cursor();
        let ctx = PolicyContext {
            scene,
            traits: game.session().traits(),
            step,
        };
        let index = policy.choose(&ctx, &mut rng);
        let scene_id = scene.id.clone();
        let option_id = scene
            .options
            .get(index)
            .map(|o| o.id.clone())
            .unwrap_or_default();

        let summary = game.apply_choice(&option_id)?;
        steps.push(RunStep {
            step,
            scene_id,
            option_id,
            milestones: summary.milestones,
            traits: game.session().traits().clone(),
        });
    }

    let traits = game.session().traits().clone();
    let top_traits = traits
        .dominant(3, TOP_TRAIT_FLOOR)
        .into_iter()
        .map(|(name, _)| name.clone())
        .collect();
    let report = RunReport {
        run_id: format!("run_{seed}"),
        seed,
        policy: policy.name().to_string(),
        archetype: game.resolve_archetype().name.clone(),
        revealed: game.revealed_milestones().to_vec(),
        steps,
        traits,
        top_traits,
    };

    tracing::debug!(
        target: "hamartia::telemetry",
        run = %report.run_id,
        policy = %report.policy,
        archetype = %report.archetype,
        "run.finished"
    );
    Ok(report)
}

#[derive(Serialize)]
struct SavedReport<'a> {
    timestamp: String,
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Write `report` as pretty JSON to `run_<policy>_<seed>.json` in `dir`,
/// creating the directory if needed. Returns the file path.
pub fn write_report(report: &RunReport, dir: impl AsRef<Path>) -> Result<PathBuf, PersistError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = slot_path(dir, &format!("run_{}_{}", report.policy, report.seed));

    let saved = SavedReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        report,
    };
    fs::write(&path, serde_json::to_string_pretty(&saved)?)?;

    tracing::debug!(
        target: "hamartia::telemetry",
        run = %report.run_id,
        path = %path.display(),
        "run.written"
    );
    Ok(path)
}

/// Run `policy` once per seed.
pub fn run_batch(
    narrative: &Arc<Narrative>,
    policy: &mut dyn Policy,
    seeds: impl IntoIterator<Item = u64>,
) -> Result<Vec<RunReport>, GameError> {
    seeds
        .into_iter()
        .map(|seed| run_policy(narrative, policy, seed))
        .collect()
}

/// Distinct (scene, option) pairs taken across runs.
pub fn choice_coverage(reports: &[RunReport]) -> BTreeSet<(String, String)> {
    reports
        .iter()
        .flat_map(|r| &r.steps)
        .map(|s| (s.scene_id.clone(), s.option_id.clone()))
        .collect()
}

/// Distinct scenes visited across runs.
pub fn scene_coverage(reports: &[RunReport]) -> BTreeSet<String> {
    reports
        .iter()
        .flat_map(|r| &r.steps)
        .map(|s| s.scene_id.clone())
        .collect()
}

/// Mean final value per trait, in the first report's trait order.
pub fn mean_traits(reports: &[RunReport]) -> Vec<(Trait, f64)> {
    let Some(first) = reports.first() else {
        return Vec::new();
    };
    let runs = reports.len() as f64;
    first
        .traits
        .iter()
        .map(|(name, _)| {
            let total: f64 = reports
                .iter()
                .filter_map(|r| r.traits.get(name.name()))
                .sum();
            (name.clone(), total / runs)
        })
        .collect()
}

/// How many runs ended in each archetype.
pub fn archetype_distribution(reports: &[RunReport]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for report in reports {
        *counts.entry(report.archetype.clone()).or_insert(0) += 1;
    }
    counts
}

/// Fraction of runs with `name` among their top traits.
pub fn top_trait_rate(reports: &[RunReport], name: &str) -> f64 {
    if reports.is_empty() {
        return 0.0;
    }
    let hits = reports
        .iter()
        .filter(|r| r.top_traits.iter().any(|t| t.name() == name))
        .count();
    hits as f64 / reports.len() as f64
}

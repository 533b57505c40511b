//! Run every autoplay policy over a batch of seeds and print coverage and
//! archetype metrics.
//!
//! Run with: `cargo run -p hamartia-core --example autoplay`
//! Set `HAMARTIA_NARRATIVE_PATH` to exercise another narrative. Each run is
//! written as JSON under the system temp dir in `hamartia_runs/`.

use hamartia_core::narrative::load_narrative_from_env;
use hamartia_core::simulate::{
    archetype_distribution, choice_coverage, mean_traits, run_batch, scene_coverage,
    top_trait_rate, write_report, Balanced, Policy, SeededRandom, TraitSeeking,
};

const RUNS: u64 = 50;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let narrative = load_narrative_from_env()?;
    let out_dir = std::env::temp_dir().join("hamartia_runs");
    let option_count: usize = narrative.scenes().iter().map(|s| s.options.len()).sum();

    let mut policies: Vec<Box<dyn Policy>> = vec![
        Box::new(SeededRandom::new()),
        Box::new(Balanced::default()),
        Box::new(TraitSeeking::hubris_forward()),
        Box::new(TraitSeeking::deception_avarice()),
        Box::new(TraitSeeking::control_fear()),
    ];

    for policy in policies.iter_mut() {
        let reports = run_batch(&narrative, policy.as_mut(), 0..RUNS)?;
        for report in &reports {
            write_report(report, &out_dir)?;
        }

        println!("\n=== {} ({} runs) ===", policy.name(), reports.len());
        println!(
            "   scenes visited: {}/{}",
            scene_coverage(&reports).len(),
            narrative.scenes().len()
        );
        println!(
            "   options taken:  {}/{}",
            choice_coverage(&reports).len(),
            option_count
        );

        println!("   archetypes:");
        for (name, count) in archetype_distribution(&reports) {
            println!("     {name:<32} {count}");
        }

        println!("   mean traits:");
        for (name, mean) in mean_traits(&reports) {
            if mean.abs() > 0.0 {
                println!(
                    "     {:<12} {mean:+.3}  (top-3 in {:.0}% of runs)",
                    name.name(),
                    top_trait_rate(&reports, name.name()) * 100.0
                );
            }
        }
    }

    println!("\nrun files written to {}", out_dir.display());
    Ok(())
}

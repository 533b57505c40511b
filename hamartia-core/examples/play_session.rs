//! Walk through the built-in narrative, saving and reloading halfway.
//!
//! Run with: `RUST_LOG=hamartia=debug cargo run -p hamartia-core --example play_session`

use hamartia_core::{GameConfig, PersonaGame};
use std::thread;

const CHOICES: [&str; 8] = [
    "wait", "dissect", "hum", "clever", "shadow", "walk_on", "buy_time", "sweep",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let save_dir = std::env::temp_dir().join("hamartia");
    let config = GameConfig::new().with_save_dir(&save_dir).quick_mode();
    let mut game = PersonaGame::new(config.clone())?;
    game.start_session();

    for (step, choice) in CHOICES.iter().enumerate() {
        if let Some(scene) = game.current_scene() {
            println!("\n{} - {}", scene.act, scene.title);
            println!("   {}", scene.subtitle);
            let label = scene
                .option(choice)
                .map(|o| o.label.as_str())
                .unwrap_or(*choice);
            println!("   > {label}");
        }

        let summary = game.apply_choice(choice)?;
        println!("   \"{}\"", summary.whisper);
        for echo in &summary.echoes {
            println!("   ~ {echo}");
        }
        for name in &summary.newly_revealed {
            println!("   * milestone: {name}");
        }

        if step == 3 {
            game.save()?;
            println!("\n-- saved to {} --", save_dir.display());

            let mut resumed = PersonaGame::new(config.clone())?;
            resumed.load()?;
            println!(
                "-- resumed at scene {} with {} milestones --",
                resumed.session().cursor(),
                resumed.revealed_milestones().len()
            );
            game = resumed;
        }

        thread::sleep(game.advance_delay());
    }

    let archetype = game.resolve_archetype();
    println!("\nYou are {}.", archetype.name);
    for line in &archetype.lines {
        println!("   {line}");
    }
    for memory in game.memories() {
        println!("   - {memory}");
    }

    game.reset()?;
    Ok(())
}

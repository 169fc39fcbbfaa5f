//! Basic demonstration of the Contagion simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set `RUST_LOG=contagion_sim=debug` for per-tick engine logs.

use contagion_sim::{AgeGroup, EpidemicConfig, PixelBuffer, QuarantineZone, Universe};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Contagion - Simulation Demo ===\n");

    let config = EpidemicConfig {
        quarantine: Some(QuarantineZone {
            x_min: 380.0,
            x_max: 420.0,
        }),
        ..Default::default()
    };
    let mut universe = Universe::with_config(800, 600, 5, config)?;

    // Children move a lot and rarely die; the elderly barely move but are fragile.
    universe.spawn_age_group(&AgeGroup::new(400, 1.6, 0.4, 0.005)?)?;
    universe.spawn_age_group(&AgeGroup::new(600, 1.0, 0.5, 0.02)?)?;
    universe.spawn_age_group(&AgeGroup::new(200, 0.4, 0.7, 0.15)?)?;

    println!("Initial state:");
    print_counts(&universe);

    let mut frame = PixelBuffer::new(800, 600);
    println!("\nRunning simulation for 1800 ticks (30 seconds at 60 ticks/sec)...\n");
    for _ in 0..1800 {
        universe.tick();
        universe.render(&mut frame);

        if universe.tick_count() % 180 == 0 {
            println!("--- Tick {} ---", universe.tick_count());
            print_counts(&universe);
        }
        if universe.infected() == 0 {
            println!("\nEpidemic over at tick {}", universe.tick_count());
            break;
        }
    }

    let background = universe.config().render.background;
    println!(
        "\nLast frame: {} of {} pixels covered by markers",
        frame.as_slice().len() - frame.count_color(background),
        frame.as_slice().len()
    );

    println!("\n=== Census history (every 300th sample, JSON) ===\n");
    let samples: Vec<_> = universe.history().iter().step_by(300).collect();
    println!("{}", serde_json::to_string_pretty(&samples)?);

    Ok(())
}

fn print_counts(universe: &Universe) {
    println!(
        "  susceptible={:<5} infected={:<5} removed={:<5} died={:<5} (total {})",
        universe.susceptible(),
        universe.infected(),
        universe.removed(),
        universe.died(),
        universe.population()
    );
}

// Headless runner: steps the simulation at a fixed dt and logs the population.
//
// Usage: hvz_sugar [config.json]
// Verbosity follows RUST_LOG (defaults to `info`).

use std::process::ExitCode;

use hvz_sugar::{SimConfig, Simulation};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };

    let dt = config.dt;
    let run_ticks = config.run_ticks;
    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let ticks_per_second = ((1.0 / dt).round() as u64).max(1);
    for tick in 1..=run_ticks {
        sim.tick(dt);
        if tick % ticks_per_second == 0 {
            log::info!(
                "t={:.1}s humans={} zombies={}",
                tick as f32 * dt,
                sim.human_count(),
                sim.zombie_count()
            );
        }
    }

    let stats = sim.stats();
    log::info!(
        "done: {} ticks, {} conversions, {} humans, {} zombies",
        stats.ticks,
        stats.conversions,
        sim.human_count(),
        sim.zombie_count()
    );
    ExitCode::SUCCESS
}

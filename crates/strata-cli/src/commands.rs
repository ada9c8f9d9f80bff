//! CLI command implementations.

use std::path::Path;

use strata_checkpoint::CheckpointManager;
use strata_driver::Simulation;
use strata_io::{validate_input, SimulationInput};
use strata_types::StrataResult;
use tracing::info;

/// Load a config, apply overrides, and run it.
pub fn run(config_path: &Path, workers: Option<usize>, resume: bool) -> StrataResult<()> {
    let mut input = SimulationInput::from_path(config_path)?;
    if let Some(n) = workers {
        input.analysis.workers = n;
    }
    if resume {
        input.analysis.resume = true;
    }

    println!("Strata Simulation");
    println!("─────────────────");
    println!("Config:   {}", config_path.display());
    println!("Workers:  {}", input.analysis.workers);
    println!("Steps:    {}", input.analysis.nsteps);
    println!();

    let sim = Simulation::from_input(input)?;
    info!(
        config = %config_path.display(),
        workers = sim.workers(),
        particles = sim.particles.len(),
        "Run started"
    );
    let summary = sim.run()?;
    info!(
        steps = summary.steps_run,
        final_step = ?summary.final_step,
        total_mass = summary.total_mass,
        "Run finished"
    );

    println!("Completed");
    if summary.resumed {
        println!("  Resumed at:    step {}", summary.start_step);
    }
    println!("  Steps run:     {}", summary.steps_run);
    println!("  Particles:     {}", summary.particle_count);
    println!("  Total mass:    {:.6e}", summary.total_mass);
    Ok(())
}

/// Print a checkpoint's header and particle statistics.
pub fn inspect(path: &Path) -> StrataResult<()> {
    println!("Strata Checkpoint Inspector");
    println!("───────────────────────────");
    println!();

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let snapshot = CheckpointManager::new(dir).read(path)?;

    println!("Format:       v{}", snapshot.format_version);
    println!("Step:         {}", snapshot.step);
    println!("Sim time:     {:.6e}s", snapshot.time);
    println!(
        "Mesh:         {} x {} cells",
        snapshot.mesh.nx, snapshot.mesh.ny
    );
    println!("Ranks:        {}", snapshot.nranks);
    println!("Particles:    {}", snapshot.particles.len());
    println!("Pending:      {}", snapshot.pending.len());

    if !snapshot.particles.is_empty() {
        let mass: f64 = snapshot.particles.iter().map(|p| p.mass).sum();
        let (min_y, max_y) = snapshot
            .particles
            .iter()
            .map(|p| p.position.y)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        println!("Mass:         {mass:.6e}");
        println!("Y range:      [{min_y:.4}, {max_y:.4}]");
    }
    Ok(())
}

/// Validate a config file.
pub fn validate(path: &Path) -> StrataResult<()> {
    println!("Strata Validator");
    println!("────────────────");
    println!();
    println!("Validating config: {}", path.display());

    let input = SimulationInput::from_path(path)?;
    validate_input(&input)?;
    println!(
        "Config is valid ({} x {} cells, {} materials, {} particle sets).",
        input.mesh.cells[0],
        input.mesh.cells[1],
        input.materials.len(),
        input.particle_sets.len()
    );
    Ok(())
}

//! Input validation.
//!
//! Catches invalid configuration before any worker starts, so that the
//! step loop never begins with an unusable setup.

use strata_types::{StrataError, StrataResult};
use tracing::warn;

use crate::contract::{AnalysisConfig, SimulationInput};

/// Validates a complete simulation input.
///
/// Checks:
/// - Analysis parameters (time step, Newmark parameters, damping, cadences, workers)
/// - Mesh dimensions and cell size
/// - Material parameters and material references
/// - Particle regions, constraints, and nodal forces against the mesh
pub fn validate_input(input: &SimulationInput) -> StrataResult<()> {
    validate_analysis(&input.analysis)?;
    input.scheme_config().validate()?;

    let mesh = input.build_mesh().map_err(|e| {
        StrataError::InvalidConfig(format!("Mesh: {e}"))
    })?;

    for (i, material) in input.materials.iter().enumerate() {
        material
            .validate()
            .map_err(|e| StrataError::InvalidConfig(format!("Material {i}: {e}")))?;
    }

    let (lo, hi) = (mesh.origin(), mesh.extent());
    for (i, set) in input.particle_sets.iter().enumerate() {
        if set.material as usize >= input.materials.len() {
            return Err(StrataError::InvalidConfig(format!(
                "Particle set {i} references material {} but {} are defined",
                set.material,
                input.materials.len()
            )));
        }
        if set.particles_per_cell == 0 {
            return Err(StrataError::InvalidConfig(format!(
                "Particle set {i}: particles_per_cell must be at least 1"
            )));
        }
        let empty = (0..2).any(|k| set.min[k] >= set.max[k]);
        let outside = (0..2).any(|k| set.max[k] <= lo[k] || set.min[k] >= hi[k]);
        if empty || outside {
            return Err(StrataError::InvalidConfig(format!(
                "Particle set {i} region {:?}..{:?} is empty or outside the mesh",
                set.min, set.max
            )));
        }
        if !(set.activation_time.is_finite() && set.activation_time >= 0.0) {
            return Err(StrataError::InvalidConfig(format!(
                "Particle set {i}: activation_time must be non-negative"
            )));
        }
    }

    input.boundary_conditions(&mesh).validate(&mesh)?;

    if input.analysis.workers > mesh.cell_count() {
        return Err(StrataError::InvalidConfig(format!(
            "{} workers exceed the {} mesh cells",
            input.analysis.workers,
            mesh.cell_count()
        )));
    }

    if input.checkpoint.every > 0 && input.checkpoint.directory.as_os_str().is_empty() {
        return Err(StrataError::InvalidConfig(
            "Checkpointing requires a directory".into(),
        ));
    }

    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> StrataResult<()> {
    if analysis.output_steps == 0 {
        return Err(StrataError::InvalidConfig(
            "output_steps must be >= 1".into(),
        ));
    }
    if analysis.workers == 0 {
        return Err(StrataError::InvalidConfig("workers must be >= 1".into()));
    }
    if analysis.interface {
        warn!("Interface handling is not supported; the flag is ignored");
    }
    Ok(())
}

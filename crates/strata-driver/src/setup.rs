//! Simulation setup from validated input.

use std::sync::Arc;

use strata_io::{validate_input, SimulationInput};
use strata_material::MaterialTable;
use strata_mesh::generators::seed_particles;
use strata_mesh::{BoundaryConditions, Mesh, Particle};
use strata_solver::SchemeConfig;
use strata_types::{StrataError, StrataResult};
use tracing::info;

use crate::cluster::run_cluster;
use crate::driver::{RunSummary, StepDriver};

/// Immutable run setup. Every worker builds its state from the same
/// `Simulation`, so seeded particle ids agree across ranks.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub input: SimulationInput,
    pub mesh: Arc<Mesh>,
    pub materials: MaterialTable,
    pub scheme: SchemeConfig,
    pub boundary: BoundaryConditions,
    /// Every seeded particle, live or scheduled, ordered by id.
    pub particles: Vec<Particle>,
}

impl Simulation {
    /// Validates `input` and seeds its particle sets.
    ///
    /// # Errors
    /// [`StrataError::InvalidConfig`] for any invalid option, including a
    /// particle set that yields no particles.
    pub fn from_input(input: SimulationInput) -> StrataResult<Self> {
        validate_input(&input)?;
        let mesh = Arc::new(input.build_mesh()?);
        let materials = input.material_table()?;
        let scheme = input.scheme_config();
        let boundary = input.boundary_conditions(&mesh);

        let mut particles = Vec::new();
        for (i, region) in input.seed_regions().iter().enumerate() {
            let model = materials.get(region.material)?;
            let seeded = seed_particles(&mesh, region, model, particles.len() as u64)?;
            if seeded.is_empty() {
                return Err(StrataError::InvalidConfig(format!(
                    "Particle set {i} produced no particles"
                )));
            }
            particles.extend(seeded);
        }

        info!(
            cells = mesh.cell_count(),
            nodes = mesh.node_count(),
            particles = particles.len(),
            materials = materials.len(),
            "Simulation set up"
        );
        Ok(Self {
            input,
            mesh,
            materials,
            scheme,
            boundary,
            particles,
        })
    }

    pub fn workers(&self) -> usize {
        self.input.analysis.workers
    }

    pub fn total_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    /// Runs on the configured number of workers.
    pub fn run(&self) -> StrataResult<RunSummary> {
        if self.workers() == 1 {
            StepDriver::single(self)?.run()
        } else {
            run_cluster(self, self.workers())
        }
    }
}

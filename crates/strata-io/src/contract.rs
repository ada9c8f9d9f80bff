//! Simulation input contract.
//!
//! A run is described by one TOML document:
//!
//! ```toml
//! [analysis]
//! dt = 1.0e-4
//! nsteps = 100
//! output_steps = 10
//! gravity = [0.0, -9.81]
//!
//! [mesh]
//! cell_size = [0.1, 0.1]
//! cells = [10, 10]
//!
//! [[materials]]
//! model = "linear_elastic"
//! youngs_modulus = 1.0e6
//! poisson_ratio = 0.3
//! density = 1000.0
//!
//! [[particle_sets]]
//! material = 0
//! min = [0.0, 0.0]
//! max = [0.5, 0.5]
//! particles_per_cell = 2
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_material::{Material, MaterialTable};
use strata_math::DVec2;
use strata_mesh::generators::SeedRegion;
use strata_mesh::{Axis, BoundaryConditions, Face, Mesh};
use strata_solver::{NewmarkParams, SchemeConfig, VelocityUpdate};
use strata_types::constants::{DEFAULT_NEWMARK_BETA, DEFAULT_NEWMARK_GAMMA, GRAVITY};
use strata_types::{MaterialId, NodeId, StrataError, StrataResult};

/// Complete input for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationInput {
    pub analysis: AnalysisConfig,
    pub mesh: MeshConfig,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub particle_sets: Vec<ParticleSetConfig>,
    #[serde(default)]
    pub constraints: Vec<ConstraintConfig>,
    #[serde(default)]
    pub nodal_forces: Vec<NodalForceConfig>,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which displacement solve phase 5 uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StiffnessKind {
    #[default]
    Explicit,
    /// Sparse Cholesky solve of the lumped-mass Newmark system.
    Sparse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub dt: f64,
    pub nsteps: u64,
    #[serde(default = "default_one")]
    pub output_steps: u64,
    /// Steps between redistributions; 0 disables them.
    #[serde(default)]
    pub nload_balance_steps: u64,
    #[serde(default)]
    pub resume: bool,
    /// Checkpoint to resume from; the latest when unset.
    #[serde(default)]
    pub resume_step: Option<u64>,
    #[serde(default)]
    pub pressure_smoothing: bool,
    /// Interface/contact handling. Accepted but not supported.
    #[serde(default)]
    pub interface: bool,
    #[serde(default = "default_beta")]
    pub newmark_beta: f64,
    #[serde(default = "default_gamma")]
    pub newmark_gamma: f64,
    #[serde(default)]
    pub damping_factor: f64,
    #[serde(default)]
    pub velocity_update: VelocityUpdate,
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 2],
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub stiffness: StiffnessKind,
}

fn default_one() -> u64 {
    1
}

fn default_workers() -> usize {
    1
}

fn default_beta() -> f64 {
    DEFAULT_NEWMARK_BETA
}

fn default_gamma() -> f64 {
    DEFAULT_NEWMARK_GAMMA
}

fn default_gravity() -> [f64; 2] {
    [0.0, -GRAVITY]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshConfig {
    #[serde(default)]
    pub origin: [f64; 2],
    pub cell_size: [f64; 2],
    /// Cell counts `[nx, ny]`.
    pub cells: [usize; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleSetConfig {
    /// Index into `materials`.
    pub material: u16,
    pub min: [f64; 2],
    pub max: [f64; 2],
    pub particles_per_cell: u32,
    #[serde(default)]
    pub velocity: [f64; 2],
    #[serde(default)]
    pub activation_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintConfig {
    pub face: Face,
    pub axis: Axis,
    #[serde(default)]
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodalForceConfig {
    pub node: u32,
    pub force: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointConfig {
    #[serde(default = "default_checkpoint_dir")]
    pub directory: PathBuf,
    /// Save after every `every` steps; 0 disables periodic saves.
    #[serde(default)]
    pub every: u64,
    /// Also save after the final step.
    #[serde(default)]
    pub at_end: bool,
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            directory: default_checkpoint_dir(),
            every: 0,
            at_end: false,
        }
    }
}

impl CheckpointConfig {
    /// Whether a checkpoint follows `step` of a run ending at `final_step`.
    pub fn due_after(&self, step: u64, final_step: u64) -> bool {
        (self.every > 0 && (step + 1) % self.every == 0) || (self.at_end && step == final_step)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for JSON particle snapshots; no files when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl SimulationInput {
    pub fn from_toml_str(text: &str) -> StrataResult<Self> {
        toml::from_str(text).map_err(|e| StrataError::InvalidConfig(e.to_string()))
    }

    pub fn from_path(path: &Path) -> StrataResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> StrataResult<String> {
        toml::to_string(self).map_err(|e| StrataError::Serialization(e.to_string()))
    }

    pub fn scheme_config(&self) -> SchemeConfig {
        let a = &self.analysis;
        SchemeConfig {
            newmark: NewmarkParams {
                beta: a.newmark_beta,
                gamma: a.newmark_gamma,
                dt: a.dt,
            },
            gravity: DVec2::from_array(a.gravity),
            damping_factor: a.damping_factor,
            velocity_update: a.velocity_update,
            pressure_smoothing: a.pressure_smoothing,
        }
    }

    pub fn build_mesh(&self) -> StrataResult<Mesh> {
        Mesh::structured(
            DVec2::from_array(self.mesh.origin),
            DVec2::from_array(self.mesh.cell_size),
            self.mesh.cells[0],
            self.mesh.cells[1],
        )
    }

    pub fn material_table(&self) -> StrataResult<MaterialTable> {
        MaterialTable::new(self.materials.clone())
    }

    pub fn boundary_conditions(&self, mesh: &Mesh) -> BoundaryConditions {
        let mut bc = BoundaryConditions::new();
        for c in &self.constraints {
            bc.constrain_face(mesh, c.face, c.axis, c.velocity);
        }
        for f in &self.nodal_forces {
            bc.add_nodal_force(NodeId(f.node), DVec2::from_array(f.force));
        }
        bc
    }

    pub fn seed_regions(&self) -> Vec<SeedRegion> {
        self.particle_sets
            .iter()
            .map(|s| SeedRegion {
                min: DVec2::from_array(s.min),
                max: DVec2::from_array(s.max),
                particles_per_cell: s.particles_per_cell,
                material: MaterialId(s.material),
                velocity: DVec2::from_array(s.velocity),
                activation_time: s.activation_time,
            })
            .collect()
    }
}

//! Material point state and its per-particle capability operations.
//!
//! The integration scheme drives each particle through
//! [`compute_strain`](Particle::compute_strain),
//! [`update_volume`](Particle::update_volume) and
//! [`compute_stress`](Particle::compute_stress) once per step;
//! [`compute_mass`](Particle::compute_mass) runs at creation.
//! Each operation reports non-physical results as
//! [`StrataError::NumericalFailure`].

use serde::{Deserialize, Serialize};
use strata_material::{ConstitutiveModel, MaterialState};
use strata_math::{DMat2, DVec2, SymTensor};
use strata_types::{CellId, MaterialId, ParticleId, StrataError, StrataResult};

use crate::mesh::Mesh;
use crate::node::Node;
use crate::shapefn::ShapeData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    pub material: MaterialId,

    pub position: DVec2,
    pub velocity: DVec2,
    pub acceleration: DVec2,
    /// Cumulative displacement since creation.
    pub displacement: DVec2,

    pub mass: f64,
    pub volume: f64,

    pub stress: SymTensor,
    pub strain: SymTensor,
    /// Strain increment of the last step.
    pub dstrain: SymTensor,

    /// Owning cell; `None` until first located.
    pub cell: Option<CellId>,
    /// Simulation time at which the particle joins the computation.
    pub activation_time: f64,
    /// Internal variables of the material model.
    pub state: MaterialState,

    /// Shape functions at the start-of-step position. Recomputed every step.
    #[serde(skip)]
    pub shape: Option<ShapeData>,
}

impl Particle {
    pub fn new(
        id: ParticleId,
        material: MaterialId,
        position: DVec2,
        volume: f64,
        state: MaterialState,
    ) -> Self {
        Self {
            id,
            material,
            position,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            displacement: DVec2::ZERO,
            mass: 0.0,
            volume,
            stress: SymTensor::ZERO,
            strain: SymTensor::ZERO,
            dstrain: SymTensor::ZERO,
            cell: None,
            activation_time: 0.0,
            state,
            shape: None,
        }
    }

    fn failure(&self, reason: impl Into<String>) -> StrataError {
        StrataError::NumericalFailure {
            particle: self.id,
            reason: reason.into(),
        }
    }

    /// Mass from density and current volume.
    pub fn compute_mass(&mut self, density: f64) -> StrataResult<()> {
        if !(density > 0.0 && density.is_finite()) {
            return Err(self.failure(format!("non-positive density {density}")));
        }
        if !(self.volume > 0.0 && self.volume.is_finite()) {
            return Err(self.failure(format!("non-positive volume {}", self.volume)));
        }
        self.mass = density * self.volume;
        Ok(())
    }

    /// Resolve the owning cell from the current position.
    pub fn locate(&mut self, mesh: &Mesh) -> StrataResult<CellId> {
        match mesh.locate(self.position) {
            Some(cell) => {
                self.cell = Some(cell);
                Ok(cell)
            }
            None => Err(StrataError::ParticleOutsideMesh {
                particle: self.id,
                x: self.position.x,
                y: self.position.y,
            }),
        }
    }

    /// Owning cell, or an error if the particle was never located.
    pub fn owning_cell(&self) -> StrataResult<CellId> {
        self.cell
            .ok_or_else(|| self.failure("particle has no owning cell"))
    }

    /// Evaluate and cache shape functions in the owning cell.
    pub fn compute_shape_functions(&mut self, mesh: &Mesh) -> StrataResult<()> {
        let cell = self.owning_cell()?;
        self.shape = Some(mesh.shape_data(cell, self.position));
        Ok(())
    }

    /// Cached shape functions.
    pub fn shape(&self) -> StrataResult<&ShapeData> {
        self.shape
            .as_ref()
            .ok_or_else(|| self.failure("shape functions not computed"))
    }

    /// Strain increment from nodal velocities: `dε = sym(Σ v_I ⊗ ∇N_I)·Δt`.
    pub fn compute_strain(&mut self, mesh: &Mesh, nodes: &[Node], dt: f64) -> StrataResult<()> {
        let cell = mesh.cell(self.owning_cell()?)?;
        let shape = *self.shape()?;

        let mut col_x = DVec2::ZERO;
        let mut col_y = DVec2::ZERO;
        for (k, node_id) in cell.nodes.iter().enumerate() {
            let v = nodes[node_id.index()].velocity;
            col_x += v * shape.gradients[k].x;
            col_y += v * shape.gradients[k].y;
        }
        let gradient = DMat2::from_cols(col_x, col_y);

        let dstrain = SymTensor::symmetric_part(gradient) * dt;
        if !dstrain.is_finite() {
            return Err(self.failure("non-finite strain increment"));
        }
        self.dstrain = dstrain;
        self.strain += dstrain;
        Ok(())
    }

    /// Volume update from the volumetric strain increment.
    pub fn update_volume(&mut self) -> StrataResult<()> {
        let volume = self.volume * (1.0 + self.dstrain.trace());
        if !(volume > 0.0 && volume.is_finite()) {
            return Err(self.failure(format!("degenerate volume {volume}")));
        }
        self.volume = volume;
        Ok(())
    }

    /// Stress update through the particle's constitutive model.
    pub fn compute_stress(&mut self, model: &dyn ConstitutiveModel, dt: f64) -> StrataResult<()> {
        let stress = model.compute_stress(&self.stress, &self.dstrain, &mut self.state, dt)?;
        if !stress.is_finite() {
            return Err(self.failure(format!("non-finite stress from {}", model.name())));
        }
        self.stress = stress;
        Ok(())
    }

    /// Current density `m / V`.
    pub fn density(&self) -> f64 {
        self.mass / self.volume
    }
}

//! Checkpoint snapshot format.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strata_mesh::mesh::MeshFingerprint;
use strata_mesh::{BoundaryConditions, Mesh, Particle};
use strata_types::constants::{CHECKPOINT_FORMAT_VERSION, CHECKPOINT_MAGIC};
use strata_types::{Rank, StrataError, StrataResult};

/// Everything needed to continue a run after step `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    pub format_version: u32,
    /// Last completed step.
    pub step: u64,
    /// Simulation time at the end of `step`.
    pub time: f64,
    pub mesh: MeshFingerprint,
    /// Rank count of the run that wrote the checkpoint.
    pub nranks: u32,
    pub cell_rank: Vec<Rank>,
    /// Live particles, ordered by id.
    pub particles: Vec<Particle>,
    /// Scheduled particles not yet activated.
    pub pending: Vec<Particle>,
    pub boundary: BoundaryConditions,
}

impl CheckpointSnapshot {
    /// Magic header followed by the bincode payload.
    pub fn to_bytes(&self) -> StrataResult<Vec<u8>> {
        let payload =
            bincode::serialize(self).map_err(|e| StrataError::Serialization(e.to_string()))?;
        let mut bytes = Vec::with_capacity(CHECKPOINT_MAGIC.len() + payload.len());
        bytes.extend_from_slice(&CHECKPOINT_MAGIC);
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    pub fn from_bytes(data: &[u8]) -> StrataResult<Self> {
        let payload = data
            .strip_prefix(CHECKPOINT_MAGIC.as_slice())
            .ok_or_else(|| StrataError::Checkpoint("Missing checkpoint header".into()))?;
        let snapshot: Self = bincode::deserialize(payload)
            .map_err(|e| StrataError::Checkpoint(format!("Corrupt checkpoint: {e}")))?;
        if snapshot.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(StrataError::Checkpoint(format!(
                "Unsupported checkpoint version {} (expected {CHECKPOINT_FORMAT_VERSION})",
                snapshot.format_version
            )));
        }
        Ok(snapshot)
    }

    /// Checks the snapshot against the mesh it is restored into.
    pub fn validate(&self, mesh: &Mesh) -> StrataResult<()> {
        if self.mesh != mesh.fingerprint() {
            return Err(StrataError::Checkpoint(format!(
                "Checkpoint mesh {:?} does not match {:?}",
                self.mesh,
                mesh.fingerprint()
            )));
        }
        if self.cell_rank.len() != mesh.cell_count() {
            return Err(StrataError::Checkpoint(format!(
                "Partition table covers {} cells, mesh has {}",
                self.cell_rank.len(),
                mesh.cell_count()
            )));
        }
        if self.nranks == 0 || self.cell_rank.iter().any(|r| r.0 >= self.nranks) {
            return Err(StrataError::Checkpoint(
                "Partition table references unknown ranks".into(),
            ));
        }

        let mut ids = HashSet::with_capacity(self.particles.len() + self.pending.len());
        for p in self.particles.iter().chain(&self.pending) {
            if !ids.insert(p.id) {
                return Err(StrataError::Checkpoint(format!("Duplicate {}", p.id)));
            }
        }
        for p in &self.particles {
            match p.cell {
                Some(cell) if cell.index() < mesh.cell_count() && mesh.contains(cell, p.position) => {}
                _ => {
                    return Err(StrataError::Checkpoint(format!(
                        "{} is not inside its recorded cell",
                        p.id
                    )))
                }
            }
        }
        self.boundary
            .validate(mesh)
            .map_err(|e| StrataError::Checkpoint(e.to_string()))
    }
}

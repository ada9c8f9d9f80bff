//! Checkpoint save and resume.

use std::fs;
use std::path::{Path, PathBuf};

use strata_mesh::Particle;
use strata_partition::collectives::{self, decode, encode};
use strata_partition::{Domain, Partition};
use strata_types::constants::CHECKPOINT_FORMAT_VERSION;
use strata_types::{StrataError, StrataResult};
use tracing::{info, warn};

use crate::snapshot::CheckpointSnapshot;

/// State recovered by [`CheckpointManager::resume`] besides the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    /// Last completed step; the run continues at `step + 1`.
    pub step: u64,
    pub time: f64,
    pub pending: Vec<Particle>,
}

/// Reads and writes `checkpoint_<step>.bin` files in one directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    directory: PathBuf,
}

impl CheckpointManager {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, step: u64) -> PathBuf {
        self.directory.join(format!("checkpoint_{step:08}.bin"))
    }

    /// Steps with a checkpoint file, ascending.
    pub fn available_steps(&self) -> StrataResult<Vec<u64>> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }
        let mut steps = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let name = entry?.file_name();
            let step = name
                .to_str()
                .and_then(|n| n.strip_prefix("checkpoint_"))
                .and_then(|n| n.strip_suffix(".bin"))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(step) = step {
                steps.push(step);
            }
        }
        steps.sort_unstable();
        Ok(steps)
    }

    pub fn latest_step(&self) -> StrataResult<Option<u64>> {
        Ok(self.available_steps()?.last().copied())
    }

    /// Reads a checkpoint file without validating it against a mesh.
    pub fn read(&self, path: &Path) -> StrataResult<CheckpointSnapshot> {
        let bytes = fs::read(path).map_err(|e| {
            StrataError::Checkpoint(format!("Cannot read {}: {e}", path.display()))
        })?;
        CheckpointSnapshot::from_bytes(&bytes)
    }

    fn write(&self, snapshot: &CheckpointSnapshot) -> StrataResult<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(snapshot.step);
        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, snapshot.to_bytes()?)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Saves the state after `step`. Collective.
    ///
    /// The root gathers every owned particle and writes the file. All
    /// ranks return the same outcome; a failed write is reported as
    /// [`StrataError::Checkpoint`] everywhere.
    pub fn save(
        &self,
        domain: &Domain,
        step: u64,
        time: f64,
        pending: &[Particle],
    ) -> StrataResult<PathBuf> {
        let gathered = domain.gather_particles()?;
        let path = self.path_for(step);

        let outcome = match gathered {
            Some(particles) => {
                let snapshot = CheckpointSnapshot {
                    format_version: CHECKPOINT_FORMAT_VERSION,
                    step,
                    time,
                    mesh: domain.mesh().fingerprint(),
                    nranks: domain.size() as u32,
                    cell_rank: domain.partition().cell_rank().to_vec(),
                    particles,
                    pending: pending.to_vec(),
                    boundary: domain.boundary().clone(),
                };
                let result = self.write(&snapshot).map_err(|e| e.to_string());
                Some(encode(&result.map(|_| ()))?)
            }
            None => None,
        };
        let result: Result<(), String> = decode(&collectives::broadcast(domain.comm(), outcome)?)?;

        match result {
            Ok(()) => {
                if domain.rank().is_root() {
                    info!(step, path = %path.display(), "Checkpoint saved");
                }
                Ok(path)
            }
            Err(message) => Err(StrataError::Checkpoint(format!(
                "Saving {} failed: {message}",
                path.display()
            ))),
        }
    }

    /// Loads and validates a checkpoint on the root.
    fn load(&self, step: Option<u64>, domain: &Domain) -> StrataResult<CheckpointSnapshot> {
        let step = match step {
            Some(step) => step,
            None => self.latest_step()?.ok_or_else(|| {
                StrataError::Checkpoint(format!(
                    "No checkpoint in {}",
                    self.directory.display()
                ))
            })?,
        };
        let snapshot = self.read(&self.path_for(step))?;
        if snapshot.step != step {
            return Err(StrataError::Checkpoint(format!(
                "File for step {step} holds step {}",
                snapshot.step
            )));
        }
        snapshot.validate(domain.mesh())?;
        Ok(snapshot)
    }

    /// Restores the requested (or latest) checkpoint into `domain`.
    /// Collective.
    ///
    /// Returns `Ok(None)` after logging a warning when no usable
    /// checkpoint exists; the caller then cold-starts. The saved cell
    /// assignment is adopted when the rank count matches; otherwise the
    /// root takes every cell and the caller's decomposition spreads them.
    pub fn resume(&self, domain: &mut Domain, step: Option<u64>) -> StrataResult<Option<Restored>> {
        let payload = if domain.rank().is_root() {
            let loaded = match self.load(step, domain) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(directory = %self.directory.display(), error = %e, "Resume failed, cold start");
                    None
                }
            };
            Some(encode(&loaded)?)
        } else {
            None
        };
        let loaded: Option<CheckpointSnapshot> =
            decode(&collectives::broadcast(domain.comm(), payload)?)?;
        let Some(snapshot) = loaded else {
            return Ok(None);
        };

        let size = domain.size();
        let partition = if snapshot.nranks as usize == size {
            Partition::from_table(snapshot.cell_rank, size)?
        } else {
            info!(
                saved = snapshot.nranks,
                current = size,
                "Rank count changed, redistributing from root"
            );
            Partition::single(domain.mesh().cell_count(), size)
        };

        let me = domain.rank();
        let owned: Vec<Particle> = snapshot
            .particles
            .into_iter()
            .filter(|p| p.cell.is_some_and(|c| partition.owner(c) == me))
            .collect();

        domain.set_boundary(snapshot.boundary)?;
        domain.set_partition(partition);
        domain.replace_particles(owned);

        if me.is_root() {
            info!(step = snapshot.step, "Resumed from checkpoint");
        }
        Ok(Some(Restored {
            step: snapshot.step,
            time: snapshot.time,
            pending: snapshot.pending,
        }))
    }
}

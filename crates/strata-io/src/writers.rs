//! Artifact writers.
//!
//! On every output step the driver builds one [`OutputSnapshot`] per rank
//! and hands the same snapshot to each registered writer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use strata_math::SymTensor;
use strata_mesh::Particle;
use strata_types::{Rank, StrataError, StrataResult};

/// Read-only view of one rank's state at an output step.
#[derive(Debug, Clone, Copy)]
pub struct OutputSnapshot<'a> {
    pub step: u64,
    pub time: f64,
    pub rank: Rank,
    pub particles: &'a [Particle],
}

impl OutputSnapshot<'_> {
    pub fn mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }
}

pub trait ArtifactWriter: Send {
    fn write(&mut self, snapshot: &OutputSnapshot<'_>) -> StrataResult<()>;

    /// Called once after the last step.
    fn finish(&mut self) -> StrataResult<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct ParticleRecord {
    id: u64,
    material: u16,
    position: [f64; 2],
    velocity: [f64; 2],
    stress: SymTensor,
    volume: f64,
    mass: f64,
    cell: Option<u32>,
}

#[derive(Serialize)]
struct ParticleFile<'a> {
    step: u64,
    time: f64,
    rank: u32,
    particles: &'a [ParticleRecord],
}

/// Writes `particles_r<rank>_<step>.json` files.
#[derive(Debug, Clone)]
pub struct JsonParticleWriter {
    directory: PathBuf,
}

impl JsonParticleWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, rank: Rank, step: u64) -> PathBuf {
        self.directory
            .join(format!("particles_r{}_{step:08}.json", rank.0))
    }
}

impl ArtifactWriter for JsonParticleWriter {
    fn write(&mut self, snapshot: &OutputSnapshot<'_>) -> StrataResult<()> {
        let records: Vec<ParticleRecord> = snapshot
            .particles
            .iter()
            .map(|p| ParticleRecord {
                id: p.id.0,
                material: p.material.0,
                position: p.position.to_array(),
                velocity: p.velocity.to_array(),
                stress: p.stress,
                volume: p.volume,
                mass: p.mass,
                cell: p.cell.map(|c| c.0),
            })
            .collect();
        let file = ParticleFile {
            step: snapshot.step,
            time: snapshot.time,
            rank: snapshot.rank.0,
            particles: &records,
        };
        fs::create_dir_all(&self.directory)?;
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| StrataError::Serialization(e.to_string()))?;
        fs::write(self.path_for(snapshot.rank, snapshot.step), json)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json_particles"
    }
}

/// One write seen by a [`MemoryWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub step: u64,
    pub rank: Rank,
    pub particles: usize,
    pub mass: f64,
}

/// Records a summary of every snapshot. Clones share the record list.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    records: Arc<Mutex<Vec<OutputRecord>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<OutputRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn steps(&self) -> Vec<u64> {
        self.records().into_iter().map(|r| r.step).collect()
    }
}

impl ArtifactWriter for MemoryWriter {
    fn write(&mut self, snapshot: &OutputSnapshot<'_>) -> StrataResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(OutputRecord {
                step: snapshot.step,
                rank: snapshot.rank,
                particles: snapshot.particles.len(),
                mass: snapshot.mass(),
            });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

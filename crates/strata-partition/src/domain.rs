//! The per-rank computational domain.
//!
//! Each rank holds the full mesh and node array, the particles in the
//! cells it owns, and read-only halo replicas of particles in
//! neighbouring cells owned elsewhere. Nodal accumulation over owned plus
//! halo particles makes every node touching an owned cell complete
//! without a nodal reduction.

use std::sync::Arc;

use strata_mesh::generators::create_nodes;
use strata_mesh::{BoundaryConditions, CellGraph, Mesh, Node, Particle};
use strata_types::{Rank, StrataResult};
use tracing::{debug, info};

use crate::collectives::{self, decode, encode};
use crate::comm::Communicator;
use crate::decompose::decompose_graph;
use crate::partition::Partition;

/// Particle counts moved by one exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeReport {
    pub sent: usize,
    pub received: usize,
}

/// Outcome of a (re)decomposition on this rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedistributionReport {
    pub owned_cells: usize,
    pub owned_particles: usize,
    pub migration: ExchangeReport,
    pub halo: ExchangeReport,
}

/// Disjoint borrows handed to the integration scheme for one step.
pub struct DomainParts<'a> {
    pub mesh: &'a Mesh,
    pub nodes: &'a mut [Node],
    pub particles: &'a mut [Particle],
    pub halo: &'a [Particle],
}

pub struct Domain {
    mesh: Arc<Mesh>,
    graph: CellGraph,
    nodes: Vec<Node>,
    particles: Vec<Particle>,
    halo: Vec<Particle>,
    partition: Partition,
    boundary: BoundaryConditions,
    comm: Box<dyn Communicator>,
}

impl Domain {
    /// Creates a domain in which the root owns every cell.
    pub fn new(
        mesh: Arc<Mesh>,
        boundary: BoundaryConditions,
        comm: Box<dyn Communicator>,
    ) -> StrataResult<Self> {
        boundary.validate(&mesh)?;
        let graph = CellGraph::build(&mesh);
        let mut nodes = create_nodes(&mesh);
        boundary.apply(&mut nodes);
        let partition = Partition::single(mesh.cell_count(), comm.size());
        Ok(Self {
            mesh,
            graph,
            nodes,
            particles: Vec::new(),
            halo: Vec::new(),
            partition,
            boundary,
            comm,
        })
    }

    // ─── Accessors ───────────────────────────────────────────

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn graph(&self) -> &CellGraph {
        &self.graph
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn halo(&self) -> &[Particle] {
        &self.halo
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn boundary(&self) -> &BoundaryConditions {
        &self.boundary
    }

    pub fn comm(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    pub fn rank(&self) -> Rank {
        self.comm.rank()
    }

    pub fn size(&self) -> usize {
        self.comm.size()
    }

    pub fn parts_mut(&mut self) -> DomainParts<'_> {
        DomainParts {
            mesh: &self.mesh,
            nodes: &mut self.nodes,
            particles: &mut self.particles,
            halo: &self.halo,
        }
    }

    // ─── Population ──────────────────────────────────────────

    /// Replaces the boundary set on every node.
    pub fn set_boundary(&mut self, boundary: BoundaryConditions) -> StrataResult<()> {
        boundary.validate(&self.mesh)?;
        boundary.apply(&mut self.nodes);
        self.boundary = boundary;
        Ok(())
    }

    /// Adopts a cell assignment without moving particles.
    pub fn set_partition(&mut self, partition: Partition) {
        self.partition = partition;
    }

    /// Replaces the owned particle set; the halo is cleared.
    pub fn replace_particles(&mut self, mut particles: Vec<Particle>) {
        particles.sort_by_key(|p| p.id);
        self.particles = particles;
        self.halo.clear();
    }

    /// Adds the particles whose cell this rank owns and drops the rest.
    ///
    /// Every rank is expected to pass the same candidates, so each
    /// particle is kept by exactly one rank. Returns the number kept.
    pub fn insert_owned(&mut self, candidates: Vec<Particle>) -> StrataResult<usize> {
        let me = self.rank();
        let mut kept = 0;
        for mut p in candidates {
            let cell = p.locate(&self.mesh)?;
            if self.partition.owner(cell) == me {
                self.particles.push(p);
                kept += 1;
            }
        }
        self.particles.sort_by_key(|p| p.id);
        Ok(kept)
    }

    // ─── Decomposition and exchange ─────────────────────────

    /// Recomputes the cell assignment from the current particle
    /// distribution and moves particles to their new owners.
    ///
    /// With `initial`, every locally held particle is located first.
    /// Collective: every rank must call it.
    pub fn decompose(&mut self, initial: bool) -> StrataResult<RedistributionReport> {
        if initial {
            for p in &mut self.particles {
                p.locate(&self.mesh)?;
            }
        }

        let mut counts = vec![0u64; self.mesh.cell_count()];
        for p in &self.particles {
            counts[p.owning_cell()?.index()] += 1;
        }
        let global = collectives::all_reduce_sum_u64(self.comm.as_ref(), &counts)?;
        let weights: Vec<u64> = global.iter().map(|c| c + 1).collect();

        self.partition = decompose_graph(&self.graph, &weights, self.size())?;

        let migration = self.transfer_particles()?;
        let halo = self.transfer_halo_particles()?;
        let me = self.rank();
        let report = RedistributionReport {
            owned_cells: self.partition.cell_counts()[me.index()],
            owned_particles: self.particles.len(),
            migration,
            halo,
        };
        info!(
            rank = me.0,
            cells = report.owned_cells,
            halo_cells = self.partition.halo_cells(&self.graph, me).len(),
            particles = report.owned_particles,
            sent = migration.sent,
            received = migration.received,
            "Domain decomposed"
        );
        Ok(report)
    }

    /// Moves every particle whose owning cell belongs to another rank.
    ///
    /// Particles must already be located. Collective.
    pub fn transfer_particles(&mut self) -> StrataResult<ExchangeReport> {
        let me = self.rank();
        let size = self.size();
        let mut outgoing: Vec<Vec<Particle>> = vec![Vec::new(); size];
        let mut staying = Vec::with_capacity(self.particles.len());
        for p in std::mem::take(&mut self.particles) {
            let owner = self.partition.owner(p.owning_cell()?);
            if owner == me {
                staying.push(p);
            } else {
                outgoing[owner.index()].push(p);
            }
        }

        let sent = outgoing.iter().map(Vec::len).sum();
        let payloads = outgoing
            .iter()
            .map(|batch| encode(batch))
            .collect::<StrataResult<Vec<_>>>()?;
        let incoming = collectives::all_to_all(self.comm.as_ref(), payloads)?;

        let mut received = 0;
        for (r, bytes) in incoming.iter().enumerate() {
            if r == me.index() {
                continue;
            }
            let batch: Vec<Particle> = decode(bytes)?;
            received += batch.len();
            staying.extend(batch);
        }
        staying.sort_by_key(|p| p.id);
        self.particles = staying;

        if sent > 0 || received > 0 {
            debug!(rank = me.0, sent, received, "Particles migrated");
        }
        Ok(ExchangeReport { sent, received })
    }

    /// Overwrites the halo with fresh copies of neighbouring ranks'
    /// boundary-cell particles and waits for every rank. Collective.
    ///
    /// Shape functions of the received replicas are evaluated on arrival;
    /// the replicas are not modified afterwards.
    pub fn transfer_halo_particles(&mut self) -> StrataResult<ExchangeReport> {
        let me = self.rank();
        let size = self.size();
        let mut outgoing: Vec<Vec<&Particle>> = vec![Vec::new(); size];
        for p in &self.particles {
            let cell = p.owning_cell()?;
            for r in self.partition.neighbour_ranks(&self.graph, cell) {
                outgoing[r.index()].push(p);
            }
        }

        let sent = outgoing.iter().map(Vec::len).sum();
        let mut payloads = Vec::with_capacity(size);
        for (r, batch) in outgoing.iter().enumerate() {
            payloads.push(if r == me.index() {
                Vec::new()
            } else {
                encode(batch)?
            });
        }
        let incoming = collectives::all_to_all(self.comm.as_ref(), payloads)?;

        let mut halo = Vec::new();
        for (r, bytes) in incoming.iter().enumerate() {
            if r == me.index() {
                continue;
            }
            let batch: Vec<Particle> = decode(bytes)?;
            halo.extend(batch);
        }
        for p in &mut halo {
            p.compute_shape_functions(&self.mesh)?;
        }
        halo.sort_by_key(|p| p.id);
        let received = halo.len();
        self.halo = halo;

        self.comm.barrier()?;
        Ok(ExchangeReport { sent, received })
    }

    /// Migration followed by a halo refresh.
    pub fn synchronize(&mut self) -> StrataResult<(ExchangeReport, ExchangeReport)> {
        let migration = self.transfer_particles()?;
        let halo = self.transfer_halo_particles()?;
        Ok((migration, halo))
    }

    // ─── Global queries (collective) ─────────────────────────

    pub fn local_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    pub fn global_mass(&self) -> StrataResult<f64> {
        collectives::all_reduce_sum_f64(self.comm.as_ref(), self.local_mass())
    }

    pub fn global_particle_count(&self) -> StrataResult<u64> {
        let total =
            collectives::all_reduce_sum_u64(self.comm.as_ref(), &[self.particles.len() as u64])?;
        Ok(total[0])
    }

    /// Every rank's owned particles on the root, sorted by id.
    pub fn gather_particles(&self) -> StrataResult<Option<Vec<Particle>>> {
        let gathered = collectives::gather(self.comm.as_ref(), encode(&self.particles)?)?;
        let Some(parts) = gathered else {
            return Ok(None);
        };
        let mut all = Vec::new();
        for bytes in &parts {
            let batch: Vec<Particle> = decode(bytes)?;
            all.extend(batch);
        }
        all.sort_by_key(|p| p.id);
        Ok(Some(all))
    }
}

/// Walks two id-sorted particle slices as one ascending sequence.
pub fn merge_by_id<'a>(
    owned: &'a [Particle],
    halo: &'a [Particle],
) -> impl Iterator<Item = &'a Particle> + 'a {
    let mut a = owned.iter().peekable();
    let mut b = halo.iter().peekable();
    std::iter::from_fn(move || match (a.peek(), b.peek()) {
        (Some(x), Some(y)) => {
            if x.id <= y.id {
                a.next()
            } else {
                b.next()
            }
        }
        (Some(_), None) => a.next(),
        (None, Some(_)) => b.next(),
        (None, None) => None,
    })
}

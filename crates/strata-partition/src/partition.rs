//! Cell-to-rank assignment.

use serde::{Deserialize, Serialize};
use strata_mesh::CellGraph;
use strata_types::{CellId, Rank, StrataError, StrataResult};

/// Owner of every cell. Identical on all ranks after each decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    nranks: u32,
    cell_rank: Vec<Rank>,
}

impl Partition {
    /// Every cell owned by the root.
    pub fn single(ncells: usize, nranks: usize) -> Self {
        Self {
            nranks: nranks as u32,
            cell_rank: vec![Rank::ROOT; ncells],
        }
    }

    /// Builds a partition from an explicit table, checking rank bounds.
    pub fn from_table(cell_rank: Vec<Rank>, nranks: usize) -> StrataResult<Self> {
        if let Some((c, r)) = cell_rank
            .iter()
            .enumerate()
            .find(|(_, r)| r.index() >= nranks)
        {
            return Err(StrataError::Decomposition(format!(
                "{} assigned to {r}, but only {nranks} ranks exist",
                CellId(c as u32)
            )));
        }
        Ok(Self {
            nranks: nranks as u32,
            cell_rank,
        })
    }

    pub fn nranks(&self) -> usize {
        self.nranks as usize
    }

    pub fn cell_count(&self) -> usize {
        self.cell_rank.len()
    }

    #[inline]
    pub fn owner(&self, cell: CellId) -> Rank {
        self.cell_rank[cell.index()]
    }

    pub fn cell_rank(&self) -> &[Rank] {
        &self.cell_rank
    }

    pub fn owned_cells(&self, rank: Rank) -> Vec<CellId> {
        self.cell_rank
            .iter()
            .enumerate()
            .filter(|(_, &r)| r == rank)
            .map(|(c, _)| CellId(c as u32))
            .collect()
    }

    /// Owned cell count per rank.
    pub fn cell_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nranks()];
        for r in &self.cell_rank {
            counts[r.index()] += 1;
        }
        counts
    }

    /// Ranks other than the owner that own a neighbour of `cell`,
    /// ascending and deduplicated.
    pub fn neighbour_ranks(&self, graph: &CellGraph, cell: CellId) -> Vec<Rank> {
        let owner = self.owner(cell);
        let mut ranks: Vec<Rank> = graph
            .neighbours(cell.index())
            .iter()
            .map(|&nb| self.cell_rank[nb as usize])
            .filter(|&r| r != owner)
            .collect();
        ranks.sort();
        ranks.dedup();
        ranks
    }

    /// Cells owned elsewhere that neighbour a cell owned by `rank`.
    pub fn halo_cells(&self, graph: &CellGraph, rank: Rank) -> Vec<CellId> {
        let mut halo: Vec<CellId> = self
            .owned_cells(rank)
            .into_iter()
            .flat_map(|c| graph.neighbours(c.index()).to_vec())
            .map(CellId)
            .filter(|&c| self.owner(c) != rank)
            .collect();
        halo.sort();
        halo.dedup();
        halo
    }
}

//! Cell adjacency graph.
//!
//! Stored in CSR form (`xadj` / `adjncy`), the layout graph partitioners
//! consume. Two cells are adjacent when they share at least one node.

use std::collections::VecDeque;

use strata_types::{CellId, StrataError, StrataResult};

use crate::mesh::Mesh;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGraph {
    /// `adjncy[xadj[c]..xadj[c + 1]]` are the neighbours of cell `c`.
    pub xadj: Vec<usize>,
    pub adjncy: Vec<u32>,
}

impl CellGraph {
    /// Build the adjacency graph of a mesh.
    pub fn build(mesh: &Mesh) -> Self {
        let mut xadj = Vec::with_capacity(mesh.cell_count() + 1);
        let mut adjncy = Vec::with_capacity(mesh.cell_count() * 8);
        xadj.push(0);
        for cell in mesh.cells() {
            let mut neighbours = mesh.cell_neighbours(cell.id);
            neighbours.sort();
            adjncy.extend(neighbours.iter().map(|c| c.0));
            xadj.push(adjncy.len());
        }
        Self { xadj, adjncy }
    }

    /// Number of vertices (cells).
    pub fn vertex_count(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    pub fn neighbours(&self, cell: usize) -> &[u32] {
        &self.adjncy[self.xadj[cell]..self.xadj[cell + 1]]
    }

    /// Checks index ranges, symmetry, self loops, and connectivity.
    pub fn validate(&self) -> StrataResult<()> {
        let n = self.vertex_count();
        if n == 0 {
            return Err(StrataError::Decomposition("Partition graph is empty".into()));
        }
        if self.xadj[0] != 0 || self.xadj[n] != self.adjncy.len() {
            return Err(StrataError::Decomposition(
                "Partition graph offsets are inconsistent".into(),
            ));
        }
        for c in 0..n {
            if self.xadj[c] > self.xadj[c + 1] {
                return Err(StrataError::Decomposition(format!(
                    "Partition graph offsets decrease at {}",
                    CellId(c as u32)
                )));
            }
            for &nb in self.neighbours(c) {
                let nb = nb as usize;
                if nb >= n {
                    return Err(StrataError::Decomposition(format!(
                        "{} references missing cell {nb}",
                        CellId(c as u32)
                    )));
                }
                if nb == c {
                    return Err(StrataError::Decomposition(format!(
                        "{} is adjacent to itself",
                        CellId(c as u32)
                    )));
                }
                if !self.neighbours(nb).contains(&(c as u32)) {
                    return Err(StrataError::Decomposition(format!(
                        "Adjacency {c}→{nb} is not symmetric"
                    )));
                }
            }
        }

        let order = self.breadth_first_order();
        if order.len() != n {
            return Err(StrataError::Decomposition(format!(
                "Partition graph is disconnected: {} of {n} cells reachable",
                order.len()
            )));
        }
        Ok(())
    }

    /// Breadth-first visiting order from cell 0, neighbours in ascending id.
    pub fn breadth_first_order(&self) -> Vec<usize> {
        let n = self.vertex_count();
        if n == 0 {
            return Vec::new();
        }
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut queue = VecDeque::new();
        visited[0] = true;
        queue.push_back(0usize);
        while let Some(c) = queue.pop_front() {
            order.push(c);
            for &nb in self.neighbours(c) {
                let nb = nb as usize;
                if nb < n && !visited[nb] {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
        order
    }
}

//! Weighted graph decomposition.
//!
//! Cells are visited breadth-first from cell 0 and cut into contiguous
//! chunks of roughly equal cumulative weight. Every part receives at
//! least one cell. The result depends only on the graph and the
//! weights, so all ranks computing it independently agree.

use strata_mesh::CellGraph;
use strata_types::{Rank, StrataError, StrataResult};
use tracing::debug;

use crate::partition::Partition;

/// Splits `graph` into `nparts` parts balancing `weights`.
///
/// # Errors
/// [`StrataError::Decomposition`] when the graph fails validation, when
/// `weights` does not cover every cell, or when there are more parts
/// than cells.
pub fn decompose_graph(graph: &CellGraph, weights: &[u64], nparts: usize) -> StrataResult<Partition> {
    graph.validate()?;
    let n = graph.vertex_count();
    if weights.len() != n {
        return Err(StrataError::Decomposition(format!(
            "{} weights for {n} cells",
            weights.len()
        )));
    }
    if nparts == 0 {
        return Err(StrataError::Decomposition("Cannot decompose into zero parts".into()));
    }
    if nparts > n {
        return Err(StrataError::Decomposition(format!(
            "{nparts} ranks exceed the {n} cells available"
        )));
    }

    let total: u128 = weights.iter().map(|&w| w as u128).sum();
    let order = graph.breadth_first_order();
    let mut cell_rank = vec![Rank::ROOT; n];

    let mut part = 0usize;
    let mut cumulative: u128 = 0;
    for (k, &c) in order.iter().enumerate() {
        cell_rank[c] = Rank(part as u32);
        cumulative += weights[c] as u128;

        let parts_left = nparts - part - 1;
        if parts_left == 0 {
            continue;
        }
        let cells_left = n - k - 1;
        let target = total * (part as u128 + 1) / nparts as u128;
        if cumulative >= target || cells_left == parts_left {
            part += 1;
        }
    }

    debug!(cells = n, parts = nparts, total_weight = %total, "Graph decomposed");
    Partition::from_table(cell_rank, nparts)
}

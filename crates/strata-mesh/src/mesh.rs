//! Structured quadrilateral background mesh.
//!
//! Nodes are numbered row-major (`j * (nx + 1) + i`) and cells row-major
//! (`j * nx + i`). Each cell lists its four nodes counter-clockwise from
//! the lower-left corner, matching [`shapefn::LOCAL_NODES`](crate::shapefn::LOCAL_NODES).

use serde::{Deserialize, Serialize};
use strata_math::DVec2;
use strata_types::{CellId, NodeId, StrataError, StrataResult};

use crate::shapefn::{self, ShapeData};

/// A quadrilateral cell and its four corner nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub nodes: [NodeId; 4],
}

/// Structured mesh of `nx × ny` axis-aligned cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    origin: DVec2,
    cell_size: DVec2,
    nx: usize,
    ny: usize,
    cells: Vec<Cell>,
}

impl Mesh {
    /// Builds a structured mesh. Rejects empty grids and non-positive cell sizes.
    pub fn structured(origin: DVec2, cell_size: DVec2, nx: usize, ny: usize) -> StrataResult<Self> {
        if nx == 0 || ny == 0 {
            return Err(StrataError::InvalidMesh(format!(
                "Mesh needs at least one cell per axis, got {nx}×{ny}"
            )));
        }
        if !(cell_size.x > 0.0 && cell_size.y > 0.0 && cell_size.is_finite()) {
            return Err(StrataError::InvalidMesh(format!(
                "Cell size must be positive, got ({}, {})",
                cell_size.x, cell_size.y
            )));
        }
        if !origin.is_finite() {
            return Err(StrataError::InvalidMesh("Mesh origin must be finite".into()));
        }

        let row = nx + 1;
        let mut cells = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let n0 = (j * row + i) as u32;
                let n3 = ((j + 1) * row + i) as u32;
                cells.push(Cell {
                    id: CellId((j * nx + i) as u32),
                    nodes: [NodeId(n0), NodeId(n0 + 1), NodeId(n3 + 1), NodeId(n3)],
                });
            }
        }

        Ok(Self {
            origin,
            cell_size,
            nx,
            ny,
            cells,
        })
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    #[inline]
    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    #[inline]
    pub fn cell_size(&self) -> DVec2 {
        self.cell_size
    }

    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.cell_size.x * self.cell_size.y
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> StrataResult<&Cell> {
        self.cells
            .get(id.index())
            .ok_or_else(|| StrataError::InvalidMesh(format!("{id} out of range")))
    }

    /// Position of node `id`.
    pub fn node_position(&self, id: NodeId) -> DVec2 {
        let row = self.nx + 1;
        let i = id.index() % row;
        let j = id.index() / row;
        self.origin + DVec2::new(i as f64, j as f64) * self.cell_size
    }

    /// Upper-right corner of the domain.
    pub fn extent(&self) -> DVec2 {
        self.origin + DVec2::new(self.nx as f64, self.ny as f64) * self.cell_size
    }

    /// Returns the cell containing `point`, or `None` outside the mesh.
    ///
    /// Points on the upper/right domain edge belong to the last cell.
    pub fn locate(&self, point: DVec2) -> Option<CellId> {
        if !point.is_finite() {
            return None;
        }
        let rel = (point - self.origin) / self.cell_size;
        if rel.x < 0.0 || rel.y < 0.0 || rel.x > self.nx as f64 || rel.y > self.ny as f64 {
            return None;
        }
        let i = (rel.x.floor() as usize).min(self.nx - 1);
        let j = (rel.y.floor() as usize).min(self.ny - 1);
        Some(CellId((j * self.nx + i) as u32))
    }

    /// Lower-left corner of cell `id`.
    fn cell_origin(&self, id: CellId) -> DVec2 {
        let i = id.index() % self.nx;
        let j = id.index() / self.nx;
        self.origin + DVec2::new(i as f64, j as f64) * self.cell_size
    }

    /// Centre of cell `id`.
    pub fn cell_centre(&self, id: CellId) -> DVec2 {
        self.cell_origin(id) + self.cell_size * 0.5
    }

    /// Local coordinates `(ξ, η)` of `point` in cell `id`.
    pub fn local_coordinates(&self, id: CellId, point: DVec2) -> DVec2 {
        (point - self.cell_origin(id)) / self.cell_size * 2.0 - DVec2::ONE
    }

    /// True if `point` lies inside (or on the boundary of) cell `id`.
    pub fn contains(&self, id: CellId, point: DVec2) -> bool {
        let xi = self.local_coordinates(id, point);
        let tol = 1.0 + strata_types::constants::EPSILON;
        xi.x.abs() <= tol && xi.y.abs() <= tol
    }

    /// Shape function values and gradients of `point` in cell `id`.
    pub fn shape_data(&self, id: CellId, point: DVec2) -> ShapeData {
        let xi = self.local_coordinates(id, point);
        ShapeData {
            values: shapefn::values(xi),
            gradients: shapefn::gradients(xi, self.cell_size),
        }
    }

    /// Cells that share at least one node with cell `id`, excluding itself.
    pub fn cell_neighbours(&self, id: CellId) -> Vec<CellId> {
        let ci = (id.index() % self.nx) as isize;
        let cj = (id.index() / self.nx) as isize;
        let mut out = Vec::with_capacity(8);
        for dj in -1..=1isize {
            for di in -1..=1isize {
                if di == 0 && dj == 0 {
                    continue;
                }
                let (i, j) = (ci + di, cj + dj);
                if i >= 0 && j >= 0 && (i as usize) < self.nx && (j as usize) < self.ny {
                    out.push(CellId((j as usize * self.nx + i as usize) as u32));
                }
            }
        }
        out
    }

    /// Compact description used to check checkpoint compatibility.
    pub fn fingerprint(&self) -> MeshFingerprint {
        MeshFingerprint {
            nx: self.nx,
            ny: self.ny,
            origin: [self.origin.x, self.origin.y],
            cell_size: [self.cell_size.x, self.cell_size.y],
        }
    }
}

/// Geometry summary of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshFingerprint {
    pub nx: usize,
    pub ny: usize,
    pub origin: [f64; 2],
    pub cell_size: [f64; 2],
}

//! Bilinear shape functions for the four-node quadrilateral.
//!
//! Local node order is counter-clockwise from the lower-left corner:
//! `(-1,-1), (1,-1), (1,1), (-1,1)`.

use strata_math::DVec2;

/// Local coordinates of the four cell nodes.
pub const LOCAL_NODES: [DVec2; 4] = [
    DVec2::new(-1.0, -1.0),
    DVec2::new(1.0, -1.0),
    DVec2::new(1.0, 1.0),
    DVec2::new(-1.0, 1.0),
];

/// Shape function values `N_i(ξ, η) = ¼(1 + ξξ_i)(1 + ηη_i)`.
pub fn values(xi: DVec2) -> [f64; 4] {
    let mut n = [0.0; 4];
    for (i, node) in LOCAL_NODES.iter().enumerate() {
        n[i] = 0.25 * (1.0 + xi.x * node.x) * (1.0 + xi.y * node.y);
    }
    n
}

/// Shape function gradients in physical coordinates for an axis-aligned
/// cell of size `cell_size`.
pub fn gradients(xi: DVec2, cell_size: DVec2) -> [DVec2; 4] {
    let jac_inv = DVec2::new(2.0 / cell_size.x, 2.0 / cell_size.y);
    let mut g = [DVec2::ZERO; 4];
    for (i, node) in LOCAL_NODES.iter().enumerate() {
        let dxi = 0.25 * node.x * (1.0 + xi.y * node.y);
        let deta = 0.25 * node.y * (1.0 + xi.x * node.x);
        g[i] = DVec2::new(dxi, deta) * jac_inv;
    }
    g
}

/// Cached shape function data of one particle in its current cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeData {
    pub values: [f64; 4],
    pub gradients: [DVec2; 4],
}

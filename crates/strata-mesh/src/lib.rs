//! # strata-mesh
//!
//! Background mesh and material point entities.
//!
//! ## Key Types
//!
//! - [`Mesh`]: structured quadrilateral grid of cells and nodes
//! - [`Node`]: per-step kinematic accumulators and boundary constraints
//! - [`Particle`]: a material point and its per-step capability operations
//! - [`CellGraph`]: cell adjacency used by domain decomposition
//! - [`BoundaryConditions`]: velocity constraints and nodal loads

pub mod boundary;
pub mod generators;
pub mod mesh;
pub mod node;
pub mod particle;
pub mod shapefn;
pub mod topology;

pub use boundary::{Axis, BoundaryConditions, Face};
pub use mesh::{Cell, Mesh};
pub use node::Node;
pub use particle::Particle;
pub use topology::CellGraph;

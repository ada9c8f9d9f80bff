//! Nodal boundary conditions.
//!
//! A boundary set is part of the persisted simulation state: it is
//! written to checkpoints and re-applied to nodes after every reset.

use serde::{Deserialize, Serialize};
use strata_math::DVec2;
use strata_types::{NodeId, StrataError, StrataResult};

use crate::mesh::Mesh;
use crate::node::Node;

/// Coordinate axis of a constrained degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// A face of the rectangular mesh domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    Left,
    Right,
    Bottom,
    Top,
}

impl Face {
    /// Nodes lying on this face, in ascending id order.
    pub fn nodes(self, mesh: &Mesh) -> Vec<NodeId> {
        let (nx, ny) = mesh.dimensions();
        let row = nx + 1;
        let ids: Vec<usize> = match self {
            Face::Left => (0..=ny).map(|j| j * row).collect(),
            Face::Right => (0..=ny).map(|j| j * row + nx).collect(),
            Face::Bottom => (0..=nx).collect(),
            Face::Top => (0..=nx).map(|i| ny * row + i).collect(),
        };
        ids.into_iter().map(|i| NodeId(i as u32)).collect()
    }
}

/// Prescribed nodal velocity on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityConstraint {
    pub node: NodeId,
    pub axis: Axis,
    pub velocity: f64,
}

/// Concentrated force applied at a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodalForce {
    pub node: NodeId,
    pub force: [f64; 2],
}

/// The node boundary-condition set of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConditions {
    pub velocity_constraints: Vec<VelocityConstraint>,
    pub nodal_forces: Vec<NodalForce>,
}

impl BoundaryConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `axis` to `velocity` on every node of `face`.
    pub fn constrain_face(&mut self, mesh: &Mesh, face: Face, axis: Axis, velocity: f64) {
        for node in face.nodes(mesh) {
            self.velocity_constraints.push(VelocityConstraint {
                node,
                axis,
                velocity,
            });
        }
    }

    pub fn add_nodal_force(&mut self, node: NodeId, force: DVec2) {
        self.nodal_forces.push(NodalForce {
            node,
            force: [force.x, force.y],
        });
    }

    /// Checks that every referenced node exists.
    pub fn validate(&self, mesh: &Mesh) -> StrataResult<()> {
        let n = mesh.node_count();
        for c in &self.velocity_constraints {
            if c.node.index() >= n || !c.velocity.is_finite() {
                return Err(StrataError::InvalidConfig(format!(
                    "Velocity constraint on node {} is invalid ({} nodes)",
                    c.node.0, n
                )));
            }
        }
        for f in &self.nodal_forces {
            if f.node.index() >= n || !f.force.iter().all(|v| v.is_finite()) {
                return Err(StrataError::InvalidConfig(format!(
                    "Nodal force on node {} is invalid ({} nodes)",
                    f.node.0, n
                )));
            }
        }
        Ok(())
    }

    /// Writes constraints and concentrated forces into the node array.
    ///
    /// Later constraints on the same degree of freedom win.
    pub fn apply(&self, nodes: &mut [Node]) {
        for node in nodes.iter_mut() {
            node.velocity_constraints = [None, None];
            node.concentrated_force = DVec2::ZERO;
        }
        for c in &self.velocity_constraints {
            if let Some(node) = nodes.get_mut(c.node.index()) {
                node.velocity_constraints[c.axis.index()] = Some(c.velocity);
            }
        }
        for f in &self.nodal_forces {
            if let Some(node) = nodes.get_mut(f.node.index()) {
                node.concentrated_force += DVec2::new(f.force[0], f.force[1]);
            }
        }
    }
}

//! Background mesh node state.
//!
//! Every accumulator is zeroed by [`Node::reset`] at the start of a step
//! before any particle contributes. The boundary set (velocity
//! constraints, concentrated force) survives resets.

use strata_math::DVec2;
use strata_types::constants::MASS_TOLERANCE;
use strata_types::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: DVec2,

    // ─── Accumulators (reduced from particles) ───
    pub mass: f64,
    pub momentum: DVec2,
    /// Σ N·m·a, mapped particle inertia.
    pub inertia: DVec2,
    pub internal_force: DVec2,
    pub external_force: DVec2,

    // ─── Kinematics ───
    pub velocity: DVec2,
    pub acceleration: DVec2,
    /// Newmark predictor velocity `v + (1-γ)Δt·a`.
    pub predicted_velocity: DVec2,
    /// Displacement increment Δu over the step.
    pub displacement: DVec2,
    /// Corrected minus mapped velocity.
    pub velocity_increment: DVec2,

    // ─── Boundary set ───
    pub velocity_constraints: [Option<f64>; 2],
    pub concentrated_force: DVec2,
}

impl Node {
    pub fn new(id: NodeId, position: DVec2) -> Self {
        Self {
            id,
            position,
            mass: 0.0,
            momentum: DVec2::ZERO,
            inertia: DVec2::ZERO,
            internal_force: DVec2::ZERO,
            external_force: DVec2::ZERO,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            predicted_velocity: DVec2::ZERO,
            displacement: DVec2::ZERO,
            velocity_increment: DVec2::ZERO,
            velocity_constraints: [None, None],
            concentrated_force: DVec2::ZERO,
        }
    }

    /// Zero every accumulator and kinematic quantity.
    pub fn reset(&mut self) {
        self.mass = 0.0;
        self.momentum = DVec2::ZERO;
        self.inertia = DVec2::ZERO;
        self.internal_force = DVec2::ZERO;
        self.external_force = DVec2::ZERO;
        self.velocity = DVec2::ZERO;
        self.acceleration = DVec2::ZERO;
        self.predicted_velocity = DVec2::ZERO;
        self.displacement = DVec2::ZERO;
        self.velocity_increment = DVec2::ZERO;
    }

    /// True once particle mass has been mapped to this node.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.mass > MASS_TOLERANCE
    }

    /// Derive velocity and acceleration from momentum and inertia.
    pub fn compute_velocity_acceleration(&mut self) {
        if self.is_active() {
            self.velocity = self.momentum / self.mass;
            self.acceleration = self.inertia / self.mass;
        } else {
            self.velocity = DVec2::ZERO;
            self.acceleration = DVec2::ZERO;
        }
        self.apply_velocity_constraints();
    }

    /// Constrained axes take the prescribed velocity and zero acceleration.
    pub fn apply_velocity_constraints(&mut self) {
        for axis in 0..2 {
            if let Some(v) = self.velocity_constraints[axis] {
                self.velocity[axis] = v;
                self.acceleration[axis] = 0.0;
            }
        }
    }

    /// Constrained axes move by exactly `Δt·v_c`.
    pub fn apply_displacement_constraints(&mut self, dt: f64) {
        for axis in 0..2 {
            if let Some(v) = self.velocity_constraints[axis] {
                self.displacement[axis] = dt * v;
            }
        }
    }

    /// Sum of internal, external, and concentrated forces.
    #[inline]
    pub fn total_force(&self) -> DVec2 {
        self.internal_force + self.external_force + self.concentrated_force
    }
}

//! The Newmark predictor-corrector step.
//!
//! [`NewmarkScheme::run_step`] executes the nine phases of [`Phase::ALL`]
//! in order, once each. Node-wise and particle-wise work inside a phase
//! runs on the rayon pool. Particle-to-node accumulation is a serial sum
//! over owned and halo particles in ascending id order, so nodal results
//! do not depend on thread count or on how cells are spread over ranks.
//!
//! Shape functions are evaluated once per step, at the start-of-step
//! positions, and reused by every later phase of that step.

use std::fmt;

use rayon::prelude::*;
use strata_math::{DVec2, SymTensor};
use strata_mesh::{Mesh, Node, Particle};
use strata_partition::{merge_by_id, DomainParts};
use strata_types::{StrataError, StrataResult};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::VelocityUpdate;
use crate::context::StepContext;
use crate::hooks::PhaseObserver;
use crate::stiffness::{ExplicitFallback, StiffnessSolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Initialise,
    NodalKinematics,
    Predictor,
    Force,
    Solve,
    Corrector,
    ParticleKinematics,
    StressStrain,
    Locate,
}

impl Phase {
    /// Execution order.
    pub const ALL: [Phase; 9] = [
        Phase::Initialise,
        Phase::NodalKinematics,
        Phase::Predictor,
        Phase::Force,
        Phase::Solve,
        Phase::Corrector,
        Phase::ParticleKinematics,
        Phase::StressStrain,
        Phase::Locate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Initialise => "initialise",
            Phase::NodalKinematics => "nodal_kinematics",
            Phase::Predictor => "predictor",
            Phase::Force => "force",
            Phase::Solve => "solve",
            Phase::Corrector => "corrector",
            Phase::ParticleKinematics => "particle_kinematics",
            Phase::StressStrain => "stress_strain",
            Phase::Locate => "locate",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed phase and the error it reported.
#[derive(Debug, Error)]
#[error("{phase} phase failed: {error}")]
pub struct PhaseError {
    pub phase: Phase,
    #[source]
    pub error: StrataError,
}

impl PhaseError {
    /// Wraps the failure as a run-aborting error for `step`.
    pub fn into_step_error(self, step: u64) -> StrataError {
        StrataError::StepAborted {
            step,
            phase: self.phase.name().to_string(),
            source: Box::new(self.error),
        }
    }
}

/// Summary of a completed step on this rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step: u64,
    pub time: f64,
    pub active_nodes: usize,
    pub particles: usize,
    pub mass: f64,
    pub kinetic_energy: f64,
}

/// Newmark predictor-corrector integration scheme.
pub struct NewmarkScheme {
    stiffness: Box<dyn StiffnessSolver>,
    observers: Vec<Box<dyn PhaseObserver>>,
}

impl Default for NewmarkScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl NewmarkScheme {
    /// Scheme with the explicit fallback solve and no observers.
    pub fn new() -> Self {
        Self {
            stiffness: Box::new(ExplicitFallback),
            observers: Vec::new(),
        }
    }

    pub fn with_stiffness(mut self, solver: Box<dyn StiffnessSolver>) -> Self {
        self.stiffness = solver;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn PhaseObserver>) {
        self.observers.push(observer);
    }

    pub fn stiffness_name(&self) -> &str {
        self.stiffness.name()
    }

    /// Advances the owned particles by one step.
    pub fn run_step(
        &mut self,
        ctx: &StepContext<'_>,
        parts: DomainParts<'_>,
    ) -> Result<StepReport, PhaseError> {
        let DomainParts {
            mesh,
            nodes,
            particles,
            halo,
        } = parts;

        for obs in &mut self.observers {
            obs.on_step_begin(ctx.step, ctx.time);
        }

        for phase in Phase::ALL {
            let result = match phase {
                Phase::Initialise => initialise(nodes),
                Phase::NodalKinematics => nodal_kinematics(mesh, nodes, particles, halo),
                Phase::Predictor => predictor(ctx, nodes),
                Phase::Force => force(ctx, mesh, nodes, particles, halo),
                Phase::Solve => self.solve(ctx, mesh, nodes, particles, halo),
                Phase::Corrector => corrector(ctx, nodes),
                Phase::ParticleKinematics => particle_kinematics(ctx, mesh, nodes, particles),
                Phase::StressStrain => stress_strain(ctx, mesh, nodes, particles),
                Phase::Locate => locate(mesh, particles),
            };
            result.map_err(|error| PhaseError { phase, error })?;
            trace!(step = ctx.step, %phase, "Phase complete");
            for obs in &mut self.observers {
                obs.on_phase_end(ctx.step, phase, nodes, particles);
            }
        }

        let report = StepReport {
            step: ctx.step,
            time: ctx.time,
            active_nodes: nodes.iter().filter(|n| n.is_active()).count(),
            particles: particles.len(),
            mass: particles.iter().map(|p| p.mass).sum(),
            kinetic_energy: particles
                .iter()
                .map(|p| 0.5 * p.mass * p.velocity.length_squared())
                .sum(),
        };
        debug!(
            step = report.step,
            particles = report.particles,
            active_nodes = report.active_nodes,
            kinetic_energy = report.kinetic_energy,
            "Step complete"
        );
        for obs in &mut self.observers {
            obs.on_step_end(&report);
        }
        Ok(report)
    }

    /// Phase 5: explicit trial increment, the pluggable solve, then
    /// displacement constraints.
    fn solve(
        &mut self,
        ctx: &StepContext<'_>,
        mesh: &Mesh,
        nodes: &mut [Node],
        particles: &[Particle],
        halo: &[Particle],
    ) -> StrataResult<()> {
        let params = ctx.config.newmark;
        let scale = params.beta * params.dt * params.dt;
        nodes.par_iter_mut().filter(|n| n.is_active()).for_each(|n| {
            let predicted = params.predicted_displacement(n.velocity, n.acceleration);
            n.displacement = predicted + n.total_force() * (scale / n.mass);
        });

        self.stiffness.solve(ctx, mesh, particles, halo, nodes)?;

        let dt = params.dt;
        nodes
            .par_iter_mut()
            .filter(|n| n.is_active())
            .for_each(|n| n.apply_displacement_constraints(dt));
        Ok(())
    }
}

/// Collects per-entity results in entity order and returns the first
/// failure, so the error reported does not depend on thread scheduling.
fn first_error(results: Vec<StrataResult<()>>) -> StrataResult<()> {
    results.into_iter().collect()
}

// ─── Phases ──────────────────────────────────────────────────

fn initialise(nodes: &mut [Node]) -> StrataResult<()> {
    nodes.par_iter_mut().for_each(Node::reset);
    Ok(())
}

fn nodal_kinematics(
    mesh: &Mesh,
    nodes: &mut [Node],
    particles: &mut [Particle],
    halo: &[Particle],
) -> StrataResult<()> {
    first_error(
        particles
            .par_iter_mut()
            .map(|p| p.compute_shape_functions(mesh))
            .collect(),
    )?;

    for p in merge_by_id(particles, halo) {
        let cell = mesh.cell(p.owning_cell()?)?;
        let shape = p.shape()?;
        for (k, node_id) in cell.nodes.iter().enumerate() {
            let weight = shape.values[k] * p.mass;
            let node = &mut nodes[node_id.index()];
            node.mass += weight;
            node.momentum += p.velocity * weight;
            node.inertia += p.acceleration * weight;
        }
    }

    nodes
        .par_iter_mut()
        .for_each(Node::compute_velocity_acceleration);
    Ok(())
}

fn predictor(ctx: &StepContext<'_>, nodes: &mut [Node]) -> StrataResult<()> {
    let params = ctx.config.newmark;
    nodes.par_iter_mut().filter(|n| n.is_active()).for_each(|n| {
        n.predicted_velocity = params.predicted_velocity(n.velocity, n.acceleration);
        n.displacement = params.predicted_displacement(n.velocity, n.acceleration);
    });
    Ok(())
}

fn force(
    ctx: &StepContext<'_>,
    mesh: &Mesh,
    nodes: &mut [Node],
    particles: &[Particle],
    halo: &[Particle],
) -> StrataResult<()> {
    let gravity = ctx.config.gravity;
    for p in merge_by_id(particles, halo) {
        let cell = mesh.cell(p.owning_cell()?)?;
        let shape = p.shape()?;
        for (k, node_id) in cell.nodes.iter().enumerate() {
            let node = &mut nodes[node_id.index()];
            node.internal_force -= p.stress.dot(shape.gradients[k]) * p.volume;
            node.external_force += gravity * (shape.values[k] * p.mass);
        }
    }
    Ok(())
}

fn corrector(ctx: &StepContext<'_>, nodes: &mut [Node]) -> StrataResult<()> {
    let params = ctx.config.newmark;
    nodes.par_iter_mut().filter(|n| n.is_active()).for_each(|n| {
        let v = n.velocity;
        let a = n.acceleration;
        let a_new = params.corrected_acceleration(n.displacement, v, a);
        n.acceleration = a_new;
        n.velocity = params.corrected_velocity(v, a, a_new);
        n.apply_velocity_constraints();
        n.velocity_increment = n.velocity - v;
    });
    Ok(())
}

/// Local damping: each axis loses `α·|Δv|` against its direction of
/// motion. A component the damping would reverse is stopped at zero.
fn cundall_damping(old: DVec2, updated: DVec2, alpha: f64) -> DVec2 {
    let dv = updated - old;
    let mut damped = updated;
    for axis in 0..2 {
        let v = updated[axis];
        let reduced = v - alpha * dv[axis].abs() * sign(v);
        damped[axis] = if sign(reduced) == -sign(v) { 0.0 } else { reduced };
    }
    damped
}

/// Sign with zero mapped to zero.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn particle_kinematics(
    ctx: &StepContext<'_>,
    mesh: &Mesh,
    nodes: &[Node],
    particles: &mut [Particle],
) -> StrataResult<()> {
    let mode = ctx.config.velocity_update;
    let alpha = ctx.config.damping_factor;

    first_error(
        particles
            .par_iter_mut()
            .map(|p| {
                let cell = mesh.cell(p.owning_cell()?)?;
                let shape = *p.shape()?;

                let mut acceleration = DVec2::ZERO;
                let mut velocity = DVec2::ZERO;
                let mut increment = DVec2::ZERO;
                let mut displacement = DVec2::ZERO;
                for (k, node_id) in cell.nodes.iter().enumerate() {
                    let n = &nodes[node_id.index()];
                    let w = shape.values[k];
                    acceleration += n.acceleration * w;
                    velocity += n.velocity * w;
                    increment += n.velocity_increment * w;
                    displacement += n.displacement * w;
                }

                let old = p.velocity;
                let mut updated = match mode {
                    VelocityUpdate::Flip => old + increment,
                    VelocityUpdate::Pic => velocity,
                };
                if alpha > 0.0 {
                    updated = cundall_damping(old, updated, alpha);
                }

                if !(updated.is_finite() && acceleration.is_finite() && displacement.is_finite()) {
                    return Err(StrataError::NumericalFailure {
                        particle: p.id,
                        reason: "non-finite kinematics".into(),
                    });
                }
                p.velocity = updated;
                p.acceleration = acceleration;
                p.position += displacement;
                p.displacement += displacement;
                Ok(())
            })
            .collect(),
    )
}

fn stress_strain(
    ctx: &StepContext<'_>,
    mesh: &Mesh,
    nodes: &[Node],
    particles: &mut [Particle],
) -> StrataResult<()> {
    let dt = ctx.dt();
    first_error(
        particles
            .par_iter_mut()
            .map(|p| p.compute_strain(mesh, nodes, dt))
            .collect(),
    )?;

    if ctx.config.pressure_smoothing {
        smooth_volumetric_strain(mesh, particles)?;
    }

    let materials = ctx.materials;
    first_error(
        particles
            .par_iter_mut()
            .map(|p| {
                p.update_volume()?;
                let model = materials.get(p.material)?;
                p.compute_stress(model, dt)
            })
            .collect(),
    )
}

/// Replaces each particle's volumetric strain increment by the
/// volume-weighted mean over the particles of its cell.
///
/// The correction is split evenly across the in-plane normal components.
fn smooth_volumetric_strain(mesh: &Mesh, particles: &mut [Particle]) -> StrataResult<()> {
    let mut weighted = vec![0.0; mesh.cell_count()];
    let mut volume = vec![0.0; mesh.cell_count()];
    for p in particles.iter() {
        let c = p.owning_cell()?.index();
        weighted[c] += p.volume * p.dstrain.trace();
        volume[c] += p.volume;
    }

    first_error(
        particles
            .par_iter_mut()
            .map(|p| {
                let c = p.owning_cell()?.index();
                if volume[c] <= 0.0 {
                    return Ok(());
                }
                let mean = weighted[c] / volume[c];
                let half = 0.5 * (mean - p.dstrain.trace());
                let correction = SymTensor::new(half, half, 0.0, 0.0);
                p.dstrain += correction;
                p.strain += correction;
                Ok(())
            })
            .collect(),
    )
}

fn locate(mesh: &Mesh, particles: &mut [Particle]) -> StrataResult<()> {
    first_error(
        particles
            .par_iter_mut()
            .map(|p| p.locate(mesh).map(|_| ()))
            .collect(),
    )
}

//! Displacement-solve extension point.
//!
//! Phase 5 of a step hands the nodes, already holding the explicit
//! lumped-mass trial increment `Δu = Δũ + βΔt²·f/m`, to a
//! [`StiffnessSolver`]. The solver may overwrite the increment on free
//! degrees of freedom; velocity constraints are applied afterwards by
//! the scheme.
//!
//! Solvers and assemblers see this rank's owned particles and its halo
//! copies, so contributions to nodes of owned cells are complete. The
//! solve itself is local to the rank's active nodes.

use strata_math::faer_solver::FaerSolver;
use strata_math::sparse::{CsrMatrix, SparseSolver};
use strata_mesh::{Mesh, Node, Particle};
use strata_types::StrataResult;
use tracing::debug;

use crate::context::StepContext;

/// Global displacement solve.
pub trait StiffnessSolver: Send {
    fn solve(
        &mut self,
        ctx: &StepContext<'_>,
        mesh: &Mesh,
        particles: &[Particle],
        halo: &[Particle],
        nodes: &mut [Node],
    ) -> StrataResult<()>;

    fn name(&self) -> &str;
}

/// Keeps the explicit trial increment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplicitFallback;

impl StiffnessSolver for ExplicitFallback {
    fn solve(
        &mut self,
        _ctx: &StepContext<'_>,
        _mesh: &Mesh,
        _particles: &[Particle],
        _halo: &[Particle],
        _nodes: &mut [Node],
    ) -> StrataResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "explicit_fallback"
    }
}

/// Source of the tangent stiffness matrix `K`.
///
/// Entries are `(row, col, value)` over global degrees of freedom
/// `2·node + axis`. Duplicates are summed; the matrix must be symmetric.
pub trait StiffnessAssembler: Send {
    fn assemble(
        &self,
        ctx: &StepContext<'_>,
        mesh: &Mesh,
        particles: &[Particle],
        halo: &[Particle],
    ) -> StrataResult<Vec<(usize, usize, f64)>>;
}

/// `K = 0`: the implicit system reduces to the lumped-mass update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStiffness;

impl StiffnessAssembler for NoStiffness {
    fn assemble(
        &self,
        _ctx: &StepContext<'_>,
        _mesh: &Mesh,
        _particles: &[Particle],
        _halo: &[Particle],
    ) -> StrataResult<Vec<(usize, usize, f64)>> {
        Ok(Vec::new())
    }
}

/// Solves `(M/(βΔt²) + K) Δu = f + M Δũ/(βΔt²)` on the free degrees of
/// freedom of active nodes with a sparse Cholesky factorization.
///
/// Constrained degrees of freedom carry `Δu = Δt·v_c`; their coupling
/// terms move to the right-hand side.
pub struct SparseNewmarkSolver {
    assembler: Box<dyn StiffnessAssembler>,
    solver: FaerSolver,
}

impl SparseNewmarkSolver {
    pub fn new(assembler: Box<dyn StiffnessAssembler>) -> Self {
        Self {
            assembler,
            solver: FaerSolver::new(),
        }
    }

    pub fn lumped() -> Self {
        Self::new(Box::new(NoStiffness))
    }
}

impl StiffnessSolver for SparseNewmarkSolver {
    fn solve(
        &mut self,
        ctx: &StepContext<'_>,
        mesh: &Mesh,
        particles: &[Particle],
        halo: &[Particle],
        nodes: &mut [Node],
    ) -> StrataResult<()> {
        let params = &ctx.config.newmark;
        let dt = params.dt;
        let c = params.mass_coefficient();

        // Global dof -> free equation index.
        let mut equation = vec![None; nodes.len() * 2];
        let mut prescribed = vec![None; nodes.len() * 2];
        let mut free = 0usize;
        for (i, node) in nodes.iter().enumerate() {
            if !node.is_active() {
                continue;
            }
            for axis in 0..2 {
                match node.velocity_constraints[axis] {
                    Some(v) => prescribed[2 * i + axis] = Some(dt * v),
                    None => {
                        equation[2 * i + axis] = Some(free);
                        free += 1;
                    }
                }
            }
        }
        if free == 0 {
            return Ok(());
        }

        let mut triplets = Vec::with_capacity(free);
        let mut rhs = vec![0.0; free];
        for (i, node) in nodes.iter().enumerate() {
            let predicted = params.predicted_displacement(node.velocity, node.acceleration);
            let force = node.total_force();
            for axis in 0..2 {
                if let Some(eq) = equation[2 * i + axis] {
                    triplets.push((eq, eq, node.mass * c));
                    rhs[eq] = force[axis] + node.mass * c * predicted[axis];
                }
            }
        }

        for (row, col, k) in self.assembler.assemble(ctx, mesh, particles, halo)? {
            let Some(eq) = equation.get(row).copied().flatten() else {
                continue;
            };
            match (equation.get(col).copied().flatten(), prescribed.get(col).copied().flatten()) {
                (Some(col_eq), _) => triplets.push((eq, col_eq, k)),
                (None, Some(du)) => rhs[eq] -= k * du,
                (None, None) => {}
            }
        }

        let matrix = CsrMatrix::from_triplets(free, free, &triplets);
        self.solver.factorize(&matrix)?;
        let mut solution = vec![0.0; free];
        self.solver.solve(&rhs, &mut solution)?;

        for (i, node) in nodes.iter_mut().enumerate() {
            for axis in 0..2 {
                if let Some(eq) = equation[2 * i + axis] {
                    node.displacement[axis] = solution[eq];
                }
            }
        }
        debug!(step = ctx.step, equations = free, nnz = matrix.nnz(), "Implicit solve");
        Ok(())
    }

    fn name(&self) -> &str {
        "sparse_newmark"
    }
}

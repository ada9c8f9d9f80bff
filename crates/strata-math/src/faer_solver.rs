//! Sparse Cholesky solver backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait using faer's supernodal LLᵀ
//! factorization.
//!
//! ## Workflow
//! 1. `factorize(matrix)`: converts CSR→CSC, computes symbolic + numeric LLᵀ
//! 2. `solve(rhs, solution)`: forward/backward substitution (cached factorization)

use faer::Side;
use faer::linalg::solvers::Solve;
use faer::sparse::SparseColMat;
use faer::sparse::Triplet;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use strata_types::{StrataError, StrataResult};

use crate::sparse::{CsrMatrix, SparseSolver};

/// Sparse Cholesky (LLᵀ) solver using `faer`.
pub struct FaerSolver {
    /// Cached LLᵀ factorization.
    factorization: Option<Llt<usize, f64>>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl FaerSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }

    fn csr_to_csc(matrix: &CsrMatrix) -> StrataResult<SparseColMat<usize, f64>> {
        let mut triplets: Vec<Triplet<usize, usize, f64>> = Vec::with_capacity(matrix.nnz());
        for row in 0..matrix.rows {
            for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
                triplets.push(Triplet {
                    row,
                    col: matrix.col_idx[idx],
                    val: matrix.values[idx],
                });
            }
        }

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets).map_err(|e| {
            StrataError::SolverFailure(format!("Failed to construct faer CSC matrix: {e:?}"))
        })
    }
}

impl Default for FaerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> StrataResult<()> {
        if matrix.rows != matrix.cols {
            return Err(StrataError::SolverFailure(format!(
                "Matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            )));
        }
        if matrix.rows == 0 {
            return Err(StrataError::SolverFailure(
                "Cannot factorize empty matrix".into(),
            ));
        }

        self.dimension = matrix.rows;
        let csc = Self::csr_to_csc(matrix)?;

        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| StrataError::SolverFailure(format!("Symbolic analysis failed: {e:?}")))?;

        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper).map_err(|e| {
            StrataError::SolverFailure(format!("Cholesky factorization failed: {e:?}"))
        })?;

        self.factorization = Some(llt);
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> StrataResult<()> {
        let llt = self.factorization.as_ref().ok_or_else(|| {
            StrataError::SolverFailure("Solver not factorized. Call factorize() first.".into())
        })?;

        if rhs.len() != self.dimension || solution.len() != self.dimension {
            return Err(StrataError::SolverFailure(format!(
                "RHS/solution length ({}/{}) != matrix dimension ({})",
                rhs.len(),
                solution.len(),
                self.dimension
            )));
        }

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);
        let sol = llt.solve(&rhs_mat);

        for (i, x) in solution.iter_mut().enumerate() {
            *x = sol[(i, 0)];
        }

        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}

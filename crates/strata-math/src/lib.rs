//! # strata-math
//!
//! Linear algebra primitives for the Strata engine.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`DVec2`, `DMat2`)
//! - Symmetric plane-strain tensor type for stress and strain
//! - Sparse matrix representation (CSR) and Cholesky solver interface

pub mod faer_solver;
pub mod sparse;
pub mod tensor;

// Re-export glam types as the canonical math types for Strata.
pub use glam::{DMat2, DVec2};
pub use tensor::SymTensor;

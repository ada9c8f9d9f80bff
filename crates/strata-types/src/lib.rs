//! # strata-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the Strata material point engine.
//!
//! This crate has zero domain logic. It defines the vocabulary
//! that all other Strata crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{StrataError, StrataResult};
pub use ids::{CellId, MaterialId, NodeId, ParticleId, Rank};
pub use scalar::Scalar;

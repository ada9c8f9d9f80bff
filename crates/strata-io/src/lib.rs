//! # strata-io
//!
//! Simulation input contract, input validation, and output writers.
//!
//! Defines the boundary types that the CLI and tests use to describe a
//! run to the engine, and the writers that receive state snapshots on
//! the output cadence.

pub mod contract;
pub mod validator;
pub mod writers;

pub use contract::SimulationInput;
pub use validator::validate_input;
pub use writers::{ArtifactWriter, JsonParticleWriter, MemoryWriter, OutputSnapshot};

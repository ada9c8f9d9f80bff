//! # strata-driver
//!
//! Builds a simulation from a [`SimulationInput`](strata_io::SimulationInput)
//! and runs its step loop on one or more workers.
//!
//! ## Key Types
//!
//! - [`Simulation`]: validated, immutable run setup shared by all workers
//! - [`InjectionSchedule`]: particles waiting for their activation time
//! - [`StepDriver`]: the per-worker step loop
//! - [`run_cluster`]: runs one driver per worker thread

pub mod cluster;
pub mod driver;
pub mod injection;
pub mod setup;

pub use cluster::{run_cluster, run_cluster_with};
pub use driver::{RunSummary, StepDriver};
pub use injection::InjectionSchedule;
pub use setup::Simulation;

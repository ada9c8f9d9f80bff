//! # strata-solver
//!
//! One Newmark time step over a [`Domain`](strata_partition::Domain).
//!
//! ## Key Types
//!
//! - [`NewmarkScheme`]: the nine ordered phases of a step
//! - [`SchemeConfig`] / [`NewmarkParams`]: integration parameters
//! - [`StepContext`]: explicit per-step context passed into every phase
//! - [`StiffnessSolver`]: pluggable displacement solve (explicit by default)
//! - [`PhaseObserver`]: inspection hooks called after each phase

pub mod config;
pub mod context;
pub mod hooks;
pub mod scheme;
pub mod stiffness;

pub use config::{NewmarkParams, SchemeConfig, VelocityUpdate};
pub use context::StepContext;
pub use hooks::{PhaseObserver, PhaseRecorder};
pub use scheme::{NewmarkScheme, Phase, PhaseError, StepReport};
pub use stiffness::{
    ExplicitFallback, NoStiffness, SparseNewmarkSolver, StiffnessAssembler, StiffnessSolver,
};

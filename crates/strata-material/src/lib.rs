//! # strata-material
//!
//! Constitutive model abstraction and material table.
//!
//! ## Design
//!
//! The [`ConstitutiveModel`] trait is the narrow stress-update capability
//! the integration scheme consumes per particle. Each particle selects a
//! variant at creation time through its [`MaterialId`](strata_types::MaterialId);
//! the tagged [`Material`] enum dispatches to the concrete model.

pub mod linear_elastic;
pub mod newtonian;
pub mod properties;
pub mod traits;

pub use linear_elastic::LinearElastic;
pub use newtonian::Newtonian;
pub use properties::{Material, MaterialTable};
pub use traits::{ConstitutiveModel, MaterialState};

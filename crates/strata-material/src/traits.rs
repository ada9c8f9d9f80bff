//! Constitutive model trait, the core material abstraction.
//!
//! Every material model implements this trait, enabling the integration
//! scheme to update stress without knowing the physics behind it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_math::SymTensor;
use strata_types::StrataResult;

/// Per-particle internal variables owned by the material model.
///
/// Stored on the particle and persisted in checkpoints so that history-
/// dependent models resume exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialState {
    pub variables: BTreeMap<String, f64>,
}

impl MaterialState {
    pub fn get(&self, name: &str) -> f64 {
        self.variables.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }
}

/// Trait for constitutive models (material behavior).
///
/// # Strategy Pattern
///
/// - `LinearElastic`: incremental Hooke's law in plane strain
/// - `Newtonian`: compressible viscous fluid
pub trait ConstitutiveModel: Send + Sync {
    /// Mass density (kg/m³) used by `compute_mass`.
    fn density(&self) -> f64;

    /// Internal variables for a freshly created particle.
    fn initial_state(&self) -> MaterialState {
        MaterialState::default()
    }

    /// Compute the updated stress.
    ///
    /// # Arguments
    /// - `stress`: stress at the start of the step
    /// - `dstrain`: strain increment over the step
    /// - `state`: internal variables, updated in place
    /// - `dt`: time step size
    fn compute_stress(
        &self,
        stress: &SymTensor,
        dstrain: &SymTensor,
        state: &mut MaterialState,
        dt: f64,
    ) -> StrataResult<SymTensor>;

    /// Returns the name of this constitutive model.
    fn name(&self) -> &str;
}

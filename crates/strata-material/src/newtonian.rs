//! Compressible Newtonian fluid.
//!
//! Pressure follows the accumulated volumetric strain through the bulk
//! modulus; the deviatoric stress is viscous:
//! `σ = -p·I + 2η·dev(dε/dt)`, `p = -K·ε_v`.

use serde::{Deserialize, Serialize};
use strata_math::SymTensor;
use strata_types::{StrataError, StrataResult};

use crate::traits::{ConstitutiveModel, MaterialState};

/// Name of the state variable holding the accumulated volumetric strain.
pub const VOLUMETRIC_STRAIN: &str = "volumetric_strain";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Newtonian {
    /// Bulk modulus K (Pa).
    pub bulk_modulus: f64,
    /// Dynamic viscosity η (Pa·s).
    pub dynamic_viscosity: f64,
    /// Mass density (kg/m³).
    pub density: f64,
}

impl Newtonian {
    pub fn new(bulk_modulus: f64, dynamic_viscosity: f64, density: f64) -> StrataResult<Self> {
        let model = Self {
            bulk_modulus,
            dynamic_viscosity,
            density,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> StrataResult<()> {
        if !(self.bulk_modulus > 0.0 && self.bulk_modulus.is_finite()) {
            return Err(StrataError::InvalidMaterial(format!(
                "Bulk modulus must be positive, got {}",
                self.bulk_modulus
            )));
        }
        if !(self.dynamic_viscosity >= 0.0 && self.dynamic_viscosity.is_finite()) {
            return Err(StrataError::InvalidMaterial(format!(
                "Dynamic viscosity must be non-negative, got {}",
                self.dynamic_viscosity
            )));
        }
        if !(self.density > 0.0 && self.density.is_finite()) {
            return Err(StrataError::InvalidMaterial(format!(
                "Density must be positive, got {}",
                self.density
            )));
        }
        Ok(())
    }
}

impl ConstitutiveModel for Newtonian {
    fn density(&self) -> f64 {
        self.density
    }

    fn initial_state(&self) -> MaterialState {
        let mut state = MaterialState::default();
        state.set(VOLUMETRIC_STRAIN, 0.0);
        state
    }

    fn compute_stress(
        &self,
        _stress: &SymTensor,
        dstrain: &SymTensor,
        state: &mut MaterialState,
        dt: f64,
    ) -> StrataResult<SymTensor> {
        if dt <= 0.0 {
            return Err(StrataError::InvalidConfig(format!(
                "Newtonian stress update needs dt > 0, got {dt}"
            )));
        }
        let volumetric = state.get(VOLUMETRIC_STRAIN) + dstrain.trace();
        state.set(VOLUMETRIC_STRAIN, volumetric);

        let pressure = -self.bulk_modulus * volumetric;
        let strain_rate = *dstrain * (1.0 / dt);
        let viscous = strain_rate.deviatoric() * (2.0 * self.dynamic_viscosity);
        Ok(SymTensor::isotropic(-pressure) + viscous)
    }

    fn name(&self) -> &str {
        "newtonian"
    }
}

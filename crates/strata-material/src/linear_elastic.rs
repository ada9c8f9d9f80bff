//! Isotropic linear elastic model in plane strain.
//!
//! Incremental Hooke's law: `dσ = λ·tr(dε)·I + 2μ·dε`, with the
//! out-of-plane strain held at zero so `dσ_zz = λ·tr(dε)`.

use serde::{Deserialize, Serialize};
use strata_math::SymTensor;
use strata_types::{StrataError, StrataResult};

use crate::traits::{ConstitutiveModel, MaterialState};

/// Isotropic linear elastic material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearElastic {
    /// Young's modulus (Pa).
    pub youngs_modulus: f64,
    /// Poisson's ratio, in (-1, 0.5).
    pub poisson_ratio: f64,
    /// Mass density (kg/m³).
    pub density: f64,
}

impl LinearElastic {
    pub fn new(youngs_modulus: f64, poisson_ratio: f64, density: f64) -> StrataResult<Self> {
        let model = Self {
            youngs_modulus,
            poisson_ratio,
            density,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> StrataResult<()> {
        if !(self.youngs_modulus > 0.0 && self.youngs_modulus.is_finite()) {
            return Err(StrataError::InvalidMaterial(format!(
                "Young's modulus must be positive, got {}",
                self.youngs_modulus
            )));
        }
        if !(self.poisson_ratio > -1.0 && self.poisson_ratio < 0.5) {
            return Err(StrataError::InvalidMaterial(format!(
                "Poisson's ratio must lie in (-1, 0.5), got {}",
                self.poisson_ratio
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

    /// Lamé's first parameter λ.
    pub fn lambda(&self) -> f64 {
        let (e, nu) = (self.youngs_modulus, self.poisson_ratio);
        e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu))
    }

    /// Shear modulus μ.
    pub fn shear_modulus(&self) -> f64 {
        self.youngs_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }
}

impl ConstitutiveModel for LinearElastic {
    fn density(&self) -> f64 {
        self.density
    }

    fn compute_stress(
        &self,
        stress: &SymTensor,
        dstrain: &SymTensor,
        _state: &mut MaterialState,
        _dt: f64,
    ) -> StrataResult<SymTensor> {
        let lambda = self.lambda();
        let mu = self.shear_modulus();
        let dvol = dstrain.trace();
        let dstress = SymTensor::isotropic(lambda * dvol) + *dstrain * (2.0 * mu);
        Ok(*stress + dstress)
    }

    fn name(&self) -> &str {
        "linear_elastic"
    }
}

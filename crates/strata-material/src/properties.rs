//! Tagged material variants and the per-run material table.

use serde::{Deserialize, Serialize};
use strata_math::SymTensor;
use strata_types::{MaterialId, StrataError, StrataResult};

use crate::linear_elastic::LinearElastic;
use crate::newtonian::Newtonian;
use crate::traits::{ConstitutiveModel, MaterialState};

/// A material model selected by configuration.
///
/// Serialized with an internal `model` tag so input files read naturally:
///
/// ```toml
/// [[materials]]
/// model = "linear_elastic"
/// youngs_modulus = 1.0e6
/// poisson_ratio = 0.3
/// density = 1800.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Material {
    LinearElastic(LinearElastic),
    Newtonian(Newtonian),
}

impl Material {
    pub fn validate(&self) -> StrataResult<()> {
        match self {
            Material::LinearElastic(m) => m.validate(),
            Material::Newtonian(m) => m.validate(),
        }
    }

    fn model(&self) -> &dyn ConstitutiveModel {
        match self {
            Material::LinearElastic(m) => m,
            Material::Newtonian(m) => m,
        }
    }
}

impl ConstitutiveModel for Material {
    fn density(&self) -> f64 {
        self.model().density()
    }

    fn initial_state(&self) -> MaterialState {
        self.model().initial_state()
    }

    fn compute_stress(
        &self,
        stress: &SymTensor,
        dstrain: &SymTensor,
        state: &mut MaterialState,
        dt: f64,
    ) -> StrataResult<SymTensor> {
        self.model().compute_stress(stress, dstrain, state, dt)
    }

    fn name(&self) -> &str {
        self.model().name()
    }
}

/// Materials available to a run, indexed by [`MaterialId`].
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new(materials: Vec<Material>) -> StrataResult<Self> {
        for (i, m) in materials.iter().enumerate() {
            m.validate()
                .map_err(|e| StrataError::InvalidMaterial(format!("material {i}: {e}")))?;
        }
        Ok(Self { materials })
    }

    pub fn get(&self, id: MaterialId) -> StrataResult<&Material> {
        self.materials.get(id.index()).ok_or_else(|| {
            StrataError::InvalidMaterial(format!(
                "Unknown material id {} ({} defined)",
                id.0,
                self.materials.len()
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

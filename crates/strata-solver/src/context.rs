//! Explicit per-step context.

use strata_material::MaterialTable;

use crate::config::SchemeConfig;

/// Everything a phase reads besides the domain itself.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub step: u64,
    /// Simulation time at the start of the step.
    pub time: f64,
    pub config: &'a SchemeConfig,
    pub materials: &'a MaterialTable,
}

impl<'a> StepContext<'a> {
    pub fn new(step: u64, time: f64, config: &'a SchemeConfig, materials: &'a MaterialTable) -> Self {
        Self {
            step,
            time,
            config,
            materials,
        }
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.config.newmark.dt
    }
}

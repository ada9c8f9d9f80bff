//! Integration scheme configuration.

use serde::{Deserialize, Serialize};
use strata_math::DVec2;
use strata_types::constants::{DEFAULT_DT, DEFAULT_NEWMARK_BETA, DEFAULT_NEWMARK_GAMMA, GRAVITY};
use strata_types::{StrataError, StrataResult};

/// Newmark family parameters and time-step size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewmarkParams {
    pub beta: f64,
    pub gamma: f64,
    pub dt: f64,
}

impl Default for NewmarkParams {
    /// Average acceleration (trapezoidal rule).
    fn default() -> Self {
        Self {
            beta: DEFAULT_NEWMARK_BETA,
            gamma: DEFAULT_NEWMARK_GAMMA,
            dt: DEFAULT_DT,
        }
    }
}

impl NewmarkParams {
    pub fn validate(&self) -> StrataResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(StrataError::InvalidConfig(format!(
                "Time step must be positive, got {}",
                self.dt
            )));
        }
        if !(self.beta > 0.0 && self.beta <= 0.5) {
            return Err(StrataError::InvalidConfig(format!(
                "newmark_beta must lie in (0, 0.5], got {}",
                self.beta
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(StrataError::InvalidConfig(format!(
                "newmark_gamma must lie in [0, 1], got {}",
                self.gamma
            )));
        }
        Ok(())
    }

    /// `1 / (β Δt²)`, the effective mass scaling.
    #[inline]
    pub fn mass_coefficient(&self) -> f64 {
        1.0 / (self.beta * self.dt * self.dt)
    }

    /// Predicted displacement increment `Δt·v + Δt²(½−β)·a`.
    #[inline]
    pub fn predicted_displacement(&self, v: DVec2, a: DVec2) -> DVec2 {
        v * self.dt + a * (self.dt * self.dt * (0.5 - self.beta))
    }

    /// Predicted velocity `v + (1−γ)Δt·a`.
    #[inline]
    pub fn predicted_velocity(&self, v: DVec2, a: DVec2) -> DVec2 {
        v + a * ((1.0 - self.gamma) * self.dt)
    }

    /// Corrected acceleration from the solved displacement increment.
    #[inline]
    pub fn corrected_acceleration(&self, du: DVec2, v: DVec2, a: DVec2) -> DVec2 {
        du * self.mass_coefficient()
            - v / (self.beta * self.dt)
            - a * (1.0 / (2.0 * self.beta) - 1.0)
    }

    /// Corrected velocity `v + Δt[(1−γ)a + γ a_new]`.
    #[inline]
    pub fn corrected_velocity(&self, v: DVec2, a: DVec2, a_new: DVec2) -> DVec2 {
        v + (a * (1.0 - self.gamma) + a_new * self.gamma) * self.dt
    }
}

/// How particle velocities are updated from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityUpdate {
    /// Add the interpolated nodal velocity increment.
    #[default]
    Flip,
    /// Replace with the interpolated nodal velocity.
    Pic,
}

/// Configuration for [`NewmarkScheme`](crate::NewmarkScheme).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchemeConfig {
    pub newmark: NewmarkParams,
    /// Uniform body acceleration.
    pub gravity: DVec2,
    /// Cundall local damping coefficient α in `[0, 1)`.
    pub damping_factor: f64,
    pub velocity_update: VelocityUpdate,
    /// Average volumetric strain increments over each cell.
    pub pressure_smoothing: bool,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            newmark: NewmarkParams::default(),
            gravity: DVec2::new(0.0, -GRAVITY),
            damping_factor: 0.0,
            velocity_update: VelocityUpdate::default(),
            pressure_smoothing: false,
        }
    }
}

impl SchemeConfig {
    /// A configuration with no body forces, for verification problems.
    pub fn weightless() -> Self {
        Self {
            gravity: DVec2::ZERO,
            ..Default::default()
        }
    }

    pub fn dt(&self) -> f64 {
        self.newmark.dt
    }

    pub fn validate(&self) -> StrataResult<()> {
        self.newmark.validate()?;
        if !(0.0..1.0).contains(&self.damping_factor) {
            return Err(StrataError::InvalidConfig(format!(
                "damping_factor must lie in [0, 1), got {}",
                self.damping_factor
            )));
        }
        if !self.gravity.is_finite() {
            return Err(StrataError::InvalidConfig("gravity must be finite".into()));
        }
        Ok(())
    }
}

//! Symmetric second-order tensor in plane strain.
//!
//! Stress and strain carry the in-plane components `xx`, `yy`, `xy`
//! and the out-of-plane normal component `zz`. Shear components are
//! tensorial (not engineering), so `ε_xy = ½(∂u/∂y + ∂v/∂x)`.

use std::ops::{Add, AddAssign, Mul, Sub};

use glam::{DMat2, DVec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymTensor {
    pub xx: f64,
    pub yy: f64,
    pub zz: f64,
    pub xy: f64,
}

impl SymTensor {
    pub const ZERO: Self = Self {
        xx: 0.0,
        yy: 0.0,
        zz: 0.0,
        xy: 0.0,
    };

    pub fn new(xx: f64, yy: f64, zz: f64, xy: f64) -> Self {
        Self { xx, yy, zz, xy }
    }

    /// Isotropic tensor `s·I`.
    pub fn isotropic(s: f64) -> Self {
        Self::new(s, s, s, 0.0)
    }

    /// Symmetric part of an in-plane gradient, `½(L + Lᵀ)`, with zero `zz`.
    ///
    /// `grad` is column-major: `grad.col(j)[i] = ∂v_i/∂x_j`.
    pub fn symmetric_part(grad: DMat2) -> Self {
        Self {
            xx: grad.x_axis.x,
            yy: grad.y_axis.y,
            zz: 0.0,
            xy: 0.5 * (grad.y_axis.x + grad.x_axis.y),
        }
    }

    /// Full trace `xx + yy + zz`.
    #[inline]
    pub fn trace(&self) -> f64 {
        self.xx + self.yy + self.zz
    }

    /// Mean normal component (negative pressure for stress).
    #[inline]
    pub fn mean(&self) -> f64 {
        self.trace() / 3.0
    }

    /// Deviatoric part `T - (tr T / 3)·I`.
    pub fn deviatoric(&self) -> Self {
        *self - Self::isotropic(self.mean())
    }

    /// In-plane contraction `T·v`.
    #[inline]
    pub fn dot(&self, v: DVec2) -> DVec2 {
        DVec2::new(self.xx * v.x + self.xy * v.y, self.xy * v.x + self.yy * v.y)
    }

    pub fn is_finite(&self) -> bool {
        self.xx.is_finite() && self.yy.is_finite() && self.zz.is_finite() && self.xy.is_finite()
    }
}

impl Add for SymTensor {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.xx + rhs.xx,
            self.yy + rhs.yy,
            self.zz + rhs.zz,
            self.xy + rhs.xy,
        )
    }
}

impl AddAssign for SymTensor {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for SymTensor {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.xx - rhs.xx,
            self.yy - rhs.yy,
            self.zz - rhs.zz,
            self.xy - rhs.xy,
        )
    }
}

impl Mul<f64> for SymTensor {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.xx * s, self.yy * s, self.zz * s, self.xy * s)
    }
}

//! Scalar type alias for the simulation.
//!
//! Implicit time integration and checkpoint/resume equivalence are
//! sensitive to round-off, so the engine runs in double precision.

/// The floating-point type used throughout the simulation.
pub type Scalar = f64;

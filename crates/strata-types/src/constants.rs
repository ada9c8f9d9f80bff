//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Default simulation timestep (seconds).
pub const DEFAULT_DT: f64 = 1.0e-3;

/// Default Newmark β (average acceleration / trapezoidal rule).
pub const DEFAULT_NEWMARK_BETA: f64 = 0.25;

/// Default Newmark γ.
pub const DEFAULT_NEWMARK_GAMMA: f64 = 0.5;

/// Nodes with less mass than this are treated as inactive.
pub const MASS_TOLERANCE: f64 = 1.0e-12;

/// Relative tolerance (in units of dt) for activation-time comparisons.
pub const TIME_TOLERANCE: f64 = 1.0e-9;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1.0e-12;

/// Magic bytes at the head of every checkpoint file.
pub const CHECKPOINT_MAGIC: [u8; 4] = *b"STCK";

/// Current checkpoint format version.
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

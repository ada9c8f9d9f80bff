//! Error types for the Strata engine.
//!
//! All crates return `StrataResult<T>` from fallible operations.

use thiserror::Error;

use crate::ids::ParticleId;

/// Unified error type for the Strata engine.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Configuration value is missing or invalid. Fatal at startup.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Material parameter is out of valid range.
    #[error("Invalid material parameter: {0}")]
    InvalidMaterial(String),

    /// The partition graph is invalid or disconnected. Fatal.
    #[error("Domain decomposition failed: {0}")]
    Decomposition(String),

    /// Message passing between workers failed.
    #[error("Communication error: {0}")]
    Communication(String),

    /// Checkpoint is missing, unreadable, or inconsistent.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// A particle reached a non-physical state.
    #[error("Numerical failure at {particle}: {reason}")]
    NumericalFailure {
        particle: ParticleId,
        reason: String,
    },

    /// A particle left the computational mesh.
    #[error("{particle} left the mesh at ({x:.6}, {y:.6})")]
    ParticleOutsideMesh {
        particle: ParticleId,
        x: f64,
        y: f64,
    },

    /// The installed linear-system solver failed.
    #[error("Solver failure: {0}")]
    SolverFailure(String),

    /// A time step was aborted in the named phase.
    #[error("Step {step} aborted in phase '{phase}': {source}")]
    StepAborted {
        step: u64,
        phase: String,
        #[source]
        source: Box<StrataError>,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StrataError {
    /// Returns true for errors that must abort the run before or during the step loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StrataError::Checkpoint(_))
    }
}

/// Convenience alias for `Result<T, StrataError>`.
pub type StrataResult<T> = Result<T, StrataError>;

//! # strata-checkpoint
//!
//! Durable snapshots of the full simulation state.
//!
//! A checkpoint file is the 4-byte magic `STCK` followed by a
//! bincode-encoded [`CheckpointSnapshot`]. Only the root rank touches the
//! file system; the other ranks take part through collectives.

pub mod manager;
pub mod snapshot;

pub use manager::{CheckpointManager, Restored};
pub use snapshot::CheckpointSnapshot;

//! # strata-partition
//!
//! Ownership of mesh cells and particles across cooperating workers.
//!
//! ## Key Types
//!
//! - [`Communicator`]: point-to-point send/receive and barrier
//! - [`SingleProcess`] / [`ChannelCommunicator`]: no-op and in-memory transports
//! - [`Partition`]: cell-to-rank assignment table
//! - [`Domain`]: mesh, nodes, owned particles, and read-only halo replicas

pub mod collectives;
pub mod comm;
pub mod decompose;
pub mod domain;
pub mod partition;

pub use comm::{ChannelCommunicator, Communicator, SingleProcess, Tag};
pub use decompose::decompose_graph;
pub use domain::{merge_by_id, Domain, DomainParts, ExchangeReport, RedistributionReport};
pub use partition::Partition;

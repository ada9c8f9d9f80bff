//! # strata-telemetry
//!
//! Event bus for simulation telemetry. The driver emits structured
//! events (step timing, redistribution, halo traffic, injections, mass
//! balance, checkpoints) that pluggable sinks consume.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, TracingSink, VecSink};

//! Pluggable event sinks.

use std::sync::{Arc, Mutex};

use crate::events::{EventKind, SimulationEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    fn handle(&mut self, event: &SimulationEvent);

    /// Called once when the run ends.
    fn finalize(&mut self) {}

    fn name(&self) -> &str;
}

/// Collects events in memory.
///
/// Clones share storage, so a handle kept outside the bus can inspect
/// what the registered copy received.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing`. Aborts log at error level, step
/// boundaries at debug, everything else at info.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        match &event.kind {
            EventKind::StepAborted { phase, message } => tracing::error!(
                step = event.step,
                rank = event.rank,
                phase = %phase,
                "{message}"
            ),
            EventKind::StepBegin { .. } | EventKind::StepEnd { .. } => tracing::debug!(
                step = event.step,
                rank = event.rank,
                event = ?event.kind,
                "simulation_event"
            ),
            _ => tracing::info!(
                step = event.step,
                rank = event.rank,
                event = ?event.kind,
                "simulation_event"
            ),
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

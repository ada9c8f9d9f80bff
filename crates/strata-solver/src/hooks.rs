//! Inspection hooks for the phase sequence.
//!
//! Observers are called by the scheme at fixed points of every step and
//! see the domain state read-only.

use std::sync::{Arc, Mutex};

use strata_mesh::{Node, Particle};

use crate::scheme::{Phase, StepReport};

/// Trait for step inspection hooks.
///
/// # Lifecycle
///
/// ```text
/// for each step:
///   observer.on_step_begin(...)
///   for each phase:
///     observer.on_phase_end(...)
///   observer.on_step_end(...)
/// ```
pub trait PhaseObserver: Send {
    fn on_step_begin(&mut self, step: u64, time: f64) {
        let _ = (step, time);
    }

    /// Called after `phase` completed successfully.
    fn on_phase_end(&mut self, step: u64, phase: Phase, nodes: &[Node], particles: &[Particle]) {
        let _ = (step, phase, nodes, particles);
    }

    fn on_step_end(&mut self, report: &StepReport) {
        let _ = report;
    }

    fn name(&self) -> &str;
}

/// Records every completed `(step, phase)` pair.
///
/// Clones share the same log, so a handle kept by the caller sees what
/// the installed copy recorded.
#[derive(Debug, Clone, Default)]
pub struct PhaseRecorder {
    log: Arc<Mutex<Vec<(u64, Phase)>>>,
}

impl PhaseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(u64, Phase)> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Phases recorded for one step, in order.
    pub fn phases_of(&self, step: u64) -> Vec<Phase> {
        self.entries()
            .into_iter()
            .filter(|(s, _)| *s == step)
            .map(|(_, p)| p)
            .collect()
    }
}

impl PhaseObserver for PhaseRecorder {
    fn on_phase_end(&mut self, step: u64, phase: Phase, _nodes: &[Node], _particles: &[Particle]) {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((step, phase));
    }

    fn name(&self) -> &str {
        "phase_recorder"
    }
}

//! Simulation event types.

use serde::{Deserialize, Serialize};

/// An event tagged with the step and rank that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub step: u64,
    pub rank: u32,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    StepBegin {
        /// Simulation time at the start of the step.
        time: f64,
    },

    StepEnd {
        /// Wall-clock seconds spent in the step.
        wall_time: f64,
        particles: usize,
        kinetic_energy: f64,
    },

    /// Cell assignment recomputed.
    Redistribution {
        owned_cells: usize,
        owned_particles: usize,
        sent: usize,
        received: usize,
    },

    HaloExchange {
        sent: usize,
        received: usize,
    },

    /// Scheduled particles activated on this rank.
    Injection {
        activated: usize,
        remaining: usize,
    },

    MassBalance {
        total_mass: f64,
        particle_count: u64,
    },

    Checkpoint {
        path: String,
    },

    Resume {
        /// Step the checkpoint was saved after; `None` on cold start.
        from_step: Option<u64>,
    },

    StepAborted {
        phase: String,
        message: String,
    },

    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    pub fn new(step: u64, rank: u32, kind: EventKind) -> Self {
        Self { step, rank, kind }
    }

    /// Short name of the event kind, for logs.
    pub fn label(&self) -> &str {
        match &self.kind {
            EventKind::StepBegin { .. } => "step_begin",
            EventKind::StepEnd { .. } => "step_end",
            EventKind::Redistribution { .. } => "redistribution",
            EventKind::HaloExchange { .. } => "halo_exchange",
            EventKind::Injection { .. } => "injection",
            EventKind::MassBalance { .. } => "mass_balance",
            EventKind::Checkpoint { .. } => "checkpoint",
            EventKind::Resume { .. } => "resume",
            EventKind::StepAborted { .. } => "step_aborted",
            EventKind::Custom { label, .. } => label,
        }
    }
}

//! Deferred particle activation.

use std::collections::VecDeque;

use strata_mesh::Particle;
use strata_types::constants::TIME_TOLERANCE;

/// Particles ordered by activation time, then id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjectionSchedule {
    pending: VecDeque<Particle>,
}

impl InjectionSchedule {
    pub fn new(mut particles: Vec<Particle>) -> Self {
        particles.sort_by(|a, b| {
            a.activation_time
                .total_cmp(&b.activation_time)
                .then(a.id.cmp(&b.id))
        });
        Self {
            pending: particles.into(),
        }
    }

    /// Separates particles live at `start_time` from those scheduled later.
    pub fn split(particles: Vec<Particle>, start_time: f64, dt: f64) -> (Vec<Particle>, Self) {
        let (live, later): (Vec<_>, Vec<_>) = particles
            .into_iter()
            .partition(|p| is_due(p, start_time, dt));
        (live, Self::new(later))
    }

    /// Removes and returns every particle due at `time`.
    pub fn due(&mut self, time: f64, dt: f64) -> Vec<Particle> {
        let mut out = Vec::new();
        while self.pending.front().is_some_and(|p| is_due(p, time, dt)) {
            if let Some(p) = self.pending.pop_front() {
                out.push(p);
            }
        }
        out
    }

    pub fn next_activation(&self) -> Option<f64> {
        self.pending.front().map(|p| p.activation_time)
    }

    /// Particles still waiting, in activation order.
    pub fn pending(&self) -> Vec<Particle> {
        self.pending.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[inline]
fn is_due(p: &Particle, time: f64, dt: f64) -> bool {
    time + TIME_TOLERANCE * dt >= p.activation_time
}

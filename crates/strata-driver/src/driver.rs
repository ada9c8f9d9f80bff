//! The per-worker step loop.
//!
//! Every rank runs its own [`StepDriver`] over the same [`Simulation`].
//! All collective operations are entered in the same order on every
//! rank, and a failure on any rank aborts the step everywhere.

use std::time::Instant;

use strata_checkpoint::CheckpointManager;
use strata_io::contract::StiffnessKind;
use strata_io::{ArtifactWriter, JsonParticleWriter, OutputSnapshot};
use strata_partition::{collectives, Communicator, Domain, RedistributionReport, SingleProcess};
use strata_solver::{NewmarkScheme, PhaseObserver, SparseNewmarkSolver, StepContext};
use strata_telemetry::{EventBus, EventKind, EventSink, TracingSink};
use strata_types::{StrataError, StrataResult};
use tracing::{error, info, warn};

use crate::injection::InjectionSchedule;
use crate::setup::Simulation;

/// Outcome of a completed run, identical on every rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub start_step: u64,
    pub steps_run: u64,
    /// Last completed step; `None` when no step ran.
    pub final_step: Option<u64>,
    pub resumed: bool,
    pub total_mass: f64,
    pub particle_count: u64,
}

pub struct StepDriver<'a> {
    sim: &'a Simulation,
    domain: Domain,
    scheme: NewmarkScheme,
    schedule: InjectionSchedule,
    writers: Vec<Box<dyn ArtifactWriter>>,
    bus: EventBus,
    checkpoints: CheckpointManager,
    start_step: u64,
    resumed: bool,
    initialised: bool,
}

impl<'a> StepDriver<'a> {
    pub fn new(sim: &'a Simulation, comm: Box<dyn Communicator>) -> StrataResult<Self> {
        let rank = comm.rank();
        let domain = Domain::new(sim.mesh.clone(), sim.boundary.clone(), comm)?;

        let scheme = match sim.input.analysis.stiffness {
            StiffnessKind::Explicit => NewmarkScheme::new(),
            StiffnessKind::Sparse => {
                NewmarkScheme::new().with_stiffness(Box::new(SparseNewmarkSolver::lumped()))
            }
        };

        let mut writers: Vec<Box<dyn ArtifactWriter>> = Vec::new();
        if let Some(dir) = &sim.input.output.directory {
            writers.push(Box::new(JsonParticleWriter::new(dir)));
        }

        let mut bus = EventBus::for_rank(rank.0);
        bus.add_sink(Box::new(TracingSink::new()));

        Ok(Self {
            sim,
            domain,
            scheme,
            schedule: InjectionSchedule::default(),
            writers,
            bus,
            checkpoints: CheckpointManager::new(&sim.input.checkpoint.directory),
            start_step: 0,
            resumed: false,
            initialised: false,
        })
    }

    /// Driver for a single-process run.
    pub fn single(sim: &'a Simulation) -> StrataResult<Self> {
        Self::new(sim, Box::new(SingleProcess))
    }

    pub fn add_writer(&mut self, writer: Box<dyn ArtifactWriter>) {
        self.writers.push(writer);
    }

    pub fn add_observer(&mut self, observer: Box<dyn PhaseObserver>) {
        self.scheme.add_observer(observer);
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.bus.add_sink(sink);
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn schedule(&self) -> &InjectionSchedule {
        &self.schedule
    }

    pub fn start_step(&self) -> u64 {
        self.start_step
    }

    fn dt(&self) -> f64 {
        self.sim.scheme.dt()
    }

    /// Restores from a checkpoint when requested, otherwise cold-starts,
    /// then decomposes the domain. Collective.
    pub fn initialise(&mut self) -> StrataResult<()> {
        let analysis = &self.sim.input.analysis;
        let restored = if analysis.resume {
            self.checkpoints
                .resume(&mut self.domain, analysis.resume_step)?
        } else {
            None
        };

        let report = match restored {
            Some(restored) => {
                self.start_step = restored.step + 1;
                self.resumed = true;
                self.schedule = InjectionSchedule::new(restored.pending);
                self.bus.record(
                    self.start_step,
                    EventKind::Resume {
                        from_step: Some(restored.step),
                    },
                );
                self.domain.decompose(false)?
            }
            None => {
                if analysis.resume {
                    self.bus.record(0, EventKind::Resume { from_step: None });
                }
                self.start_step = 0;
                let (live, schedule) =
                    InjectionSchedule::split(self.sim.particles.clone(), 0.0, self.dt());
                self.schedule = schedule;
                if self.domain.rank().is_root() {
                    self.domain.replace_particles(live);
                }
                self.domain.decompose(true)?
            }
        };
        self.record_redistribution(self.start_step, report);

        if self.domain.rank().is_root() {
            info!(
                start_step = self.start_step,
                resumed = self.resumed,
                workers = self.domain.size(),
                scheduled = self.schedule.len(),
                next_activation = ?self.schedule.next_activation(),
                solver = self.scheme.stiffness_name(),
                "Run initialised"
            );
        }
        self.initialised = true;
        self.bus.flush();
        Ok(())
    }

    fn record_redistribution(&self, step: u64, report: RedistributionReport) {
        self.bus.record(
            step,
            EventKind::Redistribution {
                owned_cells: report.owned_cells,
                owned_particles: report.owned_particles,
                sent: report.migration.sent,
                received: report.migration.received,
            },
        );
    }

    /// Runs from the start step to `nsteps`. Collective.
    pub fn run(&mut self) -> StrataResult<RunSummary> {
        if !self.initialised {
            self.initialise()?;
        }
        let nsteps = self.sim.input.analysis.nsteps;
        let mut final_step = None;
        for step in self.start_step..nsteps {
            if let Err(e) = self.step(step, nsteps) {
                self.bus.flush();
                return Err(e);
            }
            final_step = Some(step);
        }

        for writer in &mut self.writers {
            writer.finish()?;
        }
        let total_mass = self.domain.global_mass()?;
        let particle_count = self.domain.global_particle_count()?;
        let last = final_step.unwrap_or(self.start_step);
        self.bus.record(
            last,
            EventKind::MassBalance {
                total_mass,
                particle_count,
            },
        );
        self.bus.finish();

        let summary = RunSummary {
            start_step: self.start_step,
            steps_run: final_step.map_or(0, |f| f + 1 - self.start_step),
            final_step,
            resumed: self.resumed,
            total_mass,
            particle_count,
        };
        if self.domain.rank().is_root() {
            info!(
                steps = summary.steps_run,
                particles = particle_count,
                total_mass,
                "Run complete"
            );
        }
        Ok(summary)
    }

    /// One step: redistribute, inject, integrate, synchronize, output,
    /// checkpoint.
    fn step(&mut self, step: u64, nsteps: u64) -> StrataResult<()> {
        let dt = self.dt();
        let time = step as f64 * dt;
        let started = Instant::now();
        self.bus.record(step, EventKind::StepBegin { time });

        let every = self.sim.input.analysis.nload_balance_steps;
        if every > 0 && step != self.start_step && step % every == 0 {
            let report = self.domain.decompose(false)?;
            self.record_redistribution(step, report);
        }

        let due = self.schedule.due(time, dt);
        if !due.is_empty() {
            let activated = self.domain.insert_owned(due)?;
            self.domain.transfer_halo_particles()?;
            self.bus.record(
                step,
                EventKind::Injection {
                    activated,
                    remaining: self.schedule.len(),
                },
            );
        }

        let ctx = StepContext::new(step, time, &self.sim.scheme, &self.sim.materials);
        let outcome = self.scheme.run_step(&ctx, self.domain.parts_mut());
        let all_ok = collectives::all_reduce_and(self.domain.comm(), outcome.is_ok())?;
        let report = match outcome {
            Ok(report) if all_ok => report,
            Ok(_) => {
                return Err(StrataError::StepAborted {
                    step,
                    phase: "remote".into(),
                    source: Box::new(StrataError::Communication(
                        "Another worker aborted the step".into(),
                    )),
                })
            }
            Err(failure) => {
                let phase = failure.phase.name().to_string();
                let err = failure.into_step_error(step);
                error!(step, phase = %phase, error = %err, "Step aborted");
                self.bus.record(
                    step,
                    EventKind::StepAborted {
                        phase,
                        message: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        let (_, halo) = self.domain.synchronize()?;
        self.bus.record(
            step,
            EventKind::HaloExchange {
                sent: halo.sent,
                received: halo.received,
            },
        );

        if step % self.sim.input.analysis.output_steps == 0 {
            let snapshot = OutputSnapshot {
                step,
                time: time + dt,
                rank: self.domain.rank(),
                particles: self.domain.particles(),
            };
            for writer in &mut self.writers {
                writer.write(&snapshot)?;
            }
        }

        if self.sim.input.checkpoint.due_after(step, nsteps.saturating_sub(1)) {
            let pending = self.schedule.pending();
            match self.checkpoints.save(&self.domain, step, time + dt, &pending) {
                Ok(path) => self.bus.record(
                    step,
                    EventKind::Checkpoint {
                        path: path.display().to_string(),
                    },
                ),
                Err(e) if !e.is_fatal() => warn!(step, error = %e, "Checkpoint skipped"),
                Err(e) => return Err(e),
            }
        }

        self.bus.record(
            step,
            EventKind::StepEnd {
                wall_time: started.elapsed().as_secs_f64(),
                particles: report.particles,
                kinetic_energy: report.kinetic_energy,
            },
        );
        self.bus.flush();
        Ok(())
    }
}

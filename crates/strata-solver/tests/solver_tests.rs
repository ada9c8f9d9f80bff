//! Integration tests for strata-solver.

use std::sync::{Arc, Mutex};
use std::thread;

use strata_material::{LinearElastic, Material, MaterialTable};
use strata_math::DVec2;
use strata_mesh::generators::{seed_particles, structured_mesh, SeedRegion};
use strata_mesh::{Axis, BoundaryConditions, Face, Mesh, Particle};
use strata_partition::{ChannelCommunicator, Communicator, Domain, SingleProcess};
use strata_solver::{
    NewmarkParams, NewmarkScheme, Phase, PhaseRecorder, SchemeConfig, SparseNewmarkSolver,
    StepContext, StiffnessAssembler, VelocityUpdate,
};
use strata_types::{MaterialId, ParticleId, StrataError, StrataResult};

fn materials() -> MaterialTable {
    MaterialTable::new(vec![Material::LinearElastic(
        LinearElastic::new(1.0e6, 0.3, 1000.0).unwrap(),
    )])
    .unwrap()
}

fn domain_with(mesh: Arc<Mesh>, boundary: BoundaryConditions, particles: Vec<Particle>) -> Domain {
    let mut domain = Domain::new(mesh, boundary, Box::new(SingleProcess)).unwrap();
    domain.replace_particles(particles);
    domain.decompose(true).unwrap();
    domain
}

fn single_particle(position: DVec2, velocity: DVec2, acceleration: DVec2) -> Particle {
    let mut p = Particle::new(
        ParticleId(0),
        MaterialId(0),
        position,
        1.0,
        Default::default(),
    );
    p.velocity = velocity;
    p.acceleration = acceleration;
    p.compute_mass(1000.0).unwrap();
    p
}

fn block(mesh: &Mesh, max: DVec2) -> Vec<Particle> {
    let model = Material::LinearElastic(LinearElastic::new(1.0e6, 0.3, 1000.0).unwrap());
    let region = SeedRegion {
        min: DVec2::ZERO,
        max,
        particles_per_cell: 2,
        material: MaterialId(0),
        velocity: DVec2::ZERO,
        activation_time: 0.0,
    };
    seed_particles(mesh, &region, &model, 0).unwrap()
}

fn run(
    scheme: &mut NewmarkScheme,
    domain: &mut Domain,
    config: &SchemeConfig,
    table: &MaterialTable,
    steps: u64,
) -> StrataResult<()> {
    for step in 0..steps {
        let ctx = StepContext::new(step, step as f64 * config.dt(), config, table);
        scheme
            .run_step(&ctx, domain.parts_mut())
            .map_err(|e| e.into_step_error(step))?;
        domain.synchronize()?;
    }
    Ok(())
}

// ─── Config Tests ────────────────────────────────────────────

#[test]
fn default_parameters_are_average_acceleration() {
    let params = NewmarkParams::default();
    assert_eq!((params.beta, params.gamma), (0.25, 0.5));
    assert!(params.validate().is_ok());
}

#[test]
fn invalid_parameters_rejected() {
    let bad_beta = NewmarkParams { beta: 0.0, ..Default::default() };
    let bad_gamma = NewmarkParams { gamma: 1.5, ..Default::default() };
    let bad_dt = NewmarkParams { dt: -1.0, ..Default::default() };
    assert!(bad_beta.validate().is_err());
    assert!(bad_gamma.validate().is_err());
    assert!(bad_dt.validate().is_err());

    let bad_damping = SchemeConfig { damping_factor: 1.0, ..Default::default() };
    assert!(matches!(bad_damping.validate(), Err(StrataError::InvalidConfig(_))));
}

#[test]
fn velocity_update_parses_from_toml() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        mode: VelocityUpdate,
    }
    let w: Wrapper = toml::from_str("mode = \"pic\"").unwrap();
    assert_eq!(w.mode, VelocityUpdate::Pic);
}

#[test]
fn corrector_inverts_predictor() {
    let params = NewmarkParams::default();
    let v = DVec2::new(1.0, -2.0);
    let a = DVec2::new(0.5, 3.0);
    // With Δu equal to the predicted displacement the corrected
    // acceleration is zero.
    let du = params.predicted_displacement(v, a);
    let a_new = params.corrected_acceleration(du, v, a);
    assert!(a_new.length() < 1e-6);
}

// ─── Scheme Tests ────────────────────────────────────────────

#[test]
fn particle_at_rest_stays_at_rest() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 1, 1).unwrap());
    let p = single_particle(DVec2::splat(0.5), DVec2::ZERO, DVec2::ZERO);
    let initial_mass = p.mass;
    let mut domain = domain_with(mesh, BoundaryConditions::new(), vec![p]);
    let config = SchemeConfig::weightless();
    let table = materials();

    run(&mut NewmarkScheme::new(), &mut domain, &config, &table, 1).unwrap();

    assert_eq!(domain.nodes().len(), 4);
    for node in domain.nodes() {
        assert_eq!(node.velocity, DVec2::ZERO);
        assert_eq!(node.acceleration, DVec2::ZERO);
    }
    let p = &domain.particles()[0];
    assert_eq!(p.velocity, DVec2::ZERO);
    assert_eq!(p.acceleration, DVec2::ZERO);
    assert_eq!(p.position, DVec2::splat(0.5));
    assert_eq!(domain.global_mass().unwrap(), initial_mass);
}

#[test]
fn free_fall_matches_trapezoidal_rule() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::splat(10.0), 1, 1).unwrap());
    let g = DVec2::new(0.0, -2.0);
    let v0 = DVec2::new(0.5, 0.0);
    let x0 = DVec2::new(2.0, 8.0);
    let mut domain = domain_with(mesh, BoundaryConditions::new(), vec![single_particle(x0, v0, g)]);
    let config = SchemeConfig {
        gravity: g,
        newmark: NewmarkParams { dt: 0.01, ..Default::default() },
        ..Default::default()
    };
    let table = materials();

    let steps = 50;
    run(&mut NewmarkScheme::new(), &mut domain, &config, &table, steps).unwrap();

    let t = steps as f64 * config.dt();
    let p = &domain.particles()[0];
    let x = x0 + v0 * t + g * (0.5 * t * t);
    let v = v0 + g * t;
    assert!((p.position - x).length() < 1e-9, "{} vs {x}", p.position);
    assert!((p.velocity - v).length() < 1e-9);
    assert!((p.acceleration - g).length() < 1e-9);
}

#[test]
fn uniform_motion_without_force() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 4, 1).unwrap());
    let v0 = DVec2::new(1.0, 0.0);
    let mut domain = domain_with(
        mesh,
        BoundaryConditions::new(),
        vec![single_particle(DVec2::new(0.5, 0.5), v0, DVec2::ZERO)],
    );
    let config = SchemeConfig {
        newmark: NewmarkParams { dt: 0.1, ..Default::default() },
        ..SchemeConfig::weightless()
    };
    let table = materials();

    run(&mut NewmarkScheme::new(), &mut domain, &config, &table, 20).unwrap();

    let p = &domain.particles()[0];
    assert!((p.position.x - 2.5).abs() < 1e-9);
    assert!((p.velocity - v0).length() < 1e-12);
    // Crossed into the third cell.
    assert_eq!(p.cell.map(|c| c.0), Some(2));
}

#[test]
fn phases_run_in_order_once_per_step() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 2, 2).unwrap());
    let particles = block(&mesh, DVec2::splat(2.0));
    let mut domain = domain_with(mesh, BoundaryConditions::new(), particles);
    let recorder = PhaseRecorder::new();
    let mut scheme = NewmarkScheme::new();
    scheme.add_observer(Box::new(recorder.clone()));
    let config = SchemeConfig::weightless();
    let table = materials();

    run(&mut scheme, &mut domain, &config, &table, 2).unwrap();

    assert_eq!(recorder.phases_of(0), Phase::ALL.to_vec());
    assert_eq!(recorder.phases_of(1), Phase::ALL.to_vec());
    assert_eq!(recorder.entries().len(), 18);
}

#[test]
fn mass_conserved_and_cells_consistent_under_gravity() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 4, 4).unwrap());
    let mut boundary = BoundaryConditions::new();
    boundary.constrain_face(&mesh, Face::Bottom, Axis::Y, 0.0);
    boundary.constrain_face(&mesh, Face::Left, Axis::X, 0.0);
    let particles = block(&mesh, DVec2::new(2.0, 2.0));
    let mut domain = domain_with(mesh.clone(), boundary, particles);
    let before = domain.global_mass().unwrap();
    let config = SchemeConfig {
        newmark: NewmarkParams { dt: 1.0e-4, ..Default::default() },
        damping_factor: 0.05,
        ..Default::default()
    };
    let table = materials();

    run(&mut NewmarkScheme::new(), &mut domain, &config, &table, 25).unwrap();

    assert_eq!(domain.global_mass().unwrap(), before);
    for p in domain.particles() {
        let cell = p.cell.unwrap();
        assert!(mesh.contains(cell, p.position), "{} outside {cell}", p.id);
        assert!(p.stress.is_finite());
    }
    assert!(domain.particles().iter().all(|p| p.displacement.y < 0.0));
}

#[test]
fn sparse_solver_without_stiffness_matches_explicit() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 3, 3).unwrap());
    let mut boundary = BoundaryConditions::new();
    boundary.constrain_face(&mesh, Face::Bottom, Axis::Y, 0.0);
    let particles = block(&mesh, DVec2::new(3.0, 2.0));
    let config = SchemeConfig {
        newmark: NewmarkParams { dt: 1.0e-4, ..Default::default() },
        ..Default::default()
    };
    let table = materials();

    let mut explicit = domain_with(mesh.clone(), boundary.clone(), particles.clone());
    run(&mut NewmarkScheme::new(), &mut explicit, &config, &table, 5).unwrap();

    let mut implicit = domain_with(mesh, boundary, particles);
    let mut scheme = NewmarkScheme::new().with_stiffness(Box::new(SparseNewmarkSolver::lumped()));
    assert_eq!(scheme.stiffness_name(), "sparse_newmark");
    run(&mut scheme, &mut implicit, &config, &table, 5).unwrap();

    for (a, b) in explicit.particles().iter().zip(implicit.particles()) {
        assert_eq!(a.id, b.id);
        assert!((a.position - b.position).length() < 1e-10);
        assert!((a.velocity - b.velocity).length() < 1e-8);
    }
}

/// Diagonal spring on every dof.
struct Springs(f64);

impl StiffnessAssembler for Springs {
    fn assemble(
        &self,
        _ctx: &StepContext<'_>,
        mesh: &Mesh,
        _particles: &[Particle],
        _halo: &[Particle],
    ) -> StrataResult<Vec<(usize, usize, f64)>> {
        Ok((0..mesh.node_count() * 2).map(|d| (d, d, self.0)).collect())
    }
}

/// Records how many owned and halo particles each assembly sees.
#[derive(Clone, Default)]
struct Census(Arc<Mutex<Vec<(usize, usize)>>>);

impl StiffnessAssembler for Census {
    fn assemble(
        &self,
        _ctx: &StepContext<'_>,
        _mesh: &Mesh,
        particles: &[Particle],
        halo: &[Particle],
    ) -> StrataResult<Vec<(usize, usize, f64)>> {
        self.0
            .lock()
            .unwrap()
            .push((particles.len(), halo.len()));
        Ok(Vec::new())
    }
}

#[test]
fn assembler_sees_halo_particles() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 4, 1).unwrap());
    let particles = block(&mesh, DVec2::new(4.0, 1.0));
    let config = SchemeConfig {
        newmark: NewmarkParams { dt: 1.0e-4, ..Default::default() },
        ..SchemeConfig::weightless()
    };
    let table = materials();
    let comms = ChannelCommunicator::cluster(2).unwrap();

    let seen: Vec<(usize, usize, (usize, usize))> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let mesh = mesh.clone();
                let particles = particles.clone();
                let config = &config;
                let table = &table;
                scope.spawn(move || {
                    let root = comm.rank().is_root();
                    let mut domain =
                        Domain::new(mesh, BoundaryConditions::new(), Box::new(comm)).unwrap();
                    if root {
                        domain.replace_particles(particles);
                    }
                    domain.decompose(true).unwrap();
                    let owned = domain.particles().len();
                    let halo = domain.halo().len();

                    let census = Census::default();
                    let mut scheme = NewmarkScheme::new()
                        .with_stiffness(Box::new(SparseNewmarkSolver::new(Box::new(census.clone()))));
                    let ctx = StepContext::new(0, 0.0, config, table);
                    scheme.run_step(&ctx, domain.parts_mut()).unwrap();
                    let recorded = census.0.lock().unwrap()[0];
                    (owned, halo, recorded)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (owned, halo, recorded) in seen {
        assert!(halo > 0);
        assert_eq!(recorded, (owned, halo));
    }
}

#[test]
fn stiffness_resists_displacement() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 1, 1).unwrap());
    let g = DVec2::new(0.0, -10.0);
    let config = SchemeConfig {
        gravity: g,
        newmark: NewmarkParams { dt: 0.01, ..Default::default() },
        ..Default::default()
    };
    let table = materials();
    let start = DVec2::splat(0.5);

    let mut free = domain_with(
        mesh.clone(),
        BoundaryConditions::new(),
        vec![single_particle(start, DVec2::ZERO, DVec2::ZERO)],
    );
    run(&mut NewmarkScheme::new(), &mut free, &config, &table, 1).unwrap();

    let mut stiff = domain_with(
        mesh,
        BoundaryConditions::new(),
        vec![single_particle(start, DVec2::ZERO, DVec2::ZERO)],
    );
    let mut scheme =
        NewmarkScheme::new().with_stiffness(Box::new(SparseNewmarkSolver::new(Box::new(Springs(1.0e7)))));
    run(&mut scheme, &mut stiff, &config, &table, 1).unwrap();

    let drop_free = start.y - free.particles()[0].position.y;
    let drop_stiff = start.y - stiff.particles()[0].position.y;
    assert!(drop_free > 0.0);
    assert!(drop_stiff > 0.0 && drop_stiff < drop_free);
}

#[test]
fn pic_update_replaces_velocity() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 2, 1).unwrap());
    let mut a = single_particle(DVec2::new(0.5, 0.5), DVec2::new(1.0, 0.0), DVec2::ZERO);
    let mut b = single_particle(DVec2::new(0.75, 0.5), DVec2::new(-1.0, 0.0), DVec2::ZERO);
    a.id = ParticleId(0);
    b.id = ParticleId(1);
    let mut domain = domain_with(mesh, BoundaryConditions::new(), vec![a, b]);
    let config = SchemeConfig {
        velocity_update: VelocityUpdate::Pic,
        newmark: NewmarkParams { dt: 1.0e-6, ..Default::default() },
        ..SchemeConfig::weightless()
    };
    let table = materials();

    run(&mut NewmarkScheme::new(), &mut domain, &config, &table, 1).unwrap();

    // Opposite velocities sharing nodes are averaged toward each other.
    let va = domain.particles()[0].velocity.x;
    let vb = domain.particles()[1].velocity.x;
    assert!(va < 1.0 && vb > -1.0);
}

#[test]
fn leaving_the_mesh_aborts_in_locate() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 1, 1).unwrap());
    let mut domain = domain_with(
        mesh,
        BoundaryConditions::new(),
        vec![single_particle(DVec2::splat(0.9), DVec2::new(50.0, 0.0), DVec2::ZERO)],
    );
    let config = SchemeConfig {
        newmark: NewmarkParams { dt: 0.1, ..Default::default() },
        ..SchemeConfig::weightless()
    };
    let table = materials();
    let ctx = StepContext::new(7, 0.7, &config, &table);

    let err = NewmarkScheme::new()
        .run_step(&ctx, domain.parts_mut())
        .unwrap_err();
    assert_eq!(err.phase, Phase::Locate);
    assert!(matches!(err.error, StrataError::ParticleOutsideMesh { .. }));

    match err.into_step_error(7) {
        StrataError::StepAborted { step, phase, .. } => {
            assert_eq!(step, 7);
            assert_eq!(phase, "locate");
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn degenerate_volume_aborts_in_stress_strain() {
    // Two particles rushing together compress the cell by Δt·|∇v| = 2.
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 1, 1).unwrap());
    let mut a = single_particle(DVec2::new(0.25, 0.5), DVec2::new(20.0, 0.0), DVec2::ZERO);
    let mut b = single_particle(DVec2::new(0.75, 0.5), DVec2::new(-20.0, 0.0), DVec2::ZERO);
    a.id = ParticleId(0);
    b.id = ParticleId(1);
    let mut domain = domain_with(mesh, BoundaryConditions::new(), vec![a, b]);
    let config = SchemeConfig {
        newmark: NewmarkParams { dt: 0.1, ..Default::default() },
        ..SchemeConfig::weightless()
    };
    let table = materials();
    let ctx = StepContext::new(3, 0.3, &config, &table);

    let err = NewmarkScheme::new()
        .run_step(&ctx, domain.parts_mut())
        .unwrap_err();
    assert_eq!(err.phase, Phase::StressStrain);
    assert!(matches!(
        err.error,
        StrataError::NumericalFailure { particle: ParticleId(0), .. }
    ));

    match err.into_step_error(3) {
        StrataError::StepAborted { step, phase, source } => {
            assert_eq!(step, 3);
            assert_eq!(phase, "stress_strain");
            assert!(matches!(*source, StrataError::NumericalFailure { .. }));
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn pressure_smoothing_equalises_cell_volumetric_strain() {
    let mesh = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 2, 2).unwrap());
    let mut particles = block(&mesh, DVec2::splat(2.0));
    for p in &mut particles {
        p.velocity = DVec2::new(0.1 * p.position.x * p.position.x, 0.0);
    }
    let mut domain = domain_with(mesh, BoundaryConditions::new(), particles);
    let config = SchemeConfig {
        pressure_smoothing: true,
        newmark: NewmarkParams { dt: 1.0e-4, ..Default::default() },
        ..SchemeConfig::weightless()
    };
    let table = materials();

    run(&mut NewmarkScheme::new(), &mut domain, &config, &table, 1).unwrap();

    let in_cell0: Vec<f64> = domain
        .particles()
        .iter()
        .filter(|p| p.cell.map(|c| c.0) == Some(0))
        .map(|p| p.dstrain.trace())
        .collect();
    assert!(in_cell0.len() > 1);
    for t in &in_cell0 {
        assert!((t - in_cell0[0]).abs() < 1e-15);
    }
}

//! Integration tests for strata-io.

use strata_io::contract::{StiffnessKind, SimulationInput};
use strata_io::validator::validate_input;
use strata_io::writers::{ArtifactWriter, JsonParticleWriter, MemoryWriter, OutputSnapshot};
use strata_math::DVec2;
use strata_mesh::{Axis, Face, Particle};
use strata_solver::VelocityUpdate;
use strata_types::{MaterialId, ParticleId, Rank, StrataError};

const VALID: &str = r#"
[analysis]
dt = 1.0e-4
nsteps = 20
output_steps = 5
nload_balance_steps = 10
damping_factor = 0.05
velocity_update = "pic"
gravity = [0.0, -9.81]
workers = 2

[mesh]
cell_size = [0.5, 0.5]
cells = [4, 4]

[[materials]]
model = "linear_elastic"
youngs_modulus = 1.0e6
poisson_ratio = 0.3
density = 1000.0

[[materials]]
model = "newtonian"
bulk_modulus = 2.0e6
dynamic_viscosity = 1.0e-3
density = 1000.0

[[particle_sets]]
material = 0
min = [0.0, 0.0]
max = [1.0, 1.0]
particles_per_cell = 2

[[particle_sets]]
material = 1
min = [1.0, 1.0]
max = [2.0, 2.0]
particles_per_cell = 1
activation_time = 0.001

[[constraints]]
face = "bottom"
axis = "y"

[[nodal_forces]]
node = 24
force = [1.0, 0.0]

[checkpoint]
directory = "ckpt"
every = 10
at_end = true
"#;

fn valid() -> SimulationInput {
    SimulationInput::from_toml_str(VALID).unwrap()
}

fn expect_config_error(input: &SimulationInput) {
    assert!(
        matches!(validate_input(input), Err(StrataError::InvalidConfig(_))),
        "expected a configuration error"
    );
}

// ─── Contract Tests ───────────────────────────────────────────

#[test]
fn parses_full_document() {
    let input = valid();
    assert_eq!(input.analysis.nsteps, 20);
    assert_eq!(input.analysis.velocity_update, VelocityUpdate::Pic);
    assert_eq!(input.analysis.stiffness, StiffnessKind::Explicit);
    assert_eq!(input.analysis.newmark_beta, 0.25);
    assert_eq!(input.materials.len(), 2);
    assert_eq!(input.constraints[0].face, Face::Bottom);
    assert_eq!(input.constraints[0].axis, Axis::Y);
    assert_eq!(input.constraints[0].velocity, 0.0);
    assert!(input.output.directory.is_none());
}

#[test]
fn derived_objects_follow_input() {
    let input = valid();
    let mesh = input.build_mesh().unwrap();
    assert_eq!(mesh.cell_count(), 16);
    let scheme = input.scheme_config();
    assert_eq!(scheme.dt(), 1.0e-4);
    assert_eq!(scheme.gravity, DVec2::new(0.0, -9.81));
    let bc = input.boundary_conditions(&mesh);
    assert_eq!(bc.velocity_constraints.len(), 5);
    assert_eq!(bc.nodal_forces.len(), 1);
    let regions = input.seed_regions();
    assert_eq!(regions[1].material, MaterialId(1));
    assert_eq!(regions[1].activation_time, 0.001);
}

#[test]
fn unknown_keys_are_rejected() {
    let text = VALID.replace("workers = 2", "workers = 2\nwrokers = 3");
    assert!(matches!(
        SimulationInput::from_toml_str(&text),
        Err(StrataError::InvalidConfig(_))
    ));
}

#[test]
fn missing_required_option_is_rejected() {
    let text = VALID.replace("dt = 1.0e-4\n", "");
    assert!(SimulationInput::from_toml_str(&text).is_err());
}

#[test]
fn toml_round_trip() {
    let input = valid();
    let text = input.to_toml_string().unwrap();
    assert_eq!(SimulationInput::from_toml_str(&text).unwrap(), input);
}

#[test]
fn checkpoint_cadence() {
    let input = valid();
    let due: Vec<u64> = (0..20).filter(|&s| input.checkpoint.due_after(s, 19)).collect();
    assert_eq!(due, vec![9, 19]);
}

// ─── Validator Tests ──────────────────────────────────────────

#[test]
fn valid_input_passes() {
    assert!(validate_input(&valid()).is_ok());
}

#[test]
fn interface_flag_only_warns() {
    let mut input = valid();
    input.analysis.interface = true;
    assert!(validate_input(&input).is_ok());
}

#[test]
fn non_positive_dt_rejected() {
    let mut input = valid();
    input.analysis.dt = 0.0;
    expect_config_error(&input);
}

#[test]
fn newmark_ranges_enforced() {
    let mut input = valid();
    input.analysis.newmark_beta = 0.6;
    expect_config_error(&input);

    let mut input = valid();
    input.analysis.newmark_gamma = -0.1;
    expect_config_error(&input);

    let mut input = valid();
    input.analysis.damping_factor = 1.0;
    expect_config_error(&input);
}

#[test]
fn zero_cells_rejected() {
    let mut input = valid();
    input.mesh.cells = [0, 4];
    expect_config_error(&input);
}

#[test]
fn unknown_material_rejected() {
    let mut input = valid();
    input.particle_sets[0].material = 7;
    expect_config_error(&input);
}

#[test]
fn empty_region_rejected() {
    let mut input = valid();
    input.particle_sets[0].max = [0.0, 1.0];
    expect_config_error(&input);

    let mut input = valid();
    input.particle_sets[0].min = [5.0, 5.0];
    input.particle_sets[0].max = [6.0, 6.0];
    expect_config_error(&input);
}

#[test]
fn zero_workers_and_cadence_rejected() {
    let mut input = valid();
    input.analysis.workers = 0;
    expect_config_error(&input);

    let mut input = valid();
    input.analysis.output_steps = 0;
    expect_config_error(&input);
}

#[test]
fn nodal_force_outside_mesh_rejected() {
    let mut input = valid();
    input.nodal_forces[0].node = 25;
    expect_config_error(&input);
}

// ─── Writer Tests ─────────────────────────────────────────────

fn sample() -> Vec<Particle> {
    (0..3)
        .map(|i| {
            let mut p = Particle::new(
                ParticleId(i),
                MaterialId(0),
                DVec2::new(i as f64, 0.5),
                0.5,
                Default::default(),
            );
            p.mass = 2.0;
            p
        })
        .collect()
}

#[test]
fn memory_writer_records_summary() {
    let particles = sample();
    let writer = MemoryWriter::new();
    let mut boxed: Box<dyn ArtifactWriter> = Box::new(writer.clone());
    for step in [0, 5] {
        boxed
            .write(&OutputSnapshot {
                step,
                time: step as f64,
                rank: Rank(1),
                particles: &particles,
            })
            .unwrap();
    }
    assert_eq!(writer.steps(), vec![0, 5]);
    assert_eq!(writer.records()[1].mass, 6.0);
    assert_eq!(writer.records()[1].rank, Rank(1));
}

#[test]
fn json_writer_emits_one_file_per_rank_and_step() {
    let dir = std::env::temp_dir().join(format!("strata_io_json_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let particles = sample();
    let mut writer = JsonParticleWriter::new(&dir);
    writer
        .write(&OutputSnapshot {
            step: 3,
            time: 0.3,
            rank: Rank(0),
            particles: &particles,
        })
        .unwrap();

    let path = writer.path_for(Rank(0), 3);
    assert!(path.ends_with("particles_r0_00000003.json"));
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["step"], 3);
    assert_eq!(value["particles"].as_array().unwrap().len(), 3);
    assert_eq!(value["particles"][2]["position"][0], 2.0);
    let _ = std::fs::remove_dir_all(&dir);
}

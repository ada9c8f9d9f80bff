//! Integration tests for strata-mesh.

use strata_material::{LinearElastic, Material};
use strata_math::{DVec2, SymTensor};
use strata_mesh::generators::{create_nodes, seed_particles, structured_mesh, SeedRegion};
use strata_mesh::shapefn;
use strata_mesh::{Axis, BoundaryConditions, CellGraph, Face, Mesh, Particle};
use strata_types::{CellId, MaterialId, NodeId, ParticleId, StrataError};

fn elastic() -> Material {
    Material::LinearElastic(LinearElastic::new(1.0e6, 0.3, 1000.0).unwrap())
}

fn unit_mesh(nx: usize, ny: usize) -> Mesh {
    structured_mesh(DVec2::ZERO, DVec2::ONE, nx, ny).unwrap()
}

// ─── Mesh Tests ───────────────────────────────────────────────

#[test]
fn rejects_empty_mesh() {
    assert!(Mesh::structured(DVec2::ZERO, DVec2::ONE, 0, 3).is_err());
    assert!(Mesh::structured(DVec2::ZERO, DVec2::new(1.0, 0.0), 2, 2).is_err());
}

#[test]
fn cell_nodes_counter_clockwise() {
    let mesh = unit_mesh(2, 1);
    let cell = mesh.cell(CellId(1)).unwrap();
    assert_eq!(cell.nodes, [NodeId(1), NodeId(2), NodeId(5), NodeId(4)]);
    assert_eq!(mesh.node_position(NodeId(5)), DVec2::new(2.0, 1.0));
}

#[test]
fn locate_inside_and_outside() {
    let mesh = unit_mesh(3, 2);
    assert_eq!(mesh.locate(DVec2::new(0.5, 0.5)), Some(CellId(0)));
    assert_eq!(mesh.locate(DVec2::new(2.5, 1.5)), Some(CellId(5)));
    // Upper/right edge belongs to the last cell.
    assert_eq!(mesh.locate(DVec2::new(3.0, 2.0)), Some(CellId(5)));
    assert_eq!(mesh.locate(DVec2::new(-0.1, 0.5)), None);
    assert_eq!(mesh.locate(DVec2::new(1.0, 2.1)), None);
    assert_eq!(mesh.locate(DVec2::new(f64::NAN, 0.0)), None);
}

#[test]
fn located_cell_contains_point() {
    let mesh = structured_mesh(DVec2::new(-1.0, 2.0), DVec2::new(0.25, 0.5), 8, 4).unwrap();
    for k in 0..50 {
        let p = DVec2::new(-1.0 + 0.039 * k as f64, 2.0 + 0.037 * k as f64);
        let cell = mesh.locate(p).unwrap();
        assert!(mesh.contains(cell, p));
    }
}

#[test]
fn local_coordinates_of_centre_are_zero() {
    let mesh = unit_mesh(2, 2);
    let xi = mesh.local_coordinates(CellId(3), mesh.cell_centre(CellId(3)));
    assert!(xi.length() < 1e-14);
}

#[test]
fn shape_data_interpolates_linear_field() {
    let mesh = structured_mesh(DVec2::ZERO, DVec2::new(2.0, 1.0), 1, 1).unwrap();
    let p = DVec2::new(0.5, 0.25);
    let data = mesh.shape_data(CellId(0), p);
    let cell = mesh.cell(CellId(0)).unwrap();
    let x: f64 = cell
        .nodes
        .iter()
        .zip(data.values.iter())
        .map(|(n, w)| mesh.node_position(*n).x * w)
        .sum();
    assert!((x - 0.5).abs() < 1e-14);
    let grad_x: f64 = cell
        .nodes
        .iter()
        .zip(data.gradients.iter())
        .map(|(n, g)| mesh.node_position(*n).x * g.x)
        .sum();
    assert!((grad_x - 1.0).abs() < 1e-14);
}

#[test]
fn neighbours_of_corner_and_interior() {
    let mesh = unit_mesh(3, 3);
    assert_eq!(mesh.cell_neighbours(CellId(0)).len(), 3);
    assert_eq!(mesh.cell_neighbours(CellId(4)).len(), 8);
}

// ─── CellGraph Tests ──────────────────────────────────────────

#[test]
fn graph_is_valid_and_connected() {
    let graph = CellGraph::build(&unit_mesh(4, 3));
    assert_eq!(graph.vertex_count(), 12);
    assert!(graph.validate().is_ok());
    assert_eq!(graph.breadth_first_order().len(), 12);
}

#[test]
fn disconnected_graph_is_rejected() {
    let graph = CellGraph {
        xadj: vec![0, 1, 2, 2],
        adjncy: vec![1, 0],
    };
    assert!(matches!(graph.validate(), Err(StrataError::Decomposition(_))));
}

#[test]
fn asymmetric_graph_is_rejected() {
    let graph = CellGraph {
        xadj: vec![0, 1, 1],
        adjncy: vec![1],
    };
    assert!(graph.validate().is_err());
}

// ─── Boundary Tests ───────────────────────────────────────────

#[test]
fn face_node_sets() {
    let mesh = unit_mesh(2, 3);
    assert_eq!(Face::Bottom.nodes(&mesh), vec![NodeId(0), NodeId(1), NodeId(2)]);
    assert_eq!(Face::Left.nodes(&mesh).len(), 4);
    assert_eq!(Face::Top.nodes(&mesh)[0], NodeId(9));
    assert_eq!(Face::Right.nodes(&mesh)[3], NodeId(11));
}

#[test]
fn boundary_apply_survives_reset() {
    let mesh = unit_mesh(1, 1);
    let mut nodes = create_nodes(&mesh);
    let mut bc = BoundaryConditions::new();
    bc.constrain_face(&mesh, Face::Bottom, Axis::Y, 0.0);
    bc.add_nodal_force(NodeId(3), DVec2::new(0.0, -5.0));
    bc.validate(&mesh).unwrap();
    bc.apply(&mut nodes);

    nodes[0].mass = 1.0;
    nodes[0].momentum = DVec2::new(2.0, -3.0);
    nodes[0].compute_velocity_acceleration();
    assert_eq!(nodes[0].velocity, DVec2::new(2.0, 0.0));

    nodes[0].reset();
    assert_eq!(nodes[0].mass, 0.0);
    assert_eq!(nodes[0].velocity_constraints[1], Some(0.0));
    assert_eq!(nodes[3].concentrated_force, DVec2::new(0.0, -5.0));
}

#[test]
fn boundary_rejects_missing_node() {
    let mesh = unit_mesh(1, 1);
    let mut bc = BoundaryConditions::new();
    bc.add_nodal_force(NodeId(99), DVec2::X);
    assert!(bc.validate(&mesh).is_err());
}

// ─── Particle Tests ───────────────────────────────────────────

#[test]
fn seeding_counts_and_mass() {
    let mesh = unit_mesh(2, 2);
    let region = SeedRegion {
        min: DVec2::ZERO,
        max: DVec2::new(2.0, 1.0),
        particles_per_cell: 2,
        material: MaterialId(0),
        velocity: DVec2::ZERO,
        activation_time: 0.0,
    };
    let particles = seed_particles(&mesh, &region, &elastic(), 10).unwrap();
    assert_eq!(particles.len(), 8);
    assert_eq!(particles[0].id, ParticleId(10));
    let total: f64 = particles.iter().map(|p| p.mass).sum();
    assert!((total - 2.0 * 1000.0).abs() < 1e-9);
    for p in &particles {
        assert_eq!(mesh.locate(p.position), p.cell);
    }
}

#[test]
fn compute_mass_rejects_bad_volume() {
    let mut p = Particle::new(ParticleId(0), MaterialId(0), DVec2::ZERO, 0.0, Default::default());
    assert!(matches!(
        p.compute_mass(1000.0),
        Err(StrataError::NumericalFailure { .. })
    ));
}

#[test]
fn strain_from_uniform_stretch() {
    let mesh = unit_mesh(1, 1);
    let mut nodes = create_nodes(&mesh);
    // v_x = x: uniform stretch rate 1 along x.
    for n in nodes.iter_mut() {
        n.velocity = DVec2::new(n.position.x, 0.0);
    }
    let mut p = Particle::new(
        ParticleId(0),
        MaterialId(0),
        DVec2::new(0.3, 0.6),
        0.25,
        Default::default(),
    );
    p.locate(&mesh).unwrap();
    p.compute_shape_functions(&mesh).unwrap();
    p.compute_strain(&mesh, &nodes, 0.01).unwrap();

    assert!((p.dstrain.xx - 0.01).abs() < 1e-14);
    assert!(p.dstrain.yy.abs() < 1e-14);
    assert!(p.dstrain.xy.abs() < 1e-14);

    p.update_volume().unwrap();
    assert!((p.volume - 0.25 * 1.01).abs() < 1e-14);

    p.compute_stress(&elastic(), 0.01).unwrap();
    assert!(p.stress.xx > 0.0);
}

#[test]
fn collapsed_volume_is_a_failure() {
    let mut p = Particle::new(ParticleId(4), MaterialId(0), DVec2::ZERO, 1.0, Default::default());
    p.dstrain = SymTensor::new(-0.6, -0.6, 0.0, 0.0);
    match p.update_volume() {
        Err(StrataError::NumericalFailure { particle, .. }) => assert_eq!(particle, ParticleId(4)),
        other => panic!("expected numerical failure, got {other:?}"),
    }
}

#[test]
fn locate_outside_reports_particle() {
    let mesh = unit_mesh(1, 1);
    let mut p = Particle::new(ParticleId(9), MaterialId(0), DVec2::new(2.0, 0.5), 1.0, Default::default());
    assert!(matches!(
        p.locate(&mesh),
        Err(StrataError::ParticleOutsideMesh { .. })
    ));
}

#[test]
fn shape_values_sum_to_one_inside_cell() {
    let sum: f64 = shapefn::values(DVec2::new(-0.4, 0.9)).iter().sum();
    assert!((sum - 1.0).abs() < 1e-14);
}

#[test]
fn particle_serializes_without_shape_cache() {
    let mesh = unit_mesh(1, 1);
    let mut p = Particle::new(ParticleId(1), MaterialId(0), DVec2::new(0.5, 0.5), 1.0, Default::default());
    p.locate(&mesh).unwrap();
    p.compute_shape_functions(&mesh).unwrap();
    let json = serde_json::to_string(&p).unwrap();
    let back: Particle = serde_json::from_str(&json).unwrap();
    assert!(back.shape.is_none());
    assert_eq!(back.cell, p.cell);
    assert_eq!(back.position, p.position);
}

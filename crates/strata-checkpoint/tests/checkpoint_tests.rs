//! Integration tests for strata-checkpoint.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use strata_checkpoint::{CheckpointManager, CheckpointSnapshot};
use strata_material::{LinearElastic, Material};
use strata_math::DVec2;
use strata_mesh::generators::{seed_particles, structured_mesh, SeedRegion};
use strata_mesh::{Axis, BoundaryConditions, Face, Mesh, Particle};
use strata_partition::{ChannelCommunicator, Communicator, Domain, SingleProcess};
use strata_types::{MaterialId, Rank, StrataError};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("strata_ckpt_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn mesh() -> Arc<Mesh> {
    Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 4, 2).unwrap())
}

fn particles(mesh: &Mesh, activation_time: f64, first_id: u64) -> Vec<Particle> {
    let model = Material::LinearElastic(LinearElastic::new(1.0e6, 0.3, 1000.0).unwrap());
    let region = SeedRegion {
        min: DVec2::ZERO,
        max: DVec2::new(4.0, 1.0),
        particles_per_cell: 2,
        material: MaterialId(0),
        velocity: DVec2::new(0.25, 0.0),
        activation_time,
    };
    seed_particles(mesh, &region, &model, first_id).unwrap()
}

fn boundary(mesh: &Mesh) -> BoundaryConditions {
    let mut bc = BoundaryConditions::new();
    bc.constrain_face(mesh, Face::Bottom, Axis::Y, 0.0);
    bc
}

fn domain(comm: Box<dyn Communicator>) -> Domain {
    let m = mesh();
    let root = comm.rank().is_root();
    let mut d = Domain::new(m.clone(), boundary(&m), comm).unwrap();
    if root {
        d.replace_particles(particles(&m, 0.0, 0));
    }
    d.decompose(true).unwrap();
    d
}

// ─── Snapshot Tests ──────────────────────────────────────────

#[test]
fn header_is_checked() {
    let err = CheckpointSnapshot::from_bytes(b"NOPE....").unwrap_err();
    assert!(matches!(err, StrataError::Checkpoint(_)));
    let err = CheckpointSnapshot::from_bytes(b"STCK\x01").unwrap_err();
    assert!(matches!(err, StrataError::Checkpoint(_)));
}

// ─── Save / Resume Tests ─────────────────────────────────────

#[test]
fn save_then_resume_restores_state() {
    let dir = temp_dir("roundtrip");
    let manager = CheckpointManager::new(&dir);
    let m = mesh();
    let pending = particles(&m, 0.5, 100);

    let saved = domain(Box::new(SingleProcess));
    let path = manager.save(&saved, 4, 0.005, &pending).unwrap();
    assert!(path.ends_with("checkpoint_00000004.bin"));
    assert_eq!(manager.latest_step().unwrap(), Some(4));

    let mut fresh = Domain::new(m.clone(), BoundaryConditions::new(), Box::new(SingleProcess)).unwrap();
    let restored = manager.resume(&mut fresh, None).unwrap().unwrap();
    assert_eq!(restored.step, 4);
    assert_eq!(restored.time, 0.005);
    assert_eq!(restored.pending.len(), pending.len());
    assert_eq!(fresh.boundary(), saved.boundary());
    assert_eq!(fresh.partition(), saved.partition());

    let before: Vec<_> = saved.particles().iter().map(|p| (p.id, p.position, p.velocity, p.mass)).collect();
    let after: Vec<_> = fresh.particles().iter().map(|p| (p.id, p.position, p.velocity, p.mass)).collect();
    assert_eq!(before, after);
    // Constraints re-applied to nodes.
    assert_eq!(fresh.nodes()[0].velocity_constraints[Axis::Y.index()], Some(0.0));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn latest_checkpoint_is_chosen() {
    let dir = temp_dir("latest");
    let manager = CheckpointManager::new(&dir);
    let d = domain(Box::new(SingleProcess));
    manager.save(&d, 2, 0.0, &[]).unwrap();
    manager.save(&d, 10, 0.0, &[]).unwrap();
    manager.save(&d, 7, 0.0, &[]).unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    assert_eq!(manager.available_steps().unwrap(), vec![2, 7, 10]);
    let mut fresh = Domain::new(mesh(), BoundaryConditions::new(), Box::new(SingleProcess)).unwrap();
    let restored = manager.resume(&mut fresh, None).unwrap().unwrap();
    assert_eq!(restored.step, 10);

    let restored = manager.resume(&mut fresh, Some(7)).unwrap().unwrap();
    assert_eq!(restored.step, 7);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_checkpoint_falls_back_to_cold_start() {
    let manager = CheckpointManager::new(temp_dir("missing"));
    let mut d = Domain::new(mesh(), BoundaryConditions::new(), Box::new(SingleProcess)).unwrap();
    assert!(manager.resume(&mut d, None).unwrap().is_none());
    assert!(manager.resume(&mut d, Some(3)).unwrap().is_none());
    assert!(d.particles().is_empty());
}

#[test]
fn corrupt_checkpoint_falls_back_to_cold_start() {
    let dir = temp_dir("corrupt");
    fs::create_dir_all(&dir).unwrap();
    let manager = CheckpointManager::new(&dir);
    fs::write(manager.path_for(3), b"STCKgarbage").unwrap();
    let mut d = Domain::new(mesh(), BoundaryConditions::new(), Box::new(SingleProcess)).unwrap();
    assert!(manager.resume(&mut d, None).unwrap().is_none());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn mismatched_mesh_is_rejected() {
    let dir = temp_dir("mesh");
    let manager = CheckpointManager::new(&dir);
    let d = domain(Box::new(SingleProcess));
    manager.save(&d, 1, 0.0, &[]).unwrap();

    let other = Arc::new(structured_mesh(DVec2::ZERO, DVec2::ONE, 8, 2).unwrap());
    let mut fresh = Domain::new(other.clone(), BoundaryConditions::new(), Box::new(SingleProcess)).unwrap();
    assert!(manager.resume(&mut fresh, None).unwrap().is_none());

    let snapshot = manager.read(&manager.path_for(1)).unwrap();
    assert!(snapshot.validate(&other).is_err());
    assert!(snapshot.validate(&mesh()).is_ok());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn duplicate_ids_fail_validation() {
    let dir = temp_dir("dup");
    let manager = CheckpointManager::new(&dir);
    let d = domain(Box::new(SingleProcess));
    let duplicate = vec![d.particles()[0].clone()];
    manager.save(&d, 1, 0.0, &duplicate).unwrap();
    let snapshot = manager.read(&manager.path_for(1)).unwrap();
    assert!(matches!(snapshot.validate(&mesh()), Err(StrataError::Checkpoint(_))));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn cluster_save_and_resume_with_different_rank_count() {
    let dir = temp_dir("cluster");
    let manager = CheckpointManager::new(&dir);

    let comms = ChannelCommunicator::cluster(2).unwrap();
    std::thread::scope(|s| {
        for c in comms {
            let manager = &manager;
            s.spawn(move || {
                let d = domain(Box::new(c));
                manager.save(&d, 5, 0.1, &[]).unwrap();
            });
        }
    });

    let snapshot = manager.read(&manager.path_for(5)).unwrap();
    assert_eq!(snapshot.nranks, 2);
    assert_eq!(snapshot.particles.len(), 16);
    assert!(snapshot.particles.windows(2).all(|w| w[0].id < w[1].id));

    // Three workers cannot adopt a two-rank table: everything lands on root.
    let comms = ChannelCommunicator::cluster(3).unwrap();
    let counts: Vec<(Rank, usize, usize)> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|c| {
                let manager = &manager;
                s.spawn(move || {
                    let mut d = Domain::new(mesh(), BoundaryConditions::new(), Box::new(c)).unwrap();
                    manager.resume(&mut d, None).unwrap().unwrap();
                    let held = d.particles().len();
                    d.decompose(false).unwrap();
                    (d.rank(), held, d.particles().len())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts[0].1, 16);
    assert_eq!(counts[1].1 + counts[2].1, 0);
    assert_eq!(counts.iter().map(|c| c.2).sum::<usize>(), 16);
    assert!(counts.iter().all(|c| c.2 > 0));
    let _ = fs::remove_dir_all(&dir);
}

//! Procedural mesh and particle generators.
//!
//! These generators are deterministic: every worker that runs them with
//! the same arguments produces identical ids and positions.

use strata_material::ConstitutiveModel;
use strata_math::DVec2;
use strata_types::{MaterialId, NodeId, ParticleId, StrataError, StrataResult};

use crate::mesh::Mesh;
use crate::node::Node;
use crate::particle::Particle;

/// Generates an `nx × ny` structured mesh.
///
/// # Example
/// ```
/// use strata_math::DVec2;
/// use strata_mesh::generators::structured_mesh;
/// let mesh = structured_mesh(DVec2::ZERO, DVec2::ONE, 2, 2).unwrap();
/// assert_eq!(mesh.cell_count(), 4);
/// assert_eq!(mesh.node_count(), 9);
/// ```
pub fn structured_mesh(origin: DVec2, cell_size: DVec2, nx: usize, ny: usize) -> StrataResult<Mesh> {
    Mesh::structured(origin, cell_size, nx, ny)
}

/// Creates the node array of a mesh, all accumulators zeroed.
pub fn create_nodes(mesh: &Mesh) -> Vec<Node> {
    (0..mesh.node_count())
        .map(|i| {
            let id = NodeId(i as u32);
            Node::new(id, mesh.node_position(id))
        })
        .collect()
}

/// A particle seeding request.
#[derive(Debug, Clone, Copy)]
pub struct SeedRegion {
    pub min: DVec2,
    pub max: DVec2,
    /// Particles per cell along each axis.
    pub particles_per_cell: u32,
    pub material: MaterialId,
    pub velocity: DVec2,
    pub activation_time: f64,
}

/// Places `ppc × ppc` evenly spaced particles in every cell, keeping
/// those inside the region. Ids start at `first_id`.
///
/// Mass is computed from the model density; each particle's owning cell
/// is resolved.
pub fn seed_particles(
    mesh: &Mesh,
    region: &SeedRegion,
    model: &dyn ConstitutiveModel,
    first_id: u64,
) -> StrataResult<Vec<Particle>> {
    let ppc = region.particles_per_cell;
    if ppc == 0 {
        return Err(StrataError::InvalidConfig(
            "particles_per_cell must be at least 1".into(),
        ));
    }

    let cell_size = mesh.cell_size();
    let spacing = cell_size / ppc as f64;
    let volume = mesh.cell_area() / (ppc * ppc) as f64;
    let mut particles = Vec::new();
    let mut next_id = first_id;

    for cell in mesh.cells() {
        let corner = mesh.cell_centre(cell.id) - cell_size * 0.5;
        // Row-major within the cell so ids follow y then x.
        for b in 0..ppc {
            for a in 0..ppc {
                let offset = DVec2::new(a as f64 + 0.5, b as f64 + 0.5) * spacing;
                let point = corner + offset;
                if point.cmplt(region.min).any() || point.cmpgt(region.max).any() {
                    continue;
                }
                let mut p = Particle::new(
                    ParticleId(next_id),
                    region.material,
                    point,
                    volume,
                    model.initial_state(),
                );
                p.velocity = region.velocity;
                p.activation_time = region.activation_time;
                p.compute_mass(model.density())?;
                p.cell = Some(cell.id);
                particles.push(p);
                next_id += 1;
            }
        }
    }

    Ok(particles)
}

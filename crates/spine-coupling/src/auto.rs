//! Auto-mode orchestration: solve the whole body as FEM once, evaluate the
//! switching criteria, rebuild the zone split, and re-run through the
//! coupled driver only if anything actually switched (spec.md §4.10
//! "Auto mode").

use crate::criteria::{dilate, von_mises_threshold};
use crate::driver::{solve_coupled, DnConfig};
use crate::zone_split::split;
use spine_core::materials::Material;
use spine_core::mesh::Mesh;
use spine_core::solve_result::SolveResult;
use spine_core::static_solver::solve_linear;
use spine_pd::particles::ParticleSystem;
use spine_pd::BondSystem;

#[derive(Debug, Clone, Copy)]
pub struct AutoConfig {
    pub von_mises_threshold: f64,
    pub buffer_layers: usize,
    pub pd_horizon: f64,
    pub pd_neighbor_margin: usize,
    /// Bulk/shear moduli handed to every particle created by a switch; the
    /// caller already knows these for whichever material it assigns the
    /// switched region (the correspondence model needs them directly, not
    /// derived from the `Material` enum's internal linearization).
    pub pd_bulk: f64,
    pub pd_shear: f64,
    pub pd_density: f64,
    pub dn_config: DnConfig,
}

pub enum AutoOutcome {
    /// No element crossed the switching threshold; the initial FEM solve
    /// already stands as the final answer.
    FullFem(SolveResult),
    /// At least one element switched; the coupled driver ran to produce
    /// the final result.
    Coupled(SolveResult),
}

/// Runs the full auto-mode pipeline against an already-built FEM mesh and
/// an initial per-particle material to use for any region that switches.
pub fn run_auto(
    fem_mesh: &mut Mesh,
    fem_materials: &mut [Material],
    pd_material: &mut Material,
    config: &AutoConfig,
) -> crate::error::Result<AutoOutcome> {
    let initial =
        solve_linear(fem_mesh, fem_materials).map_err(|_| crate::error::CouplingError::EmptySplit)?;

    let seed_mask = von_mises_threshold(fem_mesh, config.von_mises_threshold);
    if !seed_mask.iter().any(|&s| s) {
        return Ok(AutoOutcome::FullFem(initial));
    }

    let pd_mask = dilate(&seed_mask, &fem_mesh.connectivity, config.buffer_layers);
    let split_result = split(&fem_mesh.x_ref, &fem_mesh.connectivity, &fem_mesh.reference_volume, &pd_mask);
    if split_result.interface.global_indices.is_empty() && !split_result.pd.positions.is_empty() {
        log::warn!("auto mode switched every element to PD with no shared interface; treating as pure PD");
    }

    let n = split_result.pd.positions.len();
    let mut pd_particles = ParticleSystem::new(
        split_result.pd.positions.clone(),
        split_result.pd.volumes.clone(),
        vec![config.pd_density; n],
        vec![config.pd_bulk; n],
        vec![config.pd_shear; n],
    )?;

    let mut pd_bonds = BondSystem::build(&pd_particles.x_ref.clone(), config.pd_horizon, config.pd_neighbor_margin)?;

    let mut new_fem_mesh = Mesh::new(
        fem_mesh.element_type,
        split_result.fem.nodes.clone(),
        split_result.fem.connectivity.clone(),
        None,
    )?;
    for (local, &global) in split_result.fem.local_to_global.iter().enumerate() {
        new_fem_mesh.fixed[local] = fem_mesh.fixed[global];
        new_fem_mesh.prescribed[local] = fem_mesh.prescribed[global];
        new_fem_mesh.f_ext[local] = fem_mesh.f_ext[global];
    }

    let result = solve_coupled(
        &mut new_fem_mesh,
        fem_materials,
        &mut pd_particles,
        &mut pd_bonds,
        pd_material,
        &split_result.interface,
        &config.dn_config,
        |_| true,
    )?;

    Ok(AutoOutcome::Coupled(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_core::elements::ElementType;
    use spine_core::materials::LinearElastic;
    use nalgebra::Vector3;

    fn two_quad_cantilever() -> (Mesh, Vec<Material>) {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
        ];
        let conn = vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]];
        let mut mesh = Mesh::new(ElementType::Quad4 { plane_strain: false }, nodes, conn, None).unwrap();
        mesh.fix_node(0, Some([0.0, 0.0, 0.0]));
        mesh.fix_node(3, Some([0.0, 0.0, 0.0]));
        mesh.f_ext[4] = Vector3::new(1.0, 0.0, 0.0);
        let materials = vec![Material::LinearElastic(LinearElastic::new(200e9, 0.3).unwrap())];
        (mesh, materials)
    }

    #[test]
    fn stays_full_fem_when_stress_never_crosses_threshold() {
        let (mut mesh, mut materials) = two_quad_cantilever();
        let mut pd_material = Material::LinearElastic(LinearElastic::new(200e9, 0.3).unwrap());
        let config = AutoConfig {
            von_mises_threshold: 1e30,
            buffer_layers: 1,
            pd_horizon: 0.3,
            pd_neighbor_margin: 8,
            pd_bulk: 1.6e11,
            pd_shear: 7.6e10,
            pd_density: 1000.0,
            dn_config: DnConfig::default(),
        };
        let outcome = run_auto(&mut mesh, &mut materials, &mut pd_material, &config).unwrap();
        assert!(matches!(outcome, AutoOutcome::FullFem(_)));
    }
}

//! Dirichlet-Neumann staggered driver: alternates a linear FEM solve with
//! a quasi-static PD solve, exchanging displacement/force across the
//! interface each outer iteration (spec.md §4.10 "Coupling driver").

use crate::error::{CouplingError, Result};
use crate::interface::InterfaceManager;
use crate::zone_split::InterfaceSet;
use nalgebra::Vector3;
use spine_core::materials::Material;
use spine_core::mesh::Mesh;
use spine_core::solve_result::SolveResult;
use spine_core::static_solver::solve_linear;
use spine_pd::solver::{solve_quasi_static, NosbConfig};
use spine_pd::{BondSystem, ParticleSystem};

#[derive(Debug, Clone, Copy)]
pub struct DnConfig {
    pub max_coupling_iters: usize,
    pub tolerance: f64,
    pub pd_config: NosbConfig,
}

impl Default for DnConfig {
    fn default() -> Self {
        Self { max_coupling_iters: 50, tolerance: 1e-5, pd_config: NosbConfig::default() }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DnProgress {
    pub iter: usize,
    pub max_iter: usize,
    pub interface_residual: f64,
}

/// Resets every external force this driver previously injected at
/// interface FEM nodes, so repeated iterations don't accumulate stale
/// reactions on top of the user's own loads.
fn clear_interface_loads(mesh: &mut Mesh, interface: &InterfaceSet, applied: &mut Vec<Vector3<f64>>) {
    for (slot, &node) in interface.fem_local.iter().enumerate() {
        mesh.f_ext[node] -= applied[slot];
        applied[slot] = Vector3::zeros();
    }
}

pub fn solve_coupled(
    fem_mesh: &mut Mesh,
    fem_materials: &mut [Material],
    pd_particles: &mut ParticleSystem,
    pd_bonds: &mut BondSystem,
    pd_material: &mut Material,
    interface: &InterfaceSet,
    config: &DnConfig,
    mut progress: impl FnMut(DnProgress) -> bool,
) -> Result<SolveResult> {
    if interface.global_indices.is_empty() {
        return Err(CouplingError::EmptySplit);
    }

    let im = InterfaceManager::new(interface);
    let mut applied_reactions = vec![Vector3::zeros(); interface.fem_local.len()];
    let mut prev_interface_disp = vec![Vector3::zeros(); interface.fem_local.len()];
    let mut last_residual = f64::INFINITY;

    for iter in 0..config.max_coupling_iters {
        clear_interface_loads(fem_mesh, interface, &mut applied_reactions);

        let fem_result = solve_linear(fem_mesh, fem_materials)
            .map_err(|_| CouplingError::MaxIterationsReached { max_iters: config.max_coupling_iters, last_residual })?;
        if !fem_result.converged {
            log::warn!("coupling iter {iter}: FEM side did not converge");
        }

        im.fem_to_pd_disp(fem_mesh, pd_particles);
        pd_particles.apply_boundary_conditions();

        solve_quasi_static(pd_particles, pd_bonds, pd_material, &config.pd_config, |_| true)
            .map_err(|_| CouplingError::MaxIterationsReached { max_iters: config.max_coupling_iters, last_residual })?;

        for (slot, (node, f)) in im.pd_to_fem_force(pd_particles).into_iter().enumerate() {
            fem_mesh.f_ext[node] += f;
            applied_reactions[slot] = f;
        }

        let curr_interface_disp = im.interface_fem_disp(fem_mesh);
        let residual = InterfaceManager::relative_change(&prev_interface_disp, &curr_interface_disp);
        last_residual = residual;
        prev_interface_disp = curr_interface_disp;

        let keep_going = progress(DnProgress { iter, max_iter: config.max_coupling_iters, interface_residual: residual });
        if !keep_going {
            return Ok(SolveResult::diverged(
                iter,
                residual,
                residual,
                spine_core::error::DivergenceReason::Cancelled,
            ));
        }
        if iter > 0 && residual < config.tolerance {
            return Ok(SolveResult::converged_at(iter, residual, residual));
        }
    }

    Ok(SolveResult::diverged(
        config.max_coupling_iters,
        last_residual,
        last_residual,
        spine_core::error::DivergenceReason::MaxIterationsReached,
    ))
}

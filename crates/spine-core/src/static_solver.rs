//! Static solver: linear path, Newton-Raphson with line search, fixed-point
//! fallback (spec.md §4.5).

use crate::assembly::{apply_penalty_bcs, assemble_geometric_stiffness, assemble_stiffness, compute_nodal_forces};
use crate::backend::{LinearSolver as _, NativeBackend};
use crate::error::{DivergenceReason, SolveError};
use crate::materials::Material;
use crate::mesh::Mesh;
use crate::solve_result::SolveResult;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

#[derive(Debug, Clone, Copy)]
pub struct NonlinearConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub line_search_steps: [f64; 5],
    pub use_newton: bool,
}

impl Default for NonlinearConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            tolerance: 1e-6,
            line_search_steps: [1.0, 0.5, 0.25, 0.125, 0.0625],
            use_newton: true,
        }
    }
}

/// Snapshot handed to the caller's progress callback each outer iteration.
#[derive(Debug, Clone, Copy)]
pub struct NewtonProgress {
    pub iter: usize,
    pub max_iter: usize,
    pub residual: f64,
    pub rel_residual: f64,
}

/// Free (non-fixed) global DOF list, 3 per node, in node-major order.
fn free_dofs(mesh: &Mesh) -> Vec<usize> {
    let mut dofs = Vec::new();
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            if !mesh.fixed[n][d] {
                dofs.push(n * 3 + d);
            }
        }
    }
    dofs
}

fn residual_vector(mesh: &Mesh) -> DVector<f64> {
    let mut r = DVector::<f64>::zeros(mesh.total_dofs());
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            let dof = n * 3 + d;
            r[dof] = mesh.f_ext[n][d] + mesh.f_int[n][d];
            if mesh.fixed[n][d] {
                r[dof] = 0.0;
            }
        }
    }
    r
}

fn refresh_stress_and_forces(mesh: &mut Mesh, materials: &mut [Material]) {
    mesh.update_current_config();
    mesh.compute_deformation_gradient();
    let n_gauss = mesh.element_type.n_gauss();
    let plane_strain = mesh.element_type.is_plane_strain();
    for e in 0..mesh.n_elements {
        let mat = &mut materials[mesh.material_id[e]];
        for g in 0..n_gauss {
            let idx = e * n_gauss + g;
            let f = mesh.gauss[idx].f;
            let state = mat.compute_stress(idx, &f, plane_strain);
            mesh.gauss[idx].sigma = state.sigma;
            mesh.gauss[idx].eps = state.eps;
        }
    }
    compute_nodal_forces(mesh);
}

/// Linear path: assemble, apply BCs, solve once, write stress/forces back.
pub fn solve_linear(mesh: &mut Mesh, materials: &mut [Material]) -> Result<SolveResult, SolveError> {
    let k = assemble_stiffness(mesh, materials);
    let mut rhs = DVector::<f64>::zeros(mesh.total_dofs());
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            rhs[n * 3 + d] = mesh.f_ext[n][d];
        }
    }
    let mut k = k;
    apply_penalty_bcs(&mut k, &mut rhs, mesh);
    let csr = CsrMatrix::from(&k);
    let (du, _) = NativeBackend.solve(&csr, &rhs)?;

    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            mesh.u[n][d] += du[n * 3 + d];
        }
    }
    mesh.apply_boundary_conditions();
    refresh_stress_and_forces(mesh, materials);
    let r = residual_vector(mesh);
    Ok(SolveResult::converged_at(1, r.norm(), 0.0))
}

/// Newton-Raphson with backtracking line search; falls back to a damped
/// fixed-point update when `config.use_newton` is false.
pub fn solve_nonlinear(
    mesh: &mut Mesh,
    materials: &mut [Material],
    config: &NonlinearConfig,
    mut progress: impl FnMut(NewtonProgress) -> bool,
) -> Result<SolveResult, SolveError> {
    mesh.apply_boundary_conditions();
    refresh_stress_and_forces(mesh, materials);
    let mut r = residual_vector(mesh);
    let r_ref = r.norm().max(1.0);

    let mut last_residual = r.norm();
    let mut consecutive_jumps = 0usize;

    for iter in 0..config.max_iterations {
        let residual = r.norm();
        let rel_residual = residual / r_ref;

        if !residual.is_finite() {
            return Ok(SolveResult::diverged(iter, residual, rel_residual, DivergenceReason::NanOrInfResidual));
        }

        let keep_going = progress(NewtonProgress { iter, max_iter: config.max_iterations, residual, rel_residual });
        if !keep_going {
            return Ok(SolveResult::diverged(iter, residual, rel_residual, DivergenceReason::Cancelled));
        }
        if rel_residual < config.tolerance {
            return Ok(SolveResult::converged_at(iter, residual, rel_residual));
        }

        if residual > last_residual * 10.0 {
            consecutive_jumps += 1;
            if consecutive_jumps >= 3 {
                log::warn!("Newton residual jumped 10x for 3 consecutive iterations; solution may be diverging");
            }
        } else {
            consecutive_jumps = 0;
        }
        last_residual = residual;

        if config.use_newton {
            let k_mat = assemble_stiffness(mesh, materials);
            let mut k_t = k_mat;
            if materials.iter().any(|m| !m.is_linear()) {
                let k_geo = assemble_geometric_stiffness(mesh);
                for (row, col, value) in k_geo.triplet_iter() {
                    k_t.push(row, col, *value);
                }
            }
            let mut rhs = r.clone();
            apply_penalty_bcs(&mut k_t, &mut rhs, mesh);
            let csr = CsrMatrix::from(&k_t);
            let (du, _) = NativeBackend.solve(&csr, &rhs).map_err(|_| SolveError::LinearSolver(
                "tangent stiffness factorization failed".to_string(),
            ))?;

            let u0 = mesh.u.clone();
            let mut accepted = false;
            for &alpha in &config.line_search_steps {
                for n in 0..mesh.n_nodes {
                    for d in 0..3 {
                        mesh.u[n][d] = u0[n][d] + alpha * du[n * 3 + d];
                    }
                }
                mesh.apply_boundary_conditions();
                refresh_stress_and_forces(mesh, materials);
                let r_trial = residual_vector(mesh);
                if r_trial.norm() < residual || alpha == *config.line_search_steps.last().unwrap() {
                    r = r_trial;
                    accepted = true;
                    break;
                }
            }
            if !accepted {
                mesh.u = u0;
            }
        } else {
            let k_mat = assemble_stiffness(mesh, materials);
            let mut k_t = k_mat;
            let mut rhs = r.clone();
            apply_penalty_bcs(&mut k_t, &mut rhs, mesh);
            let csr = CsrMatrix::from(&k_t);
            let (du, _) = NativeBackend.solve(&csr, &rhs)?;
            for n in 0..mesh.n_nodes {
                for d in 0..3 {
                    mesh.u[n][d] += 0.1 * du[n * 3 + d];
                }
            }
            mesh.apply_boundary_conditions();
            refresh_stress_and_forces(mesh, materials);
            r = residual_vector(mesh);
        }
    }

    let residual = r.norm();
    Ok(SolveResult::diverged(
        config.max_iterations,
        residual,
        residual / r_ref,
        DivergenceReason::MaxIterationsReached,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementType;
    use crate::materials::LinearElastic;
    use nalgebra::Vector3;

    fn cantilever_tet() -> (Mesh, Vec<Material>) {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        let mut mesh = Mesh::new(ElementType::Tet4, nodes, vec![vec![0, 1, 2, 3]], None).unwrap();
        mesh.fix_node(0, Some([0.0, 0.0, 0.0]));
        mesh.fix_node(2, Some([0.0, 0.0, 0.0]));
        mesh.fix_node(3, Some([0.0, 0.0, 0.0]));
        mesh.f_ext[1] = Vector3::new(1.0e3, 0.0, 0.0);
        let materials = vec![Material::LinearElastic(LinearElastic::new(200e9, 0.3).unwrap())];
        (mesh, materials)
    }

    #[test]
    fn linear_solve_converges_in_one_iteration() {
        let (mut mesh, mut materials) = cantilever_tet();
        let result = solve_linear(&mut mesh, &mut materials).unwrap();
        assert!(result.converged);
        assert!(mesh.u[1][0] > 0.0);
    }

    #[test]
    fn newton_on_linear_material_matches_linear_solve_displacement() {
        let (mut mesh_lin, mut mat_lin) = cantilever_tet();
        solve_linear(&mut mesh_lin, &mut mat_lin).unwrap();

        let (mut mesh_nr, mut mat_nr) = cantilever_tet();
        let config = NonlinearConfig::default();
        let result = solve_nonlinear(&mut mesh_nr, &mut mat_nr, &config, |_| true).unwrap();
        assert!(result.converged);
        assert!((mesh_nr.u[1][0] - mesh_lin.u[1][0]).abs() / mesh_lin.u[1][0].abs() < 1e-6);
    }
}

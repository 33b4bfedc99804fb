//! Crisfield spherical arc-length solver with adaptive step length
//! (spec.md §4.6).

use crate::assembly::{apply_penalty_bcs, assemble_geometric_stiffness, assemble_stiffness, compute_nodal_forces};
use crate::backend::{LinearSolver as _, NativeBackend};
use crate::error::SolveError;
use crate::materials::Material;
use crate::mesh::Mesh;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

#[derive(Debug, Clone, Copy)]
pub struct ArcLengthConfig {
    pub initial_arc_length: f64,
    pub min_arc_length: f64,
    pub max_arc_length: f64,
    pub max_load_factor: f64,
    pub psi: f64,
    pub tolerance: f64,
    pub max_corrector_iterations: usize,
    pub desired_iterations: usize,
    pub max_steps: usize,
}

impl Default for ArcLengthConfig {
    fn default() -> Self {
        Self {
            initial_arc_length: 0.1,
            min_arc_length: 1e-6,
            max_arc_length: 10.0,
            max_load_factor: 10.0,
            psi: 1.0,
            tolerance: 1e-6,
            max_corrector_iterations: 30,
            desired_iterations: 5,
            max_steps: 500,
        }
    }
}

/// One accepted equilibrium point: load factor, displacement, and the
/// external work `0.5 * u^T * (-f)` stored alongside it.
#[derive(Debug, Clone)]
struct EquilibriumPoint {
    lambda: f64,
    u: Vec<f64>,
    work: f64,
}

pub struct ArcLengthSolver {
    config: ArcLengthConfig,
    path: Vec<EquilibriumPoint>,
}

fn zero_fixed(mesh: &Mesh, v: &mut DVector<f64>) {
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            if mesh.fixed[n][d] {
                v[n * 3 + d] = 0.0;
            }
        }
    }
}

fn write_displacement(mesh: &mut Mesh, u: &DVector<f64>) {
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            mesh.u[n][d] = u[n * 3 + d];
        }
    }
}

fn read_displacement(mesh: &Mesh) -> DVector<f64> {
    let mut u = DVector::zeros(mesh.total_dofs());
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            u[n * 3 + d] = mesh.u[n][d];
        }
    }
    u
}

fn refresh(mesh: &mut Mesh, materials: &mut [Material]) {
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

fn tangent_solve(mesh: &Mesh, materials: &[Material], rhs_in: &DVector<f64>) -> Result<DVector<f64>, SolveError> {
    let k_mat = assemble_stiffness(mesh, materials);
    let mut k_t = k_mat;
    if materials.iter().any(|m| !m.is_linear()) {
        let k_geo = assemble_geometric_stiffness(mesh);
        for (row, col, value) in k_geo.triplet_iter() {
            k_t.push(row, col, *value);
        }
    }
    let mut rhs = rhs_in.clone();
    apply_penalty_bcs(&mut k_t, &mut rhs, mesh);
    let csr = CsrMatrix::from(&k_t);
    let (x, _) = NativeBackend.solve(&csr, &rhs)?;
    Ok(x)
}

impl ArcLengthSolver {
    pub fn new(config: ArcLengthConfig) -> Self {
        Self { config, path: Vec::new() }
    }

    /// Runs the full predictor/corrector loop until `|lambda| >=
    /// max_load_factor` or the arc length collapses below
    /// `min_arc_length`. `f_ref` is the reference external load pattern.
    pub fn solve(&mut self, mesh: &mut Mesh, materials: &mut [Material], f_ref: &DVector<f64>) -> Result<(), SolveError> {
        let mut lambda = 0.0;
        let mut delta_l = self.config.initial_arc_length;
        let mut prev_du = DVector::<f64>::zeros(mesh.total_dofs());
        let mut step_sign = 1.0;

        let mut f_ref = f_ref.clone();
        zero_fixed(mesh, &mut f_ref);

        for _step in 0..self.config.max_steps {
            if lambda.abs() >= self.config.max_load_factor {
                break;
            }

            let du_f = tangent_solve(mesh, materials, &f_ref)?;
            if _step > 0 && du_f.dot(&prev_du) < 0.0 {
                step_sign = -step_sign;
            }
            let denom = (du_f.dot(&du_f) + self.config.psi * self.config.psi).sqrt();
            let mut delta_lambda = step_sign * delta_l / denom.max(1e-300);
            if lambda + delta_lambda > self.config.max_load_factor {
                delta_lambda = self.config.max_load_factor - lambda;
            } else if lambda + delta_lambda < -self.config.max_load_factor {
                delta_lambda = -self.config.max_load_factor - lambda;
            }

            let u0 = read_displacement(mesh);
            let mut u_trial = &u0 + delta_lambda * &du_f;
            let mut lambda_trial = lambda + delta_lambda;
            let mut du_accum = delta_lambda * du_f.clone();

            write_displacement(mesh, &u_trial);
            mesh.apply_boundary_conditions();
            refresh(mesh, materials);

            let mut converged = false;
            for _inner in 0..self.config.max_corrector_iterations {
                let mut r = DVector::<f64>::zeros(mesh.total_dofs());
                for n in 0..mesh.n_nodes {
                    for d in 0..3 {
                        r[n * 3 + d] = lambda_trial * f_ref[n * 3 + d] + mesh.f_int[n][d];
                    }
                }
                zero_fixed(mesh, &mut r);
                let denom_norm = (lambda_trial * f_ref.norm()).abs().max(1e-300);
                if r.norm() / denom_norm < self.config.tolerance {
                    converged = true;
                    break;
                }

                let du_f_i = tangent_solve(mesh, materials, &f_ref)?;
                let du_r = tangent_solve(mesh, materials, &r)?;

                let denom = du_f_i.dot(&du_accum) + self.config.psi * self.config.psi * delta_lambda;
                let delta_lambda_corr = -(du_accum.dot(&du_r)) / denom.max(1e-300).max(1e-300);
                let du = &du_r + delta_lambda_corr * &du_f_i;

                u_trial += &du;
                lambda_trial += delta_lambda_corr;
                du_accum += &du;
                delta_lambda += delta_lambda_corr;

                write_displacement(mesh, &u_trial);
                mesh.apply_boundary_conditions();
                refresh(mesh, materials);
            }

            if converged {
                lambda = lambda_trial;
                prev_du = du_accum;
                let work = 0.5 * u_trial.dot(&mesh_force_vector(mesh));
                self.path.push(EquilibriumPoint { lambda, u: u_trial.iter().copied().collect(), work });
                delta_l = (delta_l * (self.config.desired_iterations as f64 / self.config.max_corrector_iterations as f64).sqrt())
                    .clamp(self.config.min_arc_length, self.config.max_arc_length);
            } else {
                write_displacement(mesh, &u0);
                mesh.apply_boundary_conditions();
                refresh(mesh, materials);
                delta_l *= 0.5;
                if delta_l < self.config.min_arc_length {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Returns `(u_series, lambda_series)` for a specific node/DOF.
    pub fn get_equilibrium_path(&self, node_id: usize, dof: usize) -> (Vec<f64>, Vec<f64>) {
        let mut u_series = Vec::with_capacity(self.path.len());
        let mut lambda_series = Vec::with_capacity(self.path.len());
        for point in &self.path {
            u_series.push(point.u[node_id * 3 + dof]);
            lambda_series.push(point.lambda);
        }
        (u_series, lambda_series)
    }
}

fn mesh_force_vector(mesh: &Mesh) -> DVector<f64> {
    let mut f = DVector::zeros(mesh.total_dofs());
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            f[n * 3 + d] = -mesh.f_int[n][d];
        }
    }
    f
}

//! Newmark-beta (implicit) and central-difference (explicit) dynamic
//! solvers, lumped mass, Rayleigh damping (spec.md §4.7).

use crate::assembly::{apply_penalty_bcs, assemble_stiffness, compute_nodal_forces};
use crate::backend::{LinearSolver as _, NativeBackend};
use crate::error::SolveError;
use crate::materials::Material;
use crate::mesh::Mesh;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

#[derive(Debug, Clone, Copy)]
pub struct NewmarkConfig {
    pub gamma: f64,
    pub beta: f64,
    pub dt: f64,
    pub rayleigh_alpha: f64,
    pub rayleigh_beta: f64,
}

impl NewmarkConfig {
    /// `gamma = 1/2, beta = 1/4`: unconditionally stable average-acceleration.
    pub fn average_acceleration(dt: f64) -> Self {
        Self { gamma: 0.5, beta: 0.25, dt, rayleigh_alpha: 0.0, rayleigh_beta: 0.0 }
    }

    /// `gamma = 1/2, beta = 1/6`: linear-acceleration (conditionally stable).
    pub fn linear_acceleration(dt: f64) -> Self {
        Self { gamma: 0.5, beta: 1.0 / 6.0, dt, rayleigh_alpha: 0.0, rayleigh_beta: 0.0 }
    }

    /// `gamma = 1/2, beta = 0`: Fox-Goodwin, third-order accurate.
    pub fn fox_goodwin(dt: f64) -> Self {
        Self { gamma: 0.5, beta: 0.0, dt, rayleigh_alpha: 0.0, rayleigh_beta: 0.0 }
    }

    /// Solves for `(alpha, beta)` in `C = alpha M + beta K` given a target
    /// damping ratio at two natural frequencies `omega1 < omega2`.
    pub fn with_rayleigh_damping(mut self, zeta: f64, omega1: f64, omega2: f64) -> Self {
        let denom = omega1 * omega1 - omega2 * omega2;
        self.rayleigh_alpha = if denom.abs() > 1e-300 {
            2.0 * zeta * omega1 * omega2 * (omega1 - omega2) / denom
        } else {
            2.0 * zeta * omega1
        };
        self.rayleigh_beta = if denom.abs() > 1e-300 {
            2.0 * zeta * (omega2 - omega1) / denom
        } else {
            0.0
        };
        self
    }
}

/// Lumped nodal mass: row-sum of `rho * V_e / npe` over incident elements,
/// replicated over the 3 translational DOFs.
pub fn lumped_mass(mesh: &Mesh, density: &[f64]) -> DVector<f64> {
    let mut mass = vec![0.0; mesh.n_nodes];
    for (e, conn) in mesh.connectivity.iter().enumerate() {
        let npe = conn.len() as f64;
        let m_e = density[mesh.material_id[e]] * mesh.reference_volume[e] / npe;
        for &n in conn {
            mass[n] += m_e;
        }
    }
    let mut m = DVector::zeros(mesh.total_dofs());
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            m[n * 3 + d] = mass[n];
        }
    }
    m
}

/// `0.8 * h / c` with `h = V_avg^{1/dim}` and the elastic bulk wave speed.
pub fn stable_time_step(mesh: &Mesh, e: f64, nu: f64, rho: f64) -> f64 {
    let dim = mesh.element_type.dim() as f64;
    let v_avg = mesh.reference_volume.iter().sum::<f64>() / mesh.n_elements.max(1) as f64;
    let h = v_avg.powf(1.0 / dim);
    let c = (e * (1.0 - nu) / (rho * (1.0 + nu) * (1.0 - 2.0 * nu))).sqrt();
    0.8 * h / c
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

/// Per-DOF velocity/acceleration state the caller threads between steps.
pub struct DynamicState {
    pub velocity: DVector<f64>,
    pub acceleration: DVector<f64>,
}

impl DynamicState {
    pub fn zeros(n_dof: usize) -> Self {
        Self { velocity: DVector::zeros(n_dof), acceleration: DVector::zeros(n_dof) }
    }
}

/// One Newmark-beta step. `mass` is the lumped mass vector from
/// [`lumped_mass`]; Rayleigh damping is diagonal-equivalent only insofar
/// as `alpha * M` is diagonal — the `beta * K` term is assembled exactly.
pub fn newmark_step(
    mesh: &mut Mesh,
    materials: &mut [Material],
    mass: &DVector<f64>,
    state: &mut DynamicState,
    config: &NewmarkConfig,
) -> Result<(), SolveError> {
    let n_dof = mesh.total_dofs();
    let dt = config.dt;
    let mut u = DVector::zeros(n_dof);
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            u[n * 3 + d] = mesh.u[n][d];
        }
    }

    let u_p = &u + dt * &state.velocity + (0.5 - config.beta) * dt * dt * &state.acceleration;
    let v_p = &state.velocity + (1.0 - config.gamma) * dt * &state.acceleration;

    let k_mat = assemble_stiffness(mesh, materials);
    let mut k_eff = CooMatrix::<f64>::new(n_dof, n_dof);
    for (row, col, value) in k_mat.triplet_iter() {
        k_eff.push(row, col, *value);
    }
    for i in 0..n_dof {
        let c_ii = config.rayleigh_alpha * mass[i];
        k_eff.push(i, i, config.gamma / (config.beta * dt) * c_ii + mass[i] / (config.beta * dt * dt));
    }
    for (row, col, value) in k_mat.triplet_iter() {
        k_eff.push(row, col, config.rayleigh_beta * config.gamma / (config.beta * dt) * value);
    }

    // f_eff = f_ext - K u_p - C v_p, C = alpha M + beta K
    let mut f_eff = DVector::zeros(n_dof);
    let k_u_p = &k_mat * &u_p;
    let k_v_p = &k_mat * &v_p;
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            let i = n * 3 + d;
            let c_v_p = config.rayleigh_alpha * mass[i] * v_p[i] + config.rayleigh_beta * k_v_p[i];
            f_eff[i] = mesh.f_ext[n][d] - k_u_p[i] - c_v_p;
        }
    }

    apply_penalty_bcs(&mut k_eff, &mut f_eff, mesh);
    let csr = CsrMatrix::from(&k_eff);
    let (delta_a, _) = NativeBackend.solve(&csr, &f_eff)?;

    u = &u_p + config.beta * dt * dt * &delta_a;
    state.velocity = &v_p + config.gamma * dt * &delta_a;
    state.acceleration = delta_a;

    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            let i = n * 3 + d;
            mesh.u[n][d] = u[i];
            if mesh.fixed[n][d] {
                state.velocity[i] = 0.0;
                state.acceleration[i] = 0.0;
            }
        }
    }
    mesh.apply_boundary_conditions();
    refresh(mesh, materials);

    Ok(())
}

/// One central-difference explicit step.
pub fn central_difference_step(
    mesh: &mut Mesh,
    materials: &mut [Material],
    mass: &DVector<f64>,
    state: &mut DynamicState,
    dt: f64,
    rayleigh_alpha: f64,
) -> Result<(), SolveError> {
    refresh(mesh, materials);

    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            let i = n * 3 + d;
            let damping_force = rayleigh_alpha * mass[i] * state.velocity[i];
            let a = (mesh.f_ext[n][d] + mesh.f_int[n][d] - damping_force) / mass[i].max(1e-300);
            state.acceleration[i] = a;
            if mesh.fixed[n][d] {
                state.velocity[i] = 0.0;
                state.acceleration[i] = 0.0;
            } else {
                state.velocity[i] += a * dt;
            }
            mesh.u[n][d] += state.velocity[i] * dt;
        }
    }
    mesh.apply_boundary_conditions();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementType;
    use crate::materials::LinearElastic;
    use nalgebra::Vector3;

    #[test]
    fn lumped_mass_matches_density_times_volume_over_npe_sum() {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        let mesh = Mesh::new(ElementType::Tet4, nodes, vec![vec![0, 1, 2, 3]], None).unwrap();
        let mass = lumped_mass(&mesh, &[1000.0]);
        let total: f64 = (0..mesh.n_nodes).map(|n| mass[n * 3]).sum();
        assert!((total - 1000.0 * mesh.reference_volume[0]).abs() < 1e-9);
    }

    #[test]
    fn newmark_settles_cantilever_toward_static_solution() {
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
        let mut materials = vec![Material::LinearElastic(LinearElastic::new(200e9, 0.3).unwrap())];
        let mass = lumped_mass(&mesh, &[7850.0]);
        let mut state = DynamicState::zeros(mesh.total_dofs());
        let config = NewmarkConfig::average_acceleration(1e-5).with_rayleigh_damping(0.5, 1e3, 1e4);

        for _ in 0..200 {
            newmark_step(&mut mesh, &mut materials, &mass, &mut state, &config).unwrap();
        }
        assert!(mesh.u[1][0] > 0.0);
        assert!(mesh.u[1][0].is_finite());
    }
}

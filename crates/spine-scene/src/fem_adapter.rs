//! FEM [`Adapter`] impl: wraps a `spine_core::Mesh` + material list and
//! drives it through the static/nonlinear solver path.

use crate::adapter::Adapter;
use crate::error::Result;
use nalgebra::Vector3;
use spine_core::dynamic_solver::{central_difference_step, lumped_mass, stable_time_step, DynamicState};
use spine_core::materials::Material;
use spine_core::mesh::Mesh;
use spine_core::static_solver::{solve_linear, solve_nonlinear, NonlinearConfig};
use spine_core::SolveResult;

pub struct FemAdapter {
    pub mesh: Mesh,
    pub materials: Vec<Material>,
    pub config: NonlinearConfig,
    pub density: Vec<f64>,
    /// `(E, nu)` used only to bound the explicit time step; the stiffest
    /// material present should be passed here.
    pub stability_elastic_constants: (f64, f64),
    injected: Vec<Vector3<f64>>,
    dynamic_state: Option<DynamicState>,
}

impl FemAdapter {
    pub fn new(
        mesh: Mesh,
        materials: Vec<Material>,
        density: Vec<f64>,
        config: NonlinearConfig,
        stability_elastic_constants: (f64, f64),
    ) -> Self {
        let n = mesh.n_nodes;
        Self {
            mesh,
            materials,
            config,
            density,
            stability_elastic_constants,
            injected: vec![Vector3::zeros(); n],
            dynamic_state: None,
        }
    }

    fn apply_injected(&mut self) {
        for (n, f) in self.injected.iter().enumerate() {
            self.mesh.f_ext[n] += *f;
        }
    }
}

impl Adapter for FemAdapter {
    fn solve(&mut self) -> Result<SolveResult> {
        self.apply_injected();
        let result = if self.materials.iter().all(|m| m.is_linear()) {
            solve_linear(&mut self.mesh, &mut self.materials)?
        } else {
            solve_nonlinear(&mut self.mesh, &mut self.materials, &self.config, |_| true)?
        };
        Ok(result)
    }

    fn step(&mut self, dt: f64) -> Result<()> {
        self.apply_injected();
        let n_dof = self.mesh.total_dofs();
        let mass = lumped_mass(&self.mesh, &self.density);
        let state = self.dynamic_state.get_or_insert_with(|| DynamicState::zeros(n_dof));
        central_difference_step(&mut self.mesh, &mut self.materials, &mass, state, dt, 0.0)?;
        Ok(())
    }

    fn stable_dt(&self) -> f64 {
        let (e, nu) = self.stability_elastic_constants;
        let rho = self.density.first().copied().unwrap_or(1000.0);
        stable_time_step(&self.mesh, e, nu, rho)
    }

    fn current_positions(&self) -> Vec<Vector3<f64>> {
        self.mesh.x_ref.iter().zip(&self.mesh.u).map(|(x, u)| x + u).collect()
    }

    fn reference_positions(&self) -> Vec<Vector3<f64>> {
        self.mesh.x_ref.clone()
    }

    fn inject_external_force(&mut self, index: usize, force: Vector3<f64>) {
        self.injected[index] += force;
    }

    fn clear_external_forces(&mut self) {
        for f in self.injected.iter_mut() {
            *f = Vector3::zeros();
        }
    }
}

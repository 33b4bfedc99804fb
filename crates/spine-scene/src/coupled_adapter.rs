//! FEM<->PD coupled [`Adapter`] impl: wraps the Dirichlet-Neumann driver
//! from `spine_coupling` and exposes the union of the FEM sub-mesh and PD
//! particle set as one body (spec.md §4.10, §4.12).

use crate::adapter::Adapter;
use crate::error::Result;
use nalgebra::Vector3;
use spine_core::materials::Material;
use spine_core::mesh::Mesh;
use spine_core::SolveResult;
use spine_coupling::{solve_coupled, DnConfig, InterfaceSet};
use spine_pd::{BondSystem, ParticleSystem};

pub struct CoupledAdapter {
    pub fem_mesh: Mesh,
    pub fem_materials: Vec<Material>,
    pub pd_particles: ParticleSystem,
    pub pd_bonds: BondSystem,
    pub pd_material: Material,
    pub interface: InterfaceSet,
    pub config: DnConfig,
    injected_fem: Vec<Vector3<f64>>,
    injected_pd: Vec<Vector3<f64>>,
}

impl CoupledAdapter {
    pub fn new(
        fem_mesh: Mesh,
        fem_materials: Vec<Material>,
        pd_particles: ParticleSystem,
        pd_bonds: BondSystem,
        pd_material: Material,
        interface: InterfaceSet,
        config: DnConfig,
    ) -> Self {
        let n_fem = fem_mesh.n_nodes;
        let n_pd = pd_particles.n_particles;
        Self {
            fem_mesh,
            fem_materials,
            pd_particles,
            pd_bonds,
            pd_material,
            interface,
            config,
            injected_fem: vec![Vector3::zeros(); n_fem],
            injected_pd: vec![Vector3::zeros(); n_pd],
        }
    }

    fn apply_injected(&mut self) {
        for (n, f) in self.injected_fem.iter().enumerate() {
            self.fem_mesh.f_ext[n] += *f;
        }
        for (i, f) in self.injected_pd.iter().enumerate() {
            self.pd_particles.f_ext[i] += *f;
        }
    }
}

impl Adapter for CoupledAdapter {
    fn solve(&mut self) -> Result<SolveResult> {
        self.apply_injected();
        let result = solve_coupled(
            &mut self.fem_mesh,
            &mut self.fem_materials,
            &mut self.pd_particles,
            &mut self.pd_bonds,
            &mut self.pd_material,
            &self.interface,
            &self.config,
            |_| true,
        )?;
        Ok(result)
    }

    fn step(&mut self, _dt: f64) -> Result<()> {
        // The coupled body is quasi-static only (spec.md Non-goals: no
        // implicit PD time-stepping); a "step" is one full staggered solve.
        self.solve().map(|_| ())
    }

    fn stable_dt(&self) -> f64 {
        f64::INFINITY
    }

    fn current_positions(&self) -> Vec<Vector3<f64>> {
        let mut out: Vec<Vector3<f64>> =
            self.fem_mesh.x_ref.iter().zip(&self.fem_mesh.u).map(|(x, u)| x + u).collect();
        out.extend(self.pd_particles.x_cur.iter().copied());
        out
    }

    fn reference_positions(&self) -> Vec<Vector3<f64>> {
        let mut out = self.fem_mesh.x_ref.clone();
        out.extend(self.pd_particles.x_ref.iter().copied());
        out
    }

    fn damage(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.fem_mesh.n_nodes];
        out.extend((0..self.pd_particles.n_particles).map(|i| self.pd_bonds.damage(i)));
        out
    }

    fn inject_external_force(&mut self, index: usize, force: Vector3<f64>) {
        let n_fem = self.injected_fem.len();
        if index < n_fem {
            self.injected_fem[index] += force;
        } else {
            self.injected_pd[index - n_fem] += force;
        }
    }

    fn clear_external_forces(&mut self) {
        for f in self.injected_fem.iter_mut() {
            *f = Vector3::zeros();
        }
        for f in self.injected_pd.iter_mut() {
            *f = Vector3::zeros();
        }
    }
}

//! Peridynamics [`Adapter`] impl: wraps `spine_pd`'s particle system, bond
//! set, and quasi-static solver.

use crate::adapter::Adapter;
use crate::error::Result;
use nalgebra::Vector3;
use spine_core::materials::Material;
use spine_core::SolveResult;
use spine_pd::correspondence::{compute_deformation_gradients, compute_internal_forces, compute_shape_tensors};
use spine_pd::solver::{solve_quasi_static, NosbConfig};
use spine_pd::{BondSystem, ParticleSystem};

pub struct PdAdapter {
    pub particles: ParticleSystem,
    pub bonds: BondSystem,
    pub material: Material,
    pub config: NosbConfig,
    pub stabilization_factor: f64,
    injected: Vec<Vector3<f64>>,
}

impl PdAdapter {
    pub fn new(particles: ParticleSystem, bonds: BondSystem, material: Material, config: NosbConfig) -> Self {
        let n = particles.n_particles;
        Self { particles, bonds, material, config, stabilization_factor: 0.1, injected: vec![Vector3::zeros(); n] }
    }

    fn apply_injected(&mut self) {
        for (i, f) in self.injected.iter().enumerate() {
            self.particles.f_ext[i] += *f;
        }
    }
}

impl Adapter for PdAdapter {
    fn solve(&mut self) -> Result<SolveResult> {
        self.apply_injected();
        let converged = solve_quasi_static(&mut self.particles, &mut self.bonds, &mut self.material, &self.config, |_| true)?;
        Ok(if converged {
            SolveResult::converged_at(self.config.max_steps, 0.0, 0.0)
        } else {
            SolveResult::diverged(
                self.config.max_steps,
                0.0,
                0.0,
                spine_core::error::DivergenceReason::MaxIterationsReached,
            )
        })
    }

    fn step(&mut self, _dt: f64) -> Result<()> {
        self.apply_injected();
        let shapes = compute_shape_tensors(&self.particles, &self.bonds)?;
        compute_deformation_gradients(&mut self.particles, &self.bonds, &shapes);
        compute_internal_forces(&mut self.particles, &self.bonds, &shapes, &mut self.material, self.stabilization_factor);
        Ok(())
    }

    fn stable_dt(&self) -> f64 {
        let mut dt_min = f64::INFINITY;
        for i in 0..self.particles.n_particles {
            let lambda_2mu = self.particles.bulk[i] + 4.0 * self.particles.shear[i] / 3.0;
            let k_eff = lambda_2mu * self.particles.volume[i] / self.bonds.horizon.powi(2);
            if k_eff > 0.0 {
                dt_min = dt_min.min((2.0 * self.particles.mass[i] / k_eff).sqrt());
            }
        }
        dt_min
    }

    fn current_positions(&self) -> Vec<Vector3<f64>> {
        self.particles.x_cur.clone()
    }

    fn reference_positions(&self) -> Vec<Vector3<f64>> {
        self.particles.x_ref.clone()
    }

    fn damage(&self) -> Vec<f64> {
        (0..self.particles.n_particles).map(|i| self.bonds.damage(i)).collect()
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

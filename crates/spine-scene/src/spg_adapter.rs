//! SPG [`Adapter`] impl: wraps `spine_spg`'s kernel-corrected particle
//! compute behind the same quasi-static velocity-Verlet loop NOSB uses,
//! since spec.md §4.9 describes SPG as sharing NOSB's time-integration
//! scheme and differing only in the internal-force kernel.

use crate::adapter::Adapter;
use crate::error::Result;
use nalgebra::Vector3;
use spine_core::materials::Material;
use spine_core::SolveResult;
use spine_pd::ParticleSystem;
use spine_spg::compute::{compute_correction_matrices, compute_deformation_gradients, compute_internal_forces};
use spine_spg::shape::SpgNeighbors;

#[derive(Debug, Clone, Copy)]
pub struct SpgConfig {
    pub max_steps: usize,
    pub tolerance: f64,
    pub stabilization_factor: f64,
}

impl Default for SpgConfig {
    fn default() -> Self {
        Self { max_steps: 2000, tolerance: 1e-6, stabilization_factor: 0.1 }
    }
}

pub struct SpgAdapter {
    pub particles: ParticleSystem,
    pub neighbors: SpgNeighbors,
    pub material: Material,
    pub config: SpgConfig,
    injected: Vec<Vector3<f64>>,
}

impl SpgAdapter {
    pub fn new(particles: ParticleSystem, neighbors: SpgNeighbors, material: Material, config: SpgConfig) -> Self {
        let n = particles.n_particles;
        Self { particles, neighbors, material, config, injected: vec![Vector3::zeros(); n] }
    }

    fn apply_injected(&mut self) {
        for (i, f) in self.injected.iter().enumerate() {
            self.particles.f_ext[i] += *f;
        }
    }

    fn evaluate_step(&mut self) -> Result<()> {
        let corrections = compute_correction_matrices(&self.neighbors)?;
        compute_deformation_gradients(&mut self.particles, &self.neighbors, &corrections);
        compute_internal_forces(
            &mut self.particles,
            &self.neighbors,
            &corrections,
            &mut self.material,
            self.config.stabilization_factor,
        );
        Ok(())
    }
}

impl Adapter for SpgAdapter {
    fn solve(&mut self) -> Result<SolveResult> {
        self.apply_injected();
        let dt = self.stable_dt();
        let mut ke_prev = f64::INFINITY;
        let mut ke_increasing = false;
        let mut r_ref = 1.0;

        for step in 0..self.config.max_steps {
            self.evaluate_step()?;

            let mut residual_norm = 0.0;
            for i in 0..self.particles.n_particles {
                let r = self.particles.f_ext[i] + self.particles.f_int[i];
                residual_norm += r.norm_squared();
            }
            residual_norm = residual_norm.sqrt();
            if step == 0 {
                r_ref = residual_norm.max(1.0);
            }
            let relative_residual = residual_norm / r_ref;

            let mut ke = 0.0;
            for i in 0..self.particles.n_particles {
                if self.particles.fixed[i].iter().all(|&f| f) {
                    continue;
                }
                let r = self.particles.f_ext[i] + self.particles.f_int[i];
                let a_new = r / self.particles.mass[i];
                self.particles.velocity[i] += 0.5 * (self.particles.acceleration[i] + a_new) * dt;
                self.particles.acceleration[i] = a_new;
                self.particles.x_cur[i] += self.particles.velocity[i] * dt;
                ke += 0.5 * self.particles.mass[i] * self.particles.velocity[i].norm_squared();
            }
            self.particles.apply_boundary_conditions();

            if ke < ke_prev && ke_increasing {
                for v in self.particles.velocity.iter_mut() {
                    *v *= 0.0;
                }
            }
            ke_increasing = ke >= ke_prev;
            ke_prev = ke;

            if relative_residual < self.config.tolerance {
                return Ok(SolveResult::converged_at(step, residual_norm, relative_residual));
            }
        }

        Ok(SolveResult::diverged(
            self.config.max_steps,
            ke_prev,
            ke_prev / r_ref,
            spine_core::error::DivergenceReason::MaxIterationsReached,
        ))
    }

    fn step(&mut self, _dt: f64) -> Result<()> {
        self.apply_injected();
        self.evaluate_step()
    }

    fn stable_dt(&self) -> f64 {
        let mut dt_min = f64::INFINITY;
        for i in 0..self.particles.n_particles {
            let lambda_2mu = self.particles.bulk[i] + 4.0 * self.particles.shear[i] / 3.0;
            let k_eff = lambda_2mu * self.particles.volume[i] / self.neighbors.support_radius.powi(2);
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
        (0..self.particles.n_particles).map(|i| self.neighbors.damage(i)).collect()
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

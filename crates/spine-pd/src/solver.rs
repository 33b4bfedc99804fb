//! NOSB quasi-static solver: velocity-Verlet with kinetic damping
//! (spec.md §4.8, §9 Open Questions — kinetic-damping heuristic kept as the
//! source describes it since no alternative dynamic-relaxation scheme was
//! specified as mandatory).

use crate::bonds::BondSystem;
use crate::correspondence::{compute_deformation_gradients, compute_internal_forces, compute_shape_tensors};
use crate::error::Result;
use crate::particles::ParticleSystem;
use spine_core::materials::Material;

#[derive(Debug, Clone, Copy)]
pub struct NosbConfig {
    pub max_steps: usize,
    pub tolerance: f64,
    /// Viscous damping factor applied to velocity each step, `v *= 1 - d`.
    pub viscous_damping: f64,
}

impl Default for NosbConfig {
    fn default() -> Self {
        Self { max_steps: 2000, tolerance: 1e-6, viscous_damping: 0.0 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NosbProgress {
    pub step: usize,
    pub max_steps: usize,
    pub kinetic_energy: f64,
    pub relative_residual: f64,
}

/// `k_eff = (lambda + 2*mu) * V_i * (|sum dpsi|^2 + sum |dpsi_k|^2)` collapses,
/// for the uniform-horizon NOSB case, to a horizon/volume-scaled estimate
/// of the per-particle stiffness; used only to bound the explicit time step.
fn stable_time_step(particles: &ParticleSystem, bonds: &BondSystem) -> f64 {
    let mut dt_min = f64::INFINITY;
    for i in 0..particles.n_particles {
        let lambda_2mu = particles.bulk[i] + 4.0 * particles.shear[i] / 3.0;
        let k_eff = lambda_2mu * particles.volume[i] / bonds.horizon.powi(2);
        if k_eff > 0.0 {
            let dt = (2.0 * particles.mass[i] / k_eff).sqrt();
            dt_min = dt_min.min(dt);
        }
    }
    if dt_min.is_finite() { dt_min } else { 1e-6 }
}

pub fn solve_quasi_static(
    particles: &mut ParticleSystem,
    bonds: &mut BondSystem,
    material: &mut Material,
    config: &NosbConfig,
    mut progress: impl FnMut(NosbProgress) -> bool,
) -> Result<bool> {
    let dt = stable_time_step(particles, bonds);
    let mut ke_prev = f64::INFINITY;
    let mut ke_increasing = false;
    let mut r_ref = 1.0;
    let mut converged = false;

    for step in 0..config.max_steps {
        let shapes = compute_shape_tensors(particles, bonds)?;
        compute_deformation_gradients(particles, bonds, &shapes);
        compute_internal_forces(particles, bonds, &shapes, material, 0.1);

        let mut residual_norm = 0.0;
        for i in 0..particles.n_particles {
            let r = particles.f_ext[i] + particles.f_int[i];
            residual_norm += r.norm_squared();
        }
        residual_norm = residual_norm.sqrt();
        if step == 0 {
            r_ref = residual_norm.max(1.0);
        }
        let relative_residual = residual_norm / r_ref;

        let mut ke = 0.0;
        for i in 0..particles.n_particles {
            if particles.fixed[i].iter().all(|&f| f) {
                continue;
            }
            let r = particles.f_ext[i] + particles.f_int[i];
            let a_new = r / particles.mass[i];
            particles.velocity[i] += 0.5 * (particles.acceleration[i] + a_new) * dt;
            particles.acceleration[i] = a_new;
            if config.viscous_damping > 0.0 {
                particles.velocity[i] *= 1.0 - config.viscous_damping;
            }
            particles.x_cur[i] += particles.velocity[i] * dt;
            ke += 0.5 * particles.mass[i] * particles.velocity[i].norm_squared();
        }
        particles.apply_boundary_conditions();

        if ke < ke_prev && ke_increasing {
            for v in particles.velocity.iter_mut() {
                *v *= 0.0;
            }
        }
        ke_increasing = ke >= ke_prev;
        ke_prev = ke;

        let keep_going = progress(NosbProgress {
            step,
            max_steps: config.max_steps,
            kinetic_energy: ke,
            relative_residual,
        });
        if !keep_going {
            return Ok(false);
        }

        if relative_residual < config.tolerance {
            converged = true;
            break;
        }
    }

    Ok(converged)
}

//! SPG deformation gradient, stress, and internal-force compute
//! (spec.md §4.9), mirroring `spine-pd`'s correspondence NOSB compute with
//! the bond-based shape tensor replaced by the kernel-gradient correction
//! matrix `L_i = (sum_j V_j xi_j (grad W_ij)^T)^-1`.

use crate::error::{Result, SpgError};
use crate::shape::SpgNeighbors;
use nalgebra::Matrix3;
use spine_core::materials::Material;
use spine_pd::ParticleSystem;

pub struct CorrectionMatrices {
    pub l: Vec<Matrix3<f64>>,
}

pub fn compute_correction_matrices(neighbors: &SpgNeighbors) -> Result<CorrectionMatrices> {
    let n = neighbors.neighbor_count.len();
    let mut l = Vec::with_capacity(n);
    for i in 0..n {
        let mut b = Matrix3::zeros();
        for slot in neighbors.slots(i) {
            if neighbors.broken[slot] {
                continue;
            }
            b += neighbors.xi[slot] * neighbors.grad_psi[slot].transpose();
        }
        match b.try_inverse() {
            Some(inv) => l.push(inv),
            None => return Err(SpgError::SingularCorrectionMatrix { particle: i }),
        }
    }
    Ok(CorrectionMatrices { l })
}

pub fn compute_deformation_gradients(
    particles: &mut ParticleSystem,
    neighbors: &SpgNeighbors,
    corrections: &CorrectionMatrices,
) {
    for i in 0..particles.n_particles {
        let mut sum = Matrix3::zeros();
        for slot in neighbors.slots(i) {
            if neighbors.broken[slot] {
                continue;
            }
            let j = neighbors.neighbor_idx[slot];
            let eta = particles.x_cur[j] - particles.x_cur[i];
            let grad_corrected = corrections.l[i] * neighbors.grad_psi[slot];
            sum += eta * grad_corrected.transpose();
        }
        particles.deformation_gradient[i] = Matrix3::identity() + sum;
    }
}

fn stabilization_coefficient(bulk: f64, shear: f64, support_radius: f64, g_s: f64) -> f64 {
    g_s * (bulk + 4.0 * shear / 3.0) / (support_radius * std::f64::consts::PI)
}

pub fn compute_internal_forces(
    particles: &mut ParticleSystem,
    neighbors: &SpgNeighbors,
    corrections: &CorrectionMatrices,
    material: &mut Material,
    stabilization_factor: f64,
) {
    let n = particles.n_particles;
    material.init_gauss_state(n);

    let mut sigma = Vec::with_capacity(n);
    for i in 0..n {
        let f = particles.deformation_gradient[i];
        let state = material.compute_stress(i, &f, false);
        sigma.push(state.sigma);
    }

    for f in particles.f_int.iter_mut() {
        *f = nalgebra::Vector3::zeros();
    }

    for i in 0..n {
        let c_bond = stabilization_coefficient(particles.bulk[i], particles.shear[i], neighbors.support_radius, stabilization_factor);
        let grad_corrected_i: Vec<_> = neighbors
            .slots(i)
            .map(|slot| corrections.l[i] * neighbors.grad_psi[slot])
            .collect();

        for (local, slot) in neighbors.slots(i).enumerate() {
            if neighbors.broken[slot] {
                continue;
            }
            let j = neighbors.neighbor_idx[slot];
            let eta = particles.x_cur[j] - particles.x_cur[i];
            let xi = neighbors.xi[slot];

            let grad_j_at_i = grad_corrected_i[local];
            let force_i = sigma[i] * grad_j_at_i;
            let force_j = reciprocal_force(particles, neighbors, corrections, j, i, &sigma);

            let stabilization = c_bond * (eta - particles.deformation_gradient[i] * xi) / neighbors.support_radius;

            particles.f_int[i] += force_i - force_j + stabilization;
        }
    }
}

fn reciprocal_force(
    particles: &ParticleSystem,
    neighbors: &SpgNeighbors,
    corrections: &CorrectionMatrices,
    j: usize,
    i: usize,
    sigma: &[Matrix3<f64>],
) -> nalgebra::Vector3<f64> {
    for slot in neighbors.slots(j) {
        if neighbors.neighbor_idx[slot] == i && !neighbors.broken[slot] {
            let grad_i_at_j = corrections.l[j] * neighbors.grad_psi[slot];
            return sigma[j] * grad_i_at_j;
        }
    }
    let _ = particles;
    nalgebra::Vector3::zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use spine_core::materials::LinearElastic;

    fn small_cube() -> (ParticleSystem, SpgNeighbors) {
        let mut positions = Vec::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    positions.push(Vector3::new(x as f64, y as f64, z as f64));
                }
            }
        }
        let n = positions.len();
        let volume = vec![1.0; n];
        let particles = ParticleSystem::new(positions.clone(), volume.clone(), vec![1000.0; n], vec![1.67e9; n], vec![0.77e9; n]).unwrap();
        let neighbors = SpgNeighbors::build(&positions, &volume, 2.0, 3, 8);
        (particles, neighbors)
    }

    #[test]
    fn zero_displacement_gives_zero_internal_force() {
        let (mut particles, neighbors) = small_cube();
        let corrections = compute_correction_matrices(&neighbors).unwrap();
        compute_deformation_gradients(&mut particles, &neighbors, &corrections);
        let mut material = Material::LinearElastic(LinearElastic::new(2e9, 0.3).unwrap());
        compute_internal_forces(&mut particles, &neighbors, &corrections, &mut material, 0.1);
        for f in &particles.f_int {
            assert!(f.norm() < 1e-4);
        }
    }
}

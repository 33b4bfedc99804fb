//! Correspondence NOSB compute: shape tensor, deformation gradient, force
//! state, and bond-based zero-energy stabilization (spec.md §4.8).

use crate::bonds::BondSystem;
use crate::error::{PdError, Result};
use crate::particles::ParticleSystem;
use nalgebra::Matrix3;
use rayon::prelude::*;
use spine_core::materials::Material;

/// Cached per-particle `K^-1`; recomputed whenever bonds change (a batch of
/// breakings per spec.md §4.8's "shape tensor is recomputed after any batch
/// of breakings").
pub struct ShapeTensors {
    pub k_inv: Vec<Matrix3<f64>>,
}

/// `K_i = sum_j omega_j (xi_j outer xi_j) V_j` over intact bonds.
pub fn compute_shape_tensors(particles: &ParticleSystem, bonds: &BondSystem) -> Result<ShapeTensors> {
    let n = particles.n_particles;
    let k_inv: Vec<Matrix3<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut k = Matrix3::zeros();
            for slot in bonds.slots(i) {
                if bonds.broken[slot] {
                    continue;
                }
                let j = bonds.neighbor_idx[slot];
                let xi = bonds.xi[slot];
                k += bonds.omega[slot] * (xi * xi.transpose()) * particles.volume[j];
            }
            k.try_inverse().ok_or(PdError::SingularShapeTensor { particle: i, dim: 3 })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ShapeTensors { k_inv })
}

/// `F_i = (sum_j omega_j (eta_j outer xi_j) V_j) . K^-1_i`, `eta_j = x_j - x_i`.
pub fn compute_deformation_gradients(
    particles: &mut ParticleSystem,
    bonds: &BondSystem,
    shapes: &ShapeTensors,
) {
    for i in 0..particles.n_particles {
        let mut n_tensor = Matrix3::zeros();
        for slot in bonds.slots(i) {
            if bonds.broken[slot] {
                continue;
            }
            let j = bonds.neighbor_idx[slot];
            let eta = particles.x_cur[j] - particles.x_cur[i];
            let xi = bonds.xi[slot];
            n_tensor += bonds.omega[slot] * (eta * xi.transpose()) * particles.volume[j];
        }
        particles.deformation_gradient[i] = n_tensor * shapes.k_inv[i];
    }
}

/// `c_bond = G_s * (K + 4*mu/3) / (horizon * pi)`, spec.md §4.8.
fn stabilization_coefficient(bulk: f64, shear: f64, horizon: f64, g_s: f64) -> f64 {
    g_s * (bulk + 4.0 * shear / 3.0) / (horizon * std::f64::consts::PI)
}

/// Computes stress at every particle and scatters the NOSB internal force
/// `f_i = sum_j (T_ij - T_ji) V_j` with zero-energy stabilization added to
/// each pairwise force state. `material` is shared by the whole body, as
/// `compute_stress`'s per-Gauss-point state slot is indexed by particle id
/// here (the same lazy-state pattern J2Plasticity uses per element Gauss
/// point in `spine-core`).
pub fn compute_internal_forces(
    particles: &mut ParticleSystem,
    bonds: &BondSystem,
    shapes: &ShapeTensors,
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

    let mut force_state = vec![Matrix3::zeros(); n];
    for i in 0..n {
        force_state[i] = sigma[i] * shapes.k_inv[i];
    }

    for f in particles.f_int.iter_mut() {
        *f = nalgebra::Vector3::zeros();
    }

    for i in 0..n {
        let c_bond = stabilization_coefficient(particles.bulk[i], particles.shear[i], bonds.horizon, stabilization_factor);
        for slot in bonds.slots(i) {
            if bonds.broken[slot] {
                continue;
            }
            let j = bonds.neighbor_idx[slot];
            let xi = bonds.xi[slot];
            let eta = particles.x_cur[j] - particles.x_cur[i];

            let t_ij = bonds.omega[slot] * (force_state[i] * xi);
            let t_ji = find_reciprocal_weight(bonds, j, i) * (force_state[j] * (-xi));

            let stabilization = c_bond * (eta - particles.deformation_gradient[i] * xi);

            let pairwise = (t_ij - t_ji + stabilization) * particles.volume[j];
            particles.f_int[i] += pairwise;
        }
    }
}

/// Looks up `omega_ji` for the reciprocal bond `(j -> i)`; PD bond lists are
/// built symmetrically from the same horizon, so the entry always exists
/// unless `j`'s bond to `i` was broken independently (asymmetric breaking
/// is allowed, in which case the reciprocal contribution is zero).
fn find_reciprocal_weight(bonds: &BondSystem, j: usize, i: usize) -> f64 {
    for slot in bonds.slots(j) {
        if bonds.neighbor_idx[slot] == i && !bonds.broken[slot] {
            return bonds.omega[slot];
        }
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use spine_core::materials::LinearElastic;

    fn small_cube() -> (ParticleSystem, BondSystem) {
        let mut positions = Vec::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    positions.push(Vector3::new(x as f64, y as f64, z as f64));
                }
            }
        }
        let n = positions.len();
        let particles = ParticleSystem::new(
            positions.clone(),
            vec![1.0; n],
            vec![1000.0; n],
            vec![1.67e9; n],
            vec![0.77e9; n],
        )
        .unwrap();
        let bonds = BondSystem::build(&positions, 2.0, 8).unwrap();
        (particles, bonds)
    }

    #[test]
    fn identity_deformation_gives_identity_gradient() {
        let (mut particles, bonds) = small_cube();
        let shapes = compute_shape_tensors(&particles, &bonds).unwrap();
        compute_deformation_gradients(&mut particles, &bonds, &shapes);
        for f in &particles.deformation_gradient {
            assert!((f - Matrix3::identity()).norm() < 1e-8);
        }
    }

    #[test]
    fn zero_displacement_gives_zero_internal_force() {
        let (mut particles, bonds) = small_cube();
        let shapes = compute_shape_tensors(&particles, &bonds).unwrap();
        compute_deformation_gradients(&mut particles, &bonds, &shapes);
        let mut material = Material::LinearElastic(LinearElastic::new(2e9, 0.3).unwrap());
        compute_internal_forces(&mut particles, &bonds, &shapes, &mut material, 0.1);
        for f in &particles.f_int {
            assert!(f.norm() < 1e-6);
        }
    }
}

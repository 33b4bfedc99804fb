//! Kernel-weighted neighbor lists and shape functions/gradients
//! (spec.md §4.9: `psi_j(x_i) = V_j W_ij`, `grad psi_j`).

use crate::kernel::{kernel_gradient, kernel_value};
use nalgebra::Vector3;
use spine_pd::NeighborSearch;

pub struct SpgNeighbors {
    pub max_neighbors: usize,
    pub support_radius: f64,
    pub dim: usize,
    pub neighbor_idx: Vec<usize>,
    pub neighbor_count: Vec<usize>,
    /// Reference bond vector `xi_j = X_j - X_i`.
    pub xi: Vec<Vector3<f64>>,
    /// `psi_j(x_i) = V_j * W_ij`.
    pub psi: Vec<f64>,
    /// `grad psi_j(x_i) = V_j * grad W_ij`, uncorrected.
    pub grad_psi: Vec<Vector3<f64>>,
    pub broken: Vec<bool>,
    pub initial_bond_count: Vec<usize>,
}

impl SpgNeighbors {
    pub fn build(positions: &[Vector3<f64>], volume: &[f64], support_radius: f64, dim: usize, margin: usize) -> Self {
        let grid = NeighborSearch::build(positions, support_radius * 1.01);
        let counts = grid.count_neighbors(positions, support_radius);
        let max_neighbors = counts.iter().copied().max().unwrap_or(0) + margin;
        let n = positions.len();

        let mut neighbor_idx = vec![usize::MAX; n * max_neighbors];
        let mut neighbor_count = vec![0usize; n];
        let mut xi = vec![Vector3::zeros(); n * max_neighbors];
        let mut psi = vec![0.0; n * max_neighbors];
        let mut grad_psi = vec![Vector3::zeros(); n * max_neighbors];

        for i in 0..n {
            let neighbors = grid.query(positions, i, positions[i], support_radius);
            let count = neighbors.len().min(max_neighbors);
            neighbor_count[i] = count;
            for (slot, &j) in neighbors.iter().take(max_neighbors).enumerate() {
                let base = i * max_neighbors + slot;
                let dxi = positions[j] - positions[i];
                let r = dxi.norm();
                neighbor_idx[base] = j;
                xi[base] = dxi;
                psi[base] = volume[j] * kernel_value(r, support_radius, dim);
                grad_psi[base] = volume[j] * kernel_gradient(dxi, support_radius, dim);
            }
        }

        if neighbor_count.iter().any(|&c| c == 0) {
            log::warn!(
                "{} of {n} particles have no neighbors within the support radius; their correction matrix will be singular",
                neighbor_count.iter().filter(|&&c| c == 0).count()
            );
        }

        let broken = vec![false; n * max_neighbors];
        let initial_bond_count = neighbor_count.clone();

        Self {
            max_neighbors,
            support_radius,
            dim,
            neighbor_idx,
            neighbor_count,
            xi,
            psi,
            grad_psi,
            broken,
            initial_bond_count,
        }
    }

    pub fn slots(&self, particle: usize) -> std::ops::Range<usize> {
        let base = particle * self.max_neighbors;
        base..base + self.neighbor_count[particle]
    }

    pub fn damage(&self, particle: usize) -> f64 {
        let initial = self.initial_bond_count[particle];
        if initial == 0 {
            return 0.0;
        }
        let broken = self.slots(particle).filter(|&s| self.broken[s]).count();
        broken as f64 / initial as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_psi_is_nonnegative() {
        let positions = vec![Vector3::zeros(), Vector3::new(0.3, 0.0, 0.0)];
        let volume = vec![1.0, 1.0];
        let neighbors = SpgNeighbors::build(&positions, &volume, 1.0, 3, 4);
        for &p in &neighbors.psi {
            assert!(p >= 0.0);
        }
    }
}

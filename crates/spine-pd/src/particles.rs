//! Particle storage for correspondence NOSB peridynamics (spec.md §3, §4.8).

use nalgebra::{Matrix3, Vector3};
use spine_core::error::ValidationError;
use spine_core::validation::validate_positive;

/// Owns every per-particle array. `mass[i] = density[i] * volume[i]` is the
/// invariant enforced at construction and re-checked is not needed after —
/// volume/density never change post-construction in this port.
pub struct ParticleSystem {
    pub n_particles: usize,
    pub x_ref: Vec<Vector3<f64>>,
    pub x_cur: Vec<Vector3<f64>>,
    pub velocity: Vec<Vector3<f64>>,
    pub acceleration: Vec<Vector3<f64>>,
    pub mass: Vec<f64>,
    pub volume: Vec<f64>,
    pub density: Vec<f64>,
    /// Per-particle bulk modulus K.
    pub bulk: Vec<f64>,
    /// Per-particle shear modulus mu.
    pub shear: Vec<f64>,
    pub fixed: Vec<[bool; 3]>,
    pub prescribed: Vec<[f64; 3]>,
    pub f_ext: Vec<Vector3<f64>>,
    pub f_int: Vec<Vector3<f64>>,
    pub deformation_gradient: Vec<Matrix3<f64>>,
}

impl ParticleSystem {
    pub fn new(
        positions: Vec<Vector3<f64>>,
        volume: Vec<f64>,
        density: Vec<f64>,
        bulk: Vec<f64>,
        shear: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        let n = positions.len();
        for (label, arr) in [("volume", &volume), ("density", &density), ("bulk", &bulk), ("shear", &shear)] {
            if arr.len() != n {
                return Err(ValidationError::new(
                    label,
                    arr.len() as f64,
                    format!("expected one entry per particle ({n})"),
                ));
            }
        }
        for &v in &volume {
            validate_positive("volume", v)?;
        }
        for &d in &density {
            validate_positive("density", d)?;
        }

        let mass: Vec<f64> = density.iter().zip(&volume).map(|(&d, &v)| d * v).collect();

        Ok(Self {
            n_particles: n,
            x_cur: positions.clone(),
            x_ref: positions,
            velocity: vec![Vector3::zeros(); n],
            acceleration: vec![Vector3::zeros(); n],
            mass,
            volume,
            density,
            bulk,
            shear,
            fixed: vec![[false; 3]; n],
            prescribed: vec![[0.0; 3]; n],
            f_ext: vec![Vector3::zeros(); n],
            f_int: vec![Vector3::zeros(); n],
            deformation_gradient: vec![Matrix3::identity(); n],
        })
    }

    pub fn fix_particle(&mut self, i: usize, value: Option<[f64; 3]>) {
        self.fixed[i] = [true; 3];
        if let Some(v) = value {
            self.prescribed[i] = v;
        }
    }

    pub fn apply_boundary_conditions(&mut self) {
        for i in 0..self.n_particles {
            for d in 0..3 {
                if self.fixed[i][d] {
                    self.x_cur[i][d] = self.x_ref[i][d] + self.prescribed[i][d];
                }
            }
        }
    }

    pub fn displacement(&self, i: usize) -> Vector3<f64> {
        self.x_cur[i] - self.x_ref[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_equals_density_times_volume() {
        let ps = ParticleSystem::new(
            vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)],
            vec![1.0, 2.0],
            vec![1000.0, 1000.0],
            vec![1e9, 1e9],
            vec![1e8, 1e8],
        )
        .unwrap();
        assert_eq!(ps.mass[0], 1000.0);
        assert_eq!(ps.mass[1], 2000.0);
    }

    #[test]
    fn rejects_non_positive_volume() {
        let err = ParticleSystem::new(
            vec![Vector3::zeros()],
            vec![0.0],
            vec![1000.0],
            vec![1e9],
            vec![1e8],
        );
        assert!(err.is_err());
    }
}

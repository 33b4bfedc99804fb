//! Penalty, tied, and regularized Coulomb friction force laws
//! (spec.md §4.11).

use nalgebra::Vector3;

/// `F = penalty * penetration * n_hat` applied to body A, negate for B.
/// `n_hat = (pos_a - pos_b)/|.|`; zero when the points coincide.
pub fn penalty_force(pos_a: Vector3<f64>, pos_b: Vector3<f64>, gap_tolerance: f64, penalty: f64) -> Vector3<f64> {
    let delta = pos_a - pos_b;
    let d = delta.norm();
    if d < 1e-14 {
        return Vector3::zeros();
    }
    let penetration = gap_tolerance - d;
    if penetration <= 0.0 {
        return Vector3::zeros();
    }
    let n_hat = delta / d;
    penalty * penetration * n_hat
}

/// Normal viscous damping added on top of `penalty_force`,
/// `c = 2*xi*sqrt(k*m_eff)`, `m_eff = m_a*m_b/(m_a+m_b)`.
pub fn normal_damping_force(
    pos_a: Vector3<f64>,
    pos_b: Vector3<f64>,
    vel_a: Vector3<f64>,
    vel_b: Vector3<f64>,
    penalty: f64,
    mass_a: f64,
    mass_b: f64,
    damping_ratio: f64,
) -> Vector3<f64> {
    let delta = pos_a - pos_b;
    let d = delta.norm();
    if d < 1e-14 {
        return Vector3::zeros();
    }
    let n_hat = delta / d;
    let m_eff = mass_a * mass_b / (mass_a + mass_b);
    let c = 2.0 * damping_ratio * (penalty * m_eff).sqrt();
    let v_rel_n = (vel_a - vel_b).dot(&n_hat);
    -c * v_rel_n * n_hat
}

/// Bidirectional spring to a fixed rest offset `r0 = pos_a0 - pos_b0`,
/// `F = -penalty * (pos_a - pos_b - r0)` applied to A.
pub fn tied_force(pos_a: Vector3<f64>, pos_b: Vector3<f64>, r0: Vector3<f64>, penalty: f64) -> Vector3<f64> {
    -penalty * (pos_a - pos_b - r0)
}

/// Regularized Coulomb friction: sticks while the trial tangential force is
/// within the static-friction cone, otherwise slips at the dynamic limit.
/// `v_t` is the relative tangential velocity (already projected onto the
/// plane normal to `n_hat`).
pub fn coulomb_friction_force(
    v_t: Vector3<f64>,
    f_n_magnitude: f64,
    penalty: f64,
    dt: f64,
    mu_s: f64,
    mu_d: f64,
) -> Vector3<f64> {
    let trial = penalty * v_t * dt;
    let trial_norm = trial.norm();
    if trial_norm <= mu_s * f_n_magnitude || trial_norm < 1e-14 {
        trial
    } else {
        mu_d * f_n_magnitude * (trial / trial_norm)
    }
}

/// Projects a relative velocity onto the plane normal to `n_hat`.
pub fn tangential_component(v_rel: Vector3<f64>, n_hat: Vector3<f64>) -> Vector3<f64> {
    v_rel - v_rel.dot(&n_hat) * n_hat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_force_is_repulsive_along_normal() {
        let f = penalty_force(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.05, 0.0, 0.0), 0.1, 1000.0);
        assert!(f.x < 0.0);
    }

    #[test]
    fn zero_penetration_gives_zero_force() {
        let f = penalty_force(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), 0.1, 1000.0);
        assert_eq!(f, Vector3::zeros());
    }

    #[test]
    fn tied_force_resists_both_tension_and_compression() {
        let r0 = Vector3::new(0.1, 0.0, 0.0);
        let f_stretched = tied_force(Vector3::new(0.2, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0), r0, 100.0);
        let f_compressed = tied_force(Vector3::new(0.05, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0), r0, 100.0);
        assert!(f_stretched.x < 0.0);
        assert!(f_compressed.x > 0.0);
    }

    #[test]
    fn friction_sticks_within_cone_and_slips_beyond() {
        let v_t = Vector3::new(10.0, 0.0, 0.0);
        let stick = coulomb_friction_force(v_t, 1000.0, 1.0, 0.001, 0.9, 0.5);
        assert!((stick.norm() - v_t.norm() * 1.0 * 0.001).abs() < 1e-9);

        let slip = coulomb_friction_force(v_t, 1.0, 1.0, 1.0, 0.9, 0.5);
        assert!((slip.norm() - 0.5 * 1.0).abs() < 1e-9);
    }
}

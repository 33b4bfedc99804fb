//! Rigid body: vertex array advanced by a queue of prescribed motions
//! (spec.md §4.13).

use nalgebra::{Rotation3, Unit, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionKind {
    Translation,
    Rotation,
}

#[derive(Debug, Clone, Copy)]
pub struct PrescribedMotion {
    pub kind: MotionKind,
    pub axis: Unit<Vector3<f64>>,
    /// Rate per unit time: `m/s` for translation, `rad/s` for rotation.
    pub rate: f64,
    /// Total extent: `m` for translation, `rad` for rotation.
    pub total: f64,
    pub center: Option<Vector3<f64>>,
}

impl PrescribedMotion {
    pub fn translation(axis: Vector3<f64>, rate: f64, total: f64) -> Self {
        Self { kind: MotionKind::Translation, axis: Unit::new_normalize(axis), rate, total, center: None }
    }

    pub fn rotation(axis: Vector3<f64>, rate: f64, total: f64, center: Vector3<f64>) -> Self {
        Self { kind: MotionKind::Rotation, axis: Unit::new_normalize(axis), rate, total, center: Some(center) }
    }
}

/// Pure geometric carrier: no mass, no material, no internal/external force
/// fields. Contributes contact forces through its vertex positions only.
pub struct RigidBody {
    pub vertices_ref: Vec<Vector3<f64>>,
    pub vertices_cur: Vec<Vector3<f64>>,
    pub motions: Vec<PrescribedMotion>,
    current_motion: usize,
    cumulative: f64,
}

impl RigidBody {
    pub fn new(vertices: Vec<Vector3<f64>>, motions: Vec<PrescribedMotion>) -> Self {
        Self {
            vertices_cur: vertices.clone(),
            vertices_ref: vertices,
            motions,
            current_motion: 0,
            cumulative: 0.0,
        }
    }

    /// Advances the active motion by `dt`; moves to the next motion once
    /// `total` is reached. Returns `false` once all motions are exhausted.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.current_motion >= self.motions.len() {
            return false;
        }
        let motion = self.motions[self.current_motion];
        let mut step = motion.rate * dt;
        let remaining = motion.total - self.cumulative;
        if step.abs() > remaining.abs() {
            step = remaining;
        }

        match motion.kind {
            MotionKind::Translation => {
                let delta = motion.axis.into_inner() * step;
                for v in self.vertices_cur.iter_mut() {
                    *v += delta;
                }
            }
            MotionKind::Rotation => {
                let center = motion.center.unwrap_or_else(Vector3::zeros);
                let rot = Rotation3::from_axis_angle(&motion.axis, step);
                for v in self.vertices_cur.iter_mut() {
                    *v = center + rot * (*v - center);
                }
            }
        }

        self.cumulative += step;
        if (self.cumulative - motion.total).abs() < 1e-12 || self.cumulative.abs() >= motion.total.abs() {
            self.current_motion += 1;
            self.cumulative = 0.0;
        }
        self.current_motion < self.motions.len()
    }

    pub fn stable_dt(&self) -> f64 {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_moves_every_vertex_by_the_same_delta() {
        let mut body = RigidBody::new(
            vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)],
            vec![PrescribedMotion::translation(Vector3::new(0.0, 0.0, 1.0), 2.0, 1.0)],
        );
        body.advance(0.1);
        assert!((body.vertices_cur[0] - Vector3::new(0.0, 0.0, 0.2)).norm() < 1e-12);
        assert!((body.vertices_cur[1] - Vector3::new(1.0, 0.0, 0.2)).norm() < 1e-12);
    }

    #[test]
    fn advance_returns_false_once_motions_exhausted() {
        let mut body = RigidBody::new(
            vec![Vector3::zeros()],
            vec![PrescribedMotion::translation(Vector3::new(1.0, 0.0, 0.0), 1.0, 0.5)],
        );
        assert!(body.advance(0.3));
        assert!(!body.advance(0.3));
    }

    #[test]
    fn rotation_about_center_preserves_distance() {
        let center = Vector3::new(0.0, 0.0, 0.0);
        let mut body = RigidBody::new(
            vec![Vector3::new(1.0, 0.0, 0.0)],
            vec![PrescribedMotion::rotation(Vector3::new(0.0, 0.0, 1.0), std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2, center)],
        );
        body.advance(1.0);
        assert!((body.vertices_cur[0] - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-9);
    }
}

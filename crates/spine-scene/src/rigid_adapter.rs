//! Rigid-body [`Adapter`] impl: a kinematic carrier has no internal force
//! state, so `solve()` just runs its motion queue to completion and
//! `step(dt)` advances it by one increment (spec.md §4.13).

use crate::adapter::Adapter;
use crate::error::Result;
use nalgebra::Vector3;
use spine_contact::RigidBody;
use spine_core::SolveResult;

pub struct RigidAdapter {
    pub body: RigidBody,
    /// Fixed sub-step used when the scheduler asks for a full `solve()`
    /// rather than stepping explicitly.
    pub solve_dt: f64,
}

impl RigidAdapter {
    pub fn new(body: RigidBody, solve_dt: f64) -> Self {
        Self { body, solve_dt }
    }
}

impl Adapter for RigidAdapter {
    fn solve(&mut self) -> Result<SolveResult> {
        let mut iterations = 0;
        while self.body.advance(self.solve_dt) {
            iterations += 1;
            if iterations > 1_000_000 {
                break;
            }
        }
        Ok(SolveResult::converged_at(iterations, 0.0, 0.0))
    }

    fn step(&mut self, dt: f64) -> Result<()> {
        self.body.advance(dt);
        Ok(())
    }

    fn stable_dt(&self) -> f64 {
        self.body.stable_dt()
    }

    fn current_positions(&self) -> Vec<Vector3<f64>> {
        self.body.vertices_cur.clone()
    }

    fn reference_positions(&self) -> Vec<Vector3<f64>> {
        self.body.vertices_ref.clone()
    }

    fn inject_external_force(&mut self, _index: usize, _force: Vector3<f64>) {
        // Kinematic: forces don't affect a prescribed-motion rigid body.
    }

    fn clear_external_forces(&mut self) {}
}

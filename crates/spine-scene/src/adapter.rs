//! Uniform facade over every solver kind the scene scheduler can drive
//! (spec.md §4.12 "Adapters"). A `Scene` never matches on solver flavor;
//! it only ever calls through this trait.

use crate::error::Result;
use nalgebra::Vector3;
use spine_core::SolveResult;

/// One simulated body, whatever its underlying representation (FEM mesh,
/// PD/SPG particle cloud, FEM<->PD coupled pair, or a kinematic rigid
/// body).
pub trait Adapter {
    /// Runs a full quasi-static/static solve to convergence.
    fn solve(&mut self) -> Result<SolveResult>;

    /// Advances one explicit step of size `dt`.
    fn step(&mut self, dt: f64) -> Result<()>;

    /// This body's own explicit-stability time step bound (`f64::INFINITY`
    /// for bodies with no stability constraint, e.g. kinematic rigid
    /// bodies or a pure static FEM solve).
    fn stable_dt(&self) -> f64;

    /// Current-configuration positions of every degree of freedom this
    /// body owns (nodes or particles), for contact detection and export.
    fn current_positions(&self) -> Vec<Vector3<f64>>;

    /// Reference-configuration positions, same indexing as
    /// [`Adapter::current_positions`].
    fn reference_positions(&self) -> Vec<Vector3<f64>>;

    /// Displacement field, `current - reference`.
    fn displacements(&self) -> Vec<Vector3<f64>> {
        self.current_positions()
            .iter()
            .zip(self.reference_positions())
            .map(|(c, r)| c - r)
            .collect()
    }

    /// Per-DOF damage fraction, `0.0` for bodies with no bond-breaking
    /// model (FEM, rigid).
    fn damage(&self) -> Vec<f64> {
        vec![0.0; self.current_positions().len()]
    }

    /// Adds a contact/coupling force to DOF `index` for the next
    /// solve/step call.
    fn inject_external_force(&mut self, index: usize, force: Vector3<f64>);

    /// Clears every force injected by [`Adapter::inject_external_force`]
    /// since the last clear, so stale contact reactions never accumulate
    /// across scheduler iterations.
    fn clear_external_forces(&mut self);
}

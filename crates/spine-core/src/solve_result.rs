//! Outcome type shared by every solver path (spec.md §7: convergence
//! failures are return values, never panics).

use crate::error::DivergenceReason;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub converged: bool,
    pub iterations: usize,
    pub residual: f64,
    pub relative_residual: f64,
    pub divergence_reason: Option<DivergenceReasonDto>,
    /// Wall-clock solve time, in seconds. Solvers themselves don't measure
    /// this (it would mean threading an `Instant` through every early
    /// return); callers that care wrap the `solve` call and fill it in
    /// with [`Self::with_elapsed_time`].
    pub elapsed_time: f64,
}

/// Serde-friendly mirror of [`DivergenceReason`] (the original has no
/// serde derive since it is also used inside non-serializable error types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceReasonDto {
    MaxIterationsReached,
    NanOrInfResidual,
    SingularTangent,
    Cancelled,
}

impl From<DivergenceReason> for DivergenceReasonDto {
    fn from(r: DivergenceReason) -> Self {
        match r {
            DivergenceReason::MaxIterationsReached => DivergenceReasonDto::MaxIterationsReached,
            DivergenceReason::NanOrInfResidual => DivergenceReasonDto::NanOrInfResidual,
            DivergenceReason::SingularTangent => DivergenceReasonDto::SingularTangent,
            DivergenceReason::Cancelled => DivergenceReasonDto::Cancelled,
        }
    }
}

impl SolveResult {
    pub fn converged_at(iterations: usize, residual: f64, relative_residual: f64) -> Self {
        Self {
            converged: true,
            iterations,
            residual,
            relative_residual,
            divergence_reason: None,
            elapsed_time: 0.0,
        }
    }

    pub fn diverged(iterations: usize, residual: f64, relative_residual: f64, reason: DivergenceReason) -> Self {
        Self {
            converged: false,
            iterations,
            residual,
            relative_residual,
            divergence_reason: Some(reason.into()),
            elapsed_time: 0.0,
        }
    }

    /// `cancelled?` per the external `SolveResult` contract: true exactly
    /// when a progress callback returned `false`.
    pub fn is_cancelled(&self) -> bool {
        self.divergence_reason == Some(DivergenceReasonDto::Cancelled)
    }

    pub fn with_elapsed_time(mut self, seconds: f64) -> Self {
        self.elapsed_time = seconds;
        self
    }
}

//! Error taxonomy for the solver core (spec.md §7).
//!
//! Validation failures are fatal and thrown at construction time; convergence
//! failures and cancellation are first-class return values carried inside
//! `SolveResult`, never panics.

use thiserror::Error;

/// Raised by a constructor when an input violates a documented invariant
/// (elastic constants, BC indices, horizons, …). Carries enough context for
/// the caller to fix the input without re-deriving the check.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("validation failed for `{parameter}` (value = {value}): {message}{}", suggestion_suffix(.suggestion))]
pub struct ValidationError {
    pub parameter: String,
    pub value: f64,
    pub message: String,
    pub suggestion: Option<String>,
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" — suggestion: {s}"),
        None => String::new(),
    }
}

impl ValidationError {
    pub fn new(parameter: impl Into<String>, value: f64, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            value,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Reason a linear/nonlinear/arc-length/coupling solve stopped short of
/// convergence or was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceReason {
    MaxIterationsReached,
    NanOrInfResidual,
    SingularTangent,
    Cancelled,
}

impl std::fmt::Display for DivergenceReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DivergenceReason::MaxIterationsReached => "max_iterations_reached",
            DivergenceReason::NanOrInfResidual => "nan_divergence",
            DivergenceReason::SingularTangent => "singular_tangent",
            DivergenceReason::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Fatal solver errors: these are not convergence statuses, they are
/// conditions the solver cannot recover from at all (singular direct solve,
/// mesh/material lookup failures at assembly time).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("linear solver failed: {0}")]
    LinearSolver(String),

    #[error("assembly failed: {0}")]
    Assembly(String),

    #[error("NaN/Inf divergence during residual evaluation at iteration {iteration}")]
    NanDivergence { iteration: usize },
}

pub type Result<T> = std::result::Result<T, SolveError>;

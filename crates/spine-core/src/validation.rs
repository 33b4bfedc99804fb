//! Input validation helpers (spec.md §7 kind 1: validation failure).
//!
//! Every material/domain constructor that has a documented invariant calls
//! into this module before storing state, mirroring the `validate_*` family
//! in original_source's `fea/fem/validation.py`.

use crate::error::ValidationError;

pub fn validate_poisson_ratio(nu: f64) -> Result<(), ValidationError> {
    if !(nu > -1.0 && nu < 0.5) {
        return Err(ValidationError::new(
            "poissons_ratio",
            nu,
            "Poisson's ratio must satisfy -1 < nu < 0.5",
        )
        .with_suggestion("use a value strictly between -1.0 and 0.5, e.g. 0.3"));
    }
    Ok(())
}

pub fn validate_positive(parameter: &str, value: f64) -> Result<(), ValidationError> {
    if !(value > 0.0) {
        return Err(ValidationError::new(
            parameter,
            value,
            format!("{parameter} must be strictly positive"),
        ));
    }
    Ok(())
}

pub fn validate_non_negative(parameter: &str, value: f64) -> Result<(), ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::new(
            parameter,
            value,
            format!("{parameter} must not be negative"),
        ));
    }
    Ok(())
}

pub fn validate_horizon(horizon: f64, particle_spacing: f64) -> Result<(), ValidationError> {
    validate_positive("horizon", horizon)?;
    if horizon < particle_spacing {
        log::warn!(
            "horizon ({horizon}) is smaller than particle spacing ({particle_spacing}); bonds may be empty"
        );
    }
    Ok(())
}

/// `1 - nu12*nu21 - nu23^2 - 2*nu12*nu21*nu23 > 0` thermodynamic
/// positive-definiteness check for the transverse-isotropic compliance.
pub fn validate_transverse_isotropic_pd(nu12: f64, nu21: f64, nu23: f64) -> Result<(), ValidationError> {
    let det = 1.0 - nu12 * nu21 - nu23 * nu23 - 2.0 * nu12 * nu21 * nu23;
    if det <= 0.0 {
        return Err(ValidationError::new(
            "transverse_isotropic_compliance",
            det,
            "compliance matrix is not positive-definite (1 - nu12*nu21 - nu23^2 - 2*nu12*nu21*nu23 <= 0)",
        )
        .with_suggestion("reduce the Poisson ratios or increase the elastic moduli"));
    }
    Ok(())
}

pub fn validate_bc_index(index: usize, n_nodes: usize) -> Result<(), ValidationError> {
    if index >= n_nodes {
        return Err(ValidationError::new(
            "bc_index",
            index as f64,
            format!("boundary condition index {index} is out of range [0, {n_nodes})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_incompressible_and_auxetic_poisson_ratio() {
        assert!(validate_poisson_ratio(0.5).is_err());
        assert!(validate_poisson_ratio(-1.0).is_err());
        assert!(validate_poisson_ratio(0.3).is_ok());
    }

    #[test]
    fn rejects_non_positive_definite_transverse_isotropic_compliance() {
        assert!(validate_transverse_isotropic_pd(0.9, 0.9, 0.9).is_err());
        assert!(validate_transverse_isotropic_pd(0.3, 0.02, 0.2).is_ok());
    }

    #[test]
    fn rejects_out_of_range_bc_index() {
        assert!(validate_bc_index(10, 5).is_err());
        assert!(validate_bc_index(4, 5).is_ok());
    }
}

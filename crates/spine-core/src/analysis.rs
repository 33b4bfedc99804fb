//! Energy-balance reporting, supplemented from original_source's
//! `energy_balance.py` (SPEC_FULL.md "Supplemented features").

use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy)]
pub struct EnergyBalance {
    pub external_work: f64,
    pub internal_energy: f64,
    pub ratio: f64,
}

/// `w_ext = sum(f_ext . u)`, `u_int = sum_gp 0.5 * sigma:eps * w|detJ|`
/// (small-strain path; for hyperelastic materials `eps` is still the
/// small-strain tensor stored alongside `F`, so this is an approximation
/// of the strain energy rather than the exact hyperelastic potential).
pub fn compute_energy_balance(mesh: &Mesh) -> EnergyBalance {
    let mut w_ext = 0.0;
    for n in 0..mesh.n_nodes {
        w_ext += mesh.f_ext[n].dot(&mesh.u[n]);
    }

    let mut u_int = 0.0;
    for field in &mesh.gauss {
        let work_density = field.sigma.component_mul(&field.eps).sum();
        u_int += 0.5 * work_density * field.integration_weight;
    }

    let ratio = if w_ext.abs() > 1e-300 { u_int / w_ext } else { f64::NAN };
    EnergyBalance { external_work: w_ext, internal_energy: u_int, ratio }
}

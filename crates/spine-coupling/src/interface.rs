//! Transfers displacement and force across the FEM<->PD interface
//! (spec.md §3 `InterfaceManager`, §4.10).

use crate::zone_split::InterfaceSet;
use nalgebra::Vector3;
use spine_core::mesh::Mesh;
use spine_pd::ParticleSystem;

/// Binds an [`InterfaceSet`] to the live FEM/PD state it connects.
pub struct InterfaceManager<'a> {
    interface: &'a InterfaceSet,
}

impl<'a> InterfaceManager<'a> {
    pub fn new(interface: &'a InterfaceSet) -> Self {
        Self { interface }
    }

    /// Current interface displacement, read off the FEM side (the
    /// "master" field in a Dirichlet-Neumann split).
    pub fn interface_fem_disp(&self, mesh: &Mesh) -> Vec<Vector3<f64>> {
        self.interface.fem_local.iter().map(|&n| mesh.u[n]).collect()
    }

    /// Applies the FEM interface displacement as a Dirichlet condition on
    /// the matching PD ghost particles. Particles at the interface coincide
    /// exactly with FEM node positions, so no interpolation is needed.
    pub fn fem_to_pd_disp(&self, mesh: &Mesh, particles: &mut ParticleSystem) {
        for (&fem_n, &pd_i) in self.interface.fem_local.iter().zip(&self.interface.pd_local) {
            let u = mesh.u[fem_n];
            particles.fix_particle(pd_i, Some([u.x, u.y, u.z]));
        }
    }

    /// Returns the PD internal-force reaction to apply as FEM external
    /// load at each interface node, `f_fem = -f_int_pd` (Newton's third
    /// law across the split).
    pub fn pd_to_fem_force(&self, particles: &ParticleSystem) -> Vec<(usize, Vector3<f64>)> {
        self.interface
            .pd_local
            .iter()
            .zip(&self.interface.fem_local)
            .map(|(&pd_i, &fem_n)| (fem_n, -particles.f_int[pd_i]))
            .collect()
    }

    /// Relative change in interface displacement between two staggered
    /// iterations, `||u - u_prev|| / max(||u||, eps)`.
    pub fn relative_change(prev: &[Vector3<f64>], curr: &[Vector3<f64>]) -> f64 {
        let mut num = 0.0;
        let mut den = 0.0;
        for (p, c) in prev.iter().zip(curr) {
            num += (c - p).norm_squared();
            den += c.norm_squared();
        }
        num.sqrt() / den.sqrt().max(1e-12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone_split::split;
    use spine_core::elements::ElementType;

    fn single_quad_split() -> (Mesh, ParticleSystem, InterfaceSet) {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
        ];
        let conn = vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]];
        let volumes = vec![1.0, 1.0];
        let split_result = split(&nodes, &conn, &volumes, &[false, true]);

        let mesh = Mesh::new(
            ElementType::Quad4 { plane_strain: false },
            split_result.fem.nodes.clone(),
            split_result.fem.connectivity.clone(),
            None,
        )
        .unwrap();
        let n = split_result.pd.positions.len();
        let particles = ParticleSystem::new(
            split_result.pd.positions.clone(),
            split_result.pd.volumes.clone(),
            vec![1000.0; n],
            vec![1e9; n],
            vec![1e8; n],
        )
        .unwrap();
        (mesh, particles, split_result.interface)
    }

    #[test]
    fn fem_displacement_propagates_to_matching_pd_particle() {
        let (mut mesh, mut particles, interface) = single_quad_split();
        mesh.u[interface.fem_local[0]] = Vector3::new(0.01, 0.0, 0.0);
        let im = InterfaceManager::new(&interface);
        im.fem_to_pd_disp(&mesh, &mut particles);
        particles.apply_boundary_conditions();
        let pd_i = interface.pd_local[0];
        assert!((particles.x_cur[pd_i].x - particles.x_ref[pd_i].x - 0.01).abs() < 1e-12);
    }

    #[test]
    fn pd_reaction_force_is_negated_internal_force() {
        let (_, mut particles, interface) = single_quad_split();
        let pd_i = interface.pd_local[0];
        particles.f_int[pd_i] = Vector3::new(5.0, 0.0, 0.0);
        let im = InterfaceManager::new(&interface);
        let reactions = im.pd_to_fem_force(&particles);
        let (_, f) = reactions.into_iter().find(|(n, _)| *n == interface.fem_local[0]).unwrap();
        assert_eq!(f, Vector3::new(-5.0, 0.0, 0.0));
    }

    #[test]
    fn relative_change_is_zero_for_identical_fields() {
        let u = vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0)];
        assert_eq!(InterfaceManager::relative_change(&u, &u), 0.0);
    }
}

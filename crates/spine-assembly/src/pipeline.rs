//! Wires `voxel_mesh`, `adjacency`, and a profile's material table into
//! one ready-to-solve domain (spec.md §4.15 "Assembly pipeline").

use crate::adjacency::{scan_adjacency, AdjacentPair};
use crate::error::Result;
use crate::profile::AnatomyProfile;
use crate::voxel_mesh::build_hex8_mesh;
use spine_core::materials::Material;
use spine_core::mesh::Mesh;

pub struct Domain {
    pub mesh: Mesh,
    pub materials: Vec<Material>,
    /// One density value per entry in `materials`, indexed the same way
    /// as `mesh.material_id` — ready for `spine_core::dynamic_solver::lumped_mass`.
    pub density_by_material: Vec<f64>,
    pub element_labels: Vec<u32>,
    pub adjacency: Vec<AdjacentPair>,
}

/// Builds the mesh, resolves per-label materials/densities, and scans
/// adjacency in one pass over the profile's label volume.
pub fn build_domain(profile: &dyn AnatomyProfile) -> Result<Domain> {
    let voxel_result = build_hex8_mesh(profile)?;
    let adjacency = scan_adjacency(profile);

    let mut labels: Vec<u32> = voxel_result.element_labels.clone();
    labels.sort_unstable();
    labels.dedup();
    let density_by_material: Vec<f64> = labels.iter().map(|&l| profile.density_for_label(l)).collect();

    Ok(Domain {
        mesh: voxel_result.mesh,
        materials: voxel_result.materials,
        density_by_material,
        element_labels: voxel_result.element_labels,
        adjacency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_core::materials::LinearElastic;
    use nalgebra::Vector3;

    struct LayeredProfile;

    impl AnatomyProfile for LayeredProfile {
        fn dims(&self) -> [usize; 3] {
            [1, 1, 2]
        }
        fn spacing(&self) -> [f64; 3] {
            [1.0, 1.0, 1.0]
        }
        fn label_at(&self, _i: usize, _j: usize, k: usize) -> Option<u32> {
            Some(if k == 0 { 10 } else { 20 })
        }
        fn material_for_label(&self, label: u32) -> Material {
            let e = if label == 10 { 1e9 } else { 5e8 };
            Material::LinearElastic(LinearElastic::new(e, 0.3).unwrap())
        }
        fn density_for_label(&self, label: u32) -> f64 {
            if label == 10 { 1800.0 } else { 1100.0 }
        }
    }

    #[test]
    fn domain_carries_one_density_per_material_and_full_adjacency() {
        let domain = build_domain(&LayeredProfile).unwrap();
        assert_eq!(domain.materials.len(), 2);
        assert_eq!(domain.density_by_material, vec![1800.0, 1100.0]);
        assert_eq!(domain.adjacency.len(), 1);
        assert!(domain.adjacency[0].crosses_label_boundary());
        let _ = Vector3::<f64>::zeros();
    }
}

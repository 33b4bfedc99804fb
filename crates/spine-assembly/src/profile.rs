//! `AnatomyProfile`: the trait-object boundary between this crate and
//! whatever external system supplies segmented anatomy (spec.md §4.15,
//! §6; DICOM/NIfTI ingestion and segmentation themselves are out of
//! scope — this crate only ever consumes the trait).

use nalgebra::Vector3;
use spine_core::materials::Material;

/// A labeled voxel grid plus the per-label material/density it implies.
/// Implementations own however they got the label volume (DICOM series,
/// synthetic phantom, test fixture); this crate only reads through the
/// trait.
pub trait AnatomyProfile {
    /// Voxel grid extents `[nx, ny, nz]`.
    fn dims(&self) -> [usize; 3];

    /// Physical voxel spacing `[dx, dy, dz]`, same units as [`Self::origin`].
    fn spacing(&self) -> [f64; 3];

    /// World-space position of voxel `(0, 0, 0)`'s minimum corner.
    fn origin(&self) -> Vector3<f64> {
        Vector3::zeros()
    }

    /// Label at voxel `(i, j, k)`, or `None` for background/air.
    fn label_at(&self, i: usize, j: usize, k: usize) -> Option<u32>;

    /// Constitutive model assigned to `label`.
    fn material_for_label(&self, label: u32) -> Material;

    /// Mass density assigned to `label` (kg/m^3 in SI-consistent units).
    fn density_for_label(&self, label: u32) -> f64;

    /// Labels that should be treated as rigid facet-joint surfaces when
    /// scanning for articulating contact pairs (spec.md §4.15 step 5);
    /// empty by default.
    fn facet_labels(&self) -> Vec<u32> {
        Vec::new()
    }
}

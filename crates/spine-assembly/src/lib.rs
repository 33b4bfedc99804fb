//! Label-volume assembly pipeline: turns a segmented voxel grid into a
//! solvable `spine_core::Mesh` plus the adjacency and facet-joint data a
//! `spine_scene::Scene` needs to wire bodies together (spec.md §4.15).

pub mod adjacency;
pub mod error;
pub mod facet;
pub mod pipeline;
pub mod profile;
pub mod voxel_mesh;

pub use adjacency::{scan_adjacency, AdjacentPair};
pub use error::{AssemblyError, Result};
pub use facet::detect_facet_joints;
pub use pipeline::{build_domain, Domain};
pub use profile::AnatomyProfile;
pub use voxel_mesh::{build_hex8_mesh, VoxelMeshResult};

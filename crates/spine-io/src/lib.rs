//! Mesh/deck ingestion and result export for the spine-sim solver.
//!
//! - **Abaqus/CalculiX `.inp`** deck reader (mesh + `*BOUNDARY`/`*CLOAD`)
//! - **GMSH `.msh` v4 ASCII`** mesh reader
//! - **VTK/VTU/PVD** export for ParaView visualization
//! - **Postprocessing utilities** (von Mises, principal stresses/strains)

pub mod abaqus;
pub mod error;
pub mod gmsh;
pub mod postprocess;
pub mod vtk_writer;

pub use abaqus::{read_inp, read_inp_str, AbaqusModel};
pub use error::{IoError, Result};
pub use gmsh::{read_msh, read_msh_str, GmshModel};
pub use postprocess::{
    compute_mises_stress, compute_principal_stresses, summarize_element, write_summaries_json, ElementStressSummary,
    TensorComponents,
};
pub use vtk_writer::{write_pvd, VtkFormat, VtkWriter};

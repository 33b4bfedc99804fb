//! FEM<->PD coupling: zone splitting, interface transfer, switching
//! criteria, and the Dirichlet-Neumann staggered driver (spec.md §4.10).

pub mod auto;
pub mod criteria;
pub mod driver;
pub mod error;
pub mod interface;
pub mod zone_split;

pub use auto::{run_auto, AutoConfig, AutoOutcome};
pub use criteria::{combine, dilate, max_principal_strain_threshold, von_mises_threshold};
pub use driver::{solve_coupled, DnConfig, DnProgress};
pub use error::{CouplingError, Result};
pub use interface::InterfaceManager;
pub use zone_split::{split, FemSubMesh, InterfaceSet, PdParticleSet, ZoneSplit};

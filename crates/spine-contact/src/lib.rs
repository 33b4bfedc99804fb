//! Node-to-node contact: KD-tree detection, penalty/tied/Coulomb force
//! laws, and the rigid-body motion carrier (spec.md §4.11, §4.13).
//!
//! Contact and rigid bodies live in one crate because they form a single
//! "non-deformable interaction" concern in the source material
//! (`framework/contact.py`, `framework/rigid_body.py` both only ever
//! touched by the scene scheduler, never by a solver on their own).

pub mod contact;
pub mod detection;
pub mod error;
pub mod forces;
pub mod rigid;

pub use contact::{cache_tied_pairs, ContactDefinition, ContactMethod, TiedPair};
pub use detection::{auto_surface_subset, detect, ContactPair};
pub use error::{ContactError, Result};
pub use forces::{coulomb_friction_force, normal_damping_force, penalty_force, tangential_component, tied_force};
pub use rigid::{MotionKind, PrescribedMotion, RigidBody};

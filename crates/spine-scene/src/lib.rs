//! Uniform adapter facade over every solver kind plus the scene scheduler
//! that drives a multi-body assembly through it (spec.md §4.12, §4.14).

pub mod adapter;
pub mod coupled_adapter;
pub mod error;
pub mod fem_adapter;
pub mod pd_adapter;
pub mod rigid_adapter;
pub mod scene;
pub mod spg_adapter;

pub use adapter::Adapter;
pub use coupled_adapter::CoupledAdapter;
pub use error::{Result, SceneError};
pub use fem_adapter::FemAdapter;
pub use pd_adapter::PdAdapter;
pub use rigid_adapter::RigidAdapter;
pub use scene::{Scene, SceneConfig, SceneMode};
pub use spg_adapter::{SpgAdapter, SpgConfig};

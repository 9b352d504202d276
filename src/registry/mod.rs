//! Registry module - Tracks which managed objects belong to one installation.
//!
//! A reconciliation pass registers every object it creates or finds desired, then
//! subtracts that registry from the previous pass's to find the objects to delete.

mod entity;
mod meta;
#[allow(clippy::module_inception)]
mod registry;
mod set;

pub use entity::*;
pub use meta::*;
pub use registry::*;
pub use set::*;

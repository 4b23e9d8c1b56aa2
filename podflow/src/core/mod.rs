//! Core domain model types consumed by the generators.
//!
//! - Computation nodes
//! - Dataset catalog descriptors
//! - Pipeline parameter values

mod catalog;
mod node;
mod params;

pub use catalog::{Catalog, DatasetDescriptor};
pub use node::ComputationNode;
pub use params::ParameterValue;

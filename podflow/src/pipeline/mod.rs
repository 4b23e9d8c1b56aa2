//! Pipeline graphs and the project context around them.
//!
//! This module provides:
//! - The validated pipeline graph
//! - A builder enforcing unique names, single producers and acyclicity
//! - The project context handed to the generators

mod builder;
mod context;
mod spec;

pub use builder::PipelineBuilder;
pub use context::ProjectContext;
pub use spec::Pipeline;

//! Compilation of pipelines into topologies.
//!
//! [`PipelineGenerator`] is the entry point: it picks a [`TopologyBuilder`]
//! from configuration, compiles units through a [`NodeCompiler`] and
//! attaches the exit handler when one is configured.

pub mod command;
mod environment;
mod exit_handler;
mod generator;
mod merged;
mod node_compiler;
mod per_node;
mod strategy;
mod volume;

pub use environment::{EnvSnapshot, CONFIG_ENV_PREFIX, RUN_ID_ENV, RUN_ID_PLACEHOLDER};
pub use exit_handler::EXIT_UNIT_NAME;
pub use generator::PipelineGenerator;
pub use node_compiler::{NodeCompiler, UnitRequest};
pub use strategy::TopologyBuilder;
pub use volume::{VOLUME_CLAIM_NAME, VOLUME_INIT_UNIT};

#[cfg(test)]
mod tests;

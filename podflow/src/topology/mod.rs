//! Topology types produced by the generators.
//!
//! A topology is newly allocated per build and read-only afterwards; it is
//! serialized to the target platform's workflow format elsewhere.

mod graph;
mod unit;

pub use graph::{DependencyEdge, ExitHandler, PipelineInput, Topology, VolumeClaim};
pub use unit::{EnvVar, ExecutableUnit, ResourceSpec, RetrySpec, RetryTrigger, VolumeMount};

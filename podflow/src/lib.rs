//! # Podflow
//!
//! Translates kedro pipelines into Kubeflow Pipelines workflow topologies.
//!
//! A pipeline is a DAG of computation nodes linked by the datasets they
//! exchange. Podflow compiles it into containerized units with:
//!
//! - **Two topology shapes**: one unit per node, or the whole pipeline in one unit
//! - **Per-node policies**: resource reservations and retries with `__default__` fallback
//! - **Exit handler**: a unit that runs after everything else, whatever the outcome
//! - **Run parameters**: project parameters exposed as overridable workflow inputs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use podflow::prelude::*;
//!
//! let pipeline = PipelineBuilder::new()
//!     .node(ComputationNode::new("split", "split_data").with_inputs(["raw"]).with_outputs(["train"]))?
//!     .node(ComputationNode::new("fit", "fit_model").with_inputs(["train"]).with_outputs(["model"]))?
//!     .build()?;
//!
//! let context = ProjectContext::new("my-project", "base").with_pipeline("__default__", pipeline);
//! let run_config = RunConfig::new().with_image("registry/my-project:latest");
//! let env = EnvSnapshot::from_process();
//!
//! let topology = PipelineGenerator::new(&run_config, &context, &env)?
//!     .generate_pipeline("__default__", "registry/my-project:latest", "IfNotPresent")?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod client;
pub mod compiler;
pub mod config;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod topology;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{KubeflowApi, KubeflowClient, RunOnceRequest, ScheduleRequest};
    pub use crate::compiler::{EnvSnapshot, NodeCompiler, PipelineGenerator, TopologyBuilder};
    pub use crate::config::{
        NodeMergeStrategy, NodeResources, PluginConfig, RetryPolicy, RunConfig, VolumeConfig,
    };
    pub use crate::core::{Catalog, ComputationNode, DatasetDescriptor, ParameterValue};
    pub use crate::errors::{
        ClientError, ConfigError, ContractErrorInfo, CycleDetectedError, OutputConflictError,
        PipelineValidationError, PodflowError,
    };
    pub use crate::observability::{init_tracing, LogFormat, SpanTimer};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, ProjectContext};
    pub use crate::topology::{DependencyEdge, ExecutableUnit, Topology};
    pub use crate::utils::clean_name;
}

//! Project fixtures.

use crate::compiler::{EnvSnapshot, PipelineGenerator};
use crate::config::{PluginConfig, RunConfig};
use crate::core::{Catalog, ComputationNode, ParameterValue};
use crate::errors::PodflowError;
use crate::pipeline::{Pipeline, ProjectContext};
use crate::topology::Topology;
use std::collections::BTreeMap;

/// Name the default fixture pipeline is registered under.
pub const TEST_PIPELINE: &str = "pipeline";

/// Environment name used by the fixtures.
pub const TEST_ENV: &str = "unittests";

/// Image used by the fixtures.
pub const TEST_IMAGE: &str = "gcr.io/project-image/test";

/// `node1: A -> B`, `node2: B -> C`.
#[must_use]
pub fn two_node_pipeline() -> Pipeline {
    Pipeline::from_sorted(vec![
        ComputationNode::new("node1", "identity")
            .with_inputs(["A"])
            .with_outputs(["B"]),
        ComputationNode::new("node2", "identity")
            .with_inputs(["B"])
            .with_outputs(["C"]),
    ])
}

/// A single node reading `A` and writing `B`.
#[must_use]
pub fn one_node_pipeline() -> Pipeline {
    Pipeline::from_sorted(vec![ComputationNode::new("node1", "identity")
        .with_inputs(["A"])
        .with_outputs(["B"])])
}

/// A configurable project with the two-node pipeline registered.
#[derive(Debug, Clone)]
pub struct TestProject {
    /// Project name.
    pub project_name: String,
    /// Configuration environment.
    pub env: String,
    /// Registered pipelines.
    pub pipelines: BTreeMap<String, Pipeline>,
    /// Declared parameters.
    pub params: BTreeMap<String, ParameterValue>,
    /// Dataset catalog.
    pub catalog: Catalog,
    /// Run configuration.
    pub run_config: RunConfig,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Creates the default project.
    #[must_use]
    pub fn new() -> Self {
        let mut pipelines = BTreeMap::new();
        pipelines.insert(TEST_PIPELINE.to_string(), two_node_pipeline());
        Self {
            project_name: "my-project".to_string(),
            env: TEST_ENV.to_string(),
            pipelines,
            params: BTreeMap::new(),
            catalog: Catalog::new(),
            run_config: RunConfig::new()
                .with_image(TEST_IMAGE)
                .with_description("Very Important Pipeline")
                .with_experiment("Test Experiment")
                .with_run_name("test run"),
        }
    }

    /// Replaces the run configuration.
    #[must_use]
    pub fn with_run_config(mut self, run_config: RunConfig) -> Self {
        self.run_config = run_config;
        self
    }

    /// Registers a pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, name: impl Into<String>, pipeline: Pipeline) -> Self {
        self.pipelines.insert(name.into(), pipeline);
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets the catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Builds the project context.
    #[must_use]
    pub fn context(&self) -> ProjectContext {
        ProjectContext {
            project_name: self.project_name.clone(),
            env: self.env.clone(),
            params: self.params.clone(),
            pipelines: self.pipelines.clone(),
            catalog: self.catalog.clone(),
        }
    }

    /// Plugin configuration pointing at a dummy host.
    #[must_use]
    pub fn plugin_config(&self) -> PluginConfig {
        PluginConfig::new("http://localhost:8080", self.run_config.clone())
    }

    /// Builds the topology of `pipeline` with the fixture image.
    pub fn generate(&self, pipeline: &str, env: &EnvSnapshot) -> Result<Topology, PodflowError> {
        let context = self.context();
        let generator = PipelineGenerator::new(&self.run_config, &context, env)?;
        generator.generate_pipeline(pipeline, TEST_IMAGE, self.run_config.image_pull_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_project_builds() {
        let topology = TestProject::new()
            .generate(TEST_PIPELINE, &EnvSnapshot::new())
            .unwrap();
        assert_eq!(topology.units().len(), 2);
    }
}

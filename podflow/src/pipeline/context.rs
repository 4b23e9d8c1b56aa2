//! Project context consumed by the generators.

use super::Pipeline;
use crate::core::{Catalog, ParameterValue};
use crate::errors::PodflowError;
use std::collections::BTreeMap;

/// Everything the generators read from the data project.
///
/// The context is borrowed for the duration of a build and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    /// Project name, used for the workflow name and upload naming.
    pub project_name: String,
    /// Configuration environment the containers run with.
    pub env: String,
    /// Declared pipeline parameters, sorted by name.
    pub params: BTreeMap<String, ParameterValue>,
    /// Registered pipelines by name.
    pub pipelines: BTreeMap<String, Pipeline>,
    /// Dataset catalog.
    pub catalog: Catalog,
}

impl ProjectContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(project_name: impl Into<String>, env: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            env: env.into(),
            ..Self::default()
        }
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

    /// Looks up a registered pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PodflowError::UnknownPipeline`] if no pipeline has that name.
    pub fn pipeline(&self, name: &str) -> Result<&Pipeline, PodflowError> {
        self.pipelines
            .get(name)
            .ok_or_else(|| PodflowError::UnknownPipeline(name.to_string()))
    }

    /// Parameter names, sorted.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }
}

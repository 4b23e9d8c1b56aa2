//! Compiles nodes and pipelines into executable units.

use super::command;
use super::EnvSnapshot;
use crate::config::RunConfig;
use crate::errors::ConfigError;
use crate::pipeline::ProjectContext;
use crate::topology::{ExecutableUnit, ResourceSpec, RetrySpec, RetryTrigger};
use std::collections::BTreeMap;

/// Everything a unit needs besides the shared build inputs.
#[derive(Debug)]
pub struct UnitRequest<'a> {
    /// Unit name.
    pub name: String,
    /// Name the resource and retry policies are resolved under.
    pub policy_key: &'a str,
    /// Kedro invocation run after the parameter dump.
    pub kedro_command: String,
    /// Arguments appended after the parameter pairs.
    pub extra_arguments: Vec<String>,
    /// Datasets the unit produces.
    pub outputs: Vec<&'a str>,
    /// Unit description.
    pub description: Option<&'a str>,
}

/// Builds [`ExecutableUnit`]s from the shared build inputs.
///
/// Holds borrowed, read-only inputs; every unit it returns is newly
/// allocated.
#[derive(Debug, Clone, Copy)]
pub struct NodeCompiler<'a> {
    run_config: &'a RunConfig,
    context: &'a ProjectContext,
    env: &'a EnvSnapshot,
    image: &'a str,
    image_pull_policy: &'a str,
}

impl<'a> NodeCompiler<'a> {
    /// Creates a compiler over the given inputs.
    #[must_use]
    pub fn new(
        run_config: &'a RunConfig,
        context: &'a ProjectContext,
        env: &'a EnvSnapshot,
        image: &'a str,
        image_pull_policy: &'a str,
    ) -> Self {
        Self {
            run_config,
            context,
            env,
            image,
            image_pull_policy,
        }
    }

    /// The run configuration being compiled against.
    #[must_use]
    pub fn run_config(&self) -> &'a RunConfig {
        self.run_config
    }

    /// The project being compiled.
    #[must_use]
    pub fn context(&self) -> &'a ProjectContext {
        self.context
    }

    /// Container image.
    #[must_use]
    pub fn image(&self) -> &'a str {
        self.image
    }

    /// Image pull policy.
    #[must_use]
    pub fn image_pull_policy(&self) -> &'a str {
        self.image_pull_policy
    }

    /// Compiles a unit.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the retry policy for the unit cannot be
    /// coerced.
    pub fn compile(&self, request: UnitRequest<'_>) -> Result<ExecutableUnit, ConfigError> {
        let mut unit = ExecutableUnit::new(request.name, self.image, self.image_pull_policy);

        unit.command = command::entrypoint(&request.kedro_command);
        unit.arguments = command::parameter_arguments(self.context.param_names());
        unit.arguments.extend(request.extra_arguments);
        unit.env = self.env.container_env();
        unit.resources = self.resources_for(request.policy_key);
        unit.retry = self.retry_for(request.policy_key)?;
        unit.file_outputs = self.file_outputs(&request.outputs);
        unit.description = request.description.map(str::to_string);
        unit.max_cache_staleness = self.run_config.max_cache_staleness().map(str::to_string);

        tracing::debug!(
            unit = %unit.name,
            policy_key = request.policy_key,
            has_resources = unit.resources.is_some(),
            num_retries = ?unit.num_retries(),
            file_outputs = unit.file_outputs.len(),
            "Compiled unit"
        );

        Ok(unit)
    }

    fn resources_for(&self, policy_key: &str) -> Option<ResourceSpec> {
        let resources = self.run_config.resources();
        resources
            .is_set_for(policy_key)
            .then(|| ResourceSpec::exact(resources.get_for(policy_key)))
    }

    fn retry_for(&self, policy_key: &str) -> Result<Option<RetrySpec>, ConfigError> {
        Ok(self
            .run_config
            .retry_policy()
            .get_for(policy_key)?
            .map(|resolved| RetrySpec {
                num_retries: resolved.num_retries,
                backoff_duration: resolved.backoff_duration,
                backoff_factor: resolved.backoff_factor,
                trigger: RetryTrigger::OnFailure,
            }))
    }

    /// Maps outputs with a catalog file path to their container-local path.
    #[must_use]
    pub fn file_outputs(&self, outputs: &[&str]) -> BTreeMap<String, String> {
        if !self.run_config.store_kedro_outputs_as_kfp_artifacts() {
            return BTreeMap::new();
        }
        outputs
            .iter()
            .filter_map(|name| {
                self.context
                    .catalog
                    .filepath(name)
                    .map(|path| ((*name).to_string(), command::artifact_path(path)))
            })
            .collect()
    }
}

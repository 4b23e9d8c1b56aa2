//! Resolved plugin and run configuration.

use super::policy::{NodeResources, RetryPolicy};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const RUN_CONFIG_PREFIX: &str = "run_config.";

fn default_image_pull_policy() -> String {
    "IfNotPresent".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u64 {
    3600 * 24 * 7
}

fn default_node_merge_strategy() -> String {
    NodeMergeStrategy::None.to_string()
}

fn default_volume_size() -> String {
    "1Gi".to_string()
}

fn default_access_modes() -> Vec<String> {
    vec!["ReadWriteOnce".to_string()]
}

/// How computation nodes are mapped onto executable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMergeStrategy {
    /// One unit per node, wired by data dependencies.
    #[default]
    None,
    /// The whole pipeline collapsed into a single unit.
    Full,
}

impl fmt::Display for NodeMergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl FromStr for NodeMergeStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "full" => Ok(Self::Full),
            other => Err(ConfigError::InvalidEnumValue {
                key: format!("{RUN_CONFIG_PREFIX}node_merge_strategy"),
                value: other.to_string(),
            }),
        }
    }
}

/// Top-level plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    run_config: Option<RunConfig>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl PluginConfig {
    /// Builds a configuration from an already resolved value tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a present field has the wrong shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON of the expected shape.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Creates a configuration from parts.
    #[must_use]
    pub fn new(host: impl Into<String>, run_config: RunConfig) -> Self {
        Self {
            host: Some(host.into()),
            run_config: Some(run_config),
            project_id: None,
            region: None,
        }
    }

    /// Renders the default configuration file for a new project.
    #[must_use]
    pub fn sample_config(url: &str, image: &str, project: &str, run_name: &str) -> String {
        super::template::sample_config(url, image, project, run_name)
    }

    /// Base URL of the pipelines service.
    pub fn host(&self) -> Result<&str, ConfigError> {
        self.host.as_deref().ok_or_else(|| ConfigError::missing("host"))
    }

    /// The run configuration block.
    pub fn run_config(&self) -> Result<&RunConfig, ConfigError> {
        self.run_config
            .as_ref()
            .ok_or_else(|| ConfigError::missing("run_config"))
    }

    /// Cloud project identifier, for managed deployments.
    pub fn project_id(&self) -> Result<&str, ConfigError> {
        self.project_id
            .as_deref()
            .ok_or_else(|| ConfigError::missing("project_id"))
    }

    /// Cloud region, for managed deployments.
    pub fn region(&self) -> Result<&str, ConfigError> {
        self.region.as_deref().ok_or_else(|| ConfigError::missing("region"))
    }
}

/// Settings used to build and run a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    image: Option<String>,
    #[serde(default = "default_image_pull_policy")]
    image_pull_policy: String,
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    experiment_name: Option<String>,
    #[serde(default)]
    run_name: Option<String>,
    #[serde(default)]
    scheduled_run_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    resources: NodeResources,
    #[serde(default)]
    retry_policy: RetryPolicy,
    #[serde(default)]
    volume: Option<VolumeConfig>,
    #[serde(default)]
    wait_for_completion: bool,
    #[serde(default = "default_true")]
    store_kedro_outputs_as_kfp_artifacts: bool,
    #[serde(default)]
    max_cache_staleness: Option<String>,
    #[serde(default = "default_ttl")]
    ttl: u64,
    #[serde(default)]
    on_exit_pipeline: Option<String>,
    #[serde(default = "default_node_merge_strategy")]
    node_merge_strategy: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            image: None,
            image_pull_policy: default_image_pull_policy(),
            root: None,
            experiment_name: None,
            run_name: None,
            scheduled_run_name: None,
            description: None,
            resources: NodeResources::default(),
            retry_policy: RetryPolicy::default(),
            volume: None,
            wait_for_completion: false,
            store_kedro_outputs_as_kfp_artifacts: default_true(),
            max_cache_staleness: None,
            ttl: default_ttl(),
            on_exit_pipeline: None,
            node_merge_strategy: default_node_merge_strategy(),
        }
    }
}

impl RunConfig {
    /// Creates a run configuration with every default applied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a run configuration from an already resolved value tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a present field has the wrong shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Sets the image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the resources block.
    #[must_use]
    pub fn with_resources(mut self, resources: NodeResources) -> Self {
        self.resources = resources;
        self
    }

    /// Sets the retry block.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Sets the volume block.
    #[must_use]
    pub fn with_volume(mut self, volume: VolumeConfig) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets the exit pipeline.
    #[must_use]
    pub fn with_on_exit_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.on_exit_pipeline = Some(pipeline.into());
        self
    }

    /// Sets the merge strategy.
    #[must_use]
    pub fn with_node_merge_strategy(mut self, strategy: NodeMergeStrategy) -> Self {
        self.node_merge_strategy = strategy.to_string();
        self
    }

    /// Enables or disables artifact exposure.
    #[must_use]
    pub fn with_artifact_exposure(mut self, enabled: bool) -> Self {
        self.store_kedro_outputs_as_kfp_artifacts = enabled;
        self
    }

    /// Sets the experiment name.
    #[must_use]
    pub fn with_experiment(mut self, name: impl Into<String>) -> Self {
        self.experiment_name = Some(name.into());
        self
    }

    /// Sets the run name template.
    #[must_use]
    pub fn with_run_name(mut self, name: impl Into<String>) -> Self {
        self.run_name = Some(name.into());
        self
    }

    /// Sets the maximum cache staleness.
    #[must_use]
    pub fn with_max_cache_staleness(mut self, staleness: impl Into<String>) -> Self {
        self.max_cache_staleness = Some(staleness.into());
        self
    }

    /// Sets the workflow time-to-live in seconds.
    #[must_use]
    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.ttl = seconds;
        self
    }

    fn required<'a>(value: Option<&'a String>, key: &str) -> Result<&'a str, ConfigError> {
        value
            .map(String::as_str)
            .ok_or_else(|| ConfigError::missing(format!("{RUN_CONFIG_PREFIX}{key}")))
    }

    /// Container image run by every unit.
    pub fn image(&self) -> Result<&str, ConfigError> {
        Self::required(self.image.as_ref(), "image")
    }

    /// Pull policy for the image.
    #[must_use]
    pub fn image_pull_policy(&self) -> &str {
        &self.image_pull_policy
    }

    /// Project root inside the image.
    pub fn root(&self) -> Result<&str, ConfigError> {
        Self::required(self.root.as_ref(), "root")
    }

    /// Experiment that runs are filed under.
    pub fn experiment_name(&self) -> Result<&str, ConfigError> {
        Self::required(self.experiment_name.as_ref(), "experiment_name")
    }

    /// Run name template for one-off runs.
    pub fn run_name(&self) -> Result<&str, ConfigError> {
        Self::required(self.run_name.as_ref(), "run_name")
    }

    /// Run name template for scheduled runs; falls back to `run_name`.
    pub fn scheduled_run_name(&self) -> Result<&str, ConfigError> {
        match self.scheduled_run_name.as_deref() {
            Some(name) => Ok(name),
            None => self.run_name(),
        }
    }

    /// Optional pipeline description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Resource reservations per node.
    #[must_use]
    pub fn resources(&self) -> &NodeResources {
        &self.resources
    }

    /// Retry policies per node.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Shared data volume, if configured.
    #[must_use]
    pub fn volume(&self) -> Option<&VolumeConfig> {
        self.volume.as_ref()
    }

    /// Whether a one-off run blocks until it finishes.
    #[must_use]
    pub fn wait_for_completion(&self) -> bool {
        self.wait_for_completion
    }

    /// Whether node outputs with a file path are registered as artifacts.
    #[must_use]
    pub fn store_kedro_outputs_as_kfp_artifacts(&self) -> bool {
        self.store_kedro_outputs_as_kfp_artifacts
    }

    /// Maximum cache staleness as an ISO-8601 duration; empty counts as unset.
    #[must_use]
    pub fn max_cache_staleness(&self) -> Option<&str> {
        self.max_cache_staleness.as_deref().filter(|s| !s.is_empty())
    }

    /// Seconds the finished workflow is kept around.
    #[must_use]
    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Pipeline run after the main graph regardless of outcome.
    #[must_use]
    pub fn on_exit_pipeline(&self) -> Option<&str> {
        self.on_exit_pipeline.as_deref()
    }

    /// Node merge strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnumValue`] for anything but `none`/`full`.
    pub fn node_merge_strategy(&self) -> Result<NodeMergeStrategy, ConfigError> {
        self.node_merge_strategy.parse()
    }
}

/// Shared storage used to exchange data between node units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Storage class; `None` selects the cluster default.
    #[serde(default)]
    pub storageclass: Option<String>,
    /// Requested volume size.
    #[serde(default = "default_volume_size")]
    pub size: String,
    /// Access modes of the claim.
    #[serde(default = "default_access_modes")]
    pub access_modes: Vec<String>,
    /// Skip copying bundled data into the fresh volume.
    #[serde(default)]
    pub skip_init: bool,
    /// Keep the volume after the workflow is deleted.
    #[serde(default)]
    pub keep: bool,
    /// User id the node containers run as.
    #[serde(default)]
    pub owner: u32,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            storageclass: None,
            size: default_volume_size(),
            access_modes: default_access_modes(),
            skip_init: false,
            keep: false,
            owner: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_config() -> PluginConfig {
        PluginConfig::from_value(json!({
            "host": "https://example.com",
            "run_config": {
                "image": "gcr.io/project-image/test",
                "image_pull_policy": "Always",
                "experiment_name": "Test Experiment",
                "run_name": "test run",
                "scheduled_run_name": "scheduled run",
                "description": "My awesome pipeline",
                "wait_for_completion": true,
                "ttl": 300,
                "volume": {
                    "storageclass": "default",
                    "size": "3Gi",
                    "access_modes": ["ReadWriteOnce"],
                    "keep": true
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_plugin_config() {
        let cfg = full_config();
        let run = cfg.run_config().unwrap();

        assert_eq!(cfg.host().unwrap(), "https://example.com");
        assert_eq!(run.image().unwrap(), "gcr.io/project-image/test");
        assert_eq!(run.image_pull_policy(), "Always");
        assert_eq!(run.experiment_name().unwrap(), "Test Experiment");
        assert_eq!(run.run_name().unwrap(), "test run");
        assert_eq!(run.scheduled_run_name().unwrap(), "scheduled run");
        assert!(run.wait_for_completion());
        assert_eq!(run.description(), Some("My awesome pipeline"));
        assert_eq!(run.ttl(), 300);
        assert!(!run.resources().is_set_for("node1"));

        let volume = run.volume().unwrap();
        assert_eq!(volume.storageclass.as_deref(), Some("default"));
        assert_eq!(volume.size, "3Gi");
        assert!(volume.keep);
        assert_eq!(volume.access_modes, vec!["ReadWriteOnce".to_string()]);
    }

    #[test]
    fn test_defaults() {
        let cfg = PluginConfig::from_value(json!({"run_config": {}})).unwrap();
        let run = cfg.run_config().unwrap();

        assert_eq!(run.image_pull_policy(), "IfNotPresent");
        assert_eq!(run.description(), None);
        assert_eq!(run.ttl(), 604_800);
        assert!(run.volume().is_none());
        assert!(!run.wait_for_completion());
        assert!(run.store_kedro_outputs_as_kfp_artifacts());
        assert_eq!(run.on_exit_pipeline(), None);
        assert_eq!(run.node_merge_strategy().unwrap(), NodeMergeStrategy::None);
        assert_eq!(run.max_cache_staleness(), None);
    }

    #[test]
    fn test_missing_required_config() {
        let cfg = PluginConfig::from_value(json!({})).unwrap();
        assert_eq!(cfg.host().unwrap_err(), ConfigError::missing("host"));
        assert_eq!(cfg.run_config().unwrap_err(), ConfigError::missing("run_config"));

        let run = RunConfig::new();
        assert_eq!(run.image().unwrap_err(), ConfigError::missing("run_config.image"));
        assert_eq!(
            run.experiment_name().unwrap_err(),
            ConfigError::missing("run_config.experiment_name")
        );
        assert_eq!(run.root().unwrap_err(), ConfigError::missing("run_config.root"));
    }

    #[test]
    fn test_reuse_run_name_for_scheduled_run_name() {
        let run = RunConfig::from_value(json!({"run_name": "some run"})).unwrap();
        assert_eq!(run.run_name().unwrap(), "some run");
        assert_eq!(run.scheduled_run_name().unwrap(), "some run");
    }

    #[test]
    fn test_scheduled_run_name_needs_run_name() {
        let run = RunConfig::new();
        assert_eq!(
            run.scheduled_run_name().unwrap_err(),
            ConfigError::missing("run_config.run_name")
        );
    }

    #[test]
    fn test_do_not_keep_volume_by_default() {
        let run = RunConfig::from_value(json!({"volume": {}})).unwrap();
        let volume = run.volume().unwrap();
        assert!(!volume.keep);
        assert!(!volume.skip_init);
        assert_eq!(volume.size, "1Gi");
        assert_eq!(volume.owner, 0);
    }

    #[test]
    fn test_node_merge_strategy_values() {
        let full = RunConfig::from_value(json!({"node_merge_strategy": "full"})).unwrap();
        assert_eq!(full.node_merge_strategy().unwrap(), NodeMergeStrategy::Full);

        let bad = RunConfig::from_value(json!({"node_merge_strategy": "partial"})).unwrap();
        assert_eq!(
            bad.node_merge_strategy().unwrap_err(),
            ConfigError::InvalidEnumValue {
                key: "run_config.node_merge_strategy".to_string(),
                value: "partial".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_cache_staleness_is_unset() {
        let run = RunConfig::from_value(json!({"max_cache_staleness": ""})).unwrap();
        assert_eq!(run.max_cache_staleness(), None);

        let run = RunConfig::from_value(json!({"max_cache_staleness": "P0D"})).unwrap();
        assert_eq!(run.max_cache_staleness(), Some("P0D"));
    }
}

//! Executable unit type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variable set on a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Literal value or a platform placeholder.
    pub value: String,
}

impl EnvVar {
    /// Creates a new environment variable.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Resource reservation of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Upper bound per resource.
    pub limits: BTreeMap<String, String>,
    /// Reservation per resource.
    pub requests: BTreeMap<String, String>,
}

impl ResourceSpec {
    /// Reserves and allows exactly the given quantities.
    #[must_use]
    pub fn exact(quantities: BTreeMap<String, String>) -> Self {
        Self {
            limits: quantities.clone(),
            requests: quantities,
        }
    }
}

/// Condition under which the platform retries a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryTrigger {
    /// Retry whenever the container fails.
    #[default]
    OnFailure,
}

/// Execution-time retry behaviour of a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySpec {
    /// Maximum number of retries.
    pub num_retries: u32,
    /// Initial backoff duration.
    pub backoff_duration: Option<String>,
    /// Backoff multiplier.
    pub backoff_factor: Option<f64>,
    /// When a retry happens.
    pub trigger: RetryTrigger,
}

/// A persistent volume mounted into a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Name of the claim declared on the topology.
    pub claim: String,
    /// Mount path inside the container.
    pub mount_path: String,
}

/// One containerized step of a topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableUnit {
    /// Unit name, unique within its topology.
    pub name: String,
    /// Container image.
    pub image: String,
    /// Image pull policy.
    pub image_pull_policy: String,
    /// Container entrypoint.
    pub command: Vec<String>,
    /// Arguments appended to the entrypoint.
    pub arguments: Vec<String>,
    /// Container environment.
    pub env: Vec<EnvVar>,
    /// Resource reservation; `None` means no limit at all.
    pub resources: Option<ResourceSpec>,
    /// Retry behaviour; `None` means no retries.
    pub retry: Option<RetrySpec>,
    /// Dataset name to container-local file harvested as an artifact.
    pub file_outputs: BTreeMap<String, String>,
    /// Human readable description.
    pub description: Option<String>,
    /// Mounted volumes.
    pub volume_mounts: Vec<VolumeMount>,
    /// User id the container runs as.
    pub run_as_user: Option<u32>,
    /// Maximum age of a cached result that may be reused.
    pub max_cache_staleness: Option<String>,
}

impl ExecutableUnit {
    /// Creates a unit with only the container basics set.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        image_pull_policy: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            image_pull_policy: image_pull_policy.into(),
            command: Vec::new(),
            arguments: Vec::new(),
            env: Vec::new(),
            resources: None,
            retry: None,
            file_outputs: BTreeMap::new(),
            description: None,
            volume_mounts: Vec::new(),
            run_as_user: None,
            max_cache_staleness: None,
        }
    }

    /// Value of an environment variable.
    #[must_use]
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }

    /// Number of retries, if a retry policy is attached.
    #[must_use]
    pub fn num_retries(&self) -> Option<u32> {
        self.retry.as_ref().map(|r| r.num_retries)
    }

    /// Retry trigger, if a retry policy is attached.
    #[must_use]
    pub fn retry_trigger(&self) -> Option<RetryTrigger> {
        self.retry.as_ref().map(|r| r.trigger)
    }

    /// Initial backoff, if a retry policy sets one.
    #[must_use]
    pub fn backoff_duration(&self) -> Option<&str> {
        self.retry.as_ref().and_then(|r| r.backoff_duration.as_deref())
    }

    /// Backoff multiplier, if a retry policy sets one.
    #[must_use]
    pub fn backoff_factor(&self) -> Option<f64> {
        self.retry.as_ref().and_then(|r| r.backoff_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_unit_has_no_policies() {
        let unit = ExecutableUnit::new("node1", "image", "Always");

        assert!(unit.resources.is_none());
        assert_eq!(unit.num_retries(), None);
        assert_eq!(unit.retry_trigger(), None);
        assert_eq!(unit.backoff_duration(), None);
        assert_eq!(unit.backoff_factor(), None);
    }

    #[test]
    fn test_exact_resources() {
        let quantities: BTreeMap<String, String> =
            [("cpu".to_string(), "1".to_string())].into_iter().collect();
        let spec = ResourceSpec::exact(quantities.clone());

        assert_eq!(spec.limits, quantities);
        assert_eq!(spec.requests, spec.limits);
    }

    #[test]
    fn test_retry_trigger_serializes() {
        let json = serde_json::to_string(&RetryTrigger::OnFailure).unwrap();
        assert_eq!(json, "\"OnFailure\"");
    }
}

//! Error types for podflow.
//!
//! Every failure is synchronous and reported to the immediate caller. The
//! compilation core never logs-and-continues.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for podflow operations.
#[derive(Debug, Error)]
pub enum PodflowError {
    /// Resolved configuration is missing a value or holds an invalid one.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The pipeline graph is malformed.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A named pipeline is not registered in the project.
    #[error("Pipeline '{0}' is not registered in the project")]
    UnknownPipeline(String),

    /// The remote pipelines service rejected a call.
    #[error("{0}")]
    Client(#[from] ClientError),
}

/// Errors raised while reading resolved configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required field is absent.
    #[error("Missing required configuration: '{key}'.")]
    Missing {
        /// Fully-qualified dotted key, e.g. `run_config.image`.
        key: String,
    },

    /// A field restricted to a closed set holds something else.
    #[error("Invalid {key}: {value}")]
    InvalidEnumValue {
        /// Fully-qualified dotted key.
        key: String,
        /// The offending value.
        value: String,
    },

    /// A field holds a value that cannot be coerced to the expected type.
    #[error("Invalid value for '{key}': {value} (expected {expected})")]
    InvalidValue {
        /// Fully-qualified dotted key.
        key: String,
        /// The offending value, rendered as JSON.
        value: String,
        /// Human readable description of the expected type.
        expected: String,
    },
}

impl ConfigError {
    /// Creates a missing-key error.
    #[must_use]
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid_value(
        key: impl Into<String>,
        value: &serde_json::Value,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-001-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    ///
    /// Known codes start out with the hint from [`ContractSuggestions`].
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        let code = code.into();
        let fix_hint = ContractSuggestions::get(&code).map(str::to_string);
        Self {
            code,
            summary: summary.into(),
            fix_hint,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when pipeline validation fails.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The nodes involved in the error.
    pub nodes: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            nodes: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the nodes involved.
    #[must_use]
    pub fn with_nodes(mut self, nodes: Vec<String>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Error raised when a cycle is detected in the pipeline graph.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected in pipeline: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The path of nodes forming the cycle.
    pub cycle_path: Vec<String>,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        let info = ContractErrorInfo::new(
            "PIPELINE-001-CYCLE",
            format!("Pipeline contains a dependency cycle: {}", cycle_path.join(" -> ")),
        );

        Self {
            cycle_path,
            error_info: info,
        }
    }
}

impl From<CycleDetectedError> for PipelineValidationError {
    fn from(err: CycleDetectedError) -> Self {
        Self {
            message: err.to_string(),
            nodes: err.cycle_path.clone(),
            error_info: Some(err.error_info),
        }
    }
}

/// Error raised when two nodes produce the same dataset.
#[derive(Debug, Clone, Error)]
#[error("Output conflict for dataset '{dataset}': produced by '{first}' and '{second}'")]
pub struct OutputConflictError {
    /// The dataset name.
    pub dataset: String,
    /// The node that registered the output first.
    pub first: String,
    /// The node that tried to register it again.
    pub second: String,
}

impl OutputConflictError {
    /// Creates a new output conflict error.
    #[must_use]
    pub fn new(
        dataset: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}

impl From<OutputConflictError> for PipelineValidationError {
    fn from(err: OutputConflictError) -> Self {
        let info = ContractErrorInfo::new(
            "PIPELINE-002-OUTPUT_CONFLICT",
            format!("Dataset '{}' has more than one producer", err.dataset),
        )
        .with_context_entry("dataset", err.dataset.clone());
        Self {
            message: err.to_string(),
            nodes: vec![err.first, err.second],
            error_info: Some(info),
        }
    }
}

/// Errors reported by the remote pipelines service seam.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The experiment lookup found nothing.
    #[error("No experiment is found with name {name}")]
    ExperimentNotFound {
        /// The experiment name.
        name: String,
    },

    /// A pipeline must be uploaded before it can be scheduled.
    #[error("Pipeline '{name}' has not been uploaded")]
    PipelineNotUploaded {
        /// Full display name of the pipeline.
        name: String,
    },

    /// Waiting for a run to finish took too long.
    #[error("Run {run_id} did not finish within {seconds}s")]
    Timeout {
        /// The run being waited for.
        run_id: String,
        /// The timeout that expired.
        seconds: u64,
    },

    /// Any other failure reported by the service.
    #[error("{0}")]
    Api(String),
}

impl ClientError {
    /// Message prefix the service uses to signal a missing experiment.
    pub const EXPERIMENT_NOT_FOUND_PREFIX: &'static str = "No experiment is found";

    /// Returns true if this error signals a missing experiment.
    #[must_use]
    pub fn is_experiment_not_found(&self) -> bool {
        self.to_string().starts_with(Self::EXPERIMENT_NOT_FOUND_PREFIX)
    }
}

/// Provides default suggestions for common contract error codes.
pub struct ContractSuggestions;

impl ContractSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "PIPELINE-001-CYCLE" => Some(
                "Check node inputs and outputs for circular references. \
                 A dataset must be produced before it is consumed.",
            ),
            "PIPELINE-002-OUTPUT_CONFLICT" => Some(
                "Every dataset may have at most one producing node. \
                 Rename one of the outputs.",
            ),
            "PIPELINE-003-DUPLICATE" => Some("Node names must be unique within a pipeline."),
            "PIPELINE-004-EMPTY" => Some("Add at least one node to the pipeline before building."),
            "PIPELINE-005-NAME" => Some(
                "Give every node a non-empty name without quotes, dollar signs or backticks.",
            ),
            "PIPELINE-006-UNIT_NAME" => Some(
                "Unit names keep only letters, digits and dashes, and 'on-exit' and \
                 'data-volume-init' are reserved. Rename the offending node.",
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_names_dotted_key() {
        let err = ConfigError::missing("run_config.image");
        assert_eq!(
            err.to_string(),
            "Missing required configuration: 'run_config.image'."
        );
    }

    #[test]
    fn test_invalid_enum_value_names_offender() {
        let err = ConfigError::InvalidEnumValue {
            key: "run_config.node_merge_strategy".to_string(),
            value: "partial".to_string(),
        };
        assert!(err.to_string().contains("partial"));
        assert!(err.to_string().contains("run_config.node_merge_strategy"));
    }

    #[test]
    fn test_cycle_detected_error() {
        let err = CycleDetectedError::new(vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
        ]);

        assert!(err.to_string().contains("a -> b -> a"));
        let validation: PipelineValidationError = err.into();
        assert_eq!(validation.code(), Some("PIPELINE-001-CYCLE"));
        assert_eq!(validation.nodes.len(), 3);
    }

    #[test]
    fn test_output_conflict_converts() {
        let validation: PipelineValidationError =
            OutputConflictError::new("B", "node1", "node3").into();
        assert_eq!(validation.code(), Some("PIPELINE-002-OUTPUT_CONFLICT"));
        assert_eq!(validation.nodes, vec!["node1", "node3"]);
    }

    #[test]
    fn test_experiment_not_found_detection() {
        let missing = ClientError::ExperimentNotFound {
            name: "exp".to_string(),
        };
        assert!(missing.is_experiment_not_found());
        assert!(ClientError::Api("No experiment is found with name x".to_string())
            .is_experiment_not_found());
        assert!(!ClientError::Api("connection refused".to_string()).is_experiment_not_found());
    }

    #[test]
    fn test_contract_suggestions() {
        assert!(ContractSuggestions::get("PIPELINE-001-CYCLE").is_some());
        assert!(ContractSuggestions::get("UNKNOWN").is_none());
    }

    #[test]
    fn test_known_codes_carry_suggested_fix_hint() {
        let info = ContractErrorInfo::new("PIPELINE-004-EMPTY", "Cannot build an empty pipeline");
        assert_eq!(
            info.fix_hint.as_deref(),
            ContractSuggestions::get("PIPELINE-004-EMPTY")
        );

        let custom = ContractErrorInfo::new("PIPELINE-004-EMPTY", "empty").with_fix_hint("add one");
        assert_eq!(custom.fix_hint.as_deref(), Some("add one"));

        assert!(ContractErrorInfo::new("OTHER-001", "other").fix_hint.is_none());
    }

    #[test]
    fn test_cycle_error_carries_fix_hint() {
        let err = CycleDetectedError::new(vec!["a".to_string(), "a".to_string()]);
        assert_eq!(
            err.error_info.fix_hint.as_deref(),
            ContractSuggestions::get("PIPELINE-001-CYCLE")
        );
    }
}

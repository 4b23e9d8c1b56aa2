//! Remote pipelines service seam.

use crate::errors::ClientError;
use crate::topology::Topology;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pipeline known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Service-side identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Identifiers returned by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPipeline {
    /// Pipeline identifier.
    pub pipeline_id: String,
    /// Identifier of the version just created.
    pub version_id: String,
}

/// A new pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineUpload {
    /// Display name.
    pub name: String,
    /// Description shown by the service.
    pub description: Option<String>,
    /// The workflow.
    pub topology: Topology,
}

/// A new version of an existing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionUpload {
    /// Pipeline the version belongs to.
    pub pipeline_id: String,
    /// Version name.
    pub name: String,
    /// The workflow.
    pub topology: Topology,
}

/// Experiment lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRef {
    /// Experiment name.
    pub name: String,
    /// Namespace; `None` uses the service default.
    pub namespace: Option<String>,
}

/// An experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    /// Service-side identifier.
    pub id: String,
    /// Experiment name.
    pub name: String,
}

/// A one-off run submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRequest {
    /// Experiment the run is filed under.
    pub experiment_id: String,
    /// Run name.
    pub name: String,
    /// The workflow to run.
    pub topology: Topology,
    /// Values for workflow inputs.
    pub parameters: BTreeMap<String, String>,
}

/// A submitted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Service-side identifier.
    pub id: String,
    /// Run name.
    pub name: String,
}

/// A recurring run submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringRunRequest {
    /// Experiment the runs are filed under.
    pub experiment_id: String,
    /// Recurring run name.
    pub name: String,
    /// Cron schedule.
    pub cron_expression: String,
    /// Uploaded pipeline to run.
    pub pipeline_id: String,
    /// Values for workflow inputs.
    pub parameters: BTreeMap<String, String>,
}

/// A recurring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringRun {
    /// Service-side identifier.
    pub id: String,
    /// Recurring run name.
    pub name: String,
}

/// Calls the client needs from the pipelines service.
///
/// Implementations own transport and authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KubeflowApi: Send + Sync {
    /// Lists uploaded pipelines.
    async fn list_pipelines(&self, page_size: u32) -> Result<Vec<PipelineSummary>, ClientError>;

    /// Looks up a pipeline id by display name.
    async fn get_pipeline_id(&self, name: &str) -> Result<Option<String>, ClientError>;

    /// Uploads a new pipeline with its first version.
    async fn upload_pipeline(&self, upload: &PipelineUpload) -> Result<UploadedPipeline, ClientError>;

    /// Uploads a new version and returns its id.
    async fn upload_pipeline_version(&self, upload: &VersionUpload) -> Result<String, ClientError>;

    /// Fetches an experiment.
    ///
    /// A missing experiment is reported with a message starting with
    /// [`ClientError::EXPERIMENT_NOT_FOUND_PREFIX`].
    async fn get_experiment(&self, experiment: &ExperimentRef) -> Result<Experiment, ClientError>;

    /// Creates an experiment.
    async fn create_experiment(&self, experiment: &ExperimentRef) -> Result<Experiment, ClientError>;

    /// Submits a one-off run.
    async fn create_run(&self, run: &RunRequest) -> Result<Run, ClientError>;

    /// Blocks until a run finishes and returns its final status.
    async fn wait_for_run_completion(&self, run_id: &str) -> Result<String, ClientError>;

    /// Lists the recurring runs of an experiment.
    async fn list_recurring_runs(&self, experiment_id: &str) -> Result<Vec<RecurringRun>, ClientError>;

    /// Deletes a recurring run.
    async fn delete_recurring_run(&self, recurring_run_id: &str) -> Result<(), ClientError>;

    /// Creates a recurring run.
    async fn create_recurring_run(
        &self,
        request: &RecurringRunRequest,
    ) -> Result<RecurringRun, ClientError>;
}

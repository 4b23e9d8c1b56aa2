//! In-memory pipelines service.

use crate::client::{
    Experiment, ExperimentRef, KubeflowApi, PipelineSummary, PipelineUpload, RecurringRun,
    RecurringRunRequest, Run, RunRequest, UploadedPipeline, VersionUpload,
};
use crate::errors::ClientError;
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct State {
    next_id: usize,
    pipelines: Vec<(PipelineSummary, Vec<VersionUpload>)>,
    experiments: Vec<Experiment>,
    runs: Vec<RunRequest>,
    recurring: Vec<(String, RecurringRunRequest, RecurringRun)>,
    calls: Vec<String>,
}

impl State {
    fn id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }
}

/// Pipelines service kept in memory that records every call.
#[derive(Debug, Default)]
pub struct RecordingApi {
    state: Mutex<State>,
    final_status: Mutex<Option<String>>,
}

impl RecordingApi {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Status returned when waiting for a run; `Succeeded` by default.
    pub fn set_final_status(&self, status: impl Into<String>) {
        *self.final_status.lock() = Some(status.into());
    }

    /// Names of the calls received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Names of the existing experiments.
    #[must_use]
    pub fn experiment_names(&self) -> Vec<String> {
        self.state
            .lock()
            .experiments
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Number of versions uploaded for a pipeline display name.
    #[must_use]
    pub fn version_count(&self, pipeline_name: &str) -> usize {
        self.state
            .lock()
            .pipelines
            .iter()
            .find(|(summary, _)| summary.name == pipeline_name)
            .map_or(0, |(_, versions)| versions.len() + 1)
    }

    /// Submitted one-off runs.
    #[must_use]
    pub fn runs(&self) -> Vec<RunRequest> {
        self.state.lock().runs.clone()
    }

    /// Active recurring runs.
    #[must_use]
    pub fn recurring_runs(&self) -> Vec<RecurringRunRequest> {
        self.state
            .lock()
            .recurring
            .iter()
            .map(|(_, request, _)| request.clone())
            .collect()
    }

    fn record(&self, call: &str) {
        self.state.lock().calls.push(call.to_string());
    }
}

#[async_trait]
impl KubeflowApi for RecordingApi {
    async fn list_pipelines(&self, page_size: u32) -> Result<Vec<PipelineSummary>, ClientError> {
        self.record("list_pipelines");
        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        Ok(self
            .state
            .lock()
            .pipelines
            .iter()
            .take(limit)
            .map(|(summary, _)| summary.clone())
            .collect())
    }

    async fn get_pipeline_id(&self, name: &str) -> Result<Option<String>, ClientError> {
        self.record("get_pipeline_id");
        Ok(self
            .state
            .lock()
            .pipelines
            .iter()
            .find(|(summary, _)| summary.name == name)
            .map(|(summary, _)| summary.id.clone()))
    }

    async fn upload_pipeline(&self, upload: &PipelineUpload) -> Result<UploadedPipeline, ClientError> {
        self.record("upload_pipeline");
        let mut state = self.state.lock();
        let pipeline_id = state.id("pipeline");
        let version_id = state.id("version");
        state.pipelines.push((
            PipelineSummary {
                id: pipeline_id.clone(),
                name: upload.name.clone(),
            },
            Vec::new(),
        ));
        Ok(UploadedPipeline {
            pipeline_id,
            version_id,
        })
    }

    async fn upload_pipeline_version(&self, upload: &VersionUpload) -> Result<String, ClientError> {
        self.record("upload_pipeline_version");
        let mut state = self.state.lock();
        let version_id = state.id("version");
        let entry = state
            .pipelines
            .iter_mut()
            .find(|(summary, _)| summary.id == upload.pipeline_id)
            .ok_or_else(|| ClientError::Api(format!("Pipeline {} not found", upload.pipeline_id)))?;
        entry.1.push(upload.clone());
        Ok(version_id)
    }

    async fn get_experiment(&self, experiment: &ExperimentRef) -> Result<Experiment, ClientError> {
        self.record("get_experiment");
        self.state
            .lock()
            .experiments
            .iter()
            .find(|e| e.name == experiment.name)
            .cloned()
            .ok_or_else(|| ClientError::ExperimentNotFound {
                name: experiment.name.clone(),
            })
    }

    async fn create_experiment(&self, experiment: &ExperimentRef) -> Result<Experiment, ClientError> {
        self.record("create_experiment");
        let mut state = self.state.lock();
        let created = Experiment {
            id: state.id("experiment"),
            name: experiment.name.clone(),
        };
        state.experiments.push(created.clone());
        Ok(created)
    }

    async fn create_run(&self, run: &RunRequest) -> Result<Run, ClientError> {
        self.record("create_run");
        let mut state = self.state.lock();
        let id = state.id("run");
        state.runs.push(run.clone());
        Ok(Run {
            id,
            name: run.name.clone(),
        })
    }

    async fn wait_for_run_completion(&self, _run_id: &str) -> Result<String, ClientError> {
        self.record("wait_for_run_completion");
        Ok(self
            .final_status
            .lock()
            .clone()
            .unwrap_or_else(|| "Succeeded".to_string()))
    }

    async fn list_recurring_runs(&self, experiment_id: &str) -> Result<Vec<RecurringRun>, ClientError> {
        self.record("list_recurring_runs");
        Ok(self
            .state
            .lock()
            .recurring
            .iter()
            .filter(|(owner, _, _)| owner == experiment_id)
            .map(|(_, _, run)| run.clone())
            .collect())
    }

    async fn delete_recurring_run(&self, recurring_run_id: &str) -> Result<(), ClientError> {
        self.record("delete_recurring_run");
        self.state
            .lock()
            .recurring
            .retain(|(_, _, run)| run.id != recurring_run_id);
        Ok(())
    }

    async fn create_recurring_run(
        &self,
        request: &RecurringRunRequest,
    ) -> Result<RecurringRun, ClientError> {
        self.record("create_recurring_run");
        let mut state = self.state.lock();
        let run = RecurringRun {
            id: state.id("job"),
            name: request.name.clone(),
        };
        state
            .recurring
            .push((request.experiment_id.clone(), request.clone(), run.clone()));
        Ok(run)
    }
}

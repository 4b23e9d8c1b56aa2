//! Orchestration against the remote pipelines service.

mod api;
mod kubeflow;

#[cfg(test)]
pub use api::MockKubeflowApi;
pub use api::{
    Experiment, ExperimentRef, KubeflowApi, PipelineSummary, PipelineUpload, RecurringRun,
    RecurringRunRequest, Run, RunRequest, UploadedPipeline, VersionUpload,
};
pub use kubeflow::{KubeflowClient, RunOnceRequest, ScheduleRequest, LIST_PAGE_SIZE, WAIT_TIMEOUT};

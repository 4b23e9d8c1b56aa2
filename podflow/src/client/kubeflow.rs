//! Client orchestrating builds and the pipelines service.

use super::api::{
    ExperimentRef, KubeflowApi, PipelineSummary, PipelineUpload, RecurringRun,
    RecurringRunRequest, Run, RunRequest, UploadedPipeline, VersionUpload,
};
use crate::compiler::{EnvSnapshot, PipelineGenerator, TopologyBuilder};
use crate::config::{PluginConfig, RunConfig};
use crate::errors::{ClientError, ConfigError, PodflowError};
use crate::pipeline::ProjectContext;
use crate::topology::Topology;
use crate::utils::{format_run_name, full_pipeline_name, version_name};
use std::collections::BTreeMap;
use std::time::Duration;

/// How long a one-off run may take when waited for.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Page size used when listing pipelines.
pub const LIST_PAGE_SIZE: u32 = 30;

/// A one-off run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOnceRequest {
    /// Registered pipeline to run.
    pub pipeline: String,
    /// Container image.
    pub image: String,
    /// Image pull policy.
    pub image_pull_policy: String,
    /// Experiment the run is filed under.
    pub experiment_name: String,
    /// Experiment namespace.
    pub experiment_namespace: Option<String>,
    /// Run name template.
    pub run_name: String,
    /// Block until the run finishes.
    pub wait: bool,
    /// Values for workflow inputs.
    pub parameters: BTreeMap<String, String>,
}

impl RunOnceRequest {
    /// Fills a request from the run configuration.
    ///
    /// # Errors
    ///
    /// Fails when the image, experiment name or run name is not configured.
    pub fn from_run_config(
        pipeline: impl Into<String>,
        run_config: &RunConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            pipeline: pipeline.into(),
            image: run_config.image()?.to_string(),
            image_pull_policy: run_config.image_pull_policy().to_string(),
            experiment_name: run_config.experiment_name()?.to_string(),
            experiment_namespace: None,
            run_name: run_config.run_name()?.to_string(),
            wait: run_config.wait_for_completion(),
            parameters: BTreeMap::new(),
        })
    }
}

/// A recurring run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Uploaded pipeline to run.
    pub pipeline: String,
    /// Experiment the runs are filed under.
    pub experiment_name: String,
    /// Experiment namespace.
    pub experiment_namespace: Option<String>,
    /// Cron schedule.
    pub cron_expression: String,
    /// Run name template.
    pub run_name: String,
    /// Values for workflow inputs.
    pub parameters: BTreeMap<String, String>,
    /// Environment the pipeline was uploaded from.
    pub env: String,
}

impl ScheduleRequest {
    /// Fills a request from the run configuration.
    ///
    /// # Errors
    ///
    /// Fails when the experiment name or run name is not configured.
    pub fn from_run_config(
        pipeline: impl Into<String>,
        cron_expression: impl Into<String>,
        env: impl Into<String>,
        run_config: &RunConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            pipeline: pipeline.into(),
            experiment_name: run_config.experiment_name()?.to_string(),
            experiment_namespace: None,
            cron_expression: cron_expression.into(),
            run_name: run_config.scheduled_run_name()?.to_string(),
            parameters: BTreeMap::new(),
            env: env.into(),
        })
    }
}

/// Builds topologies and drives the pipelines service.
///
/// The topology shape is selected once, at construction.
pub struct KubeflowClient<A> {
    api: A,
    host: String,
    run_config: RunConfig,
    context: ProjectContext,
    env: EnvSnapshot,
    builder: TopologyBuilder,
}

impl<A: KubeflowApi> KubeflowClient<A> {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Fails when `host` or `run_config` is missing, or the merge strategy is
    /// unknown.
    pub fn new(
        api: A,
        config: &PluginConfig,
        context: ProjectContext,
        env: EnvSnapshot,
    ) -> Result<Self, PodflowError> {
        let host = config.host()?.to_string();
        let run_config = config.run_config()?.clone();
        let builder = TopologyBuilder::from(run_config.node_merge_strategy()?);

        tracing::debug!(host = %host, ?builder, "Created pipelines client");

        Ok(Self {
            api,
            host,
            run_config,
            context,
            env,
            builder,
        })
    }

    /// The service seam.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The selected topology shape.
    pub fn builder(&self) -> TopologyBuilder {
        self.builder
    }

    fn generator(&self) -> PipelineGenerator<'_> {
        PipelineGenerator::with_builder(&self.run_config, &self.context, &self.env, self.builder)
    }

    /// Builds the topology of a registered pipeline.
    pub fn generate(
        &self,
        pipeline: &str,
        image: &str,
        image_pull_policy: &str,
    ) -> Result<Topology, PodflowError> {
        self.generator()
            .generate_pipeline(pipeline, image, image_pull_policy)
    }

    /// Display name a pipeline is uploaded under.
    pub fn full_pipeline_name(&self, pipeline: &str, env: &str) -> String {
        full_pipeline_name(&self.context.project_name, pipeline, env)
    }

    /// Lists the first page of uploaded pipelines.
    pub async fn list_pipelines(&self) -> Result<Vec<PipelineSummary>, PodflowError> {
        Ok(self.api.list_pipelines(LIST_PAGE_SIZE).await?)
    }

    /// Builds and submits a one-off run, optionally waiting for it.
    pub async fn run_once(&self, request: &RunOnceRequest) -> Result<Run, PodflowError> {
        let topology = self.generate(&request.pipeline, &request.image, &request.image_pull_policy)?;
        let experiment_id = self
            .ensure_experiment_exists(&request.experiment_name, request.experiment_namespace.as_deref())
            .await?;

        let run = self
            .api
            .create_run(&RunRequest {
                experiment_id,
                name: format_run_name(&request.run_name, &request.parameters),
                topology,
                parameters: request.parameters.clone(),
            })
            .await?;
        tracing::info!(run_id = %run.id, run_name = %run.name, "Run submitted");

        if request.wait {
            let status = tokio::time::timeout(WAIT_TIMEOUT, self.api.wait_for_run_completion(&run.id))
                .await
                .map_err(|_| ClientError::Timeout {
                    run_id: run.id.clone(),
                    seconds: WAIT_TIMEOUT.as_secs(),
                })??;
            tracing::info!(run_id = %run.id, %status, "Run finished");
        }

        Ok(run)
    }

    /// Uploads a pipeline, as a new version when it already exists.
    pub async fn upload(
        &self,
        pipeline: &str,
        image: &str,
        image_pull_policy: &str,
        env: &str,
    ) -> Result<UploadedPipeline, PodflowError> {
        let topology = self.generate(pipeline, image, image_pull_policy)?;
        let name = self.full_pipeline_name(pipeline, env);

        let uploaded = if let Some(pipeline_id) = self.api.get_pipeline_id(&name).await? {
            let version_id = self
                .api
                .upload_pipeline_version(&VersionUpload {
                    pipeline_id: pipeline_id.clone(),
                    name: version_name(&self.context.project_name),
                    topology,
                })
                .await?;
            tracing::info!(%version_id, "New version of pipeline created");
            UploadedPipeline {
                pipeline_id,
                version_id,
            }
        } else {
            let uploaded = self
                .api
                .upload_pipeline(&PipelineUpload {
                    name,
                    description: self.run_config.description().map(str::to_string),
                    topology,
                })
                .await?;
            tracing::info!(pipeline_id = %uploaded.pipeline_id, "Pipeline created");
            uploaded
        };

        tracing::info!(
            "Pipeline link: {}/#/pipelines/details/{}/version/{}",
            self.host,
            uploaded.pipeline_id,
            uploaded.version_id
        );
        Ok(uploaded)
    }

    /// Returns the id of the named experiment, creating it if missing.
    ///
    /// Only a not-found error triggers creation; every other error is
    /// returned unchanged.
    pub async fn ensure_experiment_exists(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<String, ClientError> {
        let experiment = ExperimentRef {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        };

        match self.api.get_experiment(&experiment).await {
            Ok(found) => {
                tracing::info!(experiment_id = %found.id, "Existing experiment found");
                Ok(found.id)
            }
            Err(err) if err.is_experiment_not_found() => {
                let created = self.api.create_experiment(&experiment).await?;
                tracing::info!(experiment_id = %created.id, "New experiment created");
                Ok(created.id)
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces the recurring runs named like this one with a new schedule.
    pub async fn schedule(&self, request: &ScheduleRequest) -> Result<RecurringRun, PodflowError> {
        let experiment_id = self
            .ensure_experiment_exists(&request.experiment_name, request.experiment_namespace.as_deref())
            .await?;

        let full_name = self.full_pipeline_name(&request.pipeline, &request.env);
        let pipeline_id = self
            .api
            .get_pipeline_id(&full_name)
            .await?
            .ok_or(ClientError::PipelineNotUploaded { name: full_name })?;

        let run_name = format_run_name(&request.run_name, &request.parameters);
        self.disable_runs(&experiment_id, &run_name).await?;

        let recurring = self
            .api
            .create_recurring_run(&RecurringRunRequest {
                experiment_id,
                name: run_name,
                cron_expression: request.cron_expression.clone(),
                pipeline_id,
                parameters: request.parameters.clone(),
            })
            .await?;
        tracing::info!(cron = %request.cron_expression, "Pipeline scheduled");
        Ok(recurring)
    }

    async fn disable_runs(&self, experiment_id: &str, run_name: &str) -> Result<(), ClientError> {
        let runs = self.api.list_recurring_runs(experiment_id).await?;
        for run in runs.iter().filter(|run| run.name == run_name) {
            self.api.delete_recurring_run(&run.id).await?;
            tracing::info!(recurring_run_id = %run.id, "Previous schedule deleted");
        }
        Ok(())
    }
}

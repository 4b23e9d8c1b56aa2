//! Pipeline generator entry point.

use super::{exit_handler, EnvSnapshot, NodeCompiler, TopologyBuilder};
use crate::config::RunConfig;
use crate::errors::{ConfigError, PodflowError};
use crate::observability::SpanTimer;
use crate::pipeline::ProjectContext;
use crate::topology::{PipelineInput, Topology};

/// Turns registered pipelines into topologies.
///
/// The topology shape is chosen once, when the generator is created.
#[derive(Debug, Clone)]
pub struct PipelineGenerator<'a> {
    run_config: &'a RunConfig,
    context: &'a ProjectContext,
    env: &'a EnvSnapshot,
    builder: TopologyBuilder,
}

impl<'a> PipelineGenerator<'a> {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnumValue`] for an unknown
    /// `node_merge_strategy`.
    pub fn new(
        run_config: &'a RunConfig,
        context: &'a ProjectContext,
        env: &'a EnvSnapshot,
    ) -> Result<Self, ConfigError> {
        let builder = TopologyBuilder::from(run_config.node_merge_strategy()?);
        Ok(Self::with_builder(run_config, context, env, builder))
    }

    /// Creates a generator with an already selected shape.
    #[must_use]
    pub fn with_builder(
        run_config: &'a RunConfig,
        context: &'a ProjectContext,
        env: &'a EnvSnapshot,
        builder: TopologyBuilder,
    ) -> Self {
        Self {
            run_config,
            context,
            env,
            builder,
        }
    }

    /// The selected topology shape.
    #[must_use]
    pub fn builder(&self) -> TopologyBuilder {
        self.builder
    }

    /// Builds the topology of a registered pipeline.
    ///
    /// The result carries one input per project parameter, with the
    /// parameter's value as default, and the exit handler when configured.
    ///
    /// # Errors
    ///
    /// Fails for an unregistered pipeline and for any error raised while
    /// compiling its units.
    pub fn generate_pipeline(
        &self,
        pipeline_name: &str,
        image: &str,
        image_pull_policy: &str,
    ) -> Result<Topology, PodflowError> {
        let timer = SpanTimer::start(format!("generate:{pipeline_name}"));
        let pipeline = self.context.pipeline(pipeline_name)?;
        let compiler = NodeCompiler::new(
            self.run_config,
            self.context,
            self.env,
            image,
            image_pull_policy,
        );

        let mut topology = self.builder.build(&compiler, pipeline_name, pipeline)?;
        topology.description = self.run_config.description().map(str::to_string);
        topology.ttl_seconds = self.run_config.ttl();
        topology.inputs = self
            .context
            .params
            .iter()
            .map(|(name, value)| PipelineInput {
                name: name.clone(),
                default: value.to_default(),
            })
            .collect();

        if let Some(exit_pipeline) = self.run_config.on_exit_pipeline() {
            exit_handler::attach(&mut topology, &compiler, exit_pipeline)?;
        }

        tracing::info!(
            span = timer.name(),
            pipeline = pipeline_name,
            builder = ?self.builder,
            units = topology.len(),
            edges = topology.edges().len(),
            duration_ms = timer.elapsed_ms(),
            "Built topology"
        );

        Ok(topology)
    }
}

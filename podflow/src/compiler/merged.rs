//! Whole pipeline collapsed into a single unit.

use super::command;
use super::exit_handler::EXIT_UNIT_NAME;
use super::node_compiler::{NodeCompiler, UnitRequest};
use super::per_node::check_reserved;
use crate::errors::PodflowError;
use crate::pipeline::Pipeline;
use crate::topology::Topology;
use crate::utils::clean_name;

pub(crate) fn build(
    compiler: &NodeCompiler<'_>,
    pipeline_name: &str,
    pipeline: &Pipeline,
) -> Result<Topology, PodflowError> {
    let context = compiler.context();
    let mut topology = Topology::new(&context.project_name, pipeline_name);

    let name = clean_name(pipeline_name);
    if compiler.run_config().on_exit_pipeline().is_some() {
        check_reserved(pipeline_name, &name, &[EXIT_UNIT_NAME])?;
    }

    let unit = compiler.compile(UnitRequest {
        name,
        policy_key: pipeline_name,
        kedro_command: command::run_pipeline(&context.env, pipeline_name),
        extra_arguments: Vec::new(),
        outputs: pipeline.all_outputs(),
        description: compiler.run_config().description(),
    })?;
    topology.push_unit(unit);

    Ok(topology)
}

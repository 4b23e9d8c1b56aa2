//! One unit per node, wired by data dependencies.

use super::command;
use super::exit_handler::EXIT_UNIT_NAME;
use super::node_compiler::{NodeCompiler, UnitRequest};
use super::volume::{self, VOLUME_INIT_UNIT};
use crate::errors::{ContractErrorInfo, PipelineValidationError, PodflowError};
use crate::pipeline::Pipeline;
use crate::topology::{DependencyEdge, Topology};
use crate::utils::clean_name;
use std::collections::HashMap;

fn unit_name_error(
    message: String,
    nodes: Vec<String>,
    unit_name: &str,
) -> PipelineValidationError {
    PipelineValidationError::new(message)
        .with_nodes(nodes)
        .with_error_info(
            ContractErrorInfo::new(
                "PIPELINE-006-UNIT_NAME",
                format!("Unit name '{unit_name}' is not unique"),
            )
            .with_context_entry("unit", unit_name),
        )
}

/// Rejects `owner` when its unit name is one the builder adds on its own.
pub(super) fn check_reserved(
    owner: &str,
    unit_name: &str,
    reserved: &[&str],
) -> Result<(), PipelineValidationError> {
    if reserved.contains(&unit_name) {
        return Err(unit_name_error(
            format!("'{owner}' maps to the reserved unit name '{unit_name}'"),
            vec![owner.to_string()],
            unit_name,
        ));
    }
    Ok(())
}

/// Units added next to the node units under the current configuration.
fn reserved_unit_names(compiler: &NodeCompiler<'_>) -> Vec<&'static str> {
    let run_config = compiler.run_config();
    let mut reserved = Vec::new();
    if run_config.on_exit_pipeline().is_some() {
        reserved.push(EXIT_UNIT_NAME);
    }
    if run_config.volume().is_some_and(|volume| !volume.skip_init) {
        reserved.push(VOLUME_INIT_UNIT);
    }
    reserved
}

fn unit_names<'p>(
    pipeline: &'p Pipeline,
    reserved: &[&str],
) -> Result<HashMap<&'p str, String>, PipelineValidationError> {
    let mut names: HashMap<&str, String> = HashMap::with_capacity(pipeline.len());
    let mut owners: HashMap<String, &str> = HashMap::with_capacity(pipeline.len());

    for node in pipeline.nodes() {
        let unit_name = clean_name(&node.name);
        check_reserved(&node.name, &unit_name, reserved)?;
        if let Some(previous) = owners.insert(unit_name.clone(), &node.name) {
            return Err(unit_name_error(
                format!(
                    "Nodes '{previous}' and '{}' both map to unit name '{unit_name}'",
                    node.name
                ),
                vec![previous.to_string(), node.name.clone()],
                &unit_name,
            ));
        }
        names.insert(node.name.as_str(), unit_name);
    }

    Ok(names)
}

pub(crate) fn build(
    compiler: &NodeCompiler<'_>,
    pipeline_name: &str,
    pipeline: &Pipeline,
) -> Result<Topology, PodflowError> {
    let context = compiler.context();
    let names = unit_names(pipeline, &reserved_unit_names(compiler))?;
    let unit_name = |node: &str| names.get(node).cloned().unwrap_or_else(|| clean_name(node));

    let mut topology = Topology::new(&context.project_name, pipeline_name);
    let mut roots = Vec::new();

    for (node, upstream) in pipeline.node_dependencies() {
        let name = unit_name(node.name.as_str());
        let unit = compiler.compile(UnitRequest {
            name: name.clone(),
            policy_key: &node.name,
            kedro_command: command::run_node(&context.env, pipeline_name, &node.name),
            extra_arguments: Vec::new(),
            outputs: node.outputs.iter().map(String::as_str).collect(),
            description: None,
        })?;
        topology.push_unit(unit);

        if upstream.is_empty() {
            roots.push(name.clone());
        }
        for dependency in upstream {
            topology.push_edge(DependencyEdge::new(
                unit_name(dependency.name.as_str()),
                name.clone(),
            ));
        }
    }

    if let Some(volume) = compiler.run_config().volume() {
        volume::attach(&mut topology, compiler, volume, &roots);
    }

    Ok(topology)
}

//! Exit handler attachment.

use super::command;
use super::node_compiler::{NodeCompiler, UnitRequest};
use crate::errors::ConfigError;
use crate::topology::Topology;

/// Name of the exit handler unit.
pub const EXIT_UNIT_NAME: &str = "on-exit";

/// Run-outcome arguments handed to the exit pipeline as parameters.
const OUTCOME_ARGUMENTS: [&str; 4] = [
    "status",
    "{{workflow.status}}",
    "failures",
    "{{workflow.failures}}",
];

/// Attaches a unit running `exit_pipeline` after every other unit, whatever
/// their outcome.
///
/// Policies are resolved under the exit pipeline's name.
pub(crate) fn attach(
    topology: &mut Topology,
    compiler: &NodeCompiler<'_>,
    exit_pipeline: &str,
) -> Result<(), ConfigError> {
    let unit = compiler.compile(UnitRequest {
        name: EXIT_UNIT_NAME.to_string(),
        policy_key: exit_pipeline,
        kedro_command: command::run_exit_pipeline(&compiler.context().env, exit_pipeline),
        extra_arguments: OUTCOME_ARGUMENTS.iter().map(|a| (*a).to_string()).collect(),
        outputs: Vec::new(),
        description: None,
    })?;

    tracing::debug!(exit_pipeline, "Attached exit handler");
    topology.set_exit_handler(unit);
    Ok(())
}

//! Container command lines.
//!
//! Every unit runs `bash -c <script>`. The script writes the `name value`
//! pairs it receives as positional arguments into `config.yaml` and then
//! starts kedro with that file, so parameter overrides given at run time
//! reach the project.

/// Container-local root the project is installed under.
pub const KEDRO_ROOT: &str = "/home/kedro";

/// Shell used as the container entrypoint.
pub const SHELL: [&str; 2] = ["bash", "-c"];

/// Token bound to `$0` so parameter pairs start at `$1`.
pub const SCRIPT_NAME: &str = "kedro-params";

const PARAMS_DUMPER: &str = "python -c 'import yaml, sys;\
load=lambda e: yaml.load(e, Loader=yaml.FullLoader);\
params=dict(zip(sys.argv[1::2], map(load, sys.argv[2::2])));\
f=open(\"config.yaml\", \"w+\");\
yaml.dump(dict(run=dict(params=params)), f)' \"$@\"";

/// Runs a single node of a pipeline.
#[must_use]
pub fn run_node(env: &str, pipeline: &str, node: &str) -> String {
    format!("kedro run --env {env} --pipeline {pipeline} --node \"{node}\" --config config.yaml")
}

/// Runs a whole pipeline.
#[must_use]
pub fn run_pipeline(env: &str, pipeline: &str) -> String {
    format!("kedro run --env {env} --pipeline {pipeline} --config config.yaml")
}

/// Runs the exit pipeline.
#[must_use]
pub fn run_exit_pipeline(env: &str, pipeline: &str) -> String {
    format!("kedro run --config config.yaml --env {env} --pipeline {pipeline}")
}

/// Prefixes a kedro invocation with the parameter dumper.
#[must_use]
pub fn with_params_dumper(kedro_command: &str) -> String {
    format!("{PARAMS_DUMPER} && {kedro_command}")
}

/// Full `bash -c` entrypoint for a kedro invocation.
#[must_use]
pub fn entrypoint(kedro_command: &str) -> Vec<String> {
    SHELL
        .iter()
        .map(|token| (*token).to_string())
        .chain(std::iter::once(with_params_dumper(kedro_command)))
        .collect()
}

/// Run-time placeholder of a workflow input.
#[must_use]
pub fn parameter_placeholder(name: &str) -> String {
    format!("{{{{pipelineparam:op=;name={name}}}}}")
}

/// Script arguments: the `$0` token, then one `name placeholder` pair per
/// parameter.
#[must_use]
pub fn parameter_arguments<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut arguments = vec![SCRIPT_NAME.to_string()];
    for name in names {
        arguments.push(name.to_string());
        arguments.push(parameter_placeholder(name));
    }
    arguments
}

/// Container-local path a dataset file ends up at.
#[must_use]
pub fn artifact_path(filepath: &str) -> String {
    format!("{KEDRO_ROOT}/{}", filepath.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_node() {
        assert_eq!(
            run_node("unittests", "pipeline", "node1"),
            "kedro run --env unittests --pipeline pipeline --node \"node1\" --config config.yaml"
        );
    }

    #[test]
    fn test_entrypoint_runs_dumper_first() {
        let command = entrypoint(&run_pipeline("base", "__default__"));

        assert_eq!(command[..2], ["bash", "-c"]);
        assert!(command[2].starts_with("python -c 'import yaml, sys;"));
        assert!(command[2].contains("\"$@\" && kedro run"));
        assert!(command[2].ends_with("kedro run --env base --pipeline __default__ --config config.yaml"));
    }

    #[test]
    fn test_parameter_arguments() {
        assert_eq!(
            parameter_arguments(["param1", "param2"]),
            vec![
                SCRIPT_NAME.to_string(),
                "param1".to_string(),
                "{{pipelineparam:op=;name=param1}}".to_string(),
                "param2".to_string(),
                "{{pipelineparam:op=;name=param2}}".to_string(),
            ]
        );
        assert_eq!(parameter_arguments([]), vec![SCRIPT_NAME.to_string()]);
    }

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path("data/02_intermediate/b.csv"),
            "/home/kedro/data/02_intermediate/b.csv"
        );
    }
}

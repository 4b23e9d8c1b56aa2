use super::*;
use crate::config::{NodeMergeStrategy, NodeResources, RetryPolicy, RunConfig, VolumeConfig};
use crate::core::{Catalog, ComputationNode, DatasetDescriptor};
use crate::errors::PodflowError;
use crate::pipeline::Pipeline;
use crate::testing::{one_node_pipeline, TestProject, TEST_PIPELINE};
use crate::topology::{RetryTrigger, Topology};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;

fn generate(project: &TestProject) -> Topology {
    project
        .generate(TEST_PIPELINE, &EnvSnapshot::new())
        .unwrap()
}

fn merged(run_config: RunConfig) -> RunConfig {
    run_config.with_node_merge_strategy(NodeMergeStrategy::Full)
}

#[test]
fn test_per_node_two_units_one_edge() {
    let topology = generate(&TestProject::new());

    let names: Vec<_> = topology.units().iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["node1", "node2"]);
    assert_eq!(topology.edges().len(), 1);
    assert_eq!(topology.upstream_of("node2"), vec!["node1"]);
    assert!(topology.exit_handler().is_none());
    assert!(topology.volume().is_none());
}

#[test]
fn test_merged_single_unit_no_edges() {
    let project = TestProject::new();
    let project = project.clone().with_run_config(merged(project.run_config));

    let topology = generate(&project);

    assert_eq!(topology.units().len(), 1);
    assert!(topology.edges().is_empty());
    let unit = &topology.units()[0];
    assert_eq!(unit.name, "pipeline");
    assert_eq!(unit.description.as_deref(), Some("Very Important Pipeline"));
    assert!(unit.command[2].ends_with(
        "kedro run --env unittests --pipeline pipeline --config config.yaml"
    ));
}

#[test]
fn test_per_node_units_have_no_description() {
    let topology = generate(&TestProject::new());

    assert!(topology.units().iter().all(|u| u.description.is_none()));
    assert_eq!(topology.description.as_deref(), Some("Very Important Pipeline"));
}

#[test]
fn test_node_command_runs_single_node() {
    let topology = generate(&TestProject::new());

    let unit = topology.unit("node2").unwrap();
    assert!(unit.command[2].ends_with(
        "kedro run --env unittests --pipeline pipeline --node \"node2\" --config config.yaml"
    ));
}

#[test]
fn test_no_resources_without_policy() {
    let topology = generate(&TestProject::new());

    assert!(topology.units().iter().all(|u| u.resources.is_none()));
}

#[test]
fn test_resources_default_and_override() {
    let project = TestProject::new();
    let run_config = project.run_config.clone().with_resources(
        serde_json::from_value::<NodeResources>(json!({
            "__default__": {"cpu": "100m", "memory": "8Gi"},
            "node1": {"cpu": "400m", "memory": "64Gi"},
        }))
        .unwrap(),
    );
    let topology = generate(&project.with_run_config(run_config));

    let node1 = topology.unit("node1").unwrap().resources.clone().unwrap();
    let node2 = topology.unit("node2").unwrap().resources.clone().unwrap();
    assert_eq!(node1.limits, node1.requests);
    assert_eq!(node1.limits.get("cpu").map(String::as_str), Some("400m"));
    assert_eq!(node1.limits.get("memory").map(String::as_str), Some("64Gi"));
    assert_eq!(node2.requests.get("cpu").map(String::as_str), Some("100m"));
    assert_eq!(node2.requests.get("memory").map(String::as_str), Some("8Gi"));
}

#[test]
fn test_retry_absent_and_present() {
    let project = TestProject::new();
    let run_config = project.run_config.clone().with_retry_policy(
        RetryPolicy::new().with_entry(
            "node1",
            [
                ("num_retries", json!(4)),
                ("backoff_duration", json!("60s")),
                ("backoff_factor", json!(2)),
            ],
        ),
    );
    let topology = generate(&project.with_run_config(run_config));

    let node1 = topology.unit("node1").unwrap();
    assert_eq!(node1.num_retries(), Some(4));
    assert_eq!(node1.backoff_duration(), Some("60s"));
    assert_eq!(node1.backoff_factor(), Some(2.0));
    assert_eq!(node1.retry_trigger(), Some(RetryTrigger::OnFailure));

    let node2 = topology.unit("node2").unwrap();
    assert_eq!(node2.num_retries(), None);
    assert_eq!(node2.backoff_duration(), None);
    assert_eq!(node2.backoff_factor(), None);
    assert_eq!(node2.retry_trigger(), None);
}

#[test]
fn test_merged_policy_resolved_under_pipeline_name() {
    let project = TestProject::new();
    let run_config = merged(project.run_config.clone()).with_resources(
        NodeResources::new()
            .with_entry("node1", [("cpu", "1")])
            .with_entry("pipeline", [("cpu", "4")]),
    );
    let topology = generate(&project.with_run_config(run_config));

    let resources = topology.units()[0].resources.clone().unwrap();
    assert_eq!(resources.limits.get("cpu").map(String::as_str), Some("4"));
}

#[test]
fn test_parameters_become_inputs() {
    let project = TestProject::new()
        .with_param("param1", 0.3)
        .with_param("param2", 42_i64)
        .with_param("param3", NaiveDate::from_ymd_opt(2022, 2, 24).unwrap());
    let project = project.clone().with_run_config(merged(project.run_config));

    let topology = generate(&project);

    let inputs: Vec<_> = topology
        .inputs
        .iter()
        .map(|input| (input.name.as_str(), input.default.clone()))
        .collect();
    assert_eq!(
        inputs,
        vec![
            ("param1", json!(0.3)),
            ("param2", json!(42)),
            ("param3", json!("2022-02-24")),
        ]
    );

    let arguments = &topology.units()[0].arguments;
    for name in ["param1", "param2", "param3"] {
        let position = arguments.iter().position(|a| a == name).unwrap();
        assert_eq!(
            arguments[position + 1],
            format!("{{{{pipelineparam:op=;name={name}}}}}")
        );
    }
}

#[test]
fn test_artifact_exposure() {
    let catalog = Catalog::new().with_dataset(
        "B",
        DatasetDescriptor::new("pandas.CSVDataSet").with_filepath("data/02_intermediate/b.csv"),
    );
    let project = TestProject::new().with_catalog(catalog);
    let exposed = project.clone().with_run_config(merged(project.run_config.clone()));
    let hidden = project
        .clone()
        .with_run_config(merged(project.run_config.clone()).with_artifact_exposure(false));

    let unit = generate(&exposed).units()[0].clone();
    assert_eq!(
        unit.file_outputs.get("B").map(String::as_str),
        Some("/home/kedro/data/02_intermediate/b.csv")
    );
    assert_eq!(unit.file_outputs.len(), 1);

    assert!(generate(&hidden).units()[0].file_outputs.is_empty());
}

#[test]
fn test_exit_handler() {
    let project = TestProject::new()
        .with_pipeline(TEST_PIPELINE, one_node_pipeline())
        .with_param("param1", 0.3);
    let run_config = project
        .run_config
        .clone()
        .with_on_exit_pipeline("notify_via_slack");
    let topology = generate(&project.with_run_config(run_config));

    assert_eq!(topology.len(), 2);
    let handler = topology.exit_handler().unwrap();
    assert!(handler.always_run);
    assert_eq!(handler.unit.name, EXIT_UNIT_NAME);
    assert!(topology.upstream_of(EXIT_UNIT_NAME).is_empty());
    assert!(handler.unit.command[2].ends_with(
        "kedro run --config config.yaml --env unittests --pipeline notify_via_slack"
    ));
    assert_eq!(
        handler.unit.arguments[1..],
        [
            "param1",
            "{{pipelineparam:op=;name=param1}}",
            "status",
            "{{workflow.status}}",
            "failures",
            "{{workflow.failures}}",
        ]
    );
}

#[test]
fn test_exit_handler_policy_uses_exit_pipeline_name() {
    let project = TestProject::new();
    let run_config = project
        .run_config
        .clone()
        .with_on_exit_pipeline("notify_via_slack")
        .with_retry_policy(RetryPolicy::new().with_entry("notify_via_slack", [("num_retries", 2)]));
    let topology = generate(&project.with_run_config(run_config));

    assert_eq!(topology.unit(EXIT_UNIT_NAME).unwrap().num_retries(), Some(2));
    assert_eq!(topology.unit("node1").unwrap().num_retries(), None);
}

#[test]
fn test_environment_propagation() {
    let env: EnvSnapshot = [("KEDRO_CONFIG_MY_KEY", "my-value"), ("SOME_VAR", "no")]
        .into_iter()
        .collect();
    let project = TestProject::new();
    let run_config = project.run_config.clone().with_on_exit_pipeline("notify");
    let topology = project
        .with_run_config(run_config)
        .generate(TEST_PIPELINE, &env)
        .unwrap();

    for unit in topology.all_units() {
        assert_eq!(unit.env_value("KEDRO_CONFIG_MY_KEY"), Some("my-value"));
        assert_eq!(unit.env_value(RUN_ID_ENV), Some(RUN_ID_PLACEHOLDER));
        assert_eq!(unit.env_value("SOME_VAR"), None);
    }
}

#[test]
fn test_volume_per_node() {
    let project = TestProject::new();
    let run_config = project.run_config.clone().with_volume(VolumeConfig {
        owner: 1000,
        ..VolumeConfig::default()
    });
    let topology = generate(&project.with_run_config(run_config));

    let claim = topology.volume().unwrap();
    assert_eq!(claim.name, VOLUME_CLAIM_NAME);
    assert_eq!(claim.size, "1Gi");
    assert_eq!(topology.units().len(), 3);

    let init = topology.unit(VOLUME_INIT_UNIT).unwrap();
    assert_eq!(init.run_as_user, Some(0));
    assert_eq!(
        init.command[2],
        "cp --verbose -r /home/kedro/data/* /home/kedro/datavolume"
    );

    for name in ["node1", "node2"] {
        let unit = topology.unit(name).unwrap();
        assert_eq!(unit.run_as_user, Some(1000));
        assert_eq!(unit.volume_mounts[0].mount_path, "/home/kedro/data");
    }
    assert_eq!(topology.upstream_of("node1"), vec![VOLUME_INIT_UNIT]);
    assert_eq!(topology.upstream_of("node2"), vec!["node1"]);
}

#[test]
fn test_volume_skip_init() {
    let project = TestProject::new();
    let run_config = project.run_config.clone().with_volume(VolumeConfig {
        skip_init: true,
        ..VolumeConfig::default()
    });
    let topology = generate(&project.with_run_config(run_config));

    assert!(topology.volume().is_some());
    assert!(topology.unit(VOLUME_INIT_UNIT).is_none());
    assert_eq!(topology.edges().len(), 1);
}

#[test]
fn test_merged_ignores_volume() {
    let project = TestProject::new();
    let run_config = merged(project.run_config.clone()).with_volume(VolumeConfig::default());
    let topology = generate(&project.with_run_config(run_config));

    assert!(topology.volume().is_none());
    assert_eq!(topology.units().len(), 1);
}

#[test]
fn test_cache_staleness_and_ttl() {
    let project = TestProject::new();
    let run_config = project
        .run_config
        .clone()
        .with_max_cache_staleness("P0D")
        .with_ttl(3600)
        .with_on_exit_pipeline("notify");
    let topology = generate(&project.with_run_config(run_config));

    assert_eq!(topology.ttl_seconds, 3600);
    assert!(topology
        .all_units()
        .all(|u| u.max_cache_staleness.as_deref() == Some("P0D")));
}

#[test]
fn test_unit_names_are_cleaned() {
    let pipeline = Pipeline::from_nodes([
        ComputationNode::new("load_data", "f").with_outputs(["raw"]),
        ComputationNode::new("train model", "g").with_inputs(["raw"]),
    ])
    .unwrap();
    let topology = generate(&TestProject::new().with_pipeline(TEST_PIPELINE, pipeline));

    assert!(topology.unit("load-data").is_some());
    assert_eq!(topology.upstream_of("train-model"), vec!["load-data"]);
    assert!(topology.unit("train-model").unwrap().command[2].contains("--node \"train model\""));
}

#[test]
fn test_colliding_unit_names_rejected() {
    let pipeline = Pipeline::from_nodes([
        ComputationNode::new("a_b", "f").with_outputs(["x"]),
        ComputationNode::new("a-b", "g").with_outputs(["y"]),
    ])
    .unwrap();
    let err = TestProject::new()
        .with_pipeline(TEST_PIPELINE, pipeline)
        .generate(TEST_PIPELINE, &EnvSnapshot::new())
        .unwrap_err();

    match err {
        PodflowError::Validation(err) => {
            assert_eq!(err.code(), Some("PIPELINE-006-UNIT_NAME"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn reserved_name_error(node_name: &str, run_config: RunConfig) -> PodflowError {
    let pipeline =
        Pipeline::from_nodes([ComputationNode::new(node_name, "f").with_outputs(["x"])]).unwrap();
    TestProject::new()
        .with_pipeline(TEST_PIPELINE, pipeline)
        .with_run_config(run_config)
        .generate(TEST_PIPELINE, &EnvSnapshot::new())
        .unwrap_err()
}

#[test]
fn test_node_named_like_volume_init_rejected() {
    let run_config = TestProject::new()
        .run_config
        .with_volume(VolumeConfig::default());

    match reserved_name_error("data_volume_init", run_config) {
        PodflowError::Validation(err) => {
            assert_eq!(err.code(), Some("PIPELINE-006-UNIT_NAME"));
            assert_eq!(err.nodes, vec!["data_volume_init"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_volume_init_name_free_when_init_skipped() {
    let pipeline = Pipeline::from_nodes([
        ComputationNode::new("data_volume_init", "f").with_outputs(["x"]),
    ])
    .unwrap();
    let project = TestProject::new().with_pipeline(TEST_PIPELINE, pipeline);
    let run_config = project.run_config.clone().with_volume(VolumeConfig {
        skip_init: true,
        ..VolumeConfig::default()
    });
    let topology = generate(&project.with_run_config(run_config));

    assert_eq!(topology.units().len(), 1);
    assert!(topology.edges().is_empty());
}

#[test]
fn test_node_named_like_exit_handler_rejected() {
    let run_config = TestProject::new()
        .run_config
        .with_on_exit_pipeline("notify");

    match reserved_name_error("on_exit", run_config) {
        PodflowError::Validation(err) => {
            assert_eq!(err.code(), Some("PIPELINE-006-UNIT_NAME"));
            assert_eq!(err.nodes, vec!["on_exit"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_merged_pipeline_named_like_exit_handler_rejected() {
    let project = TestProject::new();
    let pipeline = project.pipelines[TEST_PIPELINE].clone();
    let run_config = merged(project.run_config.clone()).with_on_exit_pipeline("notify");
    let err = project
        .with_pipeline("on_exit", pipeline)
        .with_run_config(run_config)
        .generate("on_exit", &EnvSnapshot::new())
        .unwrap_err();

    assert!(matches!(
        err,
        PodflowError::Validation(ref err) if err.code() == Some("PIPELINE-006-UNIT_NAME")
    ));
}

#[test]
fn test_unknown_pipeline() {
    let err = TestProject::new()
        .generate("missing", &EnvSnapshot::new())
        .unwrap_err();
    assert!(matches!(err, PodflowError::UnknownPipeline(name) if name == "missing"));
}

#[test]
fn test_strategy_selected_from_config() {
    let project = TestProject::new();
    let context = project.context();
    let env = EnvSnapshot::new();

    let per_node = PipelineGenerator::new(&project.run_config, &context, &env).unwrap();
    assert_eq!(per_node.builder(), TopologyBuilder::PerNode);

    let full = merged(project.run_config.clone());
    let merged_generator = PipelineGenerator::new(&full, &context, &env).unwrap();
    assert_eq!(merged_generator.builder(), TopologyBuilder::Merged);
}

//! Default configuration template written by project initialisation.

const DEFAULT_CONFIG_TEMPLATE: &str = r#"
# Base url of the Kubeflow Pipelines, should include the schema (http/https)
host: {url}

# Configuration used to run the pipeline
run_config:

  # Name of the image to run as the pipeline steps
  image: {image}

  # Pull policy to be used for the steps. Use Always if you push the images
  # on the same tag, or Never if you use only local images
  image_pull_policy: IfNotPresent

  # Name of the kubeflow experiment to be created
  experiment_name: {project}

  # Name of the run for run-once, templated with the run-once parameters
  run_name: {run_name}

  # Name of the scheduled run, templated with the schedule parameters
  scheduled_run_name: {run_name}

  # Optional pipeline description
  #description: "Very Important Pipeline"

  # Flag indicating if the run-once should wait for the pipeline to finish
  wait_for_completion: False

  # How long to keep underlying Argo workflow (together with pods and data
  # volume after pipeline finishes) [in seconds]. Default: 1 week
  ttl: 604800

  # What pipeline should be run as the last step regardless of the
  # pipeline status. Used to send notifications or raise the alerts
  # on_exit_pipeline: notify_via_slack

  # Caching option for the units, as an ISO-8601 duration
  #max_cache_staleness: P0D

  # Set to false to disable exposing node outputs as artifacts
  #store_kedro_outputs_as_kfp_artifacts: True

  # Strategy used to map pipeline nodes onto workflow steps
  #  * none (default) - one step per node, full graph visible, per-node
  #                     resources and retries
  #  * full - the whole pipeline runs as one step
  #node_merge_strategy: none

  # Optional volume specification
  volume:

    # Storage class - use null (or no value) for the cluster default
    storageclass: # default

    # The size of the volume that is created
    size: 1Gi

    # Access mode of the volume used to exchange data
    #access_modes: [ReadWriteMany]

    # Skip copying the bundled data to the fresh volume
    skip_init: False

    # User id executing the node containers
    owner: 0

    # Keep the volume after the pipeline is deleted
    keep: False

  # Optional resource reservations and limits per node
  resources:

    # Default settings for the nodes
    __default__:
      cpu: 200m
      memory: 64Mi

  # Optional retry policy per node
  retry_policy:

    # 4 retries after: 1 minute, 2 minutes, 4 minutes, 8 minutes
    __default__:
      num_retries: 4
      backoff_duration: 60s
      backoff_factor: 2
"#;

/// Renders the default configuration file for a new project.
#[must_use]
pub fn sample_config(url: &str, image: &str, project: &str, run_name: &str) -> String {
    DEFAULT_CONFIG_TEMPLATE
        .replace("{url}", url)
        .replace("{image}", image)
        .replace("{project}", project)
        .replace("{run_name}", run_name)
}

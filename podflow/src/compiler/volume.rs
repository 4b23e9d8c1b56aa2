//! Shared data volume for the per-node topology.

use super::command::KEDRO_ROOT;
use super::NodeCompiler;
use crate::config::VolumeConfig;
use crate::topology::{DependencyEdge, ExecutableUnit, Topology, VolumeClaim, VolumeMount};

/// Name of the declared claim.
pub const VOLUME_CLAIM_NAME: &str = "data-volume";

/// Name of the unit seeding the volume.
pub const VOLUME_INIT_UNIT: &str = "data-volume-init";

fn data_mount_path() -> String {
    format!("{KEDRO_ROOT}/data")
}

fn init_mount_path() -> String {
    format!("{KEDRO_ROOT}/datavolume")
}

/// Mounts the volume into every unit already in `topology` and, unless
/// `skip_init` is set, adds the seeding unit in front of `root_units`.
pub(crate) fn attach(
    topology: &mut Topology,
    compiler: &NodeCompiler<'_>,
    volume: &VolumeConfig,
    root_units: &[String],
) {
    topology.set_volume(VolumeClaim {
        name: VOLUME_CLAIM_NAME.to_string(),
        size: volume.size.clone(),
        access_modes: volume.access_modes.clone(),
        storage_class: volume.storageclass.clone(),
        keep: volume.keep,
    });

    for unit in topology.units_mut() {
        unit.volume_mounts.push(VolumeMount {
            claim: VOLUME_CLAIM_NAME.to_string(),
            mount_path: data_mount_path(),
        });
        unit.run_as_user = Some(volume.owner);
    }

    if volume.skip_init {
        tracing::debug!("Volume init skipped");
        return;
    }

    let mut init = ExecutableUnit::new(
        VOLUME_INIT_UNIT,
        compiler.image(),
        compiler.image_pull_policy(),
    );
    init.command = vec![
        "sh".to_string(),
        "-c".to_string(),
        format!(
            "cp --verbose -r {}/* {}",
            data_mount_path(),
            init_mount_path()
        ),
    ];
    init.volume_mounts.push(VolumeMount {
        claim: VOLUME_CLAIM_NAME.to_string(),
        mount_path: init_mount_path(),
    });
    init.run_as_user = Some(0);
    topology.push_unit(init);

    for root in root_units {
        topology.push_edge(DependencyEdge::new(VOLUME_INIT_UNIT, root.clone()));
    }
}

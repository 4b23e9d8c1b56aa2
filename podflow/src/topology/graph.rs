//! Topology: units, dependency edges and the exit handler.

use super::ExecutableUnit;
use serde::{Deserialize, Serialize};

/// Directed edge: `downstream` starts only after `upstream` succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Unit that must finish first.
    pub upstream: String,
    /// Unit that waits.
    pub downstream: String,
}

impl DependencyEdge {
    /// Creates a new edge.
    #[must_use]
    pub fn new(upstream: impl Into<String>, downstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            downstream: downstream.into(),
        }
    }
}

/// Overridable input of the workflow, with its literal default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInput {
    /// Parameter name.
    pub name: String,
    /// Default baked in at build time.
    pub default: serde_json::Value,
}

/// Unit that runs once every other unit finished, whatever their outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitHandler {
    /// The unit to run.
    pub unit: ExecutableUnit,
    /// Always true: the handler runs on success and on failure.
    pub always_run: bool,
}

/// Volume claim shared by the units of a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaim {
    /// Claim name referenced by mounts.
    pub name: String,
    /// Requested size.
    pub size: String,
    /// Access modes.
    pub access_modes: Vec<String>,
    /// Storage class; `None` selects the cluster default.
    pub storage_class: Option<String>,
    /// Whether the claim outlives the workflow.
    pub keep: bool,
}

/// A deployable workflow: units plus the order they run in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Workflow name.
    pub name: String,
    /// Name of the pipeline the topology was built from.
    pub pipeline: String,
    /// Pipeline description, if configured.
    pub description: Option<String>,
    /// Overridable workflow inputs.
    pub inputs: Vec<PipelineInput>,
    /// Seconds the finished workflow is kept.
    pub ttl_seconds: u64,
    units: Vec<ExecutableUnit>,
    edges: Vec<DependencyEdge>,
    exit_handler: Option<ExitHandler>,
    volume: Option<VolumeClaim>,
}

impl Topology {
    /// Creates an empty topology.
    #[must_use]
    pub fn new(name: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pipeline: pipeline.into(),
            description: None,
            inputs: Vec::new(),
            ttl_seconds: 0,
            units: Vec::new(),
            edges: Vec::new(),
            exit_handler: None,
            volume: None,
        }
    }

    pub(crate) fn push_unit(&mut self, unit: ExecutableUnit) {
        self.units.push(unit);
    }

    pub(crate) fn push_edge(&mut self, edge: DependencyEdge) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut ExecutableUnit> {
        self.units.iter_mut()
    }

    pub(crate) fn set_exit_handler(&mut self, unit: ExecutableUnit) {
        self.exit_handler = Some(ExitHandler {
            unit,
            always_run: true,
        });
    }

    pub(crate) fn set_volume(&mut self, claim: VolumeClaim) {
        self.volume = Some(claim);
    }

    /// Units wired by dependency edges, in build order.
    #[must_use]
    pub fn units(&self) -> &[ExecutableUnit] {
        &self.units
    }

    /// Dependency edges.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// The exit handler, if attached.
    #[must_use]
    pub fn exit_handler(&self) -> Option<&ExitHandler> {
        self.exit_handler.as_ref()
    }

    /// The shared volume claim, if any.
    #[must_use]
    pub fn volume(&self) -> Option<&VolumeClaim> {
        self.volume.as_ref()
    }

    /// Every unit, the exit handler last.
    pub fn all_units(&self) -> impl Iterator<Item = &ExecutableUnit> {
        self.units
            .iter()
            .chain(self.exit_handler.iter().map(|handler| &handler.unit))
    }

    /// Looks up a unit by name, including the exit handler.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&ExecutableUnit> {
        self.all_units().find(|unit| unit.name == name)
    }

    /// Total number of units, including the exit handler.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len() + usize::from(self.exit_handler.is_some())
    }

    /// Returns true if the topology has no units at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the units `name` waits for.
    #[must_use]
    pub fn upstream_of(&self, name: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.downstream == name)
            .map(|edge| edge.upstream.as_str())
            .collect()
    }
}

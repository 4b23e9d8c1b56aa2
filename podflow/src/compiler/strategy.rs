//! Topology strategies.

use super::{merged, per_node, NodeCompiler};
use crate::config::NodeMergeStrategy;
use crate::errors::PodflowError;
use crate::pipeline::Pipeline;
use crate::topology::Topology;

/// Shape of the topology built for a pipeline.
///
/// Selected once from configuration; both variants share the same policy
/// resolution and node compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyBuilder {
    /// One unit per node, wired by data dependencies.
    PerNode,
    /// A single unit running the whole pipeline.
    Merged,
}

impl From<NodeMergeStrategy> for TopologyBuilder {
    fn from(strategy: NodeMergeStrategy) -> Self {
        match strategy {
            NodeMergeStrategy::None => Self::PerNode,
            NodeMergeStrategy::Full => Self::Merged,
        }
    }
}

impl TopologyBuilder {
    /// Builds the topology for `pipeline`.
    ///
    /// # Errors
    ///
    /// Fails on policy values that cannot be coerced, and for the per-node
    /// shape when two nodes normalize to the same unit name.
    pub fn build(
        self,
        compiler: &NodeCompiler<'_>,
        pipeline_name: &str,
        pipeline: &Pipeline,
    ) -> Result<Topology, PodflowError> {
        match self {
            Self::PerNode => per_node::build(compiler, pipeline_name, pipeline),
            Self::Merged => merged::build(compiler, pipeline_name, pipeline),
        }
    }
}

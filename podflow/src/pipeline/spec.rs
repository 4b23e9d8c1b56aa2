//! Validated pipeline graph.

use crate::core::ComputationNode;
use crate::errors::PipelineValidationError;
use serde::Serialize;

use super::PipelineBuilder;

/// A validated, acyclic graph of computation nodes.
///
/// Nodes are stored in topological order; ties keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    nodes: Vec<ComputationNode>,
}

impl Pipeline {
    pub(crate) fn from_sorted(nodes: Vec<ComputationNode>) -> Self {
        Self { nodes }
    }

    /// Builds a pipeline from nodes given in any order.
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes do not form a valid DAG.
    pub fn from_nodes(
        nodes: impl IntoIterator<Item = ComputationNode>,
    ) -> Result<Self, PipelineValidationError> {
        let mut builder = PipelineBuilder::new();
        for node in nodes {
            builder.add_node(node)?;
        }
        builder.build()
    }

    /// Nodes in topological order.
    #[must_use]
    pub fn nodes(&self) -> &[ComputationNode] {
        &self.nodes
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&ComputationNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the pipeline has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Each node paired with the nodes producing its inputs.
    #[must_use]
    pub fn node_dependencies(&self) -> Vec<(&ComputationNode, Vec<&ComputationNode>)> {
        self.nodes
            .iter()
            .map(|node| {
                let upstream = self
                    .nodes
                    .iter()
                    .filter(|candidate| candidate.name != node.name && node.depends_on(candidate))
                    .collect();
                (node, upstream)
            })
            .collect()
    }

    /// Every dataset produced by some node, in first-seen order.
    #[must_use]
    pub fn all_outputs(&self) -> Vec<&str> {
        let mut outputs: Vec<&str> = Vec::new();
        for output in self.nodes.iter().flat_map(|n| n.outputs.iter()) {
            if !outputs.contains(&output.as_str()) {
                outputs.push(output);
            }
        }
        outputs
    }
}

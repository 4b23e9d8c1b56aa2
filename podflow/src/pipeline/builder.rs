//! Pipeline builder with validation.

use super::Pipeline;
use crate::core::ComputationNode;
use crate::errors::{
    ContractErrorInfo, CycleDetectedError, OutputConflictError, PipelineValidationError,
};
use std::collections::{HashMap, HashSet};

/// Characters that would escape the quoted node argument of a unit command.
const FORBIDDEN_NAME_CHARS: [char; 4] = ['"', '$', '`', '\\'];

/// Builder for creating validated pipelines.
///
/// Dependencies are implicit: a node depends on whichever node produces one
/// of its inputs. Nodes may therefore be added in any order; cycles are
/// detected when the pipeline is built.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    /// The node definitions.
    nodes: HashMap<String, ComputationNode>,
    /// Insertion order for nodes.
    node_order: Vec<String>,
    /// Dataset name to producing node.
    producers: HashMap<String, String>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the node name is empty, taken or holds a quote,
    /// `$`, backtick or backslash, or if one of its outputs already has a
    /// producer.
    pub fn node(mut self, node: ComputationNode) -> Result<Self, PipelineValidationError> {
        self.add_node(node)?;
        Ok(self)
    }

    /// Adds a node in place.
    ///
    /// # Errors
    ///
    /// See [`PipelineBuilder::node`].
    pub fn add_node(&mut self, node: ComputationNode) -> Result<(), PipelineValidationError> {
        if node.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "Node name cannot be empty or whitespace-only",
            )
            .with_error_info(ContractErrorInfo::new(
                "PIPELINE-005-NAME",
                "Empty node name",
            )));
        }

        if let Some(forbidden) = node.name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
            return Err(PipelineValidationError::new(format!(
                "Node name '{}' contains the forbidden character '{forbidden}'",
                node.name
            ))
            .with_nodes(vec![node.name.clone()])
            .with_error_info(
                ContractErrorInfo::new("PIPELINE-005-NAME", "Node name contains a shell metacharacter")
                    .with_context_entry("character", forbidden.to_string()),
            ));
        }

        if self.nodes.contains_key(&node.name) {
            return Err(PipelineValidationError::new(format!(
                "Node '{}' is defined more than once",
                node.name
            ))
            .with_nodes(vec![node.name.clone()])
            .with_error_info(ContractErrorInfo::new(
                "PIPELINE-003-DUPLICATE",
                "Duplicate node name",
            )));
        }

        for output in &node.outputs {
            if let Some(first) = self.producers.get(output) {
                return Err(OutputConflictError::new(output, first, &node.name).into());
            }
        }

        for output in &node.outputs {
            self.producers.insert(output.clone(), node.name.clone());
        }
        self.node_order.push(node.name.clone());
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Number of nodes added so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no nodes or the nodes form a cycle.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.nodes.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no nodes")
                .with_error_info(ContractErrorInfo::new(
                    "PIPELINE-004-EMPTY",
                    "Cannot build an empty pipeline",
                )));
        }

        let upstream = self.upstream_map();
        let order = self.topological_order(&upstream)?;
        let mut nodes = self.nodes;
        let sorted = order
            .iter()
            .filter_map(|name| nodes.remove(name))
            .collect();
        Ok(Pipeline::from_sorted(sorted))
    }

    /// Upstream node names for every node, in input declaration order.
    fn upstream_map(&self) -> HashMap<String, Vec<String>> {
        self.nodes
            .values()
            .map(|node| {
                let mut deps: Vec<String> = Vec::new();
                for input in &node.inputs {
                    if let Some(producer) = self.producers.get(input) {
                        if !deps.contains(producer) {
                            deps.push(producer.clone());
                        }
                    }
                }
                (node.name.clone(), deps)
            })
            .collect()
    }

    /// Orders nodes so that every producer precedes its consumers.
    ///
    /// Depth-first over upstream edges with an explicit stack. Roots are taken
    /// in insertion order, which keeps the result deterministic.
    fn topological_order(
        &self,
        upstream: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<String>, CycleDetectedError> {
        let mut done: HashSet<&str> = HashSet::with_capacity(self.node_order.len());
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut result = Vec::with_capacity(self.node_order.len());

        for root in &self.node_order {
            if done.contains(root.as_str()) {
                continue;
            }
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
            on_path.insert(root.as_str());

            while let Some((node, next)) = stack.pop() {
                let dep = match upstream.get(node).and_then(|deps| deps.get(next)) {
                    Some(dep) => dep.as_str(),
                    None => {
                        on_path.remove(node);
                        done.insert(node);
                        result.push(node.to_string());
                        continue;
                    }
                };
                stack.push((node, next + 1));

                if on_path.contains(dep) {
                    let start = stack.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|(n, _)| (*n).to_string()).collect();
                    cycle.push(dep.to_string());
                    return Err(CycleDetectedError::new(cycle));
                }
                if !done.contains(dep) {
                    on_path.insert(dep);
                    stack.push((dep, 0));
                }
            }
        }

        Ok(result)
    }
}

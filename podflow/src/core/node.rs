//! Computation node type.

use serde::{Deserialize, Serialize};

/// One step of a data pipeline.
///
/// Nodes never run inside this crate; `func` is an opaque reference the
/// container runtime resolves when it re-invokes the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationNode {
    /// Unique name within a pipeline.
    pub name: String,
    /// Reference to the callable implementing the node.
    pub func: String,
    /// Datasets consumed, in declaration order.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Datasets produced, in declaration order.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl ComputationNode {
    /// Creates a node with no inputs or outputs.
    #[must_use]
    pub fn new(name: impl Into<String>, func: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            func: func.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the inputs.
    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if this node consumes something `upstream` produces.
    #[must_use]
    pub fn depends_on(&self, upstream: &Self) -> bool {
        self.inputs
            .iter()
            .any(|input| upstream.outputs.iter().any(|output| output == input))
    }
}

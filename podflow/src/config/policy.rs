//! Per-node policy resolution.
//!
//! Both policy blocks are keyed by node name with an optional `__default__`
//! entry. Resolution starts from the default entry and shallow-merges the
//! node-specific entry on top of it, the override winning per key.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key of the entry every node inherits from.
pub const DEFAULT_POLICY_KEY: &str = "__default__";

type PolicyBlock = BTreeMap<String, BTreeMap<String, Value>>;

fn merge_for(block: &PolicyBlock, node_name: &str) -> BTreeMap<String, Value> {
    let mut merged = block.get(DEFAULT_POLICY_KEY).cloned().unwrap_or_default();
    if let Some(node_specific) = block.get(node_name) {
        merged.extend(node_specific.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Resource reservations, keyed by node name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeResources(PolicyBlock);

impl NodeResources {
    /// Creates an empty resources block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry for a node (or for `__default__`).
    #[must_use]
    pub fn with_entry<K, V>(mut self, node_name: impl Into<String>, entry: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(
            node_name.into(),
            entry.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        );
        self
    }

    /// Returns true iff the merged resources for the node are non-empty.
    #[must_use]
    pub fn is_set_for(&self, node_name: &str) -> bool {
        !self.get_for(node_name).is_empty()
    }

    /// Resolves the resource quantities for a node.
    ///
    /// Quantities are rendered as strings: `8` becomes `"8"`.
    #[must_use]
    pub fn get_for(&self, node_name: &str) -> BTreeMap<String, String> {
        merge_for(&self.0, node_name)
            .into_iter()
            .map(|(name, quantity)| {
                let quantity = match quantity {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, quantity)
            })
            .collect()
    }
}

/// Retry settings after merge and normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRetry {
    /// Upper bound on retries; 0 when the merged block omits it.
    pub num_retries: u32,
    /// Initial backoff, e.g. `60s` or `5m`.
    pub backoff_duration: Option<String>,
    /// Multiplier applied to the backoff after every attempt.
    pub backoff_factor: Option<f64>,
}

/// Retry policies, keyed by node name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryPolicy(PolicyBlock);

impl RetryPolicy {
    /// Creates an empty retry block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry for a node (or for `__default__`).
    #[must_use]
    pub fn with_entry<K, V>(mut self, node_name: impl Into<String>, entry: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(
            node_name.into(),
            entry.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        );
        self
    }

    /// Returns true iff the merged retry block for the node is non-empty.
    #[must_use]
    pub fn is_set_for(&self, node_name: &str) -> bool {
        !merge_for(&self.0, node_name).is_empty()
    }

    /// Resolves and normalizes the retry policy for a node.
    ///
    /// Returns `Ok(None)` when neither a default nor a node entry exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a present field cannot be
    /// coerced (e.g. `num_retries: "many"`).
    pub fn get_for(&self, node_name: &str) -> Result<Option<ResolvedRetry>, ConfigError> {
        let merged = merge_for(&self.0, node_name);
        if merged.is_empty() {
            return Ok(None);
        }

        let key = |field: &str| format!("run_config.retry_policy.{node_name}.{field}");

        let num_retries = match merged.get("num_retries") {
            None => 0,
            Some(value) => coerce_u32(value).ok_or_else(|| {
                ConfigError::invalid_value(key("num_retries"), value, "non-negative integer")
            })?,
        };
        let backoff_factor = match merged.get("backoff_factor") {
            None | Some(Value::Null) => None,
            Some(value) => Some(coerce_f64(value).ok_or_else(|| {
                ConfigError::invalid_value(key("backoff_factor"), value, "number")
            })?),
        };
        let backoff_duration = match merged.get("backoff_duration") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        tracing::debug!(
            node = node_name,
            num_retries,
            ?backoff_duration,
            ?backoff_factor,
            "Resolved retry policy"
        );

        Ok(Some(ResolvedRetry {
            num_retries,
            backoff_duration,
            backoff_factor,
        }))
    }
}

fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

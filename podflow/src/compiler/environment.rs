//! Environment propagated into containers.

use crate::topology::EnvVar;
use std::collections::BTreeMap;

/// Variables with this prefix are copied into every container.
pub const CONFIG_ENV_PREFIX: &str = "KEDRO_CONFIG_";

/// Variable holding the workflow run identifier.
pub const RUN_ID_ENV: &str = "KUBEFLOW_RUN_ID";

/// Platform placeholder resolved to the run identifier.
pub const RUN_ID_PLACEHOLDER: &str = "{{workflow.uid}}";

/// Read-only view of the build-time environment.
///
/// Captured once and handed to the generators so builds never read the
/// process environment themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Adds a variable.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Looks up a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Container environment: the run identifier followed by every
    /// `KEDRO_CONFIG_*` variable, sorted by name.
    #[must_use]
    pub fn container_env(&self) -> Vec<EnvVar> {
        std::iter::once(EnvVar::new(RUN_ID_ENV, RUN_ID_PLACEHOLDER))
            .chain(
                self.vars
                    .iter()
                    .filter(|(name, _)| name.starts_with(CONFIG_ENV_PREFIX))
                    .map(|(name, value)| EnvVar::new(name.clone(), value.clone())),
            )
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

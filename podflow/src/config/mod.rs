//! Resolved configuration consumed by the generators.
//!
//! Parsing raw configuration files happens elsewhere; this module only
//! offers typed access to the resolved values, with explicit defaults and
//! tagged failures for required keys.

mod policy;
mod run_config;
mod template;

pub use policy::{NodeResources, ResolvedRetry, RetryPolicy, DEFAULT_POLICY_KEY};
pub use run_config::{NodeMergeStrategy, PluginConfig, RunConfig, VolumeConfig};

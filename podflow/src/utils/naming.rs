//! Name normalization for units, uploads and runs.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use uuid::Uuid;

/// Upper bound the pipelines service accepts for names.
pub const MAX_NAME_LENGTH: usize = 100;

fn non_word_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\W_]+").expect("static pattern compiles"))
}

fn placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_.-]+)\}").expect("static pattern compiles"))
}

/// Turns an arbitrary name into a DNS-label friendly one.
///
/// Runs of non-word characters and underscores collapse into a single `-`,
/// and leading or trailing dashes are removed.
///
/// ```
/// use podflow::utils::clean_name;
///
/// assert_eq!(clean_name("my_project: v2"), "my-project-v2");
/// ```
#[must_use]
pub fn clean_name(name: &str) -> String {
    non_word_run()
        .replace_all(name, "-")
        .trim_matches('-')
        .to_string()
}

/// Truncates to at most `max` characters, on a character boundary.
#[must_use]
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Display name of an uploaded pipeline.
#[must_use]
pub fn full_pipeline_name(project: &str, pipeline: &str, env: &str) -> String {
    truncate_chars(
        &format!("[{project}] {pipeline} (env: {env})"),
        MAX_NAME_LENGTH,
    )
}

/// Unique name of an uploaded pipeline version.
#[must_use]
pub fn version_name(project: &str) -> String {
    truncate_chars(
        &format!("{}-{}", clean_name(project), Uuid::new_v4()),
        MAX_NAME_LENGTH,
    )
}

/// Fills `{name}` placeholders of a run name template.
///
/// Placeholders without a matching parameter are left as they are.
#[must_use]
pub fn format_run_name(template: &str, parameters: &BTreeMap<String, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            parameters
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

//! Naming helpers shared by the generators and the client.

mod naming;

pub use naming::{
    clean_name, format_run_name, full_pipeline_name, truncate_chars, version_name,
    MAX_NAME_LENGTH,
};

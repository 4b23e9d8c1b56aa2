//! Testing utilities.
//!
//! - Project fixtures with the two-node pipeline registered
//! - An in-memory pipelines service recording its calls

mod fixtures;
mod mocks;

pub use fixtures::{
    one_node_pipeline, two_node_pipeline, TestProject, TEST_ENV, TEST_IMAGE, TEST_PIPELINE,
};
pub use mocks::RecordingApi;

//! Logging setup and build timing.

mod subscriber;
mod timer;

pub use subscriber::{init_tracing, InitError, LogFormat};
pub use timer::SpanTimer;

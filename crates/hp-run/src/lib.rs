//! hp-run: run configuration and the end-to-end allocation pipeline.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{InitSelection, RunConfig, RunMode, SourceAvailability};
pub use error::{RunError, RunResult};
pub use pipeline::{run, RunManifest, RunReport};

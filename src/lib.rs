pub mod config;
pub mod dataset;
pub mod error;
pub mod locate;
pub mod process;
pub mod schema;

pub use config::{FailurePolicy, PipelineConfig};
pub use dataset::Dataset;
pub use error::{ErrorKind, PipelineError, Result};
pub use process::{run, RunReport};
